//! Source classification.
//!
//! Resolves a source string once into a [`SourceKind`], so extractor
//! dispatch is a single `match` instead of suffix checks at every call site.

use std::path::{Component, Path, PathBuf};

/// What a source string refers to, and which extractor handles it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Url,
    Pdf(PathBuf),
    Docx(PathBuf),
    Xlsx(PathBuf),
    /// An existing local file with an extension no extractor handles.
    /// Holds the lowercased extension (empty when the file has none).
    Unsupported(PathBuf, String),
}

/// Returns true for sources with an `http://` or `https://` prefix.
pub fn is_url(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Classify `source`, returning `None` when it is neither a URL nor an
/// existing local file.
pub fn classify(source: &str) -> Option<SourceKind> {
    if is_url(source) {
        return Some(SourceKind::Url);
    }

    let path = Path::new(source);
    if !path.is_file() {
        return None;
    }

    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    let path = path.to_path_buf();

    Some(match ext.as_str() {
        "pdf" => SourceKind::Pdf(path),
        "docx" => SourceKind::Docx(path),
        "xlsx" => SourceKind::Xlsx(path),
        _ => SourceKind::Unsupported(path, ext),
    })
}

/// The identifier a summary is stored under: URLs verbatim, local files as
/// `file://<absolute-path>`.
pub fn source_uri(source: &str) -> String {
    if is_url(source) {
        return source.to_string();
    }
    let path = Path::new(source);
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    format!("file://{}", normalize(&absolute).display())
}

/// Drop `.` and fold `..` into its parent without touching the filesystem.
/// `..` at the root stays at the root.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}
