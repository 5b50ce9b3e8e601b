//! Multi-format text extraction for local documents (PDF, DOCX, XLSX).
//!
//! The byte-level functions ([`pdf_text`], [`docx_text`], [`xlsx_text`])
//! return a [`FormatError`]; [`extract_file`] reads the file and attaches the
//! path, producing the caller-facing [`ExtractError`]. Nothing here panics
//! on malformed input.

use std::io::Read;
use std::path::Path;

use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;

/// Maximum sheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet (avoids unbounded memory).
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes to read from a single ZIP entry (zip-bomb protection).
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// Why a document body could not be parsed.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("OOXML extraction failed: {0}")]
    Ooxml(String),
}

/// Failure of any extractor. Every variant names the offending source.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("source not found: '{0}' is not a URL or an existing file path")]
    NotFound(String),

    #[error("unsupported file type '.{ext}' for '{path}' (supported: .pdf, .docx, .xlsx)")]
    UnsupportedFormat { path: String, ext: String },

    #[error("HTTP {status} fetching '{url}'")]
    Http {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("request timed out for '{url}'")]
    Timeout {
        url: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("network error for '{url}'")]
    Transport {
        url: String,
        #[source]
        cause: reqwest::Error,
    },

    #[error("failed to read '{path}'")]
    Io {
        path: String,
        #[source]
        cause: std::io::Error,
    },

    #[error("failed to extract text from '{path}'")]
    Format {
        path: String,
        #[source]
        cause: FormatError,
    },
}

impl ExtractError {
    /// The URL or path this failure refers to.
    pub fn source_id(&self) -> &str {
        match self {
            ExtractError::NotFound(s) => s,
            ExtractError::UnsupportedFormat { path, .. }
            | ExtractError::Io { path, .. }
            | ExtractError::Format { path, .. } => path,
            ExtractError::Http { url, .. }
            | ExtractError::Timeout { url, .. }
            | ExtractError::Transport { url, .. } => url,
        }
    }
}

/// Local formats with a dedicated extractor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Pdf,
    Docx,
    Xlsx,
}

/// Read `path` and extract its text according to `format`.
pub fn extract_file(path: &Path, format: FileFormat) -> Result<String, ExtractError> {
    let display = path.display().to_string();
    let bytes = std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            ExtractError::NotFound(display.clone())
        } else {
            ExtractError::Io {
                path: display.clone(),
                cause: e,
            }
        }
    })?;

    let result = match format {
        FileFormat::Pdf => pdf_text(&bytes),
        FileFormat::Docx => docx_text(&bytes),
        FileFormat::Xlsx => xlsx_text(&bytes),
    };
    result.map_err(|cause| ExtractError::Format {
        path: display,
        cause,
    })
}

/// Text of every page in order, each followed by a newline.
pub fn pdf_text(bytes: &[u8]) -> Result<String, FormatError> {
    // pdf-extract panics on some malformed inputs instead of returning Err.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| FormatError::Pdf("parser panicked on malformed input".to_string()))?
        .map_err(|e| FormatError::Pdf(e.to_string()))?;

    let mut out = String::new();
    for page in pages {
        out.push_str(&page);
        out.push('\n');
    }
    Ok(out)
}

type Archive<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

fn open_archive(bytes: &[u8]) -> Result<Archive<'_>, FormatError> {
    zip::ZipArchive::new(std::io::Cursor::new(bytes)).map_err(|e| FormatError::Ooxml(e.to_string()))
}

fn read_zip_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, FormatError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| FormatError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| FormatError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(FormatError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

/// Like [`read_zip_entry_bounded`], but a missing entry is `Ok(None)`.
fn read_optional_entry(archive: &mut Archive<'_>, name: &str) -> Result<Option<Vec<u8>>, FormatError> {
    if archive.index_for_name(name).is_none() {
        return Ok(None);
    }
    read_zip_entry_bounded(archive, name, MAX_XML_ENTRY_BYTES).map(Some)
}

fn xml_err(e: impl std::fmt::Display) -> FormatError {
    FormatError::Ooxml(e.to_string())
}

/// Paragraphs of `word/document.xml` in document order, joined with `\n`.
pub fn docx_text(bytes: &[u8]) -> Result<String, FormatError> {
    let mut archive = open_archive(bytes)?;
    let doc_xml = read_zip_entry_bounded(&mut archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    Ok(docx_paragraphs(&doc_xml)?.join("\n"))
}

fn docx_paragraphs(xml: &[u8]) -> Result<Vec<String>, FormatError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    // Open paragraphs; text boxes can nest a paragraph inside another.
    let mut open: Vec<String> = Vec::new();
    let mut run_depth = 0usize;
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => open.push(String::new()),
                b"r" => run_depth += 1,
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"p" => paragraphs.push(String::new()),
                b"tab" if run_depth > 0 => {
                    if let Some(p) = open.last_mut() {
                        p.push('\t');
                    }
                }
                b"br" | b"cr" if run_depth > 0 => {
                    if let Some(p) = open.last_mut() {
                        p.push('\n');
                    }
                }
                _ => {}
            },
            Ok(Event::Text(te)) if in_text => {
                if let Some(p) = open.last_mut() {
                    p.push_str(&te.unescape().map_err(xml_err)?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"r" => run_depth = run_depth.saturating_sub(1),
                b"p" => {
                    if let Some(p) = open.pop() {
                        paragraphs.push(p);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

/// Every non-empty cell value of every sheet, in sheet, row and cell
/// order, joined with single spaces.
pub fn xlsx_text(bytes: &[u8]) -> Result<String, FormatError> {
    let mut archive = open_archive(bytes)?;
    let shared_strings = match read_optional_entry(&mut archive, "xl/sharedStrings.xml")? {
        Some(xml) => parse_shared_strings(&xml)?,
        None => Vec::new(),
    };
    let sheet_names = worksheet_order(&mut archive)?;

    let mut values: Vec<String> = Vec::new();
    for name in sheet_names.into_iter().take(XLSX_MAX_SHEETS) {
        let sheet_xml = read_zip_entry_bounded(&mut archive, &name, MAX_XML_ENTRY_BYTES)?;
        values.extend(xlsx_sheet_cells(&sheet_xml, &shared_strings)?);
    }
    Ok(values.join(" "))
}

fn parse_shared_strings(xml: &[u8]) -> Result<Vec<String>, FormatError> {
    let mut strings = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = current.is_some(),
                _ => {}
            },
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"si" => {
                strings.push(String::new());
            }
            Ok(Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(&te.unescape().map_err(xml_err)?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"si" => {
                    if let Some(s) = current.take() {
                        strings.push(s);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

/// Worksheet entry names in workbook tab order.
///
/// Resolved through `xl/workbook.xml` and its relationships; falls back to
/// numeric `sheetN.xml` order when either part is missing.
fn worksheet_order(archive: &mut Archive<'_>) -> Result<Vec<String>, FormatError> {
    let workbook = read_optional_entry(archive, "xl/workbook.xml")?;
    let rels = read_optional_entry(archive, "xl/_rels/workbook.xml.rels")?;

    if let (Some(workbook), Some(rels)) = (workbook, rels) {
        let rel_ids = attribute_values(&workbook, b"sheet", b"id")?;
        let targets = relationship_targets(&rels)?;
        let ordered: Vec<String> = rel_ids
            .iter()
            .filter_map(|id| targets.iter().find(|(rid, _)| rid == id))
            .map(|(_, target)| resolve_part(target))
            .filter(|name| archive.index_for_name(name).is_some())
            .collect();
        if !ordered.is_empty() {
            return Ok(ordered);
        }
    }

    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with("xl/worksheets/sheet") && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches("xl/worksheets/sheet")
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    Ok(names)
}

fn resolve_part(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("xl/{}", target),
    }
}

/// Values of attribute `attr` (matched by local name) on every `element`.
fn attribute_values(xml: &[u8], element: &[u8], attr: &[u8]) -> Result<Vec<String>, FormatError> {
    let mut out = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e)) if e.local_name().as_ref() == element => {
                for a in e.attributes().flatten() {
                    if a.key.local_name().as_ref() == attr {
                        out.push(a.unescape_value().map_err(xml_err)?.into_owned());
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn relationship_targets(xml: &[u8]) -> Result<Vec<(String, String)>, FormatError> {
    let mut out = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) | Ok(Event::Empty(e))
                if e.local_name().as_ref() == b"Relationship" =>
            {
                let mut id = None;
                let mut target = None;
                for a in e.attributes().flatten() {
                    match a.key.local_name().as_ref() {
                        b"Id" => id = Some(a.unescape_value().map_err(xml_err)?.into_owned()),
                        b"Target" => {
                            target = Some(a.unescape_value().map_err(xml_err)?.into_owned())
                        }
                        _ => {}
                    }
                }
                if let (Some(id), Some(target)) = (id, target) {
                    out.push((id, target));
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

fn xlsx_sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<Vec<String>, FormatError> {
    let mut cells: Vec<String> = Vec::new();
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut cell_type: Option<String> = None;
    let mut value: Option<String> = None;
    let mut capturing = false;

    loop {
        if cells.len() >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"c" => {
                    cell_type = None;
                    value = None;
                    for a in e.attributes().flatten() {
                        if a.key.as_ref() == b"t" {
                            cell_type = Some(a.unescape_value().map_err(xml_err)?.into_owned());
                        }
                    }
                }
                // <v> holds the stored value, <t> the inline-string runs.
                b"v" | b"t" => {
                    capturing = true;
                    value.get_or_insert_with(String::new);
                }
                _ => {}
            },
            Ok(Event::Text(te)) if capturing => {
                if let Some(v) = value.as_mut() {
                    v.push_str(&te.unescape().map_err(xml_err)?);
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" | b"t" => capturing = false,
                b"c" => {
                    if let Some(raw) = value.take() {
                        if let Some(text) = cell_display(cell_type.as_deref(), raw, shared_strings) {
                            cells.push(text);
                        }
                    }
                    cell_type = None;
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_err(e)),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells)
}

/// String form of one cell's stored value, by its `t` attribute.
fn cell_display(cell_type: Option<&str>, raw: String, shared_strings: &[String]) -> Option<String> {
    match cell_type {
        Some("s") => raw
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|i| shared_strings.get(i).cloned()),
        Some("b") => Some(if raw.trim() == "1" { "TRUE" } else { "FALSE" }.to_string()),
        _ => Some(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with(entries: &[(&str, &str)]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(std::io::Cursor::new(&mut buf));
            for (name, body) in entries {
                zip.start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(body.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    const W: &str = "xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"";

    #[test]
    fn invalid_pdf_returns_error() {
        let err = pdf_text(b"not a pdf").unwrap_err();
        assert!(matches!(err, FormatError::Pdf(_)));
    }

    #[test]
    fn invalid_zip_returns_error_for_docx() {
        let err = docx_text(b"not a zip").unwrap_err();
        assert!(matches!(err, FormatError::Ooxml(_)));
    }

    #[test]
    fn docx_without_document_part_is_an_error() {
        let bytes = zip_with(&[("word/styles.xml", "<styles/>")]);
        assert!(matches!(docx_text(&bytes), Err(FormatError::Ooxml(_))));
    }

    #[test]
    fn docx_paragraphs_join_with_newlines() {
        let xml = format!(
            "<w:document {W}><w:body>\
             <w:p><w:r><w:t>Intro</w:t></w:r></w:p>\
             <w:p><w:r><w:t xml:space=\"preserve\">Bo</w:t></w:r><w:r><w:t>dy</w:t></w:r></w:p>\
             </w:body></w:document>"
        );
        let bytes = zip_with(&[("word/document.xml", &xml)]);
        assert_eq!(docx_text(&bytes).unwrap(), "Intro\nBody");
    }

    #[test]
    fn docx_keeps_empty_paragraphs_and_run_tabs() {
        let xml = format!(
            "<w:document {W}><w:body>\
             <w:p><w:pPr><w:tabs><w:tab w:val=\"left\" w:pos=\"720\"/></w:tabs></w:pPr>\
             <w:r><w:t>a</w:t><w:tab/><w:t>b &amp; c</w:t></w:r></w:p>\
             <w:p/>\
             <w:p><w:r><w:t xml:space=\"preserve\"> end </w:t></w:r></w:p>\
             </w:body></w:document>"
        );
        let bytes = zip_with(&[("word/document.xml", &xml)]);
        assert_eq!(docx_text(&bytes).unwrap(), "a\tb & c\n\n end ");
    }

    #[test]
    fn empty_docx_body_is_empty_text() {
        let xml = format!("<w:document {W}><w:body></w:body></w:document>");
        let bytes = zip_with(&[("word/document.xml", &xml)]);
        assert_eq!(docx_text(&bytes).unwrap(), "");
    }

    #[test]
    fn xlsx_cells_follow_workbook_sheet_order() {
        let workbook = "<workbook xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"><sheets>\
             <sheet name=\"First\" sheetId=\"1\" r:id=\"rId2\"/>\
             <sheet name=\"Second\" sheetId=\"2\" r:id=\"rId1\"/>\
             </sheets></workbook>";
        let rels = "<Relationships>\
             <Relationship Id=\"rId1\" Target=\"worksheets/sheet1.xml\"/>\
             <Relationship Id=\"rId2\" Target=\"/xl/worksheets/sheet2.xml\"/>\
             </Relationships>";
        let shared = "<sst><si><t>Name</t></si><si><r><t>Ri</t></r><r><t>ch</t></r></si></sst>";
        let sheet1 = "<worksheet><sheetData><row r=\"1\">\
             <c r=\"A1\" t=\"b\"><v>1</v></c><c r=\"B1\"/>\
             </row></sheetData></worksheet>";
        let sheet2 = "<worksheet><sheetData>\
             <row r=\"1\"><c r=\"A1\" t=\"s\"><v>0</v></c><c r=\"B1\"><v>42</v></c></row>\
             <row r=\"2\"><c r=\"A2\" t=\"s\"><v>1</v></c>\
             <c r=\"B2\" t=\"inlineStr\"><is><t>inline</t></is></c>\
             <c r=\"C2\" t=\"str\"><f>A1&amp;\"x\"</f><v>Namex</v></c></row>\
             </sheetData></worksheet>";
        let bytes = zip_with(&[
            ("xl/workbook.xml", workbook),
            ("xl/_rels/workbook.xml.rels", rels),
            ("xl/sharedStrings.xml", shared),
            ("xl/worksheets/sheet1.xml", sheet1),
            ("xl/worksheets/sheet2.xml", sheet2),
        ]);
        assert_eq!(
            xlsx_text(&bytes).unwrap(),
            "Name 42 Rich inline Namex TRUE"
        );
    }

    #[test]
    fn xlsx_without_workbook_falls_back_to_numeric_order() {
        let sheet = |v: &str| {
            format!("<worksheet><sheetData><row><c><v>{}</v></c></row></sheetData></worksheet>", v)
        };
        let (s2, s10) = (sheet("two"), sheet("ten"));
        let bytes = zip_with(&[
            ("xl/worksheets/sheet10.xml", &s10),
            ("xl/worksheets/sheet2.xml", &s2),
        ]);
        assert_eq!(xlsx_text(&bytes).unwrap(), "two ten");
    }

    #[test]
    fn extract_file_reports_missing_file_as_not_found() {
        let err = extract_file(Path::new("/definitely/not/here.docx"), FileFormat::Docx)
            .unwrap_err();
        assert!(matches!(err, ExtractError::NotFound(_)));
        assert_eq!(err.source_id(), "/definitely/not/here.docx");
    }

    #[test]
    fn extract_file_wraps_parse_failures_with_the_path() {
        let tmp = tempfile::TempDir::new().unwrap();
        let path = tmp.path().join("broken.xlsx");
        std::fs::write(&path, b"garbage").unwrap();
        let err = extract_file(&path, FileFormat::Xlsx).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Format {
                cause: FormatError::Ooxml(_),
                ..
            }
        ));
        assert!(err.to_string().contains("broken.xlsx"));
    }
}
