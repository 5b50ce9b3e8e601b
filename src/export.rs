//! Export a summary to a file, format chosen by extension.
//!
//! Supports `.txt`, `.pdf`, `.docx`, `.xlsx`, `.png` and `.jpg`/`.jpeg`.
//! Unknown extensions are reported as [`ExportOutcome::Unsupported`] with a
//! warning rather than failing the run.

use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{ImageFormat, Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream};
use quick_xml::escape::escape;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;

/// Result of an export attempt that did not hit an I/O error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportOutcome {
    Written(PathBuf),
    /// The lowercased extension (without dot) that has no writer.
    Unsupported(String),
}

/// Writes summary text somewhere.
pub trait Exporter {
    fn export(&self, text: &str, path: &Path) -> Result<ExportOutcome>;
}

/// Writes summaries as local files.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileExporter;

impl Exporter for FileExporter {
    fn export(&self, text: &str, path: &Path) -> Result<ExportOutcome> {
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        let write: fn(&str, &Path) -> Result<()> = match ext.as_str() {
            "txt" => write_txt,
            "pdf" => write_pdf,
            "docx" => write_docx,
            "xlsx" => write_xlsx,
            "png" => write_png,
            "jpg" | "jpeg" => write_jpeg,
            _ => {
                warn!(
                    path = %path.display(),
                    "unsupported export format '.{}'; use .txt, .pdf, .docx, .xlsx, .png or .jpg", ext
                );
                return Ok(ExportOutcome::Unsupported(ext));
            }
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
        }
        write(text, path).with_context(|| format!("Failed to export to {}", path.display()))?;
        info!(path = %path.display(), "summary exported");
        Ok(ExportOutcome::Written(path.to_path_buf()))
    }
}

fn write_txt(text: &str, path: &Path) -> Result<()> {
    std::fs::write(path, text)?;
    Ok(())
}

const PDF_FONT_SIZE: i64 = 11;
const PDF_LEADING: i64 = 14;
const PDF_LINES_PER_PAGE: usize = 50;
const PDF_WRAP_COLUMNS: usize = 90;

fn write_pdf(text: &str, path: &Path) -> Result<()> {
    let lines = wrap_lines(text, PDF_WRAP_COLUMNS);

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    let chunks: Vec<&[String]> = if lines.is_empty() {
        vec![lines.as_slice()]
    } else {
        lines.chunks(PDF_LINES_PER_PAGE).collect()
    };
    for page_lines in chunks {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), PDF_FONT_SIZE.into()]),
            Operation::new("TL", vec![PDF_LEADING.into()]),
            Operation::new("Td", vec![50.into(), 792.into()]),
        ];
        for line in page_lines {
            operations.push(Operation::new("T*", vec![]));
            operations.push(Operation::new(
                "Tj",
                vec![Object::string_literal(to_latin1(line))],
            ));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.save(path)?;
    Ok(())
}

/// Latin-1 bytes; characters outside it become `?`.
fn to_latin1(line: &str) -> Vec<u8> {
    line.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}

/// Greedy word wrap per input line; blank input lines are kept.
fn wrap_lines(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    for raw in text.lines() {
        let mut line = String::new();
        for word in raw.split_whitespace() {
            if !line.is_empty() && line.chars().count() + 1 + word.chars().count() > width {
                out.push(std::mem::take(&mut line));
            }
            if !line.is_empty() {
                line.push(' ');
            }
            line.push_str(word);
        }
        out.push(line);
    }
    out
}

const IMAGE_WIDTH: u32 = 800;
const IMAGE_PADDING: u32 = 50;
const GLYPH_SCALE: u32 = 2;
const GLYPH_SIZE: u32 = 8 * GLYPH_SCALE;
const IMAGE_LINE_GAP: u32 = 5;

fn write_png(text: &str, path: &Path) -> Result<()> {
    render_image(text).save_with_format(path, ImageFormat::Png)?;
    Ok(())
}

fn write_jpeg(text: &str, path: &Path) -> Result<()> {
    render_image(text).save_with_format(path, ImageFormat::Jpeg)?;
    Ok(())
}

/// Black text on white, wrapped to the width inside the padding; the
/// height grows with the line count.
fn render_image(text: &str) -> RgbImage {
    let columns = ((IMAGE_WIDTH - 2 * IMAGE_PADDING) / GLYPH_SIZE) as usize;
    let lines = wrap_lines(text, columns);
    let line_height = GLYPH_SIZE + IMAGE_LINE_GAP;
    let height = 2 * IMAGE_PADDING + lines.len() as u32 * line_height;

    let mut img = RgbImage::from_pixel(IMAGE_WIDTH, height, Rgb([255, 255, 255]));
    for (row, line) in lines.iter().enumerate() {
        let y = IMAGE_PADDING + row as u32 * line_height;
        for (col, ch) in line.chars().take(columns).enumerate() {
            let x = IMAGE_PADDING + col as u32 * GLYPH_SIZE;
            draw_glyph(&mut img, ch, x, y);
        }
    }
    img
}

fn draw_glyph(img: &mut RgbImage, ch: char, x: u32, y: u32) {
    let glyph = BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8]);
    for (gy, bits) in glyph.iter().enumerate() {
        for gx in 0..8u32 {
            if bits & (1 << gx) == 0 {
                continue;
            }
            for dy in 0..GLYPH_SCALE {
                for dx in 0..GLYPH_SCALE {
                    img.put_pixel(
                        x + gx * GLYPH_SCALE + dx,
                        y + gy as u32 * GLYPH_SCALE + dy,
                        Rgb([0, 0, 0]),
                    );
                }
            }
        }
    }
}

const CONTENT_TYPES_DOCX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/></Types>"#;

const ROOT_RELS_DOCX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

fn write_docx(text: &str, path: &Path) -> Result<()> {
    let mut body = String::new();
    for line in text.lines() {
        body.push_str(&format!(
            "<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
            escape(line)
        ));
    }
    let document = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
         <w:body>{}</w:body></w:document>",
        body
    );

    write_package(
        path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES_DOCX),
            ("_rels/.rels", ROOT_RELS_DOCX),
            ("word/document.xml", &document),
        ],
    )
}

const CONTENT_TYPES_XLSX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/></Types>"#;

const ROOT_RELS_XLSX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK_XLSX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Summary" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS_XLSX: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/></Relationships>"#;

/// Header in A1, the summary in A2, both as inline strings.
fn write_xlsx(text: &str, path: &Path) -> Result<()> {
    let sheet = format!(
        "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\n\
         <worksheet xmlns=\"http://schemas.openxmlformats.org/spreadsheetml/2006/main\"><sheetData>\
         <row r=\"1\"><c r=\"A1\" t=\"inlineStr\"><is><t>Article Summary</t></is></c></row>\
         <row r=\"2\"><c r=\"A2\" t=\"inlineStr\"><is><t xml:space=\"preserve\">{}</t></is></c></row>\
         </sheetData></worksheet>",
        escape(text)
    );

    write_package(
        path,
        &[
            ("[Content_Types].xml", CONTENT_TYPES_XLSX),
            ("_rels/.rels", ROOT_RELS_XLSX),
            ("xl/workbook.xml", WORKBOOK_XLSX),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS_XLSX),
            ("xl/worksheets/sheet1.xml", &sheet),
        ],
    )
}

fn write_package(path: &Path, parts: &[(&str, &str)]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    let mut zip = zip::ZipWriter::new(file);
    for (name, body) in parts {
        zip.start_file(*name, SimpleFileOptions::default())?;
        zip.write_all(body.as_bytes())?;
    }
    zip.finish()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use tempfile::TempDir;

    #[test]
    fn txt_export_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("out/nested/summary.txt");
        let outcome = FileExporter.export("résumé", &path).unwrap();
        assert_eq!(outcome, ExportOutcome::Written(path.clone()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "résumé");
    }

    #[test]
    fn docx_export_is_readable_by_the_extractor() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summary.DOCX");
        FileExporter
            .export("First <line> & more\nSecond line", &path)
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(
            extract::docx_text(&bytes).unwrap(),
            "First <line> & more\nSecond line"
        );
    }

    #[test]
    fn xlsx_export_has_header_and_summary_cells() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summary.xlsx");
        FileExporter.export("Short summary", &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(
            extract::xlsx_text(&bytes).unwrap(),
            "Article Summary Short summary"
        );
    }

    #[test]
    fn pdf_export_writes_a_pdf_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summary.pdf");
        let long = "word ".repeat(2000);
        FileExporter.export(&long, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.5"));
        let doc = Document::load(&path).unwrap();
        assert!(doc.get_pages().len() > 1);
    }

    #[test]
    fn png_export_wraps_text_into_an_800px_image() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("summary.png");
        // 60 words of 4 characters: 8 per 43-column line, so 8 lines.
        let text = "word ".repeat(60);
        let outcome = FileExporter.export(&text, &path).unwrap();
        assert_eq!(outcome, ExportOutcome::Written(path.clone()));

        let img = image::open(&path).unwrap().to_rgb8();
        assert_eq!(img.width(), 800);
        assert_eq!(img.height(), 2 * 50 + 8 * (16 + 5));
        assert_eq!(*img.get_pixel(0, 0), Rgb([255, 255, 255]));
        assert!(img.pixels().any(|p| *p == Rgb([0, 0, 0])));
    }

    #[test]
    fn jpeg_export_decodes_with_expected_width() {
        let tmp = TempDir::new().unwrap();
        for name in ["summary.jpg", "summary.JPEG"] {
            let path = tmp.path().join(name);
            FileExporter.export("Short summary", &path).unwrap();
            let img = image::open(&path).unwrap();
            assert_eq!(img.width(), 800);
            assert_eq!(img.height(), 2 * 50 + 16 + 5);
        }
    }

    #[test]
    fn blank_text_renders_padding_only() {
        let img = render_image("");
        assert_eq!((img.width(), img.height()), (800, 100));
        assert!(img.pixels().all(|p| *p == Rgb([255, 255, 255])));
    }

    #[test]
    fn unknown_extensions_are_unsupported() {
        let tmp = TempDir::new().unwrap();
        for name in ["summary.md", "summary.gif", "summary"] {
            let path = tmp.path().join(name);
            let outcome = FileExporter.export("text", &path).unwrap();
            assert!(matches!(outcome, ExportOutcome::Unsupported(_)));
            assert!(!path.exists());
        }
    }

    #[test]
    fn wrap_respects_width_and_keeps_blank_lines() {
        let lines = wrap_lines("aaa bbb ccc\n\nddd", 7);
        assert_eq!(lines, vec!["aaa bbb", "ccc", "", "ddd"]);
    }

    #[test]
    fn latin1_replaces_wide_characters() {
        assert_eq!(to_latin1("é→"), vec![0xE9, b'?']);
    }
}
