//! Extraction through the public facade against files on disk.

use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::TempDir;

use summary_harness::config::{parse_config, Config};
use summary_harness::export::{Exporter, FileExporter};
use summary_harness::extract::{self, ExtractError, FormatError};
use summary_harness::ingest::Extractor;

fn test_config() -> Config {
    parse_config(
        r#"[db]
path = "./unused.sqlite"

[store]
table = "summaries"

[store.columns]
id = "id"
source_url = "source_url"
summary_text = "summary_text"
style = "style"
language = "language"
created_at = "created_at"
"#,
    )
    .unwrap()
}

fn write_zip(path: &Path, entries: &[(&str, &str)]) {
    let mut zip = zip::ZipWriter::new(fs::File::create(path).unwrap());
    for (name, content) in entries {
        zip.start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(content.as_bytes()).unwrap();
    }
    zip.finish().unwrap();
}

const WORKBOOK: &str = r#"<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="First" sheetId="1" r:id="rId1"/><sheet name="Second" sheetId="2" r:id="rId2"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet2.xml"/></Relationships>"#;

const SHARED_STRINGS: &str = r#"<sst xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><si><t>Region</t></si><si><t>North</t></si></sst>"#;

const SHEET1: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="s"><v>0</v></c><c r="B1"><v>42</v></c></row><row r="2"><c r="A2" t="s"><v>1</v></c><c r="B2" t="b"><v>1</v></c></row></sheetData></worksheet>"#;

const SHEET2: &str = r#"<worksheet xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main"><sheetData><row r="1"><c r="A1" t="inlineStr"><is><t>Totals</t></is></c></row></sheetData></worksheet>"#;

#[tokio::test]
async fn docx_paragraphs_are_joined_by_newlines() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("memo.docx");
    write_zip(
        &path,
        &[(
            "word/document.xml",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Intro</w:t></w:r></w:p><w:p><w:r><w:t>Bo</w:t></w:r><w:r><w:t>dy</w:t></w:r></w:p></w:body></w:document>"#,
        )],
    );

    let extractor = Extractor::new(&test_config()).unwrap();
    let text = extractor.extract_text(path.to_str().unwrap()).await.unwrap();
    assert_eq!(text, "Intro\nBody");
}

#[tokio::test]
async fn xlsx_cells_follow_sheet_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("sales.xlsx");
    write_zip(
        &path,
        &[
            ("xl/workbook.xml", WORKBOOK),
            ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS),
            ("xl/sharedStrings.xml", SHARED_STRINGS),
            ("xl/worksheets/sheet2.xml", SHEET2),
            ("xl/worksheets/sheet1.xml", SHEET1),
        ],
    );

    let extractor = Extractor::new(&test_config()).unwrap();
    let text = extractor.extract_text(path.to_str().unwrap()).await.unwrap();
    assert_eq!(text, "Region 42 North TRUE Totals");
}

#[tokio::test]
async fn extension_match_is_case_insensitive() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("MEMO.DOCX");
    write_zip(
        &path,
        &[(
            "word/document.xml",
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body><w:p><w:r><w:t>Loud</w:t></w:r></w:p></w:body></w:document>"#,
        )],
    );

    let extractor = Extractor::new(&test_config()).unwrap();
    let text = extractor.extract_text(path.to_str().unwrap()).await.unwrap();
    assert_eq!(text, "Loud");
}

#[tokio::test]
async fn pdf_pages_are_extracted_in_order() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("long.pdf");
    // 50 lines fit on a page, so this spills onto a second one.
    let mut lines = vec!["Openingline".to_string()];
    lines.extend((1..59).map(|i| format!("Filler{}", i)));
    lines.push("Closingline".to_string());
    FileExporter.export(&lines.join("\n"), &path).unwrap();

    let bytes = fs::read(&path).unwrap();
    let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).unwrap();
    assert_eq!(pages.len(), 2);
    assert!(pages[0].contains("Openingline"));
    assert!(pages[1].contains("Closingline"));
    assert_eq!(
        extract::pdf_text(&bytes).unwrap(),
        format!("{}\n{}\n", pages[0], pages[1])
    );

    let extractor = Extractor::new(&test_config()).unwrap();
    let text = extractor.extract_text(path.to_str().unwrap()).await.unwrap();
    let opening = text.find("Openingline").unwrap();
    let closing = text.find("Closingline").unwrap();
    assert!(opening < closing);
    assert!(text.contains("Filler30"));
    assert!(text.ends_with('\n'));
}

#[tokio::test]
async fn unsupported_extension_is_reported() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("notes.txt");
    fs::write(&path, "hello").unwrap();

    let extractor = Extractor::new(&test_config()).unwrap();
    let err = extractor
        .extract_text(path.to_str().unwrap())
        .await
        .unwrap_err();
    match err {
        ExtractError::UnsupportedFormat { ext, .. } => assert_eq!(ext, "txt"),
        other => panic!("expected UnsupportedFormat, got {:?}", other),
    }
}

#[tokio::test]
async fn missing_file_is_not_found() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("gone.pdf");

    let extractor = Extractor::new(&test_config()).unwrap();
    let err = extractor
        .extract_text(path.to_str().unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, ExtractError::NotFound(_)));
    assert_eq!(err.source_id(), path.to_str().unwrap());
}

#[tokio::test]
async fn corrupt_pdf_is_a_format_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("broken.pdf");
    fs::write(&path, b"this is not a pdf").unwrap();

    let extractor = Extractor::new(&test_config()).unwrap();
    let err = extractor
        .extract_text(path.to_str().unwrap())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ExtractError::Format {
                cause: FormatError::Pdf(_),
                ..
            }
        ),
        "got {:?}",
        err
    );
}

#[tokio::test]
async fn docx_that_is_not_a_zip_is_a_format_error() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("fake.docx");
    fs::write(&path, b"plain bytes").unwrap();

    let extractor = Extractor::new(&test_config()).unwrap();
    let err = extractor
        .extract_text(path.to_str().unwrap())
        .await
        .unwrap_err();
    assert!(
        matches!(
            err,
            ExtractError::Format {
                cause: FormatError::Ooxml(_),
                ..
            }
        ),
        "got {:?}",
        err
    );
}
