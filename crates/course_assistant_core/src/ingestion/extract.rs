//! Plain-text extraction from uploaded PDF, DOCX, PPTX and TXT files.
//!
//! Office documents are zip archives of XML parts. They are spooled to a
//! `NamedTempFile` before being opened, and the file is removed when the handle
//! drops, on success and on every error path alike.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fs::File;
use std::io::{Read, Write};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::ZipArchive;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Unsupported file type: {0}")]
    UnsupportedFileType(String),
    #[error("Error while extracting text from the PDF: {0}")]
    Pdf(String),
    #[error("Error while reading the {kind} archive: {message}")]
    Archive { kind: &'static str, message: String },
    #[error("Error while parsing the {kind} XML: {message}")]
    Xml { kind: &'static str, message: String },
    #[error("I/O error during extraction: {0}")]
    Io(#[from] std::io::Error),
}

/// Supported upload formats, selected by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    Pptx,
    Txt,
}

impl DocumentKind {
    pub fn from_file_name(name: &str) -> Option<Self> {
        match super::extension_of(name).as_str() {
            ".pdf" => Some(DocumentKind::Pdf),
            ".docx" => Some(DocumentKind::Docx),
            ".pptx" => Some(DocumentKind::Pptx),
            ".txt" => Some(DocumentKind::Txt),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            DocumentKind::Pdf => ".pdf",
            DocumentKind::Docx => ".docx",
            DocumentKind::Pptx => ".pptx",
            DocumentKind::Txt => ".txt",
        }
    }
}

/// Extracts the text of a document of the given kind.
pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractionError> {
    let text = match kind {
        DocumentKind::Pdf => extract_pdf(bytes)?,
        DocumentKind::Docx => extract_docx(bytes)?,
        DocumentKind::Pptx => extract_pptx(bytes)?,
        DocumentKind::Txt => decode_text(bytes),
    };
    debug!(kind = ?kind, chars = text.len(), "Extracted document text");
    Ok(text)
}

//=========================================================================================
// PDF
//=========================================================================================

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractionError> {
    // The PDF parser panics on some malformed inputs; treat that as a failed extraction.
    let pages = std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem_by_pages(bytes))
        .map_err(|_| ExtractionError::Pdf("the parser aborted on a malformed document".to_string()))?
        .map_err(|e| ExtractionError::Pdf(format!("{:?}", e)))?;

    // Every page, empty ones included, is followed by a blank line.
    Ok(pages.iter().map(|page| format!("{}\n\n", page)).collect())
}

//=========================================================================================
// Office Open XML (DOCX / PPTX)
//=========================================================================================

fn spool_to_temp_file(bytes: &[u8], suffix: &str) -> Result<NamedTempFile, ExtractionError> {
    let mut file = tempfile::Builder::new()
        .prefix("course-upload-")
        .suffix(suffix)
        .tempfile()?;
    file.write_all(bytes)?;
    file.flush()?;
    Ok(file)
}

fn open_archive(file: &NamedTempFile, kind: &'static str) -> Result<ZipArchive<File>, ExtractionError> {
    ZipArchive::new(file.reopen()?).map_err(|e| ExtractionError::Archive {
        kind,
        message: e.to_string(),
    })
}

fn read_part(
    archive: &mut ZipArchive<File>,
    part: &str,
    kind: &'static str,
) -> Result<String, ExtractionError> {
    let mut entry = archive.by_name(part).map_err(|e| ExtractionError::Archive {
        kind,
        message: format!("{}: {}", part, e),
    })?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

fn xml_error(kind: &'static str, err: quick_xml::Error) -> ExtractionError {
    ExtractionError::Xml {
        kind,
        message: err.to_string(),
    }
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let temp = spool_to_temp_file(bytes, ".docx")?;
    let mut archive = open_archive(&temp, "DOCX")?;
    let xml = read_part(&mut archive, "word/document.xml", "DOCX")?;
    docx_paragraphs(&xml)
}

/// Body paragraphs of a `word/document.xml` part, one per line.
/// Paragraphs nested in tables are not part of the body paragraph list.
fn docx_paragraphs(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut paragraph = String::new();
    let mut table_depth = 0usize;
    let mut in_run_text = false;

    loop {
        match reader.read_event().map_err(|e| xml_error("DOCX", e))? {
            Event::Start(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth += 1,
                b"w:p" => paragraph.clear(),
                b"w:t" => in_run_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"w:p" if table_depth == 0 => text.push('\n'),
                b"w:tab" => paragraph.push('\t'),
                b"w:br" | b"w:cr" => paragraph.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_run_text => {
                paragraph.push_str(&t.unescape().map_err(|e| xml_error("DOCX", e))?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"w:tbl" => table_depth = table_depth.saturating_sub(1),
                b"w:t" => in_run_text = false,
                b"w:p" if table_depth == 0 => {
                    text.push_str(&paragraph);
                    text.push('\n');
                    paragraph.clear();
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractionError> {
    let temp = spool_to_temp_file(bytes, ".pptx")?;
    let mut archive = open_archive(&temp, "PPTX")?;

    let mut slides: Vec<(u32, String)> = archive
        .file_names()
        .filter_map(|name| {
            let number = name
                .strip_prefix("ppt/slides/slide")?
                .strip_suffix(".xml")?
                .parse()
                .ok()?;
            Some((number, name.to_string()))
        })
        .collect();
    slides.sort_by_key(|(number, _)| *number);

    let mut text = String::new();
    for (_, part) in slides {
        let xml = read_part(&mut archive, &part, "PPTX")?;
        text.push_str(&slide_text(&xml)?);
        text.push('\n');
    }
    Ok(text)
}

/// Text of every top-level shape on a slide, one shape per line.
fn slide_text(xml: &str) -> Result<String, ExtractionError> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut group_depth = 0usize;
    let mut in_shape = false;
    let mut paragraphs: Vec<String> = Vec::new();
    let mut paragraph = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event().map_err(|e| xml_error("PPTX", e))? {
            Event::Start(e) => match e.name().as_ref() {
                b"p:grpSp" => group_depth += 1,
                b"p:sp" if group_depth == 0 => {
                    in_shape = true;
                    paragraphs.clear();
                }
                b"a:p" if in_shape => paragraph.clear(),
                b"a:t" => in_run_text = true,
                _ => {}
            },
            Event::Empty(e) => match e.name().as_ref() {
                b"a:p" if in_shape => paragraphs.push(String::new()),
                b"a:br" if in_shape => paragraph.push('\n'),
                b"p:sp" if group_depth == 0 => text.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_shape && in_run_text => {
                paragraph.push_str(&t.unescape().map_err(|e| xml_error("PPTX", e))?);
            }
            Event::End(e) => match e.name().as_ref() {
                b"p:grpSp" => group_depth = group_depth.saturating_sub(1),
                b"a:t" => in_run_text = false,
                b"a:p" if in_shape => paragraphs.push(std::mem::take(&mut paragraph)),
                b"p:sp" if in_shape && group_depth == 0 => {
                    text.push_str(&paragraphs.join("\n"));
                    text.push('\n');
                    in_shape = false;
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(text)
}

//=========================================================================================
// Plain Text
//=========================================================================================

type Decoder = fn(&[u8]) -> Option<String>;

fn decode_utf8(bytes: &[u8]) -> Option<String> {
    std::str::from_utf8(bytes).ok().map(str::to_string)
}

/// ISO-8859-1 maps every byte to the code point of the same value.
fn decode_latin1(bytes: &[u8]) -> Option<String> {
    Some(bytes.iter().map(|&b| b as char).collect())
}

fn decode_windows_1252(bytes: &[u8]) -> Option<String> {
    encoding_rs::WINDOWS_1252
        .decode_without_bom_handling_and_without_replacement(bytes)
        .map(|text| text.into_owned())
}

const TEXT_DECODERS: [(&str, Decoder); 3] = [
    ("utf-8", decode_utf8),
    ("latin-1", decode_latin1),
    ("windows-1252", decode_windows_1252),
];

/// Decodes raw bytes with the first encoding that accepts them. Never fails:
/// the last resort is UTF-8 with invalid sequences dropped.
pub fn decode_text(bytes: &[u8]) -> String {
    for (label, decode) in TEXT_DECODERS {
        if let Some(text) = decode(bytes) {
            if label != "utf-8" {
                debug!(encoding = label, "Decoded text upload with fallback encoding");
            }
            return text;
        }
    }
    warn!("No encoding matched the text upload; dropping invalid bytes");
    String::from_utf8_lossy(bytes).replace('\u{FFFD}', "")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use zip::write::SimpleFileOptions;

    fn zip_with(parts: &[(&str, &str)]) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        for (name, content) in parts {
            writer.start_file(*name, SimpleFileOptions::default()).unwrap();
            writer.write_all(content.as_bytes()).unwrap();
        }
        writer.finish().unwrap().into_inner()
    }

    #[test]
    fn detects_kind_from_extension() {
        assert_eq!(DocumentKind::from_file_name("slides.PPTX"), Some(DocumentKind::Pptx));
        assert_eq!(DocumentKind::from_file_name("report.docx"), Some(DocumentKind::Docx));
        assert_eq!(DocumentKind::from_file_name("README"), None);
        assert_eq!(DocumentKind::from_file_name("data.csv"), None);
    }

    #[test]
    fn utf8_text_is_kept_as_is() {
        assert_eq!(decode_text("Moyenne et médiane".as_bytes()), "Moyenne et médiane");
    }

    #[test]
    fn invalid_utf8_falls_back_to_latin1() {
        // "café" encoded as ISO-8859-1.
        assert_eq!(decode_text(&[0x63, 0x61, 0x66, 0xE9]), "café");
    }

    #[test]
    fn docx_paragraphs_are_joined_by_newlines() {
        let document = r#"<?xml version="1.0" encoding="UTF-8"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
<w:p><w:r><w:t>Descriptive</w:t></w:r><w:r><w:t xml:space="preserve"> statistics</w:t></w:r></w:p>
<w:p/>
<w:tbl><w:tr><w:tc><w:p><w:r><w:t>in a table</w:t></w:r></w:p></w:tc></w:tr></w:tbl>
<w:p><w:r><w:t>Mean &amp; median</w:t></w:r></w:p>
</w:body></w:document>"#;
        let bytes = zip_with(&[("word/document.xml", document)]);
        let text = extract_text(DocumentKind::Docx, &bytes).unwrap();
        assert_eq!(text, "Descriptive statistics\n\nMean & median\n");
    }

    #[test]
    fn pptx_slides_are_separated_by_blank_lines() {
        let slide = |title: &str, body: &str| {
            format!(
                r#"<p:sld xmlns:p="p" xmlns:a="a"><p:cSld><p:spTree>
<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp>
<p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p><a:p><a:r><a:t>more</a:t></a:r></a:p></p:txBody></p:sp>
</p:spTree></p:cSld></p:sld>"#,
                title, body
            )
        };
        let first = slide("Intro", "Welcome");
        let second = slide("Outline", "Topics");
        let bytes = zip_with(&[
            ("ppt/slides/slide10.xml", second.as_str()),
            ("ppt/slides/slide2.xml", first.as_str()),
            ("ppt/presentation.xml", "<p:presentation xmlns:p=\"p\"/>"),
        ]);
        let text = extract_text(DocumentKind::Pptx, &bytes).unwrap();
        assert_eq!(text, "Intro\nWelcome\nmore\n\nOutline\nTopics\nmore\n\n");
    }

    #[test]
    fn corrupt_archive_is_an_error_not_a_panic() {
        let err = extract_text(DocumentKind::Docx, b"definitely not a zip").unwrap_err();
        assert!(matches!(err, ExtractionError::Archive { kind: "DOCX", .. }));
    }

    #[test]
    fn invalid_pdf_is_an_error() {
        assert!(extract_text(DocumentKind::Pdf, b"This is not a PDF").is_err());
    }

    /// A minimal PDF with one line of Courier text per page.
    fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
        use lopdf::content::{Content, Operation};
        use lopdf::{dictionary, Document, Object, Stream};

        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for text in pages {
            let content = Content {
                operations: vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![100.into(), 600.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*text)]),
                    Operation::new("ET", vec![]),
                ],
            };
            let content_id =
                doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
            });
            kids.push(page_id.into());
        }

        let pages_dict = dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages.len() as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 595.into(), 842.into()],
        };
        doc.objects.insert(pages_id, Object::Dictionary(pages_dict));
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut out = Vec::new();
        doc.save_to(&mut out).unwrap();
        out
    }

    #[test]
    fn pdf_pages_are_separated_by_a_blank_line() {
        let bytes = pdf_with_pages(&["PageOneText", "PageTwoText"]);
        let text = extract_text(DocumentKind::Pdf, &bytes).unwrap();

        let first = text.find("PageOneText").unwrap();
        let second = text.find("PageTwoText").unwrap();
        assert!(first < second);
        let between = &text[first + "PageOneText".len()..second];
        assert!(between.contains("\n\n"), "pages not separated: {:?}", text);
        assert!(text.ends_with("\n\n"));
    }
}
