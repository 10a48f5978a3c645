//! Text extraction dispatched on mime class
//!
//! Native Google files are exported through the file store; binary formats
//! are downloaded and parsed locally on the blocking pool.

use bytes::Bytes;
use calamine::Reader;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::providers::FileStore;
use crate::types::document::mime;
use crate::types::{MimeClass, SourceDocument};

/// Converts a source document into plain text
pub struct DocumentExtractor {
    store: Arc<dyn FileStore>,
}

impl DocumentExtractor {
    pub fn new(store: Arc<dyn FileStore>) -> Self {
        Self { store }
    }

    /// Extract the text of `doc`. An empty string means the file had no text.
    pub async fn extract(&self, doc: &SourceDocument) -> Result<String> {
        match doc.mime_class() {
            MimeClass::GoogleDocument | MimeClass::GooglePresentation => {
                let data = self.store.export(&doc.id, mime::PLAIN_TEXT).await?;
                Ok(decode_text(&data))
            }
            MimeClass::GoogleSpreadsheet => {
                let data = self.store.export(&doc.id, mime::CSV).await?;
                Ok(csv_text(&data))
            }
            MimeClass::Csv => {
                let data = self.store.fetch_bytes(&doc.id).await?;
                Ok(csv_text(&data))
            }
            MimeClass::PlainText => {
                let data = self.store.fetch_bytes(&doc.id).await?;
                Ok(decode_text(&data))
            }
            MimeClass::Pdf => self.parse_blocking(doc, pdf_text).await,
            MimeClass::Docx => self.parse_blocking(doc, docx_text).await,
            MimeClass::Xlsx => self.parse_blocking(doc, xlsx_text).await,
            MimeClass::Folder | MimeClass::Other(_) => {
                Err(Error::UnsupportedMimeType(doc.mime_type.clone()))
            }
        }
    }

    async fn parse_blocking(
        &self,
        doc: &SourceDocument,
        parse: fn(&[u8]) -> std::result::Result<String, String>,
    ) -> Result<String> {
        let data: Bytes = self.store.fetch_bytes(&doc.id).await?;
        let text = tokio::task::spawn_blocking(move || parse(&data)).await?;
        text.map_err(|message| Error::extraction(&doc.name, message))
    }
}

/// Decode UTF-8 leniently, dropping a leading byte-order mark
pub fn decode_text(data: &[u8]) -> String {
    let text = String::from_utf8_lossy(data);
    text.strip_prefix('\u{feff}').unwrap_or(&text).to_string()
}

/// Render CSV rows as ` | `-joined lines, falling back to the raw text
pub fn csv_text(data: &[u8]) -> String {
    let raw = decode_text(data);
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(raw.as_bytes());

    let mut content = String::new();
    for record in reader.records() {
        match record {
            Ok(record) => {
                if record.iter().all(|cell| cell.trim().is_empty()) {
                    continue;
                }
                content.push_str(&record.iter().collect::<Vec<_>>().join(" | "));
                content.push('\n');
            }
            Err(e) => {
                tracing::debug!("CSV parse failed, keeping raw export: {}", e);
                return raw;
            }
        }
    }
    content
}

/// Extract PDF text, pages separated by blank lines
pub fn pdf_text(data: &[u8]) -> std::result::Result<String, String> {
    let text = match pdf_extract::extract_text_from_mem(data) {
        Ok(text) if !text.trim().is_empty() => text
            .split('\u{c}')
            .map(|page| page.trim_matches('\n'))
            .collect::<Vec<_>>()
            .join("\n\n"),
        Ok(_) => pdf_text_fallback(data)?,
        Err(e) => {
            tracing::warn!("pdf-extract failed: {}, trying fallback", e);
            pdf_text_fallback(data)?
        }
    };
    Ok(cleanup_pdf_text(&text))
}

/// Per-page extraction through lopdf
fn pdf_text_fallback(data: &[u8]) -> std::result::Result<String, String> {
    let doc = lopdf::Document::load_mem(data).map_err(|e| format!("Failed to load PDF: {}", e))?;

    let pages: Vec<String> = doc
        .get_pages()
        .keys()
        .filter_map(|page_num| match doc.extract_text(&[*page_num]) {
            Ok(text) => Some(text),
            Err(e) => {
                tracing::debug!("Could not get text for page {}: {}", page_num, e);
                None
            }
        })
        .collect();

    Ok(pages.join("\n\n"))
}

fn cleanup_pdf_text(text: &str) -> String {
    text.replace('\0', "")
        .replace('\u{00A0}', " ")
        .replace('\u{FB00}', "ff")
        .replace('\u{FB01}', "fi")
        .replace('\u{FB02}', "fl")
        .replace('\u{FB03}', "ffi")
        .replace('\u{FB04}', "ffl")
}

/// Paragraph text of a Word document, one line per paragraph
pub fn docx_text(data: &[u8]) -> std::result::Result<String, String> {
    let doc = docx_rs::read_docx(data).map_err(|e| e.to_string())?;

    let mut content = String::new();
    for child in doc.document.children {
        if let docx_rs::DocumentChild::Paragraph(p) = child {
            for child in p.children {
                if let docx_rs::ParagraphChild::Run(run) = child {
                    for child in run.children {
                        if let docx_rs::RunChild::Text(t) = child {
                            content.push_str(&t.text);
                        }
                    }
                }
            }
            content.push('\n');
        }
    }
    Ok(content)
}

/// Every sheet of a workbook, rows joined with ` | `
pub fn xlsx_text(data: &[u8]) -> std::result::Result<String, String> {
    let cursor = std::io::Cursor::new(data);
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor).map_err(|e| e.to_string())?;

    let mut content = String::new();
    for sheet_name in workbook.sheet_names().to_vec() {
        let Ok(range) = workbook.worksheet_range(&sheet_name) else {
            continue;
        };

        content.push_str(&format!("Sheet: {}\n", sheet_name));
        for row in range.rows() {
            let cells: Vec<String> = row
                .iter()
                .map(|cell| match cell {
                    calamine::Data::Empty => String::new(),
                    calamine::Data::String(s) => s.clone(),
                    calamine::Data::Float(f) => f.to_string(),
                    calamine::Data::Int(i) => i.to_string(),
                    calamine::Data::Bool(b) => b.to_string(),
                    calamine::Data::DateTime(dt) => dt.to_string(),
                    _ => String::new(),
                })
                .collect();

            if !cells.iter().all(|s| s.is_empty()) {
                content.push_str(&cells.join(" | "));
                content.push('\n');
            }
        }
        content.push('\n');
    }
    Ok(content)
}
