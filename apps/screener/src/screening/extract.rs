//! Flattens an uploaded PDF or DOCX into plain text.
//!
//! Extraction never fails: anything that cannot be decoded yields an empty
//! string, which the orchestrator treats as "no usable text".

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use docx_rs::{
    DocumentChild, Paragraph, ParagraphChild, RunChild, Table, TableCellContent, TableChild,
    TableRowChild,
};
use serde::Serialize;
use tracing::{debug, warn};

pub const PDF_MIME: &str = "application/pdf";
pub const DOCX_MIME: &str =
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document";

/// Document formats accepted at the upload boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DocumentFormat {
    Pdf,
    Docx,
}

impl DocumentFormat {
    /// Detects the format from the file extension, falling back to the MIME type.
    pub fn detect(file_name: &str, mime_type: &str) -> Option<Self> {
        let extension = Path::new(file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        match extension.as_deref() {
            Some("pdf") => Some(DocumentFormat::Pdf),
            Some("docx") => Some(DocumentFormat::Docx),
            _ => match mime_type.trim().to_ascii_lowercase().as_str() {
                PDF_MIME => Some(DocumentFormat::Pdf),
                DOCX_MIME => Some(DocumentFormat::Docx),
                _ => None,
            },
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            DocumentFormat::Pdf => PDF_MIME,
            DocumentFormat::Docx => DOCX_MIME,
        }
    }
}

/// Extracts trimmed text from `document`. Returns an empty string on any failure.
///
/// The bytes are only borrowed, so the caller can still read the original upload.
pub fn extract(document: &[u8], format: DocumentFormat) -> String {
    let text = match format {
        DocumentFormat::Pdf => extract_pdf(document),
        DocumentFormat::Docx => extract_docx(document),
    };
    text.trim().to_string()
}

fn extract_pdf(document: &[u8]) -> String {
    // pdf-extract panics on some malformed inputs
    let pages = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(document)
    }));

    match pages {
        Ok(Ok(pages)) => join_pages(pages),
        Ok(Err(e)) => {
            debug!("pdf-extract failed ({e}); falling back to page-wise lopdf extraction");
            extract_pdf_pagewise(document)
        }
        Err(_) => {
            debug!("pdf-extract panicked; falling back to page-wise lopdf extraction");
            extract_pdf_pagewise(document)
        }
    }
}

/// Loads the document once and extracts each page on its own, so a broken page
/// only loses that page.
fn extract_pdf_pagewise(document: &[u8]) -> String {
    let doc = match lopdf::Document::load_mem(document) {
        Ok(doc) => doc,
        Err(e) => {
            warn!("PDF could not be decoded: {e}");
            return String::new();
        }
    };

    let pages = doc
        .get_pages()
        .keys()
        .filter_map(|page_number| match doc.extract_text(&[*page_number]) {
            Ok(text) => Some(text),
            Err(e) => {
                debug!("Skipping PDF page {page_number}: {e}");
                None
            }
        })
        .collect();

    join_pages(pages)
}

fn join_pages(pages: Vec<String>) -> String {
    pages
        .into_iter()
        .filter(|page| !page.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Body paragraphs first, then every table cell paragraph. Tables are appended
/// after the body rather than interleaved at their document position.
fn extract_docx(document: &[u8]) -> String {
    let docx = match docx_rs::read_docx(document) {
        Ok(docx) => docx,
        Err(e) => {
            warn!("DOCX could not be decoded: {e:?}");
            return String::new();
        }
    };

    let mut lines = Vec::new();
    for child in &docx.document.children {
        if let DocumentChild::Paragraph(paragraph) = child {
            push_line(&mut lines, paragraph_text(paragraph));
        }
    }
    for child in &docx.document.children {
        if let DocumentChild::Table(table) = child {
            push_table_lines(&mut lines, table);
        }
    }

    lines.join("\n")
}

#[allow(irrefutable_let_patterns)]
fn push_table_lines(lines: &mut Vec<String>, table: &Table) {
    for row in &table.rows {
        let TableChild::TableRow(row) = row else {
            continue;
        };
        for cell in &row.cells {
            let TableRowChild::TableCell(cell) = cell else {
                continue;
            };
            for content in &cell.children {
                if let TableCellContent::Paragraph(paragraph) = content {
                    push_line(lines, paragraph_text(paragraph));
                }
            }
        }
    }
}

fn push_line(lines: &mut Vec<String>, line: String) {
    if !line.trim().is_empty() {
        lines.push(line);
    }
}

fn paragraph_text(paragraph: &Paragraph) -> String {
    let mut text = String::new();
    collect_runs(&paragraph.children, &mut text);
    text
}

fn collect_runs(children: &[ParagraphChild], text: &mut String) {
    for child in children {
        match child {
            ParagraphChild::Run(run) => {
                for run_child in &run.children {
                    match run_child {
                        RunChild::Text(t) => text.push_str(&t.text),
                        RunChild::Tab(_) => text.push('\t'),
                        _ => {}
                    }
                }
            }
            ParagraphChild::Hyperlink(link) => collect_runs(&link.children, text),
            _ => {}
        }
    }
}
