use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::models::candidate::CandidateRecord;
use crate::screening::extract::{extract, DocumentFormat};

pub const PREVIEW_CHARS: usize = 1000;

const NO_INLINE_VIEWER: &str =
    "Word documents cannot be previewed directly in the browser. Showing extracted text instead.";

/// What the display layer gets for a candidate's original file.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FilePreview {
    /// Inline-embeddable document.
    Pdf { data_uri: String },
    /// Leading slice of the extracted text.
    Text { excerpt: String, notice: String },
}

pub fn render_preview(record: &CandidateRecord) -> FilePreview {
    let format = DocumentFormat::detect(&record.source_file_name, &record.source_mime_type);

    if format == Some(DocumentFormat::Pdf) || record.source_mime_type.contains("pdf") {
        return FilePreview::Pdf {
            data_uri: format!(
                "data:application/pdf;base64,{}",
                STANDARD.encode(&record.source_file_bytes)
            ),
        };
    }

    let text = format
        .map(|format| extract(&record.source_file_bytes, format))
        .unwrap_or_default();

    FilePreview::Text {
        excerpt: excerpt(&text, PREVIEW_CHARS),
        notice: NO_INLINE_VIEWER.to_string(),
    }
}

/// First `max_chars` characters, always followed by an ellipsis.
fn excerpt(text: &str, max_chars: usize) -> String {
    let cut = text
        .char_indices()
        .nth(max_chars)
        .map_or(text.len(), |(cut, _)| cut);
    format!("{}...", &text[..cut])
}
