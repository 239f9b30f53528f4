//! Plain text rendering of paged documents.
//!
//! Pages are separated by a form feed (`\x0c`), the conventional page break
//! of plain text printers.

use crate::error::Result;
use crate::model::Document;

use super::RenderOptions;

/// Page separator in text output.
pub const PAGE_SEPARATOR: char = '\u{c}';

/// Convert a document to plain text.
pub fn to_text(doc: &Document, options: &RenderOptions) -> Result<String> {
    let mut pages = Vec::new();

    for (index, page) in doc.pages().iter().enumerate() {
        if !options.page_selection.includes_index(index) {
            continue;
        }

        let mut lines = Vec::new();
        if let Some(header) = &options.header {
            lines.push(options.expand(header, index));
            lines.push(String::new());
        }

        let body = page.plain_text();
        if !body.is_empty() {
            lines.push(body);
        }

        if let Some(footer) = &options.footer {
            lines.push(String::new());
            lines.push(options.expand(footer, index));
        } else if options.page_labels {
            if let Some(label) = options.page_label(index) {
                lines.push(String::new());
                lines.push(format!("- {} -", label));
            }
        }

        let mut text = lines.join("\n");
        text.push('\n');
        pages.push(text);
    }

    Ok(pages.join(&PAGE_SEPARATOR.to_string()))
}
