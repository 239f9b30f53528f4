//! Parsing of persisted documents (HTML and JSON).

mod html;
mod json;
mod markup;
mod options;

pub use html::HtmlParser;
pub use json::{parse_json, parse_json_reader};
pub use options::{ErrorMode, ParseOptions};

use crate::error::Result;
use crate::model::Document;

/// Parse a paged HTML string with default (strict) options.
pub fn parse_html(input: &str) -> Result<Document> {
    HtmlParser::new(input)?.parse()
}
