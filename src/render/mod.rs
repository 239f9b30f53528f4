//! Rendering module for converting documents to their output forms.

mod html;
mod json;
mod options;
mod stats;
mod text;
pub mod visitor;

pub use html::{to_html, HtmlRenderer};
pub use json::{to_json, JsonFormat};
pub use options::{PageSelection, RenderOptions};
pub use stats::DocumentStats;
pub use text::{to_text, PAGE_SEPARATOR};
pub use visitor::{DefaultVisitor, DocumentVisitor, VisitorAction};
