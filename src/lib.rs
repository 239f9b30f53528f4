//! # pageflow
//!
//! Pagination engine for paged rich-text documents.
//!
//! A document is a list of pages, each holding atomic content nodes
//! (paragraphs, headings, lists, tables, images). Whenever content changes,
//! the engine measures pages after a short quiet period and moves the
//! overflowing tail of a page onto the next one, one move per pass, until
//! every page fits.
//!
//! ## Quick Start
//!
//! ```no_run
//! use pageflow::{paginate, parse_file, render, PaginationOptions};
//!
//! fn main() -> pageflow::Result<()> {
//!     // Parse a paged HTML (or JSON) document
//!     let doc = parse_file("report.html")?;
//!
//!     // Re-flow it with estimated heights
//!     let doc = paginate(doc, &PaginationOptions::default())?;
//!
//!     // Write it back as paged HTML
//!     let html = render::to_html(&doc, &render::RenderOptions::default())?;
//!     println!("{}", html);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Position model**: every page and node boundary has an integer position
//! - **Atomic transactions**: insert and delete steps commit all-or-nothing
//! - **Debounced layout**: one measurement pass per burst of edits
//! - **Pluggable measurement**: the [`Measurer`] trait supplies rendered heights
//! - **Persistence**: paged HTML and JSON, plus plain text output

pub mod detect;
pub mod error;
pub mod layout;
pub mod model;
pub mod parser;
pub mod render;

// Re-export commonly used types
pub use detect::{detect_format_from_bytes, detect_format_from_path, InputFormat};
pub use error::{Error, Result};
pub use layout::{
    settle, EstimatingMeasurer, FixedMeasurer, Measurer, PageNumbering, PageSize, PaginationOptions,
    Paginator, PassOutcome, SettleReport, DEFAULT_MAX_PASSES,
};
pub use model::{
    Alignment, Block, ContentNode, Document, InlineContent, List, Metadata, NodeId, Outline, Page,
    Paragraph, ParagraphStyle, Slice, Table, TableCell, TableRow, TextRun, TextStyle, Transaction,
};
pub use parser::{parse_html, parse_json, HtmlParser, ParseOptions};
pub use render::{DocumentStats, JsonFormat, PageSelection, RenderOptions};

use std::io::Read;
use std::path::Path;
use std::time::Instant;

/// Parse a document file, detecting HTML or JSON from its content.
///
/// # Example
///
/// ```no_run
/// use pageflow::parse_file;
///
/// let doc = parse_file("report.html").unwrap();
/// println!("Pages: {}", doc.page_count());
/// ```
pub fn parse_file<P: AsRef<Path>>(path: P) -> Result<Document> {
    parse_file_with_options(path, ParseOptions::default())
}

/// Parse a document file with custom options.
///
/// # Example
///
/// ```no_run
/// use pageflow::{parse_file_with_options, ParseOptions};
///
/// let options = ParseOptions::new().lenient();
/// let doc = parse_file_with_options("report.html", options).unwrap();
/// ```
pub fn parse_file_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Document> {
    let data = std::fs::read(path)?;
    parse_bytes_with_options(&data, options)
}

/// Parse a document from bytes.
pub fn parse_bytes(data: &[u8]) -> Result<Document> {
    parse_bytes_with_options(data, ParseOptions::default())
}

/// Parse a document from bytes with custom options.
pub fn parse_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Document> {
    match detect_format_from_bytes(data)? {
        InputFormat::Html => HtmlParser::from_bytes_with_options(data, options)?.parse(),
        InputFormat::Json => {
            let text = std::str::from_utf8(data)
                .map_err(|e| Error::Parse(format!("invalid UTF-8 in JSON input: {}", e)))?;
            parse_json(text)
        }
    }
}

/// Parse a document from a reader.
///
/// # Example
///
/// ```no_run
/// use pageflow::parse_reader;
/// use std::fs::File;
///
/// let file = File::open("report.json").unwrap();
/// let doc = parse_reader(file).unwrap();
/// ```
pub fn parse_reader<R: Read>(reader: R) -> Result<Document> {
    parse_reader_with_options(reader, ParseOptions::default())
}

/// Parse a document from a reader with custom options.
pub fn parse_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Document> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    parse_bytes_with_options(&data, options)
}

/// Paginate a document headlessly using estimated heights.
///
/// # Example
///
/// ```
/// use pageflow::{paginate, ContentNode, Document, Page, PaginationOptions};
///
/// let doc = Document::from_pages(vec![Page::with_elements(vec![
///     ContentNode::paragraph("Hello"),
/// ])]);
/// let doc = paginate(doc, &PaginationOptions::default()).unwrap();
/// assert_eq!(doc.page_count(), 1);
/// ```
pub fn paginate(doc: Document, options: &PaginationOptions) -> Result<Document> {
    let (doc, _) = paginate_with(doc, EstimatingMeasurer::new(), options)?;
    Ok(doc)
}

/// Paginate a document with a custom measurer.
pub fn paginate_with<M: Measurer>(
    doc: Document,
    measurer: M,
    options: &PaginationOptions,
) -> Result<(Document, SettleReport)> {
    paginate_bounded(doc, measurer, options, DEFAULT_MAX_PASSES)
}

fn paginate_bounded<M: Measurer>(
    doc: Document,
    measurer: M,
    options: &PaginationOptions,
    max_passes: usize,
) -> Result<(Document, SettleReport)> {
    let mut paginator = Paginator::new(doc, measurer, options.clone());
    let report = settle(&mut paginator, Instant::now(), max_passes)?;
    log::debug!(
        "settled in {} passes ({} moves, {} skipped)",
        report.passes,
        report.moves,
        report.skipped
    );
    Ok((paginator.into_document(), report))
}

/// Builder for parsing, paginating and rendering documents.
///
/// # Example
///
/// ```no_run
/// use pageflow::{PageSize, Pageflow};
///
/// let html = Pageflow::new()
///     .lenient()
///     .with_page_size(PageSize::A4, 1.0)
///     .with_page_labels()
///     .parse("report.html")?
///     .to_html()?;
/// # Ok::<(), pageflow::Error>(())
/// ```
pub struct Pageflow {
    parse_options: ParseOptions,
    pagination_options: PaginationOptions,
    render_options: RenderOptions,
    estimator: EstimatingMeasurer,
    max_passes: usize,
}

impl Pageflow {
    /// Create a new Pageflow builder.
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::default(),
            pagination_options: PaginationOptions::default(),
            render_options: RenderOptions::default(),
            estimator: EstimatingMeasurer::default(),
            max_passes: DEFAULT_MAX_PASSES,
        }
    }

    /// Enable lenient parsing mode.
    pub fn lenient(mut self) -> Self {
        self.parse_options = self.parse_options.lenient();
        self
    }

    /// Replace the pagination options.
    pub fn with_pagination_options(mut self, options: PaginationOptions) -> Self {
        self.render_options = self.render_options.with_numbering(options.numbering);
        self.pagination_options = options;
        self
    }

    /// Set the usable page height in layout units.
    pub fn with_nominal_height(mut self, height: f32) -> Self {
        self.pagination_options = self.pagination_options.with_nominal_height(height);
        self
    }

    /// Derive the page height from a paper size and vertical margins (inches).
    pub fn with_page_size(mut self, size: PageSize, vertical_margin_in: f32) -> Self {
        self.pagination_options.nominal_height = size.content_height(vertical_margin_in);
        self
    }

    /// Use a custom height estimator.
    pub fn with_estimator(mut self, estimator: EstimatingMeasurer) -> Self {
        self.estimator = estimator;
        self
    }

    /// Limit plain-text output to the selected pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.render_options = self.render_options.with_pages(pages);
        self
    }

    /// Emit page labels in rendered output.
    pub fn with_page_labels(mut self) -> Self {
        self.render_options = self.render_options.with_page_labels(true);
        self
    }

    /// Replace the render options.
    pub fn with_render_options(mut self, options: RenderOptions) -> Self {
        self.render_options = options;
        self
    }

    /// Cap the number of passes before giving up.
    pub fn with_max_passes(mut self, passes: usize) -> Self {
        self.max_passes = passes;
        self
    }

    /// Parse and paginate a document file.
    pub fn parse<P: AsRef<Path>>(self, path: P) -> Result<PageflowResult> {
        let document = parse_file_with_options(path, self.parse_options.clone())?;
        self.paginate(document)
    }

    /// Parse and paginate a document from bytes.
    pub fn parse_bytes(self, data: &[u8]) -> Result<PageflowResult> {
        let document = parse_bytes_with_options(data, self.parse_options.clone())?;
        self.paginate(document)
    }

    /// Paginate an already built document.
    pub fn paginate(self, document: Document) -> Result<PageflowResult> {
        let (document, report) = paginate_bounded(
            document,
            self.estimator,
            &self.pagination_options,
            self.max_passes,
        )?;
        Ok(PageflowResult {
            document,
            report,
            render_options: self.render_options,
        })
    }
}

impl Default for Pageflow {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of paginating a document.
pub struct PageflowResult {
    /// The paginated document
    pub document: Document,
    /// How pagination went
    pub report: SettleReport,
    /// Render options to use
    render_options: RenderOptions,
}

impl PageflowResult {
    /// Convert to paged HTML.
    pub fn to_html(&self) -> Result<String> {
        render::to_html(&self.document, &self.render_options)
    }

    /// Convert to plain text.
    pub fn to_text(&self) -> Result<String> {
        render::to_text(&self.document, &self.render_options)
    }

    /// Convert to JSON.
    pub fn to_json(&self, format: JsonFormat) -> Result<String> {
        render::to_json(&self.document, format)
    }

    /// Document statistics.
    pub fn stats(&self) -> DocumentStats {
        DocumentStats::collect(&self.document)
    }

    /// Heading outline with page numbers.
    pub fn outline(&self) -> Outline {
        self.document.outline()
    }

    /// Get the document.
    pub fn document(&self) -> &Document {
        &self.document
    }
}
