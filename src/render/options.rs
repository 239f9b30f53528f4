//! Rendering options and configuration.

use crate::layout::PageNumbering;
use std::ops::RangeInclusive;

/// Options for rendering a paged document.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Indent HTML output, one block per line
    pub pretty: bool,

    /// Write `data-node-id` on every block so identities survive a reload
    pub include_node_ids: bool,

    /// Wrap HTML output in a complete `<html>` document
    pub standalone: bool,

    /// Mark numbered pages with their page label
    pub page_labels: bool,

    /// Header line of every page (`{page}` expands to the page label)
    pub header: Option<String>,

    /// Footer line of every page (`{page}` expands to the page label)
    pub footer: Option<String>,

    /// Page numbering scheme used for labels
    pub numbering: PageNumbering,

    /// Pages printed by the text renderer; HTML always writes every page
    pub page_selection: PageSelection,
}

impl RenderOptions {
    /// Create new render options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable indented HTML.
    pub fn with_pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }

    /// Enable or disable node ids in HTML output.
    pub fn with_node_ids(mut self, include: bool) -> Self {
        self.include_node_ids = include;
        self
    }

    /// Enable or disable the `<html>` wrapper.
    pub fn with_standalone(mut self, standalone: bool) -> Self {
        self.standalone = standalone;
        self
    }

    /// Enable or disable page labels.
    pub fn with_page_labels(mut self, labels: bool) -> Self {
        self.page_labels = labels;
        self
    }

    /// Set the header line.
    pub fn with_header(mut self, header: impl Into<String>) -> Self {
        self.header = Some(header.into());
        self
    }

    /// Set the footer line.
    pub fn with_footer(mut self, footer: impl Into<String>) -> Self {
        self.footer = Some(footer.into());
        self
    }

    /// Set the page numbering scheme.
    pub fn with_numbering(mut self, numbering: PageNumbering) -> Self {
        self.numbering = numbering;
        self
    }

    /// Set the pages printed by the text renderer.
    pub fn with_pages(mut self, selection: PageSelection) -> Self {
        self.page_selection = selection;
        self
    }

    /// Set a page range for the text renderer.
    pub fn with_page_range(mut self, range: RangeInclusive<u32>) -> Self {
        self.page_selection = PageSelection::Range(range);
        self
    }

    /// Label of the page at `index`, as shown in headers, footers and marks.
    pub fn page_label(&self, index: usize) -> Option<u32> {
        self.numbering.label(index)
    }

    /// Expand `{page}` in a header or footer template.
    pub(crate) fn expand(&self, template: &str, index: usize) -> String {
        let label = self
            .page_label(index)
            .map(|n| n.to_string())
            .unwrap_or_default();
        template.replace("{page}", &label)
    }
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            pretty: true,
            include_node_ids: true,
            standalone: false,
            page_labels: false,
            header: None,
            footer: None,
            numbering: PageNumbering::default(),
            page_selection: PageSelection::All,
        }
    }
}

/// Page selection for plain-text output.
///
/// Only [`to_text`](super::to_text) honors it; the HTML persisted form keeps
/// every page so it parses back into the same document.
#[derive(Debug, Clone, Default)]
pub enum PageSelection {
    /// Render all pages
    #[default]
    All,
    /// Render a range of pages (inclusive, 1-indexed physical pages)
    Range(RangeInclusive<u32>),
    /// Render specific pages (1-indexed physical pages)
    Pages(Vec<u32>),
}

impl PageSelection {
    /// Check if a page number should be included.
    pub fn includes(&self, page: u32) -> bool {
        match self {
            PageSelection::All => true,
            PageSelection::Range(range) => range.contains(&page),
            PageSelection::Pages(pages) => pages.contains(&page),
        }
    }

    /// Check if the page at a 0-based index should be included.
    pub fn includes_index(&self, index: usize) -> bool {
        self.includes(index as u32 + 1)
    }

    /// Parse a page selection string (e.g., "1-10", "1,3,5,7-10").
    pub fn parse(s: &str) -> Result<Self, String> {
        let s = s.trim();

        if s.is_empty() || s == "all" {
            return Ok(PageSelection::All);
        }

        if let Some((start, end)) = s.split_once('-') {
            if !start.contains(',') && !end.contains(',') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid start page")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid end page")?;
                return Ok(PageSelection::Range(start..=end));
            }
        }

        let mut pages = Vec::new();
        for part in s.split(',') {
            let part = part.trim();
            if let Some((start, end)) = part.split_once('-') {
                let start: u32 = start.trim().parse().map_err(|_| "Invalid page number")?;
                let end: u32 = end.trim().parse().map_err(|_| "Invalid page number")?;
                pages.extend(start..=end);
            } else {
                pages.push(part.parse().map_err(|_| "Invalid page number")?);
            }
        }

        pages.sort_unstable();
        pages.dedup();
        Ok(PageSelection::Pages(pages))
    }
}
