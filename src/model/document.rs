//! Document-level types and the structural mutation primitives.

use super::{ContentNode, NodeId, Page, ResolvedPos, Slice, Step, Transaction};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A paged document: an ordered sequence of pages, never empty.
///
/// All structural changes go through [`Document::apply`], which commits a
/// [`Transaction`] atomically and bumps [`Document::version`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Document metadata (title, author, etc.)
    #[serde(default)]
    pub metadata: Metadata,

    /// Pages in the document
    pub(crate) pages: Vec<Page>,

    /// Number of committed transactions
    #[serde(skip)]
    version: u64,
}

/// Contiguous node range addressed by two positions.
enum Range {
    Empty,
    Children {
        page: usize,
        start: usize,
        end: usize,
    },
    Pages {
        start: usize,
        end: usize,
    },
}

impl Document {
    /// Create a new document holding a single empty page.
    pub fn new() -> Self {
        Self::from_pages(Vec::new())
    }

    /// Create a document from pages. An empty list yields one empty page.
    pub fn from_pages(mut pages: Vec<Page>) -> Self {
        if pages.is_empty() {
            pages.push(Page::new());
        }
        for node in pages.iter().flat_map(|p| &p.elements) {
            NodeId::reserve(node.id);
        }
        Self {
            metadata: Metadata::default(),
            pages,
            version: 0,
        }
    }

    /// Restore the invariants of a deserialized document: at least one page,
    /// unique node ids, and fresh ids that cannot collide with stored ones.
    pub fn normalize(self) -> Result<Self> {
        if let Some(node) = self
            .pages
            .iter()
            .flat_map(|p| &p.elements)
            .find(|node| node.id.0 > NodeId::MAX_PERSISTED)
        {
            return Err(Error::Parse(format!("node id {} is out of range", node.id)));
        }
        let metadata = self.metadata;
        let mut doc = Self::from_pages(self.pages);
        doc.metadata = metadata;
        doc.check_unique_ids()?;
        Ok(doc)
    }

    /// Pages in order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Get a page by index (0-based).
    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of committed transactions since the document was created.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Total size of the document content in position units.
    pub fn content_size(&self) -> usize {
        self.pages.iter().map(Page::node_size).sum()
    }

    /// Total number of content nodes across all pages.
    pub fn node_count(&self) -> usize {
        self.pages.iter().map(Page::block_count).sum()
    }

    /// Node identities of all pages, flattened in document order.
    pub fn node_ids(&self) -> Vec<NodeId> {
        self.pages.iter().flat_map(|p| p.ids()).collect()
    }

    /// Iterate over all content nodes in document order.
    pub fn nodes(&self) -> impl Iterator<Item = &ContentNode> {
        self.pages.iter().flat_map(|p| p.elements.iter())
    }

    /// Check if no page holds any content.
    pub fn is_empty(&self) -> bool {
        self.pages.iter().all(Page::is_empty)
    }

    /// Absolute position of the page's opening token.
    pub fn page_position(&self, index: usize) -> Result<usize> {
        if index >= self.pages.len() {
            return Err(Error::PageOutOfRange(index, self.pages.len()));
        }
        Ok(self.pages[..index].iter().map(Page::node_size).sum())
    }

    /// Absolute position where the page's content starts.
    pub fn page_content_start(&self, index: usize) -> Result<usize> {
        Ok(self.page_position(index)? + 1)
    }

    /// Absolute position where the page's content ends (before its closing token).
    pub fn page_content_end(&self, index: usize) -> Result<usize> {
        Ok(self.page_position(index)? + self.pages[index].node_size() - 1)
    }

    /// Page and child index of the node with the given id.
    pub fn locate(&self, id: NodeId) -> Option<(usize, usize)> {
        self.pages
            .iter()
            .enumerate()
            .find_map(|(p, page)| page.index_of(id).map(|c| (p, c)))
    }

    /// Absolute position directly before the node with the given id.
    pub fn position_of(&self, id: NodeId) -> Option<usize> {
        let (page, child) = self.locate(id)?;
        let start = self.page_content_start(page).ok()?;
        Some(start + self.pages[page].child_offset(child))
    }

    /// Resolve an absolute position into page/child coordinates.
    pub fn resolve(&self, pos: usize) -> Result<ResolvedPos> {
        let size = self.content_size();
        if pos > size {
            return Err(Error::OutOfBounds { pos, size });
        }

        let mut start = 0;
        for (page_index, page) in self.pages.iter().enumerate() {
            if pos == start {
                return Ok(ResolvedPos::PageBoundary { index: page_index });
            }
            let end = start + page.node_size();
            if pos < end {
                let mut offset = start + 1;
                for (child, node) in page.elements.iter().enumerate() {
                    if pos == offset {
                        return Ok(ResolvedPos::ChildBoundary {
                            page: page_index,
                            index: child,
                        });
                    }
                    offset += node.node_size();
                    if pos < offset {
                        return Ok(ResolvedPos::Inside {
                            page: page_index,
                            child,
                        });
                    }
                }
                return Ok(ResolvedPos::ChildBoundary {
                    page: page_index,
                    index: page.elements.len(),
                });
            }
            start = end;
        }

        Ok(ResolvedPos::PageBoundary {
            index: self.pages.len(),
        })
    }

    fn range(&self, from: usize, to: usize) -> Result<Range> {
        let size = self.content_size();
        for pos in [from, to] {
            if pos > size {
                return Err(Error::OutOfBounds { pos, size });
            }
        }
        if from > to {
            return Err(Error::InvalidRange { from, to });
        }

        match (self.resolve(from)?, self.resolve(to)?) {
            (ResolvedPos::Inside { .. }, _) => Err(Error::MisalignedPosition(from)),
            (_, ResolvedPos::Inside { .. }) => Err(Error::MisalignedPosition(to)),
            _ if from == to => Ok(Range::Empty),
            (
                ResolvedPos::ChildBoundary { page, index: start },
                ResolvedPos::ChildBoundary {
                    page: end_page,
                    index: end,
                },
            ) if page == end_page => Ok(Range::Children { page, start, end }),
            (
                ResolvedPos::PageBoundary { index: start },
                ResolvedPos::PageBoundary { index: end },
            ) => Ok(Range::Pages { start, end }),
            _ => Err(Error::InvalidRange { from, to }),
        }
    }

    /// Copy the nodes between two boundaries.
    ///
    /// A range of whole pages yields their nodes flattened in order.
    pub fn slice(&self, from: usize, to: usize) -> Result<Slice> {
        let nodes = match self.range(from, to)? {
            Range::Empty => Vec::new(),
            Range::Children { page, start, end } => self.pages[page].elements[start..end].to_vec(),
            Range::Pages { start, end } => self.pages[start..end]
                .iter()
                .flat_map(|p| p.elements.iter().cloned())
                .collect(),
        };
        Ok(Slice::new(nodes))
    }

    /// Insert a slice at a position.
    ///
    /// At a child boundary the nodes are spliced into that page; at a page
    /// boundary a new page is created holding the slice.
    pub fn insert_content(&mut self, at: usize, slice: impl Into<Slice>) -> Result<()> {
        self.apply(&Transaction::new().insert(at, slice))
    }

    /// Remove the nodes between two boundaries and return them.
    pub fn delete_range(&mut self, from: usize, to: usize) -> Result<Slice> {
        let removed = self.slice(from, to)?;
        self.apply(&Transaction::new().delete(from, to))?;
        Ok(removed)
    }

    /// Force a page break at a child boundary: everything after `pos` on its
    /// page moves to a new page inserted right after it.
    ///
    /// At a page boundary an empty page is inserted.
    pub fn insert_page_break(&mut self, pos: usize) -> Result<()> {
        match self.resolve(pos)? {
            ResolvedPos::PageBoundary { .. } => self.insert_content(pos, Slice::empty()),
            ResolvedPos::ChildBoundary { page, .. } => {
                let end = self.page_content_end(page)?;
                let next = end + 1;
                let suffix = self.slice(pos, end)?;
                let tx = Transaction::new().insert(next, suffix).delete(pos, end);
                self.apply(&tx)
            }
            ResolvedPos::Inside { .. } => Err(Error::MisalignedPosition(pos)),
        }
    }

    /// Commit a transaction atomically.
    ///
    /// Steps run in order against a scratch copy, which replaces the document
    /// only if every step succeeds and node identities stay unique.
    pub fn apply(&mut self, tx: &Transaction) -> Result<()> {
        if tx.is_empty() {
            return Ok(());
        }

        let mut scratch = self.clone();
        for step in tx.steps() {
            scratch.apply_step(step)?;
        }
        scratch.check_unique_ids()?;
        scratch.version = self.version + 1;
        *self = scratch;
        Ok(())
    }

    fn apply_step(&mut self, step: &Step) -> Result<()> {
        match step {
            Step::Insert { at, slice } => match self.resolve(*at)? {
                ResolvedPos::PageBoundary { index } => {
                    self.pages
                        .insert(index, Page::with_elements(slice.nodes.clone()));
                    Ok(())
                }
                ResolvedPos::ChildBoundary { page, index } => {
                    let elements = &mut self.pages[page].elements;
                    elements.splice(index..index, slice.nodes.iter().cloned());
                    Ok(())
                }
                ResolvedPos::Inside { .. } => Err(Error::MisalignedPosition(*at)),
            },
            Step::Delete { from, to } => match self.range(*from, *to)? {
                Range::Empty => Ok(()),
                Range::Children { page, start, end } => {
                    self.pages[page].elements.drain(start..end);
                    Ok(())
                }
                Range::Pages { start, end } => {
                    if end - start == self.pages.len() {
                        return Err(Error::EmptyDocument);
                    }
                    self.pages.drain(start..end);
                    Ok(())
                }
            },
        }
    }

    fn check_unique_ids(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for node in self.nodes() {
            if !seen.insert(node.id) {
                return Err(Error::DuplicateNode(node.id));
            }
        }
        Ok(())
    }

    /// Headings in document order, nested by level.
    pub fn outline(&self) -> Outline {
        let mut outline = Outline::new();
        // Path of indices from the outline root to the most recent item.
        let mut path: Vec<(u8, usize)> = Vec::new();

        for (page_index, page) in self.pages.iter().enumerate() {
            for node in &page.elements {
                let super::Block::Paragraph(p) = &node.block else {
                    continue;
                };
                let Some(level) = p.heading_level() else {
                    continue;
                };
                let item = OutlineItem {
                    title: p.plain_text(),
                    anchor: p.style.anchor.clone(),
                    page: page_index as u32 + 1,
                    level,
                    children: Vec::new(),
                };

                while path.last().is_some_and(|(l, _)| *l >= level) {
                    path.pop();
                }
                let siblings = path
                    .iter()
                    .fold(&mut outline.items, |items, (_, i)| &mut items[*i].children);
                siblings.push(item);
                path.push((level, siblings.len() - 1));
            }
        }

        outline
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(|page| page.plain_text())
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,
}

/// Table of contents built from the document's headings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Outline {
    /// Top-level outline items
    pub items: Vec<OutlineItem>,
}

impl Outline {
    /// Create a new empty outline.
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Check if the outline is empty.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Get the total number of items (including nested).
    pub fn total_items(&self) -> usize {
        fn count_items(items: &[OutlineItem]) -> usize {
            items
                .iter()
                .map(|item| 1 + count_items(&item.children))
                .sum()
        }
        count_items(&self.items)
    }
}

/// A single outline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutlineItem {
    /// Heading text
    pub title: String,

    /// Heading anchor id, if any
    pub anchor: Option<String>,

    /// Physical page holding the heading (1-indexed)
    pub page: u32,

    /// Heading level (1-6)
    pub level: u8,

    /// Nested headings
    pub children: Vec<OutlineItem>,
}
