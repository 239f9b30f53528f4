//! Parser for the persisted HTML form.
//!
//! Each page is a `<div data-type="page" class="page">` (either marker is
//! accepted) holding the page's blocks in order. Blocks may carry their
//! identity in `data-node-id`; headings carry their anchor in `id`.

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fs;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{
    Alignment, Block, ContentNode, Document, InlineContent, List, Metadata, NodeId, Page,
    Paragraph, Table, TableCell, TableRow, TextRun, TextStyle,
};

use super::markup::{parse_markup, Element, Markup};
use super::options::ParseOptions;

/// Root-level elements that carry no document content.
const IGNORED_ROOT_ELEMENTS: &[&str] = &["head", "title", "meta", "link", "style", "script"];

/// Parser for paged HTML documents.
pub struct HtmlParser {
    root: Element,
    options: ParseOptions,
}

impl HtmlParser {
    /// Parse an HTML string.
    pub fn new(input: &str) -> Result<Self> {
        Self::with_options(input, ParseOptions::default())
    }

    /// Parse an HTML string with custom options.
    pub fn with_options(input: &str, options: ParseOptions) -> Result<Self> {
        let root = parse_markup(input)?;
        Ok(Self { root, options })
    }

    /// Open an HTML file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_options(path, ParseOptions::default())
    }

    /// Open an HTML file with custom options.
    pub fn open_with_options<P: AsRef<Path>>(path: P, options: ParseOptions) -> Result<Self> {
        let data = fs::read(path)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Parse HTML from bytes.
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Self::from_bytes_with_options(data, ParseOptions::default())
    }

    /// Parse HTML from bytes with custom options.
    ///
    /// Invalid UTF-8 is an error in strict mode and replaced in lenient mode.
    pub fn from_bytes_with_options(data: &[u8], options: ParseOptions) -> Result<Self> {
        match std::str::from_utf8(data) {
            Ok(input) => Self::with_options(input, options),
            Err(e) if !options.is_lenient() => {
                Err(Error::Parse(format!("input is not valid UTF-8: {}", e)))
            }
            Err(_) => {
                log::warn!("input is not valid UTF-8, replacing invalid sequences");
                Self::with_options(&String::from_utf8_lossy(data), options)
            }
        }
    }

    /// Parse HTML from a reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Self::from_reader_with_options(reader, ParseOptions::default())
    }

    /// Parse HTML from a reader with custom options.
    pub fn from_reader_with_options<R: Read>(mut reader: R, options: ParseOptions) -> Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        Self::from_bytes_with_options(&data, options)
    }

    /// Build the document.
    pub fn parse(&self) -> Result<Document> {
        let body = body_of(&self.root);

        // Ids written in the input win over freshly allocated ones.
        reserve_ids(body);

        let mut builder = Builder {
            options: &self.options,
            seen: HashSet::new(),
        };

        let mut pages = Vec::new();
        let mut stray: Vec<&Markup> = Vec::new();
        for child in &body.children {
            match child {
                Markup::Text(text) if text.trim().is_empty() => {}
                Markup::Element(el) if is_page(el) => {
                    builder.flush_stray(&mut stray, &mut pages)?;
                    pages.push(builder.page(el)?);
                }
                Markup::Element(el) if IGNORED_ROOT_ELEMENTS.contains(&el.name.as_str()) => {}
                other if self.options.is_lenient() => stray.push(other),
                other => {
                    return Err(Error::Parse(format!(
                        "content outside of a page: {}",
                        describe(other)
                    )))
                }
            }
        }
        builder.flush_stray(&mut stray, &mut pages)?;

        let mut doc = Document::from_pages(pages);
        if self.options.extract_metadata {
            doc.metadata = extract_metadata(&self.root);
        }
        Ok(doc)
    }
}

/// Check if an element is a page container.
fn is_page(el: &Element) -> bool {
    el.name == "div" && (el.attr("data-type") == Some("page") || el.has_class("page"))
}

/// The element whose children are the document's pages.
fn body_of(root: &Element) -> &Element {
    let html = root.child("html").unwrap_or(root);
    html.child("body").unwrap_or(html)
}

fn reserve_ids(el: &Element) {
    for child in el.elements() {
        if let Some(Ok(id)) = child.attr("data-node-id").map(str::parse::<NodeId>) {
            NodeId::reserve(id);
        }
        reserve_ids(child);
    }
}

fn describe(markup: &Markup) -> String {
    match markup {
        Markup::Element(el) => format!("<{}>", el.name),
        Markup::Text(text) => {
            let text = text.trim();
            let preview: String = text.chars().take(24).collect();
            format!("text {:?}", preview)
        }
    }
}

fn extract_metadata(root: &Element) -> Metadata {
    let html = root.child("html").unwrap_or(root);
    let head = html.child("head").unwrap_or(html);

    let title = head
        .child("title")
        .map(|t| collapse_whitespace(&t.text()).trim().to_string())
        .filter(|t| !t.is_empty());
    let meta = |name: &str| {
        head.elements()
            .find(|el| el.name == "meta" && el.attr("name") == Some(name))
            .and_then(|el| el.attr("content"))
    };
    let date = |name: &str| {
        meta(name).and_then(|value| match DateTime::parse_from_rfc3339(value) {
            Ok(date) => Some(date.with_timezone(&Utc)),
            Err(e) => {
                log::warn!("ignoring unparseable {} date {:?}: {}", name, value, e);
                None
            }
        })
    };

    Metadata {
        title,
        author: meta("author").map(str::to_string),
        created: date("created"),
        modified: date("modified"),
    }
}

/// Converts elements into content nodes, tracking the ids in use.
struct Builder<'a> {
    options: &'a ParseOptions,
    seen: HashSet<NodeId>,
}

impl Builder<'_> {
    fn flush_stray(&mut self, stray: &mut Vec<&Markup>, pages: &mut Vec<Page>) -> Result<()> {
        if stray.is_empty() {
            return Ok(());
        }
        log::warn!("wrapping {} node(s) found outside a page", stray.len());
        let mut page = Page::new();
        for markup in stray.drain(..) {
            self.blocks(markup, &mut page.elements)?;
        }
        pages.push(page);
        Ok(())
    }

    fn page(&mut self, el: &Element) -> Result<Page> {
        let mut page = Page::new();
        for child in &el.children {
            self.blocks(child, &mut page.elements)?;
        }
        Ok(page)
    }

    /// Convert one child of a page into zero or more content nodes.
    fn blocks(&mut self, markup: &Markup, out: &mut Vec<ContentNode>) -> Result<()> {
        let el = match markup {
            Markup::Text(text) if text.trim().is_empty() => return Ok(()),
            Markup::Text(text) => {
                if !self.options.is_lenient() {
                    return Err(Error::Parse(format!(
                        "bare {} inside a page",
                        describe(markup)
                    )));
                }
                let text = collapse_whitespace(text).trim().to_string();
                out.push(ContentNode::new(Block::Paragraph(Paragraph::with_text(text))));
                return Ok(());
            }
            Markup::Element(el) => el,
        };

        let block = match el.name.as_str() {
            "p" => Block::Paragraph(paragraph(el)),
            "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => Block::Paragraph(heading(el)),
            "ul" | "ol" => Block::List(list(el)),
            "table" => Block::Table(table(el)),
            "img" => image(el),
            "hr" => Block::HorizontalRule,
            "br" => return Ok(()),
            "div" if is_page(el) => {
                if !self.options.is_lenient() {
                    return Err(Error::Parse("page nested inside a page".to_string()));
                }
                log::warn!("flattening a page nested inside a page");
                for child in &el.children {
                    self.blocks(child, out)?;
                }
                return Ok(());
            }
            _ if self.options.preserve_unknown => {
                let mut raw = el.clone();
                raw.attrs.retain(|(key, _)| key != "data-node-id");
                Block::Raw { html: raw.to_html() }
            }
            other => {
                log::debug!("dropping unsupported <{}>", other);
                return Ok(());
            }
        };

        let id = self.node_id(el)?;
        out.push(ContentNode::with_id(id, block));
        Ok(())
    }

    fn node_id(&mut self, el: &Element) -> Result<NodeId> {
        let Some(raw) = el.attr("data-node-id") else {
            return Ok(NodeId::fresh());
        };

        let id = match raw.parse::<NodeId>() {
            Ok(id) => id,
            Err(_) if self.options.is_lenient() => {
                log::warn!("invalid node id {:?}, assigning a fresh one", raw);
                return Ok(self.claim(NodeId::fresh()));
            }
            Err(e) => return Err(Error::Parse(format!("invalid node id {:?}: {}", raw, e))),
        };

        if self.seen.contains(&id) {
            if !self.options.is_lenient() {
                return Err(Error::DuplicateNode(id));
            }
            log::warn!("duplicate node id {}, assigning a fresh one", id);
            return Ok(self.claim(NodeId::fresh()));
        }
        Ok(self.claim(id))
    }

    fn claim(&mut self, id: NodeId) -> NodeId {
        self.seen.insert(id);
        id
    }
}

fn paragraph(el: &Element) -> Paragraph {
    let mut p = Paragraph::new();
    p.content = inline_content(el);
    if let Some(align) = el.style("text-align").or_else(|| el.attr("align")) {
        p.style.alignment = Alignment::from_css(align);
    }
    p
}

fn heading(el: &Element) -> Paragraph {
    let mut p = paragraph(el);
    let level = el.name[1..].parse::<u8>().unwrap_or(1);
    p.style.heading_level = Some(level.clamp(1, 6));
    p.style.anchor = el.attr("id").filter(|id| !id.is_empty()).map(str::to_string);
    p
}

fn list(el: &Element) -> List {
    let mut list = if el.name == "ol" {
        List::numbered()
    } else {
        List::bullet()
    };
    for item in el.elements().filter(|e| e.name == "li") {
        list.add_item(paragraph(item));
    }
    list
}

fn table(el: &Element) -> Table {
    let mut table = Table::new();
    for child in el.elements() {
        match child.name.as_str() {
            "thead" => rows(child, true, &mut table),
            "tbody" | "tfoot" => rows(child, false, &mut table),
            "tr" => table.add_row(row(child, false)),
            _ => {}
        }
    }
    table
}

fn rows(section: &Element, header: bool, table: &mut Table) {
    for tr in section.elements().filter(|e| e.name == "tr") {
        table.add_row(row(tr, header));
    }
}

fn row(tr: &Element, in_head: bool) -> TableRow {
    let cells: Vec<&Element> = tr
        .elements()
        .filter(|e| e.name == "td" || e.name == "th")
        .collect();
    let all_th = !cells.is_empty() && cells.iter().all(|c| c.name == "th");

    let mut row = TableRow::new(cells.into_iter().map(cell).collect());
    row.is_header = in_head || all_th;
    row
}

fn cell(el: &Element) -> TableCell {
    let span = |name: &str| {
        el.attr(name)
            .and_then(|v| v.trim().parse::<u8>().ok())
            .unwrap_or(1)
    };

    let content = if el.child("p").is_some() {
        el.elements()
            .filter(|e| e.name == "p")
            .map(paragraph)
            .collect()
    } else {
        let p = paragraph(el);
        if p.is_empty() {
            Vec::new()
        } else {
            vec![p]
        }
    };

    let mut cell = TableCell::with_content(content)
        .colspan(span("colspan"))
        .rowspan(span("rowspan"));
    if let Some(align) = el.style("text-align").or_else(|| el.attr("align")) {
        cell.alignment = Alignment::from_css(align);
    }
    cell
}

fn image(el: &Element) -> Block {
    let dimension = |name: &str| {
        el.attr(name)
            .map(|v| v.trim().trim_end_matches("px"))
            .and_then(|v| v.parse::<f32>().ok())
    };
    Block::Image {
        src: el.attr("src").unwrap_or_default().to_string(),
        alt_text: el.attr("alt").map(str::to_string),
        width: dimension("width"),
        height: dimension("height"),
    }
}

/// Inline content of a block element, with HTML whitespace rules applied.
fn inline_content(el: &Element) -> Vec<InlineContent> {
    let mut raw = Vec::new();
    collect_inline(el, &TextStyle::default(), &mut raw);
    normalize_inline(raw)
}

fn collect_inline(el: &Element, style: &TextStyle, out: &mut Vec<InlineContent>) {
    for child in &el.children {
        let el = match child {
            Markup::Text(text) => {
                out.push(InlineContent::Text(TextRun {
                    text: text.clone(),
                    style: style.clone(),
                }));
                continue;
            }
            Markup::Element(el) => el,
        };

        let mut inner = style.clone();
        match el.name.as_str() {
            "br" => {
                out.push(InlineContent::LineBreak);
                continue;
            }
            "a" if el.attr("href").is_some() => {
                out.push(InlineContent::Link {
                    text: el.text(),
                    url: el.attr("href").unwrap_or_default().to_string(),
                });
                continue;
            }
            "img" | "script" | "style" => continue,
            "strong" | "b" => inner.bold = true,
            "em" | "i" => inner.italic = true,
            "u" => inner.underline = true,
            "s" | "strike" | "del" => inner.strikethrough = true,
            _ => {}
        }
        collect_inline(el, &inner, out);
    }
}

/// Collapse whitespace, trim line ends and merge runs of equal style.
fn normalize_inline(raw: Vec<InlineContent>) -> Vec<InlineContent> {
    let mut out: Vec<InlineContent> = Vec::new();
    let mut at_line_start = true;

    for item in raw {
        match item {
            InlineContent::Text(mut run) => {
                run.text = collapse_whitespace(&run.text);
                if at_line_start || ends_with_space(&out) {
                    run.text = run.text.trim_start_matches(' ').to_string();
                }
                if run.text.is_empty() {
                    continue;
                }
                at_line_start = false;
                if let Some(InlineContent::Text(prev)) = out.last_mut() {
                    if prev.style == run.style {
                        prev.text.push_str(&run.text);
                        continue;
                    }
                }
                out.push(InlineContent::Text(run));
            }
            InlineContent::LineBreak => {
                trim_line_end(&mut out);
                out.push(InlineContent::LineBreak);
                at_line_start = true;
            }
            InlineContent::Link { text, url } => {
                let text = collapse_whitespace(&text).trim().to_string();
                out.push(InlineContent::Link { text, url });
                at_line_start = false;
            }
        }
    }
    trim_line_end(&mut out);
    out
}

fn ends_with_space(out: &[InlineContent]) -> bool {
    matches!(out.last(), Some(InlineContent::Text(run)) if run.text.ends_with(' '))
}

fn trim_line_end(out: &mut Vec<InlineContent>) {
    if let Some(InlineContent::Text(run)) = out.last_mut() {
        let trimmed = run.text.trim_end_matches(' ').len();
        run.text.truncate(trimmed);
        if run.text.is_empty() {
            out.pop();
        }
    }
}

/// Replace each run of ASCII whitespace with one space. Non-breaking spaces
/// are kept.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_space = false;
    for c in text.chars() {
        if c.is_ascii_whitespace() {
            if !in_space {
                out.push(' ');
            }
            in_space = true;
        } else {
            out.push(c);
            in_space = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ErrorMode;

    fn parse(html: &str) -> Result<Document> {
        HtmlParser::new(html)?.parse()
    }

    fn parse_lenient(html: &str) -> Result<Document> {
        HtmlParser::with_options(html, ParseOptions::new().lenient())?.parse()
    }

    #[test]
    fn test_pages_and_node_ids() {
        let doc = parse(
            r#"<div data-type="page" class="page"><p data-node-id="n901">One</p><p>Two</p></div>
               <div class="page"><h2 id="intro" data-node-id="902">Intro</h2></div>"#,
        )
        .unwrap();

        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.pages()[0].elements[0].id, NodeId(901));
        assert_eq!(doc.pages()[0].elements[1].plain_text(), "Two");

        let heading = &doc.pages()[1].elements[0];
        assert_eq!(heading.id, NodeId(902));
        let Block::Paragraph(p) = &heading.block else {
            panic!("expected a heading");
        };
        assert_eq!(p.heading_level(), Some(2));
        assert_eq!(p.style.anchor.as_deref(), Some("intro"));
    }

    #[test]
    fn test_fresh_ids_do_not_collide_with_written_ones() {
        let doc = parse(
            r#"<div class="page"><p>first</p><p data-node-id="n999999">second</p></div>"#,
        )
        .unwrap();
        let ids = doc.node_ids();
        assert_ne!(ids[0], ids[1]);
        assert!(ids[0].0 > 999_999);
    }

    #[test]
    fn test_inline_content() {
        let doc = parse(
            r#"<div class="page"><p>  Hello <strong>bold</strong>
               and <a href="https://example.com">a  link</a><br>next  </p></div>"#,
        )
        .unwrap();
        let Block::Paragraph(p) = &doc.pages()[0].elements[0].block else {
            panic!("expected a paragraph");
        };

        assert_eq!(
            p.content,
            vec![
                InlineContent::Text(TextRun::new("Hello ")),
                InlineContent::Text(TextRun::bold("bold")),
                InlineContent::Text(TextRun::new(" and ")),
                InlineContent::Link {
                    text: "a link".to_string(),
                    url: "https://example.com".to_string()
                },
                InlineContent::LineBreak,
                InlineContent::Text(TextRun::new("next")),
            ]
        );
    }

    #[test]
    fn test_blocks() {
        let doc = parse(
            r#"<div class="page">
                 <ol><li><p>one</p></li><li>two</li></ol>
                 <table><thead><tr><th>A</th><th>B</th></tr></thead>
                        <tbody><tr><td colspan="2">wide</td></tr></tbody></table>
                 <img src="chart.png" alt="Chart" height="120px">
                 <hr>
                 <blockquote>quoted</blockquote>
               </div>"#,
        )
        .unwrap();
        let kinds: Vec<&str> = doc.nodes().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            vec!["list", "table", "image", "horizontal_rule", "raw"]
        );

        let nodes: Vec<&ContentNode> = doc.nodes().collect();
        let Block::List(list) = &nodes[0].block else {
            panic!("expected a list");
        };
        assert!(list.ordered);
        assert_eq!(list.items.len(), 2);

        let Block::Table(table) = &nodes[1].block else {
            panic!("expected a table");
        };
        assert_eq!(table.header_rows(), 1);
        assert_eq!(table.rows[1].cells[0].colspan, 2);

        assert_eq!(
            nodes[2].block,
            Block::Image {
                src: "chart.png".to_string(),
                alt_text: Some("Chart".to_string()),
                width: None,
                height: Some(120.0),
            }
        );
        assert_eq!(
            nodes[4].block,
            Block::Raw {
                html: "<blockquote>quoted</blockquote>".to_string()
            }
        );
    }

    #[test]
    fn test_strict_rejects_content_outside_pages() {
        let err = parse("<p>loose</p>").unwrap_err();
        assert!(matches!(err, Error::Parse(_)));

        let err = parse(r#"<div class="page">bare text</div>"#).unwrap_err();
        assert!(matches!(err, Error::Parse(_)));
    }

    #[test]
    fn test_lenient_wraps_content_outside_pages() {
        let doc = parse_lenient(
            r#"<h1>Title</h1><div class="page"><p>a</p></div><p>b</p><p>c</p>"#,
        )
        .unwrap();
        assert_eq!(doc.page_count(), 3);
        assert_eq!(doc.pages()[0].plain_text(), "Title");
        assert_eq!(doc.pages()[2].block_count(), 2);
    }

    #[test]
    fn test_duplicate_ids() {
        let html = r#"<div class="page"><p data-node-id="n5">a</p><p data-node-id="n5">b</p></div>"#;
        assert!(matches!(parse(html).unwrap_err(), Error::DuplicateNode(NodeId(5))));

        let doc = parse_lenient(html).unwrap();
        let ids = doc.node_ids();
        assert_eq!(ids[0], NodeId(5));
        assert_ne!(ids[1], NodeId(5));
    }

    #[test]
    fn test_max_node_id_is_not_reserved() {
        let html = r#"<div class="page"><p data-node-id="n18446744073709551615">a</p></div>"#;
        assert!(matches!(parse(html).unwrap_err(), Error::Parse(_)));

        let doc = parse_lenient(html).unwrap();
        let id = doc.node_ids()[0];
        assert_ne!(id, NodeId(u64::MAX));
        let next = NodeId::fresh();
        assert_ne!(next, id);
        assert_ne!(next, NodeId(u64::MAX));
    }

    #[test]
    fn test_full_document_and_metadata() {
        let doc = parse(
            r#"<!DOCTYPE html><html><head><title>Quarterly  Report</title>
               <meta name="author" content="Finance"></head>
               <body><div class="page"><p>x</p></div></body></html>"#,
        )
        .unwrap();
        assert_eq!(doc.metadata.title.as_deref(), Some("Quarterly Report"));
        assert_eq!(doc.metadata.author.as_deref(), Some("Finance"));
        assert_eq!(doc.page_count(), 1);
    }

    #[test]
    fn test_metadata_dates() {
        let doc = parse(
            r#"<html><head><meta name="created" content="2024-03-01T09:30:00Z">
               <meta name="modified" content="yesterday"></head>
               <body><div class="page"></div></body></html>"#,
        )
        .unwrap();
        let created = doc.metadata.created.unwrap();
        assert_eq!(created.to_rfc3339(), "2024-03-01T09:30:00+00:00");
        assert!(doc.metadata.modified.is_none());
    }

    #[test]
    fn test_empty_input_yields_one_empty_page() {
        let doc = parse("").unwrap();
        assert_eq!(doc.page_count(), 1);
        assert!(doc.is_empty());
    }

    #[test]
    fn test_drop_unknown() {
        let options = ParseOptions::new()
            .with_error_mode(ErrorMode::Strict)
            .with_preserve_unknown(false);
        let doc = HtmlParser::with_options(
            r#"<div class="page"><aside>x</aside><p>kept</p></div>"#,
            options,
        )
        .unwrap()
        .parse()
        .unwrap();
        assert_eq!(doc.node_count(), 1);
    }
}
