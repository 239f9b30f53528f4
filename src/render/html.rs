//! HTML rendering: the persisted form of a paged document.

use quick_xml::escape::{escape, partial_escape};

use crate::error::Result;
use crate::model::{
    Alignment, Block, ContentNode, Document, InlineContent, List, Paragraph, Table, TableCell,
    TextRun,
};

use super::visitor::{visit_node, DefaultVisitor, DocumentVisitor, VisitorAction};
use super::RenderOptions;

/// Convert a document to HTML.
pub fn to_html(doc: &Document, options: &RenderOptions) -> Result<String> {
    HtmlRenderer::new(options.clone()).render(doc)
}

/// HTML renderer.
pub struct HtmlRenderer {
    options: RenderOptions,
}

impl HtmlRenderer {
    /// Create a new HTML renderer.
    pub fn new(options: RenderOptions) -> Self {
        Self { options }
    }

    /// Render a document to HTML.
    pub fn render(&self, doc: &Document) -> Result<String> {
        self.render_with_visitor(doc, &mut DefaultVisitor)
    }

    /// Render a document, letting a visitor replace or skip nodes.
    pub fn render_with_visitor(
        &self,
        doc: &Document,
        visitor: &mut dyn DocumentVisitor,
    ) -> Result<String> {
        let mut out = String::new();
        let depth = if self.options.standalone {
            self.open_document(&mut out, doc);
            1
        } else {
            0
        };

        for (index, page) in doc.pages().iter().enumerate() {
            visitor.on_page_start(index);

            let mut open = String::from(r#"<div data-type="page" class="page""#);
            if self.options.page_labels {
                if let Some(label) = self.options.page_label(index) {
                    open.push_str(&format!(r#" data-page-number="{}""#, label));
                }
            }
            open.push('>');
            self.line(&mut out, depth, &open);

            for node in &page.elements {
                match visit_node(visitor, node) {
                    VisitorAction::Skip => {}
                    VisitorAction::Replace(html) => self.line(&mut out, depth + 1, &html),
                    VisitorAction::Continue => self.render_node(&mut out, depth + 1, node),
                }
            }

            self.line(&mut out, depth, "</div>");
            visitor.on_page_end(index);
        }

        if self.options.standalone {
            self.line(&mut out, 0, "</body>");
            self.line(&mut out, 0, "</html>");
        }
        Ok(out)
    }

    fn open_document(&self, out: &mut String, doc: &Document) {
        self.line(out, 0, "<!DOCTYPE html>");
        self.line(out, 0, "<html>");
        self.line(out, 0, "<head>");
        self.line(out, 1, r#"<meta charset="utf-8">"#);
        if let Some(title) = &doc.metadata.title {
            self.line(out, 1, &format!("<title>{}</title>", partial_escape(title.as_str())));
        }
        if let Some(author) = &doc.metadata.author {
            self.line(
                out,
                1,
                &format!(r#"<meta name="author" content="{}">"#, escape(author.as_str())),
            );
        }
        let dates = [("created", doc.metadata.created), ("modified", doc.metadata.modified)];
        for (name, date) in dates {
            if let Some(date) = date {
                self.line(
                    out,
                    1,
                    &format!(r#"<meta name="{}" content="{}">"#, name, date.to_rfc3339()),
                );
            }
        }
        self.line(out, 0, "</head>");
        self.line(out, 0, "<body>");
    }

    /// Write one line of output, indented when pretty-printing.
    fn line(&self, out: &mut String, depth: usize, text: &str) {
        if self.options.pretty {
            out.push_str(&"  ".repeat(depth));
            out.push_str(text);
            out.push('\n');
        } else {
            out.push_str(text);
        }
    }

    /// Attributes shared by every block: its identity.
    fn node_attrs(&self, node: &ContentNode) -> String {
        if self.options.include_node_ids {
            format!(r#" data-node-id="{}""#, node.id)
        } else {
            String::new()
        }
    }

    fn render_node(&self, out: &mut String, depth: usize, node: &ContentNode) {
        let attrs = self.node_attrs(node);
        match &node.block {
            Block::Paragraph(p) => self.line(out, depth, &paragraph_html(p, &attrs)),
            Block::List(list) => self.render_list(out, depth, list, &attrs),
            Block::Table(table) => self.render_table(out, depth, table, &attrs),
            Block::Image {
                src,
                alt_text,
                width,
                height,
            } => {
                let mut html = format!(r#"<img src="{}""#, escape(src.as_str()));
                if let Some(alt) = alt_text {
                    html.push_str(&format!(r#" alt="{}""#, escape(alt.as_str())));
                }
                if let Some(width) = width {
                    html.push_str(&format!(r#" width="{}""#, width));
                }
                if let Some(height) = height {
                    html.push_str(&format!(r#" height="{}""#, height));
                }
                html.push_str(&attrs);
                html.push('>');
                self.line(out, depth, &html);
            }
            Block::HorizontalRule => self.line(out, depth, &format!("<hr{}>", attrs)),
            Block::Raw { html } => self.line(out, depth, &with_leading_attrs(html, &attrs)),
        }
    }

    fn render_list(&self, out: &mut String, depth: usize, list: &List, attrs: &str) {
        let tag = if list.ordered { "ol" } else { "ul" };
        self.line(out, depth, &format!("<{}{}>", tag, attrs));
        for item in &list.items {
            let html = format!("<li>{}</li>", paragraph_html(item, ""));
            self.line(out, depth + 1, &html);
        }
        self.line(out, depth, &format!("</{}>", tag));
    }

    fn render_table(&self, out: &mut String, depth: usize, table: &Table, attrs: &str) {
        self.line(out, depth, &format!("<table{}>", attrs));

        let header_rows = table.header_rows();
        let sections = [
            ("thead", &table.rows[..header_rows]),
            ("tbody", &table.rows[header_rows..]),
        ];
        for (section, rows) in sections {
            if rows.is_empty() {
                continue;
            }
            self.line(out, depth + 1, &format!("<{}>", section));
            for row in rows {
                let tag = if row.is_header { "th" } else { "td" };
                let cells: String = row.cells.iter().map(|cell| cell_html(cell, tag)).collect();
                self.line(out, depth + 2, &format!("<tr>{}</tr>", cells));
            }
            self.line(out, depth + 1, &format!("</{}>", section));
        }

        self.line(out, depth, "</table>");
    }
}

fn alignment_attr(alignment: Alignment) -> String {
    alignment
        .css_value()
        .map(|value| format!(r#" style="text-align: {}""#, value))
        .unwrap_or_default()
}

/// A paragraph or heading element with its inline content.
fn paragraph_html(p: &Paragraph, attrs: &str) -> String {
    let tag = match p.heading_level() {
        Some(level) => format!("h{}", level.clamp(1, 6)),
        None => "p".to_string(),
    };

    let mut open = format!("<{}", tag);
    if let Some(anchor) = p.style.anchor.as_deref().filter(|_| p.is_heading()) {
        open.push_str(&format!(r#" id="{}""#, escape(anchor)));
    }
    open.push_str(attrs);
    open.push_str(&alignment_attr(p.style.alignment));
    open.push('>');

    format!("{}{}</{}>", open, inline_html(&p.content), tag)
}

fn cell_html(cell: &TableCell, tag: &str) -> String {
    let mut open = format!("<{}", tag);
    if cell.colspan > 1 {
        open.push_str(&format!(r#" colspan="{}""#, cell.colspan));
    }
    if cell.rowspan > 1 {
        open.push_str(&format!(r#" rowspan="{}""#, cell.rowspan));
    }
    open.push_str(&alignment_attr(cell.alignment));
    open.push('>');

    let content: String = cell.content.iter().map(|p| paragraph_html(p, "")).collect();
    format!("{}{}</{}>", open, content, tag)
}

fn inline_html(content: &[InlineContent]) -> String {
    let mut out = String::new();
    for item in content {
        match item {
            InlineContent::Text(run) => out.push_str(&run_html(run)),
            InlineContent::LineBreak => out.push_str("<br>"),
            InlineContent::Link { text, url } => out.push_str(&format!(
                r#"<a href="{}">{}</a>"#,
                escape(url.as_str()),
                partial_escape(text.as_str())
            )),
        }
    }
    out
}

/// A text run wrapped in its marks, outermost first.
fn run_html(run: &TextRun) -> String {
    let marks = [
        (run.style.bold, "strong"),
        (run.style.italic, "em"),
        (run.style.underline, "u"),
        (run.style.strikethrough, "s"),
    ];

    let mut html = partial_escape(run.text.as_str()).into_owned();
    for (on, tag) in marks.iter().rev() {
        if *on {
            html = format!("<{tag}>{html}</{tag}>");
        }
    }
    html
}

/// Insert attributes into the first tag of a raw fragment.
fn with_leading_attrs(html: &str, attrs: &str) -> String {
    if attrs.is_empty() {
        return html.to_string();
    }
    let trimmed = html.trim_start();
    let Some(rest) = trimmed.strip_prefix('<') else {
        return html.to_string();
    };
    let name_len = rest
        .find(|c: char| c.is_whitespace() || c == '>' || c == '/')
        .unwrap_or(rest.len());
    if name_len == 0 || !rest[..name_len].chars().all(|c| c.is_ascii_alphanumeric()) {
        return html.to_string();
    }
    format!("<{}{}{}", &rest[..name_len], attrs, &rest[name_len..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NodeId, Page, TableRow, TextStyle};

    fn compact() -> RenderOptions {
        RenderOptions::new().with_pretty(false)
    }

    fn doc_of(nodes: Vec<ContentNode>) -> Document {
        Document::from_pages(vec![Page::with_elements(nodes)])
    }

    #[test]
    fn test_page_wrapper_and_ids() {
        let doc = doc_of(vec![ContentNode::with_id(
            NodeId(3),
            Block::Paragraph(Paragraph::with_text("Hello")),
        )]);
        let html = to_html(&doc, &compact()).unwrap();
        assert_eq!(
            html,
            r#"<div data-type="page" class="page"><p data-node-id="n3">Hello</p></div>"#
        );

        let html = to_html(&doc, &compact().with_node_ids(false)).unwrap();
        assert_eq!(html, r#"<div data-type="page" class="page"><p>Hello</p></div>"#);
    }

    #[test]
    fn test_heading_anchor_and_escaping() {
        let p = Paragraph::heading("Q&A <1>", 2).with_anchor("q-a");
        let doc = doc_of(vec![ContentNode::with_id(NodeId(4), Block::Paragraph(p))]);
        let html = to_html(&doc, &compact()).unwrap();
        assert!(html.contains(r#"<h2 id="q-a" data-node-id="n4">Q&amp;A &lt;1&gt;</h2>"#));
    }

    #[test]
    fn test_inline_marks() {
        let mut p = Paragraph::new();
        p.add_run(TextRun {
            text: "both".to_string(),
            style: TextStyle {
                bold: true,
                italic: true,
                ..Default::default()
            },
        });
        p.add_line_break();
        p.content.push(InlineContent::Link {
            text: "site".to_string(),
            url: "https://example.com/?a=1&b=2".to_string(),
        });
        assert_eq!(
            inline_html(&p.content),
            r#"<strong><em>both</em></strong><br><a href="https://example.com/?a=1&amp;b=2">site</a>"#
        );
    }

    #[test]
    fn test_table_sections() {
        let mut table = Table::new();
        table.add_row(TableRow::header(vec![TableCell::text("A"), TableCell::text("B")]));
        table.add_row(TableRow::new(vec![TableCell::text("wide").colspan(2)]));
        let doc = doc_of(vec![ContentNode::with_id(NodeId(8), Block::Table(table))]);

        let html = to_html(&doc, &compact().with_node_ids(false)).unwrap();
        assert!(html.contains(
            "<table><thead><tr><th><p>A</p></th><th><p>B</p></th></tr></thead>\
             <tbody><tr><td colspan=\"2\"><p>wide</p></td></tr></tbody></table>"
        ));
    }

    #[test]
    fn test_pretty_output() {
        let doc = Document::from_pages(vec![
            Page::with_elements(vec![ContentNode::paragraph("a")]),
            Page::new(),
        ]);
        let html = to_html(&doc, &RenderOptions::new().with_node_ids(false)).unwrap();
        assert_eq!(
            html,
            "<div data-type=\"page\" class=\"page\">\n  <p>a</p>\n</div>\n\
             <div data-type=\"page\" class=\"page\">\n</div>\n"
        );
    }

    #[test]
    fn test_page_labels() {
        let pages = (0..4)
            .map(|i| Page::with_elements(vec![ContentNode::paragraph(format!("p{}", i))]))
            .collect();
        let doc = Document::from_pages(pages);

        let html = to_html(&doc, &compact().with_page_labels(true)).unwrap();
        assert!(html.contains(r#"data-page-number="1""#));
        assert!(html.contains(r#"data-page-number="2""#));
        assert!(!html.contains(r#"data-page-number="3""#));
    }

    #[test]
    fn test_page_selection_does_not_drop_pages() {
        let pages = (0..4)
            .map(|i| Page::with_elements(vec![ContentNode::paragraph(format!("p{}", i))]))
            .collect();
        let doc = Document::from_pages(pages);

        let html = to_html(&doc, &compact().with_page_range(1..=2)).unwrap();

        assert_eq!(html.matches("data-type=\"page\"").count(), 4);
        assert_eq!(html, to_html(&doc, &compact()).unwrap());
    }

    #[test]
    fn test_raw_gets_node_id() {
        assert_eq!(
            with_leading_attrs("<aside class=\"x\">y</aside>", r#" data-node-id="n1""#),
            r#"<aside data-node-id="n1" class="x">y</aside>"#
        );
        assert_eq!(with_leading_attrs("plain", " a"), "plain");
    }

    #[test]
    fn test_standalone() {
        let mut doc = Document::new();
        doc.metadata.title = Some("Plan & Budget".to_string());
        let html = to_html(&doc, &RenderOptions::new().with_standalone(true)).unwrap();
        assert!(html.starts_with("<!DOCTYPE html>\n<html>\n<head>\n"));
        assert!(html.contains("<title>Plan &amp; Budget</title>"));
        assert!(html.trim_end().ends_with("</body>\n</html>"));
    }

    #[test]
    fn test_visitor_replaces_and_skips() {
        struct Redact;
        impl DocumentVisitor for Redact {
            fn visit_paragraph(&mut self, _node: &ContentNode, _p: &Paragraph) -> VisitorAction {
                VisitorAction::Replace("<p>[redacted]</p>".to_string())
            }
            fn visit_horizontal_rule(&mut self, _node: &ContentNode) -> VisitorAction {
                VisitorAction::Skip
            }
        }

        let doc = doc_of(vec![
            ContentNode::paragraph("secret"),
            ContentNode::new(Block::HorizontalRule),
        ]);
        let html = HtmlRenderer::new(compact())
            .render_with_visitor(&doc, &mut Redact)
            .unwrap();
        assert_eq!(
            html,
            r#"<div data-type="page" class="page"><p>[redacted]</p></div>"#
        );
    }
}
