//! Integration tests for the paged HTML persisted form.

use pageflow::model::{
    Block, ContentNode, Document, InlineContent, List, Page, Paragraph, Table, TableCell, TableRow,
    TextRun,
};
use pageflow::parser::{parse_html, HtmlParser, ParseOptions};
use pageflow::render::{self, JsonFormat, RenderOptions};
use pageflow::{paginate_with, FixedMeasurer, PaginationOptions};

fn rich_document() -> Document {
    let mut intro = Paragraph::with_text("Plain and ");
    intro.add_run(TextRun::bold("bold"));
    intro.content.push(InlineContent::Link {
        text: "a link".to_string(),
        url: "https://example.com/?a=1&b=2".to_string(),
    });

    let mut list = List::bullet();
    list.add_item(Paragraph::with_text("first"));
    list.add_item(Paragraph::with_text("second"));

    let mut table = Table::new();
    table.add_row(TableRow::header(vec![
        TableCell::text("Name"),
        TableCell::text("Value"),
    ]));
    table.add_row(TableRow::new(vec![TableCell::text("total").colspan(2)]));

    let first = Page::with_elements(vec![
        ContentNode::new(Block::Paragraph(
            Paragraph::heading("Overview", 1).with_anchor("overview"),
        )),
        ContentNode::new(Block::Paragraph(intro)),
        ContentNode::new(Block::List(list)),
    ]);
    let second = Page::with_elements(vec![
        ContentNode::new(Block::Table(table)),
        ContentNode::new(Block::HorizontalRule),
        ContentNode::new(Block::image_with_size("fig <1>.png", 320.0, 200.0)),
        ContentNode::new(Block::Paragraph(
            Paragraph::heading("Details", 2).with_anchor("details"),
        )),
    ]);
    Document::from_pages(vec![first, second])
}

fn kinds(doc: &Document) -> Vec<&'static str> {
    doc.nodes().map(|node| node.kind()).collect()
}

#[test]
fn test_round_trip_preserves_pages_and_identity() {
    let doc = rich_document();
    let html = render::to_html(&doc, &RenderOptions::default()).unwrap();

    let back = parse_html(&html).unwrap();

    assert_eq!(back.page_count(), 2);
    assert_eq!(back.node_ids(), doc.node_ids());
    assert_eq!(kinds(&back), kinds(&doc));
    assert_eq!(back.content_size(), doc.content_size());
    for (a, b) in doc.nodes().zip(back.nodes()) {
        assert_eq!(a.plain_text(), b.plain_text());
    }
}

#[test]
fn test_round_trip_is_stable() {
    let doc = rich_document();
    let options = RenderOptions::default();
    let first = render::to_html(&doc, &options).unwrap();

    let second = render::to_html(&parse_html(&first).unwrap(), &options).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_simple_blocks_round_trip_exactly() {
    let doc = Document::from_pages(vec![
        Page::with_elements(vec![
            ContentNode::new(Block::Paragraph(
                Paragraph::heading("Title", 1).with_anchor("title"),
            )),
            ContentNode::paragraph("Body text"),
        ]),
        Page::with_elements(vec![ContentNode::new(Block::HorizontalRule)]),
    ]);
    let html = render::to_html(&doc, &RenderOptions::default().with_pretty(false)).unwrap();

    let back = parse_html(&html).unwrap();

    assert_eq!(back.pages(), doc.pages());
}

#[test]
fn test_outline_survives_round_trip() {
    let doc = rich_document();
    let html = render::to_html(&doc, &RenderOptions::default()).unwrap();

    let outline = parse_html(&html).unwrap().outline();

    assert_eq!(outline, doc.outline());
    assert_eq!(outline.total_items(), 2);
}

#[test]
fn test_class_page_is_accepted() {
    let html = r#"<div class="page"><p>one</p></div><div class="page"><p>two</p></div>"#;

    let doc = parse_html(html).unwrap();

    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages()[0].plain_text().trim(), "one");
    assert_eq!(doc.pages()[1].plain_text().trim(), "two");
}

#[test]
fn test_bare_root_content() {
    let html = "<p>loose</p><div data-type=\"page\"><p>paged</p></div>";

    assert!(parse_html(html).is_err());

    let doc = HtmlParser::with_options(html, ParseOptions::new().lenient())
        .unwrap()
        .parse()
        .unwrap();
    assert_eq!(doc.page_count(), 2);
    assert_eq!(doc.pages()[0].plain_text().trim(), "loose");
}

#[test]
fn test_paginated_document_persists_its_pages() {
    let nodes: Vec<_> = (0..6)
        .map(|i| ContentNode::paragraph(format!("para {}", i)))
        .collect();
    let doc = Document::from_pages(vec![Page::with_elements(nodes)]);
    let measurer = FixedMeasurer::new().with_default(300.0);

    let (doc, _) = paginate_with(doc, measurer, &PaginationOptions::default()).unwrap();
    let html = render::to_html(&doc, &RenderOptions::default()).unwrap();
    let back = parse_html(&html).unwrap();

    assert_eq!(back.page_count(), 3);
    let layout: Vec<_> = back.pages().iter().map(|p| p.ids()).collect();
    let expected: Vec<_> = doc.pages().iter().map(|p| p.ids()).collect();
    assert_eq!(layout, expected);
}

#[test]
fn test_json_and_html_agree() {
    let doc = rich_document();
    let json = render::to_json(&doc, JsonFormat::Compact).unwrap();
    let html = render::to_html(&doc, &RenderOptions::default()).unwrap();

    let from_json = pageflow::parse_json(&json).unwrap();
    let from_html = parse_html(&html).unwrap();

    assert_eq!(from_json.node_ids(), from_html.node_ids());
    assert_eq!(from_json.plain_text(), from_html.plain_text());
}
