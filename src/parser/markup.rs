//! A forgiving HTML element tree built on quick-xml.
//!
//! quick-xml reads well-formed markup; HTML adds void elements (`<br>`),
//! unquoted attributes, named entities and unclosed tags. The builder below
//! papers over those so the document parser can walk a plain tree.

use crate::error::Result;
use quick_xml::escape::{escape, partial_escape};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::Reader;

/// Name of the synthetic element holding the top-level nodes.
pub(crate) const ROOT: &str = "#root";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "source", "track",
    "wbr",
];

/// A node of the element tree.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Markup {
    Element(Element),
    Text(String),
}

/// An element with lower-cased name and decoded attribute values.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Element {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub children: Vec<Markup>,
}

impl Element {
    fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Value of an attribute.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Check the whitespace-separated `class` list.
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Value of a declaration in the inline `style` attribute.
    pub fn style(&self, property: &str) -> Option<&str> {
        self.attr("style")?.split(';').find_map(|decl| {
            let (key, value) = decl.split_once(':')?;
            (key.trim().eq_ignore_ascii_case(property)).then(|| value.trim())
        })
    }

    /// Child elements, skipping text.
    pub fn elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|child| match child {
            Markup::Element(el) => Some(el),
            Markup::Text(_) => None,
        })
    }

    /// First child element with the given name.
    pub fn child(&self, name: &str) -> Option<&Element> {
        self.elements().find(|el| el.name == name)
    }

    /// Concatenated text of all descendants.
    pub fn text(&self) -> String {
        let mut out = String::new();
        self.collect_text(&mut out);
        out
    }

    fn collect_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                Markup::Text(text) => out.push_str(text),
                Markup::Element(el) => el.collect_text(out),
            }
        }
    }

    /// Serialize the element back to markup.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        out.push('<');
        out.push_str(&self.name);
        for (key, value) in &self.attrs {
            out.push(' ');
            out.push_str(key);
            out.push_str("=\"");
            out.push_str(&escape(value.as_str()));
            out.push('"');
        }
        out.push('>');
        if is_void(&self.name) {
            return;
        }
        for child in &self.children {
            match child {
                Markup::Text(text) => out.push_str(&partial_escape(text.as_str())),
                Markup::Element(el) => el.write_html(out),
            }
        }
        out.push_str("</");
        out.push_str(&self.name);
        out.push('>');
    }
}

fn is_void(name: &str) -> bool {
    VOID_ELEMENTS.contains(&name)
}

/// Build the element tree for an HTML string.
///
/// The returned element is a synthetic [`ROOT`] holding the top-level nodes.
/// Unclosed elements are closed at the end of their parent or of the input;
/// stray end tags are ignored.
pub(crate) fn parse_markup(input: &str) -> Result<Element> {
    let mut reader = Reader::from_str(input);
    let config = reader.config_mut();
    config.trim_text(false);
    config.check_end_names = false;
    config.allow_unmatched_ends = true;

    let mut stack = vec![Element::new(ROOT)];
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let el = start_element(&e);
                if is_void(&el.name) {
                    append(&mut stack, Markup::Element(el));
                } else {
                    stack.push(el);
                }
            }
            Event::Empty(e) => append(&mut stack, Markup::Element(start_element(&e))),
            Event::End(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase();
                close(&mut stack, &name);
            }
            Event::Text(e) => {
                let text = decode_text(&e);
                if !text.is_empty() {
                    append(&mut stack, Markup::Text(text));
                }
            }
            Event::CData(e) => {
                let text = String::from_utf8_lossy(&e.into_inner()).into_owned();
                append(&mut stack, Markup::Text(text));
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    while stack.len() > 1 {
        if let Some(el) = stack.pop() {
            append(&mut stack, Markup::Element(el));
        }
    }
    Ok(stack.pop().unwrap_or_else(|| Element::new(ROOT)))
}

fn start_element(e: &BytesStart<'_>) -> Element {
    let mut el = Element::new(String::from_utf8_lossy(e.name().as_ref()).to_ascii_lowercase());
    for attr in e.html_attributes().flatten() {
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_ascii_lowercase();
        let value = match attr.unescape_value() {
            Ok(value) => value.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        el.attrs.push((key, value));
    }
    el
}

fn append(stack: &mut [Element], node: Markup) {
    if let Some(parent) = stack.last_mut() {
        parent.children.push(node);
    }
}

/// Close the innermost open element named `name`, and any left open inside it.
fn close(stack: &mut Vec<Element>, name: &str) {
    let Some(depth) = stack.iter().skip(1).rposition(|el| el.name == name) else {
        log::trace!("ignoring stray </{}>", name);
        return;
    };
    let depth = depth + 1;
    while stack.len() > depth {
        if let Some(el) = stack.pop() {
            append(stack, Markup::Element(el));
        }
    }
}

fn decode_text(e: &BytesText<'_>) -> String {
    match e.unescape_with(resolve_entity) {
        Ok(text) => text.into_owned(),
        Err(_) => String::from_utf8_lossy(e).into_owned(),
    }
}

/// Named entities understood in text, beyond numeric references.
fn resolve_entity(entity: &str) -> Option<&'static str> {
    let value = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => "\u{a0}",
        "copy" => "\u{a9}",
        "reg" => "\u{ae}",
        "trade" => "\u{2122}",
        "ndash" => "\u{2013}",
        "mdash" => "\u{2014}",
        "hellip" => "\u{2026}",
        "lsquo" => "\u{2018}",
        "rsquo" => "\u{2019}",
        "ldquo" => "\u{201c}",
        "rdquo" => "\u{201d}",
        "laquo" => "\u{ab}",
        "raquo" => "\u{bb}",
        "bull" => "\u{2022}",
        "middot" => "\u{b7}",
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first(root: &Element) -> &Element {
        root.elements().next().unwrap()
    }

    #[test]
    fn test_nested_elements_and_attributes() {
        let root = parse_markup(r#"<div data-type="page" class="page a"><p>Hi</p></div>"#).unwrap();
        let page = first(&root);
        assert_eq!(page.name, "div");
        assert_eq!(page.attr("data-type"), Some("page"));
        assert!(page.has_class("page"));
        assert!(!page.has_class("pag"));
        assert_eq!(page.child("p").unwrap().text(), "Hi");
    }

    #[test]
    fn test_void_elements_do_not_nest() {
        let root = parse_markup("<p>a<br>b<img src=x.png>c</p>").unwrap();
        let p = first(&root);
        assert_eq!(p.children.len(), 5);
        assert_eq!(p.text(), "abc");
        assert_eq!(p.child("img").unwrap().attr("src"), Some("x.png"));
    }

    #[test]
    fn test_unclosed_and_stray_tags() {
        let root = parse_markup("<ul><li>one<li>two</ul></span><p>end").unwrap();
        let names: Vec<&str> = root.elements().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["ul", "p"]);
        assert_eq!(root.child("p").unwrap().text(), "end");
    }

    #[test]
    fn test_entities() {
        let root = parse_markup("<p>a &amp; b&nbsp;c &#169; &mdash;</p>").unwrap();
        assert_eq!(first(&root).text(), "a & b\u{a0}c \u{a9} \u{2014}");
    }

    #[test]
    fn test_style_lookup() {
        let root = parse_markup(r#"<p style="color: red; text-align: center">x</p>"#).unwrap();
        assert_eq!(first(&root).style("text-align"), Some("center"));
        assert_eq!(first(&root).style("margin"), None);
    }

    #[test]
    fn test_to_html_escapes() {
        let root = parse_markup(r#"<section title="a&quot;b"><b>1 &lt; 2</b><hr></section>"#).unwrap();
        assert_eq!(
            first(&root).to_html(),
            r#"<section title="a&quot;b"><b>1 &lt; 2</b><hr></section>"#
        );
    }
}
