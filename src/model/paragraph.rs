//! Paragraph and text-level types.

use serde::{Deserialize, Serialize};

/// A text block: a paragraph, or a heading when `style.heading_level` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    /// Inline content of the block
    pub content: Vec<InlineContent>,

    /// Paragraph style
    #[serde(default)]
    pub style: ParagraphStyle,
}

impl Paragraph {
    /// Create a new empty paragraph.
    pub fn new() -> Self {
        Self {
            content: Vec::new(),
            style: ParagraphStyle::default(),
        }
    }

    /// Create a paragraph with plain text.
    pub fn with_text(text: impl Into<String>) -> Self {
        let mut p = Self::new();
        p.add_text(text);
        p
    }

    /// Create a heading paragraph.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        let mut p = Self::with_text(text);
        p.style.heading_level = Some(level.clamp(1, 6));
        p
    }

    /// Set the anchor id rendered on a heading.
    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.style.anchor = Some(anchor.into());
        self
    }

    /// Add plain text to the paragraph.
    pub fn add_text(&mut self, text: impl Into<String>) {
        self.content.push(InlineContent::Text(TextRun {
            text: text.into(),
            style: TextStyle::default(),
        }));
    }

    /// Add a styled text run.
    pub fn add_run(&mut self, run: TextRun) {
        self.content.push(InlineContent::Text(run));
    }

    /// Add a line break.
    pub fn add_line_break(&mut self) {
        self.content.push(InlineContent::LineBreak);
    }

    /// Get plain text content of the paragraph.
    pub fn plain_text(&self) -> String {
        self.content
            .iter()
            .map(|c| match c {
                InlineContent::Text(run) => run.text.clone(),
                InlineContent::LineBreak => "\n".to_string(),
                InlineContent::Link { text, .. } => text.clone(),
            })
            .collect()
    }

    /// Number of position units occupied by the inline content.
    ///
    /// Text counts one unit per character, a line break counts one.
    pub fn text_len(&self) -> usize {
        self.content
            .iter()
            .map(|c| match c {
                InlineContent::Text(run) => run.text.chars().count(),
                InlineContent::LineBreak => 1,
                InlineContent::Link { text, .. } => text.chars().count(),
            })
            .sum()
    }

    /// Size of the paragraph node in position units (open + content + close).
    pub fn node_size(&self) -> usize {
        2 + self.text_len()
    }

    /// Check if the paragraph is empty.
    pub fn is_empty(&self) -> bool {
        self.content.is_empty() || self.plain_text().trim().is_empty()
    }

    /// Check if this is a heading.
    pub fn is_heading(&self) -> bool {
        self.style.heading_level.is_some()
    }

    /// Get the heading level (1-6) or None.
    pub fn heading_level(&self) -> Option<u8> {
        self.style.heading_level
    }
}

impl Default for Paragraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Inline content within a paragraph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InlineContent {
    /// A text run with styling
    Text(TextRun),

    /// A hard line break
    LineBreak,

    /// A hyperlink
    Link {
        /// Link text
        text: String,
        /// Link URL
        url: String,
    },
}

/// A run of text with consistent styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    #[serde(default)]
    pub style: TextStyle,
}

impl TextRun {
    /// Create a new text run with default style.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a bold text run.
    pub fn bold(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                bold: true,
                ..Default::default()
            },
        }
    }

    /// Create an italic text run.
    pub fn italic(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle {
                italic: true,
                ..Default::default()
            },
        }
    }

    /// Check if this run is empty.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

/// Text marks carried by a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    #[serde(default)]
    pub bold: bool,

    /// Italic text
    #[serde(default)]
    pub italic: bool,

    /// Underlined text
    #[serde(default)]
    pub underline: bool,

    /// Strikethrough text
    #[serde(default)]
    pub strikethrough: bool,
}

impl TextStyle {
    /// Check if any styling is applied.
    pub fn has_styling(&self) -> bool {
        self.bold || self.italic || self.underline || self.strikethrough
    }
}

/// Paragraph styling properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParagraphStyle {
    /// Heading level (1-6) or None for normal paragraph
    #[serde(default)]
    pub heading_level: Option<u8>,

    /// Anchor id of a heading, used by the table of contents
    #[serde(default)]
    pub anchor: Option<String>,

    /// Text alignment
    #[serde(default)]
    pub alignment: Alignment,
}

/// Text alignment.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Alignment {
    /// Left alignment (default)
    #[default]
    Left,
    /// Center alignment
    Center,
    /// Right alignment
    Right,
    /// Justified alignment
    Justify,
}

impl Alignment {
    /// CSS `text-align` value, or None for the default.
    pub fn css_value(&self) -> Option<&'static str> {
        match self {
            Alignment::Left => None,
            Alignment::Center => Some("center"),
            Alignment::Right => Some("right"),
            Alignment::Justify => Some("justify"),
        }
    }

    /// Parse a CSS `text-align` value.
    pub fn from_css(value: &str) -> Self {
        match value.trim() {
            "center" => Alignment::Center,
            "right" => Alignment::Right,
            "justify" => Alignment::Justify,
            _ => Alignment::Left,
        }
    }
}

/// A bulleted or numbered list; each item is a single paragraph.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Whether the list is numbered
    #[serde(default)]
    pub ordered: bool,

    /// List items
    pub items: Vec<Paragraph>,
}

impl List {
    /// Create an empty bulleted list.
    pub fn bullet() -> Self {
        Self::default()
    }

    /// Create an empty numbered list.
    pub fn numbered() -> Self {
        Self {
            ordered: true,
            items: Vec::new(),
        }
    }

    /// Append an item.
    pub fn add_item(&mut self, item: Paragraph) {
        self.items.push(item);
    }

    /// Size in position units: each item is a list-item node wrapping a paragraph.
    pub fn node_size(&self) -> usize {
        2 + self
            .items
            .iter()
            .map(|item| 2 + item.node_size())
            .sum::<usize>()
    }

    /// Get plain text content of the list, one item per line.
    pub fn plain_text(&self) -> String {
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                if self.ordered {
                    format!("{}. {}", i + 1, item.plain_text())
                } else {
                    format!("- {}", item.plain_text())
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}
