use serde::Serialize;
use serde_json::Value;

/// Annotation applied to a run of inline content
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Mark {
    Link { href: String },
    Strong,
    Emphasis,
}

/// Inline content of a block: text leaves and mark spans, which may nest
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Inline {
    Text(String),
    Mark { mark: Mark, content: Vec<Inline> },
    /// A CMS child node this crate has no model for, kept verbatim
    Unknown(Value),
}

impl Inline {
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(text.into())
    }

    pub fn marked(mark: Mark, content: Vec<Inline>) -> Self {
        Inline::Mark { mark, content }
    }

    /// Concatenated leaf text, ignoring marks and unknown nodes.
    pub fn plain_text(inlines: &[Inline]) -> String {
        let mut out = String::new();
        let mut stack: Vec<&Inline> = inlines.iter().rev().collect();
        while let Some(inline) = stack.pop() {
            match inline {
                Inline::Text(text) => out.push_str(text),
                Inline::Mark { content, .. } => stack.extend(content.iter().rev()),
                Inline::Unknown(_) => {}
            }
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeadingLevel {
    H1,
    H2,
    H3,
    H4,
}

impl HeadingLevel {
    /// Levels above 4 have no heading variant.
    pub fn from_u8(level: u8) -> Option<Self> {
        match level {
            1 => Some(HeadingLevel::H1),
            2 => Some(HeadingLevel::H2),
            3 => Some(HeadingLevel::H3),
            4 => Some(HeadingLevel::H4),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            HeadingLevel::H1 => 1,
            HeadingLevel::H2 => 2,
            HeadingLevel::H3 => 3,
            HeadingLevel::H4 => 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ListStyle {
    Bullet,
    Number,
}

/// Top-level structural unit of a document
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Block {
    Paragraph {
        content: Vec<Inline>,
    },
    Heading {
        level: HeadingLevel,
        content: Vec<Inline>,
    },
    ListItem {
        style: ListStyle,
        /// Nesting depth, starting at 1
        level: u8,
        content: Vec<Inline>,
    },
    Unknown {
        raw: Value,
    },
}

impl Block {
    pub fn paragraph(content: Vec<Inline>) -> Self {
        Block::Paragraph { content }
    }

    /// Inline children, or `None` for unknown blocks.
    pub fn content(&self) -> Option<&[Inline]> {
        match self {
            Block::Paragraph { content }
            | Block::Heading { content, .. }
            | Block::ListItem { content, .. } => Some(content.as_slice()),
            Block::Unknown { .. } => None,
        }
    }
}

/// An ordered sequence of blocks, as fetched for one page render
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Document {
    pub blocks: Vec<Block>,
}

impl Document {
    pub fn new(blocks: Vec<Block>) -> Self {
        Self { blocks }
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}
