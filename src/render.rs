use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::block::{Block, Document, HeadingLevel, ListStyle, Mark};
use crate::substitute::{SubstitutionMap, substitute};
use crate::transform::{InlineFolder, fold_inlines};

/// Output wrapper kind for a block or mark
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "tag", rename_all = "lowercase")]
pub enum Tag {
    Paragraph,
    Heading { level: HeadingLevel },
    ListItem { style: ListStyle, level: u8 },
    Anchor { href: String },
    Bold,
    Italic,
}

impl Tag {
    /// HTML element name for this wrapper.
    pub fn name(&self) -> &'static str {
        match self {
            Tag::Paragraph => "p",
            Tag::Heading { level } => match level {
                HeadingLevel::H1 => "h1",
                HeadingLevel::H2 => "h2",
                HeadingLevel::H3 => "h3",
                HeadingLevel::H4 => "h4",
            },
            Tag::ListItem { .. } => "li",
            Tag::Anchor { .. } => "a",
            Tag::Bold => "strong",
            Tag::Italic => "em",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Element {
    #[serde(flatten)]
    pub tag: Tag,
    pub children: Vec<Node>,
}

/// A presentation node handed to page layout
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Node {
    Element(Element),
    Text(String),
    /// Content with no wrapper mapping, forwarded as fetched
    Passthrough(Value),
}

impl Node {
    pub fn element(tag: Tag, children: Vec<Node>) -> Self {
        Node::Element(Element { tag, children })
    }
}

pub fn mark_tag(mark: &Mark) -> Tag {
    match mark {
        Mark::Link { href } => Tag::Anchor { href: href.clone() },
        Mark::Strong => Tag::Bold,
        Mark::Emphasis => Tag::Italic,
    }
}

/// Name a raw CMS node by its `_type`, for diagnostics.
pub(crate) fn node_type(raw: &Value) -> &str {
    raw.get("_type").and_then(Value::as_str).unwrap_or("untyped")
}

/// Maps inlines to nodes, substituting leaf text when given a map.
struct Dispatch<'a> {
    map: Option<&'a SubstitutionMap>,
}

impl InlineFolder for Dispatch<'_> {
    type Output = Node;

    fn text(&mut self, text: &str) -> Node {
        match self.map {
            Some(map) => Node::Text(substitute(Some(text), map)),
            None => Node::Text(text.to_owned()),
        }
    }

    fn mark(&mut self, mark: &Mark, children: Vec<Node>) -> Node {
        Node::element(mark_tag(mark), children)
    }

    fn unknown(&mut self, raw: &Value) -> Node {
        warn!("passing through unsupported inline node `{}`", node_type(raw));
        Node::Passthrough(raw.clone())
    }
}

/// Map one block to its presentation node. No substitution happens here.
pub fn dispatch_block(block: &Block) -> Node {
    dispatch(block, &mut Dispatch { map: None })
}

fn dispatch(block: &Block, folder: &mut Dispatch<'_>) -> Node {
    let (tag, content) = match block {
        Block::Paragraph { content } => (Tag::Paragraph, content),
        Block::Heading { level, content } => (Tag::Heading { level: *level }, content),
        Block::ListItem {
            style,
            level,
            content,
        } => (
            Tag::ListItem {
                style: *style,
                level: *level,
            },
            content,
        ),
        Block::Unknown { raw } => {
            warn!("passing through unsupported block `{}`", node_type(raw));
            return Node::Passthrough(raw.clone());
        }
    };
    Node::element(tag, fold_inlines(content, folder))
}

/// Map the document to presentation nodes, substituting placeholders in
/// every text leaf on the way.
///
/// A missing document renders as nothing. The output has exactly one
/// node per block.
pub fn render(document: Option<&Document>, map: &SubstitutionMap) -> Vec<Node> {
    let Some(document) = document else {
        return Vec::new();
    };
    let mut folder = Dispatch { map: Some(map) };
    document
        .blocks
        .iter()
        .map(|block| dispatch(block, &mut folder))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Inline;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn missing_document_renders_nothing() {
        assert!(render(None, &SubstitutionMap::new("Acme", "Rival")).is_empty());
        assert!(render(Some(&Document::default()), &SubstitutionMap::default()).is_empty());
    }

    #[test]
    fn blocks_and_marks_dispatch_to_wrappers() {
        let document = Document::new(vec![
            Block::Heading {
                level: HeadingLevel::H3,
                content: vec![Inline::text("%THIS_TOOL%")],
            },
            Block::ListItem {
                style: ListStyle::Bullet,
                level: 1,
                content: vec![Inline::marked(
                    Mark::Link {
                        href: "https://acme.example/%THIS_TOOL%".into(),
                    },
                    vec![
                        Inline::marked(Mark::Strong, vec![Inline::text("%THIS_TOOL%")]),
                        Inline::marked(Mark::Emphasis, vec![Inline::text(" docs")]),
                    ],
                )],
            },
        ]);

        let nodes = render(Some(&document), &SubstitutionMap::new("Acme", "Rival"));
        assert_eq!(
            nodes,
            vec![
                Node::element(
                    Tag::Heading {
                        level: HeadingLevel::H3
                    },
                    vec![text("Acme")]
                ),
                Node::element(
                    Tag::ListItem {
                        style: ListStyle::Bullet,
                        level: 1
                    },
                    vec![Node::element(
                        Tag::Anchor {
                            href: "https://acme.example/%THIS_TOOL%".into()
                        },
                        vec![
                            Node::element(Tag::Bold, vec![text("Acme")]),
                            Node::element(Tag::Italic, vec![text(" docs")]),
                        ]
                    )]
                ),
            ]
        );
    }

    #[test]
    fn unknown_nodes_pass_through() {
        let image = json!({"_type": "image", "asset": {"_ref": "image-abc"}});
        let mention = json!({"_type": "mention"});
        let document = Document::new(vec![
            Block::Unknown { raw: image.clone() },
            Block::paragraph(vec![Inline::Unknown(mention.clone())]),
        ]);

        let nodes = render(Some(&document), &SubstitutionMap::default());
        assert_eq!(
            nodes,
            vec![
                Node::Passthrough(image),
                Node::element(Tag::Paragraph, vec![Node::Passthrough(mention)]),
            ]
        );
    }

    #[test]
    fn dispatch_alone_keeps_placeholders() {
        let block = Block::paragraph(vec![Inline::text("%THIS_TOOL%")]);
        assert_eq!(
            dispatch_block(&block),
            Node::element(Tag::Paragraph, vec![text("%THIS_TOOL%")])
        );
    }

    #[test]
    fn deeply_nested_document_renders() {
        let mut inline = Inline::text("%THIS_TOOL%");
        for _ in 0..100_000 {
            inline = Inline::marked(Mark::Strong, vec![inline]);
        }
        let document = Document::new(vec![Block::paragraph(vec![inline])]);

        let mut nodes = render(Some(&document), &SubstitutionMap::new("Acme", "Rival"));
        assert_eq!(nodes.len(), 1);

        let mut depth = 0;
        let mut current = nodes.as_slice();
        while let [Node::Element(Element { children, .. })] = current {
            depth += 1;
            current = children.as_slice();
        }
        // Paragraph plus one element per mark
        assert_eq!(depth, 100_001);
        assert_eq!(current, &[text("Acme")][..]);

        // Drop glue recurses, so unwind both trees by hand
        while let Some(Node::Element(Element { children, .. })) = nodes.pop() {
            nodes = children;
        }
        for block in document.blocks {
            if let Block::Paragraph { content } = block {
                let mut pending = content;
                while let Some(Inline::Mark { content, .. }) = pending.pop() {
                    pending = content;
                }
            }
        }
    }

    #[test]
    fn tag_names() {
        assert_eq!(Tag::Paragraph.name(), "p");
        assert_eq!(
            Tag::Heading {
                level: HeadingLevel::H4
            }
            .name(),
            "h4"
        );
        assert_eq!(Tag::Bold.name(), "strong");
        assert_eq!(Tag::Italic.name(), "em");
        assert_eq!(Tag::Anchor { href: String::new() }.name(), "a");
    }
}
