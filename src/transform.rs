//! Structure-preserving rebuild of rich-text trees.
//!
//! Inline trees are walked with an explicit frame stack, so the depth of
//! editorial nesting is bounded by heap, not by the call stack.

use serde_json::Value;

use crate::block::{Block, Document, Inline, Mark};
use crate::substitute::{SubstitutionMap, substitute};

/// Bottom-up visitor over an inline tree.
///
/// `mark` receives the already folded children of a mark span, in order.
pub trait InlineFolder {
    type Output;

    fn text(&mut self, text: &str) -> Self::Output;
    fn mark(&mut self, mark: &Mark, children: Vec<Self::Output>) -> Self::Output;
    fn unknown(&mut self, raw: &Value) -> Self::Output;
}

struct Frame<'a, T> {
    source: &'a [Inline],
    next: usize,
    mark: Option<&'a Mark>,
    out: Vec<T>,
}

impl<'a, T> Frame<'a, T> {
    fn new(source: &'a [Inline], mark: Option<&'a Mark>) -> Self {
        Self {
            source,
            next: 0,
            mark,
            out: Vec::with_capacity(source.len()),
        }
    }
}

/// Fold a sequence of inlines in document order, one output per input.
pub fn fold_inlines<F: InlineFolder>(inlines: &[Inline], folder: &mut F) -> Vec<F::Output> {
    let mut stack = vec![Frame::new(inlines, None)];

    loop {
        let Some(frame) = stack.last_mut() else {
            return Vec::new();
        };

        if let Some(inline) = frame.source.get(frame.next) {
            frame.next += 1;
            match inline {
                Inline::Text(text) => {
                    let folded = folder.text(text);
                    frame.out.push(folded);
                }
                Inline::Unknown(raw) => {
                    let folded = folder.unknown(raw);
                    frame.out.push(folded);
                }
                Inline::Mark { mark, content } => {
                    stack.push(Frame::new(content, Some(mark)));
                }
            }
            continue;
        }

        // Frame exhausted: close it into its parent
        let Some(done) = stack.pop() else {
            return Vec::new();
        };
        match (done.mark, stack.last_mut()) {
            (Some(mark), Some(parent)) => {
                let folded = folder.mark(mark, done.out);
                parent.out.push(folded);
            }
            _ => return done.out,
        }
    }
}

struct TextMapper<F> {
    map_text: F,
}

impl<F: FnMut(&str) -> String> InlineFolder for TextMapper<F> {
    type Output = Inline;

    fn text(&mut self, text: &str) -> Inline {
        Inline::Text((self.map_text)(text))
    }

    fn mark(&mut self, mark: &Mark, children: Vec<Inline>) -> Inline {
        // Mark attributes (link hrefs) are copied, never mapped
        Inline::Mark {
            mark: mark.clone(),
            content: children,
        }
    }

    fn unknown(&mut self, raw: &Value) -> Inline {
        Inline::Unknown(raw.clone())
    }
}

fn map_block<F: FnMut(&str) -> String>(block: &Block, mapper: &mut TextMapper<F>) -> Block {
    match block {
        Block::Paragraph { content } => Block::Paragraph {
            content: fold_inlines(content, mapper),
        },
        Block::Heading { level, content } => Block::Heading {
            level: *level,
            content: fold_inlines(content, mapper),
        },
        Block::ListItem {
            style,
            level,
            content,
        } => Block::ListItem {
            style: *style,
            level: *level,
            content: fold_inlines(content, mapper),
        },
        Block::Unknown { raw } => Block::Unknown { raw: raw.clone() },
    }
}

/// Rebuild `document` with every text leaf passed through `map_text`.
pub fn map_text<F: FnMut(&str) -> String>(document: &Document, map_text: F) -> Document {
    let mut mapper = TextMapper { map_text };
    Document {
        blocks: document
            .blocks
            .iter()
            .map(|block| map_block(block, &mut mapper))
            .collect(),
    }
}

/// Substitute placeholders in every text leaf of `document`.
pub fn transform(document: &Document, map: &SubstitutionMap) -> Document {
    map_text(document, |text| substitute(Some(text), map))
}

pub fn transform_block(block: &Block, map: &SubstitutionMap) -> Block {
    let mut mapper = TextMapper {
        map_text: |text: &str| substitute(Some(text), map),
    };
    map_block(block, &mut mapper)
}

pub fn transform_inlines(inlines: &[Inline], map: &SubstitutionMap) -> Vec<Inline> {
    let mut mapper = TextMapper {
        map_text: |text: &str| substitute(Some(text), map),
    };
    fold_inlines(inlines, &mut mapper)
}
