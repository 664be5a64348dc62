//! Decoder for Portable Text, the block JSON a headless CMS hands out for
//! rich-text fields.
//!
//! Spans carry flat mark lists (`["strong", "a1b2"]`) where non-decorator
//! names are keys into the block's `markDefs`. These are nested into
//! [`Inline::Mark`] trees: a mark shared with the previous span stays open,
//! and of the marks opened together the one running longest is outermost.

use std::cmp::Reverse;
use std::collections::HashMap;

use log::{debug, warn};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::block::{Block, Document, HeadingLevel, Inline, ListStyle, Mark};
use crate::error::Result;
use crate::render::node_type;

/// Decode a Portable Text value. `null` and non-array values decode to an
/// empty document; unsupported blocks are kept as [`Block::Unknown`].
pub fn decode(value: &Value) -> Document {
    let blocks = match value {
        Value::Null => return Document::default(),
        Value::Array(blocks) => blocks,
        other => {
            warn!("expected a block array, got `{}`", node_type(other));
            return Document::default();
        }
    };

    let document = Document::new(blocks.iter().map(decode_block).collect());
    debug!("decoded {} portable text blocks", document.len());
    document
}

/// Decode Portable Text from a JSON string.
pub fn from_str(json: &str) -> Result<Document> {
    let value: Value = serde_json::from_str(json)?;
    Ok(decode(&value))
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Ok(decode(&value))
    }
}

fn unknown_block(raw: &Value) -> Block {
    Block::Unknown { raw: raw.clone() }
}

fn decode_block(raw: &Value) -> Block {
    if raw.get("_type").and_then(Value::as_str) != Some("block") {
        return unknown_block(raw);
    }

    let content = || decode_children(raw);

    if let Some(list_item) = raw.get("listItem") {
        let style = match list_item.as_str() {
            Some("bullet") => ListStyle::Bullet,
            Some("number") => ListStyle::Number,
            _ => return unknown_block(raw),
        };
        let level = raw
            .get("level")
            .and_then(Value::as_u64)
            .map_or(1, |level| level.clamp(1, u8::MAX as u64) as u8);
        return Block::ListItem {
            style,
            level,
            content: content(),
        };
    }

    match raw.get("style").and_then(Value::as_str).unwrap_or("normal") {
        "normal" => Block::Paragraph { content: content() },
        style => match heading_level(style) {
            Some(level) => Block::Heading {
                level,
                content: content(),
            },
            None => unknown_block(raw),
        },
    }
}

fn heading_level(style: &str) -> Option<HeadingLevel> {
    let digits = style.strip_prefix('h')?;
    HeadingLevel::from_u8(digits.parse().ok()?)
}

enum Child<'a> {
    Span {
        text: &'a str,
        marks: Vec<(&'a str, Mark)>,
    },
    Other(&'a Value),
}

impl Child<'_> {
    fn has_mark(&self, name: &str) -> bool {
        match self {
            Child::Span { marks, .. } => marks.iter().any(|(n, _)| *n == name),
            Child::Other(_) => false,
        }
    }
}

fn mark_defs(raw: &Value) -> HashMap<&str, Mark> {
    let mut defs = HashMap::new();
    let Some(entries) = raw.get("markDefs").and_then(Value::as_array) else {
        return defs;
    };
    for def in entries {
        let Some(key) = def.get("_key").and_then(Value::as_str) else {
            continue;
        };
        match def.get("_type").and_then(Value::as_str) {
            Some("link") => {
                let href = def.get("href").and_then(Value::as_str).unwrap_or_default();
                defs.insert(key, Mark::Link {
                    href: href.to_string(),
                });
            }
            _ => warn!("ignoring unsupported annotation `{}`", node_type(def)),
        }
    }
    defs
}

fn resolve_mark(name: &str, defs: &HashMap<&str, Mark>) -> Option<Mark> {
    match name {
        "strong" => Some(Mark::Strong),
        "em" => Some(Mark::Emphasis),
        key => defs.get(key).cloned(),
    }
}

fn decode_children(raw: &Value) -> Vec<Inline> {
    let Some(children) = raw.get("children").and_then(Value::as_array) else {
        return Vec::new();
    };
    let defs = mark_defs(raw);

    let children: Vec<Child> = children
        .iter()
        .map(|child| {
            if child.get("_type").and_then(Value::as_str) != Some("span") {
                return Child::Other(child);
            }
            let text = child.get("text").and_then(Value::as_str).unwrap_or_default();
            let mut marks: Vec<(&str, Mark)> = Vec::new();
            for name in child
                .get("marks")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .filter_map(Value::as_str)
            {
                if marks.iter().any(|(n, _)| *n == name) {
                    continue;
                }
                match resolve_mark(name, &defs) {
                    Some(mark) => marks.push((name, mark)),
                    None => warn!("dropping unsupported mark `{}`", name),
                }
            }
            Child::Span { text, marks }
        })
        .collect();

    nest_marks(&children)
}

struct OpenMark<'a> {
    name: &'a str,
    mark: Mark,
    content: Vec<Inline>,
}

fn close_marks(open: &mut Vec<OpenMark>, keep: usize, root: &mut Vec<Inline>) {
    while open.len() > keep {
        let Some(done) = open.pop() else {
            break;
        };
        let inline = Inline::Mark {
            mark: done.mark,
            content: done.content,
        };
        match open.last_mut() {
            Some(parent) => parent.content.push(inline),
            None => root.push(inline),
        }
    }
}

/// For every span mark, the number of consecutive children starting at that
/// span which carry the same mark. Computed in one backward pass.
fn run_lengths(children: &[Child]) -> Vec<Vec<usize>> {
    let mut runs: Vec<Vec<usize>> = vec![Vec::new(); children.len()];
    for i in (0..children.len()).rev() {
        let Child::Span { marks, .. } = &children[i] else {
            continue;
        };
        let next = children.get(i + 1).zip(runs.get(i + 1));
        let here: Vec<usize> = marks
            .iter()
            .map(|(name, _)| match next {
                Some((Child::Span { marks: after, .. }, after_runs)) => after
                    .iter()
                    .position(|(n, _)| n == name)
                    .and_then(|j| after_runs.get(j))
                    .map_or(1, |run| run + 1),
                _ => 1,
            })
            .collect();
        runs[i] = here;
    }
    runs
}

fn nest_marks(children: &[Child]) -> Vec<Inline> {
    let mut root = Vec::new();
    let mut open: Vec<OpenMark> = Vec::new();
    let runs = run_lengths(children);

    for (child, runs) in children.iter().zip(&runs) {
        match child {
            Child::Other(raw) => {
                close_marks(&mut open, 0, &mut root);
                root.push(Inline::Unknown((*raw).clone()));
            }
            Child::Span { text, marks } => {
                let keep = open
                    .iter()
                    .position(|o| !child.has_mark(o.name))
                    .unwrap_or(open.len());
                close_marks(&mut open, keep, &mut root);

                let mut pending: Vec<(&(&str, Mark), usize)> = marks
                    .iter()
                    .zip(runs.iter().copied())
                    .filter(|((name, _), _)| !open.iter().any(|o| o.name == *name))
                    .collect();
                pending.sort_by_key(|(_, run)| Reverse(*run));
                for ((name, mark), _) in pending {
                    open.push(OpenMark {
                        name: *name,
                        mark: mark.clone(),
                        content: Vec::new(),
                    });
                }

                let leaf = Inline::Text((*text).to_string());
                match open.last_mut() {
                    Some(top) => top.content.push(leaf),
                    None => root.push(leaf),
                }
            }
        }
    }
    close_marks(&mut open, 0, &mut root);

    root
}
