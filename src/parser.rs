use log::debug;
use pulldown_cmark::{
    CodeBlockKind, Event, HeadingLevel as MdHeadingLevel, Options, Parser, Tag, TagEnd,
};
use serde_json::json;

use crate::block::{Block, Document, HeadingLevel, Inline, ListStyle, Mark};

/// Strip YAML frontmatter from the beginning of markdown content
fn strip_frontmatter(markdown: &str) -> &str {
    if !markdown.starts_with("---") {
        return markdown;
    }
    // Find the closing ---
    if let Some(end) = markdown[3..].find("\n---") {
        let after_frontmatter = &markdown[3 + end + 4..];
        after_frontmatter.trim_start_matches('\n')
    } else {
        markdown
    }
}

/// Parse markdown copy into a rich-text document
pub fn parse(markdown: &str) -> Document {
    let markdown = strip_frontmatter(markdown);
    let parser = Parser::new_ext(markdown, Options::ENABLE_TABLES);
    let mut state = ParseState::default();

    for event in parser {
        process_event(event, &mut state);
    }

    debug!("parsed {} markdown blocks", state.blocks.len());
    Document::new(state.blocks)
}

#[derive(Default)]
struct ParseState {
    blocks: Vec<Block>,

    // Inline content of the block being built
    spans: Vec<Inline>,
    // Open marks, each with the spans of its parent
    mark_stack: Vec<(Mark, Vec<Inline>)>,

    heading_level: Option<HeadingLevel>,

    in_code_block: bool,
    code_language: Option<String>,
    code_content: String,

    list_stack: Vec<ListStyle>,
    // Whether the current item's text was already emitted ahead of a nested list
    item_flushed: bool,

    in_table: bool,
}

impl ParseState {
    /// Append inline content, merging adjacent text so that placeholders
    /// split across parser events end up in one leaf.
    fn push_inline(&mut self, inline: Inline) {
        if self.in_table {
            return;
        }
        match (self.spans.last_mut(), inline) {
            (Some(Inline::Text(last)), Inline::Text(text)) => last.push_str(&text),
            (_, inline) => self.spans.push(inline),
        }
    }

    fn open_mark(&mut self, mark: Mark) {
        let parent = std::mem::take(&mut self.spans);
        self.mark_stack.push((mark, parent));
    }

    fn close_mark(&mut self) {
        if let Some((mark, mut parent)) = self.mark_stack.pop() {
            let content = std::mem::take(&mut self.spans);
            parent.push(Inline::Mark { mark, content });
            self.spans = parent;
        }
    }

    /// Emit the pending spans as a list item at the current depth.
    fn flush_list_item(&mut self) {
        let Some(style) = self.list_stack.last().copied() else {
            return;
        };
        let content = std::mem::take(&mut self.spans);
        self.blocks.push(Block::ListItem {
            style,
            level: u8::try_from(self.list_stack.len()).unwrap_or(u8::MAX),
            content,
        });
    }
}

fn process_event(event: Event, state: &mut ParseState) {
    match event {
        // Headings
        Event::Start(Tag::Heading { level, .. }) => {
            state.heading_level = Some(heading_level(level));
        }
        Event::End(TagEnd::Heading(_)) => {
            if let Some(level) = state.heading_level.take() {
                let content = std::mem::take(&mut state.spans);
                state.blocks.push(Block::Heading { level, content });
            }
        }

        // Paragraphs
        Event::Start(Tag::Paragraph) => {
            // Paragraphs of one list item share a block, one per line
            if !state.list_stack.is_empty() && !state.spans.is_empty() {
                state.push_inline(Inline::Text("\n".to_string()));
            }
        }
        Event::End(TagEnd::Paragraph) => {
            // Inside a list the item owns the paragraph text
            if state.list_stack.is_empty() && !state.in_table {
                let content = std::mem::take(&mut state.spans);
                if !content.is_empty() {
                    state.blocks.push(Block::Paragraph { content });
                }
            }
        }

        // Text content
        Event::Text(text) => {
            if state.in_code_block {
                state.code_content.push_str(&text);
            } else {
                state.push_inline(Inline::Text(text.into_string()));
            }
        }

        // Inline code has no mark of its own
        Event::Code(code) => {
            state.push_inline(Inline::Text(code.into_string()));
        }

        Event::Start(Tag::Strong) => state.open_mark(Mark::Strong),
        Event::Start(Tag::Emphasis) => state.open_mark(Mark::Emphasis),
        Event::Start(Tag::Link { dest_url, .. }) => state.open_mark(Mark::Link {
            href: dest_url.into_string(),
        }),
        Event::End(TagEnd::Strong | TagEnd::Emphasis | TagEnd::Link) => state.close_mark(),

        // Code blocks
        Event::Start(Tag::CodeBlock(kind)) => {
            state.in_code_block = true;
            state.code_language = match kind {
                CodeBlockKind::Fenced(lang) => {
                    let lang = lang.into_string();
                    if lang.is_empty() { None } else { Some(lang) }
                }
                CodeBlockKind::Indented => None,
            };
            state.code_content.clear();
        }
        Event::End(TagEnd::CodeBlock) => {
            state.in_code_block = false;
            let code = std::mem::take(&mut state.code_content);
            let language = state.code_language.take();
            state.blocks.push(Block::Unknown {
                raw: json!({ "_type": "code", "language": language, "code": code }),
            });
        }

        // Lists
        Event::Start(Tag::List(first_number)) => {
            // Text of the enclosing item comes before its nested items
            if !state.list_stack.is_empty() && !state.item_flushed {
                state.flush_list_item();
                state.item_flushed = true;
            }
            state.list_stack.push(if first_number.is_some() {
                ListStyle::Number
            } else {
                ListStyle::Bullet
            });
        }
        Event::End(TagEnd::List(_)) => {
            state.list_stack.pop();
        }
        Event::Start(Tag::Item) => {
            state.spans.clear();
            state.item_flushed = false;
        }
        Event::End(TagEnd::Item) => {
            // Text after a nested list stays with its item's level
            if !state.item_flushed || !state.spans.is_empty() {
                state.flush_list_item();
            }
            // The parent item, if any, was flushed when this list opened
            state.item_flushed = true;
        }

        Event::Start(Tag::Table(_)) => {
            state.in_table = true;
        }
        Event::End(TagEnd::Table) => {
            debug!("skipping markdown table");
            state.in_table = false;
        }

        Event::SoftBreak => state.push_inline(Inline::Text(" ".to_string())),
        Event::HardBreak => state.push_inline(Inline::Text("\n".to_string())),

        // Rules, raw HTML, footnotes and the like have no block kind
        _ => {}
    }
}

fn heading_level(level: MdHeadingLevel) -> HeadingLevel {
    match level {
        MdHeadingLevel::H1 => HeadingLevel::H1,
        MdHeadingLevel::H2 => HeadingLevel::H2,
        MdHeadingLevel::H3 => HeadingLevel::H3,
        MdHeadingLevel::H4 | MdHeadingLevel::H5 | MdHeadingLevel::H6 => HeadingLevel::H4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn text(s: &str) -> Inline {
        Inline::text(s)
    }

    #[test]
    fn heading_and_paragraph() {
        let doc = parse("# %THIS_TOOL% vs %COMPETITOR_TOOL%\n\nSwitch today.");
        assert_eq!(
            doc.blocks,
            vec![
                Block::Heading {
                    level: HeadingLevel::H1,
                    content: vec![text("%THIS_TOOL% vs %COMPETITOR_TOOL%")]
                },
                Block::paragraph(vec![text("Switch today.")]),
            ]
        );
    }

    #[test]
    fn deep_headings_clamp() {
        let doc = parse("###### Small print");
        assert_eq!(
            doc.blocks,
            vec![Block::Heading {
                level: HeadingLevel::H4,
                content: vec![text("Small print")]
            }]
        );
    }

    #[test]
    fn marks_nest() {
        let doc = parse("See [**%THIS_TOOL%** docs](https://acme.example) *now*");
        assert_eq!(
            doc.blocks,
            vec![Block::paragraph(vec![
                text("See "),
                Inline::marked(
                    Mark::Link {
                        href: "https://acme.example".into()
                    },
                    vec![
                        Inline::marked(Mark::Strong, vec![text("%THIS_TOOL%")]),
                        text(" docs"),
                    ]
                ),
                text(" "),
                Inline::marked(Mark::Emphasis, vec![text("now")]),
            ])]
        );
    }

    #[test]
    fn lists_flatten_with_levels() {
        let doc = parse("- one\n  1. inner\n- two\n");
        assert_eq!(
            doc.blocks,
            vec![
                Block::ListItem {
                    style: ListStyle::Bullet,
                    level: 1,
                    content: vec![text("one")]
                },
                Block::ListItem {
                    style: ListStyle::Number,
                    level: 2,
                    content: vec![text("inner")]
                },
                Block::ListItem {
                    style: ListStyle::Bullet,
                    level: 1,
                    content: vec![text("two")]
                },
            ]
        );
    }

    #[test]
    fn loose_item_paragraphs_stay_apart() {
        let doc = parse("- first %THIS_\n\n  TOOL% para\n");
        assert_eq!(
            doc.blocks,
            vec![Block::ListItem {
                style: ListStyle::Bullet,
                level: 1,
                content: vec![text("first %THIS_\nTOOL% para")]
            }]
        );
    }

    #[test]
    fn text_after_nested_list_stays_in_its_item() {
        let doc = parse("- one\n\n  - inner\n\n  trailing %THIS_\n\nTOOL% next\n");
        assert_eq!(
            doc.blocks,
            vec![
                Block::ListItem {
                    style: ListStyle::Bullet,
                    level: 1,
                    content: vec![text("one")]
                },
                Block::ListItem {
                    style: ListStyle::Bullet,
                    level: 2,
                    content: vec![text("inner")]
                },
                Block::ListItem {
                    style: ListStyle::Bullet,
                    level: 1,
                    content: vec![text("trailing %THIS_")]
                },
                Block::paragraph(vec![text("TOOL% next")]),
            ]
        );
    }

    #[test]
    fn code_block_is_unknown() {
        let doc = parse("```rust\nlet x = 1;\n```");
        assert_eq!(
            doc.blocks,
            vec![Block::Unknown {
                raw: json!({"_type": "code", "language": "rust", "code": "let x = 1;\n"})
            }]
        );
    }

    #[test]
    fn tables_and_rules_are_skipped() {
        let doc = parse("| A | B |\n|---|---|\n| 1 | 2 |\n\n---\n\nafter");
        assert_eq!(doc.blocks, vec![Block::paragraph(vec![text("after")])]);
    }

    #[test]
    fn frontmatter_is_stripped() {
        let doc = parse("---\ntitle: x\n---\n\nbody");
        assert_eq!(doc.blocks, vec![Block::paragraph(vec![text("body")])]);
    }
}
