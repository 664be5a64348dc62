use serde_json::Value;

use crate::block::ListStyle;
use crate::config::Config;
use crate::render::{Element, Node, Tag, node_type};

/// Serialize presentation nodes to an HTML fragment, one block per line
pub fn to_html(nodes: &[Node], config: &Config) -> String {
    let mut out = String::new();
    let mut lists: Vec<OpenList> = Vec::new();

    for node in nodes {
        match node {
            Node::Element(Element {
                tag: Tag::ListItem { style, level },
                children,
            }) if config.render.group_lists => {
                open_list_item(&mut lists, *style, *level, &mut out);
                write_nodes(children, config, &mut out);
                if let Some(list) = lists.last_mut() {
                    list.item_open = true;
                }
            }
            _ => {
                close_lists(&mut lists, &mut out);
                let start = out.len();
                write_nodes(std::slice::from_ref(node), config, &mut out);
                if out.len() > start {
                    out.push('\n');
                }
            }
        }
    }
    close_lists(&mut lists, &mut out);

    out
}

struct OpenList {
    style: ListStyle,
    level: u8,
    item_open: bool,
}

fn list_tag(style: ListStyle) -> &'static str {
    match style {
        ListStyle::Bullet => "ul",
        ListStyle::Number => "ol",
    }
}

fn close_top_list(lists: &mut Vec<OpenList>, out: &mut String) {
    if let Some(list) = lists.pop() {
        if list.item_open {
            out.push_str("</li>\n");
        }
        out.push_str("</");
        out.push_str(list_tag(list.style));
        out.push_str(">\n");
    }
}

fn close_lists(lists: &mut Vec<OpenList>, out: &mut String) {
    while !lists.is_empty() {
        close_top_list(lists, out);
    }
}

/// Position the output for a new `<li>` at `level`, opening and closing
/// list wrappers as needed, then open the item.
fn open_list_item(lists: &mut Vec<OpenList>, style: ListStyle, level: u8, out: &mut String) {
    let level = level.max(1);

    while let Some(top) = lists.last() {
        if top.level > level || (top.level == level && top.style != style) {
            close_top_list(lists, out);
        } else {
            break;
        }
    }

    match lists.last_mut() {
        Some(top) if top.level == level => {
            if top.item_open {
                out.push_str("</li>\n");
                top.item_open = false;
            }
        }
        _ => {
            // A deeper list nests inside the parent's open item
            if !out.is_empty() && !out.ends_with('\n') {
                out.push('\n');
            }
            out.push('<');
            out.push_str(list_tag(style));
            out.push_str(">\n");
            lists.push(OpenList {
                style,
                level,
                item_open: false,
            });
        }
    }

    out.push_str("<li>");
}

enum Step<'a> {
    Enter(&'a Node),
    Close(&'static str),
}

fn write_nodes(nodes: &[Node], config: &Config, out: &mut String) {
    let mut stack: Vec<Step> = nodes.iter().rev().map(Step::Enter).collect();

    while let Some(step) = stack.pop() {
        match step {
            Step::Close(name) => {
                out.push_str("</");
                out.push_str(name);
                out.push('>');
            }
            Step::Enter(Node::Text(text)) => escape_into(text, out),
            Step::Enter(Node::Passthrough(raw)) => write_passthrough(raw, config, out),
            Step::Enter(Node::Element(element)) => {
                open_tag(&element.tag, config, out);
                stack.push(Step::Close(element.tag.name()));
                stack.extend(element.children.iter().rev().map(Step::Enter));
            }
        }
    }
}

fn open_tag(tag: &Tag, config: &Config, out: &mut String) {
    out.push('<');
    out.push_str(tag.name());
    if let Tag::Anchor { href } = tag {
        push_attr("href", href, out);
        if !config.links.target.is_empty() {
            push_attr("target", &config.links.target, out);
        }
        if !config.links.rel.is_empty() {
            push_attr("rel", &config.links.rel, out);
        }
    }
    out.push('>');
}

fn push_attr(name: &str, value: &str, out: &mut String) {
    out.push(' ');
    out.push_str(name);
    out.push_str("=\"");
    escape_into(value, out);
    out.push('"');
}

fn write_passthrough(raw: &Value, config: &Config, out: &mut String) {
    if !config.render.passthrough_comments {
        return;
    }
    // Keep the type name from closing the comment early
    let name: String = node_type(raw)
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '.'))
        .collect();
    out.push_str("<!-- unsupported: ");
    out.push_str(&name);
    out.push_str(" -->");
}

fn escape_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}
