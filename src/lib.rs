mod block;
mod config;
mod error;
mod html;
pub mod page;
mod parser;
pub mod portable_text;
mod render;
mod substitute;
mod transform;

pub use block::{Block, Document, HeadingLevel, Inline, ListStyle, Mark};
pub use config::{Config, LinksConfig, RenderConfig};
pub use error::{Error, Result};
pub use html::to_html;
pub use page::{PageError, PagePayload, PersonalizedPage};
pub use render::{Element, Node, Tag, dispatch_block, mark_tag, render};
pub use substitute::{SubstitutionMap, Token, substitute};
pub use transform::{
    InlineFolder, fold_inlines, map_text, transform, transform_block, transform_inlines,
};

/// Parse markdown copy into a document.
pub fn parse_markdown(markdown: &str) -> Document {
    parser::parse(markdown)
}

/// Render a document to HTML using the default config.
pub fn render_html(document: Option<&Document>, map: &SubstitutionMap) -> String {
    render_html_with_config(document, map, &Config::compiled_default())
}

/// Render a document to HTML with a custom config.
pub fn render_html_with_config(
    document: Option<&Document>,
    map: &SubstitutionMap,
    config: &Config,
) -> String {
    to_html(&render(document, map), config)
}

/// Convert markdown copy to personalized HTML using the default config.
pub fn markdown_to_html(markdown: &str, map: &SubstitutionMap) -> String {
    let document = parse_markdown(markdown);
    render_html(Some(&document), map)
}
