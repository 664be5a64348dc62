//! Placeholder substitution for personalized marketing copy.
//!
//! Authored copy refers to the tool being promoted and its competitor as
//! `%THIS_TOOL%` and `%COMPETITOR_TOOL%`. Both are replaced in one left to
//! right pass; replacement values are never scanned again.

use serde::Serialize;

/// A reserved placeholder name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Token {
    ThisTool,
    CompetitorTool,
}

impl Token {
    pub const ALL: [Token; 2] = [Token::ThisTool, Token::CompetitorTool];

    /// The placeholder as it appears in authored text, delimiters included.
    pub fn placeholder(self) -> &'static str {
        match self {
            Token::ThisTool => "%THIS_TOOL%",
            Token::CompetitorTool => "%COMPETITOR_TOOL%",
        }
    }
}

/// Replacement values for one page render.
///
/// A token without a value substitutes as the empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubstitutionMap {
    this_tool: Option<String>,
    competitor_tool: Option<String>,
}

impl SubstitutionMap {
    pub fn new(this_tool: impl Into<String>, competitor_tool: impl Into<String>) -> Self {
        Self {
            this_tool: Some(this_tool.into()),
            competitor_tool: Some(competitor_tool.into()),
        }
    }

    /// Build from the comparison table's `thisToolHeading` and
    /// `competitorHeading` fields, either of which may be unset.
    pub fn from_headings(this_tool: Option<&str>, competitor_tool: Option<&str>) -> Self {
        Self {
            this_tool: this_tool.map(str::to_owned),
            competitor_tool: competitor_tool.map(str::to_owned),
        }
    }

    pub fn with(mut self, token: Token, value: impl Into<String>) -> Self {
        let value = Some(value.into());
        match token {
            Token::ThisTool => self.this_tool = value,
            Token::CompetitorTool => self.competitor_tool = value,
        }
        self
    }

    pub fn get(&self, token: Token) -> &str {
        let value = match token {
            Token::ThisTool => &self.this_tool,
            Token::CompetitorTool => &self.competitor_tool,
        };
        value.as_deref().unwrap_or("")
    }
}

/// Replace every reserved placeholder in `text`.
///
/// `None` yields an empty string. Unrecognized `%NAME%` sequences are left
/// as they are.
pub fn substitute(text: Option<&str>, map: &SubstitutionMap) -> String {
    let Some(text) = text else {
        return String::new();
    };

    let mut out = String::with_capacity(text.len());
    let mut rest = text;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];

        match Token::ALL
            .into_iter()
            .find(|token| rest.starts_with(token.placeholder()))
        {
            Some(token) => {
                out.push_str(map.get(token));
                rest = &rest[token.placeholder().len()..];
            }
            None => {
                // Only this '%' is consumed so a token may start at the next one
                out.push('%');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}
