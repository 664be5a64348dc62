//! Copy for a tool comparison page, as fetched from the CMS.
//!
//! Most copy is shared site-wide in the site settings and personalized per
//! page with the names from that page's comparison table.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::block::Document;
use crate::render::{Node, render};
use crate::substitute::{SubstitutionMap, Token, substitute};

const DEFAULT_PRIMARY_CTA: &str = "Get started";
const DEFAULT_SECONDARY_CTA: &str = "Book a demo";

/// Hero paragraph for pages that leave theirs empty.
fn default_hero_paragraph(hero_title: &str) -> String {
    format!("Everything you ever wanted to know about {hero_title}… but analytics never told you.")
}

/// A label, or `default` when it is unset or empty.
fn label_or(label: &Option<String>, default: &str) -> String {
    match label.as_deref() {
        Some(label) if !label.is_empty() => label.to_string(),
        _ => default.to_string(),
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PageError {
    #[error("page payload has no `{0}`")]
    MissingContent(&'static str),
}

/// The fetched content for one tool page: `{ "tool": ..., "globalSettings": ... }`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PagePayload {
    pub tool: Option<ToolPage>,
    pub global_settings: Option<GlobalSettings>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ToolPage {
    pub hero_paragraph: Option<String>,
    pub comparison_table: Option<ComparisonTable>,
    pub tool_specific_sections: Document,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonTable {
    pub headline: Option<String>,
    pub rows: Option<Vec<ComparisonRow>>,
    pub competitor_heading: Option<String>,
    pub this_tool_heading: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ComparisonRow {
    pub feature: Option<String>,
    pub this_tool: Option<bool>,
    pub competitor: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GlobalSettings {
    pub hero_title: Option<String>,
    pub hero_cta_primary: Option<String>,
    pub hero_cta_secondary: Option<String>,
    pub comparison_headline: Option<String>,
    pub comparison_table_bottom_text: Option<String>,
    pub demo_pitch_headline: Option<String>,
    pub demo_pitch_subtext: Option<String>,
    pub cta_footer_headline: Option<String>,
    pub cta_footer_subtext: Option<String>,
    pub cta_footer_button_label: Option<String>,
    pub eu_benefits_headline: Option<String>,
    pub eu_benefits_paragraph: Option<String>,
    pub features_title: Option<String>,
    pub features_subtitle: Option<String>,
    pub features: Option<Vec<Feature>>,
    pub footer_columns: Option<Vec<FooterColumn>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Feature {
    pub headline: Option<String>,
    pub paragraph: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct FooterColumn {
    pub title: Option<String>,
    pub items: Option<Vec<String>>,
}

/// Page copy with every placeholder resolved, ready for layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedPage {
    pub this_tool: String,
    pub competitor_tool: String,
    pub hero_title: String,
    pub hero_paragraph: String,
    pub hero_cta_primary: String,
    pub hero_cta_secondary: String,
    pub comparison_headline: String,
    pub comparison_rows: Vec<ComparisonRow>,
    pub comparison_bottom_text: String,
    pub demo_pitch_headline: String,
    pub demo_pitch_subtext: String,
    pub features_title: Option<String>,
    pub features_subtitle: Option<String>,
    pub features: Vec<PersonalizedFeature>,
    pub sections: Vec<Node>,
    pub eu_benefits_headline: String,
    pub eu_benefits_paragraph: String,
    pub cta_headline: String,
    pub cta_subtext: String,
    pub cta_button_label: Option<String>,
    pub footer_columns: Vec<FooterColumn>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonalizedFeature {
    pub headline: String,
    pub paragraph: String,
    /// Feature images are described by their headline
    pub image_alt: String,
}

impl PagePayload {
    fn comparison_table(&self) -> Option<&ComparisonTable> {
        self.tool.as_ref()?.comparison_table.as_ref()
    }

    /// Tool names from the comparison table headings. Unset or empty
    /// headings substitute as nothing.
    pub fn substitutions(&self) -> SubstitutionMap {
        let table = self.comparison_table();
        SubstitutionMap::from_headings(
            table.and_then(|t| t.this_tool_heading.as_deref()),
            table.and_then(|t| t.competitor_heading.as_deref()),
        )
    }

    pub fn personalize(&self) -> Result<PersonalizedPage, PageError> {
        self.personalize_with(&self.substitutions())
    }

    /// Resolve placeholders in every piece of personalized copy with `map`.
    pub fn personalize_with(&self, map: &SubstitutionMap) -> Result<PersonalizedPage, PageError> {
        let tool = self.tool.as_ref().ok_or(PageError::MissingContent("tool"))?;
        let settings = self
            .global_settings
            .as_ref()
            .ok_or(PageError::MissingContent("globalSettings"))?;
        let sub = |text: &Option<String>| substitute(text.as_deref(), map);

        let features = settings
            .features
            .iter()
            .flatten()
            .map(|feature| {
                let headline = sub(&feature.headline);
                PersonalizedFeature {
                    image_alt: headline.clone(),
                    headline,
                    paragraph: sub(&feature.paragraph),
                }
            })
            .collect();

        let sections = render(Some(&tool.tool_specific_sections), map);
        debug!(
            "personalized page with {} sections for {:?}",
            sections.len(),
            map
        );

        let hero_title = sub(&settings.hero_title);
        let hero_paragraph = match sub(&tool.hero_paragraph) {
            paragraph if paragraph.is_empty() => default_hero_paragraph(&hero_title),
            paragraph => paragraph,
        };

        Ok(PersonalizedPage {
            this_tool: map.get(Token::ThisTool).to_string(),
            competitor_tool: map.get(Token::CompetitorTool).to_string(),
            hero_title,
            hero_paragraph,
            hero_cta_primary: label_or(&settings.hero_cta_primary, DEFAULT_PRIMARY_CTA),
            hero_cta_secondary: label_or(&settings.hero_cta_secondary, DEFAULT_SECONDARY_CTA),
            comparison_headline: sub(&settings.comparison_headline),
            comparison_rows: tool
                .comparison_table
                .as_ref()
                .and_then(|table| table.rows.clone())
                .unwrap_or_default(),
            comparison_bottom_text: sub(&settings.comparison_table_bottom_text),
            demo_pitch_headline: sub(&settings.demo_pitch_headline),
            demo_pitch_subtext: sub(&settings.demo_pitch_subtext),
            features_title: settings.features_title.clone(),
            features_subtitle: settings.features_subtitle.clone(),
            features,
            sections,
            eu_benefits_headline: sub(&settings.eu_benefits_headline),
            eu_benefits_paragraph: sub(&settings.eu_benefits_paragraph),
            cta_headline: sub(&settings.cta_footer_headline),
            cta_subtext: sub(&settings.cta_footer_subtext),
            cta_button_label: settings.cta_footer_button_label.clone(),
            footer_columns: settings.footer_columns.clone().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::HeadingLevel;
    use crate::render::Tag;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn payload() -> PagePayload {
        serde_json::from_value(json!({
            "tool": {
                "heroParagraph": "Leave %COMPETITOR_TOOL% behind.",
                "comparisonTable": {
                    "headline": "ignored",
                    "thisToolHeading": "Acme",
                    "competitorHeading": "Rival",
                    "rows": [
                        {"feature": "EU hosting for %THIS_TOOL%", "thisTool": true, "competitor": false}
                    ]
                },
                "toolSpecificSections": [
                    {
                        "_type": "block",
                        "style": "h2",
                        "children": [{"_type": "span", "text": "Why %THIS_TOOL%?"}]
                    },
                    {"_type": "image", "asset": {"_ref": "image-1"}}
                ],
                "testimonials": [{"quote": "great", "author": "someone"}]
            },
            "globalSettings": {
                "heroTitle": "%THIS_TOOL%: the European %COMPETITOR_TOOL% alternative",
                "comparisonHeadline": "%THIS_TOOL% vs %COMPETITOR_TOOL%",
                "features": [
                    {"headline": "Switch from %COMPETITOR_TOOL%", "paragraph": null, "image": {}}
                ],
                "footerColumns": [{"title": "Company", "items": ["About %THIS_TOOL%"]}],
                "ctaFooterButtonLabel": "Try it",
                "heroCtaPrimary": ""
            }
        }))
        .unwrap()
    }

    #[test]
    fn substitutions_come_from_comparison_headings() {
        assert_eq!(payload().substitutions(), SubstitutionMap::new("Acme", "Rival"));
        assert_eq!(PagePayload::default().substitutions(), SubstitutionMap::default());
    }

    #[test]
    fn copy_is_personalized() {
        let page = payload().personalize().unwrap();
        assert_eq!(page.this_tool, "Acme");
        assert_eq!(page.hero_title, "Acme: the European Rival alternative");
        assert_eq!(page.hero_paragraph, "Leave Rival behind.");
        assert_eq!(page.comparison_headline, "Acme vs Rival");
        assert_eq!(page.demo_pitch_headline, "");
        assert_eq!(page.hero_cta_primary, "Get started");
        assert_eq!(page.hero_cta_secondary, "Book a demo");
        assert_eq!(page.cta_button_label.as_deref(), Some("Try it"));
        assert_eq!(
            page.features,
            vec![PersonalizedFeature {
                headline: "Switch from Rival".into(),
                paragraph: String::new(),
                image_alt: "Switch from Rival".into(),
            }]
        );
    }

    #[test]
    fn empty_hero_paragraph_falls_back_to_title() {
        let mut payload = payload();
        payload.tool.as_mut().unwrap().hero_paragraph = Some(String::new());
        if let Some(settings) = payload.global_settings.as_mut() {
            settings.hero_cta_secondary = Some("Talk to us".into());
        }

        let page = payload.personalize().unwrap();
        assert_eq!(
            page.hero_paragraph,
            "Everything you ever wanted to know about Acme: the European Rival alternative… but analytics never told you."
        );
        assert_eq!(page.hero_cta_secondary, "Talk to us");

        payload.tool.as_mut().unwrap().hero_paragraph = None;
        let page = payload.personalize().unwrap();
        assert!(page.hero_paragraph.starts_with("Everything you ever wanted"));
    }

    #[test]
    fn verbatim_fields_are_not_substituted() {
        let page = payload().personalize().unwrap();
        assert_eq!(
            page.comparison_rows[0].feature.as_deref(),
            Some("EU hosting for %THIS_TOOL%")
        );
        assert_eq!(
            page.footer_columns[0].items,
            Some(vec!["About %THIS_TOOL%".to_string()])
        );
    }

    #[test]
    fn sections_are_rendered() {
        let page = payload().personalize().unwrap();
        assert_eq!(page.sections.len(), 2);
        assert_eq!(
            page.sections[0],
            Node::element(
                Tag::Heading {
                    level: HeadingLevel::H2
                },
                vec![Node::Text("Why Acme?".into())]
            )
        );
        assert!(matches!(page.sections[1], Node::Passthrough(_)));
    }

    #[test]
    fn explicit_map_overrides_headings() {
        let map = SubstitutionMap::new("Beta", "Gamma");
        let page = payload().personalize_with(&map).unwrap();
        assert_eq!(page.comparison_headline, "Beta vs Gamma");
    }

    #[test]
    fn missing_sections_are_errors() {
        let err = PagePayload::default().personalize().unwrap_err();
        assert_eq!(err, PageError::MissingContent("tool"));

        let payload: PagePayload = serde_json::from_value(json!({"tool": {}, "globalSettings": null}))
            .unwrap();
        assert_eq!(
            payload.personalize().unwrap_err().to_string(),
            "page payload has no `globalSettings`"
        );
    }
}
