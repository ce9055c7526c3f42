//! View models for CMS content.
//!
//! Blocks are rendered into typed elements; the markdown dump is only meant
//! for terminal output.

use std::fmt::Write as _;

use serde::Serialize;
use url::Url;

use crate::model::{
    ContentBlock, FeatureIcon, FeaturesSection, Footer, GlobalLayout, Header, HeroSection, Link,
    PageMetadata, Summary,
};

pub const DEFAULT_SITE_TITLE: &str = "Epic Next Course";
pub const DEFAULT_SITE_DESCRIPTION: &str = "Epic Next Course";
const MISSING_ALT_TEXT: &str = "no alternative text";
const SUMMARY_PREVIEW_CHARS: usize = 164;

#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Base for relative media paths such as `/uploads/hero.png`.
    pub media_base: Url,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "target", rename_all = "snake_case")]
pub enum LinkTarget {
    Internal(String),
    /// Opened as-is; never resolved against the site origin or prefetched.
    External(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LinkView {
    pub label: String,
    pub target: LinkTarget,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageView {
    pub src: String,
    pub alt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeroView {
    pub heading: String,
    pub sub_heading: String,
    pub image: Option<ImageView>,
    pub link: Option<LinkView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeatureView {
    pub icon: Option<FeatureIcon>,
    pub heading: String,
    pub sub_heading: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FeaturesView {
    pub title: String,
    pub description: String,
    pub items: Vec<FeatureView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RenderedElement {
    Hero(HeroView),
    Features(FeaturesView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HeaderView {
    pub logo: LinkView,
    pub cta: LinkView,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FooterView {
    pub logo: LinkView,
    pub text: String,
    pub social: Vec<LinkView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutView {
    pub header: Option<HeaderView>,
    pub footer: Option<FooterView>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataView {
    pub title: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SummaryCard {
    pub document_id: String,
    pub href: String,
    pub title: String,
    pub preview: String,
}

/// Renders blocks in order; blocks with an unknown discriminator yield nothing.
pub fn render_blocks(blocks: &[ContentBlock], ctx: &RenderContext) -> Vec<RenderedElement> {
    blocks
        .iter()
        .filter_map(|block| render_block(block, ctx))
        .collect()
}

pub fn render_block(block: &ContentBlock, ctx: &RenderContext) -> Option<RenderedElement> {
    match block {
        ContentBlock::HeroSection(hero) => Some(RenderedElement::Hero(render_hero(hero, ctx))),
        ContentBlock::FeaturesSection(features) => {
            Some(RenderedElement::Features(render_features(features)))
        }
        ContentBlock::Unknown => None,
    }
}

fn render_hero(hero: &HeroSection, ctx: &RenderContext) -> HeroView {
    let image = hero.image.as_ref().and_then(|image| {
        let src = media_url(&ctx.media_base, Some(&image.url))?;
        let alt = image
            .alternative_text
            .clone()
            .filter(|alt| !alt.trim().is_empty())
            .unwrap_or_else(|| MISSING_ALT_TEXT.to_owned());
        Some(ImageView { src, alt })
    });

    HeroView {
        heading: hero.heading.clone(),
        sub_heading: hero.sub_heading.clone(),
        image,
        link: hero.link.as_ref().map(render_link),
    }
}

fn render_features(features: &FeaturesSection) -> FeaturesView {
    let items = features
        .feature
        .iter()
        .map(|feature| FeatureView {
            icon: feature.icon.filter(|icon| *icon != FeatureIcon::Unknown),
            heading: feature.heading.clone(),
            sub_heading: feature.sub_heading.clone(),
        })
        .collect();

    FeaturesView {
        title: features.title.clone(),
        description: features.description.clone(),
        items,
    }
}

pub fn render_link(link: &Link) -> LinkView {
    let target = if link.is_external {
        LinkTarget::External(link.href.clone())
    } else {
        LinkTarget::Internal(link.href.clone())
    };
    LinkView {
        label: link.label.clone(),
        target,
    }
}

pub fn render_layout(layout: &GlobalLayout) -> LayoutView {
    LayoutView {
        header: layout.header.as_ref().map(render_header),
        footer: layout.footer.as_ref().map(render_footer),
    }
}

fn render_header(header: &Header) -> HeaderView {
    HeaderView {
        logo: render_link(&header.logo_text),
        cta: render_link(&header.cta_button),
    }
}

fn render_footer(footer: &Footer) -> FooterView {
    FooterView {
        logo: render_link(&footer.logo_text),
        text: footer.text.clone(),
        social: footer.social_link.iter().map(render_link).collect(),
    }
}

pub fn render_metadata(metadata: Option<&PageMetadata>) -> MetadataView {
    let pick = |value: Option<&String>, default: &str| {
        value
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| default.to_owned())
    };
    MetadataView {
        title: pick(
            metadata.and_then(|m| m.title.as_ref()),
            DEFAULT_SITE_TITLE,
        ),
        description: pick(
            metadata.and_then(|m| m.description.as_ref()),
            DEFAULT_SITE_DESCRIPTION,
        ),
    }
}

pub fn render_summary_card(summary: &Summary) -> SummaryCard {
    let title = if summary.title.trim().is_empty() {
        "Video Summary".to_owned()
    } else {
        summary.title.clone()
    };
    let head = summary
        .summary
        .chars()
        .take(SUMMARY_PREVIEW_CHARS)
        .collect::<String>();
    SummaryCard {
        document_id: summary.document_id.clone(),
        href: format!("/dashboard/summaries/{}", summary.document_id),
        title,
        preview: format!("{head} [read more]"),
    }
}

/// Resolves a Strapi media path: data URIs and absolute URLs are kept,
/// relative paths are prefixed with the CMS origin.
pub fn media_url(base: &Url, url: Option<&str>) -> Option<String> {
    let url = url?;
    if url.starts_with("data:") || url.starts_with("http") || url.starts_with("//") {
        return Some(url.to_owned());
    }
    let base = base.as_str().trim_end_matches('/');
    Some(format!("{base}{url}"))
}

pub fn to_markdown(elements: &[RenderedElement]) -> Result<String, std::fmt::Error> {
    let mut out = String::new();
    for element in elements {
        match element {
            RenderedElement::Hero(hero) => {
                writeln!(out, "# {}\n", hero.heading)?;
                if !hero.sub_heading.is_empty() {
                    writeln!(out, "{}\n", hero.sub_heading)?;
                }
                if let Some(image) = &hero.image {
                    writeln!(out, "![{}]({})\n", image.alt, image.src)?;
                }
                if let Some(link) = &hero.link {
                    writeln!(out, "{}\n", link_markdown(link))?;
                }
            }
            RenderedElement::Features(features) => {
                if !features.title.is_empty() {
                    writeln!(out, "## {}\n", features.title)?;
                }
                if !features.description.is_empty() {
                    writeln!(out, "{}\n", features.description)?;
                }
                for item in &features.items {
                    let icon = match item.icon {
                        Some(FeatureIcon::ClockIcon) => "[clock] ",
                        Some(FeatureIcon::CheckIcon) => "[check] ",
                        Some(FeatureIcon::CloudIcon) => "[cloud] ",
                        Some(FeatureIcon::Unknown) | None => "",
                    };
                    writeln!(out, "- {icon}**{}**: {}", item.heading, item.sub_heading)?;
                }
                out.push('\n');
            }
        }
    }
    Ok(out)
}

fn link_markdown(link: &LinkView) -> String {
    match &link.target {
        LinkTarget::Internal(href) => format!("[{}]({href})", link.label),
        LinkTarget::External(href) => format!("[{}]({href}) (external)", link.label),
    }
}
