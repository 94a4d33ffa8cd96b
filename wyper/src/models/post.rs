use std::path::Path;

use chrono::{Local, Utc};
use log::warn;
use reqwest::Url;
use serde::{Deserialize, Serialize};

use crate::frontmatter::{self, FrontMatter};

pub const DEFAULT_COVER: &str = "/assets/default.jpg";
pub const DEFAULT_IMAGE_BASE: &str = "https://www.weavefox.cn/api/bolt/unsplash_image";
pub const UNTITLED: &str = "untitled";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub slug: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub cover: String,
    /// Markdown body, front matter stripped.
    #[serde(default)]
    pub content: String,
    /// The full document as the author wrote it.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub raw: String,
}

impl Post {
    /// Builds a normalized post from a full document.
    pub fn from_document(slug: String, raw: &str, image_base: &str) -> Self {
        let parsed = frontmatter::parse(raw);
        let front_matter = parsed.front_matter;
        let cover = resolve_cover(
            front_matter.cover.as_deref(),
            front_matter.first_tag(),
            image_base,
        );

        Self {
            slug,
            title: front_matter
                .title
                .filter(|title| !title.is_empty())
                .unwrap_or_else(|| UNTITLED.to_string()),
            date: front_matter.date.unwrap_or_else(today),
            tags: front_matter.tags.unwrap_or_default(),
            cover,
            content: parsed.body,
            raw: raw.to_string(),
        }
    }

    /// The editable document for this post, slug pinned in the front matter
    /// so publishing it again replaces the post instead of adding one.
    pub fn to_document(&self) -> String {
        let front_matter = FrontMatter {
            title: Some(self.title.clone()),
            date: Some(self.date.clone()),
            tags: Some(self.tags.clone()),
            cover: Some(self.cover.clone()),
            slug: Some(self.slug.clone()),
        };
        format!("{}\n\n{}", front_matter.to_block(), self.content)
    }
}

/// What the author hands over on save: the full document and maybe a slug.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostInput {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub content: String,
}

impl PostInput {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            slug: None,
            content: content.into(),
        }
    }

    pub fn with_slug(mut self, slug: impl Into<String>) -> Self {
        self.slug = Some(slug.into());
        self
    }

    /// Explicit slug first, then the front matter `slug`, then one derived
    /// from the title.
    pub fn resolve_slug(&self) -> String {
        if let Some(slug) = self.slug.as_deref().filter(|slug| !slug.is_empty()) {
            return slug.to_string();
        }

        let front_matter = frontmatter::parse(&self.content).front_matter;
        match front_matter.slug.filter(|slug| !slug.is_empty()) {
            Some(slug) => slug,
            None => slugify(
                front_matter.title.as_deref().unwrap_or(UNTITLED),
                Utc::now().timestamp_millis(),
            ),
        }
    }

    pub fn with_resolved_slug(self) -> Self {
        let slug = self.resolve_slug();
        self.with_slug(slug)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    Published(Post),
    /// The remote refused or was unreachable; only the local store has it.
    SavedLocally(Post),
}

impl SaveOutcome {
    pub fn post(&self) -> &Post {
        match self {
            SaveOutcome::Published(post) | SaveOutcome::SavedLocally(post) => post,
        }
    }

    pub fn into_post(self) -> Post {
        match self {
            SaveOutcome::Published(post) | SaveOutcome::SavedLocally(post) => post,
        }
    }

    pub fn is_local_only(&self) -> bool {
        matches!(self, SaveOutcome::SavedLocally(_))
    }
}

/// Absolute URLs pass through; local asset paths become a placeholder image
/// keyed by `keyword`, or by the file stem when there is no keyword.
pub fn resolve_cover(cover: Option<&str>, keyword: Option<&str>, image_base: &str) -> String {
    let cover = cover.filter(|c| !c.is_empty()).unwrap_or(DEFAULT_COVER);
    if cover.starts_with("http://") || cover.starts_with("https://") {
        return cover.to_string();
    }

    let key = keyword.filter(|k| !k.is_empty()).map_or_else(
        || {
            Path::new(cover)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| cover.to_string())
        },
        str::to_string,
    );

    match Url::parse_with_params(
        image_base,
        &[
            ("keyword", format!("{key},tech")),
            ("width", "800".to_string()),
            ("height", "450".to_string()),
            ("random", key.clone()),
        ],
    ) {
        Ok(url) => url.to_string(),
        Err(e) => {
            warn!("invalid placeholder image base {image_base:?}: {e}");
            cover.to_string()
        }
    }
}

/// `My First Post` at ms `1718000001234` becomes `my-first-post-1234`.
pub fn slugify(title: &str, stamp_ms: i64) -> String {
    let mut slug = String::with_capacity(title.len());
    for ch in title.to_lowercase().chars() {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() {
            slug.push(ch);
        } else if !slug.ends_with('-') {
            slug.push('-');
        }
    }
    let slug = slug.trim_matches('-');
    let base = if slug.is_empty() { "post" } else { slug };

    let stamp = stamp_ms.rem_euclid(10_000);
    format!("{base}-{stamp:04}")
}

pub fn today() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}
