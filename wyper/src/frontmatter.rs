//! Front matter parsing for Markdown documents.
//!
//! A document may start with a metadata block:
//!
//! ```text
//! ---
//! title: "Hello"
//! date: 2024-06-11
//! tags: ["meta", "welcome"]
//! ---
//!
//! # Body
//! ```
//!
//! Every part of the crate that needs metadata or a stripped body goes through
//! [`parse`], so the store, the publish path and the editor preview can never
//! disagree about what a document contains.

use std::sync::LazyLock;

use log::debug;
use regex::Regex;

static FRONT_MATTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^---[ \t]*\r?\n(?:([\s\S]*?)\r?\n)?[ \t]*---[ \t]*(?:\r?\n|$)")
        .expect("front matter pattern is valid")
});

/// A raw metadata value as written in the block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetaValue {
    Scalar(String),
    List(Vec<String>),
}

impl MetaValue {
    fn into_scalar(self) -> String {
        match self {
            MetaValue::Scalar(value) => value,
            MetaValue::List(items) => items.join(", "),
        }
    }

    fn into_list(self) -> Vec<String> {
        match self {
            MetaValue::List(items) => items,
            MetaValue::Scalar(value) => split_list(&value),
        }
    }
}

/// The metadata keys wyper understands. Anything else in the block is dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub date: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover: Option<String>,
    pub slug: Option<String>,
}

impl FrontMatter {
    pub fn is_empty(&self) -> bool {
        *self == FrontMatter::default()
    }

    pub fn first_tag(&self) -> Option<&str> {
        self.tags
            .as_ref()
            .and_then(|tags| tags.first())
            .map(String::as_str)
    }

    fn set(&mut self, key: &str, value: MetaValue) {
        match key {
            "title" => self.title = Some(value.into_scalar()),
            "date" => self.date = Some(value.into_scalar()),
            "tags" => self.tags = Some(value.into_list()),
            "cover" => self.cover = Some(value.into_scalar()),
            "slug" => self.slug = Some(value.into_scalar()),
            other => debug!("ignoring unknown front matter key {other:?}"),
        }
    }

    /// Renders the block in the canonical layout, closing delimiter included.
    pub fn to_block(&self) -> String {
        let mut lines = vec!["---".to_string()];
        if let Some(title) = &self.title {
            lines.push(format!("title: \"{title}\""));
        }
        if let Some(date) = &self.date {
            lines.push(format!("date: {date}"));
        }
        if let Some(tags) = &self.tags {
            let quoted: Vec<String> = tags.iter().map(|tag| format!("\"{tag}\"")).collect();
            lines.push(format!("tags: [{}]", quoted.join(", ")));
        }
        if let Some(cover) = &self.cover {
            lines.push(format!("cover: \"{cover}\""));
        }
        if let Some(slug) = &self.slug {
            lines.push(format!("slug: \"{slug}\""));
        }
        lines.push("---".to_string());
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed {
    pub front_matter: FrontMatter,
    pub body: String,
}

pub fn parse(document: &str) -> Parsed {
    let Some(captures) = FRONT_MATTER.captures(document) else {
        return Parsed {
            front_matter: FrontMatter::default(),
            body: document.trim().to_string(),
        };
    };

    let mut front_matter = FrontMatter::default();
    if let Some(block) = captures.get(1) {
        for (key, value) in block.as_str().lines().filter_map(parse_line) {
            front_matter.set(&key, value);
        }
    }

    let matched = captures.get(0).map_or(0, |m| m.end());
    Parsed {
        front_matter,
        body: document[matched..].trim().to_string(),
    }
}

pub fn remove_front_matter(document: &str) -> String {
    parse(document).body
}

/// Splits one `key: value` line. Lines without a colon or key are skipped.
pub fn parse_line(line: &str) -> Option<(String, MetaValue)> {
    let (key, value) = line.split_once(':')?;
    let key = key.trim();
    if key.is_empty() {
        return None;
    }

    let value = strip_quotes(value.trim());
    let value = match value
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
    {
        Some(inner) => MetaValue::List(split_list(inner)),
        None => MetaValue::Scalar(value.to_string()),
    };

    Some((key.to_string(), value))
}

fn split_list(inner: &str) -> Vec<String> {
    inner
        .split(',')
        .map(|item| strip_quotes(item.trim()).to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn strip_quotes(value: &str) -> &str {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        &value[1..value.len() - 1]
    } else {
        value
    }
}
