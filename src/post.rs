//! Defines the [`Post`] and [`PostMetadata`] types along with the front matter
//! defaults and the date ordering that every listing on the site relies on.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::cmp::Ordering;
use tracing::warn;

/// The number of posts returned by [`recent_posts`] when the caller doesn't
/// care.
pub const DEFAULT_RECENT_LIMIT: usize = 6;

const DEFAULT_TITLE: &str = "Untitled";
const DEFAULT_READ_TIME: u32 = 5;
const DEFAULT_AUTHOR: &str = "TechBlog";

/// The metadata for a single post. Everything the listing pages, feeds, and
/// search need lives here; the body is kept separately on [`Post`].
#[derive(Clone, Debug, PartialEq)]
pub struct PostMetadata {
    /// The file name of the source file less the `.mdx` extension.
    pub slug: String,
    pub title: String,
    pub excerpt: String,

    /// The publish date as written in the front matter (typically
    /// `YYYY-MM-DD`). See [`PostMetadata::published`] for the parsed form.
    pub publish_date: String,

    /// The estimated reading time in minutes.
    pub read_time: u32,
    pub tags: Vec<String>,
    pub featured: bool,
    pub author: String,
    pub image: Option<String>,
}

/// A post: its metadata plus the raw MDX body.
#[derive(Clone, Debug, PartialEq)]
pub struct Post {
    pub meta: PostMetadata,
    pub content: String,
}

/// The front matter block as it appears on disk. Every field is optional;
/// [`Frontmatter::into_metadata`] applies the defaults.
///
/// Fields are read leniently: scalars of the wrong type are coerced where the
/// meaning is clear (`title: 2024`, `readTime: 7.5`, `tags: rust`) and
/// dropped with a warning otherwise, so one odd value never costs a post.
#[derive(Deserialize, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Frontmatter {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub excerpt: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_minutes")]
    pub read_time: Option<u32>,
    #[serde(default, deserialize_with = "lenient_tags")]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_flag")]
    pub featured: Option<bool>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub author: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub image: Option<String>,
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn ignored<T>(value: &Value) -> Option<T> {
    if !matches!(value, Value::Null) {
        warn!(?value, "Ignoring front matter value of unexpected type");
    }
    None
}

fn lenient_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(scalar_text(&value).or_else(|| ignored(&value)))
}

fn lenient_minutes<'de, D: Deserializer<'de>>(d: D) -> Result<Option<u32>, D::Error> {
    let value = Value::deserialize(d)?;
    let minutes = match &value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(match minutes {
        Some(m) if m.is_finite() && m >= 0.0 => Some(m.round() as u32),
        _ => ignored(&value),
    })
}

fn lenient_tags<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Vec<String>>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match &value {
        Value::Sequence(items) => Some(items.iter().filter_map(scalar_text).collect()),
        Value::String(s) => Some(
            s.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_owned)
                .collect(),
        ),
        other => scalar_text(other)
            .map(|t| vec![t])
            .or_else(|| ignored(other)),
    })
}

fn lenient_flag<'de, D: Deserializer<'de>>(d: D) -> Result<Option<bool>, D::Error> {
    let value = Value::deserialize(d)?;
    Ok(match &value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" => Some(true),
            "false" | "no" => Some(false),
            _ => ignored(&value),
        },
        _ => ignored(&value),
    })
}

impl Frontmatter {
    /// Converts the front matter into [`PostMetadata`], filling in defaults
    /// for missing fields. `today` stands in for a missing publish date.
    pub fn into_metadata(self, slug: &str, today: NaiveDate) -> PostMetadata {
        PostMetadata {
            slug: slug.to_owned(),
            title: non_empty(self.title).unwrap_or_else(|| DEFAULT_TITLE.to_owned()),
            excerpt: self.excerpt.unwrap_or_default(),
            publish_date: non_empty(self.publish_date)
                .unwrap_or_else(|| today.format("%Y-%m-%d").to_string()),
            read_time: match self.read_time {
                Some(0) | None => DEFAULT_READ_TIME,
                Some(minutes) => minutes,
            },
            tags: self.tags.unwrap_or_default(),
            featured: self.featured.unwrap_or(false),
            author: non_empty(self.author).unwrap_or_else(|| DEFAULT_AUTHOR.to_owned()),
            image: self.image,
        }
    }
}

// Empty strings count as missing, same as absent keys.
fn non_empty(s: Option<String>) -> Option<String> {
    s.filter(|s| !s.trim().is_empty())
}

impl PostMetadata {
    /// Parses the publish date. Accepts `YYYY-MM-DD` and RFC 3339 timestamps;
    /// anything else yields `None`.
    pub fn published(&self) -> Option<NaiveDate> {
        let date = self.publish_date.trim();
        NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .ok()
            .or_else(|| {
                DateTime::parse_from_rfc3339(date)
                    .ok()
                    .map(|dt| dt.naive_utc().date())
            })
    }

    /// Returns the site path of the post page, e.g. `/posts/hello-world/`.
    pub fn path(&self) -> String {
        format!("/posts/{}/", self.slug)
    }

    /// Returns `true` if any of the post's tags equals `tag` ignoring case.
    pub fn has_tag(&self, tag: &str) -> bool {
        let tag = tag.to_lowercase();
        self.tags.iter().any(|t| t.to_lowercase() == tag)
    }
}

/// Compares two posts so that the most recent comes first. Posts whose date
/// can't be parsed sort after every dated post.
pub fn by_date_desc(a: &PostMetadata, b: &PostMetadata) -> Ordering {
    match (a.published(), b.published()) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Sorts posts by publish date, most recent first. The sort is stable so
/// posts sharing a date keep their relative order.
pub fn sort_by_date(posts: &mut [PostMetadata]) {
    posts.sort_by(by_date_desc);
}

/// Returns the featured posts, preserving order.
pub fn featured_posts(posts: &[PostMetadata]) -> Vec<PostMetadata> {
    posts.iter().filter(|p| p.featured).cloned().collect()
}

/// Returns the first `limit` posts. `posts` is expected to already be sorted
/// by date.
pub fn recent_posts(posts: &[PostMetadata], limit: usize) -> Vec<PostMetadata> {
    posts.iter().take(limit).cloned().collect()
}

#[cfg(test)]
pub(crate) fn fixture(slug: &str, date: &str, tags: &[&str]) -> PostMetadata {
    PostMetadata {
        slug: slug.to_owned(),
        title: slug.to_owned(),
        excerpt: String::new(),
        publish_date: date.to_owned(),
        read_time: DEFAULT_READ_TIME,
        tags: tags.iter().map(|t| t.to_string()).collect(),
        featured: false,
        author: DEFAULT_AUTHOR.to_owned(),
        image: None,
    }
}
