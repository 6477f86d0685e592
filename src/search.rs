//! In-memory search over an already-loaded post list. The static search page
//! runs the same filtering in the browser against `search.json`, which
//! [`SearchIndex`] produces.

use crate::post::{by_date_desc, PostMetadata};
use crate::tag::{popular_tags as top_tags, TagCount};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// The number of tags offered in the search page's filter panel.
pub const FILTER_TAG_LIMIT: usize = 20;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum SortBy {
    /// Most recent first.
    #[default]
    Date,

    /// Alphabetical, ignoring case.
    Title,

    /// Shortest read first.
    ReadTime,
}

impl SortBy {
    pub const NAMES: [&'static str; 3] = ["date", "title", "read-time"];
}

impl FromStr for SortBy {
    type Err = String;

    fn from_str(s: &str) -> Result<SortBy, String> {
        match s {
            "date" => Ok(SortBy::Date),
            "title" => Ok(SortBy::Title),
            "read-time" | "readTime" => Ok(SortBy::ReadTime),
            _ => Err(format!(
                "Unknown sort order `{}`; expected one of {}",
                s,
                SortBy::NAMES.join(", ")
            )),
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            SortBy::Date => "date",
            SortBy::Title => "title",
            SortBy::ReadTime => "read-time",
        })
    }
}

#[derive(Clone, Debug, Default)]
pub struct SearchQuery {
    /// Free text matched against titles, excerpts, and tags. Blank text
    /// matches every post.
    pub text: String,

    /// Tags that must all be present on a post.
    pub tags: Vec<String>,
    pub sort: SortBy,
}

impl SearchQuery {
    fn matches_text(&self, post: &PostMetadata) -> bool {
        if self.text.trim().is_empty() {
            return true;
        }
        let needle = self.text.to_lowercase();
        post.title.to_lowercase().contains(&needle)
            || post.excerpt.to_lowercase().contains(&needle)
            || post.tags.iter().any(|t| t.to_lowercase().contains(&needle))
    }

    fn matches_tags(&self, post: &PostMetadata) -> bool {
        self.tags.iter().all(|tag| post.has_tag(tag))
    }

    pub fn matches(&self, post: &PostMetadata) -> bool {
        self.matches_text(post) && self.matches_tags(post)
    }
}

/// Filters and sorts `posts` according to `query`. The sort is stable.
pub fn search(posts: &[PostMetadata], query: &SearchQuery) -> Vec<PostMetadata> {
    let mut results: Vec<PostMetadata> = posts
        .iter()
        .filter(|p| query.matches(p))
        .cloned()
        .collect();
    match query.sort {
        SortBy::Date => results.sort_by(by_date_desc),
        SortBy::Title => results.sort_by_key(|p| p.title.to_lowercase()),
        SortBy::ReadTime => results.sort_by_key(|p| p.read_time),
    }
    results
}

/// The tags offered as filters, most used first.
pub fn popular_tags(posts: &[PostMetadata]) -> Vec<TagCount> {
    top_tags(posts, FILTER_TAG_LIMIT)
}

/// One post as it appears in `search.json`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchEntry<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub excerpt: &'a str,
    pub publish_date: &'a str,
    pub read_time: u32,
    pub tags: &'a [String],
    pub url: String,
}

/// The document behind the static search page.
#[derive(Debug, Serialize)]
pub struct SearchIndex<'a> {
    pub posts: Vec<SearchEntry<'a>>,
    pub tags: Vec<TagCount>,
}

impl<'a> SearchIndex<'a> {
    pub fn new(posts: &'a [PostMetadata]) -> SearchIndex<'a> {
        SearchIndex {
            posts: posts
                .iter()
                .map(|p| SearchEntry {
                    slug: &p.slug,
                    title: &p.title,
                    excerpt: &p.excerpt,
                    publish_date: &p.publish_date,
                    read_time: p.read_time,
                    tags: &p.tags,
                    url: p.path(),
                })
                .collect(),
            tags: popular_tags(posts),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture;

    fn posts() -> Vec<PostMetadata> {
        let mut posts = vec![
            fixture("async-rust", "2024-03-01", &["Rust", "Async"]),
            fixture("go-channels", "2024-02-01", &["Go", "Concurrency"]),
            fixture("borrowck", "2023-12-01", &["rust"]),
        ];
        posts[0].title = "Async Rust in Practice".to_owned();
        posts[0].read_time = 12;
        posts[1].title = "Go Channels".to_owned();
        posts[1].excerpt = "Comparing channels with Rust's mpsc".to_owned();
        posts[1].read_time = 4;
        posts[2].title = "borrow checker tips".to_owned();
        posts[2].read_time = 7;
        posts
    }

    fn slugs(posts: &[PostMetadata]) -> Vec<&str> {
        posts.iter().map(|p| p.slug.as_str()).collect()
    }

    #[test]
    fn test_blank_text_matches_everything() {
        let query = SearchQuery {
            text: "   ".to_owned(),
            ..SearchQuery::default()
        };
        assert_eq!(3, search(&posts(), &query).len());
    }

    #[test]
    fn test_text_matches_title_excerpt_and_tags() {
        let query = SearchQuery {
            text: "RUST".to_owned(),
            ..SearchQuery::default()
        };
        assert_eq!(
            vec!["async-rust", "go-channels", "borrowck"],
            slugs(&search(&posts(), &query))
        );

        let query = SearchQuery {
            text: "concur".to_owned(),
            ..SearchQuery::default()
        };
        assert_eq!(vec!["go-channels"], slugs(&search(&posts(), &query)));
    }

    #[test]
    fn test_every_selected_tag_required() {
        let query = SearchQuery {
            tags: vec!["rust".to_owned(), "ASYNC".to_owned()],
            ..SearchQuery::default()
        };
        assert_eq!(vec!["async-rust"], slugs(&search(&posts(), &query)));
    }

    #[test]
    fn test_sort_orders() {
        let mut query = SearchQuery {
            sort: SortBy::Title,
            ..SearchQuery::default()
        };
        assert_eq!(
            vec!["async-rust", "borrowck", "go-channels"],
            slugs(&search(&posts(), &query))
        );
        query.sort = SortBy::ReadTime;
        assert_eq!(
            vec!["go-channels", "borrowck", "async-rust"],
            slugs(&search(&posts(), &query))
        );
    }

    #[test]
    fn test_sort_by_from_str() {
        assert_eq!(Ok(SortBy::ReadTime), "read-time".parse());
        assert_eq!(Ok(SortBy::Date), "date".parse());
        assert!("newest".parse::<SortBy>().is_err());
    }

    #[test]
    fn test_search_index_json() -> serde_json::Result<()> {
        let posts = posts();
        let json: serde_json::Value = serde_json::from_str(&SearchIndex::new(&posts).to_json()?)?;
        assert_eq!("/posts/async-rust/", json["posts"][0]["url"]);
        assert_eq!(12, json["posts"][0]["readTime"]);
        assert_eq!("2024-03-01", json["posts"][0]["publishDate"]);
        assert_eq!(2, json["tags"][0]["count"]);
        Ok(())
    }
}
