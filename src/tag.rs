//! Defines the [`Tag`] type, which represents a [`crate::post::PostMetadata`]
//! tag, and the tag queries used by the listing pages.

use crate::post::PostMetadata;
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::hash::{Hash, Hasher};

/// Represents a tag page. Tags are compared ignoring case, so `Rust` and
/// `rust` resolve to the same page.
#[derive(Clone, Debug)]
pub struct Tag {
    /// The tag as written in the post's front matter.
    pub name: String,

    /// The URL-safe form of the name. This is what appears in the tag page's
    /// path.
    pub slug: String,
}

impl Tag {
    pub fn new(name: &str) -> Tag {
        Tag {
            name: name.to_owned(),
            slug: tag_slug(name),
        }
    }

    /// Returns the site path for the tag's page, e.g. `/tags/rust/`.
    pub fn path(&self) -> String {
        format!("/tags/{}/", self.slug)
    }
}

impl Hash for Tag {
    /// Implements [`Hash`] for [`Tag`] by delegating directly to the `slug`
    /// field.
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.slug.hash(state)
    }
}

impl PartialEq for Tag {
    /// Implements [`PartialEq`] and [`Eq`] for [`Tag`] by delegating directly
    /// to the `slug` field.
    fn eq(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}
impl Eq for Tag {}

/// Slugifies a tag name. `+` and `#` are spelled out so `C`, `C++` and `C#`
/// get distinct pages. Names made only of other symbols slugify to nothing,
/// so those fall back to the hex bytes of their lowercase form.
pub fn tag_slug(name: &str) -> String {
    let slug = slug::slugify(name.replace('+', " plus ").replace('#', " sharp "));
    if slug.is_empty() {
        name.to_lowercase()
            .bytes()
            .map(|b| format!("{:02x}", b))
            .collect()
    } else {
        slug
    }
}

/// Returns exactly the posts carrying `tag`, compared ignoring case. Input
/// order is preserved.
pub fn posts_by_tag(posts: &[PostMetadata], tag: &str) -> Vec<PostMetadata> {
    posts.iter().filter(|p| p.has_tag(tag)).cloned().collect()
}

/// Returns the union of all post tags, deduplicated and sorted
/// alphabetically.
pub fn all_tags(posts: &[PostMetadata]) -> Vec<String> {
    posts
        .iter()
        .flat_map(|p| p.tags.iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// A tag together with the number of posts carrying it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

/// Counts posts per tag, ignoring case: `Rust` and `rust` are one entry,
/// named by whichever spelling sorts first. The result is sorted by count,
/// most used first; ties stay in alphabetical order.
pub fn tag_counts(posts: &[PostMetadata]) -> Vec<TagCount> {
    let mut seen = HashSet::new();
    let mut counts: Vec<TagCount> = all_tags(posts)
        .into_iter()
        .filter(|tag| seen.insert(tag.to_lowercase()))
        .map(|tag| TagCount {
            count: posts.iter().filter(|p| p.has_tag(&tag)).count(),
            tag,
        })
        .collect();
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Returns one [`Tag`] per tag page, in alphabetical order. Tags whose
/// slugs coincide share a page.
pub fn tag_pages(posts: &[PostMetadata]) -> Vec<Tag> {
    let mut seen = HashSet::new();
    all_tags(posts)
        .iter()
        .map(|name| Tag::new(name))
        .filter(|tag| seen.insert(tag.slug.clone()))
        .collect()
}

/// Returns the posts listed on `tag`'s page: those carrying any tag with the
/// same slug. Input order is preserved.
pub fn posts_on_page(posts: &[PostMetadata], tag: &Tag) -> Vec<PostMetadata> {
    posts
        .iter()
        .filter(|p| p.tags.iter().any(|t| tag_slug(t) == tag.slug))
        .cloned()
        .collect()
}

/// Returns the `limit` most used tags.
pub fn popular_tags(posts: &[PostMetadata], limit: usize) -> Vec<TagCount> {
    let mut counts = tag_counts(posts);
    counts.truncate(limit);
    counts
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture;

    fn posts() -> Vec<PostMetadata> {
        vec![
            fixture("a", "2024-03-01", &["Rust", "cli"]),
            fixture("b", "2024-02-01", &["rust"]),
            fixture("c", "2024-01-01", &["Go", "CLI"]),
            fixture("d", "2023-12-01", &[]),
        ]
    }

    #[test]
    fn test_posts_by_tag_ignores_case() {
        let posts = posts();
        let slugs = |tag: &str| {
            posts_by_tag(&posts, tag)
                .into_iter()
                .map(|p| p.slug)
                .collect::<Vec<_>>()
        };
        assert_eq!(vec!["a", "b"], slugs("RUST"));
        assert_eq!(vec!["a", "c"], slugs("Cli"));
        assert!(slugs("python").is_empty());
    }

    #[test]
    fn test_all_tags_sorted_and_deduplicated() {
        let mut posts = posts();
        posts.push(fixture("e", "2023-11-01", &["Go"]));
        assert_eq!(vec!["CLI", "Go", "Rust", "cli", "rust"], all_tags(&posts));
    }

    #[test]
    fn test_tag_counts() {
        let counts = tag_counts(&posts());
        let names: Vec<&str> = counts.iter().map(|c| c.tag.as_str()).collect();
        assert_eq!(vec!["CLI", "Rust", "Go"], names);
        assert_eq!(
            TagCount {
                tag: "CLI".to_owned(),
                count: 2
            },
            counts[0]
        );
        assert_eq!(1, counts[2].count);
        assert_eq!(2, popular_tags(&posts(), 2).len());
    }

    #[test]
    fn test_tag_pages() {
        let mut posts = posts();
        posts.push(fixture("e", "2023-11-01", &["C++"]));
        posts.push(fixture("f", "2023-10-01", &["c"]));
        let slugs: Vec<String> = tag_pages(&posts).into_iter().map(|t| t.slug).collect();
        assert_eq!(vec!["c-plus-plus", "cli", "go", "rust", "c"], slugs);

        let rust = Tag::new("rust");
        let on_page: Vec<String> = posts_on_page(&posts, &rust)
            .into_iter()
            .map(|p| p.slug)
            .collect();
        assert_eq!(vec!["a", "b"], on_page);
    }

    #[test]
    fn test_tag_slug() {
        assert_eq!("machine-learning", tag_slug("Machine Learning"));
        assert_eq!("rust", Tag::new("Rust").slug);
        assert_eq!("c-sharp", tag_slug("C#"));
        assert_eq!("2121", tag_slug("!!"));
        assert_eq!("/tags/next-js/", Tag::new("Next.js").path());
        assert_eq!(Tag::new("RUST"), Tag::new("rust"));
    }
}
