//! Blog statistics for the home page stats section and the `stats` command.

use crate::config::StatItem;
use crate::post::PostMetadata;
use crate::tag::all_tags;
use serde::Serialize;

const MIN_WORDS_PER_POST: usize = 500;
const MAX_WORDS_PER_POST: usize = 3000;
const WORDS_PER_EXCERPT_CHAR: usize = 20;
const WORDS_PER_MINUTE: usize = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogStats {
    pub total_posts: usize,
    pub total_tags: usize,

    /// An estimate; post bodies aren't counted, see [`estimated_words`].
    pub total_words: usize,

    /// Average reading time in whole minutes, rounded up.
    pub avg_read_time: usize,
}

/// Estimates a post's word count from its excerpt length, clamped to a
/// plausible range.
pub fn estimated_words(post: &PostMetadata) -> usize {
    (post.excerpt.chars().count() * WORDS_PER_EXCERPT_CHAR)
        .clamp(MIN_WORDS_PER_POST, MAX_WORDS_PER_POST)
}

pub fn calculate_blog_stats(posts: &[PostMetadata]) -> BlogStats {
    let total_words: usize = posts.iter().map(estimated_words).sum();
    let avg_read_time = match posts.len() {
        0 => 0,
        n => (total_words as f64 / n as f64 / WORDS_PER_MINUTE as f64).ceil() as usize,
    };
    BlogStats {
        total_posts: posts.len(),
        total_tags: all_tags(posts).len(),
        total_words,
        avg_read_time,
    }
}

/// Formats a count for display: `950` stays `950`, `1500` becomes `1.5k`.
pub fn format_number(n: usize) -> String {
    if n >= 1000 {
        format!("{:.1}k", n as f64 / 1000.0)
    } else {
        n.to_string()
    }
}

fn item(label: &str, value: String, description: &str) -> StatItem {
    StatItem {
        label: label.to_owned(),
        value,
        description: description.to_owned(),
    }
}

/// Returns the four display items shown in the stats section.
pub fn formatted_stats(posts: &[PostMetadata]) -> Vec<StatItem> {
    let stats = calculate_blog_stats(posts);
    vec![
        item(
            "Articles",
            format!("{}+", stats.total_posts),
            "Original technical writing",
        ),
        item("Tags", format!("{}+", stats.total_tags), "Topics covered"),
        item(
            "Words",
            format_number(stats.total_words),
            "In-depth write-ups",
        ),
        item(
            "Avg. read",
            format!("{}min", stats.avg_read_time),
            "Average reading time",
        ),
    ]
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::post::fixture;

    #[test]
    fn test_word_estimate_is_clamped() {
        let mut post = fixture("a", "2024-01-01", &[]);
        assert_eq!(500, estimated_words(&post));
        post.excerpt = "x".repeat(40);
        assert_eq!(800, estimated_words(&post));
        post.excerpt = "x".repeat(1000);
        assert_eq!(3000, estimated_words(&post));
    }

    #[test]
    fn test_calculate_blog_stats() {
        let mut posts = vec![
            fixture("a", "2024-03-01", &["Rust", "CLI"]),
            fixture("b", "2024-02-01", &["Rust"]),
        ];
        posts[1].excerpt = "x".repeat(100);
        let stats = calculate_blog_stats(&posts);
        assert_eq!(2, stats.total_posts);
        assert_eq!(2, stats.total_tags);
        assert_eq!(2500, stats.total_words);
        // 2500 words / 2 posts / 200 wpm = 6.25
        assert_eq!(7, stats.avg_read_time);
    }

    #[test]
    fn test_no_posts() {
        assert_eq!(BlogStats::default(), calculate_blog_stats(&[]));
    }

    #[test]
    fn test_format_number() {
        assert_eq!("999", format_number(999));
        assert_eq!("1.0k", format_number(1000));
        assert_eq!("1.5k", format_number(1500));
        assert_eq!("12.3k", format_number(12_340));
    }

    #[test]
    fn test_formatted_stats() {
        let items = formatted_stats(&[fixture("a", "2024-01-01", &["Rust"])]);
        let values: Vec<&str> = items.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(vec!["1+", "1+", "500", "3min"], values);
    }
}
