//! Sitemap generation (`sitemap.xml`): the static pages, every post, and
//! every tag page.

use crate::config::SiteConfig;
use crate::post::PostMetadata;
use crate::tag::{all_tags, Tag};
use chrono::NaiveDate;
use std::collections::HashSet;

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// The static pages listed in the sitemap. The home page is listed first and
/// gets a higher priority.
pub const STATIC_PAGES: [&str; 5] = ["/", "/posts/", "/tags/", "/search/", "/about/"];

/// A single `<url>` entry.
#[derive(Debug, PartialEq)]
pub struct UrlEntry {
    pub loc: String,
    pub lastmod: Option<String>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

#[derive(Debug, Default)]
pub struct Sitemap {
    pub urls: Vec<UrlEntry>,
}

impl Sitemap {
    /// Lists the site's pages. Static and tag pages are stamped with `today`;
    /// posts with their publish date.
    pub fn new(config: &SiteConfig, posts: &[PostMetadata], today: NaiveDate) -> Sitemap {
        let today = today.format("%Y-%m-%d").to_string();
        let mut urls = Vec::new();

        for path in STATIC_PAGES {
            let home = path == "/";
            urls.push(UrlEntry {
                loc: config.absolute_url(path),
                lastmod: Some(today.clone()),
                changefreq: if home { "daily" } else { "weekly" },
                priority: if home { "1.0" } else { "0.8" },
            });
        }

        for post in posts {
            urls.push(UrlEntry {
                loc: config.absolute_url(&post.path()),
                lastmod: post.published().map(|d| d.format("%Y-%m-%d").to_string()),
                changefreq: "monthly",
                priority: "0.9",
            });
        }

        // Tags differing only in case share a page.
        let mut seen = HashSet::new();
        for tag in all_tags(posts).iter().map(|t| Tag::new(t)) {
            if seen.insert(tag.slug.clone()) {
                urls.push(UrlEntry {
                    loc: config.absolute_url(&tag.path()),
                    lastmod: Some(today.clone()),
                    changefreq: "weekly",
                    priority: "0.7",
                });
            }
        }

        Sitemap { urls }
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::with_capacity(256 + self.urls.len() * 160);

        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8"?>"#);
        xml.push('\n');
        xml.push_str(&format!(r#"<urlset xmlns="{}">"#, SITEMAP_NS));
        xml.push('\n');

        for entry in &self.urls {
            xml.push_str("  <url>\n");
            xml.push_str(&format!("    <loc>{}</loc>\n", escape_xml(&entry.loc)));
            if let Some(lastmod) = &entry.lastmod {
                xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
            }
            xml.push_str(&format!("    <changefreq>{}</changefreq>\n", entry.changefreq));
            xml.push_str(&format!("    <priority>{}</priority>\n", entry.priority));
            xml.push_str("  </url>\n");
        }

        xml.push_str("</urlset>\n");
        xml
    }
}

/// Escapes special XML characters.
pub fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::config::fallback_config;
    use crate::post::fixture;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 19).unwrap()
    }

    fn config() -> SiteConfig {
        let mut config = fallback_config();
        config.site.url = "https://ferris.example.org".to_owned();
        config
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!("a &amp; b", escape_xml("a & b"));
        assert_eq!("&lt;x y=&quot;z&quot;&gt;", escape_xml(r#"<x y="z">"#));
        assert_eq!("it&apos;s", escape_xml("it's"));
    }

    #[test]
    fn test_entries() {
        let posts = vec![
            fixture("hello", "2024-01-15", &["Rust", "rust", "Go"]),
            fixture("undated", "someday", &[]),
        ];
        let sitemap = Sitemap::new(&config(), &posts, today());

        // 5 static pages, 2 posts, 2 distinct tag pages
        assert_eq!(9, sitemap.urls.len());
        assert_eq!(
            UrlEntry {
                loc: "https://ferris.example.org/".to_owned(),
                lastmod: Some("2024-03-19".to_owned()),
                changefreq: "daily",
                priority: "1.0",
            },
            sitemap.urls[0]
        );
        assert_eq!("0.8", sitemap.urls[1].priority);
        assert_eq!("https://ferris.example.org/posts/hello/", sitemap.urls[5].loc);
        assert_eq!(Some("2024-01-15".to_owned()), sitemap.urls[5].lastmod);
        assert_eq!(None, sitemap.urls[6].lastmod);
        assert_eq!("https://ferris.example.org/tags/go/", sitemap.urls[7].loc);
        assert_eq!("https://ferris.example.org/tags/rust/", sitemap.urls[8].loc);
    }

    #[test]
    fn test_xml_structure() {
        let xml = Sitemap::new(&config(), &[], today()).to_xml();
        let lines: Vec<&str> = xml.lines().collect();
        assert_eq!(r#"<?xml version="1.0" encoding="UTF-8"?>"#, lines[0]);
        assert!(lines[1].starts_with("<urlset"));
        assert_eq!(Some(&"</urlset>"), lines.last());
        assert_eq!(5, xml.matches("<url>").count());
        assert!(xml.contains("<loc>https://ferris.example.org/search/</loc>"));
        assert!(xml.contains("<changefreq>weekly</changefreq>"));
    }
}
