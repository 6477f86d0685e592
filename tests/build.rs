use chrono::{TimeZone, Utc};
use std::error::Error;
use std::fs::read_to_string;
use std::path::{Path, PathBuf};
use techblog::build::{build_site, BuildOptions, BuildReport};

type Result<T> = std::result::Result<T, Box<dyn Error>>;

fn fixture_site() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("testdata").join("site")
}

fn options(output_dir: &Path) -> Result<BuildOptions> {
    let mut options = BuildOptions::new(fixture_site());
    options.output_dir = output_dir.to_owned();
    options.now = Utc
        .with_ymd_and_hms(2024, 3, 19, 8, 30, 0)
        .single()
        .ok_or("invalid date")?;
    Ok(options)
}

#[test]
fn test_build_fixture_site() -> Result<()> {
    let out = tempfile::tempdir()?;
    let report = build_site(&options(out.path())?)?;

    // broken.mdx is skipped; `Rust` and `rust` share a tag page
    assert_eq!(
        BuildReport {
            posts: 3,
            tags: 4,
            pages: 14,
        },
        report
    );

    let home = read_to_string(out.path().join("index.html"))?;
    assert!(home.contains("Hi, I&#39;m Ferris"));
    assert!(home.contains("Ferris Writes | Notes on systems programming"));

    let post = read_to_string(out.path().join("posts/hello-rust/index.html"))?;
    assert!(post.contains("<title>Hello, Rust | Ferris Writes</title>"));
    assert!(post.contains("/posts/async-io/"));
    assert!(post.contains("<Callout>"));
    assert!(!post.contains("import Callout"));

    let newest = read_to_string(out.path().join("posts/async-io/index.html"))?;
    assert!(newest.contains(r#"href="/posts/hello-rust/""#));
    assert!(newest.contains("<table"));

    let rust = read_to_string(out.path().join("tags/rust/index.html"))?;
    assert!(rust.contains("Hello, Rust"));
    assert!(rust.contains("Async I/O without tears"));
    assert!(out.path().join("tags/c-plus-plus/index.html").is_file());

    for file in ["404.html", "style.css", "robots.txt", "images/logo.svg"] {
        assert!(out.path().join(file).is_file(), "missing {}", file);
    }
    Ok(())
}

#[test]
fn test_feed_sitemap_and_search_index() -> Result<()> {
    let out = tempfile::tempdir()?;
    build_site(&options(out.path())?)?;

    let feed = read_to_string(out.path().join("rss.xml"))?;
    assert_eq!(3, feed.matches("<item>").count());
    assert!(feed.contains("https://ferris.example.org/posts/async-io/"));

    let sitemap = read_to_string(out.path().join("sitemap.xml"))?;
    assert!(sitemap.contains("<loc>https://ferris.example.org/tags/c-plus-plus/</loc>"));
    assert!(sitemap.contains("<lastmod>2024-03-19</lastmod>"));

    let index: serde_json::Value =
        serde_json::from_str(&read_to_string(out.path().join("search.json"))?)?;
    let slugs: Vec<&str> = index["posts"]
        .as_array()
        .ok_or("posts is not an array")?
        .iter()
        .filter_map(|p| p["slug"].as_str())
        .collect();
    assert_eq!(vec!["async-io", "hello-rust", "cpp-notes"], slugs);
    Ok(())
}

#[test]
fn test_rebuild_removes_stale_pages() -> Result<()> {
    let out = tempfile::tempdir()?;
    let stale = out.path().join("posts").join("deleted-post");
    std::fs::create_dir_all(&stale)?;
    std::fs::write(stale.join("index.html"), "old")?;
    std::fs::write(out.path().join("keep.txt"), "mine")?;

    build_site(&options(out.path())?)?;
    assert!(!stale.exists());
    assert!(out.path().join("keep.txt").is_file());
    Ok(())
}

#[test]
fn test_theme_override() -> Result<()> {
    let out = tempfile::tempdir()?;
    let theme = tempfile::tempdir()?;
    std::fs::write(theme.path().join("not_found.html"), "<h1>Lost at sea</h1>")?;

    let mut options = options(out.path())?;
    options.theme_dir = Some(theme.path().to_owned());
    build_site(&options)?;

    let not_found = read_to_string(out.path().join("404.html"))?;
    assert!(not_found.contains("<h1>Lost at sea</h1>"));
    assert!(not_found.contains("<title>Page not found | Ferris Writes</title>"));
    Ok(())
}
