//! Exports the [`build_site`] function which stitches together the high-level
//! steps of building the output static site: loading the configuration
//! ([`crate::config`]), parsing the posts ([`crate::parser`]), rendering every
//! page ([`crate::page`], [`crate::write`]), copying the public assets, and
//! generating `rss.xml`, `sitemap.xml`, and `search.json`.

use crate::config::{load_config, SiteConfig};
use crate::feed::{validated_feed, Error as FeedError};
use crate::markdown::{self, Error as MarkdownError};
use crate::page::{Page, Pages};
use crate::parser::Parser;
use crate::post::PostMetadata;
use crate::search::SearchIndex;
use crate::sitemap::Sitemap;
use crate::tag::tag_pages;
use crate::theme::{Error as ThemeError, Theme, STYLE_FILE_NAME};
use crate::write::{Error as WriteError, Writer};
use chrono::{DateTime, Utc};
use std::fmt;
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Where posts live, relative to the project directory.
pub const POSTS_DIRECTORY: &str = "content/posts";

/// Static assets copied verbatim to the output root.
pub const PUBLIC_DIRECTORY: &str = "public";

pub const FEED_FILE_NAME: &str = "rss.xml";
pub const SITEMAP_FILE_NAME: &str = "sitemap.xml";
pub const SEARCH_INDEX_FILE_NAME: &str = "search.json";

// Everything a build writes besides public assets. Removed before each build
// so deleted posts and tags don't linger.
const GENERATED_DIRECTORIES: [&str; 5] = ["posts", "tags", "search", "about", "subscribe"];
const GENERATED_FILES: [&str; 6] = [
    "index.html",
    "404.html",
    STYLE_FILE_NAME,
    FEED_FILE_NAME,
    SITEMAP_FILE_NAME,
    SEARCH_INDEX_FILE_NAME,
];

/// The inputs of a build.
#[derive(Clone, Debug)]
pub struct BuildOptions {
    /// The project root holding `config.yaml`, `content/posts/`, and
    /// `public/`.
    pub project_dir: PathBuf,

    /// The directory the site is written to.
    pub output_dir: PathBuf,

    /// A directory of template overrides; see [`crate::theme`].
    pub theme_dir: Option<PathBuf>,

    /// The build time. Stamped on the feed and the sitemap, and the date
    /// given to posts without one.
    pub now: DateTime<Utc>,
}

impl BuildOptions {
    /// Options for building `project_dir` into `<project_dir>/out` now, with
    /// the built-in theme.
    pub fn new(project_dir: impl Into<PathBuf>) -> BuildOptions {
        let project_dir = project_dir.into();
        BuildOptions {
            output_dir: project_dir.join("out"),
            project_dir,
            theme_dir: None,
            now: Utc::now(),
        }
    }
}

/// A summary of a finished build.
#[derive(Debug, Default, PartialEq)]
pub struct BuildReport {
    pub posts: usize,
    pub tags: usize,
    pub pages: usize,
}

/// Builds the site described by `options`.
pub fn build_site(options: &BuildOptions) -> Result<BuildReport> {
    let config = load_config(&options.project_dir);
    let theme = Theme::load(options.theme_dir.as_deref())?;

    let today = options.now.date_naive();
    let posts_directory = options.project_dir.join(POSTS_DIRECTORY);
    let posts = Parser::with_today(&posts_directory, today).parse_posts();
    info!(count = posts.len(), "Loaded posts");

    let mut metadata = Vec::with_capacity(posts.len());
    let mut bodies = Vec::with_capacity(posts.len());
    for post in posts {
        bodies.push(markdown::to_html(&post.content)?);
        metadata.push(post.meta);
    }

    for dir in GENERATED_DIRECTORIES {
        rmdir(&options.output_dir.join(dir))?;
    }
    for file in GENERATED_FILES {
        rmfile(&options.output_dir.join(file))?;
    }
    std::fs::create_dir_all(&options.output_dir)?;

    let pages = Pages {
        config: &config,
        posts: &metadata,
    };
    let mut rendered: Vec<Page> = vec![
        pages.home()?,
        pages.posts()?,
        pages.tags()?,
        pages.search()?,
        pages.about()?,
        pages.subscribe()?,
        pages.not_found()?,
    ];
    for (i, body) in bodies.iter().enumerate() {
        rendered.push(pages.post(i, body)?);
    }
    let tags = tag_pages(&metadata);
    for tag in &tags {
        rendered.push(pages.tag(tag)?);
    }

    Writer {
        theme: &theme,
        config: &config,
        output_directory: &options.output_dir,
    }
    .write_pages(&rendered)?;
    info!(count = rendered.len(), "Wrote pages");

    let public = options.project_dir.join(PUBLIC_DIRECTORY);
    if public.is_dir() {
        copy_dir(&public, &options.output_dir)?;
    }
    std::fs::write(options.output_dir.join(STYLE_FILE_NAME), &theme.style)?;

    write_extras(&config, &metadata, options)?;

    Ok(BuildReport {
        posts: metadata.len(),
        tags: tags.len(),
        pages: rendered.len(),
    })
}

// The machine-readable outputs, each behind its feature flag.
fn write_extras(config: &SiteConfig, posts: &[PostMetadata], options: &BuildOptions) -> Result<()> {
    let features = config.features();
    if features.rss {
        // An invalid feed (e.g. a site URL without a scheme) is left out
        // rather than failing the rest of the build.
        match validated_feed(config, posts, options.now) {
            Ok(channel) => {
                let file = File::create(options.output_dir.join(FEED_FILE_NAME))?;
                channel
                    .write_to(BufWriter::new(file))
                    .map_err(FeedError::from)?;
                info!("Wrote {}", FEED_FILE_NAME);
            }
            Err(err) => warn!(error = %err, "Skipping {}", FEED_FILE_NAME),
        }
    }
    if features.sitemap {
        let sitemap = Sitemap::new(config, posts, options.now.date_naive());
        std::fs::write(options.output_dir.join(SITEMAP_FILE_NAME), sitemap.to_xml())?;
        info!("Wrote {}", SITEMAP_FILE_NAME);
    }
    if features.search {
        let index = SearchIndex::new(posts).to_json()?;
        std::fs::write(options.output_dir.join(SEARCH_INDEX_FILE_NAME), index)?;
        info!("Wrote {}", SEARCH_INDEX_FILE_NAME);
    }
    Ok(())
}

fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    for entry in WalkDir::new(src).min_depth(1) {
        let entry = entry.map_err(|err| Error::Copy(err.to_string()))?;
        let relative = entry
            .path()
            .strip_prefix(src)
            .map_err(|err| Error::Copy(err.to_string()))?;
        let target = dst.join(relative);
        if entry.file_type().is_dir() {
            std::fs::create_dir_all(&target)?;
        } else {
            std::fs::copy(entry.path(), &target)?;
            debug!(path = %target.display(), "Copied asset");
        }
    }
    Ok(())
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for building a site. Errors can be during rendering,
/// writing, cleaning output directories, loading the theme, and other I/O.
#[derive(Debug)]
pub enum Error {
    /// Returned for errors rendering post bodies.
    Markdown(MarkdownError),

    /// Returned for errors loading the theme.
    Theme(ThemeError),

    /// Returned for errors templating or writing pages.
    Write(WriteError),

    /// Returned for errors building a page context or `search.json`.
    Serialize(serde_json::Error),

    /// Returned for I/O problems while cleaning output directories.
    Clean { path: PathBuf, err: std::io::Error },

    /// Returned for problems walking the public directory.
    Copy(String),

    /// Returned for errors writing the feed.
    Feed(FeedError),

    /// Returned for other I/O errors.
    Io(std::io::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Markdown(err) => write!(f, "Rendering post: {}", err),
            Error::Theme(err) => err.fmt(f),
            Error::Write(err) => err.fmt(f),
            Error::Serialize(err) => err.fmt(f),
            Error::Clean { path, err } => {
                write!(f, "Cleaning '{}': {}", path.display(), err)
            }
            Error::Copy(err) => write!(f, "Copying public assets: {}", err),
            Error::Feed(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Markdown(err) => Some(err),
            Error::Theme(err) => Some(err),
            Error::Write(err) => Some(err),
            Error::Serialize(err) => Some(err),
            Error::Clean { path: _, err } => Some(err),
            Error::Copy(_) => None,
            Error::Feed(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for Error {
    /// Converts [`std::io::Error`]s into [`Error`]. This allows us to use the
    /// `?` operator.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<MarkdownError> for Error {
    fn from(err: MarkdownError) -> Error {
        Error::Markdown(err)
    }
}

impl From<ThemeError> for Error {
    fn from(err: ThemeError) -> Error {
        Error::Theme(err)
    }
}

impl From<WriteError> for Error {
    /// Converts [`WriteError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: WriteError) -> Error {
        Error::Write(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Serialize(err)
    }
}

impl From<FeedError> for Error {
    /// Converts [`FeedError`]s into [`Error`]. This allows us to use the `?`
    /// operator.
    fn from(err: FeedError) -> Error {
        Error::Feed(err)
    }
}

fn rmdir(dir: &Path) -> Result<()> {
    match std::fs::remove_dir_all(dir) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: dir.to_owned(),
                err: e,
            }),
        },
    }
}

fn rmfile(file: &Path) -> Result<()> {
    match std::fs::remove_file(file) {
        Ok(x) => Ok(x),
        Err(e) => match e.kind() {
            std::io::ErrorKind::NotFound => Ok(()),
            _ => Err(Error::Clean {
                path: file.to_owned(),
                err: e,
            }),
        },
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_rm_missing_is_ok() -> Result<()> {
        let dir = tempfile::tempdir()?;
        rmdir(&dir.path().join("nope"))?;
        rmfile(&dir.path().join("nope.html"))?;
        Ok(())
    }

    #[test]
    fn test_copy_dir_nested() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let src = tempfile::tempdir()?;
        let dst = tempfile::tempdir()?;
        std::fs::create_dir_all(src.path().join("images/icons"))?;
        std::fs::write(src.path().join("favicon.ico"), "ico")?;
        std::fs::write(src.path().join("images/icons/rss.svg"), "<svg/>")?;
        copy_dir(src.path(), dst.path())?;
        assert_eq!("ico", std::fs::read_to_string(dst.path().join("favicon.ico"))?);
        assert_eq!(
            "<svg/>",
            std::fs::read_to_string(dst.path().join("images/icons/rss.svg"))?
        );
        Ok(())
    }

    #[test]
    fn test_invalid_feed_is_skipped() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let project = tempfile::tempdir()?;
        std::fs::write(
            project.path().join(crate::config::CONFIG_FILE_NAME),
            "site:\n  name: Crab Notes\n  title: Crab Notes\n  description: Notes\n  url: blog.example.org\n\
             author:\n  name: Ferris\n  email: ferris@example.org\n\
             navigation:\n  - { name: Home, href: / }\n",
        )?;
        let mut options = BuildOptions::new(project.path());
        options.output_dir = project.path().join("site");
        build_site(&options)?;
        assert!(!options.output_dir.join(FEED_FILE_NAME).exists());
        assert!(options.output_dir.join(SITEMAP_FILE_NAME).is_file());
        assert!(options.output_dir.join(SEARCH_INDEX_FILE_NAME).is_file());
        Ok(())
    }

    #[test]
    fn test_build_empty_project() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let project = tempfile::tempdir()?;
        let mut options = BuildOptions::new(project.path());
        options.output_dir = project.path().join("site");
        let report = build_site(&options)?;
        assert_eq!(0, report.posts);
        assert_eq!(7, report.pages);
        assert!(options.output_dir.join("index.html").is_file());
        assert!(options.output_dir.join(STYLE_FILE_NAME).is_file());
        Ok(())
    }
}
