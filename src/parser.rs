//! Defines the [`Parser`] and [`Error`] types: the logic for loading posts
//! from the content directory into memory.
//!
//! Loading is forgiving: a missing directory is an empty blog, and a post
//! that can't be read or parsed is logged and left out rather than failing
//! the whole build.

use std::{
    fmt,
    fs::read_dir,
    path::{Path, PathBuf},
};

use chrono::{NaiveDate, Utc};
use tracing::{debug, warn};

use crate::post::{self, Frontmatter, Post, PostMetadata};
use crate::tag;

/// The extension of post source files.
pub const MDX_EXTENSION: &str = ".mdx";

/// Parses [`Post`] objects from source files.
pub struct Parser<'a> {
    /// `posts_directory` is the directory holding the `.mdx` sources.
    posts_directory: &'a Path,

    /// `today` is the publish date given to posts that don't declare one.
    today: NaiveDate,
}

impl<'a> Parser<'a> {
    /// Constructs a new parser for `posts_directory`, using the current UTC
    /// date as the default publish date.
    pub fn new(posts_directory: &'a Path) -> Parser<'a> {
        Self::with_today(posts_directory, Utc::now().date_naive())
    }

    /// Constructs a new parser with an explicit default publish date.
    pub fn with_today(posts_directory: &'a Path, today: NaiveDate) -> Parser<'a> {
        Parser {
            posts_directory,
            today,
        }
    }

    /// Reads every post in the directory, sorted by publish date with the
    /// most recent first. Failures are logged and yield fewer (or zero)
    /// posts; this never fails.
    pub fn parse_posts(&self) -> Vec<Post> {
        if !self.posts_directory.is_dir() {
            debug!(
                directory = %self.posts_directory.display(),
                "posts directory not found"
            );
            return Vec::new();
        }

        let mut posts = match self.source_files() {
            Ok(files) => files
                .into_iter()
                .filter_map(|(slug, path)| match self.parse_file(&slug, &path) {
                    Ok(post) => Some(post),
                    Err(err) => {
                        warn!(error = %err, "skipping post");
                        None
                    }
                })
                .collect::<Vec<Post>>(),
            Err(err) => {
                warn!(error = %err, "reading posts directory");
                Vec::new()
            }
        };

        posts.sort_by(|a, b| post::by_date_desc(&a.meta, &b.meta));
        posts
    }

    /// Returns the metadata of every post, most recent first.
    pub fn all_posts(&self) -> Vec<PostMetadata> {
        self.parse_posts().into_iter().map(|p| p.meta).collect()
    }

    /// Looks up a single post by slug. Returns `None` when no file matches,
    /// when the slug tries to leave the posts directory, or when the file
    /// can't be parsed.
    pub fn parse_post(&self, slug: &str) -> Option<Post> {
        if !is_valid_slug(slug) {
            return None;
        }
        let path = self.posts_directory.join(format!("{}{}", slug, MDX_EXTENSION));
        if !path.is_file() {
            return None;
        }
        match self.parse_file(slug, &path) {
            Ok(post) => Some(post),
            Err(err) => {
                warn!(error = %err, "reading post");
                None
            }
        }
    }

    /// Returns the featured posts, most recent first.
    pub fn featured_posts(&self) -> Vec<PostMetadata> {
        post::featured_posts(&self.all_posts())
    }

    /// Returns the posts carrying `tag` (ignoring case), most recent first.
    pub fn posts_by_tag(&self, tag: &str) -> Vec<PostMetadata> {
        tag::posts_by_tag(&self.all_posts(), tag)
    }

    /// Returns the sorted, deduplicated union of all tags.
    pub fn all_tags(&self) -> Vec<String> {
        tag::all_tags(&self.all_posts())
    }

    /// Returns the `limit` most recent posts.
    pub fn recent_posts(&self, limit: usize) -> Vec<PostMetadata> {
        post::recent_posts(&self.all_posts(), limit)
    }

    // Lists `(slug, path)` pairs for every `.mdx` file, ordered by file name
    // so posts sharing a date keep a stable order.
    fn source_files(&self) -> Result<Vec<(String, PathBuf)>> {
        let mut files = Vec::new();
        for result in read_dir(self.posts_directory)? {
            let entry = result?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let os_file_name = entry.file_name();
            let file_name = os_file_name.to_string_lossy();
            if let Some(slug) = file_name.strip_suffix(MDX_EXTENSION) {
                files.push((slug.to_owned(), entry.path()));
            }
        }
        files.sort();
        Ok(files)
    }

    fn parse_file(&self, slug: &str, path: &Path) -> Result<Post> {
        match std::fs::read_to_string(path)
            .map_err(Error::from)
            .and_then(|input| self.parse_str(slug, &input))
        {
            Ok(post) => Ok(post),
            Err(e) => Err(Error::Annotated(
                format!("parsing post `{}`", path.display()),
                Box::new(e),
            )),
        }
    }

    /// Parses a single [`Post`] from its slug and the contents of its source
    /// file.
    pub fn parse_str(&self, slug: &str, input: &str) -> Result<Post> {
        let (yaml, body) = split_frontmatter(input)?;
        let frontmatter: Frontmatter = if yaml.trim().is_empty() {
            Frontmatter::default()
        } else {
            serde_yaml::from_str(yaml)?
        };
        Ok(Post {
            meta: frontmatter.into_metadata(slug, self.today),
            content: body.to_owned(),
        })
    }
}

/// Splits a source file into its YAML front matter and its body. Files that
/// don't open with a `---` fence line have no front matter; the whole input
/// is the body.
pub fn split_frontmatter(input: &str) -> Result<(&str, &str)> {
    const FENCE: &str = "---";

    let input = input.trim_start_matches('\u{feff}');
    let first_line_end = input.find('\n').unwrap_or_else(|| input.len());
    if input[..first_line_end].trim_end() != FENCE {
        return Ok(("", input));
    }

    let yaml_start = (first_line_end + 1).min(input.len());
    let mut offset = yaml_start;
    for line in input[yaml_start..].split_inclusive('\n') {
        if line.trim_end() == FENCE {
            return Ok((&input[yaml_start..offset], &input[offset + line.len()..]));
        }
        offset += line.len();
    }
    Err(Error::FrontmatterMissingEndFence)
}

// Slugs come from file names, so anything that could walk out of the posts
// directory is rejected outright.
fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty() && !slug.starts_with('.') && !slug.contains(|c: char| c == '/' || c == '\\')
}

/// Represents the result of a [`Post`]-parse operation.
pub type Result<T> = std::result::Result<T, Error>;

/// Represents an error parsing a [`Post`] object.
#[derive(Debug)]
pub enum Error {
    /// Returned when a post source file opens a front matter fence (`---`)
    /// but never closes it.
    FrontmatterMissingEndFence,

    /// Returned when there was an error parsing the frontmatter as YAML.
    DeserializeYaml(serde_yaml::Error),

    /// Returned for other I/O errors.
    Io(std::io::Error),

    /// An error with an annotation.
    Annotated(String, Box<Error>),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::FrontmatterMissingEndFence => {
                write!(f, "Missing closing `---`")
            }
            Error::DeserializeYaml(err) => err.fmt(f),
            Error::Io(err) => err.fmt(f),
            Error::Annotated(annotation, err) => {
                write!(f, "{}: {}", &annotation, err)
            }
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::FrontmatterMissingEndFence => None,
            Error::DeserializeYaml(err) => Some(err),
            Error::Io(err) => Some(err),
            Error::Annotated(_, err) => Some(err),
        }
    }
}

impl From<serde_yaml::Error> for Error {
    /// Converts a [`serde_yaml::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for [`serde_yaml`] deserialization functions.
    fn from(err: serde_yaml::Error) -> Error {
        Error::DeserializeYaml(err)
    }
}

impl From<std::io::Error> for Error {
    /// Converts a [`std::io::Error`] into an [`Error`]. It allows us to
    /// use the `?` operator for fallible I/O functions.
    fn from(err: std::io::Error) -> Error {
        Error::Io(err)
    }
}
