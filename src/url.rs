//! Rewrites links inside post bodies. Authors link to each other's posts by
//! source file (`other-post.mdx`, `./other-post.mdx#setup`); the rendered
//! site serves those at `/posts/other-post/`.

use crate::parser::MDX_EXTENSION;
use url::{ParseError, Url};

// Relative links are resolved against this stand-in for the posts directory
// and only its path ever reaches the output.
const POSTS_ROOT: &str = "http://posts.invalid/posts/";

pub struct Converter {
    posts_root: Url,
}

impl Converter {
    /// Constructs a new `Converter`.
    pub fn new() -> Result<Converter> {
        Ok(Converter {
            posts_root: Url::parse(POSTS_ROOT)?,
        })
    }

    // Returns the post slug if `absolute` names an `.mdx` file directly
    // inside the posts directory.
    fn post_slug(&self, absolute: &Url) -> Option<String> {
        let relative = self.posts_root.make_relative(absolute)?;
        let relative = relative.split(|c| c == '#' || c == '?').next()?;
        let slug = relative.strip_suffix(MDX_EXTENSION)?;
        if slug.is_empty() || slug.contains('/') || slug.starts_with("..") {
            None
        } else {
            Some(slug.to_owned())
        }
    }

    fn convert_relative(&self, url: &str) -> Result<String> {
        let absolute = self.posts_root.join(url)?;
        Ok(match self.post_slug(&absolute) {
            Some(slug) => match absolute.fragment() {
                Some(fragment) => format!("/posts/{}/#{}", slug, fragment),
                None => format!("/posts/{}/", slug),
            },
            None => url.to_owned(),
        })
    }

    /// Converts a link destination. Links to sibling `.mdx` sources become
    /// post paths; absolute URLs, anchors, and every other relative link are
    /// returned unchanged.
    pub fn convert(&self, url: &str) -> Result<String> {
        if url.starts_with('#') {
            return Ok(url.to_owned());
        }
        match Url::parse(url) {
            Ok(_) => Ok(url.to_owned()),
            Err(ParseError::RelativeUrlWithoutBase) => self.convert_relative(url),
            Err(e) => Err(e),
        }
    }
}

type Result<T> = std::result::Result<T, ParseError>;
