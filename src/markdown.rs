//! Renders MDX post bodies to HTML. MDX is treated as markdown with raw HTML
//! passthrough; top-level ESM (`import`/`export`) lines have no meaning
//! outside a JavaScript bundler, so they are dropped before parsing.

use crate::htmlrenderer::{push_html, Heading};
use crate::url::Converter as LinkConverter;
use pulldown_cmark::{Options, Parser};
use std::fmt;
use std::io;
use url::ParseError as UrlParseError;

/// The output of [`to_html`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Rendered {
    pub html: String,

    /// The headings of the document in order, for the table of contents.
    pub toc: Vec<Heading>,
}

/// Converts an MDX body to HTML.
pub fn to_html(mdx: &str) -> Result<Rendered, Error> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_TASKLISTS);

    let link_converter = LinkConverter::new()?;
    let markdown = strip_esm(mdx);
    let mut html = String::with_capacity(markdown.len() * 3 / 2);
    let toc = push_html(
        &mut html,
        Parser::new_ext(&markdown, options),
        &link_converter,
    )?;
    Ok(Rendered { html, toc })
}

/// Removes `import` and `export` statement lines that sit outside fenced code
/// blocks.
pub fn strip_esm(mdx: &str) -> String {
    let mut out = String::with_capacity(mdx.len());
    let mut fence: Option<&str> = None;
    for line in mdx.split_inclusive('\n') {
        let trimmed = line.trim_start();
        match fence {
            Some(marker) => {
                if trimmed.starts_with(marker) {
                    fence = None;
                }
            }
            None => {
                if trimmed.starts_with("```") {
                    fence = Some("```");
                } else if trimmed.starts_with("~~~") {
                    fence = Some("~~~");
                } else if is_esm(line) {
                    continue;
                }
            }
        }
        out.push_str(line);
    }
    out
}

// ESM statements start at column zero.
fn is_esm(line: &str) -> bool {
    line.starts_with("import ") || line.starts_with("export ")
}

/// Represents an error converting markdown to HTML.
#[derive(Debug)]
pub enum Error {
    /// Returned for other I/O errors.
    Io(io::Error),

    /// Returned when the link converter can't be constructed.
    UrlParse(UrlParseError),
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as human-readable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => err.fmt(f),
            Error::UrlParse(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::UrlParse(err) => Some(err),
        }
    }
}

impl From<UrlParseError> for Error {
    /// Converts a [`url::ParseError`] into an [`Error`]. It allows us to use
    /// the `?` operator for URL parsing and joining functions.
    fn from(err: UrlParseError) -> Error {
        Error::UrlParse(err)
    }
}

impl From<io::Error> for Error {
    /// Converts a [`io::Error`] into an [`Error`]. It allows us to use
    /// the `?` operator for IO operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_headings_get_ids_and_toc() -> Result<(), Error> {
        let rendered = to_html("# Intro\n\ntext\n\n## Getting Started\n\n## Intro\n")?;
        assert!(rendered.html.contains(r#"<h1 id="intro">Intro</h1>"#));
        assert!(rendered
            .html
            .contains(r#"<h2 id="getting-started">Getting Started</h2>"#));
        assert!(rendered.html.contains(r#"<h2 id="intro-1">Intro</h2>"#));
        let ids: Vec<&str> = rendered.toc.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(vec!["intro", "getting-started", "intro-1"], ids);
        assert_eq!(2, rendered.toc[1].level);
        Ok(())
    }

    #[test]
    fn test_suffixed_ids_skip_literal_collisions() -> Result<(), Error> {
        let rendered = to_html("## Intro\n\n## Intro\n\n## Intro 1\n")?;
        let ids: Vec<&str> = rendered.toc.iter().map(|h| h.id.as_str()).collect();
        assert_eq!(vec!["intro", "intro-1", "intro-1-1"], ids);
        Ok(())
    }

    #[test]
    fn test_code_block_header() -> Result<(), Error> {
        let rendered = to_html("```rust\nfn main() {}\n```\n\n```\nplain\n```\n")?;
        assert!(rendered.html.contains(
            r#"<div class="code-block"><div class="code-block-header">rust</div><pre><code class="language-rust">fn main() {}"#
        ));
        assert!(rendered
            .html
            .contains(r#"<div class="code-block-header">text</div><pre><code>plain"#));
        Ok(())
    }

    #[test]
    fn test_links() -> Result<(), Error> {
        let rendered = to_html(
            "[ext](https://www.rust-lang.org) [sibling](./other.mdx#usage) [page](/about)\n",
        )?;
        assert!(rendered.html.contains(
            r#"<a href="https://www.rust-lang.org" class="external" target="_blank" rel="noopener noreferrer">ext</a>"#
        ));
        assert!(rendered
            .html
            .contains(r##"<a href="/posts/other/#usage">sibling</a>"##));
        assert!(rendered.html.contains(r#"<a href="/about">page</a>"#));
        Ok(())
    }

    #[test]
    fn test_raw_html_passes_through() -> Result<(), Error> {
        let rendered = to_html("<div class=\"callout\">\nhi\n</div>\n")?;
        assert!(rendered.html.contains(r#"<div class="callout">"#));
        Ok(())
    }

    #[test]
    fn test_image_alt_text() -> Result<(), Error> {
        let rendered = to_html("![a *diagram*](/img/d.png \"Title\")\n")?;
        assert!(rendered.html.contains(
            r#"<img src="/img/d.png" alt="a diagram" title="Title" loading="lazy" />"#
        ));
        Ok(())
    }

    #[test]
    fn test_strip_esm() {
        let mdx = "import Chart from './chart'\nexport const meta = {}\n\n# Title\n\n```js\nimport x from 'y'\n```\n";
        assert_eq!(
            "\n# Title\n\n```js\nimport x from 'y'\n```\n",
            strip_esm(mdx)
        );
    }
}
