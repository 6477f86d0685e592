//! Templates [`Page`]s and writes them to disk. Each page is rendered twice:
//! first with its own template, then the result is placed into the `layout`
//! template along with the site-wide chrome (navigation, footer, metadata).

use crate::config::{Author, Features, Footer, Seo, SiteConfig};
use crate::page::Page;
use crate::theme::Theme;
use crate::value::{insert_raw, to_value};
use gtmpl::{Context, Template};
use gtmpl_value::Value;
use serde::Serialize;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Responsible for templating and writing HTML pages to disk.
pub struct Writer<'a> {
    pub theme: &'a Theme,
    pub config: &'a SiteConfig,

    /// The root of the generated site. Page files are written relative to it
    /// (see [`Page::file_path`]).
    pub output_directory: &'a Path,
}

#[derive(Serialize)]
struct NavLink<'a> {
    name: &'a str,
    href: &'a str,
    active: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PageMeta<'a> {
    title: String,
    description: &'a str,
    keywords: String,
    url: String,
    kind: &'a str,
    image: String,
}

#[derive(Serialize)]
struct LayoutContext<'a> {
    site: &'a crate::config::Site,
    author: &'a Author,
    navigation: Vec<NavLink<'a>>,
    footer: &'a Footer,
    features: &'a Features,
    seo: &'a Seo,
    page: PageMeta<'a>,
}

impl Writer<'_> {
    /// Templates a single [`Page`] and writes it to disk, returning the path
    /// of the written file.
    pub fn write_page(&self, page: &Page) -> Result<PathBuf> {
        let content = execute(self.theme.template(page.template)?, page.item.clone())?;

        let navigation = self.config.navigation();
        let mut layout = to_value(&LayoutContext {
            site: self.config.site(),
            author: self.config.author(),
            navigation: navigation
                .iter()
                .map(|item| NavLink {
                    name: &item.name,
                    href: &item.href,
                    active: is_active(&item.href, &page.path),
                })
                .collect(),
            footer: self.config.footer(),
            features: self.config.features(),
            seo: self.config.seo(),
            page: self.page_meta(page),
        })?;
        insert_raw(&mut layout, "content", content);
        let html = execute(self.theme.template("layout")?, layout)?;

        let file_path = self.output_directory.join(page.file_path());
        if let Some(dir) = file_path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&file_path, html)?;
        debug!(path = %file_path.display(), "Wrote page");
        Ok(file_path)
    }

    /// Writes each of `pages`. Stops at the first failure.
    pub fn write_pages(&self, pages: &[Page]) -> Result<()> {
        for page in pages {
            self.write_page(page)?;
        }
        Ok(())
    }

    fn page_meta<'p>(&self, page: &'p Page) -> PageMeta<'p> {
        let site = self.config.site();
        let title = match &page.title {
            Some(title) => format!("{} | {}", title, site.name),
            None => site.title.clone(),
        };
        let mut keywords = page.keywords.clone();
        keywords.extend(self.config.seo().keywords.iter().cloned());
        let image = match page.image.as_deref().unwrap_or(&site.og_image) {
            "" => String::new(),
            image if image.starts_with("http") => image.to_owned(),
            image => self.config.absolute_url(image),
        };
        PageMeta {
            title,
            description: &page.description,
            keywords: keywords.join(", "),
            url: self.config.absolute_url(&page.path),
            kind: page.kind,
            image,
        }
    }
}

/// A navigation link is active on its own page and, except for the home
/// link, on every page beneath it.
fn is_active(href: &str, path: &str) -> bool {
    match href {
        "/" => path == "/",
        _ => {
            let href = href.trim_end_matches('/');
            match path.strip_prefix(href) {
                Some(rest) => rest.is_empty() || rest.starts_with('/'),
                None => false,
            }
        }
    }
}

fn execute(template: &Template, value: Value) -> Result<String> {
    let mut out: Vec<u8> = Vec::new();
    template.execute(&mut out, &Context::from(value)?)?;
    String::from_utf8(out).map_err(|err| Error::Template(err.to_string()))
}

/// The result of a fallible page-writing operation.
type Result<T> = std::result::Result<T, Error>;

/// Represents an error in a page-writing operation.
#[derive(Debug)]
pub enum Error {
    /// An error during templating.
    Template(String),

    /// A page asked for a template the theme lacks.
    Theme(crate::theme::Error),

    /// An error converting the page context into a template value.
    Context(serde_json::Error),

    /// An error writing the output files.
    Io(io::Error),
}

impl From<io::Error> for Error {
    /// Converts an [`io::Error`] into an [`Error`]. This allows us to use the
    /// `?` operator for fallible I/O operations.
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<String> for Error {
    /// Converts a template error message ([`String`]) into an [`Error`]. This
    /// allows us to use the `?` operator for fallible template operations.
    fn from(err: String) -> Error {
        Error::Template(err)
    }
}

impl From<crate::theme::Error> for Error {
    fn from(err: crate::theme::Error) -> Error {
        Error::Theme(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Error {
        Error::Context(err)
    }
}

impl fmt::Display for Error {
    /// Displays an [`Error`] as presentable text.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Template(err) => write!(f, "Rendering template: {}", err),
            Error::Theme(err) => err.fmt(f),
            Error::Context(err) => write!(f, "Building template context: {}", err),
            Error::Io(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements the [`std::error::Error`] trait for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Template(_) => None,
            Error::Theme(err) => Some(err),
            Error::Context(err) => Some(err),
            Error::Io(err) => Some(err),
        }
    }
}
