//! The page templates and stylesheet. A default theme is compiled into the
//! binary; a theme directory may override any template (`<name>.html`) or the
//! stylesheet (`style.css`) by providing a file of the same name.

use gtmpl::Template;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// The stylesheet's file name, both in a theme directory and in the output.
pub const STYLE_FILE_NAME: &str = "style.css";

const EMBEDDED_TEMPLATES: [(&str, &str); 10] = [
    ("layout", include_str!("../theme/layout.html")),
    ("home", include_str!("../theme/home.html")),
    ("posts", include_str!("../theme/posts.html")),
    ("post", include_str!("../theme/post.html")),
    ("tags", include_str!("../theme/tags.html")),
    ("tag", include_str!("../theme/tag.html")),
    ("search", include_str!("../theme/search.html")),
    ("about", include_str!("../theme/about.html")),
    ("subscribe", include_str!("../theme/subscribe.html")),
    ("not_found", include_str!("../theme/not_found.html")),
];

const EMBEDDED_STYLE: &str = include_str!("../theme/style.css");

/// A parsed set of templates plus the stylesheet.
pub struct Theme {
    templates: HashMap<&'static str, Template>,
    pub style: String,
}

impl Theme {
    /// Returns the names of every template a theme provides.
    pub fn template_names() -> impl Iterator<Item = &'static str> {
        EMBEDDED_TEMPLATES.iter().map(|(name, _)| *name)
    }

    /// Loads the built-in theme.
    pub fn embedded() -> Result<Theme> {
        Theme::load(None)
    }

    /// Loads the built-in theme with overrides from `dir`, if given. Files
    /// missing from `dir` fall back to the built-in versions.
    pub fn load(dir: Option<&Path>) -> Result<Theme> {
        let mut templates = HashMap::new();
        for (name, embedded) in EMBEDDED_TEMPLATES {
            let source = match dir.map(|d| d.join(format!("{}.html", name))) {
                Some(path) if path.is_file() => {
                    debug!(path = %path.display(), "Using theme override");
                    read(&path)?
                }
                _ => embedded.to_owned(),
            };
            templates.insert(name, parse_template(name, &source)?);
        }

        let style = match dir.map(|d| d.join(STYLE_FILE_NAME)) {
            Some(path) if path.is_file() => read(&path)?,
            _ => EMBEDDED_STYLE.to_owned(),
        };

        Ok(Theme { templates, style })
    }

    /// Looks up a template by name (e.g. `post`).
    pub fn template(&self, name: &str) -> Result<&Template> {
        self.templates
            .get(name)
            .ok_or_else(|| Error::MissingTemplate(name.to_owned()))
    }
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|err| Error::OpenTemplateFile {
        path: path.to_owned(),
        err,
    })
}

fn parse_template(name: &str, source: &str) -> Result<Template> {
    let mut template = Template::default();
    template
        .parse(source)
        .map_err(|err| Error::ParseTemplate {
            name: name.to_owned(),
            err: err.to_string(),
        })?;
    Ok(template)
}

type Result<T> = std::result::Result<T, Error>;

/// The error type for loading a theme.
#[derive(Debug)]
pub enum Error {
    /// Returned for I/O problems while reading template overrides.
    OpenTemplateFile { path: PathBuf, err: std::io::Error },

    /// Returned for errors parsing a template.
    ParseTemplate { name: String, err: String },

    /// Returned when a page asks for a template the theme doesn't have.
    MissingTemplate(String),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::OpenTemplateFile { path, err } => {
                write!(f, "Opening template file '{}': {}", path.display(), err)
            }
            Error::ParseTemplate { name, err } => {
                write!(f, "Parsing template '{}': {}", name, err)
            }
            Error::MissingTemplate(name) => write!(f, "No template named '{}'", name),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::OpenTemplateFile { path: _, err } => Some(err),
            Error::ParseTemplate { .. } => None,
            Error::MissingTemplate(_) => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gtmpl::{Context, Value};

    #[test]
    fn test_embedded_theme_parses() -> Result<()> {
        let theme = Theme::embedded()?;
        for name in Theme::template_names() {
            theme.template(name)?;
        }
        assert!(theme.style.contains("code-block"));
        Ok(())
    }

    #[test]
    fn test_missing_template() -> Result<()> {
        let theme = Theme::embedded()?;
        assert!(matches!(
            theme.template("sidebar"),
            Err(Error::MissingTemplate(_))
        ));
        Ok(())
    }

    #[test]
    fn test_overrides() -> std::result::Result<(), Box<dyn std::error::Error>> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("about.html"), "<p>{{.about.title}}</p>")?;
        std::fs::write(dir.path().join(STYLE_FILE_NAME), "body { color: red; }")?;
        let theme = Theme::load(Some(dir.path()))?;
        assert_eq!("body { color: red; }", theme.style);

        let mut about = HashMap::new();
        about.insert("title".to_owned(), Value::String("Hello".to_owned()));
        let mut root = HashMap::new();
        root.insert("about".to_owned(), Value::Object(about));
        let mut out: Vec<u8> = Vec::new();
        theme
            .template("about")?
            .execute(&mut out, &Context::from(Value::Object(root))?)?;
        assert_eq!("<p>Hello</p>", String::from_utf8(out)?);
        Ok(())
    }

    #[test]
    fn test_broken_override_is_an_error() -> std::io::Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join("post.html"), "{{if .post}}unclosed")?;
        assert!(matches!(
            Theme::load(Some(dir.path())),
            Err(Error::ParseTemplate { .. })
        ));
        Ok(())
    }
}
