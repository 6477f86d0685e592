//! Loads the site configuration (`config.yaml`). The file is looked up in the
//! project directory and then in each of its ancestors. A missing or invalid
//! file never fails a build: the problem is logged and the built-in
//! [`fallback_config`] is used instead.
//!
//! Configuration is parsed once per process and cached; see [`ConfigCache`].

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

/// The name of the configuration file.
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Overrides the site URL of the fallback configuration.
pub const SITE_URL_ENV: &str = "TECHBLOG_SITE_URL";

const DEFAULT_SITE_URL: &str = "https://your-blog.com";

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SiteConfig {
    pub site: Site,
    pub author: Author,
    pub navigation: Vec<NavItem>,
    #[serde(default = "fallback_home")]
    pub home: Home,
    #[serde(default = "fallback_about")]
    pub about: About,
    #[serde(default = "fallback_footer")]
    pub footer: Footer,
    #[serde(default = "fallback_seo")]
    pub seo: Seo,
    #[serde(default = "fallback_features")]
    pub features: Features,
    #[serde(default)]
    pub subscribe: Option<Subscribe>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub name: String,
    pub title: String,
    pub description: String,

    /// The public base URL, e.g. `https://blog.example.org`. Feeds and the
    /// sitemap use it to make absolute links.
    pub url: String,
    #[serde(default)]
    pub og_image: String,
    #[serde(default)]
    pub language: String,

    /// Carried for completeness; dates are rendered as written.
    #[serde(default)]
    pub timezone: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub website: String,
    #[serde(default)]
    pub resume: Option<String>,
    #[serde(default)]
    pub social: Social,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
pub struct Social {
    pub github: Option<String>,
    pub twitter: Option<String>,
    pub linkedin: Option<String>,
    pub email: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct NavItem {
    pub name: String,
    pub href: String,
    #[serde(default)]
    pub weight: i32,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Home {
    pub hero: Hero,
    pub stats: StatsSection,
    pub featured_section: Section,
    pub recent_section: Section,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Hero {
    pub title: String,
    #[serde(default)]
    pub subtitle: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub cta_text: String,
    #[serde(default)]
    pub cta_link: String,
    #[serde(default)]
    pub background_image: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StatsSection {
    pub title: String,

    /// Ignored by the renderer, which always shows computed statistics.
    #[serde(default)]
    pub items: Option<Vec<StatItem>>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct StatItem {
    pub label: String,
    pub value: String,
    pub description: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Section {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub show_count: usize,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct About {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub skills: Vec<SkillGroup>,
    #[serde(default)]
    pub experience: Vec<Experience>,
    #[serde(default)]
    pub education: Option<Vec<Education>>,
    pub contact: Contact,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SkillGroup {
    pub category: String,
    pub items: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Experience {
    pub title: String,
    pub company: String,
    pub period: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Education {
    pub degree: String,
    pub school: String,
    pub period: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Contact {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub email: String,
    #[serde(default)]
    pub social: Vec<SocialLink>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct SocialLink {
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub handle: String,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Footer {
    pub copyright: String,
    #[serde(default)]
    pub links: Vec<LinkGroup>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct LinkGroup {
    pub title: String,
    pub items: Vec<FooterLink>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct FooterLink {
    pub name: String,
    pub href: String,
}

#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Seo {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub google_analytics: Option<String>,
    #[serde(default)]
    pub baidu_analytics: Option<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub search: bool,
    #[serde(default)]
    pub comments: bool,
    #[serde(default)]
    pub rss: bool,
    #[serde(default)]
    pub sitemap: bool,
}

/// Copy for the subscription page. Without an `endpoint` the page falls back
/// to a `mailto:` link to the author.
#[derive(Clone, Debug, Deserialize, Serialize, PartialEq)]
pub struct Subscribe {
    pub title: String,
    #[serde(default)]
    pub description: String,

    /// A form endpoint (e.g. a newsletter provider) that receives the
    /// `email` field via POST.
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl SiteConfig {
    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    /// Returns the navigation entries sorted by weight, lightest first.
    pub fn navigation(&self) -> Vec<NavItem> {
        let mut navigation = self.navigation.clone();
        navigation.sort_by_key(|item| item.weight);
        navigation
    }

    pub fn home(&self) -> &Home {
        &self.home
    }

    pub fn about(&self) -> &About {
        &self.about
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    pub fn seo(&self) -> &Seo {
        &self.seo
    }

    pub fn features(&self) -> &Features {
        &self.features
    }

    /// Returns the subscription copy, defaulting when the file has none.
    pub fn subscribe(&self) -> Subscribe {
        self.subscribe.clone().unwrap_or_else(fallback_subscribe)
    }

    /// Returns the site URL without a trailing slash, ready for appending
    /// site paths.
    pub fn base_url(&self) -> &str {
        self.site.url.trim_end_matches('/')
    }

    /// Makes a site path (e.g. `/posts/hello/`) absolute.
    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    /// Parses a configuration document. `site`, `author`, and `navigation`
    /// are required; other sections default to the fallback's.
    pub fn from_yaml(yaml: &str) -> Result<SiteConfig> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Reads and parses a configuration file.
    pub fn from_file(path: &Path) -> Result<SiteConfig> {
        let yaml = std::fs::read_to_string(path)
            .with_context(|| format!("Reading configuration file `{}`", path.display()))?;
        SiteConfig::from_yaml(&yaml)
            .with_context(|| format!("Parsing configuration file `{}`", path.display()))
    }
}

/// Looks for [`CONFIG_FILE_NAME`] in `dir` and then each of its ancestors.
/// A relative `dir` is taken from the current directory.
pub fn find_config(dir: &Path) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Reading the current directory")?;
    find_config_from(dir, &cwd)
}

// `Path::parent` is lexical: walking `.` would stop at `""` without visiting
// any real ancestor, so the search starts from the resolved directory.
fn find_config_from(dir: &Path, cwd: &Path) -> Result<PathBuf> {
    let absolute = cwd.join(dir);
    let start = absolute.canonicalize().unwrap_or(absolute);
    search_ancestors(&start)
}

fn search_ancestors(dir: &Path) -> Result<PathBuf> {
    let path = dir.join(CONFIG_FILE_NAME);
    if path.exists() {
        Ok(path)
    } else {
        match dir.parent() {
            Some(parent) => search_ancestors(parent),
            None => Err(anyhow!(
                "Could not find `{}` in any parent directory",
                CONFIG_FILE_NAME
            )),
        }
    }
}

/// Loads the configuration for the project in `dir`, falling back to
/// [`fallback_config`] when no file is found or it can't be parsed.
pub fn load_config(dir: &Path) -> SiteConfig {
    let loaded = find_config(dir).and_then(|path| {
        let config = SiteConfig::from_file(&path)?;
        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    });
    match loaded {
        Ok(config) => config,
        Err(e) => {
            warn!("Using fallback configuration: {:#}", e);
            fallback_config()
        }
    }
}

/// Caches a parsed [`SiteConfig`]. The first [`ConfigCache::get`] loads the
/// configuration; later calls reuse it until [`ConfigCache::clear`].
#[derive(Default)]
pub struct ConfigCache {
    cached: Mutex<Option<Arc<SiteConfig>>>,
}

impl ConfigCache {
    pub const fn new() -> ConfigCache {
        ConfigCache {
            cached: Mutex::new(None),
        }
    }

    pub fn get(&self, dir: &Path) -> Arc<SiteConfig> {
        let mut cached = self.lock();
        match &*cached {
            Some(config) => Arc::clone(config),
            None => {
                let config = Arc::new(load_config(dir));
                *cached = Some(Arc::clone(&config));
                config
            }
        }
    }

    pub fn clear(&self) {
        *self.lock() = None;
    }

    // A poisoned lock still holds a usable value.
    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Arc<SiteConfig>>> {
        self.cached
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

static CONFIG: ConfigCache = ConfigCache::new();

/// Returns the process-wide configuration, loading it from `dir` on first
/// use.
pub fn get_config(dir: &Path) -> Arc<SiteConfig> {
    CONFIG.get(dir)
}

/// Drops the process-wide cached configuration so the next [`get_config`]
/// reloads it.
pub fn clear_config_cache() {
    CONFIG.clear()
}

fn fallback_site_url() -> String {
    std::env::var(SITE_URL_ENV)
        .ok()
        .filter(|url| !url.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_SITE_URL.to_owned())
}

fn nav(name: &str, href: &str, weight: i32) -> NavItem {
    NavItem {
        name: name.to_owned(),
        href: href.to_owned(),
        weight,
    }
}

fn link(name: &str, href: &str) -> FooterLink {
    FooterLink {
        name: name.to_owned(),
        href: href.to_owned(),
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

const FALLBACK_EMAIL: &str = "developer@example.com";
const FALLBACK_BIO: &str = "Backend developer focused on AI applications, sharing notes on what I build and learn.";

/// The built-in configuration used when `config.yaml` is missing or invalid.
pub fn fallback_config() -> SiteConfig {
    let url = fallback_site_url();
    SiteConfig {
        site: Site {
            name: "Tech Blog".to_owned(),
            title: "A Modern Tech Blog".to_owned(),
            description: "Notes on web development, systems, and programming practice".to_owned(),
            url: url.clone(),
            og_image: "/og-image.jpg".to_owned(),
            language: "en".to_owned(),
            timezone: "UTC".to_owned(),
        },
        author: Author {
            name: "Developer".to_owned(),
            email: FALLBACK_EMAIL.to_owned(),
            avatar: "/avatar.jpg".to_owned(),
            bio: FALLBACK_BIO.to_owned(),
            location: "Earth".to_owned(),
            website: url,
            resume: Some("/resume.pdf".to_owned()),
            social: Social {
                github: Some("https://github.com/yourusername".to_owned()),
                twitter: Some("https://twitter.com/yourusername".to_owned()),
                linkedin: Some("https://linkedin.com/in/yourusername".to_owned()),
                email: Some(FALLBACK_EMAIL.to_owned()),
            },
        },
        navigation: vec![
            nav("Home", "/", 1),
            nav("Posts", "/posts", 2),
            nav("Tags", "/tags", 3),
            nav("Search", "/search", 4),
            nav("About", "/about", 5),
        ],
        home: fallback_home(),
        about: fallback_about(),
        footer: fallback_footer(),
        seo: fallback_seo(),
        features: fallback_features(),
        subscribe: None,
    }
}

fn fallback_home() -> Home {
    Home {
        hero: Hero {
            title: "A Modern Tech Blog".to_owned(),
            subtitle: "Exploring new technology, sharing what I learn".to_owned(),
            description: FALLBACK_BIO.to_owned(),
            cta_text: "Start reading".to_owned(),
            cta_link: "/posts".to_owned(),
            background_image: None,
        },
        stats: StatsSection {
            title: "Blog stats".to_owned(),
            items: None,
        },
        featured_section: Section {
            title: "Featured posts".to_owned(),
            description: "The most popular and most useful articles".to_owned(),
            show_count: 3,
        },
        recent_section: Section {
            title: "Recent posts".to_owned(),
            description: "The latest writing".to_owned(),
            show_count: 6,
        },
    }
}

fn fallback_about() -> About {
    About {
        title: "About me".to_owned(),
        description: "A little more about the person behind this blog".to_owned(),
        bio: FALLBACK_BIO.to_owned(),
        skills: vec![
            SkillGroup {
                category: "Frontend".to_owned(),
                items: strings(&["React", "Vue.js", "TypeScript", "Next.js", "Tailwind CSS", "Vite"]),
            },
            SkillGroup {
                category: "Backend".to_owned(),
                items: strings(&["Node.js", "Python", "Express", "FastAPI", "PostgreSQL", "MongoDB"]),
            },
        ],
        experience: vec![Experience {
            title: "Senior Frontend Engineer".to_owned(),
            company: "Tech Company".to_owned(),
            period: "2022 - present".to_owned(),
            description: "Architecture and development of large web applications".to_owned(),
        }],
        education: None,
        contact: Contact {
            title: "Contact".to_owned(),
            description: "Happy to talk about technical questions or collaboration".to_owned(),
            email: FALLBACK_EMAIL.to_owned(),
            social: vec![SocialLink {
                platform: "GitHub".to_owned(),
                url: "https://github.com/yourusername".to_owned(),
                handle: "@yourusername".to_owned(),
            }],
        },
    }
}

fn fallback_footer() -> Footer {
    Footer {
        copyright: "© 2024 Tech Blog. All rights reserved.".to_owned(),
        links: vec![LinkGroup {
            title: "Navigation".to_owned(),
            items: vec![
                link("Home", "/"),
                link("Posts", "/posts"),
                link("Tags", "/tags"),
                link("About", "/about"),
            ],
        }],
    }
}

fn fallback_seo() -> Seo {
    Seo {
        keywords: strings(&["web development", "JavaScript", "TypeScript", "React", "tech blog"]),
        google_analytics: None,
        baidu_analytics: None,
    }
}

fn fallback_features() -> Features {
    Features {
        dark_mode: true,
        search: true,
        comments: false,
        rss: true,
        sitemap: true,
    }
}

fn fallback_subscribe() -> Subscribe {
    Subscribe {
        title: "Subscribe".to_owned(),
        description: "Get new posts delivered to your inbox.".to_owned(),
        endpoint: None,
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const MINIMAL: &str = r#"
site:
  name: Ferris Writes
  title: Ferris Writes
  description: Crabs and code
  url: https://ferris.example.org/
author:
  name: Ferris
  email: ferris@example.org
navigation:
  - { name: About, href: /about, weight: 3 }
  - { name: Home, href: /, weight: 1 }
  - { name: Posts, href: /posts, weight: 2 }
"#;

    #[test]
    fn test_minimal_config_defaults_sections() -> Result<()> {
        let config = SiteConfig::from_yaml(MINIMAL)?;
        assert_eq!("Ferris Writes", config.site().name);
        assert_eq!(fallback_home(), *config.home());
        assert_eq!(fallback_features(), *config.features());
        assert_eq!("Subscribe", config.subscribe().title);
        assert_eq!("https://ferris.example.org", config.base_url());
        assert_eq!(
            "https://ferris.example.org/posts/a/",
            config.absolute_url("/posts/a/")
        );
        Ok(())
    }

    #[test]
    fn test_navigation_sorted_by_weight() -> Result<()> {
        let config = SiteConfig::from_yaml(MINIMAL)?;
        let names: Vec<String> = config.navigation().into_iter().map(|n| n.name).collect();
        assert_eq!(vec!["Home", "Posts", "About"], names);
        Ok(())
    }

    #[test]
    fn test_missing_required_section_is_an_error() {
        assert!(SiteConfig::from_yaml("site:\n  name: x\n").is_err());
    }

    #[test]
    fn test_missing_file_yields_fallback() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let config = load_config(dir.path());
        assert_eq!(fallback_config().site.name, config.site.name);
        assert_eq!(fallback_config().navigation, config.navigation);
        Ok(())
    }

    #[test]
    fn test_invalid_file_yields_fallback() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), "site: [unclosed")?;
        assert_eq!(fallback_config().author, load_config(dir.path()).author);
        Ok(())
    }

    #[test]
    fn test_find_config_in_ancestor() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), MINIMAL)?;
        let nested = dir.path().join("content").join("posts");
        std::fs::create_dir_all(&nested)?;
        assert_eq!(
            dir.path().canonicalize()?.join(CONFIG_FILE_NAME),
            find_config(&nested)?
        );
        assert_eq!("Ferris", load_config(&nested).author.name);
        Ok(())
    }

    #[test]
    fn test_find_config_from_relative_dir() -> Result<()> {
        let dir = tempfile::tempdir()?;
        std::fs::write(dir.path().join(CONFIG_FILE_NAME), MINIMAL)?;
        let nested = dir.path().join("content").join("posts");
        std::fs::create_dir_all(&nested)?;
        let wanted = dir.path().canonicalize()?.join(CONFIG_FILE_NAME);
        assert_eq!(wanted, find_config_from(Path::new("."), &nested)?);
        assert_eq!(wanted, find_config_from(Path::new(".."), &nested)?);
        Ok(())
    }

    #[test]
    fn test_process_wide_cache() -> Result<()> {
        let first = tempfile::tempdir()?;
        let second = tempfile::tempdir()?;
        std::fs::write(first.path().join(CONFIG_FILE_NAME), MINIMAL)?;
        std::fs::write(
            second.path().join(CONFIG_FILE_NAME),
            MINIMAL.replace("Ferris Writes", "Crab Notes"),
        )?;

        clear_config_cache();
        assert_eq!("Ferris Writes", get_config(first.path()).site.name);
        assert_eq!("Ferris Writes", get_config(second.path()).site.name);
        clear_config_cache();
        assert_eq!("Crab Notes", get_config(second.path()).site.name);
        clear_config_cache();
        Ok(())
    }

    #[test]
    fn test_cache_reuses_until_cleared() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, MINIMAL)?;
        let cache = ConfigCache::new();
        let first = cache.get(dir.path());
        std::fs::write(&path, MINIMAL.replace("Ferris Writes", "Crab Notes"))?;
        assert!(Arc::ptr_eq(&first, &cache.get(dir.path())));
        assert_eq!("Ferris Writes", cache.get(dir.path()).site.name);
        cache.clear();
        assert_eq!("Crab Notes", cache.get(dir.path()).site.name);
        Ok(())
    }
}
