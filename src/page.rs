//! Builds the [`Page`]s of the site: which template renders each one, where
//! it lives, and the template context it's rendered with.

use crate::config::{About, Author, Hero, SiteConfig, StatItem, Subscribe};
use crate::htmlrenderer::Heading;
use crate::markdown::Rendered;
use crate::post::{featured_posts, recent_posts, PostMetadata};
use crate::search;
use crate::stats::formatted_stats;
use crate::subscribe::{mailto, EMAIL_PATTERN};
use crate::tag::{posts_on_page, tag_pages, Tag, TagCount};
use crate::value::{insert_raw, to_value};
use gtmpl_value::Value;
use serde::Serialize;
use std::path::PathBuf;

/// The number of tags shown in the home page's and tags page's "popular"
/// lists.
pub const POPULAR_TAG_LIMIT: usize = 10;

type Result<T> = std::result::Result<T, serde_json::Error>;

/// An output HTML file.
pub struct Page {
    /// The name of the content template (see [`crate::theme`]).
    pub template: &'static str,

    /// The site path, e.g. `/posts/hello/` or `/404.html`.
    pub path: String,

    /// The page's own title; the layout appends the site name.
    pub title: Option<String>,
    pub description: String,

    /// `article` for posts, `website` for everything else.
    pub kind: &'static str,

    /// A page-specific social preview image.
    pub image: Option<String>,

    /// Extra keywords (e.g. a post's tags).
    pub keywords: Vec<String>,

    /// The content template's context.
    pub item: Value,
}

impl Page {
    /// The output file relative to the output directory. Directory paths get
    /// an `index.html`.
    pub fn file_path(&self) -> PathBuf {
        let relative = self.path.trim_start_matches('/');
        if relative.is_empty() || relative.ends_with('/') {
            PathBuf::from(format!("{}index.html", relative))
        } else {
            PathBuf::from(relative)
        }
    }
}

/// A post as shown in listings.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PostCard<'a> {
    pub slug: &'a str,
    pub title: &'a str,
    pub excerpt: &'a str,
    pub publish_date: &'a str,

    /// E.g. `Jan 15, 2024`; unparseable dates are shown as written.
    pub display_date: String,
    pub read_time: u32,
    pub tags: Vec<TagLink>,
    pub featured: bool,
    pub author: &'a str,
    pub image: Option<&'a str>,
    pub path: String,
}

impl<'a> PostCard<'a> {
    pub fn new(post: &'a PostMetadata) -> PostCard<'a> {
        PostCard {
            slug: &post.slug,
            title: &post.title,
            excerpt: &post.excerpt,
            publish_date: &post.publish_date,
            display_date: match post.published() {
                Some(date) => date.format("%b %-d, %Y").to_string(),
                None => post.publish_date.clone(),
            },
            read_time: post.read_time,
            tags: post.tags.iter().map(|t| TagLink::new(&Tag::new(t))).collect(),
            featured: post.featured,
            author: &post.author,
            image: post.image.as_deref(),
            path: post.path(),
        }
    }
}

fn cards(posts: &[PostMetadata]) -> Vec<PostCard> {
    posts.iter().map(PostCard::new).collect()
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagLink {
    pub name: String,
    pub path: String,
}

impl TagLink {
    fn new(tag: &Tag) -> TagLink {
        TagLink {
            name: tag.name.clone(),
            path: tag.path(),
        }
    }
}

/// A tag page link with the number of posts listed on it.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TagEntry {
    pub name: String,
    pub path: String,
    pub count: usize,
}

/// Returns an entry per tag page in alphabetical order.
pub fn tag_entries(posts: &[PostMetadata]) -> Vec<TagEntry> {
    tag_pages(posts)
        .into_iter()
        .map(|tag| TagEntry {
            count: posts_on_page(posts, &tag).len(),
            path: tag.path(),
            name: tag.name,
        })
        .collect()
}

/// Returns the `limit` tag pages with the most posts. Ties stay
/// alphabetical.
pub fn popular_entries(posts: &[PostMetadata], limit: usize) -> Vec<TagEntry> {
    let mut entries = tag_entries(posts);
    entries.sort_by(|a, b| b.count.cmp(&a.count));
    entries.truncate(limit);
    entries
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Listing<'a> {
    title: &'a str,
    description: &'a str,
    posts: Vec<PostCard<'a>>,
    has_posts: bool,
}

impl<'a> Listing<'a> {
    fn new(title: &'a str, description: &'a str, posts: Vec<PostCard<'a>>) -> Listing<'a> {
        Listing {
            title,
            description,
            has_posts: !posts.is_empty(),
            posts,
        }
    }
}

#[derive(Serialize)]
struct StatsBlock<'a> {
    title: &'a str,
    items: Vec<StatItem>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HomeView<'a> {
    hero: &'a Hero,
    featured: Listing<'a>,
    recent: Listing<'a>,
    stats: StatsBlock<'a>,
    tags: Vec<TagEntry>,
    has_tags: bool,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostsView<'a> {
    posts: Vec<PostCard<'a>>,
    has_posts: bool,
    count: usize,
    tag_count: usize,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PostView<'a> {
    post: PostCard<'a>,
    toc: &'a [Heading],
    has_toc: bool,
    url: String,
    share_url: String,

    /// The next older post.
    prev: Option<PostCard<'a>>,

    /// The next newer post.
    next: Option<PostCard<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TagsView {
    tags: Vec<TagEntry>,
    popular: Vec<TagEntry>,
    has_tags: bool,
    tag_count: usize,
    post_count: usize,
    average_posts_per_tag: usize,
}

#[derive(Serialize)]
struct TagView<'a> {
    tag: TagLink,
    count: usize,
    posts: Vec<PostCard<'a>>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchView {
    enabled: bool,
    tags: Vec<TagCount>,
    has_tags: bool,
    total: usize,
}

#[derive(Serialize)]
struct AboutView<'a> {
    about: &'a About,
    author: &'a Author,
}

#[derive(Serialize)]
struct SubscribeView<'a> {
    subscribe: Subscribe,
    pattern: &'a str,
    mailto: String,
    rss: bool,
}

#[derive(Serialize)]
struct Empty {}

/// Builds pages from the configuration and the date-sorted post list.
pub struct Pages<'a> {
    pub config: &'a SiteConfig,
    pub posts: &'a [PostMetadata],
}

impl<'a> Pages<'a> {
    fn page(&self, template: &'static str, path: &str, title: Option<&str>, item: Value) -> Page {
        Page {
            template,
            path: path.to_owned(),
            title: title.map(str::to_owned),
            description: self.config.site().description.clone(),
            kind: "website",
            image: None,
            keywords: Vec::new(),
            item,
        }
    }

    /// `/`: hero, featured and recent posts, statistics, and popular tags.
    pub fn home(&self) -> Result<Page> {
        let home = self.config.home();
        let mut featured = featured_posts(self.posts);
        featured.truncate(home.featured_section.show_count);
        let recent = recent_posts(self.posts, home.recent_section.show_count);
        let tags = popular_entries(self.posts, POPULAR_TAG_LIMIT);
        let item = to_value(&HomeView {
            hero: &home.hero,
            featured: Listing::new(
                &home.featured_section.title,
                &home.featured_section.description,
                cards(&featured),
            ),
            recent: Listing::new(
                &home.recent_section.title,
                &home.recent_section.description,
                cards(&recent),
            ),
            stats: StatsBlock {
                title: &home.stats.title,
                items: formatted_stats(self.posts),
            },
            has_tags: !tags.is_empty(),
            tags,
        })?;
        Ok(self.page("home", "/", None, item))
    }

    /// `/posts/`: every post, newest first.
    pub fn posts(&self) -> Result<Page> {
        let item = to_value(&PostsView {
            posts: cards(self.posts),
            has_posts: !self.posts.is_empty(),
            count: self.posts.len(),
            tag_count: tag_pages(self.posts).len(),
        })?;
        Ok(self.page("posts", "/posts/", Some("All posts"), item))
    }

    /// `/posts/<slug>/` for the post at `index`, with its rendered body.
    pub fn post(&self, index: usize, rendered: &Rendered) -> Result<Page> {
        let post = &self.posts[index];
        let url = self.config.absolute_url(&post.path());
        let share_url = format!(
            "https://twitter.com/intent/tweet?{}",
            ::url::form_urlencoded::Serializer::new(String::new())
                .append_pair("text", &post.title)
                .append_pair("url", &url)
                .finish()
        );
        let mut item = to_value(&PostView {
            post: PostCard::new(post),
            toc: &rendered.toc,
            has_toc: !rendered.toc.is_empty(),
            url,
            share_url,
            prev: self.posts.get(index + 1).map(PostCard::new),
            next: index
                .checked_sub(1)
                .and_then(|i| self.posts.get(i))
                .map(PostCard::new),
        })?;
        insert_raw(&mut item, "html", rendered.html.clone());

        let mut page = self.page("post", &post.path(), Some(&post.title), item);
        page.kind = "article";
        if !post.excerpt.is_empty() {
            page.description = post.excerpt.clone();
        }
        page.image = post.image.clone();
        page.keywords = post.tags.clone();
        Ok(page)
    }

    /// `/tags/`: every tag with its post count.
    pub fn tags(&self) -> Result<Page> {
        let tags = tag_entries(self.posts);
        let item = to_value(&TagsView {
            popular: popular_entries(self.posts, POPULAR_TAG_LIMIT),
            has_tags: !tags.is_empty(),
            tag_count: tags.len(),
            post_count: self.posts.len(),
            average_posts_per_tag: average(self.posts.len(), tags.len()),
            tags,
        })?;
        Ok(self.page("tags", "/tags/", Some("Tags"), item))
    }

    /// `/tags/<slug>/`: the posts listed under `tag`.
    pub fn tag(&self, tag: &Tag) -> Result<Page> {
        let posts = posts_on_page(self.posts, tag);
        let item = to_value(&TagView {
            tag: TagLink::new(tag),
            count: posts.len(),
            posts: cards(&posts),
        })?;
        let mut page = self.page("tag", &tag.path(), Some(&format!("#{}", tag.name)), item);
        page.description = format!("All posts about {}: {} in total", tag.name, posts.len());
        page.keywords = vec![tag.name.clone()];
        Ok(page)
    }

    /// `/search/`: the search form; results come from `search.json`.
    pub fn search(&self) -> Result<Page> {
        let tags = search::popular_tags(self.posts);
        let item = to_value(&SearchView {
            enabled: self.config.features().search,
            has_tags: !tags.is_empty(),
            tags,
            total: self.posts.len(),
        })?;
        Ok(self.page("search", "/search/", Some("Search"), item))
    }

    /// `/about/`.
    pub fn about(&self) -> Result<Page> {
        let about = self.config.about();
        let item = to_value(&AboutView {
            about,
            author: self.config.author(),
        })?;
        let mut page = self.page("about", "/about/", Some(&about.title), item);
        if !about.description.is_empty() {
            page.description = about.description.clone();
        }
        Ok(page)
    }

    /// `/subscribe/`.
    pub fn subscribe(&self) -> Result<Page> {
        let subscribe = self.config.subscribe();
        let title = subscribe.title.clone();
        let item = to_value(&SubscribeView {
            mailto: mailto(
                &self.config.author().email,
                &format!("Subscribe to {}", self.config.site().name),
            ),
            subscribe,
            pattern: EMAIL_PATTERN,
            rss: self.config.features().rss,
        })?;
        Ok(self.page("subscribe", "/subscribe/", Some(&title), item))
    }

    /// `/404.html`.
    pub fn not_found(&self) -> Result<Page> {
        let item = to_value(&Empty {})?;
        Ok(self.page("not_found", "/404.html", Some("Page not found"), item))
    }
}

fn average(total: usize, count: usize) -> usize {
    match count {
        0 => 0,
        _ => (total as f64 / count as f64).round() as usize,
    }
}
