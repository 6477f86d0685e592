//! Support for creating the RSS feed (`rss.xml`) from a list of posts.

use crate::config::SiteConfig;
use crate::post::PostMetadata;
use chrono::{DateTime, TimeZone, Utc};
use rss::validation::{Validate, ValidationError};
use rss::{CategoryBuilder, Channel, ChannelBuilder, GuidBuilder, Item, ItemBuilder};
use std::fmt;
use std::io::Write;

/// The number of most recent posts included in the feed.
pub const FEED_POST_LIMIT: usize = 20;

/// Creates the feed for `posts` (expected newest first) and writes it to `w`.
/// The channel is validated before anything is written.
pub fn write_feed<W: Write>(
    config: &SiteConfig,
    posts: &[PostMetadata],
    now: DateTime<Utc>,
    w: W,
) -> Result<()> {
    validated_feed(config, posts, now)?.write_to(w)?;
    Ok(())
}

/// Builds the feed channel and checks it against the RSS rules, so callers
/// can decide whether to write anything at all.
pub fn validated_feed(
    config: &SiteConfig,
    posts: &[PostMetadata],
    now: DateTime<Utc>,
) -> Result<Channel> {
    let channel = feed(config, posts, now);
    channel.validate()?;
    Ok(channel)
}

/// Builds the feed channel. Only the first [`FEED_POST_LIMIT`] posts are
/// included.
pub fn feed(config: &SiteConfig, posts: &[PostMetadata], now: DateTime<Utc>) -> Channel {
    let site = config.site();
    let editor = contact(config);
    let language = match site.language.is_empty() {
        true => None,
        false => Some(site.language.clone()),
    };
    ChannelBuilder::default()
        .title(site.title.clone())
        .link(config.absolute_url("/"))
        .description(site.description.clone())
        .language(language)
        .managing_editor(Some(editor.clone()))
        .webmaster(Some(editor))
        .last_build_date(Some(now.to_rfc2822()))
        .items(
            posts
                .iter()
                .take(FEED_POST_LIMIT)
                .map(|post| feed_item(config, post))
                .collect::<Vec<Item>>(),
        )
        .build()
}

fn feed_item(config: &SiteConfig, post: &PostMetadata) -> Item {
    let link = config.absolute_url(&post.path());

    // Posts carry a date only, so they're stamped at midnight UTC.
    let pub_date = post
        .published()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|midnight| Utc.from_utc_datetime(&midnight).to_rfc2822());

    ItemBuilder::default()
        .title(Some(post.title.clone()))
        .link(Some(link.clone()))
        .guid(Some(
            GuidBuilder::default().permalink(true).value(link).build(),
        ))
        .description(Some(post.excerpt.clone()))
        .pub_date(pub_date)
        .author(Some(contact(config)))
        .categories(
            post.tags
                .iter()
                .map(|tag| CategoryBuilder::default().name(tag.clone()).build())
                .collect::<Vec<_>>(),
        )
        .build()
}

// RSS wants people as `email (name)`.
fn contact(config: &SiteConfig) -> String {
    format!("{} ({})", config.author().email, config.author().name)
}

type Result<T> = std::result::Result<T, Error>;

/// Represents a problem creating a feed.
#[derive(Debug)]
pub enum Error {
    /// Returned when the channel fails RSS validation (e.g., the configured
    /// site URL isn't a URL).
    Validation(ValidationError),

    /// Returned when serializing or writing the feed fails.
    Rss(rss::Error),
}

impl fmt::Display for Error {
    /// Implements [`fmt::Display`] for [`Error`].
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Validation(err) => write!(f, "Validating RSS feed: {}", err),
            Error::Rss(err) => err.fmt(f),
        }
    }
}

impl std::error::Error for Error {
    /// Implements [`std::error::Error`] for [`Error`].
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Validation(err) => Some(err),
            Error::Rss(err) => Some(err),
        }
    }
}

impl From<ValidationError> for Error {
    /// Converts [`ValidationError`]s into [`Error`]. This allows us to use the
    /// `?` operator in fallible feed operations.
    fn from(err: ValidationError) -> Error {
        Error::Validation(err)
    }
}

impl From<rss::Error> for Error {
    /// Converts [`rss::Error`]s into [`Error`]. This allows us to use the `?`
    /// operator in fallible feed operations.
    fn from(err: rss::Error) -> Error {
        Error::Rss(err)
    }
}
