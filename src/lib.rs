//! The library code for the `techblog` static site generator. A build goes
//! through three steps:
//!
//! 1. Loading the site configuration ([`crate::config`]) and parsing posts
//!    from MDX sources on disk ([`crate::parser`], [`crate::post`])
//! 2. Building the pages of the site from those posts ([`crate::page`]),
//!    rendering post bodies along the way ([`crate::markdown`])
//! 3. Templating the pages into the theme's layout and writing them to disk
//!    ([`crate::write`]), followed by the feed, sitemap, and search index
//!
//! [`crate::build::build_site`] runs all of them. The in-memory queries
//! (search, tag counts, statistics) are also usable on their own, which is
//! what the `search`, `tags`, and `stats` commands do.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod config;
pub mod feed;
pub mod htmlrenderer;
pub mod logging;
pub mod markdown;
pub mod page;
pub mod parser;
pub mod post;
pub mod search;
pub mod sitemap;
pub mod stats;
pub mod subscribe;
pub mod tag;
pub mod theme;
pub mod url;
pub mod value;
pub mod write;
