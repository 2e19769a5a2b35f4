//! # arbor-core
//!
//! Core library for the arbor site generator: configuration, frontmatter
//! decoding, the markdown engine, and the two build passes (content graph,
//! hierarchical listings) that turn a source tree into a [`models::Site`].

pub mod builder;
pub mod config;
pub mod convert;
pub mod frontmatter;
pub mod markdown;
pub mod models;

mod graph;
mod listing;

pub use builder::{BuildError, SiteBuilder};
pub use config::{Config, ConfigError, FooterLink, LinkPolicy};
pub use frontmatter::{parse_frontmatter, FrontmatterError};
pub use markdown::MarkdownProcessor;
pub use models::{Layout, ListingLink, Metadata, Node, Site, Tag};
