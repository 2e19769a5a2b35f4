//! Content model structs for nodes, listing links, tags, and the site product.

use arbor_types::{AssetPath, NodePath};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Directory listing mode declared in frontmatter.
///
/// `log` inlines children's bodies into the parent's listing; anything else
/// behaves as a plain `list`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    Log,
    #[default]
    List,
}

impl<'de> Deserialize<'de> for Layout {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(match raw.as_str() {
            "log" => Layout::Log,
            _ => Layout::List,
        })
    }
}

/// Frontmatter metadata decoded from a document.
///
/// Defaults: `show_header` true, `layout` list, everything else false or
/// empty. Dates stay in their source `YYYY-MM-DD` form until a consumer
/// needs them (see [`crate::convert::date`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Metadata {
    pub title: String,
    pub description: String,
    pub date: String,
    pub date_updated: String,
    pub layout: Layout,
    pub tags: Vec<String>,
    pub pinned: bool,
    pub unlisted: bool,
    pub draft: bool,
    pub toc: bool,
    pub show_header: bool,
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            date: String::new(),
            date_updated: String::new(),
            layout: Layout::List,
            tags: Vec::new(),
            pinned: false,
            unlisted: false,
            draft: false,
            toc: false,
            show_header: true,
        }
    }
}

/// One document's computed state.
///
/// Created lazily (zero-value) the first time a pass touches it; the node
/// map in [`Site`] is the sole owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Node {
    /// Public URL path, relative to the site root.
    pub href: String,

    /// Decoded frontmatter.
    pub metadata: Metadata,

    /// Rendered HTML body.
    pub body: String,

    /// Documents linking here, in discovery order.
    pub backlinks: Vec<ListingLink>,

    /// Documents sharing a tag with this one, deduplicated.
    pub related_links: Vec<ListingLink>,
}

/// A denormalized link summary, used for backlinks, related links, and
/// directory listings alike. Value type, copied into whichever collection
/// needs it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingLink {
    pub href: String,
    pub title: String,
    pub description: String,
    pub is_dir: bool,

    // The rest is populated only for entries of a log-view directory.
    pub body_html: String,
    pub date: String,
    pub date_updated: String,
    pub machine_date: String,
    pub machine_date_updated: String,
    pub tags: Vec<String>,
}

/// A tag with its reference count and the documents carrying it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
    pub count: usize,
    pub links: Vec<ListingLink>,
}

/// The read-only product of a build, handed to the renderer and the feed
/// writer. Both passes mutate it during construction; downstream consumers
/// only read.
#[derive(Debug, Clone, Default)]
pub struct Site {
    /// Authoritative map from document path to computed node.
    pub nodes: HashMap<NodePath, Node>,

    /// Every document to process downstream, including synthesized indexes.
    pub documents: Vec<NodePath>,

    /// Ordered visible children per directory index path.
    pub listings: HashMap<NodePath, Vec<ListingLink>>,

    /// Child path -> whether its parent is a log (true means: do not render
    /// a standalone page).
    pub skip: HashMap<NodePath, bool>,

    /// Index paths synthesized for directories without a literal index.
    pub missing_indexes: BTreeSet<NodePath>,

    /// Final tag sequence, ascending by name.
    pub tags: Vec<Tag>,

    /// Assets referenced from documents, to be copied verbatim.
    pub assets: BTreeSet<AssetPath>,
}

impl Site {
    pub fn node(&self, path: &NodePath) -> Option<&Node> {
        self.nodes.get(path)
    }

    /// Listing entries for a directory's index path; empty when none.
    pub fn listing(&self, index: &NodePath) -> &[ListingLink] {
        self.listings.get(index).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Whether a document's standalone page is suppressed by a log parent.
    pub fn is_skipped(&self, path: &NodePath) -> bool {
        self.skip.get(path).copied().unwrap_or(false)
    }
}
