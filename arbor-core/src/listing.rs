//! Hierarchical listing generation: nodegroup enumeration, per-child
//! classification, the skip set, and missing-index synthesis.
//!
//! Runs strictly after the graph pass: child classification reads layouts,
//! titles, and bodies that only exist once every document's metadata is in
//! the node map.

use crate::builder::{has_documents, is_hidden, walk_error, BuildError};
use crate::config::Config;
use crate::convert;
use crate::models::{Layout, ListingLink, Metadata, Site};
use arbor_types::NodePath;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// A classified child of a nodegroup.
///
/// A directory child has two identities: the directory path itself (name,
/// href) and its index document (metadata lookups, pinning). The variant
/// keeps both, so the key switch is an explicit match instead of path
/// surgery.
enum ChildRef {
    Document(NodePath),
    Directory { index: NodePath },
}

impl ChildRef {
    /// The node-map key for title, description, and pin lookups.
    fn lookup_key(&self) -> &NodePath {
        match self {
            ChildRef::Document(path) => path,
            ChildRef::Directory { index } => index,
        }
    }

    fn is_dir(&self) -> bool {
        matches!(self, ChildRef::Directory { .. })
    }
}

pub(crate) struct ListingBuilder<'a> {
    pub config: &'a Config,
    pub input_dir: &'a Path,
}

impl ListingBuilder<'_> {
    pub fn run(&self, site: &mut Site) -> Result<(), BuildError> {
        let nodegroups = self.enumerate_nodegroups()?;

        tracing::debug!(count = nodegroups.len(), "enumerated nodegroups");

        for group in &nodegroups {
            self.list_children(group, site)?;
        }

        // Materialize an index node for every directory that lacks one; the
        // title is the directory's own name, and the synthesized document
        // joins the set downstream passes iterate
        for index in site.missing_indexes.clone() {
            let node = site.nodes.entry(index.clone()).or_default();
            node.metadata = Metadata {
                title: directory_name(&index),
                ..Default::default()
            };
            site.documents.push(index);
        }

        Ok(())
    }

    /// Every directory (the root included) with a markdown document
    /// somewhere beneath it. Anything else produces no listing.
    fn enumerate_nodegroups(&self) -> Result<Vec<PathBuf>, BuildError> {
        let mut groups = Vec::new();

        for entry in WalkDir::new(self.input_dir).sort_by_file_name() {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            if is_hidden(path, self.input_dir) {
                continue;
            }
            if !has_documents(path)? {
                continue;
            }

            groups.push(path.to_path_buf());
        }

        Ok(groups)
    }

    /// Classify the immediate children of one nodegroup and append their
    /// listing links under the group's index path.
    fn list_children(&self, group: &Path, site: &mut Site) -> Result<(), BuildError> {
        let index = NodePath::new(group).index_path();
        let is_log = site
            .nodes
            .get(&index)
            .map(|n| n.metadata.layout == Layout::Log)
            .unwrap_or(false);

        for child in sorted_children(group)? {
            let info = fs::metadata(&child).map_err(|source| BuildError::Io {
                path: child.clone(),
                source,
            })?;
            let is_dir = info.is_dir();

            // A log inlines its children's bodies; a nested directory has
            // nowhere to go
            if is_dir && is_log {
                return Err(BuildError::LogSubdirectory {
                    parent: group.to_path_buf(),
                    child,
                });
            }

            if is_dir && !has_documents(&child)? {
                tracing::debug!(path = %child.display(), "skipping directory without documents");
                continue;
            }

            if is_hidden(&child, self.input_dir) {
                continue;
            }

            let is_markdown = child.extension().and_then(|e| e.to_str()) == Some("md");
            if !is_dir && !is_markdown {
                continue;
            }

            let child_np = NodePath::new(child.clone());

            // Indexes never list themselves as their own children
            if child_np.stem() == "index" {
                continue;
            }

            // Unlisted children are hidden on request; drafts are not
            // published at all
            if site
                .nodes
                .get(&child_np)
                .map(|n| n.metadata.unlisted || n.metadata.draft)
                .unwrap_or(false)
            {
                continue;
            }

            // Checks passed: the child is visible
            site.skip.insert(child_np.clone(), is_log);

            let child_ref = if is_dir {
                let child_index = child_np.index_path();
                match fs::metadata(child_index.as_path()) {
                    Ok(_) => {}
                    Err(e) if e.kind() == io::ErrorKind::NotFound => {
                        site.missing_indexes.insert(child_index.clone());
                    }
                    Err(source) => {
                        return Err(BuildError::Io {
                            path: child_index.as_path().to_path_buf(),
                            source,
                        })
                    }
                }
                ChildRef::Directory { index: child_index }
            } else {
                ChildRef::Document(child_np)
            };

            let link = self.listing_link(&child_ref, group, is_log, site)?;

            let pinned = site
                .nodes
                .get(child_ref.lookup_key())
                .map(|n| n.metadata.pinned)
                .unwrap_or(false);

            let entries = site.listings.entry(index.clone()).or_default();
            if pinned {
                entries.insert(0, link);
            } else {
                entries.push(link);
            }
        }

        Ok(())
    }

    /// Build one listing link for a classified child.
    fn listing_link(
        &self,
        child: &ChildRef,
        group: &Path,
        is_log: bool,
        site: &Site,
    ) -> Result<ListingLink, BuildError> {
        let mut link = ListingLink {
            is_dir: child.is_dir(),
            ..Default::default()
        };

        match child {
            ChildRef::Directory { index } => {
                // Name and href come from the directory itself
                let name = directory_name(index);
                link.href = if self.config.keep_extension {
                    format!("{name}/index.html")
                } else {
                    name.clone()
                };
                link.title = name;
            }
            ChildRef::Document(path) => {
                link.href = format!("{}{}", path.href_stem(group), self.config.ext());
            }
        }

        let key = child.lookup_key();
        let node = site.nodes.get(key);

        // An explicit frontmatter title wins; files fall back to the
        // filename stem, directories already carry their name
        if let Some(node) = node {
            if !node.metadata.title.is_empty() {
                link.title = node.metadata.title.clone();
            }
            link.description = node.metadata.description.clone();
        }
        if link.title.is_empty() && !child.is_dir() {
            link.title = key.stem().to_string();
        }

        if is_log {
            if let Some(node) = node {
                link.body_html = node.body.clone();
                (link.date, link.machine_date) =
                    convert::date(&node.metadata.date).map_err(|source| BuildError::Date {
                        path: key.as_path().to_path_buf(),
                        source,
                    })?;
                (link.date_updated, link.machine_date_updated) =
                    convert::date(&node.metadata.date_updated).map_err(|source| {
                        BuildError::Date {
                            path: key.as_path().to_path_buf(),
                            source,
                        }
                    })?;
                link.tags = node.metadata.tags.clone();
            }
        }

        Ok(link)
    }
}

fn sorted_children(dir: &Path) -> Result<Vec<PathBuf>, BuildError> {
    let entries = fs::read_dir(dir).map_err(|source| BuildError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut children = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|source| BuildError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
        children.push(entry.path());
    }

    // Deterministic child order regardless of filesystem enumeration
    children.sort();
    Ok(children)
}

/// The owning directory's name for an index path: `a/b/c/index.md` -> `c`.
fn directory_name(index: &NodePath) -> String {
    index
        .as_path()
        .parent()
        .and_then(|d| d.file_name())
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: Config,
        site: Site,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                config: Config::default(),
                site: Site::default(),
            }
        }

        fn write(&self, rel: &str, content: &str) -> NodePath {
            let path = self.dir.path().join(rel);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent).unwrap();
            }
            fs::write(&path, content).unwrap();
            NodePath::new(path)
        }

        /// Seed a node the way the graph pass would have.
        fn seed(&mut self, np: &NodePath, metadata: Metadata, body: &str) {
            self.site.nodes.insert(
                np.clone(),
                Node {
                    metadata,
                    body: body.to_string(),
                    ..Default::default()
                },
            );
        }

        fn run(&mut self) -> Result<(), BuildError> {
            let builder = ListingBuilder {
                config: &self.config,
                input_dir: self.dir.path(),
            };
            let mut site = std::mem::take(&mut self.site);
            let result = builder.run(&mut site);
            self.site = site;
            result
        }

        fn root_index(&self) -> NodePath {
            NodePath::new(self.dir.path()).index_path()
        }
    }

    #[test]
    fn test_missing_index_synthesis() {
        let mut fx = Fixture::new();
        let c = fx.write("sub/c.md", "text");
        fx.seed(&c, Metadata::default(), "");

        fx.run().unwrap();

        let synthesized = NodePath::new(fx.dir.path().join("sub/index.md"));
        assert!(fx.site.missing_indexes.contains(&synthesized));
        assert_eq!(fx.site.nodes[&synthesized].metadata.title, "sub");
        assert!(fx.site.documents.contains(&synthesized));

        // The root listing has one directory entry for "sub"
        let listing = fx.site.listing(&fx.root_index());
        assert_eq!(listing.len(), 1);
        assert!(listing[0].is_dir);
        assert_eq!(listing[0].title, "sub");
        assert_eq!(listing[0].href, "sub/index.html");
    }

    #[test]
    fn test_literal_index_not_synthesized() {
        let mut fx = Fixture::new();
        let idx = fx.write("sub/index.md", "---\ntitle: The Sub\n---\ntext");
        let c = fx.write("sub/c.md", "text");
        fx.seed(
            &idx,
            Metadata {
                title: "The Sub".into(),
                ..Default::default()
            },
            "",
        );
        fx.seed(&c, Metadata::default(), "");

        fx.run().unwrap();

        assert!(fx.site.missing_indexes.is_empty());
        // The directory entry takes its title from the literal index
        let listing = fx.site.listing(&fx.root_index());
        assert_eq!(listing[0].title, "The Sub");
    }

    #[test]
    fn test_pinned_entries_come_first() {
        let mut fx = Fixture::new();
        let a = fx.write("a.md", "text");
        let b = fx.write("b.md", "text");
        let z = fx.write("z.md", "text");
        fx.seed(&a, Metadata::default(), "");
        fx.seed(
            &z,
            Metadata {
                pinned: true,
                ..Default::default()
            },
            "",
        );
        fx.seed(&b, Metadata::default(), "");

        fx.run().unwrap();

        let listing = fx.site.listing(&fx.root_index());
        let titles: Vec<_> = listing.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["z", "a", "b"]);
    }

    #[test]
    fn test_log_children_skipped_and_enriched() {
        let mut fx = Fixture::new();
        let idx = fx.write("log/index.md", "---\nlayout: log\n---\ntext");
        let e1 = fx.write("log/entry1.md", "---\ndate: 2024-01-02\n---\nfirst");
        let e2 = fx.write("log/entry2.md", "second");
        fx.seed(
            &idx,
            Metadata {
                layout: Layout::Log,
                ..Default::default()
            },
            "",
        );
        fx.seed(
            &e1,
            Metadata {
                date: "2024-01-02".into(),
                tags: vec!["x".into()],
                ..Default::default()
            },
            "<p>first</p>",
        );
        fx.seed(&e2, Metadata::default(), "<p>second</p>");

        fx.run().unwrap();

        assert_eq!(fx.site.skip.get(&e1), Some(&true));
        assert_eq!(fx.site.skip.get(&e2), Some(&true));

        let log_index = NodePath::new(fx.dir.path().join("log")).index_path();
        let listing = fx.site.listing(&log_index);
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].body_html, "<p>first</p>");
        assert_eq!(listing[0].date, "02 Jan 2024");
        assert!(listing[0].machine_date.starts_with("2024-01-02T00:00:00"));
        assert_eq!(listing[0].tags, vec!["x"]);
        // No date in the second entry: empty strings, not an error
        assert_eq!(listing[1].date, "");
        assert_eq!(listing[1].machine_date, "");
    }

    #[test]
    fn test_subdirectory_in_log_is_fatal() {
        let mut fx = Fixture::new();
        let idx = fx.write("log/index.md", "---\nlayout: log\n---\ntext");
        fx.write("log/nested/entry.md", "text");
        fx.seed(
            &idx,
            Metadata {
                layout: Layout::Log,
                ..Default::default()
            },
            "",
        );

        let err = fx.run().unwrap_err();
        assert!(matches!(err, BuildError::LogSubdirectory { .. }));
    }

    #[test]
    fn test_non_log_children_not_suppressed() {
        let mut fx = Fixture::new();
        let a = fx.write("a.md", "text");
        fx.seed(&a, Metadata::default(), "");

        fx.run().unwrap();

        assert_eq!(fx.site.skip.get(&a), Some(&false));
        assert!(!fx.site.is_skipped(&a));
    }

    #[test]
    fn test_unlisted_draft_hidden_and_foreign_skipped() {
        let mut fx = Fixture::new();
        let a = fx.write("a.md", "text");
        let u = fx.write("u.md", "---\nunlisted: true\n---\ntext");
        let d = fx.write("d.md", "---\ndraft: true\n---\ntext");
        fx.write(".hidden/h.md", "text");
        fx.write("style.css", "body {}");
        fx.seed(&a, Metadata::default(), "");
        fx.seed(
            &u,
            Metadata {
                unlisted: true,
                ..Default::default()
            },
            "",
        );
        fx.seed(
            &d,
            Metadata {
                draft: true,
                ..Default::default()
            },
            "",
        );

        fx.run().unwrap();

        let listing = fx.site.listing(&fx.root_index());
        let titles: Vec<_> = listing.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["a"]);
    }

    #[test]
    fn test_empty_directory_dropped() {
        let mut fx = Fixture::new();
        let a = fx.write("a.md", "text");
        fs::create_dir_all(fx.dir.path().join("empty")).unwrap();
        fx.write("assets-only/pic.png", "");
        fx.seed(&a, Metadata::default(), "");

        fx.run().unwrap();

        let listing = fx.site.listing(&fx.root_index());
        assert_eq!(listing.len(), 1);
        assert!(fx.site.missing_indexes.is_empty());
    }

    #[test]
    fn test_malformed_log_date_is_fatal() {
        let mut fx = Fixture::new();
        let idx = fx.write("log/index.md", "---\nlayout: log\n---\ntext");
        let e = fx.write("log/e.md", "text");
        fx.seed(
            &idx,
            Metadata {
                layout: Layout::Log,
                ..Default::default()
            },
            "",
        );
        fx.seed(
            &e,
            Metadata {
                date: "bogus".into(),
                ..Default::default()
            },
            "",
        );

        let err = fx.run().unwrap_err();
        assert!(matches!(err, BuildError::Date { .. }));
    }

    #[test]
    fn test_file_title_falls_back_to_stem() {
        let mut fx = Fixture::new();
        let a = fx.write("notes.md", "text");
        fx.seed(&a, Metadata::default(), "");

        fx.run().unwrap();

        let listing = fx.site.listing(&fx.root_index());
        assert_eq!(listing[0].title, "notes");
        assert_eq!(listing[0].href, "notes.html");
    }
}
