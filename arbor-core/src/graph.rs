//! Content graph construction: backlinks, assets, tag index, related links.
//!
//! Two strictly ordered passes over the document list. Pass one records
//! every document's metadata, body, and href, and accumulates cross-document
//! data (backlinks by target, tag listings). Pass two derives related links
//! from the completed tag index, so it must not start before pass one has
//! seen every document.

use crate::builder::BuildError;
use crate::config::{Config, LinkPolicy};
use crate::convert;
use crate::frontmatter::parse_frontmatter;
use crate::markdown::MarkdownProcessor;
use crate::models::{ListingLink, Site, Tag};
use arbor_types::{AssetPath, NodePath};
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Component, Path, PathBuf};

pub(crate) struct GraphBuilder<'a> {
    pub config: &'a Config,
    pub input_dir: &'a Path,
    pub processor: &'a MarkdownProcessor,
}

impl GraphBuilder<'_> {
    pub fn run(&self, documents: &[NodePath], site: &mut Site) -> Result<(), BuildError> {
        // Backlinks accumulate here during the sweep and land on the node
        // map as one batch write per target afterwards, so no foreign node
        // is mutated mid-iteration.
        let mut backlink_map: BTreeMap<NodePath, Vec<ListingLink>> = BTreeMap::new();
        let mut tag_index: BTreeMap<String, Tag> = BTreeMap::new();

        for np in documents {
            let raw = fs::read_to_string(np.as_path()).map_err(|source| BuildError::Io {
                path: np.as_path().to_path_buf(),
                source,
            })?;

            let (metadata, body) =
                parse_frontmatter(&raw).map_err(|source| BuildError::Frontmatter {
                    path: np.as_path().to_path_buf(),
                    source,
                })?;

            if metadata.draft {
                // Record the metadata so later draft checks can see it,
                // nothing else
                tracing::debug!(path = %np, "skipping draft");
                site.nodes.entry(np.clone()).or_default().metadata = metadata;
                continue;
            }

            let mut href = np.href_stem(self.input_dir);
            href.push_str(self.config.ext());

            let body_html = self.processor.render(&body, metadata.toc);
            let links = self.processor.extract_links(&body);

            tracing::debug!(
                path = %np,
                backlinks = links.backlinks.len(),
                images = links.images.len(),
                "extracted links"
            );

            let link = ListingLink {
                href: href.clone(),
                title: convert::title(&metadata.title, np.stem()),
                description: metadata.description.clone(),
                is_dir: np.is_index(),
                ..Default::default()
            };

            // Embedded images become assets to copy
            for target in &links.images {
                if let Some(resolved) = self.resolve_target(np, target)? {
                    site.assets.insert(AssetPath::new(resolved));
                }
            }

            // A wikilink target with an extension is a plain-file reference
            // (a linked rather than embedded image, say); anything else
            // names a document and records a backlink on it
            for target in &links.backlinks {
                let Some(resolved) = self.resolve_target(np, target)? else {
                    continue;
                };

                if resolved.extension().is_some() {
                    site.assets.insert(AssetPath::new(resolved));
                    continue;
                }

                let mut doc = resolved.into_os_string();
                doc.push(".md");
                backlink_map
                    .entry(NodePath::new(PathBuf::from(doc)))
                    .or_default()
                    .push(link.clone());
            }

            for name in &metadata.tags {
                let tag = tag_index.entry(name.clone()).or_insert_with(|| Tag {
                    name: name.clone(),
                    ..Default::default()
                });
                tag.count += 1;
                tag.links.push(link.clone());
            }

            let node = site.nodes.entry(np.clone()).or_default();
            node.href = href;
            node.body = body_html;
            node.metadata = metadata;
        }

        for (target, links) in backlink_map {
            site.nodes.entry(target).or_default().backlinks.extend(links);
        }

        // Pass two: documents sharing a tag are related
        for np in documents {
            let (draft, tags) = match site.nodes.get(np) {
                Some(node) => (node.metadata.draft, node.metadata.tags.clone()),
                None => continue,
            };

            if draft || tags.is_empty() {
                continue;
            }

            let related = self.related_links(np, &tags, &tag_index);

            if let Some(node) = site.nodes.get_mut(np) {
                node.related_links = related;
            }
        }

        // BTreeMap iteration gives the final ascending-by-name order
        site.tags = tag_index.into_values().collect();

        Ok(())
    }

    /// The union of all listings under `tags`, deduplicated by
    /// extension-stripped href and never containing `np` itself.
    fn related_links(
        &self,
        np: &NodePath,
        tags: &[String],
        tag_index: &BTreeMap<String, Tag>,
    ) -> Vec<ListingLink> {
        let own_stem = np.as_path().with_extension("");
        let mut seen: HashSet<String> = HashSet::new();
        let mut related = Vec::new();

        for name in tags {
            let Some(tag) = tag_index.get(name) else {
                continue;
            };

            for link in &tag.links {
                let stem = href_stem(&link.href);
                if self.input_dir.join(&stem) == own_stem {
                    continue;
                }
                if !seen.insert(stem) {
                    continue;
                }
                related.push(link.clone());
            }
        }

        related
    }

    /// Resolve a reference target against the document's directory,
    /// lexically normalizing `.` and `..` components. Targets escaping the
    /// input tree are fatal under `strict` and dropped under `lenient`.
    fn resolve_target(
        &self,
        doc: &NodePath,
        target: &str,
    ) -> Result<Option<PathBuf>, BuildError> {
        let base = doc.as_path().parent().unwrap_or(self.input_dir);
        let joined = base.join(target);

        let mut resolved = PathBuf::new();
        for component in joined.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    resolved.pop();
                }
                other => resolved.push(other),
            }
        }

        if resolved.starts_with(self.input_dir) {
            return Ok(Some(resolved));
        }

        match self.config.link_policy {
            LinkPolicy::Strict => Err(BuildError::LinkOutsideTree {
                path: doc.as_path().to_path_buf(),
                target: target.to_string(),
            }),
            LinkPolicy::Lenient => {
                tracing::warn!(path = %doc, target, "dropping link outside the input tree");
                Ok(None)
            }
        }
    }
}

fn href_stem(href: &str) -> String {
    Path::new(href).with_extension("").to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        config: Config,
    }

    impl Fixture {
        fn new() -> Self {
            Self {
                dir: TempDir::new().unwrap(),
                config: Config::default(),
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

        fn run(&self, documents: &[NodePath]) -> Result<Site, BuildError> {
            let processor = MarkdownProcessor::new(false, "InspiredGitHub", true);
            let builder = GraphBuilder {
                config: &self.config,
                input_dir: self.dir.path(),
                processor: &processor,
            };
            let mut site = Site::default();
            site.documents = documents.to_vec();
            builder.run(documents, &mut site)?;
            Ok(site)
        }
    }

    #[test]
    fn test_backlink_symmetry() {
        let fx = Fixture::new();
        let a = fx.write("a.md", "---\ntitle: A\n---\nSee [[b]].");
        let b = fx.write("b.md", "---\ntitle: B\n---\nNothing here.");

        let site = fx.run(&[a, b.clone()]).unwrap();

        let backlinks = &site.nodes[&b].backlinks;
        assert_eq!(backlinks.len(), 1);
        assert_eq!(backlinks[0].href, "a.html");
        assert_eq!(backlinks[0].title, "A");
    }

    #[test]
    fn test_forward_reference_into_later_document() {
        let fx = Fixture::new();
        // a is processed before b exists in the node map; the write must
        // still land
        let a = fx.write("a.md", "[[sub/b]]");
        let b = fx.write("sub/b.md", "text");

        let site = fx.run(&[a, b.clone()]).unwrap();
        assert_eq!(site.nodes[&b].backlinks.len(), 1);
    }

    #[test]
    fn test_relative_backlink_target() {
        let fx = Fixture::new();
        let a = fx.write("sub/a.md", "[[../b]]");
        let b = fx.write("b.md", "text");

        let site = fx.run(&[a, b.clone()]).unwrap();
        assert_eq!(site.nodes[&b].backlinks.len(), 1);
        assert_eq!(site.nodes[&b].backlinks[0].href, "sub/a.html");
    }

    #[test]
    fn test_related_links_shared_tag() {
        let fx = Fixture::new();
        let a = fx.write("a.md", "---\ntitle: A\ntags: [x]\n---\ntext");
        let b = fx.write("b.md", "---\ntitle: B\ntags: [x]\n---\ntext");

        let site = fx.run(&[a.clone(), b.clone()]).unwrap();

        assert_eq!(site.tags.len(), 1);
        assert_eq!(site.tags[0].name, "x");
        assert_eq!(site.tags[0].count, 2);
        assert_eq!(site.tags[0].links.len(), 2);

        let a_related = &site.nodes[&a].related_links;
        assert_eq!(a_related.len(), 1);
        assert_eq!(a_related[0].title, "B");

        let b_related = &site.nodes[&b].related_links;
        assert_eq!(b_related.len(), 1);
        assert_eq!(b_related[0].title, "A");
    }

    #[test]
    fn test_related_links_dedup_and_self_exclusion() {
        let fx = Fixture::new();
        // Two shared tags would list each other twice without dedup
        let a = fx.write("a.md", "---\ntags: [x, y]\n---\ntext");
        let b = fx.write("b.md", "---\ntags: [x, y]\n---\ntext");

        let site = fx.run(&[a.clone(), b]).unwrap();

        let related = &site.nodes[&a].related_links;
        assert_eq!(related.len(), 1);
        assert!(related.iter().all(|l| l.href != "a.html"));
    }

    #[test]
    fn test_tags_sorted_ascending() {
        let fx = Fixture::new();
        let a = fx.write("a.md", "---\ntags: [zebra, apple, mango]\n---\ntext");

        let site = fx.run(&[a]).unwrap();
        let names: Vec<_> = site.tags.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["apple", "mango", "zebra"]);
    }

    #[test]
    fn test_draft_records_metadata_only() {
        let fx = Fixture::new();
        let d = fx.write("d.md", "---\ntitle: WIP\ndraft: true\ntags: [x]\n---\ntext");

        let site = fx.run(&[d.clone()]).unwrap();

        let node = &site.nodes[&d];
        assert!(node.metadata.draft);
        assert!(node.body.is_empty());
        assert!(node.href.is_empty());
        // Draft tags don't reach the tag index
        assert!(site.tags.is_empty());
        assert!(node.related_links.is_empty());
    }

    #[test]
    fn test_image_and_file_links_become_assets() {
        let fx = Fixture::new();
        let a = fx.write("sub/a.md", "![shot](shot.png)\n\n[[diagram.svg]]");

        let site = fx.run(&[a]).unwrap();

        let assets: Vec<_> = site
            .assets
            .iter()
            .map(|a| a.as_path().to_path_buf())
            .collect();
        assert!(assets.contains(&fx.dir.path().join("sub/shot.png")));
        assert!(assets.contains(&fx.dir.path().join("sub/diagram.svg")));
        // The file link produced no backlink target
        assert!(site.nodes.values().all(|n| n.backlinks.is_empty()));
    }

    #[test]
    fn test_strict_policy_rejects_escaping_link() {
        let fx = Fixture::new();
        let a = fx.write("a.md", "[[../../outside]]");

        let err = fx.run(&[a]).unwrap_err();
        assert!(matches!(err, BuildError::LinkOutsideTree { .. }));
    }

    #[test]
    fn test_lenient_policy_drops_escaping_link() {
        let mut fx = Fixture::new();
        fx.config.link_policy = LinkPolicy::Lenient;
        let a = fx.write("a.md", "[[../../outside]]\n\n[[b]]");
        let b = fx.write("b.md", "text");

        let site = fx.run(&[a, b.clone()]).unwrap();
        // The in-tree link still lands; the escaping one is gone
        assert_eq!(site.nodes[&b].backlinks.len(), 1);
    }

    #[test]
    fn test_unreadable_document_is_fatal() {
        let fx = Fixture::new();
        let missing = NodePath::new(fx.dir.path().join("absent.md"));

        let err = fx.run(&[missing]).unwrap_err();
        assert!(matches!(err, BuildError::Io { .. }));
    }

    #[test]
    fn test_index_backlink_marked_as_dir() {
        let fx = Fixture::new();
        let idx = fx.write("sub/index.md", "---\ntitle: Sub\n---\n[[../a]]");
        let a = fx.write("a.md", "text");

        let site = fx.run(&[a.clone(), idx]).unwrap();
        let backlinks = &site.nodes[&a].backlinks;
        assert_eq!(backlinks.len(), 1);
        assert!(backlinks[0].is_dir);
    }
}
