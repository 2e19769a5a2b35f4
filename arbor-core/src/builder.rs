//! Site building logic - sequences document discovery, the graph pass, and
//! the listing pass into a [`Site`].

use crate::config::Config;
use crate::frontmatter::FrontmatterError;
use crate::graph::GraphBuilder;
use crate::listing::ListingBuilder;
use crate::markdown::MarkdownProcessor;
use crate::models::Site;
use arbor_types::NodePath;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("frontmatter in {path}: {source}")]
    Frontmatter {
        path: PathBuf,
        #[source]
        source: FrontmatterError,
    },

    #[error("date in {path}: {source}")]
    Date {
        path: PathBuf,
        #[source]
        source: chrono::ParseError,
    },

    #[error("link target `{target}` in {path} resolves outside the input tree")]
    LinkOutsideTree { path: PathBuf, target: String },

    #[error("subdirectory {child} inside log directory {parent}")]
    LogSubdirectory { parent: PathBuf, child: PathBuf },
}

/// Main site builder
pub struct SiteBuilder {
    config: Config,
    input_dir: PathBuf,
}

impl SiteBuilder {
    pub fn new(config: Config, input_dir: impl Into<PathBuf>) -> Self {
        Self {
            config,
            input_dir: input_dir.into(),
        }
    }

    /// Build the whole site product.
    ///
    /// The graph pass runs first and to completion; the listing pass reads
    /// layouts, titles, and bodies that only exist afterwards. Any error
    /// aborts the build; a partial graph cannot be trusted by later steps.
    pub fn build(&self) -> Result<Site, BuildError> {
        let documents = self.discover_documents()?;

        tracing::info!("found {} documents", documents.len());

        let processor = MarkdownProcessor::new(
            self.config.code_highlight,
            &self.config.code_theme,
            self.config.keep_extension,
        );

        let mut site = Site {
            documents: documents.clone(),
            ..Default::default()
        };

        GraphBuilder {
            config: &self.config,
            input_dir: &self.input_dir,
            processor: &processor,
        }
        .run(&documents, &mut site)?;

        tracing::info!("extracted node graph and tag index");

        ListingBuilder {
            config: &self.config,
            input_dir: &self.input_dir,
        }
        .run(&mut site)?;

        tracing::info!("collected directory listings");

        Ok(site)
    }

    /// Every non-hidden markdown document under the input root, index
    /// documents moved last so their backlink sweep sees the rest of their
    /// directory first.
    fn discover_documents(&self) -> Result<Vec<NodePath>, BuildError> {
        let mut plain = Vec::new();
        let mut indexes = Vec::new();

        for entry in WalkDir::new(&self.input_dir).sort_by_file_name() {
            let entry = entry.map_err(walk_error)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("md") {
                continue;
            }
            if is_hidden(path, &self.input_dir) {
                continue;
            }

            let np = NodePath::new(path);
            if np.is_index() {
                indexes.push(np);
            } else {
                plain.push(np);
            }
        }

        plain.extend(indexes);
        Ok(plain)
    }
}

/// Whether any component of `path` below `root` starts with a dot.
pub(crate) fn is_hidden(path: &Path, root: &Path) -> bool {
    path.strip_prefix(root)
        .map(|rel| {
            rel.components()
                .any(|c| c.as_os_str().to_string_lossy().starts_with('.'))
        })
        .unwrap_or(false)
}

pub(crate) fn walk_error(err: walkdir::Error) -> BuildError {
    let path = err.path().map(Path::to_path_buf).unwrap_or_default();
    BuildError::Io {
        path,
        source: err
            .into_io_error()
            .unwrap_or_else(|| io::Error::other("filesystem loop")),
    }
}

/// Check for markdown anywhere beneath a directory.
pub(crate) fn has_documents(dir: &Path) -> Result<bool, BuildError> {
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(walk_error)?;
        if entry.file_type().is_file()
            && entry.path().extension().and_then(|e| e.to_str()) == Some("md")
        {
            return Ok(true);
        }
    }
    Ok(false)
}
