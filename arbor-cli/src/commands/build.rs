//! Build command implementation.
//!
//! Sequences the two core passes, then fans out the independent consumers
//! (page rendering, feed, asset copying) as parallel task groups. Each group
//! joins all of its jobs and the first error aborts the build.

use crate::feed;
use anyhow::{Context, Result};
use arbor_core::{convert, Config, Layout, Site, SiteBuilder};
use arbor_render::{CrumbEntry, PageTemplate, TagsTemplate};
use arbor_types::NodePath;
use askama::Template;
use include_dir::{include_dir, Dir};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;

// Default stylesheet bundle, embedded so it survives cargo install
static STATIC_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

const STATIC_OUTPUT_DIR: &str = "static";

pub async fn build_site(
    config_path: &Path,
    input: &Path,
    output: &Path,
    dry_run: bool,
) -> Result<()> {
    tracing::info!("loading config from {:?}", config_path);
    let config = Config::from_file(config_path).context("Failed to load configuration")?;

    let input_dir = std::path::absolute(input).context("Failed to resolve input directory")?;
    let output_dir = std::path::absolute(output).context("Failed to resolve output directory")?;

    if !dry_run {
        fs::create_dir_all(&output_dir).context("Failed to create output directory")?;
        clean_output_dir(&output_dir)?;
    }

    // The two build passes are strictly sequential; only the downstream
    // consumers fan out
    let builder = SiteBuilder::new(config.clone(), &input_dir);
    let site = builder.build().context("Failed to build site")?;

    tracing::info!("built {} documents", site.documents.len());

    let config = Arc::new(config);
    let site = Arc::new(site);
    let input_dir = Arc::new(input_dir);
    let output_dir = Arc::new(output_dir);

    let mut jobs: JoinSet<Result<()>> = JoinSet::new();

    {
        let (config, site, input_dir, output_dir) = (
            config.clone(),
            site.clone(),
            input_dir.clone(),
            output_dir.clone(),
        );
        jobs.spawn(
            async move { render_pages(&config, &site, &input_dir, &output_dir, dry_run).await },
        );
    }

    {
        let (config, site, output_dir) = (config.clone(), site.clone(), output_dir.clone());
        jobs.spawn(async move { feed::write_feed(&config, &site, &output_dir, dry_run) });
    }

    {
        let (site, input_dir, output_dir) = (site.clone(), input_dir.clone(), output_dir.clone());
        jobs.spawn(async move { copy_assets(&site, &input_dir, &output_dir, dry_run).await });
    }

    // First error wins; dropping the set cancels whatever is still running
    while let Some(joined) = jobs.join_next().await {
        joined.context("background task failed")??;
    }

    if dry_run {
        tracing::info!("dry run complete, nothing written");
    } else {
        tracing::info!("site written to {:?}", output_dir);
    }

    Ok(())
}

/// Remove previous build products, keeping the static bundle directory.
fn clean_output_dir(output_dir: &Path) -> Result<()> {
    let entries = fs::read_dir(output_dir)
        .with_context(|| format!("Failed to read output directory {:?}", output_dir))?;

    for entry in entries {
        let entry = entry?;
        if entry.file_name() == STATIC_OUTPUT_DIR {
            continue;
        }

        let path = entry.path();
        let result = if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)
        } else {
            fs::remove_file(&path)
        };
        result.with_context(|| format!("Failed to remove {:?}", path))?;
    }

    Ok(())
}

/// Render every visible page as its own job, then the tag index page.
async fn render_pages(
    config: &Arc<Config>,
    site: &Arc<Site>,
    input_dir: &Arc<PathBuf>,
    output_dir: &Arc<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    let mut jobs: JoinSet<Result<()>> = JoinSet::new();

    for np in &site.documents {
        // Drafts never render; log children are inlined into their parent
        let draft = site
            .nodes
            .get(np)
            .map(|n| n.metadata.draft)
            .unwrap_or(false);
        if draft || site.is_skipped(np) {
            continue;
        }

        let (config, site, input_dir, output_dir, np) = (
            config.clone(),
            site.clone(),
            input_dir.clone(),
            output_dir.clone(),
            np.clone(),
        );
        jobs.spawn_blocking(move || {
            render_page(&config, &site, &np, &input_dir, &output_dir, dry_run)
        });
    }

    while let Some(joined) = jobs.join_next().await {
        joined.context("render task failed")??;
    }

    render_tags_page(config, site, output_dir, dry_run)?;

    tracing::debug!("finished rendering all pages");

    Ok(())
}

/// Render a single page
fn render_page(
    config: &Config,
    site: &Site,
    np: &NodePath,
    input_dir: &Path,
    output_dir: &Path,
    dry_run: bool,
) -> Result<()> {
    let Some(node) = site.nodes.get(np) else {
        return Ok(());
    };
    let metadata = &node.metadata;

    let (crumb_titles, crumb_links) = convert::nav_crumbs(np, input_dir, config.keep_extension);
    let crumbs: Vec<CrumbEntry> = crumb_titles
        .into_iter()
        .zip(crumb_links)
        .map(|(title, href)| CrumbEntry { href, title })
        .collect();

    let (date, machine_date) =
        convert::date(&metadata.date).with_context(|| format!("invalid date in {np}"))?;
    let (date_updated, machine_date_updated) = convert::date(&metadata.date_updated)
        .with_context(|| format!("invalid dateUpdated in {np}"))?;

    let filename = np.stem().to_string();
    let title = convert::title(&metadata.title, &filename);

    let href_stem = np.href_stem(input_dir);
    let url = if config.url.is_empty() {
        String::new()
    } else {
        format!(
            "{}/{}{}",
            config.url.trim_end_matches('/'),
            href_stem,
            config.ext()
        )
    };

    // The tag listing appears on the root index only
    let root_index = NodePath::new(input_dir.join("index.md"));
    let tags_listing = if *np == root_index {
        site.tags.clone()
    } else {
        Vec::new()
    };

    let template = PageTemplate {
        wiki_title: config.title.clone(),
        url,
        head: config.head.clone(),
        root_crumb: config.root_crumb.clone(),
        footer: config.footer.clone(),
        title,
        description: metadata.description.clone(),
        filename,
        date,
        date_updated,
        machine_date,
        machine_date_updated,
        tags: metadata.tags.clone(),
        show_header: metadata.show_header,
        body: node.body.clone(),
        layout_log: metadata.layout == Layout::Log,
        crumbs,
        listing: site.listing(np).to_vec(),
        backlinks: node.backlinks.clone(),
        related_links: node.related_links.clone(),
        tags_listing,
    };

    let html = template.render().context("Failed to render page template")?;

    if dry_run {
        return Ok(());
    }

    let out_path = output_dir.join(format!("{href_stem}.html"));
    if let Some(parent) = out_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {:?}", parent))?;
    }
    fs::write(&out_path, html).with_context(|| format!("Failed to write {:?}", out_path))?;

    tracing::debug!("rendered {:?}", out_path);

    Ok(())
}

/// Render the tag index page
fn render_tags_page(
    config: &Config,
    site: &Site,
    output_dir: &Path,
    dry_run: bool,
) -> Result<()> {
    let template = TagsTemplate {
        wiki_title: config.title.clone(),
        root_crumb: config.root_crumb.clone(),
        footer: config.footer.clone(),
        tags: site.tags.clone(),
    };

    let html = template.render().context("Failed to render tags template")?;

    if !dry_run {
        fs::write(output_dir.join("tags.html"), html).context("Failed to write tags.html")?;
    }

    Ok(())
}

/// Copy user assets concurrently, then extract the embedded static bundle.
async fn copy_assets(
    site: &Arc<Site>,
    input_dir: &Arc<PathBuf>,
    output_dir: &Arc<PathBuf>,
    dry_run: bool,
) -> Result<()> {
    if dry_run {
        return Ok(());
    }

    let mut jobs: JoinSet<Result<()>> = JoinSet::new();

    for asset in &site.assets {
        let asset = asset.clone();
        let (input_dir, output_dir) = (input_dir.clone(), output_dir.clone());

        jobs.spawn_blocking(move || {
            // Preserve the tree shape: in/a/b/pic.png -> out/a/b/pic.png
            let rel = asset
                .as_path()
                .strip_prefix(input_dir.as_path())
                .unwrap_or(asset.as_path());
            let target = output_dir.join(rel);

            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory {:?}", parent))?;
            }
            fs::copy(asset.as_path(), &target)
                .with_context(|| format!("Failed to copy {:?} to {:?}", asset.as_path(), target))?;

            Ok(())
        });
    }

    while let Some(joined) = jobs.join_next().await {
        joined.context("asset task failed")??;
    }

    extract_embedded_static(&output_dir.join(STATIC_OUTPUT_DIR))?;

    tracing::debug!("copied {} user assets", site.assets.len());

    Ok(())
}

fn extract_embedded_static(dest: &Path) -> Result<()> {
    for entry in STATIC_ASSETS.entries() {
        extract_entry(entry, dest)?;
    }
    Ok(())
}

fn extract_entry(entry: &include_dir::DirEntry, dest: &Path) -> Result<()> {
    match entry {
        include_dir::DirEntry::Dir(dir) => {
            for sub_entry in dir.entries() {
                extract_entry(sub_entry, dest)?;
            }
        }
        include_dir::DirEntry::File(file) => {
            let target = dest.join(file.path());
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, file.contents())
                .with_context(|| format!("Failed to write embedded static file to {:?}", target))?;
        }
    }
    Ok(())
}
