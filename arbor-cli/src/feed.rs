//! Atom feed construction and writing.

use anyhow::{Context, Result};
use arbor_core::{convert, Config, Site};
use arbor_types::NodePath;
use chrono::{NaiveDate, NaiveTime, Utc};
use std::fs;
use std::path::Path;

/// Construct the Atom document: one entry per non-draft document carrying a
/// date, newest first. Log children belong here even though they render no
/// standalone page; their parent's log view is the site-side counterpart.
pub fn construct(config: &Config, site: &Site) -> Result<String> {
    let mut dated: Vec<(NaiveDate, &NodePath)> = Vec::new();

    for np in &site.documents {
        let Some(node) = site.nodes.get(np) else {
            continue;
        };
        if node.metadata.draft || node.metadata.date.is_empty() {
            continue;
        }

        let date = NaiveDate::parse_from_str(&node.metadata.date, "%Y-%m-%d")
            .with_context(|| format!("invalid date in {np}"))?;
        dated.push((date, np));
    }

    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut entries = String::new();
    for (date, np) in &dated {
        let Some(node) = site.nodes.get(np) else {
            continue;
        };

        let title = convert::title(&node.metadata.title, np.stem());
        let link = absolute_url(&config.url, &node.href);
        let updated = date.and_time(NaiveTime::MIN).and_utc().to_rfc3339();

        entries.push_str(&format!(
            "  <entry>\n    <title>{}</title>\n    <link href=\"{}\"/>\n    <id>{}</id>\n    <updated>{}</updated>\n",
            escape_xml(&title),
            escape_xml(&link),
            escape_xml(&link),
            updated,
        ));

        if !node.metadata.description.is_empty() {
            entries.push_str(&format!(
                "    <summary type=\"html\">{}</summary>\n",
                escape_xml(&node.metadata.description)
            ));
        }

        entries.push_str(&format!(
            "    <content type=\"html\">{}</content>\n",
            escape_xml(&node.body)
        ));

        for tag in &node.metadata.tags {
            entries.push_str(&format!("    <category term=\"{}\"/>\n", escape_xml(tag)));
        }

        entries.push_str("  </entry>\n");
    }

    // The feed timestamp follows the newest entry; an empty feed falls back
    // to build time
    let updated = dated
        .first()
        .map(|(d, _)| d.and_time(NaiveTime::MIN).and_utc().to_rfc3339())
        .unwrap_or_else(|| Utc::now().to_rfc3339());

    let mut author = String::new();
    if !config.author_name.is_empty() {
        author.push_str("  <author>\n");
        author.push_str(&format!(
            "    <name>{}</name>\n",
            escape_xml(&config.author_name)
        ));
        if !config.author_email.is_empty() {
            author.push_str(&format!(
                "    <email>{}</email>\n",
                escape_xml(&config.author_email)
            ));
        }
        author.push_str("  </author>\n");
    }

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<feed xmlns=\"http://www.w3.org/2005/Atom\">\n");
    xml.push_str(&format!("  <title>{}</title>\n", escape_xml(&config.title)));
    xml.push_str(&format!(
        "  <subtitle>{}</subtitle>\n",
        escape_xml(&config.description)
    ));
    xml.push_str(&format!("  <link href=\"{}\"/>\n", escape_xml(&config.url)));
    xml.push_str(&format!("  <id>{}</id>\n", escape_xml(&config.url)));
    xml.push_str(&format!("  <updated>{}</updated>\n", updated));
    xml.push_str(&author);
    xml.push_str(&entries);
    xml.push_str("</feed>\n");

    Ok(xml)
}

/// Write `feed.xml` into the output directory unless dry-running.
pub fn write_feed(config: &Config, site: &Site, output_dir: &Path, dry_run: bool) -> Result<()> {
    let xml = construct(config, site)?;

    if dry_run {
        return Ok(());
    }

    fs::write(output_dir.join("feed.xml"), xml).context("Failed to write feed.xml")?;

    tracing::info!("wrote feed.xml");

    Ok(())
}

fn absolute_url(site_url: &str, href: &str) -> String {
    format!(
        "{}/{}",
        site_url.trim_end_matches('/'),
        href.trim_start_matches('/')
    )
}

fn escape_xml(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
