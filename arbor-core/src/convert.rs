//! Small string and date derivations shared by the passes and the renderer.

use arbor_types::NodePath;
use chrono::{NaiveDate, NaiveTime};
use std::path::Path;

/// Resolve a `YYYY-MM-DD` date into a pretty date and an RFC3339 machine
/// date. Empty input yields empty output, not an error.
pub fn date(raw: &str) -> Result<(String, String), chrono::ParseError> {
    if raw.is_empty() {
        return Ok((String::new(), String::new()));
    }

    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d")?;
    let pretty = parsed.format("%d %b %Y").to_string();
    let machine = parsed.and_time(NaiveTime::MIN).and_utc().to_rfc3339();

    Ok((pretty, machine))
}

/// Prefer the frontmatter title, falling back to the file name.
pub fn title(metadata_title: &str, file_stem: &str) -> String {
    if metadata_title.is_empty() {
        file_stem.to_string()
    } else {
        metadata_title.to_string()
    }
}

/// Navigation components for a document path.
///
/// For `root/a/b/c/file.md` the crumb titles are `["a", "b", "c"]` and the
/// crumb links `["a/index.html", "a/b/index.html", "a/b/c/index.html"]`
/// (without the `index.html` suffix when `keep_extension` is off).
pub fn nav_crumbs(
    path: &NodePath,
    root: &Path,
    keep_extension: bool,
) -> (Vec<String>, Vec<String>) {
    let rel = path.relative_to(root);
    let parts: Vec<&str> = rel.split('/').collect();

    // The last component is the document itself, not a crumb
    let mut links = Vec::new();
    for i in 0..parts.len().saturating_sub(1) {
        let mut link = parts[..=i].join("/");
        if keep_extension {
            link.push_str("/index.html");
        }
        links.push(link);
    }

    let titles = parts[..parts.len().saturating_sub(1)]
        .iter()
        .map(|s| s.to_string())
        .collect();

    (titles, links)
}
