//! Frontmatter decoding from document source.

use crate::models::Metadata;
use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FrontmatterError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

static FRONTMATTER_REGEX: OnceLock<Regex> = OnceLock::new();

fn frontmatter_regex() -> &'static Regex {
    FRONTMATTER_REGEX
        .get_or_init(|| Regex::new(r"(?s)\A---\s*\n(.*?)\n---\s*\n?(.*)\z").unwrap())
}

/// Decode the frontmatter block of a document.
///
/// Returns `(metadata, markdown_body)`. A document without a frontmatter
/// block gets default metadata and its full content as body; a malformed
/// block is a fatal error, since a half-decoded graph cannot be trusted.
///
/// # Example
///
/// ```
/// use arbor_core::frontmatter::parse_frontmatter;
///
/// let content = "---\ntitle: Field notes\npinned: true\n---\nSome text.\n";
///
/// let (md, body) = parse_frontmatter(content).unwrap();
/// assert_eq!(md.title, "Field notes");
/// assert!(md.pinned);
/// assert!(body.starts_with("Some text."));
/// ```
pub fn parse_frontmatter(content: &str) -> Result<(Metadata, String), FrontmatterError> {
    let re = frontmatter_regex();

    let Some(captures) = re.captures(content) else {
        return Ok((Metadata::default(), content.to_string()));
    };

    let yaml = captures.get(1).map(|m| m.as_str()).unwrap_or_default();
    let body = captures.get(2).map(|m| m.as_str()).unwrap_or_default();

    let metadata: Metadata = serde_yaml::from_str(yaml)?;

    Ok((metadata, body.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Layout;

    #[test]
    fn test_parse_full_frontmatter() {
        let content = r#"---
title: Garden notes
description: What grows where
date: 2024-03-01
dateUpdated: 2024-04-05
layout: log
tags:
  - garden
  - notes
pinned: true
---

# Hello

Body text."#;

        let (md, body) = parse_frontmatter(content).unwrap();
        assert_eq!(md.title, "Garden notes");
        assert_eq!(md.description, "What grows where");
        assert_eq!(md.date, "2024-03-01");
        assert_eq!(md.date_updated, "2024-04-05");
        assert_eq!(md.layout, Layout::Log);
        assert_eq!(md.tags, vec!["garden", "notes"]);
        assert!(md.pinned);
        assert!(body.contains("# Hello"));
        assert!(!body.contains("---"));
    }

    #[test]
    fn test_parse_no_frontmatter() {
        let content = "# Just content\n\nNo block here.";
        let (md, body) = parse_frontmatter(content).unwrap();
        assert_eq!(md.title, "");
        assert!(md.show_header);
        assert_eq!(body, content);
    }

    #[test]
    fn test_missing_title_is_fine() {
        // Titles fall back to the filename stem later; absence is not an error
        let content = "---\ntags: [a]\n---\nBody.";
        let (md, _) = parse_frontmatter(content).unwrap();
        assert_eq!(md.title, "");
        assert_eq!(md.tags, vec!["a"]);
    }

    #[test]
    fn test_draft_flag() {
        let content = "---\ntitle: WIP\ndraft: true\n---\nBody.";
        let (md, _) = parse_frontmatter(content).unwrap();
        assert!(md.draft);
    }

    #[test]
    fn test_invalid_yaml() {
        let content = "---\ntitle: [unclosed\n---\nBody.";
        assert!(parse_frontmatter(content).is_err());
    }

    #[test]
    fn test_frontmatter_only_document() {
        let content = "---\ntitle: Bare\n---\n";
        let (md, body) = parse_frontmatter(content).unwrap();
        assert_eq!(md.title, "Bare");
        assert_eq!(body, "");
    }
}
