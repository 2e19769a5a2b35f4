//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

const DEFAULT_CONFIG: &str = include_str!("../../arbor.yml.example");

/// Initialize a new arbor project
pub fn init_project(path: Option<&Path>) -> Result<()> {
    let root = path.unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(root).with_context(|| format!("Failed to create {:?}", root))?;

    write_config(root)?;
    scaffold_content(root)?;

    println!("arbor initialized in {:?}", root);
    println!("  - edit arbor.yml to customize site metadata");
    println!("  - run `arbor build` to render the site into _site/");
    Ok(())
}

fn write_config(root: &Path) -> Result<()> {
    let config_path = root.join("arbor.yml");
    if config_path.exists() {
        println!("arbor.yml already exists at {:?}", config_path);
        return Ok(());
    }

    fs::write(&config_path, DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write {:?}", config_path))?;
    println!("Created {:?}", config_path);
    Ok(())
}

fn scaffold_content(root: &Path) -> Result<()> {
    let journal = root.join("journal");
    fs::create_dir_all(&journal).with_context(|| format!("Failed to create {:?}", journal))?;

    let samples = [
        ("index.md", SAMPLE_INDEX),
        ("first-note.md", SAMPLE_NOTE),
        ("journal/index.md", SAMPLE_JOURNAL_INDEX),
        ("journal/2024-01-01.md", SAMPLE_JOURNAL_ENTRY),
    ];

    for (rel, content) in samples {
        let path = root.join(rel);
        if path.exists() {
            continue;
        }
        fs::write(&path, content).with_context(|| format!("Failed to write {:?}", path))?;
        println!("Created {rel}");
    }

    Ok(())
}

const SAMPLE_INDEX: &str = r#"---
title: Home
description: A new arbor wiki
---

Welcome. Write markdown documents anywhere under this directory and link
them together with `[[wiki links]]`, like this one to [[first-note]].

Subdirectories become sections with their own listings; a directory with
`layout: log` in its index inlines its entries right here.
"#;

const SAMPLE_NOTE: &str = r#"---
title: First note
description: A starting point
tags: [meta]
---

Documents that share a tag show up under each other's related links.
"#;

const SAMPLE_JOURNAL_INDEX: &str = r#"---
title: Journal
layout: log
pinned: true
---

Entries below appear inline, newest file last.
"#;

const SAMPLE_JOURNAL_ENTRY: &str = r#"---
title: Getting started
date: 2024-01-01
tags: [meta]
---

The first journal entry.
"#;
