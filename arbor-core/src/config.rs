//! Configuration parsing and management.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// How to treat wikilink and image targets that resolve outside the input
/// tree. `strict` fails the build; `lenient` logs and drops the reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkPolicy {
    #[default]
    Strict,
    Lenient,
}

/// Main configuration struct matching the arbor.yml schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub url: String,

    #[serde(default)]
    pub author_name: String,

    #[serde(default)]
    pub author_email: String,

    /// Label for the leftmost navigation crumb.
    #[serde(default = "default_root_crumb")]
    pub root_crumb: String,

    /// Raw HTML injected into every page's head.
    #[serde(default)]
    pub head: String,

    #[serde(default)]
    pub footer: Vec<FooterLink>,

    #[serde(default = "default_true")]
    pub code_highlight: bool,

    #[serde(default = "default_code_theme")]
    pub code_theme: String,

    /// Keep the `.html` suffix on generated hrefs.
    #[serde(default = "default_true")]
    pub keep_extension: bool,

    #[serde(default)]
    pub link_policy: LinkPolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FooterLink {
    pub href: String,
    pub text: String,
}

fn default_true() -> bool {
    true
}

fn default_root_crumb() -> String {
    String::from("~")
}

fn default_code_theme() -> String {
    String::from("InspiredGitHub")
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            url: String::new(),
            author_name: String::new(),
            author_email: String::new(),
            root_crumb: default_root_crumb(),
            head: String::new(),
            footer: Vec::new(),
            code_highlight: true,
            code_theme: default_code_theme(),
            keep_extension: true,
            link_policy: LinkPolicy::Strict,
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// The `.html` suffix when `keep_extension` is on, empty otherwise.
    pub fn ext(&self) -> &'static str {
        if self.keep_extension {
            ".html"
        } else {
            ""
        }
    }
}
