//! Site configuration module.
//!
//! Loads the single site configuration file that every generation run starts
//! from. The file carries the site identity, the author profile, navigation
//! entries, build options and SEO keywords. It is read once, validated, and
//! then passed by reference to every stage that needs it.
//!
//! ## Config File Location
//!
//! The configuration lives at the project root, next to the content and
//! template directories:
//!
//! ```text
//! project/
//! ├── site.toml                # Site configuration
//! ├── markdown/
//! │   ├── posts.json           # Post manifest
//! │   └── hello-world.md       # One body per slug
//! └── templates/
//!     ├── blog.html            # Post page template
//!     └── homepage.html        # Homepage template
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! [site]
//! name = "everyday.dev"     # Required
//! title = "EverydayDev"
//! text_logo = "everyday.dev" # Falls back to site.name
//!
//! [author]
//! name = "Maye"             # Required
//! job_title = "Software Engineer"
//! recognition = ""          # Falls back to author.job_title
//!
//! [[navigation]]
//! label = "Speaking"
//! href = "/speaking/"
//!
//! [build]
//! words_per_minute = 200
//! output_dir = "reads"      # Post pages: <site_dir>/<output_dir>/<slug>/index.html
//! template_dir = "templates"
//! content_dir = "markdown"
//! site_dir = "."
//! pages = []                # Secondary pages rendered from templates/<name>.html
//!
//! [seo]
//! keywords = ["rust", "web"]
//! ```
//!
//! A path ending in `.json` is read as JSON instead. Keys may be written in
//! camelCase (`textLogo`, `wordsPerMinute`) as well as snake_case.
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `site.toml`.
///
/// All fields have defaults so a config only needs the values it cares about,
/// but `site.name` and `author.name` must be present for [`SiteConfig::validate`]
/// to pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site identity.
    pub site: SiteInfo,
    /// Author profile shown in the sidebar and SEO metadata.
    pub author: AuthorConfig,
    /// Navigation entries, rendered in order.
    pub navigation: Vec<NavEntry>,
    /// Build options.
    pub build: BuildConfig,
    /// SEO keyword lists.
    pub seo: SeoConfig,
}

impl SiteConfig {
    /// Validate required fields and build options.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.site.name.trim().is_empty() {
            return Err(ConfigError::Validation("site.name is required".into()));
        }
        if self.author.name.trim().is_empty() {
            return Err(ConfigError::Validation("author.name is required".into()));
        }
        if self.build.words_per_minute == 0 {
            return Err(ConfigError::Validation(
                "build.words_per_minute must be greater than 0".into(),
            ));
        }
        if !is_contained_relative(&self.build.output_dir) {
            return Err(ConfigError::Validation(format!(
                "build.output_dir must be a relative directory inside the site directory, got {:?}",
                self.build.output_dir
            )));
        }
        Ok(())
    }

    /// Display name of the site: the text logo when set, otherwise the name.
    pub fn display_name(&self) -> &str {
        non_empty_or(&self.site.text_logo, &self.site.name)
    }

    /// Subtitle, falling back to the author bio.
    pub fn subtitle(&self) -> &str {
        non_empty_or(&self.site.subtitle, &self.author.bio)
    }

    /// Author recognition line, falling back to the job title.
    pub fn recognition(&self) -> &str {
        non_empty_or(&self.author.recognition, &self.author.job_title)
    }
}

fn non_empty_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

/// True when `dir` has at least one normal component and nothing else
/// (no `..`, no root, no `.`-only path).
fn is_contained_relative(dir: &str) -> bool {
    let path = Path::new(dir);
    let mut normal = 0;
    for component in path.components() {
        match component {
            Component::Normal(_) => normal += 1,
            Component::CurDir => {}
            _ => return false,
        }
    }
    normal > 0
}

/// Site identity settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteInfo {
    pub name: String,
    pub title: String,
    pub subtitle: String,
    pub description: String,
    pub url: String,
    #[serde(alias = "textLogo")]
    pub text_logo: String,
    pub logo: String,
    pub favicon: String,
    pub banner: String,
}

/// Author identity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthorConfig {
    pub name: String,
    pub title: String,
    #[serde(alias = "jobTitle")]
    pub job_title: String,
    pub recognition: String,
    pub bio: String,
    pub avatar: String,
    pub contact: ContactConfig,
    #[serde(alias = "socialLinks")]
    pub social_links: Vec<SocialLink>,
}

/// Author contact handles.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContactConfig {
    pub email: String,
    pub twitter: String,
}

/// A social profile link, rendered as an icon in the sidebar.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SocialLink {
    pub label: String,
    pub href: String,
    /// SVG path data for the 24x24 icon.
    #[serde(alias = "iconPath")]
    pub icon_path: String,
}

/// A navigation entry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NavEntry {
    pub label: String,
    pub href: String,
    /// Opens in a new tab when set.
    pub external: bool,
    /// Optional SVG path data for an inline icon.
    pub icon: Option<String>,
}

/// Build options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Reading speed used for the "N min read" estimate.
    #[serde(alias = "wordsPerMinute")]
    pub words_per_minute: u32,
    /// Directory (relative to `site_dir`) that receives one folder per post.
    /// Deleted and recreated on every run.
    #[serde(alias = "outputDir")]
    pub output_dir: String,
    /// Directory (relative to the project root) holding `<name>.html` templates.
    #[serde(alias = "templateDir")]
    pub template_dir: String,
    /// Directory (relative to the project root) holding `posts.json` and bodies.
    #[serde(alias = "contentDir")]
    pub content_dir: String,
    /// Directory (relative to the project root) that receives the homepage.
    #[serde(alias = "siteDir")]
    pub site_dir: String,
    /// Secondary pages: each name renders `<template_dir>/<name>.html`
    /// to `<site_dir>/<name>/index.html`.
    pub pages: Vec<String>,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 200,
            output_dir: "reads".to_string(),
            template_dir: "templates".to_string(),
            content_dir: "markdown".to_string(),
            site_dir: ".".to_string(),
            pages: Vec::new(),
        }
    }
}

/// SEO keyword lists.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SeoConfig {
    pub keywords: Vec<String>,
    pub technologies: Vec<String>,
}

// =============================================================================
// Config loading
// =============================================================================

/// Parse config text. JSON when `is_json`, TOML otherwise.
pub fn parse_config(content: &str, is_json: bool) -> Result<SiteConfig, ConfigError> {
    let config: SiteConfig = if is_json {
        serde_json::from_str(content)?
    } else {
        toml::from_str(content)?
    };
    config.validate()?;
    Ok(config)
}

/// Load and validate the configuration file at `path`.
///
/// Unlike content files, a missing config is an error: there is no useful
/// site without a name and an author.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::NotFound(path.to_path_buf()));
    }
    let content = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .map(|e| e.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    parse_config(&content, is_json)
}

/// Returns a fully-commented stock `site.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Blogsmith Configuration
# =======================
# site.name and author.name are required. Everything else is optional;
# values shown below are the defaults unless noted.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Site identity
# ---------------------------------------------------------------------------
[site]
name = "My Blog"              # required
title = ""
subtitle = ""                 # falls back to author.bio
description = ""
url = ""
text_logo = ""                # falls back to site.name
logo = ""
favicon = ""
banner = ""

# ---------------------------------------------------------------------------
# Author
# ---------------------------------------------------------------------------
[author]
name = "Jane Doe"             # required
title = ""
job_title = ""
recognition = ""              # falls back to author.job_title
bio = ""
avatar = ""

[author.contact]
email = ""
twitter = ""

# One block per social profile. icon_path is SVG path data (24x24 viewBox).
# [[author.social_links]]
# label = "GitHub"
# href = "https://github.com/you"
# icon_path = "M12 0C5.37 0 0 5.37 0 12..."

# ---------------------------------------------------------------------------
# Navigation (rendered in order)
# ---------------------------------------------------------------------------
# [[navigation]]
# label = "Speaking"
# href = "/speaking/"
# external = false
# icon = "M3 3h18v18H3z"      # optional SVG path data

# ---------------------------------------------------------------------------
# Build
# ---------------------------------------------------------------------------
[build]
# Reading speed for the "N min read" estimate.
words_per_minute = 200

# Post pages are written to <site_dir>/<output_dir>/<slug>/index.html.
# This directory is deleted and recreated on every build.
output_dir = "reads"

# <template_dir>/blog.html and <template_dir>/homepage.html are required.
template_dir = "templates"

# Holds posts.json and one <slug>.md per post.
content_dir = "markdown"

# Receives index.html (the homepage) and secondary pages.
site_dir = "."

# Secondary pages: each name renders <template_dir>/<name>.html
# to <site_dir>/<name>/index.html.
pages = []

# ---------------------------------------------------------------------------
# SEO
# ---------------------------------------------------------------------------
[seo]
keywords = []
technologies = []
"##
}
