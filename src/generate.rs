//! Site generation: the full pipeline from config to written HTML.
//!
//! A run moves through fixed stages and stops at the first fatal error:
//!
//! 1. Load and validate the site config.
//! 2. Load the required templates (`blog`, `homepage`).
//! 3. Reset the post output directory.
//! 4. Load the manifest and partition entries into valid and skipped.
//!    No valid entries is fatal.
//! 5. Render every valid post in parallel: load body, validate, render,
//!    substitute, write `<site_dir>/<output_dir>/<slug>/index.html`.
//! 6. Sort generated posts newest first and write the homepage to
//!    `<site_dir>/index.html`.
//! 7. Render secondary pages listed in `build.pages` to
//!    `<site_dir>/<name>/index.html`.
//!
//! ## Failure policy
//!
//! | Failure                              | Effect                 |
//! |--------------------------------------|------------------------|
//! | config, required template, manifest  | run fails              |
//! | no valid posts                       | run fails              |
//! | homepage write                       | run fails              |
//! | one post (invalid, missing, unsafe)  | post skipped           |
//! | secondary page                       | page skipped           |
//!
//! Pages already written stay on disk when a later stage fails. Skips are
//! reported as [`GenerateEvent`]s, never silently dropped.
//!
//! ## Output
//!
//! ```text
//! site_dir/
//! ├── index.html               # Homepage with post cards
//! ├── speaking/index.html      # One per build.pages entry
//! └── reads/                   # build.output_dir, recreated every run
//!     ├── hello-world/index.html
//!     └── second-post/index.html
//! ```

use crate::config::{self, ConfigError, SiteConfig};
use crate::content::{ContentError, ContentStore, PostSummary};
use crate::render::{
    Highlighter, SyntectHighlighter, PostDate, calculate_reading_time, format_date, parse_post_date,
    render_markdown,
};
use crate::template::{self, PageData, Template, TemplateError, render_post_card, substitute};
use crate::validate::{self, ValidationErrors};
use chrono::Datelike;
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

pub const BLOG_TEMPLATE: &str = "blog";
pub const HOMEPAGE_TEMPLATE: &str = "homepage";
const INDEX_FILE: &str = "index.html";

#[derive(Error, Debug)]
pub enum GenerateError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),
    #[error("Content error: {0}")]
    Content(#[from] ContentError),
    #[error("No valid posts found to generate ({skipped} skipped)")]
    NoValidPosts { skipped: usize },
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Why a single post was left out of the site.
#[derive(Error, Debug)]
pub enum PostError {
    #[error("invalid post: {0}")]
    InvalidSummary(ValidationErrors),
    #[error("invalid content: {0}")]
    InvalidBody(ValidationErrors),
    #[error("{0}")]
    Content(#[from] ContentError),
    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Progress reported while a run is in flight.
#[derive(Debug)]
pub enum GenerateEvent {
    /// Manifest validated; `valid` posts will be rendered.
    PostsValidated { valid: usize, skipped: usize },
    PostGenerated { slug: String, path: PathBuf },
    PostSkipped {
        slug: String,
        title: String,
        error: PostError,
    },
    HomepageWritten { path: PathBuf, post_count: usize },
    PageWritten { name: String, path: PathBuf },
    PageFailed { name: String, reason: String },
}

/// A post that made it onto disk.
#[derive(Debug, Clone)]
pub struct GeneratedPost {
    pub summary: PostSummary,
    /// Display day and sort instant.
    pub date: PostDate,
    pub reading_time: String,
    pub path: PathBuf,
}

/// Summary of a successful run.
#[derive(Debug, Default)]
pub struct GenerateReport {
    /// Generated posts, newest first.
    pub posts: Vec<GeneratedPost>,
    /// Every file written, in write order: posts, homepage, secondary pages.
    pub files: Vec<PathBuf>,
    /// Posts left out (invalid summary, missing or rejected body, write failure).
    pub skipped: usize,
}

/// Resolved directories for one project.
#[derive(Debug, Clone)]
pub struct SiteLayout {
    pub template_dir: PathBuf,
    pub content_dir: PathBuf,
    pub site_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl SiteLayout {
    pub fn new(root: &Path, config: &SiteConfig) -> Self {
        let site_dir = root.join(&config.build.site_dir);
        Self {
            template_dir: root.join(&config.build.template_dir),
            content_dir: root.join(&config.build.content_dir),
            output_dir: site_dir.join(&config.build.output_dir),
            site_dir,
        }
    }

    pub fn post_path(&self, slug: &str) -> PathBuf {
        self.output_dir.join(slug).join(INDEX_FILE)
    }

    pub fn homepage_path(&self) -> PathBuf {
        self.site_dir.join(INDEX_FILE)
    }

    pub fn page_path(&self, name: &str) -> PathBuf {
        self.site_dir.join(name).join(INDEX_FILE)
    }
}

/// Generate the site under `root` with the default syntax highlighter.
///
/// `config_path` is resolved relative to `root` unless absolute.
pub fn generate(
    root: &Path,
    config_path: &Path,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateReport, GenerateError> {
    generate_with_highlighter(root, config_path, &SyntectHighlighter, events)
}

pub fn generate_with_highlighter(
    root: &Path,
    config_path: &Path,
    highlighter: &dyn Highlighter,
    events: Option<Sender<GenerateEvent>>,
) -> Result<GenerateReport, GenerateError> {
    let emit = |event: GenerateEvent| {
        if let Some(tx) = &events {
            tx.send(event).ok();
        }
    };

    let config = config::load_config(&root.join(config_path))?;
    let layout = SiteLayout::new(root, &config);

    let blog = template::load_template(&layout.template_dir, BLOG_TEMPLATE)?;
    let homepage = template::load_template(&layout.template_dir, HOMEPAGE_TEMPLATE)?;

    reset_dir(&layout.output_dir)?;

    let store = ContentStore::new(&layout.content_dir);
    let partition = validate::partition_posts(store.list_posts()?);
    let mut report = GenerateReport {
        skipped: partition.invalid.len(),
        ..Default::default()
    };

    emit(GenerateEvent::PostsValidated {
        valid: partition.valid.len(),
        skipped: partition.invalid.len(),
    });
    for (post, errors) in partition.invalid {
        emit(GenerateEvent::PostSkipped {
            slug: post.slug,
            title: post.title,
            error: PostError::InvalidSummary(errors),
        });
    }

    if partition.valid.is_empty() {
        return Err(GenerateError::NoValidPosts {
            skipped: report.skipped,
        });
    }

    let year = chrono::Local::now().year();
    let job = PostJob {
        config: &config,
        layout: &layout,
        store: &store,
        template: &blog,
        highlighter,
        year,
    };

    // Collected in manifest order; the sort below is stable on that order.
    let outcomes: Vec<Result<GeneratedPost, SkippedPost>> = partition
        .valid
        .into_par_iter()
        .map(|post| job.run(post))
        .collect();

    for outcome in outcomes {
        match outcome {
            Ok(post) => {
                emit(GenerateEvent::PostGenerated {
                    slug: post.summary.slug.clone(),
                    path: post.path.clone(),
                });
                report.files.push(post.path.clone());
                report.posts.push(post);
            }
            Err(skipped) => {
                report.skipped += 1;
                emit(GenerateEvent::PostSkipped {
                    slug: skipped.summary.slug,
                    title: skipped.summary.title,
                    error: skipped.error,
                });
            }
        }
    }

    report.posts.sort_by(|a, b| b.date.instant.cmp(&a.date.instant));

    let cards: String = report
        .posts
        .iter()
        .map(|p| render_post_card(&p.summary, &config.build.output_dir).into_string())
        .collect();
    let home_data = PageData {
        posts: cards,
        current_year: Some(year),
        ..Default::default()
    };
    let home_path = layout.homepage_path();
    write_html(&home_path, &substitute(&homepage.source, &home_data, &config, None))
        .map_err(|source| GenerateError::Write {
            path: home_path.clone(),
            source,
        })?;
    emit(GenerateEvent::HomepageWritten {
        path: home_path.clone(),
        post_count: report.posts.len(),
    });
    report.files.push(home_path);

    for name in &config.build.pages {
        match render_secondary_page(name, &config, &layout, year) {
            Ok(path) => {
                emit(GenerateEvent::PageWritten {
                    name: name.clone(),
                    path: path.clone(),
                });
                report.files.push(path);
            }
            Err(reason) => emit(GenerateEvent::PageFailed {
                name: name.clone(),
                reason,
            }),
        }
    }

    Ok(report)
}

struct SkippedPost {
    summary: PostSummary,
    error: PostError,
}

/// Shared, read-only state for rendering posts in parallel.
struct PostJob<'a> {
    config: &'a SiteConfig,
    layout: &'a SiteLayout,
    store: &'a ContentStore,
    template: &'a Template,
    highlighter: &'a dyn Highlighter,
    year: i32,
}

impl PostJob<'_> {
    fn run(&self, summary: PostSummary) -> Result<GeneratedPost, SkippedPost> {
        match self.render(&summary) {
            Ok((date, reading_time, path)) => Ok(GeneratedPost {
                summary,
                date,
                reading_time,
                path,
            }),
            Err(error) => Err(SkippedPost { summary, error }),
        }
    }

    fn render(&self, summary: &PostSummary) -> Result<(PostDate, String, PathBuf), PostError> {
        let date = parse_post_date(&summary.date).ok_or_else(|| {
            PostError::InvalidSummary(ValidationErrors(vec![format!(
                "Invalid date format: {:?}",
                summary.date
            )]))
        })?;

        let body = self.store.load_body(&summary.slug)?;
        validate::validate_markdown_body(&body).map_err(PostError::InvalidBody)?;

        let reading_time =
            calculate_reading_time(&body, self.config.build.words_per_minute);
        let data = PageData {
            title: summary.title.clone(),
            excerpt: summary.excerpt.clone(),
            date: format_date(date.day),
            date_iso: summary.date.clone(),
            reading_time: reading_time.clone(),
            content: render_markdown(&body, self.highlighter),
            slug: summary.slug.clone(),
            posts: String::new(),
            current_year: Some(self.year),
        };
        let html = substitute(&self.template.source, &data, self.config, None);

        let path = self.layout.post_path(&summary.slug);
        write_html(&path, &html).map_err(|source| PostError::Write {
            path: path.clone(),
            source,
        })?;
        Ok((date, reading_time, path))
    }
}

/// Render `<template_dir>/<name>.html` to `<site_dir>/<name>/index.html`.
fn render_secondary_page(
    name: &str,
    config: &SiteConfig,
    layout: &SiteLayout,
    year: i32,
) -> Result<PathBuf, String> {
    if !validate::is_valid_slug(name) {
        return Err(format!(
            "invalid page name {name:?}: only lowercase letters, numbers, and hyphens are allowed"
        ));
    }
    let template =
        template::load_template(&layout.template_dir, name).map_err(|e| e.to_string())?;
    let data = PageData {
        current_year: Some(year),
        ..Default::default()
    };
    let html = substitute(&template.source, &data, config, Some(name));
    let path = layout.page_path(name);
    write_html(&path, &html).map_err(|e| format!("failed to write {}: {e}", path.display()))?;
    Ok(path)
}

/// Remove `dir` and everything under it, then recreate it empty.
fn reset_dir(dir: &Path) -> std::io::Result<()> {
    match fs::remove_dir_all(dir) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => return Err(e),
    }
    fs::create_dir_all(dir)
}

fn write_html(path: &Path, html: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, html)
}
