//! Read-only content check.
//!
//! Runs every validation the generator would, without writing anything, and
//! keeps going after the first problem so an author sees the whole list at
//! once. Only an unusable config stops the check early.

use crate::config::{self, ConfigError};
use crate::content::ContentStore;
use crate::generate::{BLOG_TEMPLATE, HOMEPAGE_TEMPLATE, SiteLayout};
use crate::template;
use crate::validate;
use std::path::Path;

/// One finding, attributed to the file or post it concerns.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckIssue {
    pub subject: String,
    pub message: String,
}

impl CheckIssue {
    fn new(subject: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Default)]
pub struct CheckReport {
    /// Manifest entries examined.
    pub posts_checked: usize,
    /// Entries that would be generated.
    pub posts_valid: usize,
    pub templates_checked: usize,
    /// Problems that would make the generator skip content or fail.
    pub errors: Vec<CheckIssue>,
    /// Suspicious but harmless findings.
    pub warnings: Vec<CheckIssue>,
}

impl CheckReport {
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Check the project under `root` without generating anything.
pub fn check(root: &Path, config_path: &Path) -> Result<CheckReport, ConfigError> {
    let config = config::load_config(&root.join(config_path))?;
    let layout = SiteLayout::new(root, &config);
    let mut report = CheckReport::default();

    let required = [BLOG_TEMPLATE, HOMEPAGE_TEMPLATE];
    let secondary = config.build.pages.iter().map(String::as_str);
    for (name, is_required) in required
        .into_iter()
        .map(|n| (n, true))
        .chain(secondary.map(|n| (n, false)))
    {
        let subject = format!("{name}.html");
        match template::load_template(&layout.template_dir, name) {
            Ok(t) => {
                report.templates_checked += 1;
                for warning in validate::lint_template(&t.source) {
                    report.warnings.push(CheckIssue::new(&subject, warning));
                }
            }
            Err(e) if is_required => report.errors.push(CheckIssue::new(&subject, e.to_string())),
            Err(e) => report.warnings.push(CheckIssue::new(&subject, e.to_string())),
        }
    }

    let store = ContentStore::new(&layout.content_dir);
    let posts = match store.list_posts() {
        Ok(posts) => posts,
        Err(e) => {
            report
                .errors
                .push(CheckIssue::new(crate::content::MANIFEST_FILE, e.to_string()));
            return Ok(report);
        }
    };
    report.posts_checked = posts.len();

    let partition = validate::partition_posts(posts);
    for (post, errors) in &partition.invalid {
        report
            .errors
            .push(CheckIssue::new(post_subject(&post.slug, &post.title), errors.to_string()));
    }

    for post in &partition.valid {
        let subject = post_subject(&post.slug, &post.title);
        let body = match store.load_body(&post.slug) {
            Ok(body) => body,
            Err(e) => {
                report.errors.push(CheckIssue::new(subject, e.to_string()));
                continue;
            }
        };
        if let Err(errors) = validate::validate_markdown_body(&body) {
            report.errors.push(CheckIssue::new(subject, errors.to_string()));
            continue;
        }
        for warning in validate::lint_markdown_body(&body) {
            report.warnings.push(CheckIssue::new(&subject, warning));
        }
        report.posts_valid += 1;
    }

    if report.posts_valid == 0 {
        report
            .errors
            .push(CheckIssue::new(crate::content::MANIFEST_FILE, "No valid posts"));
    }

    Ok(report)
}

fn post_subject(slug: &str, title: &str) -> String {
    match (slug.is_empty(), title.is_empty()) {
        (false, _) => slug.to_string(),
        (true, false) => title.to_string(),
        (true, true) => "(untitled post)".to_string(),
    }
}
