//! CLI output formatting for build and check runs.
//!
//! # Output Format
//!
//! ## Build
//!
//! Progress events stream while posts render, followed by a summary:
//!
//! ```text
//! Posts: 3 valid, 1 skipped
//!     Skipped Bad Slug! (Bad): invalid post: Invalid slug "Bad Slug!": ...
//! Generated hello-world → reads/hello-world/index.html
//! Generated second-post → reads/second-post/index.html
//! Home → index.html (2 posts)
//! Page speaking → speaking/index.html
//!
//! Generated 2 posts, homepage, 1 page (1 skipped)
//! ```
//!
//! ## Check
//!
//! ```text
//! Checked 4 posts, 3 templates
//! error   hello-world: Invalid date format: "someday"
//! warning third-post: No headings found in markdown
//!
//! 1 error, 1 warning
//! ```
//!
//! # Architecture
//!
//! Each report has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects. Paths are shown relative to
//! the project root when they live under it.

use crate::check::CheckReport;
use crate::generate::{GenerateEvent, GenerateReport};
use std::path::Path;

fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

// ============================================================================
// Build
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_generate_event(event: &GenerateEvent, root: &Path) -> Vec<String> {
    match event {
        GenerateEvent::PostsValidated { valid, skipped } => {
            vec![format!("Posts: {valid} valid, {skipped} skipped")]
        }
        GenerateEvent::PostGenerated { slug, path } => {
            vec![format!("Generated {} \u{2192} {}", slug, display_path(path, root))]
        }
        GenerateEvent::PostSkipped { slug, title, error } => {
            let name = if title.is_empty() {
                slug.clone()
            } else {
                format!("{slug} ({title})")
            };
            vec![format!("    Skipped {name}: {error}")]
        }
        GenerateEvent::HomepageWritten { path, post_count } => vec![format!(
            "Home \u{2192} {} ({})",
            display_path(path, root),
            plural(*post_count, "post")
        )],
        GenerateEvent::PageWritten { name, path } => {
            vec![format!("Page {} \u{2192} {}", name, display_path(path, root))]
        }
        GenerateEvent::PageFailed { name, reason } => {
            vec![format!("    Page {name} failed: {reason}")]
        }
    }
}

/// Format the closing summary of a successful build.
pub fn format_generate_report(report: &GenerateReport) -> Vec<String> {
    // posts + homepage come first in `files`; the rest are secondary pages
    let pages = report.files.len().saturating_sub(report.posts.len() + 1);
    let mut summary = format!(
        "Generated {}, homepage, {}",
        plural(report.posts.len(), "post"),
        plural(pages, "page")
    );
    if report.skipped > 0 {
        summary.push_str(&format!(" ({} skipped)", report.skipped));
    }
    vec![String::new(), summary]
}

pub fn print_generate_event(event: &GenerateEvent, root: &Path) {
    for line in format_generate_event(event, root) {
        println!("{}", line);
    }
}

pub fn print_generate_report(report: &GenerateReport) {
    for line in format_generate_report(report) {
        println!("{}", line);
    }
}

// ============================================================================
// Check
// ============================================================================

pub fn format_check_report(report: &CheckReport) -> Vec<String> {
    let mut lines = vec![format!(
        "Checked {}, {}",
        plural(report.posts_checked, "post"),
        plural(report.templates_checked, "template")
    )];
    for issue in &report.errors {
        lines.push(format!("error   {}: {}", issue.subject, issue.message));
    }
    for issue in &report.warnings {
        lines.push(format!("warning {}: {}", issue.subject, issue.message));
    }
    lines.push(String::new());
    lines.push(format!(
        "{}, {}",
        plural(report.errors.len(), "error"),
        plural(report.warnings.len(), "warning")
    ));
    lines
}

pub fn print_check_report(report: &CheckReport) {
    for line in format_check_report(report) {
        println!("{}", line);
    }
}
