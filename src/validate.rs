//! Structural and safety checks applied before content enters the pipeline.
//!
//! All checks are pure: they take already-loaded data and return either `Ok`
//! or the full list of reasons the input was rejected. Callers decide the
//! policy (the generator skips rejected posts, `check` reports them all).
//!
//! ## Post summary rules
//!
//! - `title`, `excerpt`, `slug`, `date` are non-empty
//! - `date` parses as a calendar date (see [`crate::render::parse_date`])
//! - `slug` matches `^[a-z0-9-]+$`
//! - a slug already accepted earlier in the manifest is rejected as a duplicate
//!
//! ## Markdown body rules
//!
//! - non-empty after trimming
//! - passes every [`ContentRule`]; the default rule is a substring denylist
//!   for `<script>` and `javascript:`
//!
//! The denylist is a coarse heuristic, not a sanitizer. Attribute handlers,
//! entity-encoded payloads and case variants (`<SCRIPT>`) all get through.
//! Content from untrusted authors needs a real HTML sanitizer in its place.

use crate::content::PostSummary;
use crate::render::parse_date;
use regex::Regex;
use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

static SLUG_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("^[a-z0-9-]+$").expect("slug pattern must compile"));

/// Substrings rejected by the default [`SubstringDenylist`].
pub const UNSAFE_PATTERNS: &[&str] = &["<script>", "javascript:"];

/// Reasons an input was rejected. Never empty.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationErrors(pub Vec<String>);

impl ValidationErrors {
    pub fn reasons(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

fn into_result(reasons: Vec<String>) -> Result<(), ValidationErrors> {
    if reasons.is_empty() {
        Ok(())
    } else {
        Err(ValidationErrors(reasons))
    }
}

/// True when `slug` matches `^[a-z0-9-]+$`.
pub fn is_valid_slug(slug: &str) -> bool {
    SLUG_PATTERN.is_match(slug)
}

/// Validate one manifest entry in isolation.
pub fn validate_post_summary(summary: &PostSummary) -> Result<(), ValidationErrors> {
    let mut reasons = Vec::new();

    if summary.title.is_empty() {
        reasons.push("Missing title".to_string());
    }
    if summary.excerpt.is_empty() {
        reasons.push("Missing excerpt".to_string());
    }
    if summary.slug.is_empty() {
        reasons.push("Missing slug".to_string());
    }
    if summary.date.is_empty() {
        reasons.push("Missing date".to_string());
    }

    if !summary.date.is_empty() && parse_date(&summary.date).is_none() {
        reasons.push(format!("Invalid date format: {:?}", summary.date));
    }

    if !summary.slug.is_empty() && !is_valid_slug(&summary.slug) {
        reasons.push(format!(
            "Invalid slug {:?}: only lowercase letters, numbers, and hyphens are allowed",
            summary.slug
        ));
    }

    into_result(reasons)
}

/// A posts split into those that may be generated and those that may not.
#[derive(Debug, Default)]
pub struct Partition {
    pub valid: Vec<PostSummary>,
    pub invalid: Vec<(PostSummary, ValidationErrors)>,
}

/// Validate every entry, then apply the duplicate-slug rule.
///
/// Manifest order is preserved in both halves. The first valid entry for a
/// slug wins; later entries with the same slug are rejected.
pub fn partition_posts(posts: Vec<PostSummary>) -> Partition {
    let mut partition = Partition::default();
    let mut seen: HashSet<String> = HashSet::new();

    for post in posts {
        match validate_post_summary(&post) {
            Err(errors) => partition.invalid.push((post, errors)),
            Ok(()) if !seen.insert(post.slug.clone()) => {
                let errors = ValidationErrors(vec![format!(
                    "Duplicate slug {:?}: an earlier post already uses it",
                    post.slug
                )]);
                partition.invalid.push((post, errors));
            }
            Ok(()) => partition.valid.push(post),
        }
    }

    partition
}

/// A single check applied to a markdown body.
pub trait ContentRule: Send + Sync {
    /// `Err(reason)` when the body violates the rule.
    fn check(&self, body: &str) -> Result<(), String>;
}

/// Rejects bodies containing any of a fixed set of substrings.
#[derive(Debug, Clone)]
pub struct SubstringDenylist {
    patterns: Vec<String>,
}

impl SubstringDenylist {
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            patterns: patterns.into_iter().map(Into::into).collect(),
        }
    }
}

impl Default for SubstringDenylist {
    fn default() -> Self {
        Self::new(UNSAFE_PATTERNS.iter().copied())
    }
}

impl ContentRule for SubstringDenylist {
    fn check(&self, body: &str) -> Result<(), String> {
        match self.patterns.iter().find(|p| body.contains(p.as_str())) {
            Some(p) => Err(format!("Potentially unsafe content detected ({p})")),
            None => Ok(()),
        }
    }
}

/// Validate a markdown body with the default denylist.
pub fn validate_markdown_body(body: &str) -> Result<(), ValidationErrors> {
    validate_markdown_body_with(body, &[&SubstringDenylist::default()])
}

/// Validate a markdown body against a custom rule set.
pub fn validate_markdown_body_with(
    body: &str,
    rules: &[&dyn ContentRule],
) -> Result<(), ValidationErrors> {
    if body.trim().is_empty() {
        return Err(ValidationErrors(vec!["Empty markdown content".to_string()]));
    }
    let reasons = rules.iter().filter_map(|r| r.check(body).err()).collect();
    into_result(reasons)
}

/// Warn about bodies with no markdown heading at all. Not a rejection.
pub fn lint_markdown_body(body: &str) -> Vec<String> {
    if body.contains('#') {
        Vec::new()
    } else {
        vec!["No headings found in markdown".to_string()]
    }
}

/// Warn about templates that look unusable. Not a rejection.
pub fn lint_template(source: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    if !source.contains("{{") {
        warnings.push("appears to have no template variables".to_string());
    }
    if !source.contains("</html>") {
        warnings.push("appears to be incomplete HTML (no </html>)".to_string());
    }
    warnings
}
