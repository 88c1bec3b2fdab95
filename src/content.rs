//! Post manifest and markdown body loading.
//!
//! The content directory holds a `posts.json` manifest listing every post in
//! display-independent order, plus one markdown file per post named after its
//! slug:
//!
//! ```text
//! markdown/
//! ├── posts.json
//! ├── hello-world.md
//! └── second-post.md
//! ```
//!
//! The manifest is the source of truth for which posts exist. A markdown file
//! without a manifest entry is ignored; a manifest entry without a markdown
//! file fails with [`ContentError::BodyNotFound`] when its body is requested.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const MANIFEST_FILE: &str = "posts.json";

#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Post manifest not found: {0}")]
    ManifestNotFound(PathBuf),
    #[error("No markdown body for post '{slug}' at {}", path.display())]
    BodyNotFound { slug: String, path: PathBuf },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// One manifest entry.
///
/// Every field defaults to empty so that incomplete entries still load and
/// can be rejected with a reason by the validator instead of failing the
/// whole manifest parse.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PostSummary {
    pub slug: String,
    pub title: String,
    pub excerpt: String,
    /// Raw date as written in the manifest. Kept verbatim for machine-readable use.
    pub date: String,
    /// Precomputed reading time. Informational only; pages use the computed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading_time: Option<String>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PostsFile {
    posts: Vec<PostSummary>,
}

/// Read-only access to the content directory.
#[derive(Debug, Clone)]
pub struct ContentStore {
    dir: PathBuf,
}

impl ContentStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    pub fn body_path(&self, slug: &str) -> PathBuf {
        self.dir.join(format!("{slug}.md"))
    }

    /// List manifest entries in file order.
    pub fn list_posts(&self) -> Result<Vec<PostSummary>, ContentError> {
        let path = self.manifest_path();
        if !path.is_file() {
            return Err(ContentError::ManifestNotFound(path));
        }
        let content = fs::read_to_string(&path)?;
        parse_manifest(&content)
    }

    /// Load the markdown body for `slug`.
    pub fn load_body(&self, slug: &str) -> Result<String, ContentError> {
        let path = self.body_path(slug);
        match fs::read_to_string(&path) {
            Ok(body) => Ok(body),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ContentError::BodyNotFound {
                slug: slug.to_string(),
                path,
            }),
            Err(e) => Err(e.into()),
        }
    }
}

/// Parse manifest JSON: `{ "posts": [ ... ] }`.
pub fn parse_manifest(content: &str) -> Result<Vec<PostSummary>, ContentError> {
    let file: PostsFile = serde_json::from_str(content)?;
    Ok(file.posts)
}
