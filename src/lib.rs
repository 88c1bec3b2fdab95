//! # Blogsmith
//!
//! A small static site generator for a personal blog and portfolio. A JSON
//! manifest lists the posts, one markdown file per post holds the body, and
//! plain HTML templates with `{{token}}` placeholders give the pages their
//! shape. The output is a folder of static HTML.
//!
//! # Architecture: One Staged Run
//!
//! ```text
//! site.toml ─┐
//! templates/ ├─▶ validate ─▶ render (parallel) ─▶ substitute ─▶ write
//! markdown/ ─┘                                      │
//!                                                   └─▶ homepage, pages
//! ```
//!
//! Every run rebuilds the whole site. There is no cache and no incremental
//! mode: a blog with a few hundred posts renders in well under a second, and
//! a full rebuild can never serve a stale page.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` (or JSON) loading and validation, stock config text |
//! | [`content`] | Post manifest and per-slug markdown bodies |
//! | [`validate`] | Post summary, markdown body and template checks |
//! | [`render`] | Markdown → HTML with syntax highlighting, dates, reading time |
//! | [`template`] | Template loading, token vocabulary, nav and card fragments |
//! | [`generate`] | The pipeline: validation, parallel post rendering, homepage, pages |
//! | [`check`] | Dry run that reports every problem without writing |
//! | [`output`] | CLI output formatting for build progress and check reports |
//!
//! # Design Decisions
//!
//! ## Skip One, Fail Few
//!
//! A broken post (bad slug, missing body, suspicious content) is skipped and
//! reported; the rest of the site still builds. Only problems that leave
//! nothing useful to publish stop a run: an unreadable config, a missing
//! `blog` or `homepage` template, or a manifest with no valid posts.
//!
//! ## Templates Stay HTML
//!
//! Templates are ordinary HTML files an author can open in a browser. The
//! token vocabulary is closed, so a typo like `{{titel}}` survives into the
//! output where it is easy to spot, instead of silently becoming empty.
//! Generated fragments (navigation, post cards) are built with
//! [Maud](https://maud.lambda.xyz/) and escaped on the way in.
//!
//! ## Content Safety
//!
//! Markdown bodies may contain raw HTML. The body check rejects `<script>`
//! and `javascript:` substrings, which stops accidents, not attackers. It is
//! a pluggable [`validate::ContentRule`] so a real sanitizer can replace it.

pub mod check;
pub mod config;
pub mod content;
pub mod generate;
pub mod output;
pub mod render;
pub mod template;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
