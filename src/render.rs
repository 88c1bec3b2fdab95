//! Markdown rendering and derived post metadata.
//!
//! Bodies are parsed with [pulldown-cmark](https://docs.rs/pulldown-cmark)
//! with tables, strikethrough, task lists, footnotes and smart punctuation
//! enabled. Raw HTML passes through untouched and bare `http(s)://` URLs in
//! running text become links.
//!
//! ## Code Blocks
//!
//! Fenced code is handed to a [`Highlighter`] keyed by the fence language.
//! Whatever the highlighter returns, every code block ends up in the same
//! container so the client-side copy button works everywhere:
//!
//! ```text
//! <div class="code-block-container">
//!   <pre class="language-rust"><code>…</code></pre>
//!   <button class="copy-button" onclick="copyCode(this)">Copy</button>
//! </div>
//! ```
//!
//! Unknown languages, missing languages and highlighter failures all fall
//! back to escaped plain text under `language-text`. Highlighting never fails
//! a render.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use maud::{PreEscaped, html};
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html as md_html};
use regex::Regex;
use std::sync::LazyLock;
use syntect::html::{ClassStyle, ClassedHTMLGenerator};
use syntect::parsing::{SyntaxReference, SyntaxSet};
use syntect::util::LinesWithEndings;

static SYNTAX_SET: LazyLock<SyntaxSet> = LazyLock::new(SyntaxSet::load_defaults_newlines);

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"https?://[^\s<>"']+"#).expect("url pattern must compile"));

/// Fence languages the bundled syntax set lacks, mapped to the closest one it has.
const LANGUAGE_ALIASES: &[(&str, &str)] = &[
    ("toml", "YAML"),
    ("ts", "JavaScript"),
    ("typescript", "JavaScript"),
    ("tsx", "JavaScript"),
    ("jsx", "JavaScript"),
];

// ============================================================================
// Highlighting
// ============================================================================

/// Per-language code highlighting strategy.
pub trait Highlighter: Send + Sync {
    /// Highlighted inner HTML for `code`, or `None` when `lang` is not
    /// recognized or highlighting failed.
    fn highlight(&self, code: &str, lang: &str) -> Option<String>;
}

/// Highlights with syntect's bundled grammars, emitting CSS classes
/// (`<span class="source rust">`) rather than inline styles.
#[derive(Debug, Default, Clone, Copy)]
pub struct SyntectHighlighter;

impl SyntectHighlighter {
    fn find_syntax(lang: &str) -> Option<&'static SyntaxReference> {
        SYNTAX_SET.find_syntax_by_token(lang).or_else(|| {
            LANGUAGE_ALIASES
                .iter()
                .find(|(alias, _)| alias.eq_ignore_ascii_case(lang))
                .and_then(|(_, name)| SYNTAX_SET.find_syntax_by_name(name))
        })
    }
}

impl Highlighter for SyntectHighlighter {
    fn highlight(&self, code: &str, lang: &str) -> Option<String> {
        let syntax = Self::find_syntax(lang)?;
        let mut generator =
            ClassedHTMLGenerator::new_with_class_style(syntax, &SYNTAX_SET, ClassStyle::Spaced);
        for line in LinesWithEndings::from(code) {
            generator
                .parse_html_for_line_which_includes_newline(line)
                .ok()?;
        }
        Some(generator.finalize())
    }
}

/// Never highlights. Every block renders as escaped plain text.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainHighlighter;

impl Highlighter for PlainHighlighter {
    fn highlight(&self, _code: &str, _lang: &str) -> Option<String> {
        None
    }
}

/// First word of a fence info string (`rust,ignore` and `rust title="x"` → `rust`).
fn fence_language(info: &str) -> Option<&str> {
    info.split(|c: char| c.is_whitespace() || c == ',')
        .next()
        .filter(|s| !s.is_empty())
}

/// Render one code block into the copy-button container.
pub fn render_code_block(code: &str, lang: Option<&str>, highlighter: &dyn Highlighter) -> String {
    let highlighted = lang.and_then(|l| highlighter.highlight(code, l).map(|html| (l, html)));
    let (class_lang, body) = match highlighted {
        Some((l, html)) => (l.to_string(), html),
        None => (
            "text".to_string(),
            html_escape::encode_text(code).into_owned(),
        ),
    };

    html! {
        div.code-block-container {
            pre class={ "language-" (class_lang) } {
                code { (PreEscaped(body)) }
            }
            button.copy-button onclick="copyCode(this)" { "Copy" }
        }
    }
    .into_string()
}

// ============================================================================
// Markdown
// ============================================================================

fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_SMART_PUNCTUATION);
    options
}

/// Render a markdown body to an HTML fragment.
pub fn render_markdown(markdown: &str, highlighter: &dyn Highlighter) -> String {
    let events: Vec<Event> = Parser::new_ext(markdown, markdown_options()).collect();
    let mut processed: Vec<Event> = Vec::with_capacity(events.len());
    let mut pending_text = String::new();
    let mut link_depth = 0usize;
    let mut i = 0;

    while i < events.len() {
        match &events[i] {
            Event::Text(text) => {
                pending_text.push_str(text);
                i += 1;
                continue;
            }
            _ => flush_text(&mut pending_text, link_depth > 0, &mut processed),
        }

        match &events[i] {
            Event::Start(Tag::CodeBlock(kind)) => {
                let info = match kind {
                    CodeBlockKind::Fenced(info) => info.to_string(),
                    CodeBlockKind::Indented => String::new(),
                };
                let mut code = String::new();
                i += 1;
                while i < events.len() {
                    match &events[i] {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code.push_str(text),
                        _ => {}
                    }
                    i += 1;
                }
                let block = render_code_block(&code, fence_language(&info), highlighter);
                processed.push(Event::Html(CowStr::from(block)));
            }
            Event::Start(Tag::Link { .. } | Tag::Image { .. }) => {
                link_depth += 1;
                processed.push(events[i].clone());
            }
            Event::End(TagEnd::Link | TagEnd::Image) => {
                link_depth = link_depth.saturating_sub(1);
                processed.push(events[i].clone());
            }
            Event::InlineHtml(raw) => {
                if opens_anchor(raw) {
                    link_depth += 1;
                } else if closes_anchor(raw) {
                    link_depth = link_depth.saturating_sub(1);
                }
                processed.push(events[i].clone());
            }
            other => processed.push(other.clone()),
        }
        i += 1;
    }
    flush_text(&mut pending_text, link_depth > 0, &mut processed);

    let mut out = String::new();
    md_html::push_html(&mut out, processed.into_iter());
    out
}

/// Emit buffered text, turning bare URLs into links unless already inside one.
fn flush_text<'a>(pending: &mut String, in_link: bool, out: &mut Vec<Event<'a>>) {
    if pending.is_empty() {
        return;
    }
    let text = std::mem::take(pending);
    if in_link {
        out.push(Event::Text(CowStr::from(text)));
        return;
    }

    let mut last = 0;
    for m in URL_PATTERN.find_iter(&text) {
        let url = trim_url(m.as_str());
        if url.len() <= "https://".len() {
            continue;
        }
        let start = m.start();
        if start > last {
            out.push(Event::Text(CowStr::from(text[last..start].to_string())));
        }
        let link = html! { a href=(url) { (url) } }.into_string();
        out.push(Event::InlineHtml(CowStr::from(link)));
        last = start + url.len();
    }
    if last < text.len() {
        out.push(Event::Text(CowStr::from(text[last..].to_string())));
    }
}

/// Drop trailing sentence punctuation, and a closing paren only when unbalanced.
fn trim_url(url: &str) -> &str {
    let mut url = url;
    loop {
        let trimmed = url.trim_end_matches(['.', ',', ';', ':', '!', '?']);
        let unbalanced = trimmed.ends_with(')')
            && trimmed.matches(')').count() > trimmed.matches('(').count();
        if unbalanced {
            url = &trimmed[..trimmed.len() - 1];
        } else {
            return trimmed;
        }
    }
}

fn opens_anchor(raw: &str) -> bool {
    let tag = raw.trim_start().as_bytes();
    tag.len() > 2
        && tag[0] == b'<'
        && tag[1].eq_ignore_ascii_case(&b'a')
        && (tag[2].is_ascii_whitespace() || tag[2] == b'>')
}

fn closes_anchor(raw: &str) -> bool {
    let tag = raw.trim_start().as_bytes();
    tag.len() > 3 && tag.starts_with(b"</") && tag[2].eq_ignore_ascii_case(&b'a') && {
        let rest = &tag[3..];
        rest.first().is_some_and(|c| *c == b'>' || c.is_ascii_whitespace())
    }
}

// ============================================================================
// Derived metadata
// ============================================================================

/// A manifest date: the calendar day as written, plus an instant for ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PostDate {
    /// Day shown on the page. Offset timestamps keep their written day.
    pub day: NaiveDate,
    /// Sort key. Offset timestamps are normalized to UTC; plain dates sit at midnight.
    pub instant: NaiveDateTime,
}

impl PostDate {
    fn from_day(day: NaiveDate) -> Self {
        Self {
            day,
            instant: day.and_time(NaiveTime::MIN),
        }
    }

    fn from_naive(dt: NaiveDateTime) -> Self {
        Self {
            day: dt.date(),
            instant: dt,
        }
    }

    fn from_offset(dt: DateTime<FixedOffset>) -> Self {
        Self {
            day: dt.date_naive(),
            instant: dt.naive_utc(),
        }
    }
}

/// Parse a manifest date into its display day and sort instant.
///
/// Accepts `2024-01-15`, `2024/01/15`, RFC 3339 timestamps (seconds
/// optional), naive `2024-01-15T10:30[:00]`, RFC 2822 and `January 15, 2024`.
pub fn parse_post_date(raw: &str) -> Option<PostDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    for fmt in ["%Y-%m-%d", "%Y/%m/%d", "%B %d, %Y", "%b %d, %Y"] {
        if let Ok(day) = NaiveDate::parse_from_str(raw, fmt) {
            return Some(PostDate::from_day(day));
        }
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(PostDate::from_offset(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M%#z") {
        return Some(PostDate::from_offset(dt));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(PostDate::from_naive(dt));
        }
    }
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(PostDate::from_offset)
}

/// Calendar day of a manifest date. See [`parse_post_date`] for the formats.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_post_date(raw).map(|d| d.day)
}

/// Long-form display date: `January 5, 2024`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%B %-d, %Y").to_string()
}

/// Whole minutes to read `word_count` words, rounded up, at least one.
pub fn reading_minutes(word_count: usize, words_per_minute: u32) -> usize {
    let rate = words_per_minute.max(1) as usize;
    word_count.div_ceil(rate).max(1)
}

/// `"<N> min read"` for a body, counting whitespace-separated tokens.
pub fn calculate_reading_time(body: &str, words_per_minute: u32) -> String {
    let words = body.split_whitespace().count();
    format!("{} min read", reading_minutes(words, words_per_minute))
}

#[cfg(test)]
mod tests {
    use super::*;

    // =========================================================================
    // Markdown
    // =========================================================================

    #[test]
    fn renders_heading_and_bold() {
        let html = render_markdown("# Hi\n\nSome **text**.", &PlainHighlighter);
        assert!(html.contains("<h1>Hi</h1>"));
        assert!(html.contains("<strong>text</strong>"));
    }

    #[test]
    fn raw_html_passes_through() {
        let html = render_markdown("<div class=\"note\">hey</div>\n", &PlainHighlighter);
        assert!(html.contains("<div class=\"note\">hey</div>"));
    }

    #[test]
    fn smart_punctuation_applied() {
        let html = render_markdown("\"quoted\" -- it's", &PlainHighlighter);
        assert!(html.contains("\u{201c}quoted\u{201d}"));
        assert!(html.contains("\u{2019}"));
    }

    #[test]
    fn bare_urls_become_links() {
        let html = render_markdown("See https://example.com/docs.", &PlainHighlighter);
        assert!(html.contains(r#"<a href="https://example.com/docs">https://example.com/docs</a>."#));
    }

    #[test]
    fn urls_inside_links_not_double_linked() {
        let html = render_markdown("[https://a.dev](https://a.dev)", &PlainHighlighter);
        assert_eq!(html.matches("<a ").count(), 1);
    }

    #[test]
    fn urls_inside_code_not_linked() {
        let html = render_markdown("`https://a.dev`", &PlainHighlighter);
        assert!(!html.contains("<a "));
        assert!(html.contains("<code>https://a.dev</code>"));
    }

    #[test]
    fn urls_inside_raw_anchor_not_double_linked() {
        let html = render_markdown(
            "See <a href=\"https://a.dev\">https://a.dev</a> now, then https://b.dev",
            &PlainHighlighter,
        );
        assert_eq!(html.matches("<a ").count(), 2);
        assert!(html.contains(r#"<a href="https://a.dev">https://a.dev</a> now"#));
        assert!(html.contains(r#"<a href="https://b.dev">https://b.dev</a>"#));
    }

    #[test]
    fn balanced_parens_stay_in_url() {
        let html = render_markdown(
            "Read https://en.wikipedia.org/wiki/Rust_(language).",
            &PlainHighlighter,
        );
        assert!(html.contains(
            r#"<a href="https://en.wikipedia.org/wiki/Rust_(language)">https://en.wikipedia.org/wiki/Rust_(language)</a>."#
        ));
    }

    #[test]
    fn unbalanced_closing_paren_trimmed() {
        let html = render_markdown("(see https://a.dev/x)", &PlainHighlighter);
        assert!(html.contains(r#"<a href="https://a.dev/x">https://a.dev/x</a>)"#));
    }

    #[test]
    fn trim_url_cases() {
        assert_eq!(trim_url("https://a.dev/x)."), "https://a.dev/x");
        assert_eq!(trim_url("https://a.dev/(a)"), "https://a.dev/(a)");
        assert_eq!(trim_url("https://a.dev/(a))"), "https://a.dev/(a)");
        assert_eq!(trim_url("https://a.dev/?q=1!"), "https://a.dev/?q=1");
    }

    #[test]
    fn anchor_tag_detection() {
        assert!(opens_anchor("<a href=\"x\">"));
        assert!(opens_anchor("<A>"));
        assert!(!opens_anchor("<abbr>"));
        assert!(closes_anchor("</a>"));
        assert!(!closes_anchor("</abbr>"));
    }

    #[test]
    fn tables_enabled() {
        let html = render_markdown("| a | b |\n|---|---|\n| 1 | 2 |\n", &PlainHighlighter);
        assert!(html.contains("<table>"));
    }

    // =========================================================================
    // Code blocks
    // =========================================================================

    #[test]
    fn known_language_is_highlighted() {
        let md = "```rust\nfn main() {}\n```\n";
        let html = render_markdown(md, &SyntectHighlighter);
        assert!(html.contains(r#"<div class="code-block-container">"#));
        assert!(html.contains(r#"<pre class="language-rust">"#));
        assert!(html.contains("<span class=\""));
        assert!(html.contains(r#"onclick="copyCode(this)">Copy</button></div>"#));
    }

    #[test]
    fn unknown_language_falls_back_to_escaped_text() {
        let md = "```klingon\n<b>qapla'</b>\n```\n";
        let html = render_markdown(md, &SyntectHighlighter);
        assert!(html.contains(r#"<pre class="language-text">"#));
        assert!(html.contains("&lt;b&gt;qapla'&lt;/b&gt;"));
        assert!(html.contains("copy-button"));
    }

    #[test]
    fn missing_language_falls_back_to_text() {
        let html = render_markdown("```\nplain\n```\n", &SyntectHighlighter);
        assert!(html.contains(r#"<pre class="language-text"><code>plain"#));
    }

    #[test]
    fn indented_code_uses_same_container() {
        let html = render_markdown("    let x = 1;\n", &SyntectHighlighter);
        assert!(html.contains("code-block-container"));
        assert!(html.contains("language-text"));
    }

    #[test]
    fn alias_table_covers_toml() {
        let html = render_code_block("a = 1\n", Some("toml"), &SyntectHighlighter);
        assert!(html.contains(r#"<pre class="language-toml">"#));
    }

    #[test]
    fn fence_info_extra_words_ignored() {
        assert_eq!(fence_language("rust,ignore"), Some("rust"));
        assert_eq!(fence_language("python title=\"x\""), Some("python"));
        assert_eq!(fence_language(""), None);
    }

    #[test]
    fn declined_highlight_degrades_to_escaped_text() {
        let html = render_code_block("x < y", Some("rust"), &PlainHighlighter);
        assert!(html.contains(r#"<pre class="language-text"><code>x &lt; y</code></pre>"#));
    }

    // =========================================================================
    // Dates
    // =========================================================================

    #[test]
    fn format_date_long_form() {
        let date = parse_date("2024-01-15").unwrap();
        assert_eq!(format_date(date), "January 15, 2024");
        let date = parse_date("2024-01-05").unwrap();
        assert_eq!(format_date(date), "January 5, 2024");
    }

    #[test]
    fn timestamps_keep_written_day() {
        let date = parse_date("2024-03-01T23:30:00-08:00").unwrap();
        assert_eq!(format_date(date), "March 1, 2024");
    }

    #[test]
    fn rfc3339_without_seconds_accepted() {
        let date = parse_post_date("2024-01-15T10:30Z").unwrap();
        assert_eq!(format_date(date.day), "January 15, 2024");
        assert_eq!(date.instant.to_string(), "2024-01-15 10:30:00");
        assert!(parse_date("2024-01-15T10:30+02:00").is_some());
    }

    #[test]
    fn instants_order_within_a_day() {
        let morning = parse_post_date("2024-01-15T08:00:00Z").unwrap();
        let evening = parse_post_date("2024-01-15T20:00:00Z").unwrap();
        let plain = parse_post_date("2024-01-15").unwrap();
        assert_eq!(morning.day, evening.day);
        assert!(plain.instant < morning.instant);
        assert!(morning.instant < evening.instant);
    }

    #[test]
    fn offset_timestamps_sort_in_utc() {
        let early = parse_post_date("2024-01-15T10:00:00+05:00").unwrap();
        let late = parse_post_date("2024-01-15T08:00:00Z").unwrap();
        assert!(early.instant < late.instant);
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("").is_none());
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2023-02-29").is_none());
    }

    // =========================================================================
    // Reading time
    // =========================================================================

    #[test]
    fn reading_time_boundaries() {
        assert_eq!(reading_minutes(200, 200), 1);
        assert_eq!(reading_minutes(201, 200), 2);
        assert_eq!(reading_minutes(400, 200), 2);
        assert_eq!(reading_minutes(401, 200), 3);
    }

    #[test]
    fn reading_time_minimum_one_minute() {
        assert_eq!(calculate_reading_time("", 200), "1 min read");
        assert_eq!(calculate_reading_time("one two", 200), "1 min read");
    }

    #[test]
    fn reading_time_monotonic() {
        let mut previous = 0;
        for words in 0..1000 {
            let minutes = reading_minutes(words, 137);
            assert!(minutes >= previous);
            previous = minutes;
        }
    }

    #[test]
    fn reading_time_counts_whitespace_tokens() {
        let body = "word ".repeat(201);
        assert_eq!(calculate_reading_time(&body, 200), "2 min read");
        let body = "a\n\tb   c";
        assert_eq!(calculate_reading_time(body, 3), "1 min read");
        assert_eq!(calculate_reading_time(body, 2), "2 min read");
    }
}
