//! Template loading and `{{token}}` substitution.
//!
//! Templates are plain HTML files in the template directory, one per page
//! type (`blog.html`, `homepage.html`, plus any secondary pages). They carry
//! `{{token}}` placeholders from a closed vocabulary (see [`Token`]):
//!
//! - **Per-page tokens** come from [`PageData`]. A token a page does not set
//!   resolves to the empty string, so one template can serve several page
//!   types.
//! - **Site tokens** come from [`SiteConfig`] and resolve the same way on
//!   every page, including the generated navigation and social-link
//!   fragments.
//!
//! Substitution is a single left-to-right pass. Substituted values are never
//! scanned again, so a post body that happens to contain `{{title}}` comes
//! out literally. Placeholders outside the vocabulary are left untouched.

use crate::config::{NavEntry, SiteConfig, SocialLink};
use crate::content::PostSummary;
use crate::render::{format_date, parse_date};
use chrono::Datelike;
use maud::{Markup, html};
use regex::{Captures, Regex};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{([A-Za-z]+)\}\}").expect("placeholder pattern must compile")
});

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Template '{name}' not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },
    #[error("IO error reading template '{name}': {source}")]
    Io {
        name: String,
        source: std::io::Error,
    },
}

/// A loaded template.
#[derive(Debug, Clone)]
pub struct Template {
    pub name: String,
    pub source: String,
}

/// Path of template `name` inside `dir`.
pub fn template_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{name}.html"))
}

/// Load `<dir>/<name>.html`.
pub fn load_template(dir: &Path, name: &str) -> Result<Template, TemplateError> {
    let path = template_path(dir, name);
    match fs::read_to_string(&path) {
        Ok(source) => Ok(Template {
            name: name.to_string(),
            source,
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(TemplateError::NotFound {
            name: name.to_string(),
            path,
        }),
        Err(source) => Err(TemplateError::Io {
            name: name.to_string(),
            source,
        }),
    }
}

// ============================================================================
// Vocabulary
// ============================================================================

/// Every placeholder the engine knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Title,
    Excerpt,
    Date,
    DateIso,
    ReadingTime,
    Content,
    Slug,
    Posts,
    CurrentYear,
    SiteName,
    SiteTitle,
    SiteSubtitle,
    SiteDescription,
    SiteUrl,
    SiteFavicon,
    SiteBanner,
    AuthorName,
    AuthorTitle,
    AuthorJobTitle,
    AuthorRecognition,
    AuthorBio,
    AuthorAvatar,
    AuthorContactEmail,
    AuthorContactTwitter,
    AuthorSocialLinksJson,
    SeoKeywords,
    SeoKeywordsJson,
    SeoTechnologiesJson,
    Navigation,
    NavigationWithActive,
    ProfileNavigation,
    ProfileNavigationWithActive,
    SocialLinks,
}

impl Token {
    pub const ALL: [Token; 33] = [
        Token::Title,
        Token::Excerpt,
        Token::Date,
        Token::DateIso,
        Token::ReadingTime,
        Token::Content,
        Token::Slug,
        Token::Posts,
        Token::CurrentYear,
        Token::SiteName,
        Token::SiteTitle,
        Token::SiteSubtitle,
        Token::SiteDescription,
        Token::SiteUrl,
        Token::SiteFavicon,
        Token::SiteBanner,
        Token::AuthorName,
        Token::AuthorTitle,
        Token::AuthorJobTitle,
        Token::AuthorRecognition,
        Token::AuthorBio,
        Token::AuthorAvatar,
        Token::AuthorContactEmail,
        Token::AuthorContactTwitter,
        Token::AuthorSocialLinksJson,
        Token::SeoKeywords,
        Token::SeoKeywordsJson,
        Token::SeoTechnologiesJson,
        Token::Navigation,
        Token::NavigationWithActive,
        Token::ProfileNavigation,
        Token::ProfileNavigationWithActive,
        Token::SocialLinks,
    ];

    /// Name as written between the braces.
    pub fn name(self) -> &'static str {
        match self {
            Token::Title => "title",
            Token::Excerpt => "excerpt",
            Token::Date => "date",
            Token::DateIso => "dateISO",
            Token::ReadingTime => "readingTime",
            Token::Content => "content",
            Token::Slug => "slug",
            Token::Posts => "posts",
            Token::CurrentYear => "currentYear",
            Token::SiteName => "siteName",
            Token::SiteTitle => "siteTitle",
            Token::SiteSubtitle => "siteSubtitle",
            Token::SiteDescription => "siteDescription",
            Token::SiteUrl => "siteUrl",
            Token::SiteFavicon => "siteFavicon",
            Token::SiteBanner => "siteBanner",
            Token::AuthorName => "authorName",
            Token::AuthorTitle => "authorTitle",
            Token::AuthorJobTitle => "authorJobTitle",
            Token::AuthorRecognition => "authorRecognition",
            Token::AuthorBio => "authorBio",
            Token::AuthorAvatar => "authorAvatar",
            Token::AuthorContactEmail => "authorContactEmail",
            Token::AuthorContactTwitter => "authorContactTwitter",
            Token::AuthorSocialLinksJson => "authorSocialLinksJson",
            Token::SeoKeywords => "seoKeywords",
            Token::SeoKeywordsJson => "seoKeywordsJson",
            Token::SeoTechnologiesJson => "seoTechnologiesJson",
            Token::Navigation => "navigation",
            Token::NavigationWithActive => "navigationWithActive",
            Token::ProfileNavigation => "profileNavigation",
            Token::ProfileNavigationWithActive => "profileNavigationWithActive",
            Token::SocialLinks => "socialLinks",
        }
    }

    pub fn from_name(name: &str) -> Option<Token> {
        Token::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Per-page values. Empty strings mean "not set for this page".
#[derive(Debug, Clone, Default)]
pub struct PageData {
    pub title: String,
    pub excerpt: String,
    /// Display date, e.g. `January 15, 2024`.
    pub date: String,
    /// Date as written in the manifest.
    pub date_iso: String,
    pub reading_time: String,
    /// Rendered body HTML.
    pub content: String,
    pub slug: String,
    /// Concatenated post cards (homepage only).
    pub posts: String,
    /// Defaults to the year of the run.
    pub current_year: Option<i32>,
}

// ============================================================================
// Substitution
// ============================================================================

/// Replace every recognized `{{token}}` in `template`.
///
/// `active` marks navigation entries whose href contains it as active.
pub fn substitute(
    template: &str,
    page: &PageData,
    config: &SiteConfig,
    active: Option<&str>,
) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match Token::from_name(&caps[1]) {
            Some(token) => resolve(token, page, config, active),
            None => caps[0].to_string(),
        })
        .into_owned()
}

/// Resolved value of one token. Total over the vocabulary.
pub fn resolve(token: Token, page: &PageData, config: &SiteConfig, active: Option<&str>) -> String {
    let site = &config.site;
    let author = &config.author;
    match token {
        Token::Title => page.title.clone(),
        Token::Excerpt => page.excerpt.clone(),
        Token::Date => page.date.clone(),
        Token::DateIso => page.date_iso.clone(),
        Token::ReadingTime => page.reading_time.clone(),
        Token::Content => page.content.clone(),
        Token::Slug => page.slug.clone(),
        Token::Posts => page.posts.clone(),
        Token::CurrentYear => page
            .current_year
            .unwrap_or_else(|| chrono::Local::now().year())
            .to_string(),
        Token::SiteName => config.display_name().to_string(),
        Token::SiteTitle => site.title.clone(),
        Token::SiteSubtitle => config.subtitle().to_string(),
        Token::SiteDescription => site.description.clone(),
        Token::SiteUrl => site.url.clone(),
        Token::SiteFavicon => site.favicon.clone(),
        Token::SiteBanner => site.banner.clone(),
        Token::AuthorName => author.name.clone(),
        Token::AuthorTitle => author.title.clone(),
        Token::AuthorJobTitle => author.job_title.clone(),
        Token::AuthorRecognition => config.recognition().to_string(),
        Token::AuthorBio => author.bio.clone(),
        Token::AuthorAvatar => author.avatar.clone(),
        Token::AuthorContactEmail => author.contact.email.clone(),
        Token::AuthorContactTwitter => author.contact.twitter.clone(),
        Token::AuthorSocialLinksJson => {
            let hrefs: Vec<&str> = author.social_links.iter().map(|l| l.href.as_str()).collect();
            json_array(&hrefs)
        }
        Token::SeoKeywords => config.seo.keywords.join(", "),
        Token::SeoKeywordsJson => json_array(&config.seo.keywords),
        Token::SeoTechnologiesJson => json_array(&config.seo.technologies),
        Token::Navigation | Token::NavigationWithActive => {
            render_navigation(&config.navigation, active).into_string()
        }
        Token::ProfileNavigation | Token::ProfileNavigationWithActive => {
            render_profile_navigation(&config.navigation, active).into_string()
        }
        Token::SocialLinks => render_social_links(&author.social_links).into_string(),
    }
}

fn json_array<S: serde::Serialize>(items: &[S]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

// ============================================================================
// Fragments
// ============================================================================

fn is_active(entry: &NavEntry, active: Option<&str>) -> bool {
    active.is_some_and(|key| !key.is_empty() && entry.href.contains(key))
}

fn nav_link_class(entry: &NavEntry, active: Option<&str>) -> &'static str {
    if is_active(entry, active) {
        "nav-link active"
    } else {
        "nav-link"
    }
}

fn icon_svg(path_data: &str, size: u32) -> Markup {
    html! {
        svg width=(size) height=(size) viewBox="0 0 24 24" fill="currentColor" {
            path d=(path_data) {}
        }
    }
}

/// Top bar navigation: `<li class="nav-item">` entries with 16px icons.
pub fn render_navigation(entries: &[NavEntry], active: Option<&str>) -> Markup {
    html! {
        @for entry in entries {
            li.nav-item {
                a href=(entry.href) class=(nav_link_class(entry, active))
                    target=[entry.external.then_some("_blank")]
                    rel=[entry.external.then_some("noopener noreferrer")] {
                    @if let Some(icon) = &entry.icon {
                        (icon_svg(icon, 16))
                    }
                    span { (entry.label) }
                }
            }
        }
    }
}

/// Compact profile navigation: bare `<li>` entries with 14px icons.
pub fn render_profile_navigation(entries: &[NavEntry], active: Option<&str>) -> Markup {
    html! {
        @for entry in entries {
            li {
                a href=(entry.href) class=(nav_link_class(entry, active))
                    target=[entry.external.then_some("_blank")]
                    rel=[entry.external.then_some("noopener noreferrer")] {
                    @if let Some(icon) = &entry.icon {
                        (icon_svg(icon, 14))
                    }
                    span { (entry.label) }
                }
            }
        }
    }
}

pub fn render_social_links(links: &[SocialLink]) -> Markup {
    html! {
        @for link in links {
            a.social-link href=(link.href) aria-label=(link.label)
                target="_blank" rel="noopener noreferrer" {
                (icon_svg(&link.icon_path, 20))
            }
        }
    }
}

/// Homepage card for one post, linking to `/<output_dir>/<slug>/`.
pub fn render_post_card(post: &PostSummary, output_dir: &str) -> Markup {
    let href = format!("/{}/{}/", output_dir.trim_matches('/'), post.slug);
    let display_date = parse_date(&post.date)
        .map(format_date)
        .unwrap_or_else(|| post.date.clone());
    html! {
        article.post-card {
            div.post-meta {
                time.post-date datetime=(post.date) { (display_date) }
            }
            h3.post-title {
                a href=(href) { (post.title) }
            }
            p.post-excerpt { (post.excerpt) }
            div.post-actions {
                a.read-more href=(href) { "Read More →" }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AuthorConfig, SiteInfo};
    use tempfile::TempDir;

    fn config() -> SiteConfig {
        let mut config = SiteConfig {
            site: SiteInfo {
                name: "everyday.dev".to_string(),
                title: "EverydayDev".to_string(),
                ..Default::default()
            },
            author: AuthorConfig {
                name: "Maye".to_string(),
                job_title: "Engineer".to_string(),
                bio: "Writes code".to_string(),
                ..Default::default()
            },
            ..Default::default()
        };
        config.navigation = vec![
            NavEntry {
                label: "Reads".to_string(),
                href: "/reads/".to_string(),
                external: false,
                icon: None,
            },
            NavEntry {
                label: "Speaking".to_string(),
                href: "/speaking/".to_string(),
                external: false,
                icon: Some("M0 0h24v24H0z".to_string()),
            },
            NavEntry {
                label: "GitHub".to_string(),
                href: "https://github.com/x".to_string(),
                external: true,
                icon: None,
            },
        ];
        config.seo.keywords = vec!["rust".to_string(), "web".to_string()];
        config
    }

    // =========================================================================
    // Substitution
    // =========================================================================

    #[test]
    fn text_without_tokens_unchanged() {
        let src = "<html><body>{ not } {{ spaced }} {single}</body></html>";
        assert_eq!(substitute(src, &PageData::default(), &config(), None), src);
    }

    #[test]
    fn unknown_tokens_left_verbatim() {
        let out = substitute("{{title}} {{nope}}", &PageData::default(), &config(), None);
        assert_eq!(out, " {{nope}}");
    }

    #[test]
    fn replaces_every_occurrence() {
        let page = PageData {
            title: "Hi".to_string(),
            ..Default::default()
        };
        let out = substitute("{{title}}|{{title}}|{{title}}", &page, &config(), None);
        assert_eq!(out, "Hi|Hi|Hi");
    }

    #[test]
    fn substituted_values_not_rescanned() {
        let page = PageData {
            content: "<p>{{title}}</p>".to_string(),
            title: "Hi".to_string(),
            ..Default::default()
        };
        let out = substitute("{{title}}: {{content}}", &page, &config(), None);
        assert_eq!(out, "Hi: <p>{{title}}</p>");
    }

    #[test]
    fn every_token_resolves_without_page_data() {
        let config = config();
        for token in Token::ALL {
            let src = format!("{{{{{}}}}}", token.name());
            let out = substitute(&src, &PageData::default(), &config, None);
            assert!(!out.contains("{{"), "{} was not replaced", token.name());
        }
    }

    #[test]
    fn token_names_round_trip() {
        for token in Token::ALL {
            assert_eq!(Token::from_name(token.name()), Some(token));
        }
        assert_eq!(Token::from_name("Title"), None);
    }

    #[test]
    fn site_fallbacks_apply() {
        let mut config = config();
        let page = PageData::default();
        let src = "{{siteName}}/{{siteSubtitle}}/{{authorRecognition}}";
        assert_eq!(
            substitute(src, &page, &config, None),
            "everyday.dev/Writes code/Engineer"
        );

        config.site.text_logo = "ED".to_string();
        config.site.subtitle = "Notes".to_string();
        config.author.recognition = "GDE".to_string();
        assert_eq!(substitute(src, &page, &config, None), "ED/Notes/GDE");
    }

    #[test]
    fn current_year_from_page_or_run() {
        let page = PageData {
            current_year: Some(1999),
            ..Default::default()
        };
        assert_eq!(substitute("{{currentYear}}", &page, &config(), None), "1999");
        let out = substitute("{{currentYear}}", &PageData::default(), &config(), None);
        assert_eq!(out, chrono::Local::now().year().to_string());
    }

    #[test]
    fn json_and_joined_seo_tokens() {
        let mut config = config();
        config.author.social_links = vec![SocialLink {
            label: "GitHub".to_string(),
            href: "https://github.com/x".to_string(),
            icon_path: "M1".to_string(),
        }];
        let page = PageData::default();
        assert_eq!(substitute("{{seoKeywords}}", &page, &config, None), "rust, web");
        assert_eq!(
            substitute("{{seoKeywordsJson}}", &page, &config, None),
            r#"["rust","web"]"#
        );
        assert_eq!(substitute("{{seoTechnologiesJson}}", &page, &config, None), "[]");
        assert_eq!(
            substitute("{{authorSocialLinksJson}}", &page, &config, None),
            r#"["https://github.com/x"]"#
        );
    }

    // =========================================================================
    // Fragments
    // =========================================================================

    #[test]
    fn navigation_marks_active_entry() {
        let html = render_navigation(&config().navigation, Some("speaking")).into_string();
        assert!(html.contains(r#"<a href="/speaking/" class="nav-link active">"#));
        assert!(html.contains(r#"<a href="/reads/" class="nav-link">"#));
        assert_eq!(html.matches("nav-link active").count(), 1);
    }

    #[test]
    fn navigation_without_active_key_marks_nothing() {
        for active in [None, Some("")] {
            let html = render_navigation(&config().navigation, active).into_string();
            assert!(!html.contains("active"));
        }
    }

    #[test]
    fn navigation_icons_and_external_links() {
        let html = render_navigation(&config().navigation, None).into_string();
        assert_eq!(html.matches(r#"<li class="nav-item">"#).count(), 3);
        assert!(html.contains(r#"<svg width="16" height="16" viewBox="0 0 24 24" fill="currentColor"><path d="M0 0h24v24H0z"></path></svg>"#));
        assert!(html.contains(r#"target="_blank" rel="noopener noreferrer""#));
        assert_eq!(html.matches("target=").count(), 1);
        assert!(html.contains("<span>GitHub</span>"));
    }

    #[test]
    fn profile_navigation_is_compact() {
        let html = render_profile_navigation(&config().navigation, Some("reads")).into_string();
        assert!(html.starts_with("<li><a href=\"/reads/\" class=\"nav-link active\">"));
        assert!(html.contains(r#"width="14""#));
        assert!(!html.contains("nav-item"));
    }

    #[test]
    fn social_links_open_in_new_tab() {
        let links = vec![SocialLink {
            label: "GitHub".to_string(),
            href: "https://github.com/x".to_string(),
            icon_path: "M1 1".to_string(),
        }];
        let html = render_social_links(&links).into_string();
        assert!(html.contains(r#"class="social-link""#));
        assert!(html.contains(r#"aria-label="GitHub""#));
        assert!(html.contains(r#"<path d="M1 1"></path>"#));
        assert!(html.contains(r#"width="20""#));
    }

    #[test]
    fn post_card_links_and_escapes() {
        let post = PostSummary {
            slug: "hello-world".to_string(),
            title: "Tom & Jerry".to_string(),
            excerpt: "<b>hi</b>".to_string(),
            date: "2024-01-15".to_string(),
            reading_time: None,
        };
        let html = render_post_card(&post, "reads").into_string();
        assert!(html.contains(r#"<a href="/reads/hello-world/">Tom &amp; Jerry</a>"#));
        assert!(html.contains("&lt;b&gt;hi&lt;/b&gt;"));
        assert!(html.contains(r#"datetime="2024-01-15">January 15, 2024</time>"#));
        assert!(html.contains(r#"class="read-more""#));
        assert_eq!(html.matches(r#"href="/reads/hello-world/""#).count(), 2);
    }

    // =========================================================================
    // Loading
    // =========================================================================

    #[test]
    fn load_template_by_name() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("blog.html"), "<h1>{{title}}</h1>").unwrap();
        let template = load_template(tmp.path(), "blog").unwrap();
        assert_eq!(template.name, "blog");
        assert_eq!(template.source, "<h1>{{title}}</h1>");
    }

    #[test]
    fn missing_template_is_not_found() {
        let tmp = TempDir::new().unwrap();
        let err = load_template(tmp.path(), "speaking").unwrap_err();
        assert!(matches!(err, TemplateError::NotFound { ref name, .. } if name == "speaking"));
        assert!(err.to_string().contains("speaking.html"));
    }
}
