//! HTML extraction of article fields
//!
//! This module pulls the structured parts of an article out of a page:
//! - Title (`og:title`, then `<title>`, then the first `<h1>`)
//! - Authors from author meta tags and `rel="author"` links
//! - Body text from paragraphs, preferring those inside `<article>`
//! - Publish date
//! - Raw outbound hrefs, left unresolved for the link pipeline

use scraper::{ElementRef, Html, Selector};

/// Fields extracted from one HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedPage {
    pub title: Option<String>,
    pub authors: Vec<String>,

    /// Paragraph text joined by blank lines; empty when nothing was found
    pub text: String,

    pub published: Option<String>,

    /// Link targets exactly as written in the page (trimmed)
    pub hrefs: Vec<String>,
}

/// Parses HTML content and extracts the article fields
///
/// # Link Extraction Rules
///
/// **Include:**
/// - `<a href="...">` tags inside `<article>` when the page has one,
///   otherwise anywhere in the document
///
/// **Exclude:**
/// - `<a href="..." download>`
/// - `javascript:`, `mailto:`, `tel:` links
/// - Data URIs
/// - Fragment-only links
///
/// # Example
///
/// ```
/// use articlesa::fetch::extract_article;
///
/// let html = r#"<html><head><title>Test</title></head><body><p>Hello</p><a href="/page">Link</a></body></html>"#;
/// let page = extract_article(html);
/// assert_eq!(page.title.as_deref(), Some("Test"));
/// assert_eq!(page.text, "Hello");
/// assert_eq!(page.hrefs, vec!["/page".to_string()]);
/// ```
pub fn extract_article(html: &str) -> ExtractedPage {
    let document = Html::parse_document(html);
    let article = selector("article").and_then(|s| document.select(&s).next());

    ExtractedPage {
        title: extract_title(&document),
        authors: extract_authors(&document),
        text: extract_text(&document, article),
        published: extract_published(&document),
        hrefs: extract_hrefs(&document, article),
    }
}

fn selector(css: &str) -> Option<Selector> {
    Selector::parse(css).ok()
}

/// Collapses runs of whitespace in an element's text
fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn meta_content(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .filter_map(|e| e.value().attr("content"))
        .map(|c| c.trim().to_string())
        .find(|c| !c.is_empty())
}

fn first_text(document: &Html, css: &str) -> Option<String> {
    let sel = selector(css)?;
    document
        .select(&sel)
        .map(element_text)
        .find(|t| !t.is_empty())
}

fn extract_title(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="og:title"]"#)
        .or_else(|| first_text(document, "title"))
        .or_else(|| first_text(document, "h1"))
}

fn extract_authors(document: &Html) -> Vec<String> {
    let mut authors: Vec<String> = Vec::new();
    let mut push = |name: String| {
        if !name.is_empty() && !authors.contains(&name) {
            authors.push(name);
        }
    };

    for css in [r#"meta[name="author"]"#, r#"meta[property="article:author"]"#] {
        if let Some(sel) = selector(css) {
            for element in document.select(&sel) {
                if let Some(content) = element.value().attr("content") {
                    push(content.trim().to_string());
                }
            }
        }
    }

    if let Some(sel) = selector(r#"[rel="author"]"#) {
        for element in document.select(&sel) {
            push(element_text(element));
        }
    }

    authors
}

fn extract_text(document: &Html, article: Option<ElementRef<'_>>) -> String {
    let Some(p) = selector("p") else {
        return String::new();
    };

    let collect = |paragraphs: Vec<String>| {
        paragraphs
            .into_iter()
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    if let Some(article) = article {
        let text = collect(article.select(&p).map(element_text).collect());
        if !text.is_empty() {
            return text;
        }
    }

    collect(document.select(&p).map(element_text).collect())
}

fn extract_published(document: &Html) -> Option<String> {
    meta_content(document, r#"meta[property="article:published_time"]"#).or_else(|| {
        let sel = selector("time[datetime]")?;
        document
            .select(&sel)
            .filter_map(|e| e.value().attr("datetime"))
            .map(|d| d.trim().to_string())
            .find(|d| !d.is_empty())
    })
}

fn extract_hrefs(document: &Html, article: Option<ElementRef<'_>>) -> Vec<String> {
    let Some(a) = selector("a[href]") else {
        return Vec::new();
    };

    let anchors: Vec<ElementRef<'_>> = match article {
        Some(article) => article.select(&a).collect(),
        None => document.select(&a).collect(),
    };

    anchors
        .into_iter()
        // Skip if it has the download attribute
        .filter(|e| e.value().attr("download").is_none())
        .filter_map(|e| e.value().attr("href"))
        .map(str::trim)
        .filter(|href| is_followable(href))
        .map(str::to_string)
        .collect()
}

/// Returns false for hrefs that can never name another article
fn is_followable(href: &str) -> bool {
    if href.is_empty() || href.starts_with('#') {
        return false;
    }

    let lower = href.to_ascii_lowercase();
    !(lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:"))
}
