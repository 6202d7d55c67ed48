//! HTML helpers for link extraction and content lookup
//!
//! This module wraps `scraper` with the handful of queries the engine and the visitors
//! need:
//! - the page title
//! - all elements matching a tag or selector
//! - hyperlink targets in document order
//! - trimmed text content
//!
//! `scraper::Html` is not `Send`, so a [`Markup`] must be dropped before the owning
//! async task awaits.

use crate::url::{is_same_site, resolve_link};
use scraper::{ElementRef, Html, Selector};
use url::Url;

/// A parsed HTML document
pub struct Markup {
    document: Html,
}

impl Markup {
    /// Parses an HTML document; malformed markup is repaired, never rejected
    pub fn parse(body: &str) -> Self {
        Self {
            document: Html::parse_document(body),
        }
    }

    /// Returns the trimmed `<title>` text, or None when absent or empty
    pub fn title(&self) -> Option<String> {
        self.select("title")
            .into_iter()
            .next()
            .map(|element| element_text(&element))
            .filter(|s| !s.is_empty())
    }

    /// Returns all elements matching a CSS selector, in document order
    ///
    /// An invalid selector matches nothing.
    pub fn select(&self, css: &str) -> Vec<ElementRef<'_>> {
        match Selector::parse(css) {
            Ok(selector) => self.document.select(&selector).collect(),
            Err(_) => {
                tracing::debug!("Invalid selector: {}", css);
                Vec::new()
            }
        }
    }

    /// Returns the trimmed, non-empty texts of all elements matching `css`
    pub fn texts(&self, css: &str) -> Vec<String> {
        self.select(css)
            .iter()
            .map(element_text)
            .filter(|text| !text.is_empty())
            .collect()
    }

    /// Returns the raw `href` attribute of every `<a href>` in document order
    pub fn hrefs(&self) -> Vec<String> {
        self.select("a[href]")
            .iter()
            .filter_map(|element| element.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    /// Returns the trimmed `content` of the first `<meta>` whose `attr` equals `value`
    pub fn meta_content(&self, attr: &str, value: &str) -> Option<String> {
        self.select("meta")
            .into_iter()
            .filter(|element| element.value().attr(attr) == Some(value))
            .filter_map(|element| element.value().attr("content"))
            .map(|content| content.trim().to_string())
            .find(|content| !content.is_empty())
    }

    /// Resolves every hyperlink against `page_url`, keeping the crawlable ones
    pub fn links(&self, page_url: &Url) -> Vec<Url> {
        self.hrefs()
            .iter()
            .filter_map(|href| resolve_link(href, page_url))
            .collect()
    }
}

/// Collects an element's text content with surrounding whitespace trimmed
pub fn element_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Extracts the links of a page that stay on the seed's site
///
/// Links are returned normalized and in the order they appear in the markup.
/// Duplicates are kept; the frontier tracker filters them.
pub fn extract_same_site_links(body: &str, page_url: &Url, seed: &Url) -> Vec<Url> {
    Markup::parse(body)
        .links(page_url)
        .into_iter()
        .filter(|link| is_same_site(link, seed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page_url() -> Url {
        Url::parse("https://example.com/blog/").unwrap()
    }

    #[test]
    fn test_extract_title() {
        let markup = Markup::parse("<html><head><title>  Test Page  </title></head></html>");
        assert_eq!(markup.title(), Some("Test Page".to_string()));
    }

    #[test]
    fn test_no_title() {
        let markup = Markup::parse("<html><head><title>   </title></head></html>");
        assert_eq!(markup.title(), None);
    }

    #[test]
    fn test_texts_skip_empty() {
        let markup = Markup::parse("<h1> One </h1><h1></h1><h1>Two</h1>");
        assert_eq!(markup.texts("h1"), vec!["One", "Two"]);
    }

    #[test]
    fn test_invalid_selector_matches_nothing() {
        let markup = Markup::parse("<p>text</p>");
        assert!(markup.select("p[").is_empty());
    }

    #[test]
    fn test_meta_content() {
        let markup = Markup::parse(
            r#"<head>
            <meta property="og:title" content="Title">
            <meta property="og:description" content="  About us  ">
            </head>"#,
        );
        assert_eq!(
            markup.meta_content("property", "og:description"),
            Some("About us".to_string())
        );
        assert_eq!(markup.meta_content("name", "description"), None);
    }

    #[test]
    fn test_links_keep_document_order() {
        let markup = Markup::parse(
            r#"<a href="/b">B</a><a href="a#x">A</a><a href="mailto:x@y.z">M</a>
               <a href="https://other.com/">O</a>"#,
        );
        let links: Vec<String> = markup
            .links(&page_url())
            .iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(
            links,
            vec![
                "https://example.com/b",
                "https://example.com/blog/a",
                "https://other.com/"
            ]
        );
    }

    #[test]
    fn test_extract_same_site_links() {
        let body = r#"<a href="/one">1</a><a href="http://example.com/two">2</a>
                      <a href="https://cdn.example.com/three">3</a>"#;
        let links = extract_same_site_links(body, &page_url(), &page_url());
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].as_str(), "https://example.com/one");
        assert_eq!(links[1].as_str(), "http://example.com/two");
    }
}
