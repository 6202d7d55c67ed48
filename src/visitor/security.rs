//! HTTPS, mixed content and security header report

use crate::crawler::{header_str, Markup};
use crate::output::{row, yes_no, Row};
use crate::visitor::{
    reject_unsuccessful, Finalized, Page, PageOutcome, ReportKind, VisitContext, Visitor,
};
use async_trait::async_trait;
use reqwest::header::HeaderMap;
use url::Url;

const HEADERS: &[&str] = &[
    "Page Title",
    "Page URL",
    "Protocol",
    "Is HTTP Page",
    "Has Mixed Content",
    "Mixed Items Count",
    "HSTS",
    "CSP",
    "X-Content-Type-Options",
    "X-Frame-Options",
    "Referrer-Policy",
    "Row Issue",
];

/// Response headers reported as present or absent, in column order
const SECURITY_HEADERS: &[&str] = &[
    "strict-transport-security",
    "content-security-policy",
    "x-content-type-options",
    "x-frame-options",
    "referrer-policy",
];

/// Collects the raw URLs of every subresource a page loads
///
/// Covers stylesheets, scripts, media and frames, and each candidate of a `srcset`.
fn resource_urls(markup: &Markup) -> Vec<String> {
    let mut resources = Vec::new();

    for link in markup.select("link[href]") {
        let element = link.value();
        let stylesheet = element
            .attr("rel")
            .is_some_and(|rel| rel.to_ascii_lowercase().contains("stylesheet"));
        if stylesheet || element.attr("as") == Some("style") {
            resources.extend(element.attr("href").map(str::to_string));
        }
    }

    for tag in markup.select("script[src], img[src], audio[src], video[src], source[src], iframe[src]") {
        resources.extend(tag.value().attr("src").map(str::to_string));
    }

    for tag in markup.select("img[srcset], source[srcset]") {
        if let Some(srcset) = tag.value().attr("srcset") {
            resources.extend(srcset_candidates(srcset));
        }
    }

    resources
}

/// Splits a `srcset` attribute into its candidate URLs
fn srcset_candidates(srcset: &str) -> Vec<String> {
    srcset
        .split(',')
        .filter_map(|candidate| candidate.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

/// Counts resources loaded over plain HTTP; only HTTPS pages can have mixed content
fn mixed_content_count(page_url: &Url, resources: &[String]) -> usize {
    if page_url.scheme() != "https" {
        return 0;
    }
    resources
        .iter()
        .filter_map(|raw| page_url.join(raw.trim()).ok())
        .filter(|resource| resource.scheme() == "http")
        .count()
}

fn header_present(headers: &HeaderMap, name: &str) -> bool {
    header_str(headers, name).is_some_and(|v| !v.trim().is_empty())
}

/// Reports HTTP pages, mixed content and missing security headers
#[derive(Debug, Default)]
pub struct SecurityVisitor {
    issues: u64,
    pages: u64,
    https: u64,
    http: u64,
    other: u64,
}

impl SecurityVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Visitor for SecurityVisitor {
    fn kind(&self) -> ReportKind {
        ReportKind::Security
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    async fn on_page(&mut self, page: &Page, _ctx: &VisitContext<'_>) -> PageOutcome {
        if reject_unsuccessful(page) {
            return PageOutcome::stop();
        }

        let (title, resources) = {
            let markup = Markup::parse(&page.body);
            (
                markup.title().unwrap_or_else(|| "No title".to_string()),
                resource_urls(&markup),
            )
        };

        // Redirects decide the protocol the page was actually served over
        let scheme = page.final_url.scheme();
        self.pages += 1;
        match scheme {
            "https" => self.https += 1,
            "http" => self.http += 1,
            _ => self.other += 1,
        }

        let is_http = scheme == "http";
        let mixed = mixed_content_count(&page.final_url, &resources);
        let issue = is_http || mixed > 0;
        self.issues += u64::from(issue);

        let mut fields = vec![
            title,
            page.url.to_string(),
            scheme.to_ascii_uppercase(),
            u8::from(is_http).to_string(),
            u8::from(mixed > 0).to_string(),
            mixed.to_string(),
        ];
        fields.extend(
            SECURITY_HEADERS
                .iter()
                .map(|name| yes_no(header_present(&page.headers, name)).to_string()),
        );
        fields.push(u8::from(issue).to_string());

        PageOutcome::follow(vec![Row::new(fields)])
    }

    fn finalize(&mut self) -> Finalized {
        let width = HEADERS.len();
        Finalized {
            rows: Vec::new(),
            summary: vec![
                Row::summary(width, 10, "Total Rows with Issues:", self.issues),
                Row::summary(width, 10, "Summary - ALL Pages:", self.pages),
                Row::summary(width, 10, "Summary - HTTPS Pages:", self.https),
                Row::summary(width, 10, "Summary - HTTP Pages:", self.http),
                Row::summary(width, 10, "Summary - Other Pages:", self.other),
            ],
        }
    }
}
