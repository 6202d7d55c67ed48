//! Missing meta description report

use crate::crawler::{element_text, Markup};
use crate::output::{row, Row};
use crate::url::normalize;
use crate::visitor::{
    reject_unsuccessful, Finalized, Page, PageOutcome, ReportKind, VisitContext, Visitor,
};
use async_trait::async_trait;
use scraper::Selector;

const HEADERS: &[&str] = &["Post Name", "Post URL", "Meta Description", "Posts with Issues"];

const NO_DESCRIPTION: &str = "No description";
const NO_HEADLINE: &str = "No headline";

/// Reports pages without a meta description, one row per linked `<article>`
#[derive(Debug, Default)]
pub struct MetaVisitor {
    issues: u64,
    pages: u64,
    pages_missing: u64,
    pages_with_meta: u64,
    article_rows: u64,
    article_rows_missing: u64,
}

impl MetaVisitor {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Page description from Open Graph, falling back to the standard meta tag
fn page_description(markup: &Markup) -> Option<String> {
    markup
        .meta_content("property", "og:description")
        .or_else(|| markup.meta_content("name", "description"))
}

/// Headline and link of every `<article>` that contains a hyperlink
fn articles(markup: &Markup) -> Vec<(String, String)> {
    let (Ok(h2), Ok(anchor)) = (Selector::parse("h2"), Selector::parse("a[href]")) else {
        return Vec::new();
    };

    markup
        .select("article")
        .iter()
        .filter_map(|article| {
            let href = article.select(&anchor).next()?.value().attr("href")?.to_string();
            let headline = article
                .select(&h2)
                .next()
                .map(|h| element_text(&h))
                .unwrap_or_else(|| NO_HEADLINE.to_string());
            Some((headline, href))
        })
        .collect()
}

#[async_trait]
impl Visitor for MetaVisitor {
    fn kind(&self) -> ReportKind {
        ReportKind::Meta
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    async fn on_page(&mut self, page: &Page, _ctx: &VisitContext<'_>) -> PageOutcome {
        if reject_unsuccessful(page) {
            return PageOutcome::stop();
        }

        let (description, articles) = {
            let markup = Markup::parse(&page.body);
            (page_description(&markup), articles(&markup))
        };

        self.pages += 1;
        let missing = description.is_none();
        if missing {
            self.issues += 1;
            self.pages_missing += 1;
        } else {
            self.pages_with_meta += 1;
        }
        let description = description.unwrap_or_else(|| NO_DESCRIPTION.to_string());

        let mut rows = Vec::with_capacity(articles.len());
        for (headline, href) in articles {
            let link = normalize(&href, &page.final_url)
                .map(|u| u.to_string())
                .unwrap_or(href);
            rows.push(row![headline, link, description, self.issues]);
            self.article_rows += 1;
            if missing {
                self.article_rows_missing += 1;
            }
        }

        PageOutcome::follow(rows)
    }

    fn finalize(&mut self) -> Finalized {
        let width = HEADERS.len();
        Finalized {
            rows: Vec::new(),
            summary: vec![
                Row::summary(width, 2, "Total Posts with Issues:", self.issues),
                Row::summary(width, 2, "Summary - Total Pages Crawled:", self.pages),
                Row::summary(width, 2, "Summary - Pages Missing Meta:", self.pages_missing),
                Row::summary(width, 2, "Summary - Pages With Meta:", self.pages_with_meta),
                Row::summary(width, 2, "Summary - Total Article Rows:", self.article_rows),
                Row::summary(
                    width,
                    2,
                    "Summary - Article Rows Missing Meta:",
                    self.article_rows_missing,
                ),
            ],
        }
    }
}
