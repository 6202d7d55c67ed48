//! Image alt text and size report
//!
//! Every `<img src>` on a page is resolved, screened for tracking pixels, confirmed to
//! be an image (by extension, or by a HEAD request's content type) and measured. Probe
//! results are cached per image URL for the whole crawl, so an image shared by many
//! pages is only requested once.

use crate::config::CrawlerConfig;
use crate::crawler::{BodySize, Fetcher, Markup};
use crate::output::{row, yes_no, Row};
use crate::url::normalize;
use crate::visitor::{
    reject_unsuccessful, Finalized, Page, PageOutcome, ReportKind, VisitContext, Visitor,
};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use url::Url;

const HEADERS: &[&str] = &[
    "Page Title",
    "Page URL",
    "Image Src",
    "Alt Text",
    "Has Alt Attribute",
    "Extension",
    "Alt Too Long",
    "Size (bytes)",
    "Oversized",
    "Row Issue",
];

const IMAGE_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "webp", "svg", "bmp", "tif", "tiff", "ico", "avif",
];

const TRACKING_KEYWORDS: &[&str] = &[
    "facebook.com/tr",
    "connect.facebook.net",
    "google-analytics.com",
    "googletagmanager.com",
    "analytics.google.com",
    "doubleclick.net",
    "adservice.google.com",
    "stats.g.doubleclick.net",
    "adsystem",
    "adroll",
    "pixel.",
    "/pixel",
    "beacon",
    "optimizely",
    "hotjar",
    "mixpanel",
    "segment.com",
    "matomo",
    "clarity.ms",
];

/// The attributes of an `<img>` the report looks at
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ImageTag {
    src: String,
    alt: Option<String>,
    width: Option<String>,
    height: Option<String>,
    style: Option<String>,
}

/// Cached facts about one image URL
#[derive(Debug, Clone, Copy)]
struct Probe {
    is_image: bool,
    size: Option<BodySize>,
}

/// Returns true for analytics beacons and invisible 1x1 images
pub fn is_tracking_pixel(
    src: &Url,
    width: Option<&str>,
    height: Option<&str>,
    style: Option<&str>,
) -> bool {
    let url = src.as_str().to_ascii_lowercase();
    if TRACKING_KEYWORDS.iter().any(|k| url.contains(k)) {
        return true;
    }

    let width = width.map(str::trim).unwrap_or("");
    let height = height.map(str::trim).unwrap_or("");
    if width == "1" && height == "1" {
        return true;
    }

    let style = style.unwrap_or("").to_ascii_lowercase();
    style.contains("display:none") || (style.contains("width:1") && style.contains("height:1"))
}

/// Lowercased extension of the URL's last path segment, or empty
fn extension(url: &Url) -> String {
    let segment = url.path().rsplit('/').next().unwrap_or("");
    match segment.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_ascii_lowercase(),
        _ => String::new(),
    }
}

fn image_tags(markup: &Markup) -> Vec<ImageTag> {
    markup
        .select("img")
        .iter()
        .filter_map(|img| {
            let element = img.value();
            let src = element.attr("src").map(str::trim).filter(|s| !s.is_empty())?;
            Some(ImageTag {
                src: src.to_string(),
                alt: element.attr("alt").map(str::to_string),
                width: element.attr("width").map(str::to_string),
                height: element.attr("height").map(str::to_string),
                style: element.attr("style").map(str::to_string),
            })
        })
        .collect()
}

/// Reports alt text and size issues for every image on the site
#[derive(Debug)]
pub struct ImageVisitor {
    max_alt_length: usize,
    size_limit: u64,
    recorded: HashSet<(Url, Url)>,
    probes: HashMap<Url, Probe>,
    total: u64,
    issues: u64,
    missing_alt: u64,
    long_alt: u64,
    oversized: u64,
}

impl ImageVisitor {
    pub fn new(settings: &CrawlerConfig) -> Self {
        Self {
            max_alt_length: settings.max_alt_length,
            size_limit: settings.image_size_limit_bytes(),
            recorded: HashSet::new(),
            probes: HashMap::new(),
            total: 0,
            issues: 0,
            missing_alt: 0,
            long_alt: 0,
            oversized: 0,
        }
    }

    async fn probe(&mut self, fetcher: &Fetcher, src: &Url) -> Probe {
        if let Some(probe) = self.probes.get(src) {
            return *probe;
        }

        let known_extension = IMAGE_EXTENSIONS.contains(&extension(src).as_str());
        let head = match fetcher.head(src).await {
            Ok(head) => Some(head),
            Err(e) => {
                tracing::debug!("HEAD {} failed: {}", src, e);
                None
            }
        };

        let is_image = known_extension
            || head
                .as_ref()
                .and_then(|h| h.content_type())
                .is_some_and(|ct| ct.starts_with("image/"));

        let mut size = head
            .as_ref()
            .and_then(|h| h.content_length())
            .map(BodySize::Exact);
        if is_image && size.is_none() {
            size = match fetcher.probe_size(src, self.size_limit).await {
                Ok(size) => size,
                Err(e) => {
                    tracing::debug!("Could not measure {}: {}", src, e);
                    None
                }
            };
        }

        let probe = Probe { is_image, size };
        self.probes.insert(src.clone(), probe);
        probe
    }
}

#[async_trait]
impl Visitor for ImageVisitor {
    fn kind(&self) -> ReportKind {
        ReportKind::Images
    }

    fn headers(&self) -> &'static [&'static str] {
        HEADERS
    }

    async fn on_page(&mut self, page: &Page, ctx: &VisitContext<'_>) -> PageOutcome {
        if reject_unsuccessful(page) {
            return PageOutcome::stop();
        }

        let (title, tags) = {
            let markup = Markup::parse(&page.body);
            (
                markup.title().unwrap_or_else(|| "No title".to_string()),
                image_tags(&markup),
            )
        };

        let mut rows = Vec::new();
        for tag in tags {
            let src = match normalize(&tag.src, &page.final_url) {
                Ok(src) if matches!(src.scheme(), "http" | "https") => src,
                _ => continue,
            };

            if is_tracking_pixel(
                &src,
                tag.width.as_deref(),
                tag.height.as_deref(),
                tag.style.as_deref(),
            ) {
                tracing::debug!("Skipping tracking pixel {}", src);
                continue;
            }

            let key = (page.url.clone(), src.clone());
            if self.recorded.contains(&key) {
                continue;
            }

            let probe = self.probe(ctx.fetcher, &src).await;
            if !probe.is_image {
                continue;
            }
            self.recorded.insert(key);

            let alt = tag.alt.as_deref().unwrap_or("").trim().to_string();
            let missing_alt = alt.is_empty();
            let alt_too_long = alt.chars().count() > self.max_alt_length;
            let oversized = probe.size.is_some_and(|s| s.is_over(self.size_limit));
            let size = match probe.size {
                Some(BodySize::Exact(bytes)) => bytes.to_string(),
                Some(BodySize::Exceeds(cap)) => format!(">{}", cap),
                None => String::new(),
            };

            let issue = missing_alt || alt_too_long || oversized;
            self.total += 1;
            self.missing_alt += u64::from(missing_alt);
            self.long_alt += u64::from(alt_too_long);
            self.oversized += u64::from(oversized);
            self.issues += u64::from(issue);

            rows.push(row![
                title,
                page.url,
                src,
                alt,
                yes_no(tag.alt.is_some()),
                extension(&src),
                yes_no(alt_too_long),
                size,
                yes_no(oversized),
                u8::from(issue)
            ]);
        }

        PageOutcome::follow(rows)
    }

    fn finalize(&mut self) -> Finalized {
        let width = HEADERS.len();
        Finalized {
            rows: Vec::new(),
            summary: vec![
                Row::summary(width, 4, "Total Images with Issues:", self.issues),
                Row::summary(width, 4, "Images Missing Alt:", self.missing_alt),
                Row::summary(width, 4, "Images with Long Alt:", self.long_alt),
                Row::summary(width, 4, "Oversized Images:", self.oversized),
                Row::summary(width, 4, "Total Images:", self.total),
            ],
        }
    }
}
