use crate::UrlError;
use url::Url;

/// Link prefixes that never point at a crawlable page
const SKIPPED_PREFIXES: &[&str] = &["javascript:", "mailto:", "tel:", "data:"];

/// Normalizes a raw URL reference against a base URL
///
/// # Normalization Steps
///
/// 1. Resolve `raw` relative to `base` (scheme, authority, `.` and `..` segments)
/// 2. Remove fragment (everything after #)
///
/// Trailing slashes and query strings are kept exactly as resolution produced them, so
/// `/page` and `/page/` remain two different URLs.
///
/// # Arguments
///
/// * `raw` - The href or URL string to normalize
/// * `base` - The URL `raw` is resolved against
///
/// # Returns
///
/// * `Ok(Url)` - Absolute, fragment-free URL
/// * `Err(UrlError::Invalid)` - `raw` could not be parsed at all
///
/// # Examples
///
/// ```
/// use seo_sweep::url::normalize;
/// use url::Url;
///
/// let base = Url::parse("https://example.com/blog/").unwrap();
/// let url = normalize("../about#team", &base).unwrap();
/// assert_eq!(url.as_str(), "https://example.com/about");
/// ```
pub fn normalize(raw: &str, base: &Url) -> Result<Url, UrlError> {
    let mut url = base.join(raw.trim()).map_err(|e| UrlError::Invalid {
        raw: raw.to_string(),
        reason: e.to_string(),
    })?;

    url.set_fragment(None);

    Ok(url)
}

/// Resolves a hyperlink href to a crawlable absolute URL
///
/// Returns None if the link should be excluded:
/// - empty hrefs and same-page anchors
/// - javascript:, mailto:, tel: and data: references
/// - hrefs that fail to parse
/// - non-HTTP(S) URLs after resolution
pub fn resolve_link(href: &str, base: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if SKIPPED_PREFIXES
        .iter()
        .any(|prefix| lowered.starts_with(prefix))
    {
        return None;
    }

    match normalize(href, base) {
        Ok(url) if is_http(&url) => Some(url),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Skipping link {}: {}", href, e);
            None
        }
    }
}

/// Prepares user input as a crawl seed
///
/// Surrounding whitespace and trailing slashes are trimmed, and `https://` is assumed
/// when the input carries no HTTP(S) scheme.
///
/// # Examples
///
/// ```
/// use seo_sweep::url::seed_url;
///
/// let url = seed_url("example.com/blog/").unwrap();
/// assert_eq!(url.as_str(), "https://example.com/blog");
/// ```
pub fn seed_url(input: &str) -> Result<Url, UrlError> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(UrlError::Empty);
    }

    let with_scheme = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| UrlError::Invalid {
        raw: input.to_string(),
        reason: e.to_string(),
    })?;

    if !is_http(&url) || url.host_str().is_none() {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    url.set_fragment(None);
    Ok(url)
}

fn is_http(url: &Url) -> bool {
    url.scheme() == "http" || url.scheme() == "https"
}
