use url::Url;

/// Extracts the host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_sweep::url::extract_host;
///
/// let url = Url::parse("https://Example.COM/path").unwrap();
/// assert_eq!(extract_host(&url), Some("example.com".to_string()));
/// ```
pub fn extract_host(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_string())
}

/// Checks whether two URLs belong to the same site
///
/// Two URLs are the same site when their authority (host plus explicit port) is
/// identical. The scheme is ignored, so `http://example.com/a` and
/// `https://example.com/b` are the same site.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use seo_sweep::url::is_same_site;
///
/// let a = Url::parse("http://example.com/a").unwrap();
/// let b = Url::parse("https://example.com/b").unwrap();
/// let c = Url::parse("https://blog.example.com/").unwrap();
/// assert!(is_same_site(&a, &b));
/// assert!(!is_same_site(&a, &c));
/// ```
pub fn is_same_site(a: &Url, b: &Url) -> bool {
    match (a.host_str(), b.host_str()) {
        (Some(host_a), Some(host_b)) => host_a == host_b && a.port() == b.port(),
        _ => false,
    }
}

/// Builds a filesystem-friendly label for a site, used in report file names
pub fn site_label(url: &Url) -> String {
    let host = url.host_str().unwrap_or("site");
    match url.port() {
        Some(port) => format!("{}_{}", host, port),
        None => host.to_string(),
    }
}
