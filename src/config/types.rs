use serde::Deserialize;

/// Main configuration structure for Seo-Sweep
///
/// Every section is optional in the TOML file; missing sections and keys fall back to
/// their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Total time allowed for a single page request (seconds)
    #[serde(rename = "request-timeout-secs")]
    pub request_timeout_secs: u64,

    /// Time allowed to establish a connection (seconds)
    #[serde(rename = "connect-timeout-secs")]
    pub connect_timeout_secs: u64,

    /// Time allowed for image HEAD and size probes (seconds)
    #[serde(rename = "image-probe-timeout-secs")]
    pub image_probe_timeout_secs: u64,

    /// Images larger than this many kilobytes are flagged as oversized
    #[serde(rename = "image-size-limit-kb")]
    pub image_size_limit_kb: u64,

    /// Alt text longer than this many characters is flagged
    #[serde(rename = "max-alt-length")]
    pub max_alt_length: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            connect_timeout_secs: 10,
            image_probe_timeout_secs: 5,
            image_size_limit_kb: 100,
            max_alt_length: 100,
        }
    }
}

impl CrawlerConfig {
    /// Image size cap in bytes
    pub fn image_size_limit_bytes(&self) -> u64 {
        self.image_size_limit_kb.saturating_mul(1024)
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "SeoSweep".to_string(),
            crawler_version: env!("CARGO_PKG_VERSION").to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version` or `CrawlerName/Version (+ContactURL)`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "{}/{} (+{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!("{}/{}", self.crawler_name, self.crawler_version),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Directory CSV reports are written to
    pub directory: String,

    /// Field delimiter for CSV reports
    pub delimiter: char,

    /// Optional SQLite database that also receives every report
    #[serde(rename = "sqlite-path")]
    pub sqlite_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: ".".to_string(),
            delimiter: ',',
            sqlite_path: None,
        }
    }
}
