//! URL handling module for Seo-Sweep
//!
//! This module provides URL normalization, link resolution, seed preparation and the
//! same-site check that keeps a crawl inside one domain.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_host, is_same_site, site_label};
pub use normalize::{normalize, resolve_link, seed_url};
