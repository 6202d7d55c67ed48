//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the discovered and visited sets of one crawl
//! - `ProgressSample`: the `(visited, discovered)` pair reported to observers

mod crawl_state;

// Re-export main types
pub use crawl_state::{CrawlState, ProgressSample};
