//! URL handling module for Sumi-Lens
//!
//! This module provides URL normalization (the identity used for
//! deduplication), same-origin checks, and crawl eligibility filtering.

mod filter;
mod matcher;
mod normalize;
mod origin;

// Re-export main functions
pub use filter::{has_skipped_extension, should_crawl, SKIPPED_EXTENSIONS};
pub use matcher::matches_path_pattern;
pub use normalize::normalize_url;
pub use origin::is_internal;
