//! Extractors that turn rendered listing pages into news items.
//!
//! Extraction is pure: a scraper receives a [`RawPage`](crate::models::RawPage)
//! that some [`PageFetcher`](crate::fetchers::PageFetcher) already obtained
//! and never performs I/O of its own. This keeps the markup rules testable
//! against static fixtures.
//!
//! # Supported Sources
//!
//! | Source | Module | Marker |
//! |--------|--------|--------|
//! | BBC News section pages | [`bbcnews`] | `[data-testid='card-text-wrapper']` |
//!
//! Malformed cards are skipped individually; one broken card never hides the
//! rest of the listing.

pub mod bbcnews;
