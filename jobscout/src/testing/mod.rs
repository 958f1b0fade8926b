//! Testing utilities for code built on jobscout.
//!
//! This module provides:
//! - Canned, slow and recording test doubles for the service seams
//! - A manually driven clock for expiry tests
//! - HTML fixture builders for listing and detail pages

pub mod fixtures;
mod mocks;

pub use fixtures::{detail_page, listing_card, listing_page, CardSpec, DetailSpec};
pub use mocks::{ManualClock, RecordingObserver, SlowFetcher, StaticFetcher};
