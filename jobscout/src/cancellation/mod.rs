//! Cooperative cancellation and time bounds.
//!
//! This module provides:
//! - [`CancellationToken`], an awaitable shared cancel flag
//! - [`run_with_timeout`] and [`run_until_cancelled`] for bounding futures

mod runtime;
mod token;

pub use runtime::{run_until_cancelled, run_with_timeout, TimedResult};
pub use token::CancellationToken;
