//! Session cache.
//!
//! This module provides:
//! - [`ResultStore`], the bounded session cache with job indices
//! - [`Clock`] and [`EvictionPolicy`], the seams the store is built on

mod policy;
mod result_store;

pub use policy::{Clock, EvictionPolicy, FifoEviction, SystemClock};
pub use result_store::{PutReport, ResultStore};
