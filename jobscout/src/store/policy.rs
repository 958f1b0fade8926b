//! Pluggable time source and eviction policy for the result store.

use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fmt::Debug;

/// Source of the current time.
pub trait Clock: Send + Sync + Debug {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Chooses which sessions leave the store once it is over capacity.
pub trait EvictionPolicy: Send + Sync + Debug {
    /// Policy name, for logs.
    fn name(&self) -> &'static str;

    /// Returns the ids to evict.
    ///
    /// `order` lists retained session ids oldest first. After the returned
    /// ids are removed at most `capacity` sessions may remain.
    fn select_victims(&self, order: &VecDeque<String>, capacity: usize) -> Vec<String>;
}

/// Evicts the least recently inserted sessions; reads do not count.
#[derive(Debug, Clone, Copy, Default)]
pub struct FifoEviction;

impl EvictionPolicy for FifoEviction {
    fn name(&self) -> &'static str {
        "fifo"
    }

    fn select_victims(&self, order: &VecDeque<String>, capacity: usize) -> Vec<String> {
        let excess = order.len().saturating_sub(capacity);
        order.iter().take(excess).cloned().collect()
    }
}
