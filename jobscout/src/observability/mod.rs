//! Observability utilities.

mod tracing;

pub use tracing::{
    init_tracing, LoggingSearchObserver, NoOpSearchObserver, SearchObserver, SpanTimer,
};
