//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router, config watcher, audience lookups produce:
//!     → logging.rs (structured log events on stderr)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → Terminal / log aggregation
//!     → Metrics endpoint (Prometheus scrape, watch mode only)
//! ```

pub mod logging;
pub mod metrics;
