//! Audience targeting.
//!
//! # Data Flow
//! ```text
//! Audience::user_filter(filter)
//!     → InfoSource::lookup (IpInfoClient: GET lookup_url)
//!     → None on transport error / non-200 / bad body → false
//!     → Some(record) → match filter variant → bool
//! ```
//!
//! # Design Decisions
//! - Filters are an enum with typed criteria, not a kind string
//! - The lookup runs per evaluation; nothing is cached

pub mod filter;
pub mod info;

pub use filter::{Audience, AudienceFilter};
pub use info::{InfoField, InfoRecord, InfoSource, IpInfoClient};
