//! Client-side routing subsystem.
//!
//! # Data Flow
//! ```text
//! navigate(path) / pop_state(entry)
//!     → normalize.rs (collapse separators)
//!     → history.rs (commit, unless re-entering)
//!     → router.rs: Path event
//!     → surface.rs: clear every clearing mount target
//!     → registry.rs (routes by priority) → matcher.rs (first match wins)
//!     → handler → surface.rs: render view
//!     → router state updated → NotFound? → Load event
//! ```
//!
//! # Design Decisions
//! - Patterns compile once to a regex at registration
//! - Routes are tried in ascending priority, ties in registration order
//! - History and display surface sit behind traits so the router runs
//!   headless in tests and on the CLI

pub mod history;
pub mod matcher;
pub mod normalize;
pub mod pattern;
pub mod query;
pub mod registry;
pub mod router;
pub mod surface;

pub use history::{History, HistoryEntry, MemoryHistory};
pub use matcher::{match_path, DynamicMap, MatchResult, Matcher};
pub use normalize::normalize;
pub use pattern::{Pattern, Segment};
pub use query::query_parameter;
pub use registry::{Route, RouteOptions, FALLBACK_PATTERN};
pub use router::{Dispatch, Outcome, Router, RouterEvent, RouterEventKind, RouterState};
pub use surface::{IntoView, MemorySurface, Surface, SurfaceOp, View};
