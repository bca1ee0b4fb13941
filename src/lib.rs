//! Client-side single-page application router.

pub mod audience;
pub mod config;
pub mod deferred;
pub mod error;
pub mod events;
pub mod language;
pub mod lifecycle;
pub mod observability;
pub mod routing;

pub use config::schema::AppConfig;
pub use error::{PatternError, RouterError, RouterResult};
pub use lifecycle::{App, Shutdown};
pub use routing::{Dispatch, Outcome, Router, RouterEvent, RouterEventKind, View};
