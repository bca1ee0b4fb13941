//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     AppConfig → MemorySurface + MemoryHistory → Router → routes registered
//!
//! Shutdown (shutdown.rs):
//!     Ctrl-C → broadcast → watch loop exits → config watcher dropped
//! ```
//!
//! # Design Decisions
//! - Startup is ordered: surface and history exist before the router
//! - A reload builds a fresh App; the old one is dropped only on success

pub mod shutdown;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{build, App};
