//! Staggered background evaluation.
//!
//! # Responsibilities
//! - Schedule a producer to run once, after a delay that grows with every
//!   producer deferred through the same queue
//! - Serve the cached value, or evaluate on demand if the background run has
//!   not happened yet
//!
//! # Design Decisions
//! - The delay counter belongs to a [`DeferQueue`] owned by the host, not to
//!   the process
//! - Without a Tokio runtime nothing is scheduled; values are produced on demand
//! - A producer runs at most once per deferred value

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use tokio::runtime::Handle;

use crate::config::schema::DeferConfig;

struct Slot<T> {
    value: OnceLock<T>,
    producer: Box<dyn Fn() -> T + Send + Sync>,
}

impl<T> Slot<T> {
    fn get_or_produce(&self) -> &T {
        self.value.get_or_init(|| (self.producer)())
    }
}

/// Hands out staggered background evaluations.
#[derive(Debug)]
pub struct DeferQueue {
    step: Duration,
    scheduled: AtomicU64,
}

impl DeferQueue {
    pub fn new(step: Duration) -> Self {
        Self {
            step,
            scheduled: AtomicU64::new(0),
        }
    }

    pub fn from_config(config: &DeferConfig) -> Self {
        Self::new(Duration::from_millis(config.step_ms))
    }

    /// Schedule `producer` and return an accessor for its value.
    pub fn defer<T, F>(&self, producer: F) -> Deferred<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> T + Send + Sync + 'static,
    {
        let position = self.scheduled.fetch_add(1, Ordering::Relaxed) + 1;
        let delay = self
            .step
            .saturating_mul(u32::try_from(position).unwrap_or(u32::MAX));

        let slot = Arc::new(Slot {
            value: OnceLock::new(),
            producer: Box::new(producer),
        });

        match Handle::try_current() {
            Ok(handle) => {
                let background = slot.clone();
                handle.spawn(async move {
                    tokio::time::sleep(delay).await;
                    background.get_or_produce();
                });
                tracing::trace!(position, delay_ms = delay.as_millis() as u64, "Deferred evaluation scheduled");
            }
            Err(_) => {
                tracing::debug!(position, "No runtime available, deferred value will be produced on demand");
            }
        }

        Deferred { slot }
    }

    /// Delay added per deferred producer.
    pub fn step(&self) -> Duration {
        self.step
    }

    /// Number of producers deferred through this queue so far.
    pub fn scheduled(&self) -> u64 {
        self.scheduled.load(Ordering::Relaxed)
    }
}

/// Accessor for a deferred value.
pub struct Deferred<T> {
    slot: Arc<Slot<T>>,
}

impl<T> Clone for Deferred<T> {
    fn clone(&self) -> Self {
        Self {
            slot: self.slot.clone(),
        }
    }
}

impl<T> Deferred<T> {
    /// The value, produced now if the background run has not finished.
    pub fn get(&self) -> &T {
        self.slot.get_or_produce()
    }

    pub fn is_ready(&self) -> bool {
        self.slot.value.get().is_some()
    }
}
