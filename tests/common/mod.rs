//! Shared fixtures for integration tests.

use std::sync::{Arc, Mutex};

use spa_router::config::RouterConfig;
use spa_router::events::Subscription;
use spa_router::routing::{MemoryHistory, MemorySurface, Router, RouterEvent, RouterEventKind};

/// Router wired to in-memory collaborators, with every event recorded.
pub struct Fixture {
    pub router: Router,
    pub surface: Arc<MemorySurface>,
    pub history: Arc<MemoryHistory>,
    pub events: Arc<Mutex<Vec<RouterEvent>>>,
    _subscriptions: Vec<Subscription>,
}

impl Fixture {
    pub fn new() -> Self {
        Self::with_config(RouterConfig::default())
    }

    pub fn with_config(config: RouterConfig) -> Self {
        let surface = Arc::new(MemorySurface::with_targets([config.mount.clone()]));
        let history = Arc::new(MemoryHistory::new());
        let router = Router::new(config, surface.clone(), history.clone());

        let events = Arc::new(Mutex::new(Vec::new()));
        let subscriptions = [
            RouterEventKind::Path,
            RouterEventKind::NotFound,
            RouterEventKind::Load,
        ]
        .into_iter()
        .map(|kind| {
            let events = events.clone();
            router.on(kind, move |event| events.lock().unwrap().push(event.clone()))
        })
        .collect();

        Self {
            router,
            surface,
            history,
            events,
            _subscriptions: subscriptions,
        }
    }

    /// Recorded events, drained.
    pub fn take_events(&self) -> Vec<RouterEvent> {
        std::mem::take(&mut *self.events.lock().unwrap())
    }
}

#[allow(dead_code)]
pub fn not_found(path: &str) -> RouterEvent {
    RouterEvent::NotFound {
        path: path.to_string(),
    }
}

#[allow(dead_code)]
pub fn load(path: &str, is_error: bool) -> RouterEvent {
    RouterEvent::Load {
        path: path.to_string(),
        is_error,
    }
}

#[allow(dead_code)]
pub fn path(path: &str) -> RouterEvent {
    RouterEvent::Path {
        path: path.to_string(),
    }
}
