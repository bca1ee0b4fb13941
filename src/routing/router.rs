//! Route lookup and dispatch.
//!
//! # Responsibilities
//! - Register routes and the `"404"` fallback
//! - Run one dispatch per navigation: path → clear → match → render → events
//! - Commit navigations to history and re-enter on back/forward
//! - Expose the current path, search, query and dynamic values
//!
//! # Design Decisions
//! - Explicit router object, cheap to clone, no process-wide instance
//! - History is committed before any handler runs, so it reflects the
//!   requested path even while rendering is pending
//! - Dispatches are not serialized; with `discard_stale` a dispatch that
//!   finishes after a newer one started is dropped without rendering
//! - Unmatched navigations are reported through events, never as `Err`

use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;

use arc_swap::ArcSwap;
use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::schema::RouterConfig;
use crate::error::RouterResult;
use crate::events::{Event, EventEmitter, Subscription};
use crate::observability::metrics;
use crate::routing::history::{History, HistoryEntry};
use crate::routing::matcher::{DynamicMap, MatchResult, Matcher};
use crate::routing::normalize::normalize;
use crate::routing::pattern::Pattern;
use crate::routing::query::query_parameter;
use crate::routing::registry::{
    Handler, Route, RouteKind, RouteOptions, RouteRegistry, FALLBACK_PATTERN,
};
use crate::routing::surface::{IntoView, Surface};

/// Lifecycle events published by the router.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum RouterEvent {
    /// A dispatch started; emitted before anything is cleared or rendered.
    Path { path: String },
    /// A dispatch finished.
    Load { path: String, is_error: bool },
    /// No route matched.
    NotFound { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RouterEventKind {
    Path,
    Load,
    NotFound,
}

impl Event for RouterEvent {
    type Kind = RouterEventKind;

    fn kind(&self) -> RouterEventKind {
        match self {
            RouterEvent::Path { .. } => RouterEventKind::Path,
            RouterEvent::Load { .. } => RouterEventKind::Load,
            RouterEvent::NotFound { .. } => RouterEventKind::NotFound,
        }
    }
}

/// Navigation context after the last completed dispatch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RouterState {
    pub current_path: Option<String>,
    pub current_search: String,
    pub dynamic: DynamicMap,
}

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// Empty path, nothing happened.
    Skipped,
    /// A route matched and its output was rendered.
    Rendered { route: String },
    /// A route matched but returned nothing to render.
    Matched { route: String },
    /// No route matched; the fallback handled it.
    Fallback,
    /// No route matched and there is no fallback.
    NotFound,
    /// Superseded by a newer dispatch before its handler resolved.
    Stale,
}

impl Outcome {
    pub fn label(&self) -> &'static str {
        match self {
            Outcome::Skipped => "skipped",
            Outcome::Rendered { .. } => "rendered",
            Outcome::Matched { .. } => "matched",
            Outcome::Fallback => "fallback",
            Outcome::NotFound => "not_found",
            Outcome::Stale => "stale",
        }
    }
}

/// Report of one dispatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Dispatch {
    pub path: String,
    pub generation: u64,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Dispatch {
    /// True when no registered route matched the path.
    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Fallback | Outcome::NotFound)
    }
}

struct Inner {
    id: Uuid,
    config: ArcSwap<RouterConfig>,
    registry: RouteRegistry,
    events: EventEmitter<RouterEvent>,
    state: ArcSwap<RouterState>,
    surface: Arc<dyn Surface>,
    history: Arc<dyn History>,
    generation: AtomicU64,
    not_found_listener: Mutex<Option<Subscription>>,
}

/// Client-side router.
#[derive(Clone)]
pub struct Router {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("id", &self.inner.id)
            .field("routes", &self.inner.registry.len())
            .finish()
    }
}

impl Router {
    pub fn new(config: RouterConfig, surface: Arc<dyn Surface>, history: Arc<dyn History>) -> Self {
        let id = Uuid::new_v4();
        tracing::debug!(router = %id, mount = %config.mount, "Router created");
        Self {
            inner: Arc::new(Inner {
                id,
                config: ArcSwap::from_pointee(config),
                registry: RouteRegistry::new(),
                events: EventEmitter::new(),
                state: ArcSwap::from_pointee(RouterState::default()),
                surface,
                history,
                generation: AtomicU64::new(0),
                not_found_listener: Mutex::new(None),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.id
    }

    pub fn config(&self) -> Arc<RouterConfig> {
        self.inner.config.load_full()
    }

    /// Replace the router options. Takes effect on the next dispatch.
    pub fn define(&self, config: RouterConfig) {
        self.inner.config.store(Arc::new(config));
    }

    pub fn language(&self) -> String {
        self.inner.config.load().language.clone()
    }

    /// Register `handler` for `pattern` with default options.
    pub fn add<F, Fut>(&self, pattern: &str, handler: F) -> RouterResult<Arc<Route>>
    where
        F: Fn(DynamicMap) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoView,
    {
        self.add_with(pattern, RouteOptions::default(), handler)
    }

    /// Register `handler` for `pattern`; `"404"` registers the fallback.
    pub fn add_with<F, Fut>(
        &self,
        pattern: &str,
        options: RouteOptions,
        handler: F,
    ) -> RouterResult<Arc<Route>>
    where
        F: Fn(DynamicMap) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoView,
    {
        let kind = if pattern == FALLBACK_PATTERN {
            RouteKind::Fallback
        } else {
            RouteKind::Pattern(Box::new(Pattern::compile(pattern)?))
        };
        Ok(self.register(kind, options, handler))
    }

    /// Register a route with a custom matcher.
    pub fn add_matcher<M, F, Fut>(&self, matcher: M, options: RouteOptions, handler: F) -> Arc<Route>
    where
        M: Matcher + 'static,
        F: Fn(DynamicMap) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoView,
    {
        self.register(RouteKind::Pattern(Box::new(matcher)), options, handler)
    }

    /// Register the fallback handler.
    pub fn not_found<F, Fut>(&self, handler: F) -> Arc<Route>
    where
        F: Fn(DynamicMap) -> Fut + Send + Sync + 'static,
        Fut: Future + Send + 'static,
        Fut::Output: IntoView,
    {
        self.register(RouteKind::Fallback, RouteOptions::default(), handler)
    }

    fn register(&self, kind: RouteKind, options: RouteOptions, handler: impl Handler) -> Arc<Route> {
        let route = self.inner.registry.register(kind, handler, options);
        metrics::record_routes_registered(self.inner.registry.len());
        route
    }

    /// Registered routes, in the order of the last dispatch.
    pub fn routes(&self) -> Vec<Arc<Route>> {
        self.inner.registry.all()
    }

    pub fn events(&self) -> &EventEmitter<RouterEvent> {
        &self.inner.events
    }

    /// Subscribe to a lifecycle event.
    pub fn on<F>(&self, kind: RouterEventKind, listener: F) -> Subscription
    where
        F: Fn(&RouterEvent) + Send + Sync + 'static,
    {
        self.inner.events.on(kind, listener)
    }

    /// Install the `404` listener, removing the one installed before.
    pub fn set_not_found_listener<F>(&self, listener: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let subscription = self.on(RouterEventKind::NotFound, move |event| {
            if let RouterEvent::NotFound { path } = event {
                listener(path);
            }
        });

        let previous = self
            .inner
            .not_found_listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(subscription);
        if let Some(previous) = previous {
            previous.unsubscribe();
        }
    }

    pub fn state(&self) -> Arc<RouterState> {
        self.inner.state.load_full()
    }

    /// Value of `name` in the current search string.
    pub fn query_parameter(&self, name: &str) -> Option<String> {
        query_parameter(&self.inner.state.load().current_search, name)
    }

    /// Dynamic value captured by the last dispatch.
    pub fn dynamic_path(&self, name: &str) -> Option<String> {
        self.inner.state.load().dynamic.get(name).cloned()
    }

    /// Navigate to `path`, committing it to history.
    pub async fn navigate(&self, path: &str) -> RouterResult<Dispatch> {
        self.update(Some(path), None, true).await
    }

    /// Re-enter dispatch from a history entry without committing it again.
    pub async fn pop_state(&self, entry: Option<HistoryEntry>) -> RouterResult<Dispatch> {
        match entry {
            Some(entry) => self.update(Some(&entry.path), Some(&entry.search), false).await,
            None => Ok(self.skipped(String::new())),
        }
    }

    /// Run one dispatch.
    ///
    /// `path` defaults to the configured default path. When `search` is
    /// `None` the current search is kept for the same path, the default
    /// search is used for the first navigation, and it is empty otherwise.
    pub async fn update(
        &self,
        path: Option<&str>,
        search: Option<&str>,
        commit: bool,
    ) -> RouterResult<Dispatch> {
        let config = self.config();
        let raw = path.unwrap_or(config.default_path.as_str());
        if raw.is_empty() {
            return Ok(self.skipped(String::new()));
        }

        let path = normalize(raw, false);
        let search = match search {
            Some(search) => search.to_string(),
            None => self.inherited_search(&path, &config),
        };

        if commit {
            self.inner.history.push(HistoryEntry::new(&path, &search));
        }

        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let span = tracing::info_span!(
            "dispatch",
            router = %self.inner.id,
            generation,
            path = %path
        );

        self.dispatch(path, search, generation, config)
            .instrument(span)
            .await
    }

    async fn dispatch(
        &self,
        path: String,
        search: String,
        generation: u64,
        config: Arc<RouterConfig>,
    ) -> RouterResult<Dispatch> {
        let start = Instant::now();
        let lookup = if config.lowercase {
            path.to_lowercase()
        } else {
            path.clone()
        };

        self.inner.events.emit(&RouterEvent::Path { path: path.clone() });

        let candidates = self.inner.registry.candidates();

        // Clear phase: runs for every clearing route before anything renders.
        // A missing target only matters to the route that renders into it.
        let mut cleared = HashSet::new();
        for route in candidates.routes.iter().chain(candidates.fallback.iter()) {
            if !route.clears() {
                continue;
            }
            let target = route.mount().unwrap_or(config.mount.as_str());
            if cleared.insert(target.to_string()) {
                if let Err(e) = self.inner.surface.clear(target) {
                    tracing::warn!(pattern = %route.pattern(), error = %e, "Skipping clear of missing mount target");
                }
            }
        }

        let mut selected = None;
        for route in &candidates.routes {
            match route.match_path(&lookup) {
                MatchResult::Match(params) => {
                    tracing::debug!(pattern = %route.pattern(), priority = route.priority(), "Route matched");
                    selected = Some((route.clone(), params));
                    break;
                }
                MatchResult::NoMatch => {
                    tracing::trace!(pattern = %route.pattern(), "Route did not match");
                }
            }
        }

        let matched = selected.is_some();
        let (route, params) = match selected {
            Some((route, params)) => (Some(route), params),
            None => (candidates.fallback, DynamicMap::new()),
        };

        let mut rendered = false;
        if let Some(route) = &route {
            let output = route.invoke(params.clone()).await;

            if config.discard_stale && self.inner.generation.load(Ordering::SeqCst) != generation {
                tracing::warn!(pattern = %route.pattern(), "Dispatch superseded, discarding output");
                metrics::record_dispatch(Outcome::Stale.label(), start);
                return Ok(Dispatch {
                    path,
                    generation,
                    outcome: Outcome::Stale,
                });
            }

            if let Some(view) = output {
                let target = route.mount().unwrap_or(config.mount.as_str());
                self.inner.surface.render(target, view).inspect_err(|e| {
                    tracing::error!(error = %e, "Render failed");
                })?;
                rendered = true;
            }
        }

        self.inner.state.store(Arc::new(RouterState {
            current_path: Some(path.clone()),
            current_search: search,
            dynamic: params,
        }));

        let outcome = match (&route, matched, rendered) {
            (Some(route), true, true) => Outcome::Rendered {
                route: route.pattern().to_string(),
            },
            (Some(route), true, false) => Outcome::Matched {
                route: route.pattern().to_string(),
            },
            (Some(_), false, _) => Outcome::Fallback,
            (None, _, _) => Outcome::NotFound,
        };

        if !matched {
            tracing::warn!(path = %path, fallback = route.is_some(), "No route matched");
            self.inner.events.emit(&RouterEvent::NotFound { path: path.clone() });
        }
        self.inner.events.emit(&RouterEvent::Load {
            path: path.clone(),
            is_error: !matched,
        });

        metrics::record_dispatch(outcome.label(), start);
        tracing::info!(
            outcome = outcome.label(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Dispatch complete"
        );

        Ok(Dispatch {
            path,
            generation,
            outcome,
        })
    }

    fn inherited_search(&self, path: &str, config: &RouterConfig) -> String {
        let state = self.inner.state.load();
        match state.current_path.as_deref() {
            None => config.default_search.clone(),
            Some(current) if current == path => state.current_search.clone(),
            Some(_) => String::new(),
        }
    }

    fn skipped(&self, path: String) -> Dispatch {
        Dispatch {
            path,
            generation: self.inner.generation.load(Ordering::SeqCst),
            outcome: Outcome::Skipped,
        }
    }
}
