//! Route registration and ordering.
//!
//! # Responsibilities
//! - Store registered routes in registration order
//! - Sort by ascending priority before each dispatch pass
//! - Separate the `"404"` fallback from normal candidates
//!
//! # Design Decisions
//! - Stable sort: equal priorities keep registration order
//! - Routes live as long as the registry; there is no unregister
//! - With several fallbacks registered, the last one in priority order is used

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use futures_util::future::BoxFuture;

use crate::routing::matcher::{DynamicMap, MatchResult, Matcher};
use crate::routing::surface::{IntoView, View};

/// Pseudo-pattern marking the fallback handler.
pub const FALLBACK_PATTERN: &str = "404";

/// Future returned by a route handler.
pub type HandlerFuture = BoxFuture<'static, Option<View>>;

/// A route handler: receives the dynamic map, eventually yields output.
pub trait Handler: Send + Sync + 'static {
    fn call(&self, params: DynamicMap) -> HandlerFuture;
}

impl<F, Fut> Handler for F
where
    F: Fn(DynamicMap) -> Fut + Send + Sync + 'static,
    Fut: Future + Send + 'static,
    Fut::Output: IntoView,
{
    fn call(&self, params: DynamicMap) -> HandlerFuture {
        let fut = self(params);
        Box::pin(async move { fut.await.into_view() })
    }
}

/// Per-route registration options.
#[derive(Debug, Clone)]
pub struct RouteOptions {
    /// Lower values are tried first.
    pub priority: i32,
    /// Mount selector; `None` uses the router default.
    pub mount: Option<String>,
    /// Clear the mount target during the clear phase of every dispatch.
    pub clear: bool,
}

impl Default for RouteOptions {
    fn default() -> Self {
        Self {
            priority: 0,
            mount: None,
            clear: true,
        }
    }
}

impl RouteOptions {
    pub fn priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn mount(mut self, selector: impl Into<String>) -> Self {
        self.mount = Some(selector.into());
        self
    }

    pub fn clear(mut self, clear: bool) -> Self {
        self.clear = clear;
        self
    }
}

/// What a route matches against.
#[derive(Debug)]
pub enum RouteKind {
    Pattern(Box<dyn Matcher>),
    Fallback,
}

/// A registered route.
pub struct Route {
    id: u64,
    kind: RouteKind,
    handler: Box<dyn Handler>,
    options: RouteOptions,
}

impl std::fmt::Debug for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Route")
            .field("id", &self.id)
            .field("pattern", &self.pattern())
            .field("options", &self.options)
            .finish()
    }
}

impl Route {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn pattern(&self) -> &str {
        match &self.kind {
            RouteKind::Pattern(matcher) => matcher.pattern(),
            RouteKind::Fallback => FALLBACK_PATTERN,
        }
    }

    pub fn priority(&self) -> i32 {
        self.options.priority
    }

    pub fn mount(&self) -> Option<&str> {
        self.options.mount.as_deref()
    }

    pub fn clears(&self) -> bool {
        self.options.clear
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.kind, RouteKind::Fallback)
    }

    /// Test `source` against this route. The fallback never matches a path.
    pub fn match_path(&self, source: &str) -> MatchResult {
        match &self.kind {
            RouteKind::Pattern(matcher) => matcher.match_path(source),
            RouteKind::Fallback => MatchResult::NoMatch,
        }
    }

    pub(crate) fn invoke(&self, params: DynamicMap) -> HandlerFuture {
        self.handler.call(params)
    }
}

/// Routes to evaluate for one dispatch.
#[derive(Debug, Default)]
pub struct Candidates {
    /// Normal routes in ascending priority.
    pub routes: Vec<Arc<Route>>,
    pub fallback: Option<Arc<Route>>,
}

/// Insertion-ordered route collection.
#[derive(Debug, Default)]
pub struct RouteRegistry {
    routes: RwLock<Vec<Arc<Route>>>,
    next_id: AtomicU64,
}

impl RouteRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &self,
        kind: RouteKind,
        handler: impl Handler,
        options: RouteOptions,
    ) -> Arc<Route> {
        let route = Arc::new(Route {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            kind,
            handler: Box::new(handler),
            options,
        });

        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.push(route.clone());
        tracing::debug!(
            pattern = %route.pattern(),
            priority = route.priority(),
            total = routes.len(),
            "Route registered"
        );
        route
    }

    /// Sort by priority and split out the fallback.
    pub fn candidates(&self) -> Candidates {
        let mut routes = self.routes.write().unwrap_or_else(PoisonError::into_inner);
        routes.sort_by_key(|route| route.priority());

        let mut candidates = Candidates::default();
        for route in routes.iter() {
            if route.is_fallback() {
                if let Some(previous) = candidates.fallback.replace(route.clone()) {
                    tracing::warn!(
                        ignored = previous.id(),
                        used = route.id(),
                        "Several fallback routes registered, using the last one"
                    );
                }
            } else {
                candidates.routes.push(route.clone());
            }
        }
        candidates
    }

    /// Every registered route, fallback included, in current order.
    pub fn all(&self) -> Vec<Arc<Route>> {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.routes
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
