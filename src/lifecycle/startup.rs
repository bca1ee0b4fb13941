//! Startup orchestration.
//!
//! # Responsibilities
//! - Turn a validated [`AppConfig`] into a ready [`Router`]
//! - Provision the in-memory surface with every mount target the routes use
//! - Register one templated text view per configured route
//! - Size the deferred-evaluation queue from `[defer]`
//!
//! # Design Decisions
//! - Fail fast: a pattern that does not compile aborts startup
//! - Assembly is synchronous; the first navigation is left to the caller

use std::sync::{Arc, LazyLock};

use regex::{Captures, Regex};

use crate::config::schema::AppConfig;
use crate::deferred::DeferQueue;
use crate::error::RouterResult;
use crate::language::Translations;
use crate::routing::history::MemoryHistory;
use crate::routing::matcher::DynamicMap;
use crate::routing::registry::RouteOptions;
use crate::routing::router::{Dispatch, Router};
use crate::routing::surface::{MemorySurface, View};

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{([A-Za-z0-9_]+)\}").expect("placeholder regex is valid"));

/// A router wired to in-memory collaborators.
#[derive(Debug, Clone)]
pub struct App {
    pub router: Router,
    pub surface: Arc<MemorySurface>,
    pub history: Arc<MemoryHistory>,
    /// Staggers deferred route precomputation by `defer.step_ms`.
    pub defer: Arc<DeferQueue>,
}

impl App {
    pub async fn navigate(&self, path: &str) -> RouterResult<Dispatch> {
        self.router.navigate(path).await
    }

    /// Views currently rendered into the default mount target.
    pub fn rendered(&self) -> Vec<View> {
        let mount = self.router.config().mount.clone();
        self.surface.children(&mount).unwrap_or_default()
    }

    /// Empty translations resolved against the router's language.
    pub fn translations(&self) -> Translations {
        Translations::for_router(&self.router)
    }
}

/// Build an [`App`] from configuration.
pub fn build(config: &AppConfig) -> RouterResult<App> {
    let surface = Arc::new(MemorySurface::with_targets([config.router.mount.clone()]));
    let history = Arc::new(MemoryHistory::new());
    let router = Router::new(config.router.clone(), surface.clone(), history.clone());

    for route in &config.routes {
        let mut options = RouteOptions::default()
            .priority(route.priority)
            .clear(route.clear);
        if let Some(mount) = &route.mount {
            surface.add_target(mount.clone());
            options = options.mount(mount.clone());
        }

        let template = route.view.clone();
        router.add_with(&route.pattern, options, move |params: DynamicMap| {
            let view = render_template(&template, &params);
            async move { view }
        })?;
    }

    tracing::info!(
        router = %router.id(),
        routes = config.routes.len(),
        mount = %config.router.mount,
        "Router assembled"
    );

    Ok(App {
        router,
        surface,
        history,
        defer: Arc::new(DeferQueue::from_config(&config.defer)),
    })
}

/// Substitute `{name}` with the dynamic value; unknown names are left as is.
pub fn render_template(template: &str, params: &DynamicMap) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| match params.get(&caps[1]) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        })
        .into_owned()
}
