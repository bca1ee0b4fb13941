//! Mount targets and the render collaborator.
//!
//! # Responsibilities
//! - Define the [`View`] value a route handler produces
//! - Define the [`Surface`] seam the dispatch engine clears and renders through
//! - Provide [`MemorySurface`], an in-process surface that records every operation
//!
//! # Design Decisions
//! - A selector that names no mount target is a fatal [`RouterError::MountTarget`]
//! - Rendering appends to the target; clearing is a separate, explicit step

use std::fmt;
use std::sync::{Mutex, PoisonError};

use dashmap::DashMap;
use serde::Serialize;

use crate::error::{RouterError, RouterResult};

/// Rendered output of a route handler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct View(String);

impl View {
    pub fn new(body: impl Into<String>) -> Self {
        Self(body.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Conversion from a handler's return value into something renderable.
///
/// `None`, `()` and empty strings mean "matched, nothing to render".
pub trait IntoView {
    fn into_view(self) -> Option<View>;
}

impl IntoView for View {
    fn into_view(self) -> Option<View> {
        Some(self)
    }
}

impl IntoView for Option<View> {
    fn into_view(self) -> Option<View> {
        self
    }
}

impl IntoView for () {
    fn into_view(self) -> Option<View> {
        None
    }
}

impl IntoView for String {
    fn into_view(self) -> Option<View> {
        (!self.is_empty()).then(|| View(self))
    }
}

impl IntoView for &'static str {
    fn into_view(self) -> Option<View> {
        self.to_string().into_view()
    }
}

/// Where route output is attached.
pub trait Surface: Send + Sync {
    /// Remove everything previously rendered into `target`.
    fn clear(&self, target: &str) -> RouterResult<()>;

    /// Attach `view` to `target`.
    fn render(&self, target: &str, view: View) -> RouterResult<()>;
}

/// One recorded surface mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SurfaceOp {
    Clear { target: String },
    Render { target: String, view: View },
}

/// In-memory surface keyed by selector.
#[derive(Debug, Default)]
pub struct MemorySurface {
    targets: DashMap<String, Vec<View>>,
    journal: Mutex<Vec<SurfaceOp>>,
}

impl MemorySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a surface with the given mount targets already present.
    pub fn with_targets<I, S>(selectors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let surface = Self::new();
        for selector in selectors {
            surface.add_target(selector);
        }
        surface
    }

    /// Make `selector` a valid mount target. Existing content is kept.
    pub fn add_target(&self, selector: impl Into<String>) {
        self.targets.entry(selector.into()).or_default();
    }

    /// Current children of `selector`, or `None` if it is not a target.
    pub fn children(&self, selector: &str) -> Option<Vec<View>> {
        self.targets.get(selector).map(|children| children.clone())
    }

    pub fn child_count(&self, selector: &str) -> usize {
        self.targets.get(selector).map_or(0, |children| children.len())
    }

    /// All operations applied so far, oldest first.
    pub fn journal(&self) -> Vec<SurfaceOp> {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn record(&self, op: SurfaceOp) {
        self.journal
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(op);
    }
}

impl Surface for MemorySurface {
    fn clear(&self, target: &str) -> RouterResult<()> {
        let mut children = self
            .targets
            .get_mut(target)
            .ok_or_else(|| RouterError::mount_target(target))?;
        children.clear();
        drop(children);

        self.record(SurfaceOp::Clear {
            target: target.to_string(),
        });
        Ok(())
    }

    fn render(&self, target: &str, view: View) -> RouterResult<()> {
        let mut children = self
            .targets
            .get_mut(target)
            .ok_or_else(|| RouterError::mount_target(target))?;
        children.push(view.clone());
        drop(children);

        self.record(SurfaceOp::Render {
            target: target.to_string(),
            view,
        });
        Ok(())
    }
}
