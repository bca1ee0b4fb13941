//! Audience filter predicates.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::audience::info::{InfoField, InfoRecord, InfoSource};

/// A predicate over the current caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "criteria", rename_all = "kebab-case")]
pub enum AudienceFilter {
    /// Passes with the given probability in `[0, 1]`.
    Probability(f64),
    /// Passes when the caller's user agent is listed.
    UserAgent(Vec<String>),
    /// Passes when the record's field value is listed.
    Field(InfoField, Vec<String>),
}

/// Evaluates audience filters against an [`InfoSource`].
#[derive(Clone)]
pub struct Audience {
    source: Arc<dyn InfoSource>,
    user_agent: String,
}

impl std::fmt::Debug for Audience {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Audience")
            .field("user_agent", &self.user_agent)
            .finish_non_exhaustive()
    }
}

impl Audience {
    pub fn new(source: Arc<dyn InfoSource>, user_agent: impl Into<String>) -> Self {
        Self {
            source,
            user_agent: user_agent.into(),
        }
    }

    /// The caller's info record, or `None` when the lookup failed.
    pub async fn user_info(&self) -> Option<InfoRecord> {
        self.source.lookup().await
    }

    /// Evaluate `filter`. Every filter fails when the lookup fails.
    pub async fn user_filter(&self, filter: &AudienceFilter) -> bool {
        let Some(record) = self.user_info().await else {
            tracing::debug!(?filter, "No caller info, filter rejected");
            return false;
        };

        let passed = match filter {
            AudienceFilter::Probability(p) => fastrand::f64() < *p,
            AudienceFilter::UserAgent(agents) => agents.iter().any(|a| *a == self.user_agent),
            AudienceFilter::Field(field, values) => {
                let actual = record.field(*field);
                values.iter().any(|v| v == actual)
            }
        };

        tracing::trace!(?filter, passed, "Audience filter evaluated");
        passed
    }
}
