//! Translation lookup keyed by message code.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::routing::router::Router;

/// Message code → language → text.
pub type TranslationMap = BTreeMap<String, BTreeMap<String, String>>;

/// Translations resolved against a source language.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Translations {
    source: String,
    map: TranslationMap,
}

impl Translations {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            map: TranslationMap::new(),
        }
    }

    /// Translations whose source language is the router's current language.
    pub fn for_router(router: &Router) -> Self {
        Self::new(router.language())
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Merge `entries`; a code already present is replaced as a whole.
    pub fn add(&mut self, entries: TranslationMap) {
        self.map.extend(entries);
    }

    /// Text for `code` in the source language.
    pub fn get(&self, code: &str) -> Option<&str> {
        self.map
            .get(code)
            .and_then(|by_language| by_language.get(&self.source))
            .map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
