//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject patterns that are empty, do not compile, or repeat a dynamic name
//! - Allow at most one fallback route
//! - Reject empty mount selectors
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::AppConfig;
use crate::error::PatternError;
use crate::routing::pattern::Pattern;
use crate::routing::registry::FALLBACK_PATTERN;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Route at `index` has an unusable pattern.
    Pattern { index: usize, error: PatternError },
    /// More than one `"404"` route.
    MultipleFallbacks { count: usize },
    /// A mount selector is empty.
    EmptyMount { location: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::Pattern { index, error } => write!(f, "routes[{}]: {}", index, error),
            ValidationError::MultipleFallbacks { count } => {
                write!(f, "{} fallback routes declared, at most one is allowed", count)
            }
            ValidationError::EmptyMount { location } => write!(f, "{}: mount selector is empty", location),
        }
    }
}

/// Check `config` for semantic errors.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.router.mount.trim().is_empty() {
        errors.push(ValidationError::EmptyMount {
            location: "router".to_string(),
        });
    }

    let mut fallbacks = 0;
    for (index, route) in config.routes.iter().enumerate() {
        if route.mount.as_deref().is_some_and(|m| m.trim().is_empty()) {
            errors.push(ValidationError::EmptyMount {
                location: format!("routes[{}]", index),
            });
        }

        if route.pattern == FALLBACK_PATTERN {
            fallbacks += 1;
            continue;
        }

        if route.pattern.is_empty() {
            errors.push(ValidationError::Pattern {
                index,
                error: PatternError::Empty,
            });
            continue;
        }

        let checked = Pattern::compile(&route.pattern).and_then(|p| p.check_unique_params());
        if let Err(error) = checked {
            errors.push(ValidationError::Pattern { index, error });
        }
    }

    if fallbacks > 1 {
        errors.push(ValidationError::MultipleFallbacks { count: fallbacks });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::RouteConfig;

    fn route(pattern: &str) -> RouteConfig {
        RouteConfig {
            pattern: pattern.to_string(),
            priority: 0,
            mount: None,
            clear: true,
            view: String::new(),
        }
    }

    #[test]
    fn test_valid_config() {
        let mut config = AppConfig::default();
        config.routes = vec![route("/"), route("/[id]"), route("404")];
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = AppConfig::default();
        config.router.mount = " ".into();
        config.routes = vec![route(""), route("/[id]/[id]"), route("404"), route("404")];

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 4);
        assert!(errors.contains(&ValidationError::MultipleFallbacks { count: 2 }));
        assert!(errors.contains(&ValidationError::Pattern {
            index: 0,
            error: PatternError::Empty
        }));
        assert_eq!(
            errors[2].to_string(),
            "routes[1]: pattern '/[id]/[id]' declares '[id]' more than once"
        );
    }
}
