//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the router.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Router behaviour.
    pub router: RouterConfig,

    /// Route table.
    pub routes: Vec<RouteConfig>,

    /// Deferred evaluation settings.
    pub defer: DeferConfig,

    /// Audience lookup settings.
    pub audience: AudienceConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Router options.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Lowercase the path before matching.
    pub lowercase: bool,

    /// Path used when a navigation does not name one.
    pub default_path: String,

    /// Search used for the first navigation when none is given.
    pub default_search: String,

    /// Default mount target selector.
    pub mount: String,

    /// Drop renders of dispatches superseded by a newer navigation.
    pub discard_stale: bool,

    /// Active language code.
    pub language: String,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            lowercase: false,
            default_path: "/".to_string(),
            default_search: String::new(),
            mount: "#app".to_string(),
            discard_stale: true,
            language: "en".to_string(),
        }
    }
}

/// A route declared in the configuration file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Route pattern, or `"404"` for the fallback.
    pub pattern: String,

    /// Route priority (lower = checked first).
    #[serde(default)]
    pub priority: i32,

    /// Mount target; defaults to `router.mount`.
    #[serde(default)]
    pub mount: Option<String>,

    /// Clear the mount target before each dispatch.
    #[serde(default = "default_clear")]
    pub clear: bool,

    /// Text view; `{name}` is replaced by the dynamic value.
    #[serde(default)]
    pub view: String,
}

fn default_clear() -> bool {
    true
}

/// Deferred evaluation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeferConfig {
    /// Delay added per deferred producer, in milliseconds.
    pub step_ms: u64,
}

impl Default for DeferConfig {
    fn default() -> Self {
        Self { step_ms: 50 }
    }
}

/// Audience (IP geolocation) lookup configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AudienceConfig {
    /// Lookup endpoint returning the caller's info record as JSON.
    pub lookup_url: String,

    /// Lookup timeout in seconds.
    pub timeout_secs: u64,

    /// User agent matched by user-agent filters.
    pub user_agent: String,
}

impl Default for AudienceConfig {
    fn default() -> Self {
        Self {
            lookup_url: "https://ipinfo.io/json".to_string(),
            timeout_secs: 5,
            user_agent: String::new(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
