//! Caller info records and the sources that produce them.

use std::time::Duration;

use futures_util::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::config::schema::AudienceConfig;
use crate::observability::metrics;

/// Geolocation record describing the current caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfoRecord {
    pub ip: String,
    pub hostname: String,
    pub city: String,
    pub region: String,
    pub country: String,
    pub loc: String,
    pub org: String,
    pub postal: String,
    pub timezone: String,
}

/// A field of [`InfoRecord`] that filters can match on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InfoField {
    Ip,
    Hostname,
    City,
    Region,
    Country,
    Loc,
    Org,
    Postal,
    Timezone,
}

impl InfoRecord {
    pub fn field(&self, field: InfoField) -> &str {
        match field {
            InfoField::Ip => &self.ip,
            InfoField::Hostname => &self.hostname,
            InfoField::City => &self.city,
            InfoField::Region => &self.region,
            InfoField::Country => &self.country,
            InfoField::Loc => &self.loc,
            InfoField::Org => &self.org,
            InfoField::Postal => &self.postal,
            InfoField::Timezone => &self.timezone,
        }
    }
}

/// Produces the caller's info record. `None` means the lookup failed.
pub trait InfoSource: Send + Sync {
    fn lookup(&self) -> BoxFuture<'_, Option<InfoRecord>>;
}

/// [`InfoSource`] backed by an ipinfo-style JSON endpoint.
#[derive(Debug, Clone)]
pub struct IpInfoClient {
    client: reqwest::Client,
    url: String,
}

impl IpInfoClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn from_config(config: &AudienceConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.lookup_url.clone(),
            Duration::from_secs(config.timeout_secs),
        )
    }

    async fn fetch(&self) -> Option<InfoRecord> {
        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Audience lookup failed");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::warn!(url = %self.url, status = %status, "Audience lookup returned non-200");
            return None;
        }

        match response.json::<InfoRecord>().await {
            Ok(record) => Some(record),
            Err(e) => {
                tracing::warn!(url = %self.url, error = %e, "Audience lookup returned malformed body");
                None
            }
        }
    }
}

impl InfoSource for IpInfoClient {
    fn lookup(&self) -> BoxFuture<'_, Option<InfoRecord>> {
        Box::pin(async move {
            let record = self.fetch().await;
            metrics::record_audience_lookup(record.is_some());
            record
        })
    }
}
