//! Configuration file watcher for hot reload of the route table.
//!
//! Editors and `fs::write` truncate before writing, so one save arrives as a
//! burst of events. The burst is coalesced and the file is read once it has
//! been quiet for the debounce window.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::AppConfig;
use crate::observability::metrics;

const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// A watcher that monitors the configuration file for changes.
pub struct ConfigWatcher {
    path: PathBuf,
    debounce: Duration,
    update_tx: mpsc::UnboundedSender<AppConfig>,
}

impl ConfigWatcher {
    /// Create a new ConfigWatcher.
    ///
    /// Returns the watcher and a receiver for validated configuration updates.
    pub fn new(path: &Path) -> (Self, mpsc::UnboundedReceiver<AppConfig>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                debounce: DEFAULT_DEBOUNCE,
                update_tx,
            },
            update_rx,
        )
    }

    /// Quiet period required before a change is reloaded.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Start watching. Must be called inside a Tokio runtime; the returned
    /// watcher must be kept alive.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let (change_tx, change_rx) = mpsc::unbounded_channel();
        let path = self.path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        let _ = change_tx.send(());
                    }
                }
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&self.path, RecursiveMode::NonRecursive)?;
        tokio::spawn(reload_loop(path, self.debounce, change_rx, self.update_tx));

        tracing::info!(path = ?self.path, debounce_ms = self.debounce.as_millis() as u64, "Config watcher started");
        Ok(watcher)
    }
}

/// Ends when the watcher, and with it the change sender, is dropped.
async fn reload_loop(
    path: PathBuf,
    debounce: Duration,
    mut changes: mpsc::UnboundedReceiver<()>,
    updates: mpsc::UnboundedSender<AppConfig>,
) {
    while changes.recv().await.is_some() {
        let mut coalesced = 1u32;
        loop {
            match tokio::time::timeout(debounce, changes.recv()).await {
                Ok(Some(())) => coalesced += 1,
                Ok(None) => return,
                Err(_) => break,
            }
        }

        tracing::info!(path = ?path, events = coalesced, "Config file change detected, reloading");
        match load_config(&path) {
            Ok(new_config) => {
                metrics::record_config_reload(true);
                if updates.send(new_config).is_err() {
                    return;
                }
            }
            Err(e) => {
                metrics::record_config_reload(false);
                tracing::error!(
                    error = %e,
                    "Failed to reload config, keeping current route table"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn next_with_pattern(
        updates: &mut mpsc::UnboundedReceiver<AppConfig>,
        pattern: &str,
    ) -> Option<AppConfig> {
        tokio::time::timeout(Duration::from_secs(10), async {
            loop {
                match updates.recv().await {
                    Some(config) if config.routes.first().is_some_and(|r| r.pattern == pattern) => {
                        return Some(config)
                    }
                    Some(_) => continue,
                    None => return None,
                }
            }
        })
        .await
        .ok()
        .flatten()
    }

    #[tokio::test]
    async fn test_reload_on_modify() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(&path, "[[routes]]\npattern = \"/\"\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _guard = watcher.run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(&path, "[[routes]]\npattern = \"/next\"\n").unwrap();

        let config = next_with_pattern(&mut updates, "/next")
            .await
            .expect("reload within timeout");
        assert_eq!(config.routes.len(), 1);
    }

    #[tokio::test]
    async fn test_burst_is_coalesced() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("routes.toml");
        std::fs::write(&path, "[[routes]]\npattern = \"/\"\n").unwrap();

        let (watcher, mut updates) = ConfigWatcher::new(&path);
        let _guard = watcher.with_debounce(Duration::from_millis(500)).run().unwrap();

        tokio::time::sleep(Duration::from_millis(200)).await;
        for pattern in ["/one", "/two", "/three"] {
            std::fs::write(&path, format!("[[routes]]\npattern = \"{pattern}\"\n")).unwrap();
        }

        let first = tokio::time::timeout(Duration::from_secs(10), updates.recv())
            .await
            .expect("reload within timeout")
            .expect("channel open");
        assert_eq!(first.routes.first().map(|r| r.pattern.as_str()), Some("/three"));

        let extra = tokio::time::timeout(Duration::from_secs(1), updates.recv()).await;
        assert!(extra.is_err(), "burst produced more than one reload");
    }
}
