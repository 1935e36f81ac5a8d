//! Hot reload: watches configuration directories and swaps the live snapshot
//! when the loaded resources change.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, Debouncer};
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, info_span, warn};

use crate::config::{ConfigurationSnapshot, LiveConfig, LoadOptions, Loader};
use crate::error::{ConfigError, Result};
use crate::parse::matches_extension;

/// Result of one reload attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum ReloadEvent {
    /// The reloaded resources differed and were published.
    Updated,
    /// The reloaded resources equal the live ones; nothing was published.
    Unchanged,
    /// Loading failed; the live snapshot was left as it was.
    Failed {
        /// The load error, rendered with its diagnostics.
        message: String,
    },
}

pub type ChangeCallback = Box<dyn Fn(&ConfigurationSnapshot) + Send + Sync>;
pub type ErrorCallback = Box<dyn Fn(&ConfigError) + Send + Sync>;

/// Reloads configuration into a [`LiveConfig`] and reports what happened.
pub struct Reloader {
    loader: Arc<Loader>,
    live: LiveConfig,
    on_change: ChangeCallback,
    on_error: ErrorCallback,
    sender: broadcast::Sender<ReloadEvent>,
}

impl Reloader {
    pub fn new<C, E>(loader: Arc<Loader>, live: LiveConfig, on_change: C, on_error: E) -> Self
    where
        C: Fn(&ConfigurationSnapshot) + Send + Sync + 'static,
        E: Fn(&ConfigError) + Send + Sync + 'static,
    {
        let (sender, _) = broadcast::channel(100);
        Self {
            loader,
            live,
            on_change: Box::new(on_change),
            on_error: Box::new(on_error),
            sender,
        }
    }

    pub fn live(&self) -> &LiveConfig {
        &self.live
    }

    /// Returns a receiver for reload events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.sender.subscribe()
    }

    /// Reloads the live snapshot's directories.
    ///
    /// A failed load leaves the live snapshot untouched and calls the error
    /// callback. A load equal to the live snapshot does nothing. Otherwise
    /// the resources are swapped in under the write lock and the change
    /// callback receives the new snapshot once the lock is released.
    pub fn reload(&self) -> ReloadEvent {
        let _span = info_span!("config.reload").entered();
        let dirs = self.live.config_paths();

        let event = match self.loader.load(&dirs) {
            Err(err) => {
                warn!(error = %err, "Configuration reload failed, keeping current configuration");
                (self.on_error)(&err);
                ReloadEvent::Failed {
                    message: err.to_string(),
                }
            }
            Ok(outcome) => {
                let unchanged = self.live.read().equals(&outcome.snapshot);
                if unchanged {
                    info!("Configuration unchanged");
                    ReloadEvent::Unchanged
                } else {
                    let mut published = outcome.snapshot.clone();
                    published.config_paths = dirs;
                    self.live.publish(outcome.snapshot);
                    info!(
                        credentials = published.credentials.len(),
                        notifiers = published.notifiers.len(),
                        connections = published.pipeling_connections.len(),
                        "Configuration updated"
                    );
                    (self.on_change)(&published);
                    ReloadEvent::Updated
                }
            }
        };

        let _ = self.sender.send(event.clone());
        event
    }
}

/// Watcher timing.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Quiet period before a burst of file events triggers one reload.
    pub debounce: Duration,
    /// How often the event loop checks the shutdown flag.
    pub poll_interval: Duration,
}

impl Default for WatchOptions {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(500),
            poll_interval: Duration::from_millis(100),
        }
    }
}

/// Which changed paths warrant a reload.
#[derive(Debug, Clone)]
struct EventFilter {
    extensions: Vec<String>,
    lock_file: String,
}

impl EventFilter {
    fn new(options: &LoadOptions) -> Self {
        Self {
            extensions: options.extensions.clone(),
            lock_file: options.lock_file.clone(),
        }
    }

    fn is_relevant(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            return false;
        };
        !name.starts_with('.')
            && name != self.lock_file
            && matches_extension(path, &self.extensions)
    }
}

/// Watches the live snapshot's directories and reloads on change.
pub struct ConfigWatcher {
    reloader: Arc<Reloader>,
    options: WatchOptions,
    shutdown: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl ConfigWatcher {
    pub fn new(reloader: Reloader) -> Self {
        Self {
            reloader: Arc::new(reloader),
            options: WatchOptions::default(),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: None,
        }
    }

    pub fn with_options(mut self, options: WatchOptions) -> Self {
        self.options = options;
        self
    }

    pub fn reloader(&self) -> &Reloader {
        &self.reloader
    }

    /// Returns a receiver for reload events.
    pub fn subscribe(&self) -> broadcast::Receiver<ReloadEvent> {
        self.reloader.subscribe()
    }

    /// Reloads immediately, outside of any file event.
    pub fn reload(&self) -> ReloadEvent {
        self.reloader.reload()
    }

    /// The flag that stops the event loop once set.
    pub fn shutdown_flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Starts watching every configuration directory in a background thread.
    pub fn start(&mut self) -> Result<()> {
        if self.handle.is_some() {
            return Ok(());
        }

        let (tx, rx) = std::sync::mpsc::channel();
        let mut debouncer: Debouncer<RecommendedWatcher> = new_debouncer(self.options.debounce, tx)
            .map_err(|e| ConfigError::Watch(e.to_string()))?;

        let dirs: Vec<PathBuf> = self.reloader.live().config_paths();
        for dir in &dirs {
            debouncer
                .watcher()
                .watch(dir, RecursiveMode::Recursive)
                .map_err(|e| ConfigError::Watch(format!("{}: {}", dir.display(), e)))?;
            log::info!("Started watching config directory: {}", dir.display());
        }

        let reloader = Arc::clone(&self.reloader);
        let shutdown = Arc::clone(&self.shutdown);
        let filter = EventFilter::new(reloader.loader.load_options());
        let poll_interval = self.options.poll_interval;

        let handle = std::thread::Builder::new()
            .name("config-watcher".to_string())
            .spawn(move || {
                // Dropping the debouncer stops the underlying watcher.
                let _debouncer = debouncer;
                watch_loop(&rx, &reloader, &shutdown, &filter, poll_interval);
                log::info!("Stopped watching config directories");
            })
            .map_err(|e| ConfigError::Watch(e.to_string()))?;

        self.handle = Some(handle);
        Ok(())
    }

    /// Signals the watcher to stop and waits for any in-flight reload.
    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::Relaxed);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }

    /// Returns whether the watcher has been signaled to stop.
    pub fn is_stopped(&self) -> bool {
        self.shutdown.load(Ordering::Relaxed)
    }
}

impl Drop for ConfigWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}

fn watch_loop(
    rx: &Receiver<DebounceEventResult>,
    reloader: &Reloader,
    shutdown: &AtomicBool,
    filter: &EventFilter,
    poll_interval: Duration,
) {
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }

        match rx.recv_timeout(poll_interval) {
            Ok(Ok(events)) => {
                let relevant = events.iter().any(|e| filter.is_relevant(&e.path));
                if !relevant {
                    continue;
                }
                // A stop requested during the debounce window wins.
                if shutdown.load(Ordering::Relaxed) {
                    break;
                }
                log::debug!("Config files changed, reloading");
                reloader.reload();
            }
            Ok(Err(e)) => {
                log::error!("Watch error: {}", e);
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

/// Starts a watcher that reloads `live` whenever its directories change.
pub fn start_watching<C, E>(
    loader: Arc<Loader>,
    live: LiveConfig,
    on_change: C,
    on_error: E,
) -> Result<ConfigWatcher>
where
    C: Fn(&ConfigurationSnapshot) + Send + Sync + 'static,
    E: Fn(&ConfigError) + Send + Sync + 'static,
{
    let mut watcher = ConfigWatcher::new(Reloader::new(loader, live, on_change, on_error));
    watcher.start()?;
    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::BuiltinCatalog;
    use std::sync::atomic::AtomicUsize;

    fn seeded(config_paths: Vec<PathBuf>) -> ConfigurationSnapshot {
        ConfigurationSnapshot::seeded(config_paths, &BuiltinCatalog::new()).unwrap()
    }

    #[test]
    fn test_reload_event_serialization() {
        assert_eq!(
            serde_json::to_string(&ReloadEvent::Updated).unwrap(),
            r#"{"status":"updated"}"#
        );
        let failed = ReloadEvent::Failed {
            message: "boom".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&failed).unwrap(),
            r#"{"status":"failed","message":"boom"}"#
        );
    }

    #[test]
    fn test_event_filter() {
        let filter = EventFilter::new(&LoadOptions::default());
        let cases = [
            ("/cfg/creds.yaml", true),
            ("/cfg/nested/notifiers.yml", true),
            ("/cfg/.creds.yaml.swp", false),
            ("/cfg/.hidden.yaml", false),
            ("/cfg/pipeling.lock.yaml", false),
            ("/cfg/readme.md", false),
            ("/cfg", false),
        ];
        for (path, expected) in cases {
            assert_eq!(filter.is_relevant(Path::new(path)), expected, "{}", path);
        }
    }

    #[test]
    fn test_stop_without_start() {
        let reloader = Reloader::new(
            Arc::new(Loader::new()),
            LiveConfig::new(seeded(Vec::new())),
            |_| {},
            |_| {},
        );
        let mut watcher = ConfigWatcher::new(reloader);
        assert!(!watcher.is_stopped());
        watcher.stop();
        assert!(watcher.is_stopped());
    }

    #[test]
    fn test_failed_reload_reports_error() {
        let errors = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&errors);
        let live = LiveConfig::new(seeded(vec![PathBuf::from("/nonexistent/pipeling/config")]));
        let before = live.snapshot();
        let reloader = Reloader::new(Arc::new(Loader::new()), live.clone(), |_| {}, move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        let mut rx = reloader.subscribe();

        let event = reloader.reload();
        assert!(matches!(event, ReloadEvent::Failed { .. }));
        assert_eq!(errors.load(Ordering::SeqCst), 1);
        assert_eq!(rx.try_recv().unwrap(), event);
        assert!(live.read().equals(&before));
        assert!(live.read().credentials.contains_key("aws.default"));
    }
}
