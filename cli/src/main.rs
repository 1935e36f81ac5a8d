mod args;

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use serde_json::Value as JsonValue;
use tracing::{error, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

use pipeling_config::{
    ConfigWatcher, ConfigurationSnapshot, Diagnostics, LiveConfig, Loader, Reloader,
    WatchOptions,
};

use crate::args::{CliArgs, Command};

fn init_logging(json: bool) -> Result<()> {
    // The watcher loop logs through the `log` facade.
    LogTracer::init().context("failed to bridge log records")?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    if json {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
    } else {
        tracing::subscriber::set_global_default(registry.with(fmt::layer().with_target(false)))
    }
    .context("failed to install tracing subscriber")
}

#[derive(Serialize)]
struct Summary<'a> {
    config_paths: &'a [PathBuf],
    credentials: Vec<&'a str>,
    credential_imports: Vec<&'a str>,
    integrations: Vec<&'a str>,
    notifiers: BTreeMap<String, JsonValue>,
    connections: Vec<&'a str>,
    connection_imports: Vec<&'a str>,
    warnings: &'a Diagnostics,
}

fn sorted_keys<V>(map: &std::collections::HashMap<String, V>) -> Vec<&str> {
    let mut keys: Vec<&str> = map.keys().map(String::as_str).collect();
    keys.sort_unstable();
    keys
}

impl<'a> Summary<'a> {
    fn new(snapshot: &'a ConfigurationSnapshot, warnings: &'a Diagnostics) -> Self {
        Self {
            config_paths: &snapshot.config_paths,
            credentials: sorted_keys(&snapshot.credentials),
            credential_imports: sorted_keys(&snapshot.credential_imports),
            integrations: sorted_keys(&snapshot.integrations),
            notifiers: snapshot.notifier_value_map().into_iter().collect(),
            connections: sorted_keys(&snapshot.pipeling_connections),
            connection_imports: sorted_keys(&snapshot.connection_imports),
            warnings,
        }
    }

    fn print(&self) {
        let sections = [
            ("Credentials", &self.credentials),
            ("Credential imports", &self.credential_imports),
            ("Integrations", &self.integrations),
            ("Connections", &self.connections),
            ("Connection imports", &self.connection_imports),
        ];
        for (title, names) in sections {
            println!("{} ({})", title, names.len());
            for name in names {
                println!("  {}", name);
            }
        }
        println!("Notifiers ({})", self.notifiers.len());
        for name in self.notifiers.keys() {
            println!("  {}", name);
        }
        if !self.warnings.is_empty() {
            println!("Warnings\n{}", self.warnings);
        }
    }
}

fn load(loader: &Loader, dirs: &[PathBuf], json: bool) -> Result<()> {
    let outcome = loader.load(dirs).context("failed to load configuration")?;
    let summary = Summary::new(&outcome.snapshot, &outcome.warnings);
    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        summary.print();
    }
    Ok(())
}

fn watch(loader: Arc<Loader>, dirs: &[PathBuf], debounce: Duration) -> Result<()> {
    let outcome = loader
        .load(dirs)
        .context("initial configuration load failed")?;
    for warning in &outcome.warnings {
        warn!(warning = %warning, "Configuration warning");
    }

    let live = LiveConfig::new(outcome.snapshot);
    let reloader = Reloader::new(
        loader,
        live,
        |snapshot| {
            info!(
                credentials = snapshot.credentials.len(),
                notifiers = snapshot.notifiers.len(),
                connections = snapshot.pipeling_connections.len(),
                "Applied configuration change"
            );
        },
        |err| error!(error = %err, "Configuration reload failed"),
    );

    let mut watcher = ConfigWatcher::new(reloader).with_options(WatchOptions {
        debounce,
        ..Default::default()
    });
    watcher.start().context("failed to start watching")?;

    let shutdown = watcher.shutdown_flag();
    ctrlc::set_handler(move || shutdown.store(true, Ordering::Relaxed))
        .context("failed to install Ctrl-C handler")?;

    info!("Watching for configuration changes, press Ctrl-C to stop");
    while !watcher.is_stopped() {
        thread::sleep(Duration::from_millis(200));
    }
    watcher.stop();
    info!("Shut down");
    Ok(())
}

fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_logging(args.log_json)?;

    let dirs = args.dirs();
    let loader = Arc::new(Loader::new());

    match args.command {
        Command::Load { json } => load(&loader, &dirs, json),
        Command::Watch { debounce_ms } => {
            watch(loader, &dirs, Duration::from_millis(debounce_ms))
        }
    }
}
