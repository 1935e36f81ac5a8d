//! Multi-directory configuration loading.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, info_span};

use super::derive::credentials_to_connections;
use super::import::{import_connections, import_credentials};
use super::loader::load_directory;
use super::options::LoadOptions;
use super::snapshot::ConfigurationSnapshot;
use crate::catalog::{BuiltinCatalog, Catalog};
use crate::diagnostics::Diagnostics;
use crate::error::{ConfigError, Result};

/// A successfully loaded snapshot plus the warnings collected on the way.
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    /// The seeded snapshot with every directory, import and derived
    /// connection applied.
    pub snapshot: ConfigurationSnapshot,
    /// Non-fatal diagnostics, such as import sources with no files or
    /// malformed connection patterns.
    pub warnings: Diagnostics,
}

/// Loads configuration directories into a [`ConfigurationSnapshot`].
#[derive(Clone)]
pub struct Loader {
    catalog: Arc<dyn Catalog>,
    options: LoadOptions,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Loader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Loader")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Loader {
    /// A loader using the built-in catalog and default options.
    pub fn new() -> Self {
        Self::with_catalog(Arc::new(BuiltinCatalog::new()))
    }

    pub fn with_catalog(catalog: Arc<dyn Catalog>) -> Self {
        Self {
            catalog,
            options: LoadOptions::default(),
        }
    }

    pub fn options(mut self, options: LoadOptions) -> Self {
        self.options = options;
        self
    }

    pub fn load_options(&self) -> &LoadOptions {
        &self.options
    }

    /// Loads `dirs`, earliest directory taking precedence on name collisions.
    ///
    /// Directories are decoded in reverse so that earlier ones overwrite
    /// later ones. Blocks that fail to decode are retried on further passes
    /// over the whole list, which lets a notifier reference an integration
    /// declared in a directory decoded after it. Passes stop once no errors
    /// remain, fail when a pass reports exactly the errors of the one
    /// before it, and give up after `max_decode_passes`.
    pub fn load(&self, dirs: &[PathBuf]) -> Result<LoadOutcome> {
        let _span = info_span!("config.load", dirs = dirs.len()).entered();

        let mut config = ConfigurationSnapshot::seeded(dirs.to_vec(), self.catalog.as_ref())?;
        let mut warnings = self.decode_until_settled(&mut config, dirs)?;

        import_credentials(&mut config, &self.options, &mut warnings)?;
        import_connections(&mut config, &self.options, &mut warnings)?;
        credentials_to_connections(&mut config, self.catalog.as_ref())?;

        info!(
            credentials = config.credentials.len(),
            integrations = config.integrations.len(),
            notifiers = config.notifiers.len(),
            connections = config.pipeling_connections.len(),
            warnings = warnings.len(),
            "Configuration loaded"
        );
        Ok(LoadOutcome {
            snapshot: config,
            warnings,
        })
    }

    fn decode_until_settled(
        &self,
        config: &mut ConfigurationSnapshot,
        dirs: &[PathBuf],
    ) -> Result<Diagnostics> {
        let max_passes = self.options.max_decode_passes.max(1);
        let mut previous: Option<Vec<String>> = None;
        let mut pass = 0;

        loop {
            pass += 1;
            let mut pass_diags = Diagnostics::new();
            for dir in dirs.iter().rev() {
                pass_diags.append(load_directory(config, dir, &self.options)?);
            }

            if !pass_diags.has_errors() {
                debug!(pass, "Decode settled");
                return Ok(pass_diags.warnings());
            }

            let fingerprint = pass_diags.fingerprint();
            if previous.as_ref() == Some(&fingerprint) {
                return Err(ConfigError::diagnostics(
                    "Failed to load configuration",
                    pass_diags,
                ));
            }
            if pass >= max_passes {
                return Err(ConfigError::NotConverged {
                    passes: pass,
                    diagnostics: pass_diags,
                });
            }

            debug!(pass, errors = fingerprint.len(), "Retrying decode pass");
            previous = Some(fingerprint);
        }
    }

    /// Runs [`Loader::load`] on the blocking thread pool.
    pub async fn load_in_background(self: Arc<Self>, dirs: Vec<PathBuf>) -> Result<LoadOutcome> {
        tokio::task::spawn_blocking(move || self.load(&dirs))
            .await
            .map_err(|e| ConfigError::Background(e.to_string()))?
    }
}

/// Loads `dirs` with the built-in catalog and default options.
pub fn load_config<P: AsRef<Path>>(dirs: &[P]) -> Result<LoadOutcome> {
    let dirs: Vec<PathBuf> = dirs.iter().map(|d| d.as_ref().to_path_buf()).collect();
    Loader::new().load(&dirs)
}
