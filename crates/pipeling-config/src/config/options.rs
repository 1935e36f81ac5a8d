use crate::parse::ListOptions;

/// Name of the lock file kept beside configuration files. Never parsed.
pub const DEFAULT_LOCK_FILE: &str = "pipeling.lock.yaml";

/// Upper bound on decode passes over the directory list.
pub const DEFAULT_MAX_DECODE_PASSES: usize = 10;

/// Options controlling how configuration directories are read.
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Configuration file extensions, without the leading dot.
    pub extensions: Vec<String>,
    /// File name excluded from every directory listing.
    pub lock_file: String,
    /// Decode passes attempted before giving up on a configuration that
    /// keeps changing its errors.
    pub max_decode_passes: usize,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extensions: vec!["yaml".to_string(), "yml".to_string()],
            lock_file: DEFAULT_LOCK_FILE.to_string(),
            max_decode_passes: DEFAULT_MAX_DECODE_PASSES,
        }
    }
}

impl LoadOptions {
    pub(crate) fn list_options(&self) -> ListOptions {
        ListOptions {
            extensions: self.extensions.clone(),
            exclude: vec![self.lock_file.clone()],
            recursive: false,
        }
    }
}
