//! Test harness for isolated configuration loading.
//!
//! Each `ConfigHarness` owns a temporary directory. Configuration
//! directories and import sources are created beneath it on demand.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pipeling_config::{ConfigError, LoadOutcome, Loader};

pub struct ConfigHarness {
    temp_dir: TempDir,
}

impl ConfigHarness {
    pub fn new() -> Self {
        Self {
            temp_dir: TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Get the base temp directory path.
    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Create (if needed) and return a directory below the temp root.
    pub fn dir(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create directory");
        path
    }

    /// Write `content` to `dir/filename`, creating `dir` first.
    pub fn write(&self, dir: &str, filename: &str, content: &str) -> PathBuf {
        let path = self.dir(dir).join(filename);
        std::fs::write(&path, content).expect("Failed to write config file");
        path
    }

    /// Write several YAML documents into one file.
    pub fn write_documents(&self, dir: &str, filename: &str, documents: &[String]) -> PathBuf {
        self.write(dir, filename, &documents.join("---\n"))
    }

    pub fn remove(&self, dir: &str, filename: &str) {
        std::fs::remove_file(self.temp_dir.path().join(dir).join(filename))
            .expect("Failed to remove config file");
    }

    pub fn paths(&self, dirs: &[&str]) -> Vec<PathBuf> {
        dirs.iter().map(|d| self.dir(d)).collect()
    }

    /// Load `dirs` with the default loader.
    pub fn load(&self, dirs: &[&str]) -> Result<LoadOutcome, ConfigError> {
        Loader::new().load(&self.paths(dirs))
    }

    /// Load `dirs`, panicking with the error on failure.
    pub fn load_ok(&self, dirs: &[&str]) -> LoadOutcome {
        match self.load(dirs) {
            Ok(outcome) => outcome,
            Err(e) => panic!("Expected configuration to load, got: {}", e),
        }
    }

    /// Load `dirs`, panicking if loading succeeds.
    pub fn load_err(&self, dirs: &[&str]) -> ConfigError {
        match self.load(dirs) {
            Ok(_) => panic!("Expected configuration loading to fail"),
            Err(e) => e,
        }
    }
}

impl Default for ConfigHarness {
    fn default() -> Self {
        Self::new()
    }
}
