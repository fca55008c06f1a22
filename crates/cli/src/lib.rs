pub mod commands;

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use binsight_core::config::{load_settings, AnalysisSettings};
use sha2::{Digest, Sha256};

/// Make `path` absolute, canonicalizing when it exists.
pub fn absolute_path(path: &Path) -> Result<PathBuf> {
    match path.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) if path.is_absolute() => Ok(path.to_path_buf()),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(path))
        }
    }
}

/// Compute the SHA-256 hash of already-loaded content and return it as a hex string.
pub fn sha256_hex(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}

/// Settings from `config` when given, defaults otherwise.
pub fn resolve_settings(config: Option<&str>) -> Result<AnalysisSettings> {
    match config {
        Some(path) => load_settings(Path::new(path)),
        None => Ok(AnalysisSettings::default()),
    }
}
