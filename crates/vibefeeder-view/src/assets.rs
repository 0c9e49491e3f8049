//! Cache-busting URLs for static assets.
//!
//! A manifest maps public asset paths (`/static/css/app.css`) to a short
//! content hash. Rendered pages link to `path?v=hash`, which lets the static
//! handler serve fingerprinted URLs with long-lived cache headers.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

const PUBLIC_PREFIX: &str = "/static/";
const HASH_LEN: usize = 8;

/// Errors loading or generating a manifest.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// Reading or writing a file failed.
    #[error("asset manifest I/O error at {path}: {source}")]
    Io {
        /// The file or directory involved.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not a JSON object of strings.
    #[error("invalid asset manifest: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ManifestError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Asset path to content hash.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssetManifest {
    entries: HashMap<String, String>,
}

impl AssetManifest {
    /// Creates an empty manifest. Every URL passes through unchanged.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON manifest.
    pub fn from_json(data: &[u8]) -> Result<Self, ManifestError> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Reads a JSON manifest from disk.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let path = path.as_ref();
        let data = fs::read(path).map_err(|e| ManifestError::io(path, e))?;
        Self::from_json(&data)
    }

    /// Hashes every `.css` and `.js` file below `dir`.
    ///
    /// Keys are `/static/` followed by the path relative to `dir`, with
    /// forward slashes.
    pub fn generate(dir: impl AsRef<Path>) -> Result<Self, ManifestError> {
        let root = dir.as_ref();
        let mut manifest = Self::new();
        let mut pending = vec![root.to_path_buf()];

        while let Some(current) = pending.pop() {
            let entries = fs::read_dir(&current).map_err(|e| ManifestError::io(&current, e))?;
            for entry in entries {
                let entry = entry.map_err(|e| ManifestError::io(&current, e))?;
                let path = entry.path();
                if path.is_dir() {
                    pending.push(path);
                    continue;
                }
                if !matches!(
                    path.extension().and_then(|e| e.to_str()),
                    Some("css" | "js")
                ) {
                    continue;
                }

                let contents = fs::read(&path).map_err(|e| ManifestError::io(&path, e))?;
                let relative = path.strip_prefix(root).unwrap_or(&path);
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                manifest.insert(format!("{PUBLIC_PREFIX}{key}"), content_hash(&contents));
            }
        }

        Ok(manifest)
    }

    /// Writes the manifest as pretty-printed JSON, creating parent directories.
    pub fn write(&self, path: impl AsRef<Path>) -> Result<(), ManifestError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ManifestError::io(parent, e))?;
        }
        let data = serde_json::to_vec_pretty(&self.entries)?;
        fs::write(path, data).map_err(|e| ManifestError::io(path, e))
    }

    /// Records a hash for an asset path.
    pub fn insert(&mut self, path: impl Into<String>, hash: impl Into<String>) {
        self.entries.insert(path.into(), hash.into());
    }

    /// Returns the hash recorded for `path`.
    #[must_use]
    pub fn hash(&self, path: &str) -> Option<&str> {
        self.entries.get(path).map(String::as_str)
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the manifest has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns `path?v=hash` when the path is known, otherwise `path`.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        match self.hash(path) {
            Some(hash) => format!("{path}?v={hash}"),
            None => path.to_string(),
        }
    }
}

fn content_hash(contents: &[u8]) -> String {
    let digest = format!("{:x}", Sha256::digest(contents));
    digest[..HASH_LEN].to_string()
}

static INSTALLED: OnceLock<AssetManifest> = OnceLock::new();

/// Installs the process-wide manifest used by [`asset_url`].
///
/// Only the first call has an effect; returns `false` if a manifest was
/// already installed.
pub fn install_manifest(manifest: AssetManifest) -> bool {
    INSTALLED.set(manifest).is_ok()
}

/// Versioned URL for `path` using the installed manifest.
///
/// Without an installed manifest (development builds) the path is returned
/// unchanged.
#[must_use]
pub fn asset_url(path: &str) -> String {
    INSTALLED
        .get()
        .map_or_else(|| path.to_string(), |manifest| manifest.url(path))
}
