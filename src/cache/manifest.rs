//! Commit marker for a cache bundle
//!
//! The manifest is written last, after every artifact. It records a SHA-256
//! of each required artifact, so a bundle interrupted mid-write (no manifest)
//! or edited afterwards (hash mismatch) is never mistaken for a cache hit.

use crate::cache::paths::CachePaths;
use crate::cache::CacheError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    pub version: u32,
    pub base_url: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config_hash: Option<String>,
    /// Artifact file name -> hex SHA-256 of its contents
    pub files: BTreeMap<String, String>,
}

impl Manifest {
    pub fn new(base_url: &str, config_hash: Option<String>) -> Self {
        Self {
            version: MANIFEST_VERSION,
            base_url: base_url.to_string(),
            created_at: Utc::now(),
            config_hash,
            files: BTreeMap::new(),
        }
    }

    pub fn record(&mut self, file_name: &str, contents: &[u8]) {
        self.files
            .insert(file_name.to_string(), sha256_hex(contents));
    }

    pub fn read(paths: &CachePaths) -> Result<Self, CacheError> {
        let raw = std::fs::read_to_string(&paths.manifest_path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Checks every required artifact against its recorded hash
    pub fn verify(&self, paths: &CachePaths) -> Result<(), CacheError> {
        if self.version != MANIFEST_VERSION {
            return Err(CacheError::ManifestVersion(self.version));
        }

        for (name, path) in paths.required() {
            let expected = self
                .files
                .get(name)
                .ok_or_else(|| CacheError::Mismatch(name.to_string()))?;
            let contents = std::fs::read(path)?;
            if &sha256_hex(&contents) != expected {
                return Err(CacheError::Mismatch(name.to_string()));
            }
        }

        Ok(())
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
