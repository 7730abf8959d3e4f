//! Per-domain disk cache
//!
//! Each crawled domain gets a directory under the cache root holding the
//! links, both trees, the page content, and a manifest. A domain is only
//! considered cached when all four required artifacts exist and match the
//! hashes in its manifest. Nothing here locks: two crawls of one domain race
//! and the last writer wins.

mod bundle;
mod manifest;
mod paths;

pub use bundle::{
    format_links_file, parse_links_file, CacheBundle, PageEntry, TreeDocument,
};
pub use manifest::{sha256_hex, Manifest, MANIFEST_VERSION};
pub use paths::{
    CachePaths, FASTHTML_FILE, LINKS_FILE, MANIFEST_FILE, PAGES_FILE, TREE_JSON_FILE,
    TREE_MD_FILE,
};

use crate::output::format_tree_document;
use crate::tree::TreeError;
use crate::url::domain_dir_name;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Cache-specific errors
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cache JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Cached tree is invalid: {0}")]
    Tree(#[from] TreeError),

    #[error("No complete cache for {domain} (missing: {missing})")]
    Incomplete { domain: String, missing: String },

    #[error("Cached {0} does not match its manifest")]
    Mismatch(String),

    #[error("Unsupported manifest version {0}")]
    ManifestVersion(u32),
}

/// Filesystem-backed cache of crawl bundles
#[derive(Debug, Clone)]
pub struct CacheLayer {
    root: PathBuf,
    config_hash: Option<String>,
}

impl CacheLayer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            config_hash: None,
        }
    }

    /// Records the config hash in every manifest this layer writes
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.config_hash = Some(hash.into());
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Paths for a domain's bundle; nothing is created on disk
    pub fn paths_for(&self, domain: &str) -> CachePaths {
        CachePaths::new(self.root.join(domain_dir_name(domain)))
    }

    /// True when all four artifacts exist and match the manifest
    pub fn is_cached(&self, domain: &str) -> bool {
        match self.check(domain) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!("Cache miss for {}: {}", domain, e);
                false
            }
        }
    }

    fn check(&self, domain: &str) -> Result<(), CacheError> {
        let paths = self.paths_for(domain);
        let missing = paths.missing();
        if !missing.is_empty() {
            return Err(CacheError::Incomplete {
                domain: domain.to_string(),
                missing: missing.join(", "),
            });
        }
        if !paths.manifest_path.is_file() {
            return Err(CacheError::Incomplete {
                domain: domain.to_string(),
                missing: MANIFEST_FILE.to_string(),
            });
        }
        Manifest::read(&paths)?.verify(&paths)
    }

    /// Reads a complete bundle back from disk
    pub fn load(&self, domain: &str) -> Result<CacheBundle, CacheError> {
        self.check(domain)?;
        let paths = self.paths_for(domain);
        let manifest = Manifest::read(&paths)?;

        let links_text = std::fs::read_to_string(&paths.links_path)?;
        let (header_url, links) = parse_links_file(&links_text);

        let document: TreeDocument =
            serde_json::from_str(&std::fs::read_to_string(&paths.tree_json_path)?)?;
        let (conventional_tree, enhanced_tree) = bundle::trees_from_document(&document)?;

        let entries: BTreeMap<String, PageEntry> =
            serde_json::from_str(&std::fs::read_to_string(&paths.pages_path)?)?;

        tracing::info!("Loaded cached bundle for {} from {}", domain, paths.dir.display());

        Ok(CacheBundle {
            base_url: header_url.unwrap_or(manifest.base_url),
            links,
            conventional_tree,
            enhanced_tree,
            pages: bundle::pages_from_entries(entries),
        })
    }

    /// Writes a bundle, finishing with the manifest
    ///
    /// Any existing manifest is removed first, so a save that fails partway
    /// leaves the domain uncached rather than half-updated. A merged document
    /// from an earlier crawl is removed too; see [`CacheLayer::write_document`].
    pub fn save(&self, domain: &str, bundle: &CacheBundle) -> Result<CachePaths, CacheError> {
        let paths = self.paths_for(domain);
        std::fs::create_dir_all(&paths.dir)?;
        for stale in [&paths.manifest_path, &paths.fasthtml_path] {
            if stale.exists() {
                std::fs::remove_file(stale)?;
            }
        }

        let mut manifest = Manifest::new(&bundle.base_url, self.config_hash.clone());

        let links_text = format_links_file(&bundle.base_url, &bundle.links);
        write_artifact(&paths.links_path, links_text.as_bytes())?;
        manifest.record(LINKS_FILE, links_text.as_bytes());

        let tree_json = serde_json::to_vec_pretty(&bundle.tree_document())?;
        write_artifact(&paths.tree_json_path, &tree_json)?;
        manifest.record(TREE_JSON_FILE, &tree_json);

        let tree_md = format_tree_document(bundle);
        write_artifact(&paths.tree_md_path, tree_md.as_bytes())?;
        manifest.record(TREE_MD_FILE, tree_md.as_bytes());

        let pages_json = serde_json::to_vec_pretty(&bundle.page_entries())?;
        write_artifact(&paths.pages_path, &pages_json)?;
        manifest.record(PAGES_FILE, &pages_json);

        let manifest_json = serde_json::to_vec_pretty(&manifest)?;
        let staging = paths.dir.join(format!("{}.tmp", MANIFEST_FILE));
        write_artifact(&staging, &manifest_json)?;
        std::fs::rename(&staging, &paths.manifest_path)?;

        tracing::info!(
            "Cached {} links and {} pages for {} in {}",
            bundle.links.len(),
            bundle.pages.len(),
            domain,
            paths.dir.display()
        );

        Ok(paths)
    }

    /// Writes the merged page document next to a saved bundle
    ///
    /// The document is optional and not recorded in the manifest.
    pub fn write_document(&self, domain: &str, document: &str) -> Result<PathBuf, CacheError> {
        let paths = self.paths_for(domain);
        std::fs::create_dir_all(&paths.dir)?;
        write_artifact(&paths.fasthtml_path, document.as_bytes())?;
        Ok(paths.fasthtml_path)
    }
}

fn write_artifact(path: &Path, contents: &[u8]) -> Result<(), CacheError> {
    tracing::debug!("Writing {} ({} bytes)", path.display(), contents.len());
    std::fs::write(path, contents)?;
    Ok(())
}
