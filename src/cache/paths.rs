use std::path::{Path, PathBuf};

pub const FASTHTML_FILE: &str = "fasthtml_doc.txt";
pub const TREE_MD_FILE: &str = "tree_structure.md";
pub const TREE_JSON_FILE: &str = "tree_structure.json";
pub const LINKS_FILE: &str = "extracted_links.txt";
pub const PAGES_FILE: &str = "pages_content.json";
pub const MANIFEST_FILE: &str = "manifest.json";

/// File locations for one domain's cache bundle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachePaths {
    pub dir: PathBuf,
    pub fasthtml_path: PathBuf,
    pub tree_md_path: PathBuf,
    pub tree_json_path: PathBuf,
    pub links_path: PathBuf,
    pub pages_path: PathBuf,
    pub manifest_path: PathBuf,
}

impl CachePaths {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            fasthtml_path: dir.join(FASTHTML_FILE),
            tree_md_path: dir.join(TREE_MD_FILE),
            tree_json_path: dir.join(TREE_JSON_FILE),
            links_path: dir.join(LINKS_FILE),
            pages_path: dir.join(PAGES_FILE),
            manifest_path: dir.join(MANIFEST_FILE),
            dir,
        }
    }

    /// The four artifacts that must all be present for a cache hit
    pub fn required(&self) -> [(&'static str, &Path); 4] {
        [
            (TREE_MD_FILE, self.tree_md_path.as_path()),
            (TREE_JSON_FILE, self.tree_json_path.as_path()),
            (LINKS_FILE, self.links_path.as_path()),
            (PAGES_FILE, self.pages_path.as_path()),
        ]
    }

    /// Names of required artifacts that do not exist on disk
    pub fn missing(&self) -> Vec<&'static str> {
        self.required()
            .iter()
            .filter(|(_, path)| !path.is_file())
            .map(|(name, _)| *name)
            .collect()
    }
}
