//! Browser Cache Reader (§4.9): fast, offline lookup over the two
//! pre-indexed browser asset files (device cache, sample cache) a
//! separate client-side tool regenerates. The core only ever reads
//! these; it never writes them.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use mcpbridge_types::{BrowserCacheEntry, BrowserCacheFile};

use crate::error::FacadeError;

pub struct BrowserCacheReader {
    device_cache_path: PathBuf,
    sample_cache_path: PathBuf,
}

impl BrowserCacheReader {
    pub fn new(device_cache_path: impl Into<PathBuf>, sample_cache_path: impl Into<PathBuf>) -> Self {
        Self {
            device_cache_path: device_cache_path.into(),
            sample_cache_path: sample_cache_path.into(),
        }
    }

    fn read_file(path: &Path) -> Result<BrowserCacheFile, FacadeError> {
        let file = File::open(path)
            .map_err(|e| FacadeError::internal(format!("could not open browser cache '{}': {}", path.display(), e)))?;
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| FacadeError::internal(format!("malformed browser cache '{}': {}", path.display(), e)))
    }

    fn both_files(&self) -> Result<Vec<BrowserCacheEntry>, FacadeError> {
        let mut entries = Self::read_file(&self.device_cache_path)?.items;
        entries.extend(Self::read_file(&self.sample_cache_path)?.items);
        Ok(entries)
    }

    /// Case-insensitive substring match over `name` and `path` (§4.9).
    /// An empty query returns up to `limit` entries in file order,
    /// device cache first.
    pub fn search_cache(&self, query: &str, limit: usize) -> Result<Vec<BrowserCacheEntry>, FacadeError> {
        let needle = query.to_lowercase();
        let entries = self.both_files()?;
        Ok(entries
            .into_iter()
            .filter(|e| {
                needle.is_empty() || e.name.to_lowercase().contains(&needle) || e.path.to_lowercase().contains(&needle)
            })
            .take(limit)
            .collect())
    }

    /// The first entry whose `name` matches `name` exactly
    /// (case-insensitive), optionally narrowed to `category`.
    pub fn resolve_by_name(&self, name: &str, category: Option<&str>) -> Result<Option<BrowserCacheEntry>, FacadeError> {
        let entries = self.both_files()?;
        Ok(entries.into_iter().find(|e| {
            e.name.eq_ignore_ascii_case(name)
                && category.map_or(true, |cat| e.category.eq_ignore_ascii_case(cat))
        }))
    }
}
