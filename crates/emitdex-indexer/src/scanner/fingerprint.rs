//! Size-based change detection.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Last-seen byte size per file.
///
/// Size is a cheap and imperfect change marker: an edit that keeps the byte
/// count identical is not noticed until some later edit changes it.
#[derive(Debug, Default)]
pub struct FingerprintCache {
    sizes: HashMap<PathBuf, u64>,
}

impl FingerprintCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false if `size` matches the recorded size for `path`.
    /// Otherwise records `size` and returns true.
    pub fn should_scan(&mut self, path: &Path, size: u64) -> bool {
        if self.sizes.get(path) == Some(&size) {
            return false;
        }

        self.sizes.insert(path.to_path_buf(), size);
        true
    }

    /// Drop the recorded size so the next `should_scan` for `path` succeeds.
    pub fn forget(&mut self, path: &Path) {
        self.sizes.remove(path);
    }

    /// Drop every recorded size, forcing a full rescan.
    pub fn clear(&mut self) {
        self.sizes.clear();
    }

    pub fn get(&self, path: &Path) -> Option<u64> {
        self.sizes.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.sizes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sizes.is_empty()
    }
}
