//! Content-addressed memoization of load results.
//!
//! The host framework the original design assumed would memoize loads
//! implicitly; here the cache is explicit: key = hash of (file name, file
//! bytes, delimiter, sheet), value = the loaded frame. Failed loads are
//! never cached, so a corrected re-upload always re-parses.

use std::collections::HashMap;
use std::hash::BuildHasher;

use polars::prelude::DataFrame;

use crate::error::LoadError;
use crate::loader::{self, LoadOptions};

pub struct LoadCache {
    hasher: ahash::RandomState,
    entries: HashMap<u64, DataFrame>,
}

impl LoadCache {
    pub fn new() -> Self {
        Self {
            // Fixed seeds keep keys stable for the lifetime of the process.
            hasher: ahash::RandomState::with_seeds(
                0x5d7d_11f1,
                0x2c9a_3be4,
                0x9e37_79b9,
                0x85eb_ca6b,
            ),
            entries: HashMap::new(),
        }
    }

    fn key(&self, name: &str, bytes: &[u8], options: &LoadOptions) -> u64 {
        self.hasher.hash_one((name, bytes, options))
    }

    /// Get-or-compute: return the cached frame for identical inputs, or load
    /// and remember the result.
    pub fn get_or_load(
        &mut self,
        name: &str,
        bytes: &[u8],
        options: &LoadOptions,
    ) -> Result<DataFrame, LoadError> {
        let key = self.key(name, bytes, options);
        if let Some(df) = self.entries.get(&key) {
            log::debug!("load cache hit for '{}'", name);
            return Ok(df.clone());
        }
        let df = loader::load_bytes(name, bytes, options)?;
        self.entries.insert(key, df.clone());
        Ok(df)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl Default for LoadCache {
    fn default() -> Self {
        Self::new()
    }
}
