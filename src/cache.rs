// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use crate::config::CacheKey;
use crate::lattice::{CallSignature, LatticeType};
use crate::report::Report;

/// Finished frame as stored in the cache. Location chains of `reports` start
/// at the frame itself so they can be re-rooted under any caller.
#[derive(Clone, Debug)]
pub struct CachedFrame {
    pub result: LatticeType,
    pub reports: Vec<Report>,
}

/// Inference results shared by all analyzers of a session, partitioned by
/// [`CacheKey`]. An entry is only ever visible to analyzers with the key it
/// was stored under.
#[derive(Clone, Debug, Default)]
pub struct ResultCache {
    entries: BTreeMap<(CacheKey, CallSignature), CachedFrame>,
}

impl ResultCache {
    pub fn new() -> Self {
        ResultCache::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CacheKey, signature: &CallSignature) -> Option<&CachedFrame> {
        // Tuple keys cannot be looked up by reference.
        self.entries.get(&(key.clone(), signature.clone()))
    }

    pub fn insert(&mut self, key: CacheKey, signature: CallSignature, frame: CachedFrame) {
        self.entries.insert((key, signature), frame);
    }

    /// Number of entries stored under `key`.
    pub fn partition_len(&self, key: &CacheKey) -> usize {
        self.entries.keys().filter(|(k, _)| k == key).count()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
