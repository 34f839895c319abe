// SPDX-License-Identifier: MIT
//! Single-slot decoded-image cache
//!
//! Each image tag owns one [`ImageCache`]. The slot is populated at most
//! once per decode and cleared only by a dependency-changed notification;
//! there is no time or memory-pressure eviction, the cache lives as long
//! as the document does.
//!
//! Concurrent readers that both miss may both run the external decoder.
//! That is accepted: decoding is idempotent and the last completed store
//! wins without corrupting the slot.

use crate::decoder::Bitmap;
use crate::deps::InvalidationListener;
use parking_lot::Mutex;
use std::sync::Arc;

/// Memoized decode result for one image tag instance.
#[derive(Default)]
pub struct ImageCache {
    slot: Mutex<Option<Arc<Bitmap>>>,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached bitmap, if any.
    pub fn get(&self) -> Option<Arc<Bitmap>> {
        self.slot.lock().clone()
    }

    /// Store a decode result. Overwrites any previous value.
    pub fn store(&self, bitmap: Arc<Bitmap>) {
        *self.slot.lock() = Some(bitmap);
    }

    /// Drop the cached value.
    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}

impl InvalidationListener for ImageCache {
    fn dependency_changed(&self) {
        self.clear();
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("populated", &self.slot.lock().is_some())
            .finish()
    }
}
