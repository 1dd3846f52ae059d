//! Handle registry for live detector engines
//!
//! Maps opaque positive integer handles to detector instances. Handles are
//! allocated monotonically and never reused within a process lifetime, so a
//! stale handle held by the caller can only miss, never alias a newer
//! detector. The registry is an explicit object owned by the caller across
//! the boundary; all interior state is lock-guarded, and engines are shared
//! via `Arc` so detection runs outside the registry lock.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::ScanEngine;
use crate::error::BridgeError;
use crate::types::DetectorConfig;

/// Thread-safe table of live detector engines
pub struct DetectorRegistry {
    inner: Mutex<Inner>,
}

struct Inner {
    engines: HashMap<i32, Arc<ScanEngine>>,
    next_handle: i32,
}

impl DetectorRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                engines: HashMap::new(),
                next_handle: 1,
            }),
        }
    }

    /// Construct a detector and register it under a fresh handle.
    ///
    /// Every handle returned is positive and strictly greater than any
    /// handle returned before it.
    pub fn create(&self, config: DetectorConfig) -> Result<i32, BridgeError> {
        // Engine construction loads model files; keep it outside the lock.
        let engine = Arc::new(ScanEngine::new(config)?);

        let mut inner = self.inner.lock();
        let handle = inner.next_handle;
        inner.next_handle += 1;
        inner.engines.insert(handle, engine);

        debug!("registered detector handle {}", handle);
        Ok(handle)
    }

    /// Look up a live engine. An absent handle is not an error; callers
    /// treat `None` as "no detector" and report an empty result.
    pub fn lookup(&self, handle: i32) -> Option<Arc<ScanEngine>> {
        self.inner.lock().engines.get(&handle).cloned()
    }

    /// Drop the engine registered under `handle`. Returns false (and logs)
    /// if the handle is unknown.
    pub fn release(&self, handle: i32) -> bool {
        let removed = self.inner.lock().engines.remove(&handle).is_some();
        if removed {
            debug!("released detector handle {}", handle);
        } else {
            warn!("release of unknown detector handle {}", handle);
        }
        removed
    }

    /// Number of live engines
    pub fn len(&self) -> usize {
        self.inner.lock().engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for DetectorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[cfg(not(feature = "opencv"))]
mod tests {
    use super::*;

    fn temp_models() -> (tempfile::TempDir, DetectorConfig) {
        let dir = tempfile::tempdir().unwrap();
        let mut paths = Vec::new();
        for name in [
            "detect.prototxt",
            "detect.caffemodel",
            "sr.prototxt",
            "sr.caffemodel",
        ] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"model").unwrap();
            paths.push(path.to_str().unwrap().to_string());
        }
        let config = DetectorConfig::new(&paths[0], &paths[1], &paths[2], &paths[3]);
        (dir, config)
    }

    #[test]
    fn test_handles_are_positive_and_strictly_increasing() {
        let (_dir, config) = temp_models();
        let registry = DetectorRegistry::new();

        let mut last = 0;
        for _ in 0..5 {
            let handle = registry.create(config.clone()).unwrap();
            assert!(handle > 0);
            assert!(handle > last);
            last = handle;
        }
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_released_handles_are_not_reused() {
        let (_dir, config) = temp_models();
        let registry = DetectorRegistry::new();

        let first = registry.create(config.clone()).unwrap();
        assert!(registry.release(first));

        let second = registry.create(config).unwrap();
        assert!(second > first);
    }

    #[test]
    fn test_lookup_after_release_is_none() {
        let (_dir, config) = temp_models();
        let registry = DetectorRegistry::new();

        let handle = registry.create(config).unwrap();
        assert!(registry.lookup(handle).is_some());

        assert!(registry.release(handle));
        assert!(registry.lookup(handle).is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn test_release_unknown_handle_is_noop() {
        let registry = DetectorRegistry::new();
        assert!(!registry.release(42));
    }

    #[test]
    fn test_create_failure_allocates_no_handle() {
        let (_dir, config) = temp_models();
        let registry = DetectorRegistry::new();

        let bad = DetectorConfig::new("/nope", "/nope", "/nope", "/nope");
        assert!(registry.create(bad).is_err());

        // The failed create must not leave a gap visible to the caller,
        // only successful creations advance the handle sequence they see.
        let handle = registry.create(config).unwrap();
        assert!(handle > 0);
        assert_eq!(registry.len(), 1);
    }
}
