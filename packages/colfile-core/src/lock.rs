//! Process-wide read/write exclusion between scans and overwrites.
//!
//! Every backend handle on the same file shares one `RwLock` keyed by
//! canonical path: scans hold a read guard, overwrites a write guard, so a
//! reader never observes a half-written file from this process. Cross-process
//! exclusion is out of scope.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock, RwLock};

static REGISTRY: OnceLock<Mutex<HashMap<PathBuf, Arc<RwLock<()>>>>> = OnceLock::new();

/// Returns the shared lock for the given path.
///
/// The path should exist (handles create their file before registering) so
/// canonicalization collapses aliases; if it fails, the raw path is the key.
pub(crate) fn file_lock(path: &Path) -> Arc<RwLock<()>> {
    let key = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    let registry = REGISTRY.get_or_init(|| Mutex::new(HashMap::new()));
    let mut map = match registry.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    map.entry(key)
        .or_insert_with(|| Arc::new(RwLock::new(())))
        .clone()
}
