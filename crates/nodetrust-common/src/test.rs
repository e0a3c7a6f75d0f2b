//! Helpers shared by tests across the workspace.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Create a fresh, empty scratch directory unique to this process and call.
pub fn scratch_dir(prefix: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);

    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "nodetrust-{}-{}-{}",
        prefix,
        std::process::id(),
        n
    ));
    let _ = std::fs::remove_dir_all(&dir);
    let _ = std::fs::create_dir_all(&dir);
    dir
}
