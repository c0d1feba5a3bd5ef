//! Test-only helpers for scratch files.

use std::path::PathBuf;

/// Returns a path inside a freshly created, unique scratch directory.
///
/// Each call gets its own `tempfile::tempdir()`, so concurrent tests never
/// collide the way the fixed `CARGO_MANIFEST_DIR/data/test/<name>` path this
/// replaced could. The directory is intentionally leaked (not cleaned up on
/// drop), these are throwaway files in the OS temp directory, not checked
/// into the repo, and test processes are short-lived.
pub(crate) fn scratch_path(name: &str) -> PathBuf {
    let dir = tempfile::tempdir().expect("create scratch dir").into_path();
    dir.join(name)
}

/// Returns a scratch relation base path (i.e. without `.info`/`.data`/
/// `.ovflow` suffixes) inside its own unique directory.
pub(crate) fn scratch_relation(name: &str) -> PathBuf {
    scratch_path(name)
}
