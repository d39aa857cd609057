//! Locating data files shipped alongside the binary.

use std::path::{Path, PathBuf};

/// Directories searched for relative resources: the executable's folder, then
/// the crate root during development.
fn search_roots() -> Vec<PathBuf> {
    let mut roots = Vec::new();
    if let Some(parent) = std::env::current_exe().ok().as_deref().and_then(Path::parent) {
        roots.push(parent.to_path_buf());
    }
    let manifest_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_root.exists() {
        roots.push(manifest_root);
    }
    roots
}

/// First existing candidate for `path` under the search roots. When none
/// exists the path under the first root is returned so error messages name a
/// real location.
pub fn resolve_resource_path(path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    let roots = search_roots();
    roots
        .iter()
        .map(|root| root.join(path))
        .find(|candidate| candidate.exists())
        .or_else(|| roots.first().map(|root| root.join(path)))
        .unwrap_or_else(|| path.to_path_buf())
}

/// Resolve a path written inside a config file: relative paths are taken
/// from the config file's own directory.
pub fn resolve_config_relative(config_file: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match config_file.parent() {
        Some(dir) => dir.join(path),
        None => path.to_path_buf(),
    }
}
