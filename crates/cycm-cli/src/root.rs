use cycm_core::paths::DEFAULT_ROOT_DIR;
use std::path::{Path, PathBuf};

/// Resolve the cycm root directory.
///
/// Priority:
/// 1. `--root` flag / `CYCM_ROOT` env var (passed in as `explicit`)
/// 2. `~/.cycm`
/// 3. `./.cycm` when no home directory is known
pub fn resolve_root(explicit: Option<&Path>) -> PathBuf {
    if let Some(p) = explicit {
        return p.to_path_buf();
    }
    let base = home::home_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."));
    base.join(DEFAULT_ROOT_DIR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_root_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_root(Some(dir.path()));
        assert_eq!(result, dir.path());
    }

    #[test]
    fn default_root_is_dot_cycm() {
        let result = resolve_root(None);
        assert!(result.ends_with(DEFAULT_ROOT_DIR));
    }
}
