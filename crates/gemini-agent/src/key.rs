use std::path::{Path, PathBuf};

use cycm_core::io;

use crate::Result;

/// Environment variable consulted when the key file holds no key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Reads the Gemini API key from `gemini_api_key.txt`.
///
/// The first line that is neither blank nor a `#` comment is the key. The
/// file is created empty on first use so users know where to put it.
pub struct ApiKeyStore {
    path: PathBuf,
}

impl ApiKeyStore {
    pub fn new(path: &Path) -> Self {
        ApiKeyStore {
            path: path.to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Key from the file, else from [`API_KEY_ENV`].
    pub fn load(&self) -> Result<Option<String>> {
        let from_file = self.load_file()?;
        Ok(resolve(from_file, std::env::var(API_KEY_ENV).ok()))
    }

    fn load_file(&self) -> Result<Option<String>> {
        if io::ensure_file(&self.path)? {
            return Ok(None);
        }
        let lines = io::read_lines(&self.path)?;
        Ok(io::first_meaningful_line(&lines).map(str::to_owned))
    }
}

fn resolve(from_file: Option<String>, from_env: Option<String>) -> Option<String> {
    from_file.or_else(|| from_env.map(|k| k.trim().to_owned()).filter(|k| !k.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_created_empty() {
        let dir = TempDir::new().unwrap();
        let store = ApiKeyStore::new(&dir.path().join("gemini_api_key.txt"));
        assert_eq!(store.load_file().unwrap(), None);
        assert!(store.path().exists());
    }

    #[test]
    fn first_meaningful_line_is_the_key() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gemini_api_key.txt");
        std::fs::write(&path, "# paste your key below\n\n  AIza-test-key  \nignored\n").unwrap();
        let store = ApiKeyStore::new(&path);
        assert_eq!(store.load_file().unwrap(), Some("AIza-test-key".into()));
        assert_eq!(store.load().unwrap(), Some("AIza-test-key".into()));
    }

    #[test]
    fn file_wins_over_env() {
        assert_eq!(
            resolve(Some("file".into()), Some("env".into())),
            Some("file".into())
        );
        assert_eq!(resolve(None, Some(" env ".into())), Some("env".into()));
        assert_eq!(resolve(None, Some("   ".into())), None);
        assert_eq!(resolve(None, None), None);
    }
}
