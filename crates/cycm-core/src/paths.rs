use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// File name constants (all relative to the cycm root directory)
// ---------------------------------------------------------------------------

pub const COMMANDS_FILE: &str = "commands_list.txt";
pub const CHAT_FILE: &str = "chat.txt";
pub const COMMANDS_LOG_FILE: &str = "commands_log.txt";
pub const CHAT_LOG_FILE: &str = "chat_log.txt";
pub const BLOCKED_FILE: &str = "blocked_commands.txt";
pub const REPEATING_FILE: &str = "repeating_settings.txt";
pub const CONFIG_FILE: &str = "config.yaml";
pub const API_KEY_FILE: &str = "gemini_api_key.txt";

/// Default root directory name under the user's home.
pub const DEFAULT_ROOT_DIR: &str = ".cycm";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn commands_path(root: &Path) -> PathBuf {
    root.join(COMMANDS_FILE)
}

pub fn chat_path(root: &Path) -> PathBuf {
    root.join(CHAT_FILE)
}

pub fn commands_log_path(root: &Path) -> PathBuf {
    root.join(COMMANDS_LOG_FILE)
}

pub fn chat_log_path(root: &Path) -> PathBuf {
    root.join(CHAT_LOG_FILE)
}

pub fn blocked_path(root: &Path) -> PathBuf {
    root.join(BLOCKED_FILE)
}

pub fn repeating_path(root: &Path) -> PathBuf {
    root.join(REPEATING_FILE)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn api_key_path(root: &Path) -> PathBuf {
    root.join(API_KEY_FILE)
}

// ---------------------------------------------------------------------------
// Resettable files
// ---------------------------------------------------------------------------

/// Settings files that `resetfile` may regenerate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResettableFile {
    BlockedCommands,
    RepeatingSettings,
}

impl ResettableFile {
    pub const ALL: [ResettableFile; 2] = [Self::BlockedCommands, Self::RepeatingSettings];

    /// Case-insensitive lookup by file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.file_name().eq_ignore_ascii_case(name.trim()))
    }

    pub fn file_name(self) -> &'static str {
        match self {
            Self::BlockedCommands => BLOCKED_FILE,
            Self::RepeatingSettings => REPEATING_FILE,
        }
    }

    pub fn path(self, root: &Path) -> PathBuf {
        root.join(self.file_name())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_helpers() {
        let root = Path::new("/tmp/cycm");
        assert_eq!(
            commands_path(root),
            PathBuf::from("/tmp/cycm/commands_list.txt")
        );
        assert_eq!(chat_log_path(root), PathBuf::from("/tmp/cycm/chat_log.txt"));
        assert_eq!(config_path(root), PathBuf::from("/tmp/cycm/config.yaml"));
    }

    #[test]
    fn resettable_lookup_ignores_case() {
        assert_eq!(
            ResettableFile::from_name("Blocked_Commands.TXT"),
            Some(ResettableFile::BlockedCommands)
        );
        assert_eq!(
            ResettableFile::from_name("repeating_settings.txt"),
            Some(ResettableFile::RepeatingSettings)
        );
        assert_eq!(ResettableFile::from_name("config.yaml"), None);
    }
}
