use crate::chain::{self, COMMAND_PREFIX};
use crate::error::{CycmError, Result};
use crate::io;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Commands owned by cycm itself. Always present, never blockable.
pub const PROTECTED: [&str; 3] = ["cycm", "ai", "stopai"];

/// Commands blocked on every load.
pub const DEFAULT_BLOCKED: [&str; 10] = [
    "op", "clear", "deop", "kill", "execute", "ban", "reload", "kick", "stop", "particle",
];

/// The persisted set of command tokens that may not be executed.
#[derive(Debug, Clone)]
pub struct BlockList {
    path: PathBuf,
    entries: BTreeSet<String>,
}

impl BlockList {
    /// Load the list from `path`, creating the file if needed.
    ///
    /// Default and protected commands are merged in; the file is rewritten
    /// only when that merge added something.
    pub fn load(path: &Path) -> Result<Self> {
        io::ensure_file(path)?;
        let mut entries: BTreeSet<String> = io::read_lines(path)?
            .iter()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
            .map(chain::base_token)
            .filter(|t| !t.is_empty())
            .collect();

        let before = entries.len();
        entries.extend(baseline());
        let list = Self {
            path: path.to_path_buf(),
            entries,
        };
        if list.entries.len() != before {
            list.persist(&list.entries)?;
        }
        tracing::debug!(path = %path.display(), count = list.entries.len(), "block list loaded");
        Ok(list)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True when the base token of `command` is in the list.
    pub fn is_blocked(&self, command: &str) -> bool {
        self.entries.contains(&chain::base_token(command))
    }

    /// True for cycm's own commands, whatever the list contains.
    pub fn is_protected(command: &str) -> bool {
        PROTECTED.contains(&chain::base_token(command).as_str())
    }

    pub fn block(&mut self, command: &str) -> Result<()> {
        let token = chain::base_token(command);
        if token.is_empty() {
            return Err(CycmError::MalformedRecord(command.to_string()));
        }
        if Self::is_protected(&token) {
            return Err(CycmError::ProtectedCommand(token));
        }
        if self.entries.contains(&token) {
            return Err(CycmError::AlreadyBlocked(token));
        }
        let mut next = self.entries.clone();
        next.insert(token.clone());
        self.commit(next)?;
        tracing::info!(command = %token, "command blocked");
        Ok(())
    }

    /// Remove `command` from the list. `all` resets to the defaults.
    pub fn unblock(&mut self, command: &str) -> Result<()> {
        let token = chain::base_token(command);
        if token.is_empty() {
            return Err(CycmError::MalformedRecord(command.to_string()));
        }
        if token == "all" {
            self.commit(baseline().collect())?;
            tracing::info!("block list reset to defaults");
            return Ok(());
        }
        if Self::is_protected(&token) {
            return Err(CycmError::ProtectedCommand(token));
        }
        if !self.entries.contains(&token) {
            return Err(CycmError::NotBlocked(token));
        }
        let mut next = self.entries.clone();
        next.remove(&token);
        self.commit(next)?;
        tracing::info!(command = %token, "command unblocked");
        Ok(())
    }

    /// Sorted tokens, without the prefix.
    pub fn list(&self) -> Vec<String> {
        self.entries.iter().cloned().collect()
    }

    fn commit(&mut self, next: BTreeSet<String>) -> Result<()> {
        self.persist(&next)?;
        self.entries = next;
        Ok(())
    }

    fn persist(&self, entries: &BTreeSet<String>) -> Result<()> {
        let lines: Vec<String> = entries
            .iter()
            .map(|e| format!("{COMMAND_PREFIX}{e}"))
            .collect();
        io::write_lines(&self.path, &lines)
    }
}

fn baseline() -> impl Iterator<Item = String> {
    DEFAULT_BLOCKED
        .iter()
        .chain(PROTECTED.iter())
        .map(|s| s.to_string())
}
