use crate::error::Result;
use std::borrow::Cow;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// A failed write leaves the previous contents in place.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Atomically replace `path` with `lines`, one per line.
pub fn write_lines<S: AsRef<str>>(path: &Path, lines: &[S]) -> Result<()> {
    let mut data = String::new();
    for line in lines {
        data.push_str(line.as_ref());
        data.push('\n');
    }
    atomic_write(path, data.as_bytes())
}

/// Create `path` (and its parent directories) as an empty file if it does not
/// exist. Returns true if the file was created.
pub fn ensure_file(path: &Path) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    tracing::info!(path = %path.display(), "created file");
    Ok(true)
}

/// Read all lines of `path`. A trailing newline does not produce an empty
/// final line. Bytes that are not valid UTF-8 become U+FFFD.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    let bytes = std::fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    if matches!(content, Cow::Owned(_)) {
        tracing::warn!(path = %path.display(), "invalid UTF-8 replaced");
    }
    Ok(content.lines().map(str::to_owned).collect())
}

/// Append `line` plus a newline to `path`, creating the file if needed.
pub fn append_line(path: &Path, line: &str) -> Result<()> {
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    writeln!(f, "{line}")?;
    Ok(())
}

/// First line that is neither blank nor a `#` comment, trimmed.
pub fn first_meaningful_line(lines: &[String]) -> Option<&str> {
    lines
        .iter()
        .map(|l| l.trim())
        .find(|l| !l.is_empty() && !l.starts_with('#'))
}
