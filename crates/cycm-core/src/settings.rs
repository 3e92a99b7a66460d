use crate::error::{CycmError, Result};
use crate::io;
use std::path::Path;

pub const DEFAULT_MAX_REPEATS: u32 = 20;
pub const DEFAULT_MAX_DELAY_SECS: u32 = 5;

/// Upper bounds for the `+N D` modifier, persisted as `N:D`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepeatSettings {
    pub max_repeats: u32,
    pub max_delay_secs: u32,
}

impl Default for RepeatSettings {
    fn default() -> Self {
        Self {
            max_repeats: DEFAULT_MAX_REPEATS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

impl RepeatSettings {
    /// Load from `path`, creating it with the defaults when missing.
    ///
    /// A line with the wrong shape is replaced by the defaults on disk; a
    /// line with the right shape but non-numeric values is kept on disk and
    /// the defaults are used.
    pub fn load(path: &Path) -> Result<Self> {
        io::ensure_file(path)?;
        let lines = io::read_lines(path)?;
        let Some(line) = io::first_meaningful_line(&lines) else {
            let settings = Self::default();
            settings.save(path)?;
            return Ok(settings);
        };

        let parts: Vec<&str> = line.split(':').collect();
        if parts.len() != 2 {
            let settings = Self::default();
            settings.save(path)?;
            return Ok(settings);
        }

        match (parts[0].trim().parse(), parts[1].trim().parse()) {
            (Ok(max_repeats), Ok(max_delay_secs)) => Ok(Self {
                max_repeats,
                max_delay_secs,
            }),
            _ => {
                tracing::error!(line, "invalid repeat settings, using defaults");
                Ok(Self::default())
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        io::write_lines(path, &[self.to_line()])
    }

    pub fn to_line(&self) -> String {
        format!("{}:{}", self.max_repeats, self.max_delay_secs)
    }

    /// Set the repeat ceiling. Must be positive.
    pub fn set_max_repeats(&mut self, value: i64, path: &Path) -> Result<()> {
        if value <= 0 {
            return Err(CycmError::InvalidLimit(
                "the number of repeats must be positive".into(),
            ));
        }
        let value = u32::try_from(value)
            .map_err(|_| CycmError::InvalidLimit(format!("{value} is too large")))?;
        let next = Self {
            max_repeats: value,
            ..*self
        };
        next.save(path)?;
        *self = next;
        Ok(())
    }

    /// Set the delay ceiling in seconds. Must not be negative.
    pub fn set_max_delay_secs(&mut self, value: i64, path: &Path) -> Result<()> {
        if value < 0 {
            return Err(CycmError::InvalidLimit(
                "the delay cannot be negative".into(),
            ));
        }
        let value = u32::try_from(value)
            .map_err(|_| CycmError::InvalidLimit(format!("{value} is too large")))?;
        let next = Self {
            max_delay_secs: value,
            ..*self
        };
        next.save(path)?;
        *self = next;
        Ok(())
    }
}
