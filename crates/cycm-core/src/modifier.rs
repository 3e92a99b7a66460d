use crate::error::{CycmError, Result};
use crate::settings::RepeatSettings;
use regex::Regex;
use std::sync::OnceLock;
use std::time::Duration;

static MODIFIER_RE: OnceLock<Regex> = OnceLock::new();

fn modifier_re() -> &'static Regex {
    MODIFIER_RE.get_or_init(|| Regex::new(r"^(.*?)\s*\+(\d+)(?:\s+(\d+))?$").unwrap())
}

/// A command with its trailing `+N [D]` modifier resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandModifier {
    pub base: String,
    pub repeats: u32,
    /// Delay between repetitions, in seconds as written in the record.
    pub delay_secs: u32,
}

impl CommandModifier {
    /// Parse the trailing modifier off `command`, validating it against the
    /// configured limits.
    ///
    /// `"foo +3 1"` runs `foo` three times one second apart; `"foo"` runs it
    /// once. A repeat count of zero is rejected.
    pub fn parse(command: &str, limits: &RepeatSettings) -> Result<Self> {
        let Some(caps) = modifier_re().captures(command) else {
            return Ok(Self {
                base: command.trim().to_string(),
                repeats: 1,
                delay_secs: 0,
            });
        };

        let base = caps.get(1).map_or("", |m| m.as_str()).trim().to_string();

        let repeats_text = caps.get(2).map_or("", |m| m.as_str());
        let requested: u64 = repeats_text
            .parse()
            .map_err(|_| CycmError::InvalidRepeatCount(command.to_string()))?;
        if requested == 0 {
            return Err(CycmError::InvalidRepeatCount(command.to_string()));
        }
        if requested > u64::from(limits.max_repeats) {
            return Err(CycmError::RepeatCountExceeded {
                requested,
                max: limits.max_repeats,
            });
        }

        let mut delay_secs = 0;
        if let Some(delay) = caps.get(3) {
            let requested: u64 = delay
                .as_str()
                .parse()
                .map_err(|_| CycmError::InvalidDelay(command.to_string()))?;
            if requested > u64::from(limits.max_delay_secs) {
                return Err(CycmError::DelayExceeded {
                    requested,
                    max: limits.max_delay_secs,
                });
            }
            delay_secs = requested as u32;
        }

        Ok(Self {
            base,
            repeats: requested as u32,
            delay_secs,
        })
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(u64::from(self.delay_secs))
    }
}
