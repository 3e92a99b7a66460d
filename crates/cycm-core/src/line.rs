use crate::error::{CycmError, Result};
use serde::{Deserialize, Serialize};

/// Separator between the actor and the payload in source records.
pub const RECORD_SEPARATOR: char = ':';

/// Which occurrence of the separator ends the actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitAt {
    /// Actors are plain `[A-Za-z0-9_]+` names; payloads may contain the
    /// separator.
    #[default]
    First,
    /// Payloads never contain the separator; actors may contain anything.
    Last,
}

/// A record split into who sent it and what they sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLine {
    pub actor: String,
    pub payload: String,
}

/// Splits raw `actor<sep>payload` records.
#[derive(Debug, Clone, Copy)]
pub struct LineParser {
    separator: char,
    split: SplitAt,
}

impl Default for LineParser {
    fn default() -> Self {
        Self::new(RECORD_SEPARATOR, SplitAt::default())
    }
}

impl LineParser {
    pub fn new(separator: char, split: SplitAt) -> Self {
        Self { separator, split }
    }

    /// Split `raw` at the configured separator occurrence.
    ///
    /// Both halves are trimmed. Fails with `MalformedRecord` when the
    /// separator is missing, is the final character, or either half is empty
    /// after trimming. With [`SplitAt::First`] the actor must also be a plain
    /// name of ASCII letters, digits and `_`.
    pub fn parse(&self, raw: &str) -> Result<ParsedLine> {
        let idx = match self.split {
            SplitAt::First => raw.find(self.separator),
            SplitAt::Last => raw.rfind(self.separator),
        };
        let Some(idx) = idx else {
            return Err(CycmError::MalformedRecord(raw.to_string()));
        };
        let after = idx + self.separator.len_utf8();
        if after >= raw.len() {
            return Err(CycmError::MalformedRecord(raw.to_string()));
        }

        let actor = raw[..idx].trim();
        let payload = raw[after..].trim();
        if actor.is_empty() || payload.is_empty() {
            return Err(CycmError::MalformedRecord(raw.to_string()));
        }
        if self.split == SplitAt::First && !is_plain_name(actor) {
            return Err(CycmError::MalformedRecord(raw.to_string()));
        }
        Ok(ParsedLine {
            actor: actor.to_string(),
            payload: payload.to_string(),
        })
    }
}

fn is_plain_name(actor: &str) -> bool {
    actor.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first() -> LineParser {
        LineParser::default()
    }

    fn last() -> LineParser {
        LineParser::new(':', SplitAt::Last)
    }

    #[test]
    fn splits_actor_and_payload() {
        let p = first().parse("Alice:/time set day").unwrap();
        assert_eq!(p.actor, "Alice");
        assert_eq!(p.payload, "/time set day");
    }

    #[test]
    fn first_split_keeps_separators_in_payload() {
        let p = first()
            .parse("Alice:/summon minecraft:chicken +2 1")
            .unwrap();
        assert_eq!(p.actor, "Alice");
        assert_eq!(p.payload, "/summon minecraft:chicken +2 1");
    }

    #[test]
    fn last_split_keeps_separators_in_actor() {
        let p = last().parse("Alice:/summon minecraft:chicken").unwrap();
        assert_eq!(p.actor, "Alice:/summon minecraft");
        assert_eq!(p.payload, "chicken");
    }

    #[test]
    fn trims_both_halves() {
        let p = first().parse("  Bob_99 :  hello there  ").unwrap();
        assert_eq!(p.actor, "Bob_99");
        assert_eq!(p.payload, "hello there");
    }

    #[test]
    fn rejects_missing_or_trailing_separator() {
        for raw in ["no separator here", "Alice:", "Alice:   ", ":payload", "   :x"] {
            assert!(
                matches!(first().parse(raw), Err(CycmError::MalformedRecord(_))),
                "expected malformed: {raw:?}"
            );
        }
        assert!(last().parse("Alice:/x:").is_err());
    }

    #[test]
    fn first_split_requires_plain_actor_names() {
        for raw in ["Alice Bob:/time set day", "Al-ice:/say hi", "Zoë:hello"] {
            assert!(
                matches!(first().parse(raw), Err(CycmError::MalformedRecord(_))),
                "expected malformed: {raw:?}"
            );
        }
        let p = last().parse("Alice Bob:/time set day").unwrap();
        assert_eq!(p.actor, "Alice Bob");
    }

    #[test]
    fn round_trips_when_payload_has_no_separator() {
        for raw in ["Alice:/time set day", "bob:hi all", "X_1:/give @p diamond 3"] {
            let p = first().parse(raw).unwrap();
            assert_eq!(format!("{}:{}", p.actor, p.payload), raw);
            let q = last().parse(raw).unwrap();
            assert_eq!(p, q);
        }
    }
}
