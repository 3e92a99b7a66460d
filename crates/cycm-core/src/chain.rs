use crate::error::{CycmError, Result};

/// Leading character every command payload carries.
pub const COMMAND_PREFIX: char = '/';

/// Literal token separating chained sub-commands.
pub const CHAIN_OPERATOR: &str = "&&";

/// Split a `/cmd && cmd && …` payload into ordered sub-commands.
///
/// The prefix is stripped from the first command only; later links are
/// taken as written. Empty links are dropped; a chain with no commands at
/// all is a `MalformedRecord`.
pub fn expand(payload: &str) -> Result<Vec<String>> {
    let trimmed = payload.trim();
    let Some(rest) = trimmed.strip_prefix(COMMAND_PREFIX) else {
        return Err(CycmError::MissingPrefix(payload.to_string()));
    };

    let commands: Vec<String> = rest
        .split(CHAIN_OPERATOR)
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .map(str::to_owned)
        .collect();

    if commands.is_empty() {
        return Err(CycmError::MalformedRecord(payload.to_string()));
    }
    Ok(commands)
}

/// Lower-cased first whitespace-delimited token of `command`, without a
/// leading prefix.
pub fn base_token(command: &str) -> String {
    command
        .trim()
        .trim_start_matches(COMMAND_PREFIX)
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expands_chain_in_order() {
        assert_eq!(expand("/a && b && c").unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn single_command() {
        assert_eq!(
            expand("/summon minecraft:chicken +2 1").unwrap(),
            vec!["summon minecraft:chicken +2 1"]
        );
    }

    #[test]
    fn missing_prefix() {
        assert!(matches!(expand("a"), Err(CycmError::MissingPrefix(_))));
        assert!(matches!(expand("a && /b"), Err(CycmError::MissingPrefix(_))));
    }

    #[test]
    fn empty_links_are_dropped() {
        assert_eq!(expand("/a &&  && b&&").unwrap(), vec!["a", "b"]);
        assert!(matches!(expand("/ && "), Err(CycmError::MalformedRecord(_))));
    }

    #[test]
    fn base_token_normalizes() {
        assert_eq!(base_token("/Summon minecraft:pig"), "summon");
        assert_eq!(base_token("  KILL @e"), "kill");
        assert_eq!(base_token(""), "");
    }
}
