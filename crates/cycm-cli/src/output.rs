use console::style;
use cycm_core::{Notice, Tone};
use serde::Serialize;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Colour a notice by tone: red errors, green successes, aqua info, yellow
/// warnings, gold for everything else.
pub fn styled(notice: &Notice) -> String {
    let text = notice.text.as_str();
    match notice.tone {
        Tone::Error => style(text).red().to_string(),
        Tone::Success => style(text).green().to_string(),
        Tone::Info => style(text).cyan().to_string(),
        Tone::Warning => style(text).yellow().to_string(),
        Tone::Plain => style(text).color256(214).to_string(),
    }
}

/// Print a notice from a one-shot command, or turn an error notice into the
/// command's error.
pub fn finish(notice: Notice, json: bool) -> anyhow::Result<()> {
    if notice.tone == Tone::Error {
        anyhow::bail!("{}", notice.text);
    }
    if json {
        print_json(&notice)
    } else {
        println!("{}", styled(&notice));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn styled_keeps_text() {
        console::set_colors_enabled(false);
        assert_eq!(styled(&Notice::error("boom")), "boom");
        assert_eq!(styled(&Notice::plain("<Bob> hi")), "<Bob> hi");
    }

    #[test]
    fn finish_fails_on_error_tone() {
        let err = finish(Notice::error("command /op is blocked"), false).unwrap_err();
        assert_eq!(err.to_string(), "command /op is blocked");
        assert!(finish(Notice::warning("/kill is already blocked"), false).is_ok());
    }
}
