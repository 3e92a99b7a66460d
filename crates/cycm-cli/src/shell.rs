use crate::runtime::Runtime;
use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use cycm_core::Notice;

/// One line typed at the console. The first word names the command; a
/// leading `/` is optional.
#[derive(Debug, Parser)]
#[command(multicall = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Debug, Subcommand)]
pub enum ShellCommand {
    /// Manage cycm
    Cycm {
        #[command(subcommand)]
        action: Option<CycmAction>,
    },

    /// Execute a command (same as `cycm execute`)
    Ce {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },

    /// Show blocked commands
    Blocklist,

    /// Ask the AI
    Ai {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        prompt: Vec<String>,
    },

    /// Stop the running AI request
    Stopai,

    /// Report the output of the last executed command to the AI
    Output {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        text: Vec<String>,
    },
}

#[derive(Debug, Subcommand)]
pub enum CycmAction {
    /// Block a command
    Block {
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Unblock a command, or `all` to reset
    Unblock {
        #[arg(required = true, trailing_var_arg = true)]
        command: Vec<String>,
    },
    /// Enable cycm
    On,
    /// Disable cycm
    Off,
    /// Reload every file and restart the queues
    Restart,
    /// Regenerate blocked_commands.txt or repeating_settings.txt
    Resetfile { name: String },
    /// Execute a command, optionally with `+N [D]`
    Execute {
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        command: Vec<String>,
    },
    /// Set the maximum number of repeats
    Num {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Set the maximum delay between repeats, in seconds
    Delay {
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
}

const USAGE: &str = "Usage: cycm <block|unblock|on|off|restart|resetfile|execute|num|delay>";

/// Split a console line into words for clap.
pub fn parse(line: &str) -> Result<Option<ShellLine>, clap::Error> {
    let words: Vec<&str> = line
        .trim()
        .trim_start_matches('/')
        .split_whitespace()
        .collect();
    if words.is_empty() {
        return Ok(None);
    }
    ShellLine::try_parse_from(words).map(Some)
}

/// Run one console line against `runtime`, showing the resulting notice.
pub fn execute(runtime: &mut Runtime, line: &str) {
    match parse(line) {
        Ok(None) => {}
        Ok(Some(parsed)) => {
            if let Some(notice) = dispatch(runtime, parsed.command) {
                runtime.show(notice);
            }
        }
        Err(e) => runtime.show(clap_notice(&e)),
    }
}

fn dispatch(runtime: &mut Runtime, command: ShellCommand) -> Option<Notice> {
    match command {
        ShellCommand::Cycm { action: None } => Some(Notice::info(USAGE)),
        ShellCommand::Cycm {
            action: Some(action),
        } => dispatch_cycm(runtime, action),
        ShellCommand::Ce { command } => runtime.execute(&command.join(" ")),
        ShellCommand::Blocklist => Some(runtime.blocklist()),
        ShellCommand::Ai { prompt } => runtime.ai(&prompt.join(" ")),
        ShellCommand::Stopai => Some(runtime.stop_ai()),
        ShellCommand::Output { text } => Some(runtime.record_command_output(&text.join(" "))),
    }
}

fn dispatch_cycm(runtime: &mut Runtime, action: CycmAction) -> Option<Notice> {
    let notice = match action {
        CycmAction::Block { command } => runtime.block(&command.join(" ")),
        CycmAction::Unblock { command } => runtime.unblock(&command.join(" ")),
        CycmAction::On => runtime.set_enabled(true),
        CycmAction::Off => runtime.set_enabled(false),
        CycmAction::Restart => runtime.restart(),
        CycmAction::Resetfile { name } => runtime.reset_file(&name),
        CycmAction::Execute { command } => return runtime.execute(&command.join(" ")),
        CycmAction::Num { value } => runtime.set_max_repeats(value),
        CycmAction::Delay { value } => runtime.set_max_delay(value),
    };
    Some(notice)
}

fn clap_notice(e: &clap::Error) -> Notice {
    let text = e.render().to_string();
    match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Notice::info(text.trim_end()),
        _ => Notice::error(text.trim_end()),
    }
}
