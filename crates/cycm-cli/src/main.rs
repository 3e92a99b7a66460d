mod cmd;
mod host;
mod output;
mod root;
mod runtime;
mod shell;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "cycm",
    about = "Relay queued commands and chat into a game session, with an AI helper",
    version,
    propagate_version = true
)]
struct Cli {
    /// cycm directory (default: ~/.cycm)
    #[arg(long, global = true, env = "CYCM_ROOT")]
    root: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a session: poll the queue files and read console commands from stdin
    Run {
        /// Append executed commands to this file instead of printing them
        #[arg(long)]
        outbox: Option<PathBuf>,

        /// Shut down after stdin closes
        #[arg(long)]
        exit_on_eof: bool,
    },

    /// Block a command
    Block {
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// Unblock a command, or `all` to restore the defaults
    Unblock {
        #[arg(required = true, num_args = 1..)]
        command: Vec<String>,
    },

    /// List blocked commands
    Blocklist,

    /// Enable cycm
    On,

    /// Disable cycm
    Off,

    /// Regenerate blocked_commands.txt or repeating_settings.txt
    Resetfile { name: String },

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

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    // stdout carries executed commands, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let root = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Run {
            outbox,
            exit_on_eof,
        } => cmd::run::run(&root, outbox, exit_on_eof),
        Commands::Block { command } => cmd::blocklist::block(&root, &command, cli.json),
        Commands::Unblock { command } => cmd::blocklist::unblock(&root, &command, cli.json),
        Commands::Blocklist => cmd::blocklist::list(&root, cli.json),
        Commands::On => cmd::toggle::run(&root, true, cli.json),
        Commands::Off => cmd::toggle::run(&root, false, cli.json),
        Commands::Resetfile { name } => cmd::resetfile::run(&root, &name, cli.json),
        Commands::Num { value } => cmd::limits::num(&root, value, cli.json),
        Commands::Delay { value } => cmd::limits::delay(&root, value, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_flag_is_not_part_of_the_command() {
        let cli = Cli::try_parse_from(["cycm", "unblock", "summon", "--json"]).unwrap();
        assert!(cli.json);
        let Commands::Unblock { command } = cli.command else {
            panic!("expected unblock")
        };
        assert_eq!(command, vec!["summon"]);

        let cli = Cli::try_parse_from(["cycm", "block", "/summon", "minecraft:pig", "-j"]).unwrap();
        assert!(cli.json);
        let Commands::Block { command } = cli.command else {
            panic!("expected block")
        };
        assert_eq!(command, vec!["/summon", "minecraft:pig"]);
    }
}
