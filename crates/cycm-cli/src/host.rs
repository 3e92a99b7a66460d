//! Terminal stand-ins for the game client.
//!
//! Executed commands are the program's real output: they go to stdout, or
//! to an outbox file when one is given, one `/command` per line. Notices are
//! for the person at the terminal and go to stderr.

use crate::output::styled;
use cycm_core::{io, CommandSink, MessageSink, Notice};
use std::io::Write;
use std::path::PathBuf;

pub struct Outbox {
    path: Option<PathBuf>,
}

impl Outbox {
    pub fn new(path: Option<PathBuf>) -> Self {
        Outbox { path }
    }
}

impl CommandSink for Outbox {
    fn execute(&self, command: &str) {
        let line = format!("/{command}");
        match &self.path {
            Some(path) => {
                if let Err(e) = io::append_line(path, &line) {
                    tracing::error!(path = %path.display(), error = %e, "failed to write to outbox");
                }
            }
            None => {
                let mut out = std::io::stdout().lock();
                if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
                    tracing::error!(error = %e, "failed to write command to stdout");
                }
            }
        }
    }
}

pub struct Terminal;

impl MessageSink for Terminal {
    fn show(&self, notice: Notice) {
        eprintln!("{}", styled(&notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn outbox_appends_prefixed_commands() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("outbox.txt");
        let outbox = Outbox::new(Some(path.clone()));
        outbox.execute("time set day");
        outbox.execute("weather clear");
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "/time set day\n/weather clear\n"
        );
    }
}
