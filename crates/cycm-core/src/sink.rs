//! Seams to the host: where commands go to run and where notices are shown.

use crate::notice::Notice;
use std::sync::{Arc, Mutex};

/// Runs a fully resolved command (no modifiers, no chaining) in the host.
pub trait CommandSink: Send + Sync {
    fn execute(&self, command: &str);
}

/// Shows a notice to the user.
pub trait MessageSink: Send + Sync {
    fn show(&self, notice: Notice);
}

impl<F> CommandSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn execute(&self, command: &str) {
        self(command)
    }
}

impl<F> MessageSink for F
where
    F: Fn(Notice) + Send + Sync,
{
    fn show(&self, notice: Notice) {
        self(notice)
    }
}

/// One event observed by a [`Recorder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recorded {
    Executed(String),
    Shown(Notice),
}

/// Sink that keeps everything it receives, in order. Useful for hosts that
/// replay output later and for tests.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    events: Arc<Mutex<Vec<Recorded>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<Recorded> {
        self.events
            .lock()
            .map(|e| e.clone())
            .unwrap_or_default()
    }

    pub fn executed(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Executed(c) => Some(c),
                Recorded::Shown(_) => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                Recorded::Shown(n) => Some(n),
                Recorded::Executed(_) => None,
            })
            .collect()
    }

    fn push(&self, event: Recorded) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

impl CommandSink for Recorder {
    fn execute(&self, command: &str) {
        self.push(Recorded::Executed(command.to_string()));
    }
}

impl MessageSink for Recorder {
    fn show(&self, notice: Notice) {
        self.push(Recorded::Shown(notice));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recorder_keeps_order() {
        let rec = Recorder::new();
        rec.show(Notice::info("a"));
        rec.execute("time set day");
        rec.show(Notice::info("b"));
        assert_eq!(rec.executed(), vec!["time set day"]);
        assert_eq!(rec.notices().len(), 2);
        assert!(matches!(rec.events()[1], Recorded::Executed(_)));
    }

    #[test]
    fn closures_are_sinks() {
        let rec = Recorder::new();
        let inner = rec.clone();
        let sink = move |c: &str| inner.execute(&format!("wrapped {c}"));
        CommandSink::execute(&sink, "x");
        assert_eq!(rec.executed(), vec!["wrapped x"]);
    }
}
