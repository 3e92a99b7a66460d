//! Record → chain → modifier → block list → scheduler.

use crate::blocklist::BlockList;
use crate::chain::{self, COMMAND_PREFIX};
use crate::error::{CycmError, Result};
use crate::line::LineParser;
use crate::modifier::CommandModifier;
use crate::notice::Notice;
use crate::scheduler::{ExecutionSink, RunHandle, ScheduledExecution, Scheduler};
use crate::settings::RepeatSettings;
use crate::sink::{CommandSink, MessageSink};
use std::sync::{Arc, RwLock};

/// Who asked for a command to run. Decides the notice shown at each fire and
/// whether cycm's own commands bypass the block list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Origin {
    /// A record from a queue file or a reply from the AI.
    Actor(String),
    /// The local console (`cycm execute`, `ce`).
    Console,
}

impl Origin {
    fn announce(&self, execution: &ScheduledExecution) -> String {
        let mut text = match self {
            Origin::Actor(actor) => {
                format!("{actor} executed command {COMMAND_PREFIX}{}", execution.command)
            }
            Origin::Console => format!("Executing command {COMMAND_PREFIX}{}", execution.command),
        };
        if execution.total_count > 1 {
            text.push_str(&format!(
                " ({}/{})",
                execution.sequence_index, execution.total_count
            ));
        }
        text
    }
}

/// Turns records and console input into scheduled executions.
pub struct Pipeline {
    parser: LineParser,
    blocklist: Arc<RwLock<BlockList>>,
    settings: Arc<RwLock<RepeatSettings>>,
    scheduler: Scheduler,
    commands: Arc<dyn CommandSink>,
    messages: Arc<dyn MessageSink>,
}

impl Pipeline {
    pub fn new(
        blocklist: Arc<RwLock<BlockList>>,
        settings: Arc<RwLock<RepeatSettings>>,
        scheduler: Scheduler,
        commands: Arc<dyn CommandSink>,
        messages: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            parser: LineParser::default(),
            blocklist,
            settings,
            scheduler,
            commands,
            messages,
        }
    }

    pub fn with_parser(mut self, parser: LineParser) -> Self {
        self.parser = parser;
        self
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Handle one record from the command queue. Every problem is reported
    /// as a notice; a failing link of a chain does not stop the others.
    pub fn process_command_line(&self, raw: &str) {
        let parsed = match self.parser.parse(raw) {
            Ok(p) => p,
            Err(e) => return self.report(&e),
        };
        self.run_payload(&parsed.actor, &parsed.payload);
    }

    /// Handle one record from the chat queue by showing it as `<actor> text`.
    pub fn process_chat_line(&self, raw: &str) {
        match self.parser.parse(raw) {
            Ok(p) => self
                .messages
                .show(Notice::plain(format!("<{}> {}", p.actor, p.payload))),
            Err(e) => self.report(&e),
        }
    }

    /// Run a `/cmd && cmd` payload on behalf of `actor`.
    pub fn run_payload(&self, actor: &str, payload: &str) {
        let commands = match chain::expand(payload) {
            Ok(c) => c,
            Err(e) => return self.report(&e),
        };
        for command in commands {
            if let Err(e) = self.schedule(Origin::Actor(actor.to_string()), &command) {
                tracing::debug!(actor, command = %command, error = %e, "sub-command rejected");
                self.report(&e);
            }
        }
    }

    /// Run a command without its prefix on behalf of `actor`; `&&` chains
    /// are honoured.
    pub fn dispatch(&self, actor: &str, command: &str) {
        let command = command.trim().trim_start_matches(COMMAND_PREFIX);
        self.run_payload(actor, &format!("{COMMAND_PREFIX}{command}"));
    }

    /// Run a single console command. cycm's own commands skip the block
    /// list on this path only.
    pub fn execute_direct(&self, command: &str) -> Result<RunHandle> {
        let command = command.trim().trim_start_matches(COMMAND_PREFIX);
        self.schedule(Origin::Console, command)
    }

    /// Parse the modifier, check the block list and schedule the runs.
    pub fn schedule(&self, origin: Origin, command: &str) -> Result<RunHandle> {
        let limits = *self.settings.read().unwrap_or_else(|e| e.into_inner());
        let modifier = CommandModifier::parse(command, &limits)?;
        if modifier.base.is_empty() {
            return Err(CycmError::MalformedRecord(command.to_string()));
        }

        let base = chain::base_token(&modifier.base);
        let blocked = self
            .blocklist
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_blocked(&base);
        let exempt = origin == Origin::Console && BlockList::is_protected(&base);
        if blocked && !exempt {
            return Err(CycmError::CommandBlocked(base));
        }

        let sink = Arc::new(FireSink {
            origin,
            commands: Arc::clone(&self.commands),
            messages: Arc::clone(&self.messages),
        });
        Ok(self
            .scheduler
            .run(&modifier.base, modifier.repeats, modifier.delay(), sink))
    }

    fn report(&self, err: &CycmError) {
        self.messages.show(Notice::from(err));
    }
}

/// Announces and executes each fired repetition.
struct FireSink {
    origin: Origin,
    commands: Arc<dyn CommandSink>,
    messages: Arc<dyn MessageSink>,
}

impl ExecutionSink for FireSink {
    fn fire(&self, execution: &ScheduledExecution) {
        self.messages.show(Notice::plain(self.origin.announce(execution)));
        self.commands.execute(&execution.command);
    }
}
