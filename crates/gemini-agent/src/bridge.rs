use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::Duration;

use cycm_core::chain::{self, COMMAND_PREFIX};
use cycm_core::{BlockList, CommandSink, MessageSink, Notice};
use tokio::task::{AbortHandle, JoinHandle};

use crate::client::Transport;
use crate::history::{Conversation, ConversationEntry, Role};
use crate::reply::AiReply;
use crate::types::{Content, GenerateRequest};
use crate::{AgentError, Result};

/// Fixed leading instruction sent before the conversation.
pub const SYSTEM_PROMPT: &str = "You are a helpful Minecraft assistant. Respond concisely. \
If the user asks you to perform an action, respond in JSON without Markdown, using the format \
{\"message\": \"your text response\", \"runCommand\": \"command to run, empty, or null\"}. \
Always start a command with a slash (/). You may use any Minecraft command, including NBT and \
selectors. Commands support a repeat suffix (+N Y: N repeats, Y seconds apart) and chaining \
with &&; for example {\"message\": \"Summoning chickens!\", \"runCommand\": \"/summon minecraft:chicken +10 1\"}. \
When the user gives you command output, use it to inform your next response. If you cannot \
fulfil a request, explain why in the message field.";

/// The model turn that acknowledges [`SYSTEM_PROMPT`].
pub const SYSTEM_ACK: &str = "Understood. I am ready to help with Minecraft commands.";

const LAST_OUTPUT_PREFIX: &str = "Output of last command: ";
const EXECUTED_PREFIX: &str = "Executed command: ";

// ─── State ────────────────────────────────────────────────────────────────

/// Whether a request is outstanding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Requesting,
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The reply was shown and recorded.
    Responded,
    TimedOut,
    /// Transport, envelope or provider error.
    Failed,
    /// A newer request or a cancel made this one stale.
    Discarded,
}

struct BridgeState {
    enabled: bool,
    api_key: Option<String>,
    history: Conversation,
    epoch: u64,
    phase: Phase,
    in_flight: Option<AbortHandle>,
}

struct Shared {
    state: Mutex<BridgeState>,
    transport: Arc<dyn Transport>,
    blocklist: Arc<RwLock<BlockList>>,
    commands: Arc<dyn CommandSink>,
    messages: Arc<dyn MessageSink>,
    timeout: Duration,
}

// ─── AiBridge ─────────────────────────────────────────────────────────────

/// Conversation with a remote model, one request at a time.
///
/// `submit` cancels whatever is in flight, records the user turn and spawns
/// the call under a timeout. Every request carries the epoch it was started
/// in; a completion whose epoch is no longer current is dropped without
/// touching history or running anything. Commands returned by the model are
/// checked against the block list and handed to the command sink without
/// their `/`.
///
/// ```rust,ignore
/// let bridge = AiBridge::builder(transport, blocklist, commands, messages)
///     .timeout(Duration::from_secs(30))
///     .history_limit(40)
///     .build();
/// bridge.set_api_key(Some(key));
/// bridge.submit("make it day", None)?;
/// ```
#[derive(Clone)]
pub struct AiBridge {
    shared: Arc<Shared>,
}

pub struct AiBridgeBuilder {
    transport: Arc<dyn Transport>,
    blocklist: Arc<RwLock<BlockList>>,
    commands: Arc<dyn CommandSink>,
    messages: Arc<dyn MessageSink>,
    timeout: Duration,
    history_limit: usize,
    enabled: bool,
}

impl AiBridgeBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn build(self) -> AiBridge {
        AiBridge {
            shared: Arc::new(Shared {
                state: Mutex::new(BridgeState {
                    enabled: self.enabled,
                    api_key: None,
                    history: Conversation::new(self.history_limit),
                    epoch: 0,
                    phase: Phase::Idle,
                    in_flight: None,
                }),
                transport: self.transport,
                blocklist: self.blocklist,
                commands: self.commands,
                messages: self.messages,
                timeout: self.timeout,
            }),
        }
    }
}

/// Side effects collected under the state lock and applied after it is
/// released.
enum Effect {
    Show(Notice),
    Run(String),
}

impl AiBridge {
    pub fn builder(
        transport: Arc<dyn Transport>,
        blocklist: Arc<RwLock<BlockList>>,
        commands: Arc<dyn CommandSink>,
        messages: Arc<dyn MessageSink>,
    ) -> AiBridgeBuilder {
        AiBridgeBuilder {
            transport,
            blocklist,
            commands,
            messages,
            timeout: Duration::from_secs(30),
            history_limit: 40,
            enabled: true,
        }
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.lock().enabled = enabled;
    }

    pub fn set_api_key(&self, key: Option<String>) {
        self.lock().api_key = key.filter(|k| !k.trim().is_empty());
    }

    pub fn has_api_key(&self) -> bool {
        self.lock().api_key.is_some()
    }

    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    pub fn history(&self) -> Vec<ConversationEntry> {
        self.lock().history.entries().cloned().collect()
    }

    /// Start a request for `prompt`, replacing any request in flight.
    ///
    /// `last_output`, when present, is recorded as a user turn before the
    /// prompt. The returned handle resolves to the request's [`Outcome`]; it
    /// is aborted if a later `submit` or `cancel` supersedes it.
    pub fn submit(&self, prompt: &str, last_output: Option<&str>) -> Result<JoinHandle<Outcome>> {
        let mut state = self.lock();
        if !state.enabled {
            return Err(AgentError::ModDisabled);
        }
        let Some(api_key) = state.api_key.clone() else {
            return Err(AgentError::NoApiKey);
        };

        if let Some(previous) = state.in_flight.take() {
            previous.abort();
            tracing::debug!(epoch = state.epoch, "previous AI request cancelled");
        }
        state.epoch += 1;
        let epoch = state.epoch;

        if let Some(output) = last_output.map(str::trim).filter(|o| !o.is_empty()) {
            state
                .history
                .push(Role::User, format!("{LAST_OUTPUT_PREFIX}{output}"));
        }
        state.history.push(Role::User, prompt.trim());
        let request = GenerateRequest {
            contents: state.history.to_contents(&preamble()),
        };
        state.phase = Phase::Requesting;

        let shared = Arc::clone(&self.shared);
        let handle = tokio::spawn(async move {
            let result = tokio::time::timeout(
                shared.timeout,
                shared.transport.generate(&api_key, &request),
            )
            .await;
            let reply = match result {
                Ok(reply) => reply,
                Err(_) => Err(AgentError::GenerationTimeout(shared.timeout.as_secs())),
            };
            shared.complete(epoch, reply)
        });
        state.in_flight = Some(handle.abort_handle());
        drop(state);

        tracing::info!(epoch, "AI request started");
        self.shared
            .messages
            .show(Notice::info("Generating AI response..."));
        Ok(handle)
    }

    /// Abandon the request in flight, if any. Returns whether there was one.
    pub fn cancel(&self) -> bool {
        let mut state = self.lock();
        state.epoch += 1;
        state.phase = Phase::Idle;
        match state.in_flight.take() {
            Some(handle) => {
                handle.abort();
                tracing::info!(epoch = state.epoch, "AI request cancelled");
                true
            }
            None => false,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.shared.lock()
    }
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, BridgeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn complete(&self, epoch: u64, reply: Result<String>) -> Outcome {
        let mut effects = Vec::new();
        let outcome = {
            let mut state = self.lock();
            if state.epoch != epoch {
                tracing::debug!(epoch, current = state.epoch, "stale AI completion discarded");
                return Outcome::Discarded;
            }
            state.in_flight = None;
            state.phase = Phase::Idle;

            match reply {
                Ok(text) => {
                    self.handle_reply(&mut state.history, &text, &mut effects);
                    Outcome::Responded
                }
                Err(e) => {
                    tracing::warn!(error = %e, "AI request failed");
                    effects.push(Effect::Show(Notice::error(e.to_string())));
                    if matches!(e, AgentError::GenerationTimeout(_)) {
                        Outcome::TimedOut
                    } else {
                        Outcome::Failed
                    }
                }
            }
        };

        for effect in effects {
            match effect {
                Effect::Show(notice) => self.messages.show(notice),
                Effect::Run(command) => self.commands.execute(&command),
            }
        }
        outcome
    }

    fn handle_reply(&self, history: &mut Conversation, text: &str, effects: &mut Vec<Effect>) {
        let (message, run_command) = match AiReply::parse(text) {
            AiReply::Text(text) => {
                effects.push(Effect::Show(ai_says(&text)));
                history.push(Role::Model, text);
                return;
            }
            AiReply::Structured {
                message,
                run_command,
            } => (message, run_command),
        };

        if !message.is_empty() {
            effects.push(Effect::Show(ai_says(&message)));
        }
        if run_command.is_empty() {
            history.push(Role::Model, message);
            return;
        }

        if !run_command.starts_with(COMMAND_PREFIX) {
            let e = AgentError::InvalidCommandFormat(run_command);
            effects.push(Effect::Show(Notice::error(e.to_string())));
            return;
        }
        let links = match chain::expand(&run_command) {
            Ok(links) => links,
            Err(e) => {
                effects.push(Effect::Show(Notice::from(e)));
                return;
            }
        };

        // A blocked first link stops the whole reply; later blocked links are
        // dropped and the rest still run.
        let mut dispatched = Vec::with_capacity(links.len());
        {
            let blocklist = self.blocklist.read().unwrap_or_else(|e| e.into_inner());
            for (i, link) in links.into_iter().enumerate() {
                let base = chain::base_token(&link);
                if !blocklist.is_blocked(&base) {
                    dispatched.push(link);
                    continue;
                }
                tracing::info!(command = %base, "AI command blocked");
                let e = AgentError::CommandBlocked(base);
                effects.push(Effect::Show(Notice::warning(e.to_string())));
                if i == 0 {
                    return;
                }
            }
        }

        let executed = format!("{COMMAND_PREFIX}{}", dispatched.join(" && "));
        effects.push(Effect::Show(Notice::info(format!(
            "AI is executing {executed}"
        ))));
        history.push(Role::Model, format!("{EXECUTED_PREFIX}{executed}"));
        effects.extend(dispatched.into_iter().map(Effect::Run));
    }
}

fn ai_says(text: &str) -> Notice {
    Notice::plain(format!("[AI] {text}"))
}

fn preamble() -> [Content; 2] {
    [
        Content::text(Role::User.as_str(), SYSTEM_PROMPT),
        Content::text(Role::Model.as_str(), SYSTEM_ACK),
    ]
}

// ─── Tests ────────────────────────────────────────────────────────────────
