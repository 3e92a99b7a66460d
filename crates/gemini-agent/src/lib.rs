//! `gemini-agent`: conversation bridge between cycm and the Gemini API.
//!
//! # Architecture
//!
//! ```text
//! AiBridge::submit(prompt)
//!     │   cancels the request in flight, bumps the epoch,
//!     │   appends the user turn to the Conversation
//!     ▼
//! Transport::generate   ← GeminiClient (reqwest) in production,
//!     │                    a scripted transport in tests
//!     ▼
//! AiReply::parse        ← `{message, runCommand}` or plain text
//!     │
//!     ├─▶ MessageSink   (what the model said)
//!     └─▶ CommandSink   (the command, after the block list check)
//! ```
//!
//! Stale completions (after a newer `submit` or a `cancel`) are detected by
//! epoch and dropped.

pub mod bridge;
pub mod client;
pub mod error;
pub mod history;
pub mod key;
pub mod reply;
pub mod types;


pub use bridge::{AiBridge, AiBridgeBuilder, Outcome, Phase};
pub use client::{GeminiClient, Transport};
pub use error::AgentError;
pub use history::{Conversation, ConversationEntry, Role};
pub use key::ApiKeyStore;
pub use reply::AiReply;

/// Convenience `Result` alias for this crate.
pub type Result<T> = std::result::Result<T, AgentError>;
