pub mod blocklist;
pub mod chain;
pub mod config;
pub mod error;
pub mod io;
pub mod line;
pub mod modifier;
pub mod notice;
pub mod paths;
pub mod pipeline;
pub mod queue;
pub mod scheduler;
pub mod settings;
pub mod sink;

pub use blocklist::BlockList;
pub use config::{AiConfig, Config};
pub use error::{CycmError, Result};
pub use notice::{Notice, Tone};
pub use pipeline::Pipeline;
pub use scheduler::{RunHandle, Scheduler};
pub use settings::RepeatSettings;
pub use sink::{CommandSink, MessageSink};
