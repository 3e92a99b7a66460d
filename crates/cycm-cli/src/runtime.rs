use anyhow::Context;
use cycm_core::line::{LineParser, RECORD_SEPARATOR};
use cycm_core::paths::{self, ResettableFile};
use cycm_core::queue::{self, FileQueueConsumer};
use cycm_core::{
    BlockList, CommandSink, Config, CycmError, MessageSink, Notice, Pipeline, RepeatSettings,
    Scheduler,
};
use gemini_agent::{AgentError, AiBridge, ApiKeyStore, GeminiClient, Transport};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Actor name used for commands coming back from the AI.
const AI_ACTOR: &str = "AI";

struct Consumers {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// Everything one cycm session owns. Must be created inside a tokio runtime.
///
/// Queue consumers run only while the host session is active and cycm is
/// enabled. Each operation reports back with exactly one [`Notice`].
pub struct Runtime {
    root: PathBuf,
    config: Config,
    blocklist: Arc<RwLock<BlockList>>,
    settings: Arc<RwLock<RepeatSettings>>,
    pipeline: Arc<Pipeline>,
    bridge: AiBridge,
    keys: ApiKeyStore,
    commands: Arc<dyn CommandSink>,
    messages: Arc<dyn MessageSink>,
    session_active: bool,
    consumers: Option<Consumers>,
    last_output: Option<String>,
}

impl Runtime {
    pub fn new(
        root: &Path,
        commands: Arc<dyn CommandSink>,
        messages: Arc<dyn MessageSink>,
    ) -> anyhow::Result<Self> {
        std::fs::create_dir_all(root)
            .with_context(|| format!("failed to create {}", root.display()))?;
        let config = Config::load(root).context("failed to load config")?;
        let blocklist = Arc::new(RwLock::new(
            BlockList::load(&paths::blocked_path(root)).context("failed to load block list")?,
        ));
        let settings = Arc::new(RwLock::new(
            RepeatSettings::load(&paths::repeating_path(root))
                .context("failed to load repeat settings")?,
        ));
        let pipeline = build_pipeline(
            &config,
            &blocklist,
            &settings,
            Scheduler::new(),
            &commands,
            &messages,
        );
        let keys = ApiKeyStore::new(&paths::api_key_path(root));
        let bridge = build_bridge(&config, &blocklist, &pipeline, &messages);
        bridge.set_api_key(keys.load().context("failed to read API key")?);

        tracing::info!(root = %root.display(), enabled = config.enabled, "runtime ready");
        Ok(Runtime {
            root: root.to_path_buf(),
            config,
            blocklist,
            settings,
            pipeline,
            bridge,
            keys,
            commands,
            messages,
            session_active: false,
            consumers: None,
            last_output: None,
        })
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn show(&self, notice: Notice) {
        self.messages.show(notice);
    }

    // ─── Session ───────────────────────────────────────────────────────────

    /// The host joined (`true`) or left (`false`) a session. Leaving stops
    /// the consumers and drops pending executions and the AI request.
    pub fn set_session_active(&mut self, active: bool) {
        self.session_active = active;
        if active {
            self.start_consumers();
        } else {
            self.stop_consumers();
            self.pipeline.scheduler().cancel_all();
            self.bridge.cancel();
        }
    }

    fn start_consumers(&mut self) {
        if self.consumers.is_some() || !self.session_active || !self.config.enabled {
            return;
        }
        let commands = {
            let pipeline = Arc::clone(&self.pipeline);
            FileQueueConsumer::new(
                "commands",
                paths::commands_path(&self.root),
                paths::commands_log_path(&self.root),
                Arc::new(move |line: &str| pipeline.process_command_line(line)),
            )
        };
        let chat = {
            let pipeline = Arc::clone(&self.pipeline);
            FileQueueConsumer::new(
                "chat",
                paths::chat_path(&self.root),
                paths::chat_log_path(&self.root),
                Arc::new(move |line: &str| pipeline.process_chat_line(line)),
            )
        };
        let token = CancellationToken::new();
        let handle = queue::spawn(
            vec![commands, chat],
            self.config.poll_interval(),
            token.clone(),
        );
        self.consumers = Some(Consumers { token, handle });
    }

    fn stop_consumers(&mut self) {
        if let Some(consumers) = self.consumers.take() {
            consumers.token.cancel();
            drop(consumers.handle);
        }
    }

    pub fn consumers_running(&self) -> bool {
        self.consumers.is_some()
    }

    // ─── cycm on / off / restart / resetfile ───────────────────────────────

    pub fn set_enabled(&mut self, enabled: bool) -> Notice {
        let word = if enabled { "enabled" } else { "disabled" };
        if self.config.enabled == enabled {
            return Notice::warning(format!("cycm is already {word}"));
        }
        let next = Config {
            enabled,
            ..self.config.clone()
        };
        if let Err(e) = next.save(&self.root) {
            return Notice::from(e);
        }
        self.config = next;
        self.bridge.set_enabled(enabled);
        if enabled {
            self.start_consumers();
        } else {
            self.stop_consumers();
            self.pipeline.scheduler().cancel_all();
            self.bridge.cancel();
        }
        tracing::info!(enabled, "cycm toggled");
        Notice::success(format!("cycm {word}"))
    }

    /// Stop everything, reload every file and start again.
    pub fn restart(&mut self) -> Notice {
        self.stop_consumers();
        self.pipeline.scheduler().cancel_all();
        self.bridge.cancel();

        if let Err(e) = self.reload() {
            tracing::error!(error = %format!("{e:#}"), "restart failed");
            return Notice::error(format!("restart failed: {e:#}"));
        }
        self.start_consumers();
        Notice::success("cycm restarted")
    }

    fn reload(&mut self) -> anyhow::Result<()> {
        self.config = Config::load(&self.root)?;
        self.reload_blocklist()?;
        self.reload_settings()?;
        self.pipeline = build_pipeline(
            &self.config,
            &self.blocklist,
            &self.settings,
            self.pipeline.scheduler().clone(),
            &self.commands,
            &self.messages,
        );
        self.bridge = build_bridge(&self.config, &self.blocklist, &self.pipeline, &self.messages);
        self.bridge.set_api_key(self.keys.load()?);
        Ok(())
    }

    fn reload_blocklist(&self) -> cycm_core::Result<()> {
        let fresh = BlockList::load(&paths::blocked_path(&self.root))?;
        *self.blocklist.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        Ok(())
    }

    fn reload_settings(&self) -> cycm_core::Result<()> {
        let fresh = RepeatSettings::load(&paths::repeating_path(&self.root))?;
        *self.settings.write().unwrap_or_else(|e| e.into_inner()) = fresh;
        Ok(())
    }

    /// Delete one of the settings files and regenerate it with defaults.
    pub fn reset_file(&mut self, name: &str) -> Notice {
        let Some(file) = ResettableFile::from_name(name) else {
            return Notice::from(CycmError::UnknownFile(name.trim().to_string()));
        };
        let path = file.path(&self.root);
        if let Err(e) = std::fs::remove_file(&path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Notice::from(CycmError::Io(e));
            }
        }
        let reloaded = match file {
            ResettableFile::BlockedCommands => self.reload_blocklist(),
            ResettableFile::RepeatingSettings => self.reload_settings(),
        };
        match reloaded {
            Ok(()) => Notice::success(format!("{} has been reset", file.file_name())),
            Err(e) => Notice::from(e),
        }
    }

    // ─── Block list ────────────────────────────────────────────────────────

    pub fn block(&mut self, command: &str) -> Notice {
        let mut list = self.blocklist.write().unwrap_or_else(|e| e.into_inner());
        match list.block(command) {
            Ok(()) => Notice::success(format!(
                "/{} blocked",
                cycm_core::chain::base_token(command)
            )),
            Err(e) => Notice::from(e),
        }
    }

    pub fn unblock(&mut self, command: &str) -> Notice {
        let token = cycm_core::chain::base_token(command);
        let mut list = self.blocklist.write().unwrap_or_else(|e| e.into_inner());
        match list.unblock(command) {
            Ok(()) if token == "all" => Notice::success("block list reset to defaults"),
            Ok(()) => Notice::success(format!("/{token} unblocked")),
            Err(e) => Notice::from(e),
        }
    }

    pub fn blocked(&self) -> Vec<String> {
        self.blocklist
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .list()
    }

    pub fn blocklist(&self) -> Notice {
        let blocked = self.blocked();
        if blocked.is_empty() {
            return Notice::warning("No blocked commands");
        }
        let mut text = String::from("Blocked commands:");
        for command in blocked {
            text.push_str(&format!("\n - /{command}"));
        }
        Notice::info(text)
    }

    // ─── Limits ────────────────────────────────────────────────────────────

    pub fn set_max_repeats(&mut self, value: i64) -> Notice {
        let path = paths::repeating_path(&self.root);
        let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
        match settings.set_max_repeats(value, &path) {
            Ok(()) => Notice::success(format!("Maximum repeats set to {value}")),
            Err(e) => Notice::from(e),
        }
    }

    pub fn set_max_delay(&mut self, value: i64) -> Notice {
        let path = paths::repeating_path(&self.root);
        let mut settings = self.settings.write().unwrap_or_else(|e| e.into_inner());
        match settings.set_max_delay_secs(value, &path) {
            Ok(()) => Notice::success(format!("Maximum delay set to {value} seconds")),
            Err(e) => Notice::from(e),
        }
    }

    pub fn settings(&self) -> RepeatSettings {
        *self.settings.read().unwrap_or_else(|e| e.into_inner())
    }

    // ─── Execution ─────────────────────────────────────────────────────────

    /// Run a console command. Success is announced when each repetition
    /// fires, so only a rejection yields a notice here.
    pub fn execute(&self, command: &str) -> Option<Notice> {
        if command.trim().is_empty() {
            return Some(Notice::error("Usage: cycm execute <command> [+N [D]]"));
        }
        match self.pipeline.execute_direct(command) {
            Ok(_) => None,
            Err(e) => Some(Notice::from(e)),
        }
    }

    /// Output the host captured from the last executed command. It is sent
    /// with the next AI prompt.
    pub fn record_command_output(&mut self, output: &str) -> Notice {
        let output = output.trim();
        if output.is_empty() {
            return Notice::error("Usage: output <text>");
        }
        self.last_output = Some(output.to_string());
        Notice::info("Command output will be sent with the next AI prompt")
    }

    // ─── AI ────────────────────────────────────────────────────────────────

    /// Send `prompt` to the AI. Progress and the answer arrive as notices.
    pub fn ai(&mut self, prompt: &str) -> Option<Notice> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Some(Notice::error("Usage: ai <prompt>"));
        }
        let last_output = self.last_output.take();
        match self.bridge.submit(prompt, last_output.as_deref()) {
            Ok(_) => None,
            Err(e) => {
                self.last_output = last_output;
                Some(match e {
                    AgentError::NoApiKey => Notice::warning(format!(
                        "No Gemini API key. Put it in {}",
                        self.keys.path().display()
                    )),
                    other => Notice::error(other.to_string()),
                })
            }
        }
    }

    pub fn stop_ai(&self) -> Notice {
        if self.bridge.cancel() {
            Notice::success("AI generation stopped")
        } else {
            Notice::warning("No AI request in progress")
        }
    }

    pub fn bridge(&self) -> &AiBridge {
        &self.bridge
    }

    pub fn shutdown(&mut self) {
        self.set_session_active(false);
        tracing::info!("runtime stopped");
    }
}

fn build_pipeline(
    config: &Config,
    blocklist: &Arc<RwLock<BlockList>>,
    settings: &Arc<RwLock<RepeatSettings>>,
    scheduler: Scheduler,
    commands: &Arc<dyn CommandSink>,
    messages: &Arc<dyn MessageSink>,
) -> Arc<Pipeline> {
    let pipeline = Pipeline::new(
        Arc::clone(blocklist),
        Arc::clone(settings),
        scheduler,
        Arc::clone(commands),
        Arc::clone(messages),
    )
    .with_parser(LineParser::new(RECORD_SEPARATOR, config.record_split));
    Arc::new(pipeline)
}

fn build_bridge(
    config: &Config,
    blocklist: &Arc<RwLock<BlockList>>,
    pipeline: &Arc<Pipeline>,
    messages: &Arc<dyn MessageSink>,
) -> AiBridge {
    let transport: Arc<dyn Transport> =
        Arc::new(GeminiClient::new(&config.ai.endpoint, &config.ai.model));
    let dispatch: Arc<dyn CommandSink> = {
        let pipeline = Arc::clone(pipeline);
        Arc::new(move |command: &str| pipeline.dispatch(AI_ACTOR, command))
    };
    AiBridge::builder(transport, Arc::clone(blocklist), dispatch, Arc::clone(messages))
        .timeout(config.ai.timeout())
        .history_limit(config.ai.history_limit)
        .enabled(config.enabled)
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use cycm_core::sink::Recorder;
    use cycm_core::Tone;
    use std::time::Duration;
    use tempfile::TempDir;

    fn runtime(dir: &TempDir) -> (Runtime, Recorder) {
        let recorder = Recorder::new();
        let rt = Runtime::new(
            dir.path(),
            Arc::new(recorder.clone()),
            Arc::new(recorder.clone()),
        )
        .unwrap();
        (rt, recorder)
    }

    #[tokio::test(start_paused = true)]
    async fn new_creates_settings_files() {
        let dir = TempDir::new().unwrap();
        let (rt, _) = runtime(&dir);
        assert!(rt.is_enabled());
        for file in ["config.yaml", "blocked_commands.txt", "repeating_settings.txt", "gemini_api_key.txt"] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
    }

    #[tokio::test(start_paused = true)]
    async fn consumers_follow_session_and_enabled() {
        let dir = TempDir::new().unwrap();
        let (mut rt, _) = runtime(&dir);
        assert!(!rt.consumers_running());

        rt.set_session_active(true);
        assert!(rt.consumers_running());

        assert_eq!(rt.set_enabled(false).tone, Tone::Success);
        assert!(!rt.consumers_running());
        assert_eq!(rt.set_enabled(false), Notice::warning("cycm is already disabled"));

        rt.set_enabled(true);
        assert!(rt.consumers_running());
        rt.set_session_active(false);
        assert!(!rt.consumers_running());
        assert!(rt.set_enabled(true).text.contains("already enabled"));
    }

    #[tokio::test(start_paused = true)]
    async fn enabled_flag_is_persisted() {
        let dir = TempDir::new().unwrap();
        let (mut rt, _) = runtime(&dir);
        rt.set_enabled(false);
        assert!(!Config::load(dir.path()).unwrap().enabled);
    }

    #[tokio::test(start_paused = true)]
    async fn session_drains_command_file() {
        let dir = TempDir::new().unwrap();
        let (mut rt, recorder) = runtime(&dir);
        std::fs::write(
            dir.path().join("commands_list.txt"),
            "Alice:/time set day\nBob:/kill @e\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("chat.txt"), "Carol:hello\n").unwrap();

        rt.set_session_active(true);
        tokio::time::sleep(Duration::from_millis(2500)).await;

        assert_eq!(recorder.executed(), vec!["time set day"]);
        let texts: Vec<String> = recorder.notices().into_iter().map(|n| n.text).collect();
        assert!(texts.contains(&"<Carol> hello".to_string()));
        assert!(texts.contains(&"command /kill is blocked".to_string()));
        assert_eq!(
            std::fs::read_to_string(dir.path().join("commands_list.txt")).unwrap(),
            ""
        );
        rt.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn record_split_follows_config_across_restart() {
        let dir = TempDir::new().unwrap();
        let (mut rt, recorder) = runtime(&dir);
        let commands = dir.path().join("commands_list.txt");
        std::fs::write(&commands, "team red:/say hi\n").unwrap();

        rt.set_session_active(true);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(recorder.executed().is_empty());
        assert!(recorder
            .notices()
            .iter()
            .any(|n| n.text == "malformed record: 'team red:/say hi'"));

        std::fs::write(dir.path().join("config.yaml"), "record_split: last\n").unwrap();
        std::fs::write(&commands, "team red:/say hi\n").unwrap();
        assert_eq!(rt.restart(), Notice::success("cycm restarted"));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(recorder.executed(), vec!["say hi"]);
        assert!(recorder
            .notices()
            .iter()
            .any(|n| n.text == "team red executed command /say hi"));
        rt.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn block_unblock_and_list() {
        let dir = TempDir::new().unwrap();
        let (mut rt, _) = runtime(&dir);

        assert_eq!(rt.block("/Summon"), Notice::success("/summon blocked"));
        assert_eq!(rt.block("summon").tone, Tone::Warning);
        assert_eq!(rt.block("cycm").tone, Tone::Error);
        assert!(rt.blocklist().text.contains("\n - /summon"));

        assert_eq!(rt.unblock("summon"), Notice::success("/summon unblocked"));
        assert_eq!(rt.unblock("all"), Notice::success("block list reset to defaults"));
        assert_eq!(rt.blocked().len(), 13);
    }

    #[tokio::test(start_paused = true)]
    async fn limits_validate_and_apply() {
        let dir = TempDir::new().unwrap();
        let (mut rt, recorder) = runtime(&dir);

        assert_eq!(rt.set_max_repeats(0).tone, Tone::Error);
        assert_eq!(rt.set_max_delay(-1).tone, Tone::Error);
        assert_eq!(rt.set_max_repeats(2).tone, Tone::Success);
        assert_eq!(rt.settings().max_repeats, 2);

        let rejected = rt.execute("say hi +3").unwrap();
        assert!(rejected.text.contains("exceeds the maximum of 2"));
        assert!(rt.execute("say hi +2").is_none());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(recorder.executed(), vec!["say hi", "say hi"]);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_file_regenerates_defaults() {
        let dir = TempDir::new().unwrap();
        let (mut rt, _) = runtime(&dir);
        rt.set_max_repeats(3);
        rt.block("summon");

        assert_eq!(
            rt.reset_file("repeating_settings.txt"),
            Notice::success("repeating_settings.txt has been reset")
        );
        assert_eq!(rt.settings(), RepeatSettings::default());

        rt.reset_file("BLOCKED_COMMANDS.TXT");
        assert!(!rt.blocked().contains(&"summon".to_string()));

        assert_eq!(rt.reset_file("config.yaml").tone, Tone::Error);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_picks_up_edited_files() {
        let dir = TempDir::new().unwrap();
        let (mut rt, _) = runtime(&dir);
        std::fs::write(dir.path().join("repeating_settings.txt"), "7:3\n").unwrap();
        std::fs::write(dir.path().join("gemini_api_key.txt"), "AIza-restart\n").unwrap();

        assert_eq!(rt.restart(), Notice::success("cycm restarted"));
        assert_eq!(rt.settings().max_repeats, 7);
        assert!(rt.bridge().has_api_key());
    }

    #[tokio::test(start_paused = true)]
    async fn ai_requires_prompt_and_stop_reports_state() {
        let dir = TempDir::new().unwrap();
        let (mut rt, _) = runtime(&dir);
        assert_eq!(rt.ai("   ").unwrap().tone, Tone::Error);
        assert_eq!(rt.stop_ai(), Notice::warning("No AI request in progress"));
    }

    #[tokio::test(start_paused = true)]
    async fn ai_is_refused_while_disabled() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("gemini_api_key.txt"), "AIza-test\n").unwrap();
        let (mut rt, _) = runtime(&dir);
        rt.set_enabled(false);
        assert_eq!(
            rt.record_command_output("Set the time to 1000").tone,
            Tone::Info
        );
        assert_eq!(rt.record_command_output("  ").tone, Tone::Error);

        let notice = rt.ai("hello").unwrap();
        assert_eq!(notice.text, "cycm is disabled");
        assert_eq!(rt.last_output.as_deref(), Some("Set the time to 1000"));
    }
}
