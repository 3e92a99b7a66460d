use crate::host::{Outbox, Terminal};
use crate::runtime::Runtime;
use crate::shell;
use cycm_core::Notice;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// run: an active session driven from the terminal
// ---------------------------------------------------------------------------

/// Start a session: poll the queue files, fire scheduled commands and read
/// console commands from stdin until Ctrl-C.
///
/// When stdin closes the console stops; with `exit_on_eof` the session then
/// runs one more poll period and shuts down.
pub fn run(root: &Path, outbox: Option<PathBuf>, exit_on_eof: bool) -> anyhow::Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let root_buf = root.to_path_buf();

    rt.block_on(async move {
        let mut runtime = Runtime::new(&root_buf, Arc::new(Outbox::new(outbox)), Arc::new(Terminal))?;
        runtime.set_session_active(true);
        if !runtime.is_enabled() {
            runtime.show(Notice::warning("cycm is disabled; use `cycm on` to start the queues"));
        }
        runtime.show(Notice::info(format!("cycm session started in {}", root_buf.display())));

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdin_open = true;
        loop {
            tokio::select! {
                line = lines.next_line(), if stdin_open => match line? {
                    Some(line) => shell::execute(&mut runtime, &line),
                    None if exit_on_eof => {
                        tokio::time::sleep(runtime.config().poll_interval()).await;
                        break;
                    }
                    None => stdin_open = false,
                },
                _ = tokio::signal::ctrl_c() => break,
            }
        }

        runtime.shutdown();
        Ok(())
    })
}
