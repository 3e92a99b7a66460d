//! Line-at-a-time consumption of externally written queue files.

use crate::error::Result;
use crate::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handles one raw record taken from a queue file.
pub trait LineProcessor: Send + Sync {
    fn process(&self, line: &str);
}

impl<F> LineProcessor for F
where
    F: Fn(&str) + Send + Sync,
{
    fn process(&self, line: &str) {
        self(line)
    }
}

/// What a single poll did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The source did not exist and was created empty.
    Created,
    Empty,
    Processed(String),
}

/// Consumes the first line of `source` on every poll.
pub struct FileQueueConsumer {
    label: &'static str,
    source: PathBuf,
    log: PathBuf,
    processor: Arc<dyn LineProcessor>,
}

impl FileQueueConsumer {
    pub fn new(
        label: &'static str,
        source: PathBuf,
        log: PathBuf,
        processor: Arc<dyn LineProcessor>,
    ) -> Self {
        Self {
            label,
            source,
            log,
            processor,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Take, log, process and remove the first line of the source.
    ///
    /// An I/O error aborts the poll before the source is rewritten, so the
    /// record stays at the head of the file. A failure to append to the log
    /// is reported and otherwise ignored.
    pub fn poll_once(&self) -> Result<PollOutcome> {
        if io::ensure_file(&self.source)? {
            return Ok(PollOutcome::Created);
        }
        let mut lines = io::read_lines(&self.source)?;
        if lines.is_empty() {
            return Ok(PollOutcome::Empty);
        }
        let line = lines.remove(0);

        let stamped = format!("{} {}", chrono::Local::now().format("%H:%M:%S"), line);
        if let Err(e) = io::append_line(&self.log, &stamped) {
            tracing::warn!(queue = self.label, path = %self.log.display(), error = %e, "failed to append to log");
        }

        self.processor.process(&line);
        io::write_lines(&self.source, &lines)?;
        tracing::debug!(queue = self.label, remaining = lines.len(), "record consumed");
        Ok(PollOutcome::Processed(line))
    }
}

/// Poll every consumer, in order, once per `period` until `token` is
/// cancelled.
pub fn spawn(
    consumers: Vec<FileQueueConsumer>,
    period: Duration,
    token: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        tracing::info!(period_ms = period.as_millis() as u64, "queue consumers started");
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = interval.tick() => {
                    for consumer in &consumers {
                        if let Err(e) = consumer.poll_once() {
                            tracing::warn!(queue = consumer.label, error = %e, "poll failed");
                        }
                    }
                }
            }
        }
        tracing::info!("queue consumers stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tempfile::TempDir;

    fn consumer(dir: &TempDir) -> (FileQueueConsumer, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&seen);
        let processor = move |line: &str| inner.lock().unwrap().push(line.to_string());
        let c = FileQueueConsumer::new(
            "commands",
            dir.path().join("commands_list.txt"),
            dir.path().join("commands_log.txt"),
            Arc::new(processor),
        );
        (c, seen)
    }

    #[test]
    fn missing_source_is_created() {
        let dir = TempDir::new().unwrap();
        let (c, seen) = consumer(&dir);
        assert_eq!(c.poll_once().unwrap(), PollOutcome::Created);
        assert!(c.source().exists());
        assert_eq!(c.poll_once().unwrap(), PollOutcome::Empty);
        assert!(seen.lock().unwrap().is_empty());
    }

    #[test]
    fn consumes_one_line_per_poll() {
        let dir = TempDir::new().unwrap();
        let (c, seen) = consumer(&dir);
        std::fs::write(c.source(), "a:/one\nb:/two\n").unwrap();

        assert_eq!(c.poll_once().unwrap(), PollOutcome::Processed("a:/one".into()));
        assert_eq!(std::fs::read_to_string(c.source()).unwrap(), "b:/two\n");

        assert_eq!(c.poll_once().unwrap(), PollOutcome::Processed("b:/two".into()));
        assert_eq!(std::fs::read_to_string(c.source()).unwrap(), "");
        assert_eq!(c.poll_once().unwrap(), PollOutcome::Empty);
        assert_eq!(*seen.lock().unwrap(), vec!["a:/one", "b:/two"]);
    }

    #[test]
    fn undecodable_record_does_not_stall_the_source() {
        let dir = TempDir::new().unwrap();
        let (c, seen) = consumer(&dir);
        std::fs::write(c.source(), b"Bob:/say \xff\nAlice:/time set day\n").unwrap();

        assert_eq!(
            c.poll_once().unwrap(),
            PollOutcome::Processed("Bob:/say \u{FFFD}".into())
        );
        assert_eq!(
            c.poll_once().unwrap(),
            PollOutcome::Processed("Alice:/time set day".into())
        );
        assert_eq!(c.poll_once().unwrap(), PollOutcome::Empty);
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn log_lines_are_stamped() {
        let dir = TempDir::new().unwrap();
        let (c, _seen) = consumer(&dir);
        std::fs::write(c.source(), "a:/one\n").unwrap();
        c.poll_once().unwrap();

        let log = std::fs::read_to_string(dir.path().join("commands_log.txt")).unwrap();
        let line = log.lines().next().unwrap();
        let (stamp, rest) = line.split_once(' ').unwrap();
        assert_eq!(rest, "a:/one");
        assert_eq!(stamp.len(), 8);
        assert_eq!(stamp.matches(':').count(), 2);
    }

    #[test]
    fn unwritable_log_does_not_block_the_queue() {
        let dir = TempDir::new().unwrap();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let inner = Arc::clone(&seen);
        let c = FileQueueConsumer::new(
            "chat",
            dir.path().join("chat.txt"),
            // A directory cannot be opened for appending.
            dir.path().to_path_buf(),
            Arc::new(move |line: &str| inner.lock().unwrap().push(line.to_string())),
        );
        std::fs::write(c.source(), "bob:hi\n").unwrap();
        assert_eq!(c.poll_once().unwrap(), PollOutcome::Processed("bob:hi".into()));
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_loop_drains_until_cancelled() {
        let dir = TempDir::new().unwrap();
        let (c, seen) = consumer(&dir);
        std::fs::write(c.source(), "a:/1\na:/2\na:/3\n").unwrap();

        let token = CancellationToken::new();
        let handle = spawn(vec![c], Duration::from_millis(100), token.clone());
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(seen.lock().unwrap().len(), 2);

        token.cancel();
        handle.await.unwrap();
        assert_eq!(seen.lock().unwrap().len(), 2);
    }
}
