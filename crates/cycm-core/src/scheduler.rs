//! Serial timer queue for repeated command executions.
//!
//! Every execution from every run is fired on one worker task, in
//! `(fire_at, submission order)` order. Each run owns a cancellation token
//! that is a child of the scheduler-wide token, so a single run or all runs
//! can be stopped; the token is checked right before each fire.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// One pending execution of a scheduled run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledExecution {
    pub command: String,
    /// 1-based position within the run.
    pub sequence_index: u32,
    pub total_count: u32,
    pub fire_at: Instant,
}

/// Receives executions when they fire. Called on the scheduler's worker task.
pub trait ExecutionSink: Send + Sync + 'static {
    fn fire(&self, execution: &ScheduledExecution);
}

impl<F> ExecutionSink for F
where
    F: Fn(&ScheduledExecution) + Send + Sync + 'static,
{
    fn fire(&self, execution: &ScheduledExecution) {
        self(execution)
    }
}

/// Handle to one run. Dropping it does not cancel the run.
#[derive(Debug, Clone)]
pub struct RunHandle {
    token: CancellationToken,
}

impl RunHandle {
    /// Stop the executions of this run that have not fired yet.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }
}

struct Pending {
    execution: ScheduledExecution,
    seq: u64,
    token: CancellationToken,
    sink: Arc<dyn ExecutionSink>,
}

impl Pending {
    fn key(&self) -> (Instant, u64) {
        (self.execution.fire_at, self.seq)
    }
}

impl PartialEq for Pending {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for Pending {}

impl PartialOrd for Pending {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Pending {
    // Reversed so the max-heap pops the earliest execution first.
    fn cmp(&self, other: &Self) -> Ordering {
        other.key().cmp(&self.key())
    }
}

/// Cloneable front end to the worker task. Must be created inside a tokio
/// runtime. Pending executions are dropped once every clone is gone.
#[derive(Clone)]
pub struct Scheduler {
    tx: mpsc::UnboundedSender<Pending>,
    root: Arc<Mutex<CancellationToken>>,
    seq: Arc<Mutex<u64>>,
}

impl Scheduler {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(worker(rx));
        Self {
            tx,
            root: Arc::new(Mutex::new(CancellationToken::new())),
            seq: Arc::new(Mutex::new(0)),
        }
    }

    /// Schedule `repeats` executions of `command`, the i-th (0-based) at
    /// `now + i * delay`. The first one fires immediately.
    pub fn run(
        &self,
        command: &str,
        repeats: u32,
        delay: Duration,
        sink: Arc<dyn ExecutionSink>,
    ) -> RunHandle {
        let token = match self.root.lock() {
            Ok(root) => root.child_token(),
            Err(poisoned) => poisoned.into_inner().child_token(),
        };
        let start = Instant::now();

        let mut seq = match self.seq.lock() {
            Ok(seq) => seq,
            Err(poisoned) => poisoned.into_inner(),
        };
        for i in 0..repeats {
            *seq += 1;
            let pending = Pending {
                execution: ScheduledExecution {
                    command: command.to_string(),
                    sequence_index: i + 1,
                    total_count: repeats,
                    fire_at: start + delay * i,
                },
                seq: *seq,
                token: token.clone(),
                sink: Arc::clone(&sink),
            };
            if self.tx.send(pending).is_err() {
                tracing::warn!(command, "scheduler worker has stopped");
                break;
            }
        }
        tracing::debug!(command, repeats, delay_ms = delay.as_millis() as u64, "run scheduled");
        RunHandle { token }
    }

    /// Cancel every run scheduled so far. Later runs are unaffected.
    pub fn cancel_all(&self) {
        let mut root = match self.root.lock() {
            Ok(root) => root,
            Err(poisoned) => poisoned.into_inner(),
        };
        root.cancel();
        *root = CancellationToken::new();
        tracing::debug!("all scheduled runs cancelled");
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

async fn worker(mut rx: mpsc::UnboundedReceiver<Pending>) {
    let mut heap: BinaryHeap<Pending> = BinaryHeap::new();
    loop {
        let next = heap.peek().map(|p| p.execution.fire_at);
        tokio::select! {
            biased;
            received = rx.recv() => match received {
                Some(pending) => heap.push(pending),
                None => break,
            },
            _ = tokio::time::sleep_until(next.unwrap_or_else(Instant::now)), if next.is_some() => {
                let now = Instant::now();
                while heap.peek().is_some_and(|p| p.execution.fire_at <= now) {
                    let Some(pending) = heap.pop() else { break };
                    if pending.token.is_cancelled() {
                        continue;
                    }
                    pending.sink.fire(&pending.execution);
                }
            }
        }
    }
    if !heap.is_empty() {
        tracing::debug!(dropped = heap.len(), "scheduler stopped with pending executions");
    }
}
