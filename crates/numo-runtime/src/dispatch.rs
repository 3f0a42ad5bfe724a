//! # UI Dispatch
//!
//! Serial executor standing in for the UI thread. Background work (payment
//! listeners, price fetches) hands results to the UI by posting closures
//! here; they run one at a time, in deadline order.
//!
//! ## Dispatch Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         UI Dispatch Loop                                │
//! │                                                                         │
//! │  any task / thread             dispatch loop (one tokio task)          │
//! │  ─────────────────             ───────────────────────────────         │
//! │                                                                         │
//! │  post(job) ───────┐                                                    │
//! │  post_delayed ────┼──► mpsc ──► queue: (deadline, id) → job            │
//! │  remove_* ────────┘               │                                    │
//! │                                   ▼                                    │
//! │                          sleep until earliest deadline                 │
//! │                                   │                                    │
//! │                                   ▼                                    │
//! │                          run job (panics are logged)                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Ordering
//! - Jobs run one at a time, earliest deadline first.
//! - Equal deadlines run in posting order.
//! - A cancellation sent before a job's deadline always wins.
//!
//! Dropping every `UiDispatcher` clone stops the loop; jobs still queued are
//! dropped without running.

use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, trace, warn};

/// A unit of work for the UI loop.
type Job = Box<dyn FnOnce() + Send + 'static>;

// =============================================================================
// Handles
// =============================================================================

/// Identifies one posted job, for cancelling it with
/// [`UiDispatcher::remove_callbacks`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PostHandle {
    id: u64,
}

/// Groups posted jobs so they can be cancelled together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DispatchToken(u64);

/// Commands for the dispatch loop.
enum Command {
    Post {
        id: u64,
        token: Option<DispatchToken>,
        deadline: Instant,
        job: Job,
    },
    Remove {
        id: u64,
    },
    /// `None` clears the whole queue.
    RemoveToken(Option<DispatchToken>),
}

struct QueuedJob {
    token: Option<DispatchToken>,
    job: Job,
}

// =============================================================================
// Dispatcher
// =============================================================================

/// Cloneable handle to the UI dispatch loop.
#[derive(Clone)]
pub struct UiDispatcher {
    cmd_tx: mpsc::UnboundedSender<Command>,
    next_id: Arc<AtomicU64>,
}

impl UiDispatcher {
    /// Starts the dispatch loop and returns a handle to it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            run(cmd_rx).await;
        });

        UiDispatcher {
            cmd_tx,
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Runs `job` as soon as the loop is free.
    pub fn post<F>(&self, job: F) -> PostHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(None, Duration::ZERO, Box::new(job))
    }

    /// Runs `job` once `delay` has elapsed.
    pub fn post_delayed<F>(&self, job: F, delay: Duration) -> PostHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(None, delay, Box::new(job))
    }

    /// Like [`post_delayed`](Self::post_delayed), tagging the job with `token`.
    pub fn post_delayed_with_token<F>(
        &self,
        token: &DispatchToken,
        job: F,
        delay: Duration,
    ) -> PostHandle
    where
        F: FnOnce() + Send + 'static,
    {
        self.enqueue(Some(*token), delay, Box::new(job))
    }

    /// Cancels one pending job. No effect if it already ran.
    pub fn remove_callbacks(&self, handle: &PostHandle) {
        self.send(Command::Remove { id: handle.id });
    }

    /// Cancels every pending job posted with `token`, or every pending job
    /// when `token` is `None`.
    pub fn remove_callbacks_and_messages(&self, token: Option<&DispatchToken>) {
        self.send(Command::RemoveToken(token.copied()));
    }

    /// Returns a fresh token, distinct from every other token of this loop.
    pub fn new_token(&self) -> DispatchToken {
        DispatchToken(self.next_id())
    }

    fn enqueue(&self, token: Option<DispatchToken>, delay: Duration, job: Job) -> PostHandle {
        let id = self.next_id();
        let deadline = Instant::now() + delay;

        self.send(Command::Post {
            id,
            token,
            deadline,
            job,
        });

        PostHandle { id }
    }

    fn next_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    fn send(&self, cmd: Command) {
        if self.cmd_tx.send(cmd).is_err() {
            warn!("UI dispatch loop is not running; command dropped");
        }
    }
}

// =============================================================================
// Loop
// =============================================================================

/// Main dispatch loop. Exits when every sender is gone.
async fn run(mut cmd_rx: mpsc::UnboundedReceiver<Command>) {
    info!("UI dispatch loop started");

    let mut queue: BTreeMap<(Instant, u64), QueuedJob> = BTreeMap::new();

    loop {
        let next_deadline = queue.keys().next().map(|(deadline, _)| *deadline);

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(cmd) => apply(&mut queue, cmd),
                None => break,
            },
            _ = sleep_until(next_deadline.unwrap_or_else(Instant::now)), if next_deadline.is_some() => {
                if let Some(((_, id), queued)) = queue.pop_first() {
                    run_job(id, queued.job);
                }
            }
        }
    }

    info!(dropped = queue.len(), "UI dispatch loop stopped");
}

fn apply(queue: &mut BTreeMap<(Instant, u64), QueuedJob>, cmd: Command) {
    match cmd {
        Command::Post {
            id,
            token,
            deadline,
            job,
        } => {
            trace!(id, "Job queued");
            queue.insert((deadline, id), QueuedJob { token, job });
        }
        Command::Remove { id } => {
            queue.retain(|(_, queued_id), _| *queued_id != id);
        }
        Command::RemoveToken(Some(token)) => {
            let before = queue.len();
            queue.retain(|_, queued| queued.token != Some(token));
            debug!(removed = before - queue.len(), "Removed jobs for token");
        }
        Command::RemoveToken(None) => {
            debug!(removed = queue.len(), "Cleared UI queue");
            queue.clear();
        }
    }
}

fn run_job(id: u64, job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        error!(id, "UI job panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    type Log = Arc<Mutex<Vec<&'static str>>>;

    fn recorder(log: &Log, label: &'static str) -> impl FnOnce() + Send + 'static {
        let log = Arc::clone(log);
        move || log.lock().unwrap().push(label)
    }

    async fn settle() {
        tokio::time::sleep(Duration::from_secs(1)).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_jobs_run_in_deadline_order() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();

        ui.post_delayed(recorder(&log, "slow"), Duration::from_millis(200));
        ui.post_delayed(recorder(&log, "fast"), Duration::from_millis(100));
        ui.post(recorder(&log, "now-1"));
        ui.post(recorder(&log, "now-2"));

        settle().await;
        assert_eq!(*log.lock().unwrap(), vec!["now-1", "now-2", "fast", "slow"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_is_respected() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();

        ui.post_delayed(recorder(&log, "late"), Duration::from_millis(500));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(log.lock().unwrap().is_empty());

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(*log.lock().unwrap(), vec!["late"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_callbacks_cancels_one_job() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();

        let cancelled = ui.post_delayed(recorder(&log, "cancelled"), Duration::from_millis(50));
        ui.post_delayed(recorder(&log, "kept"), Duration::from_millis(50));
        ui.remove_callbacks(&cancelled);

        settle().await;
        assert_eq!(*log.lock().unwrap(), vec!["kept"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_by_token() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();
        let listener = ui.new_token();
        let other = ui.new_token();
        assert_ne!(listener, other);

        ui.post_delayed_with_token(&listener, recorder(&log, "a"), Duration::from_millis(10));
        ui.post_delayed_with_token(&listener, recorder(&log, "b"), Duration::from_millis(20));
        ui.post_delayed_with_token(&other, recorder(&log, "c"), Duration::from_millis(30));
        ui.post_delayed(recorder(&log, "d"), Duration::from_millis(40));
        ui.remove_callbacks_and_messages(Some(&listener));

        settle().await;
        assert_eq!(*log.lock().unwrap(), vec!["c", "d"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remove_all() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();
        let token = ui.new_token();

        ui.post_delayed(recorder(&log, "a"), Duration::from_millis(10));
        ui.post_delayed_with_token(&token, recorder(&log, "b"), Duration::from_millis(10));
        ui.remove_callbacks_and_messages(None);
        ui.post_delayed(recorder(&log, "after"), Duration::from_millis(10));

        settle().await;
        assert_eq!(*log.lock().unwrap(), vec!["after"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_panicking_job_does_not_stop_loop() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();

        ui.post(|| panic!("boom"));
        ui.post(recorder(&log, "survivor"));

        settle().await;
        assert_eq!(*log.lock().unwrap(), vec!["survivor"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_job_can_post_follow_up() {
        let ui = UiDispatcher::spawn();
        let log: Log = Arc::default();

        let inner_ui = ui.clone();
        let inner_log = Arc::clone(&log);
        ui.post(move || {
            inner_log.lock().unwrap().push("first");
            inner_ui.post_delayed(recorder(&inner_log, "second"), Duration::from_millis(10));
        });

        settle().await;
        assert_eq!(*log.lock().unwrap(), vec!["first", "second"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_dispatcher_drops_pending_jobs() {
        let ui = UiDispatcher::spawn();
        let witness = Arc::new(());

        let captured = Arc::clone(&witness);
        ui.post_delayed(move || drop(captured), Duration::from_secs(60));
        drop(ui);

        settle().await;
        assert_eq!(Arc::strong_count(&witness), 1);
    }
}
