//! Fixed-interval polling on a single dedicated worker.

use crate::error::{ConfigError, Result};
use crate::notify::watcher::{PollOutcome, Watcher};
use crate::sources::Fetcher;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{Instant, sleep_until};
use tracing::{debug, error, info};

#[cfg(feature = "metrics")]
use crate::metrics::PollMetrics;

/// Name of the background thread that runs all polls for one scheduler.
pub const WORKER_THREAD_NAME: &str = "polled-config-worker";

/// When and how often a task is polled.
///
/// # Examples
///
/// ```rust
/// use polled_config::notify::Schedule;
/// use std::time::Duration;
///
/// // First poll after 30 seconds, then every 30 seconds.
/// let delayed = Schedule::every(Duration::from_secs(30));
/// assert_eq!(delayed.initial_delay(), Duration::from_secs(30));
///
/// // First poll right away.
/// let eager = Schedule::every(Duration::from_secs(30)).immediately();
/// assert_eq!(eager.initial_delay(), Duration::ZERO);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schedule {
    interval: Duration,
    immediate: bool,
}

impl Schedule {
    /// Poll every `interval`, starting one interval from registration.
    pub fn every(interval: Duration) -> Self {
        Self {
            interval,
            immediate: false,
        }
    }

    /// Run the first poll as soon as the task is registered.
    pub fn immediately(mut self) -> Self {
        self.immediate = true;
        self
    }

    /// Time between polls.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time from registration to the first poll.
    pub fn initial_delay(&self) -> Duration {
        if self.immediate {
            Duration::ZERO
        } else {
            self.interval
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.interval.is_zero() {
            return Err(ConfigError::InvalidSource(
                "Poll interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Something the scheduler can run once per tick.
///
/// [`Watcher`] is the implementation used for configuration sources.
#[async_trait]
pub trait PollTask: Send {
    /// Run one poll step. Must not panic on source errors.
    async fn tick(&mut self) -> PollOutcome;

    /// Get a human-readable name for this task (for logging/debugging).
    fn name(&self) -> String;
}

enum Command {
    Register {
        task: Box<dyn PollTask>,
        schedule: Schedule,
    },
    Shutdown,
}

/// Runs registered poll tasks at fixed intervals on one background thread.
///
/// Every poll, and every listener notification a poll triggers, runs on
/// the same worker, so they never overlap. A slow poll delays all other
/// tasks. Late tasks do not burst to catch up: after an overrun the next
/// poll is due at `max(previous due + interval, now)`.
///
/// # Examples
///
/// ```rust,no_run
/// use polled_config::core::ConfigManager;
/// use polled_config::notify::{Schedule, Scheduler, Watcher};
/// use polled_config::sources::LocalFileFetcher;
/// use std::time::Duration;
///
/// # fn example() -> polled_config::error::Result<()> {
/// let manager = ConfigManager::new();
/// let scheduler = Scheduler::start()?;
///
/// let watcher = Watcher::new(LocalFileFetcher::new("/etc/myapp", "config.json"), &manager);
/// scheduler.register_watcher(watcher, Schedule::every(Duration::from_secs(5)).immediately())?;
///
/// // Later: wait for the in-flight poll, then stop.
/// scheduler.shutdown();
/// # Ok(())
/// # }
/// ```
pub struct Scheduler {
    commands: mpsc::UnboundedSender<Command>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    running: Arc<AtomicBool>,
}

impl Scheduler {
    /// Start the worker thread with no tasks registered.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime or thread cannot be created.
    pub fn start() -> Result<Self> {
        Self::spawn(WorkerMetrics::default())
    }

    /// Start the worker thread, recording every poll into `metrics`.
    #[cfg(feature = "metrics")]
    pub fn start_with_metrics(metrics: PollMetrics) -> Result<Self> {
        Self::spawn(Some(metrics))
    }

    fn spawn(metrics: WorkerMetrics) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConfigError::Scheduler(format!("Failed to create runtime: {}", e)))?;

        let (commands, receiver) = mpsc::unbounded_channel();
        let running = Arc::new(AtomicBool::new(true));
        let worker = Worker {
            commands: receiver,
            metrics,
        };

        let flag = Arc::clone(&running);
        let handle = thread::Builder::new()
            .name(WORKER_THREAD_NAME.to_string())
            .spawn(move || {
                runtime.block_on(worker.run());
                flag.store(false, Ordering::Release);
            })
            .map_err(|e| ConfigError::Scheduler(format!("Failed to spawn worker thread: {}", e)))?;

        info!("Config poller started");

        Ok(Self {
            commands,
            worker: Mutex::new(Some(handle)),
            running,
        })
    }

    /// Register a task to be polled on `schedule`.
    ///
    /// # Errors
    ///
    /// Returns an error if the interval is zero or the scheduler has stopped.
    pub fn register(&self, task: Box<dyn PollTask>, schedule: Schedule) -> Result<()> {
        schedule.validate()?;
        self.commands
            .send(Command::Register { task, schedule })
            .map_err(|_| ConfigError::Scheduler("Scheduler has been shut down".to_string()))
    }

    /// Register a watcher to be polled on `schedule`.
    pub fn register_watcher<F>(&self, watcher: Watcher<F>, schedule: Schedule) -> Result<()>
    where
        F: Fetcher + 'static,
    {
        self.register(Box::new(watcher), schedule)
    }

    /// Whether the worker is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Stop polling.
    ///
    /// No new poll starts after this call. A poll that is already running
    /// finishes first; this method blocks until it has. When called from the
    /// worker itself (for example inside a listener) it only signals and
    /// returns, and the worker stops once the current poll completes.
    pub fn shutdown(&self) {
        let _ = self.commands.send(Command::Shutdown);

        let handle = match self.worker.lock() {
            Ok(mut worker) => worker.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        };
        let Some(handle) = handle else {
            return;
        };

        if handle.thread().id() == thread::current().id() {
            return;
        }
        if handle.join().is_err() {
            error!("Config poller thread panicked");
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        let _ = self.commands.send(Command::Shutdown);
    }
}

struct Scheduled {
    task: Box<dyn PollTask>,
    interval: Duration,
    next_due: Instant,
}

#[cfg(feature = "metrics")]
type WorkerMetrics = Option<PollMetrics>;
#[cfg(not(feature = "metrics"))]
type WorkerMetrics = ();

struct Worker {
    commands: mpsc::UnboundedReceiver<Command>,
    metrics: WorkerMetrics,
}

impl Worker {
    async fn run(self) {
        let mut commands = self.commands;
        let mut tasks: Vec<Scheduled> = Vec::new();

        loop {
            let next = next_due(&tasks);

            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    Some(Command::Register { task, schedule }) => {
                        debug!(task = %task.name(), interval = ?schedule.interval(), "Registered poll task");
                        tasks.push(Scheduled {
                            task,
                            interval: schedule.interval(),
                            next_due: Instant::now() + schedule.initial_delay(),
                        });
                    }
                    Some(Command::Shutdown) | None => break,
                },

                () = sleep_until_due(next.map(|(_, due)| due)) => {
                    if let Some((index, _)) = next {
                        let scheduled = &mut tasks[index];
                        let started = Instant::now();
                        let outcome = scheduled.task.tick().await;
                        let elapsed = started.elapsed();
                        debug!(task = %scheduled.task.name(), ?outcome, ?elapsed, "Poll finished");
                        record_poll(&self.metrics, outcome, elapsed);

                        scheduled.next_due = (scheduled.next_due + scheduled.interval).max(Instant::now());
                    }
                }
            }
        }

        info!(tasks = tasks.len(), "Config poller stopped");
    }
}

#[cfg(feature = "metrics")]
fn record_poll(metrics: &WorkerMetrics, outcome: PollOutcome, elapsed: Duration) {
    if let Some(metrics) = metrics {
        metrics.record_poll(outcome, elapsed);
    }
}

#[cfg(not(feature = "metrics"))]
fn record_poll(_metrics: &WorkerMetrics, _outcome: PollOutcome, _elapsed: Duration) {}

/// Earliest due task; ties go to the task registered first.
fn next_due(tasks: &[Scheduled]) -> Option<(usize, Instant)> {
    tasks
        .iter()
        .enumerate()
        .min_by_key(|(index, scheduled)| (scheduled.next_due, *index))
        .map(|(index, scheduled)| (index, scheduled.next_due))
}

async fn sleep_until_due(due: Option<Instant>) {
    match due {
        Some(due) => sleep_until(due).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc as std_mpsc;

    /// Reports each tick on a channel.
    struct CountingTask {
        id: usize,
        ticks: std_mpsc::Sender<usize>,
        delay: Duration,
    }

    #[async_trait]
    impl PollTask for CountingTask {
        async fn tick(&mut self) -> PollOutcome {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            let _ = self.ticks.send(self.id);
            PollOutcome::Unchanged
        }

        fn name(&self) -> String {
            format!("counting-{}", self.id)
        }
    }

    fn counting_task(id: usize, ticks: &std_mpsc::Sender<usize>) -> Box<dyn PollTask> {
        Box::new(CountingTask {
            id,
            ticks: ticks.clone(),
            delay: Duration::ZERO,
        })
    }

    #[test]
    fn test_schedule_initial_delay() {
        let schedule = Schedule::every(Duration::from_millis(250));
        assert_eq!(schedule.interval(), Duration::from_millis(250));
        assert_eq!(schedule.initial_delay(), Duration::from_millis(250));
        assert_eq!(schedule.immediately().initial_delay(), Duration::ZERO);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let scheduler = Scheduler::start().unwrap();
        let (ticks, _rx) = std_mpsc::channel();

        let result = scheduler.register(counting_task(0, &ticks), Schedule::every(Duration::ZERO));
        assert!(matches!(result, Err(ConfigError::InvalidSource(_))));
        scheduler.shutdown();
    }

    #[test]
    fn test_immediate_task_runs_repeatedly() {
        let scheduler = Scheduler::start().unwrap();
        let (ticks, rx) = std_mpsc::channel();

        scheduler
            .register(counting_task(7, &ticks), Schedule::every(Duration::from_millis(20)).immediately())
            .unwrap();

        for _ in 0..3 {
            assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), 7);
        }
        scheduler.shutdown();
    }

    #[test]
    fn test_delayed_start_waits_one_interval() {
        let scheduler = Scheduler::start().unwrap();
        let (ticks, rx) = std_mpsc::channel();

        let registered = std::time::Instant::now();
        scheduler
            .register(counting_task(1, &ticks), Schedule::every(Duration::from_millis(200)))
            .unwrap();

        rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert!(registered.elapsed() >= Duration::from_millis(200));
        scheduler.shutdown();
    }

    #[test]
    fn test_tasks_never_overlap() {
        let scheduler = Scheduler::start().unwrap();
        let (ticks, rx) = std_mpsc::channel();
        let active = Arc::new(AtomicBool::new(false));

        struct Exclusive {
            active: Arc<AtomicBool>,
            ticks: std_mpsc::Sender<bool>,
        }

        #[async_trait]
        impl PollTask for Exclusive {
            async fn tick(&mut self) -> PollOutcome {
                let overlapped = self.active.swap(true, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(15)).await;
                self.active.store(false, Ordering::SeqCst);
                let _ = self.ticks.send(overlapped);
                PollOutcome::Unchanged
            }

            fn name(&self) -> String {
                "exclusive".to_string()
            }
        }

        for _ in 0..2 {
            scheduler
                .register(
                    Box::new(Exclusive {
                        active: Arc::clone(&active),
                        ticks: ticks.clone(),
                    }),
                    Schedule::every(Duration::from_millis(5)).immediately(),
                )
                .unwrap();
        }

        for _ in 0..6 {
            assert!(!rx.recv_timeout(Duration::from_secs(2)).unwrap());
        }
        scheduler.shutdown();
    }

    #[test]
    fn test_shutdown_waits_for_in_flight_poll() {
        let scheduler = Scheduler::start().unwrap();
        let (ticks, rx) = std_mpsc::channel();

        scheduler
            .register(
                Box::new(CountingTask {
                    id: 3,
                    ticks,
                    delay: Duration::from_millis(200),
                }),
                Schedule::every(Duration::from_secs(60)).immediately(),
            )
            .unwrap();

        // Let the poll start, then stop while it is sleeping.
        thread::sleep(Duration::from_millis(50));
        scheduler.shutdown();

        assert_eq!(rx.try_recv().unwrap(), 3);
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_register_after_shutdown_fails() {
        let scheduler = Scheduler::start().unwrap();
        scheduler.shutdown();

        let (ticks, _rx) = std_mpsc::channel();
        let result = scheduler.register(counting_task(0, &ticks), Schedule::every(Duration::from_secs(1)));
        assert!(matches!(result, Err(ConfigError::Scheduler(_))));
    }

    #[test]
    fn test_shutdown_is_idempotent() {
        let scheduler = Scheduler::start().unwrap();
        assert!(scheduler.is_running());
        scheduler.shutdown();
        scheduler.shutdown();
        assert!(!scheduler.is_running());
    }

    #[test]
    fn test_next_due_prefers_earliest_then_first_registered() {
        let now = Instant::now();
        let (ticks, _rx) = std_mpsc::channel();
        let tasks = vec![
            Scheduled {
                task: counting_task(0, &ticks),
                interval: Duration::from_secs(1),
                next_due: now + Duration::from_secs(2),
            },
            Scheduled {
                task: counting_task(1, &ticks),
                interval: Duration::from_secs(1),
                next_due: now + Duration::from_secs(1),
            },
            Scheduled {
                task: counting_task(2, &ticks),
                interval: Duration::from_secs(1),
                next_due: now + Duration::from_secs(1),
            },
        ];

        assert_eq!(next_due(&tasks).map(|(index, _)| index), Some(1));
        assert!(next_due(&[]).is_none());
    }
}
