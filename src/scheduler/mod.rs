// src/scheduler/mod.rs
//! Job registry and dispatch loop. Jobs pair a [`Trigger`] with a data
//! category; the scheduler owns one [`FetchTask`] per category and
//! fires the matching task whenever a job comes due. Due jobs run on
//! their own tokio tasks so a slow fetch never delays the tick.

pub mod trigger;

pub use trigger::Trigger;

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};

use crate::error::{Result, WatchError};
use crate::fetch::FetchTask;
use crate::types::Category;

/// A scheduled unit of work: refresh one category on one trigger.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub trigger: Trigger,
    next_run: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(id: &str, name: &str, category: Category, trigger: Trigger) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            category,
            trigger,
            next_run: None,
        }
    }
}

/// Read-only view of a registered job, for status output.
#[derive(Debug, Clone, Serialize)]
pub struct JobInfo {
    pub id: String,
    pub name: String,
    pub category: Category,
    pub trigger: String,
    pub next_run: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SchedulerState {
    Idle,
    Running,
    Stopped,
}

struct Registry {
    jobs: Vec<Job>,
    state: SchedulerState,
}

struct SchedulerInner {
    registry: Mutex<Registry>,
    tasks: HashMap<Category, Arc<FetchTask>>,
    shutdown: Notify,
    tick: Duration,
}

/// Drives registered jobs. Clones share the same registry and loop.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<SchedulerInner>,
}

impl Scheduler {
    /// The task map is fixed at construction; a job can only be
    /// registered for a category that has a task here. The tick is
    /// clamped to 1ms, since `tokio::time::interval` panics on a zero
    /// period.
    pub fn new(tasks: HashMap<Category, Arc<FetchTask>>, tick: Duration) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                registry: Mutex::new(Registry {
                    jobs: Vec::new(),
                    state: SchedulerState::Idle,
                }),
                tasks,
                shutdown: Notify::new(),
                tick: tick.max(Duration::from_millis(1)),
            }),
        }
    }

    /// Adds a job, or replaces the existing job with the same id in
    /// place. Registration order is preserved; [`run_initial_pass`]
    /// relies on it.
    ///
    /// [`run_initial_pass`]: Scheduler::run_initial_pass
    pub async fn register(&self, mut job: Job) -> Result<()> {
        if !self.inner.tasks.contains_key(&job.category) {
            return Err(WatchError::ConfigError(format!(
                "No fetch task wired for category '{}' (job '{}')",
                job.category, job.id
            )));
        }
        job.next_run = job.trigger.next_after(Utc::now());
        if job.next_run.is_none() {
            warn!("Job '{}' has a trigger that will never fire", job.id);
        }

        let mut registry = self.inner.registry.lock().await;
        match registry.jobs.iter().position(|j| j.id == job.id) {
            Some(idx) => {
                info!("Replacing job '{}' ({})", job.id, job.trigger.describe());
                registry.jobs[idx] = job;
            }
            None => {
                debug!("Registered job '{}' ({})", job.id, job.trigger.describe());
                registry.jobs.push(job);
            }
        }
        Ok(())
    }

    /// Starts the dispatch loop. Fails if already running, and a
    /// stopped scheduler stays stopped.
    pub async fn start(&self) -> Result<()> {
        let mut registry = self.inner.registry.lock().await;
        match registry.state {
            SchedulerState::Running => Err(WatchError::SchedulerAlreadyStarted),
            SchedulerState::Stopped => Err(WatchError::SchedulerStopped),
            SchedulerState::Idle => {
                registry.state = SchedulerState::Running;
                info!(
                    "Scheduler started with {} jobs (tick {:?})",
                    registry.jobs.len(),
                    self.inner.tick
                );
                let inner = self.inner.clone();
                tokio::spawn(async move { inner.run_loop().await });
                Ok(())
            }
        }
    }

    /// Stops the dispatch loop. In-flight fetches are not cancelled.
    /// Safe to call more than once.
    pub async fn stop(&self) {
        let mut registry = self.inner.registry.lock().await;
        match registry.state {
            SchedulerState::Running => {
                registry.state = SchedulerState::Stopped;
                self.inner.shutdown.notify_one();
                info!("Scheduler stopped; in-flight fetches will run to completion");
            }
            SchedulerState::Stopped => debug!("Scheduler already stopped"),
            SchedulerState::Idle => debug!("Scheduler was never started; nothing to stop"),
        }
    }

    /// Runs one job's fetch immediately and waits for it to finish.
    /// The job's scheduled `next_run` is left untouched. Unknown ids
    /// are an error; on a scheduler that is not running the call is
    /// accepted but does nothing.
    pub async fn trigger_now(&self, job_id: &str) -> Result<()> {
        let (category, running) = {
            let registry = self.inner.registry.lock().await;
            let job = registry
                .jobs
                .iter()
                .find(|j| j.id == job_id)
                .ok_or_else(|| WatchError::JobNotFound(job_id.to_string()))?;
            (job.category, registry.state == SchedulerState::Running)
        };
        if !running {
            warn!("Manual trigger of '{}' ignored; scheduler is not running", job_id);
            return Ok(());
        }
        if let Some(task) = self.inner.tasks.get(&category) {
            info!("Manually triggering job '{}' ({})", job_id, category);
            task.run().await;
        }
        Ok(())
    }

    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        let registry = self.inner.registry.lock().await;
        registry
            .jobs
            .iter()
            .map(|job| JobInfo {
                id: job.id.clone(),
                name: job.name.clone(),
                category: job.category,
                trigger: job.trigger.describe(),
                next_run: job.next_run,
            })
            .collect()
    }

    pub async fn is_running(&self) -> bool {
        self.inner.registry.lock().await.state == SchedulerState::Running
    }

    /// Fetches every registered category once, sequentially, in job
    /// registration order. Derived categories should be registered
    /// after their sources so they see fresh data on the first pass.
    pub async fn run_initial_pass(&self) {
        let ordered: Vec<(Category, Arc<FetchTask>)> = {
            let registry = self.inner.registry.lock().await;
            let mut seen: Vec<Category> = Vec::new();
            let mut ordered = Vec::new();
            for job in &registry.jobs {
                if seen.contains(&job.category) {
                    continue;
                }
                seen.push(job.category);
                if let Some(task) = self.inner.tasks.get(&job.category) {
                    ordered.push((job.category, task.clone()));
                }
            }
            ordered
        };

        info!("Running initial data pass over {} categories...", ordered.len());
        let started = std::time::Instant::now();
        for (category, task) in ordered {
            debug!("Initial fetch for {}", category);
            task.run().await;
        }
        info!("Initial data pass complete in {:?}", started.elapsed());
    }
}

impl SchedulerInner {
    async fn run_loop(self: Arc<Self>) {
        let mut interval = tokio::time::interval(self.tick);
        loop {
            tokio::select! {
                _ = interval.tick() => self.dispatch_due().await,
                _ = self.shutdown.notified() => break,
            }
        }
        debug!("Scheduler loop exited");
    }

    /// Advances `next_run` for every due job under the lock, then
    /// spawns the fetches outside it.
    async fn dispatch_due(&self) {
        let now = Utc::now();
        let mut due: Vec<(String, Category)> = Vec::new();
        {
            let mut registry = self.registry.lock().await;
            if registry.state != SchedulerState::Running {
                return;
            }
            for job in registry.jobs.iter_mut() {
                if let Some(next) = job.next_run {
                    if next <= now {
                        job.next_run = job.trigger.next_after(now);
                        due.push((job.id.clone(), job.category));
                    }
                }
            }
        }
        for (id, category) in due {
            if let Some(task) = self.tasks.get(&category) {
                debug!("Firing job '{}' ({})", id, category);
                let task = task.clone();
                tokio::spawn(async move { task.run().await });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::VolatileCache;
    use crate::fetch::sources::StaticFetcher;
    use crate::metrics::FetchMetrics;
    use crate::snapshot::SnapshotStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use tempfile::TempDir;

    fn scheduler_fixture() -> (TempDir, Scheduler) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SnapshotStore::open(dir.path()).unwrap());
        let cache = Arc::new(VolatileCache::new(60));
        let metrics = Arc::new(FetchMetrics::new());
        let fetcher = Arc::new(StaticFetcher::new(
            "static-stocks",
            Category::Stocks,
            json!([{"symbol": "NFLX"}]),
        ));
        let task = Arc::new(FetchTask::new(
            fetcher,
            store,
            cache,
            metrics,
            Duration::from_secs(5),
            60,
        ));
        let mut tasks = HashMap::new();
        tasks.insert(Category::Stocks, task);
        (dir, Scheduler::new(tasks, Duration::from_millis(20)))
    }

    fn stock_job(id: &str, trigger: Trigger) -> Job {
        Job::new(id, "Fetch Stock Prices", Category::Stocks, trigger)
    }

    #[tokio::test]
    async fn register_replaces_jobs_by_id() {
        let (_dir, scheduler) = scheduler_fixture();
        scheduler
            .register(stock_job("fetch_stocks", Trigger::every_minutes(15)))
            .await
            .unwrap();
        scheduler
            .register(stock_job("fetch_stocks", Trigger::every_hours(1)))
            .await
            .unwrap();

        let jobs = scheduler.list_jobs().await;
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].trigger, "every 1h");
        assert!(jobs[0].next_run.is_some());
    }

    #[tokio::test]
    async fn register_rejects_categories_without_a_task() {
        let (_dir, scheduler) = scheduler_fixture();
        let err = scheduler
            .register(Job::new(
                "fetch_news",
                "Fetch News",
                Category::News,
                Trigger::every_minutes(30),
            ))
            .await
            .unwrap_err();
        assert!(matches!(err, WatchError::ConfigError(_)));
    }

    #[tokio::test]
    async fn start_twice_is_an_error() {
        let (_dir, scheduler) = scheduler_fixture();
        scheduler.start().await.unwrap();
        let err = scheduler.start().await.unwrap_err();
        assert!(matches!(err, WatchError::SchedulerAlreadyStarted));
        scheduler.stop().await;
    }

    #[tokio::test]
    async fn a_stopped_scheduler_cannot_be_restarted() {
        let (_dir, scheduler) = scheduler_fixture();
        scheduler.start().await.unwrap();
        scheduler.stop().await;
        let err = scheduler.start().await.unwrap_err();
        assert!(matches!(err, WatchError::SchedulerStopped));
    }

    #[tokio::test]
    async fn stop_is_idempotent() {
        let (_dir, scheduler) = scheduler_fixture();
        scheduler.start().await.unwrap();
        scheduler.stop().await;
        scheduler.stop().await;
        assert!(!scheduler.is_running().await);
    }

    #[tokio::test]
    async fn trigger_now_rejects_unknown_job_ids() {
        let (_dir, scheduler) = scheduler_fixture();
        let err = scheduler.trigger_now("no_such_job").await.unwrap_err();
        assert!(matches!(err, WatchError::JobNotFound(_)));
    }

    #[tokio::test]
    async fn trigger_now_is_inert_before_start() {
        let (_dir, scheduler) = scheduler_fixture();
        scheduler
            .register(stock_job("fetch_stocks", Trigger::every_minutes(15)))
            .await
            .unwrap();
        // Accepted, but no fetch runs while the scheduler is idle.
        scheduler.trigger_now("fetch_stocks").await.unwrap();
    }
}
