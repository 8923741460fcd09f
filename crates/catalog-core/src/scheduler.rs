//! Periodic source runs
//!
//! Every source gets its own timer task. A tick that fires while the
//! previous run of the same source is still in flight is dropped. Stopping
//! the scheduler aborts in-flight runs, which then record `failed` with
//! reason "shutdown".

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::MissedTickBehavior;

use crate::engine::SyncEngine;

struct Running {
    shutdown: watch::Sender<bool>,
    tasks: JoinSet<()>,
}

/// Drives a [`SyncEngine`] on each source's interval.
///
/// Call [`stop`](Self::stop) before dropping a started scheduler; dropping it
/// stops the timers but leaves in-flight runs to finish on their own.
pub struct Scheduler {
    engine: Arc<SyncEngine>,
    running: Option<Running>,
}

impl Scheduler {
    pub fn new(engine: Arc<SyncEngine>) -> Self {
        Self {
            engine,
            running: None,
        }
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start one timer per source. The first run of every source fires
    /// immediately. Calling `start` on a running scheduler does nothing.
    pub fn start(&mut self) {
        if self.running.is_some() {
            return;
        }

        let (shutdown, _) = watch::channel(false);
        let mut tasks = JoinSet::new();
        for source in self.engine.sources() {
            let engine = Arc::clone(&self.engine);
            let source_id = source.id.clone();
            let period = source.interval.as_duration();
            tasks.spawn(drive(engine, source_id, period, shutdown.subscribe()));
        }

        tracing::info!(sources = tasks.len(), "scheduler started");
        self.running = Some(Running { shutdown, tasks });
    }

    /// Stop every timer, abort in-flight runs and wait for all of it to
    /// settle. No source is left `running` afterwards.
    pub async fn stop(&mut self) {
        let Some(mut running) = self.running.take() else {
            return;
        };

        let _ = running.shutdown.send(true);
        while let Some(joined) = running.tasks.join_next().await {
            if let Err(e) = joined {
                tracing::error!(error = %e, "scheduler task panicked");
            }
        }
        // Abandoned runs were only recorded in memory
        self.engine.tracker().persist().await;
        tracing::info!("scheduler stopped");
    }
}

async fn drive(
    engine: Arc<SyncEngine>,
    source_id: String,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut current: Option<JoinHandle<()>> = None;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                if current.as_ref().is_some_and(|run| !run.is_finished()) {
                    tracing::debug!(source_id = %source_id, "tick dropped, previous run still in flight");
                    continue;
                }
                let engine = Arc::clone(&engine);
                let id = source_id.clone();
                current = Some(tokio::spawn(async move {
                    if let Err(e) = engine.run_source(&id).await {
                        tracing::debug!(source_id = %id, error = %e, "run not started");
                    }
                }));
            }
            _ = shutdown.changed() => break,
        }
    }

    if let Some(run) = current
        && !run.is_finished()
    {
        run.abort();
        let _ = run.await;
    }
    tracing::debug!(source_id = %source_id, "source timer stopped");
}
