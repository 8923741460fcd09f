//! Per-source run status
//!
//! The tracker is pure bookkeeping: runs report their transitions here and
//! operators read the result. Every transition is also broadcast as a
//! [`StatusEvent`]. With persistence enabled, [`StatusTracker::persist`]
//! writes the board to `status.json`; every terminal transition bumps a
//! generation so an older snapshot never overwrites a newer one.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use catalog_fs::NormalizedPath;
use catalog_fs::io::write_atomic;
use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::time::Instant;

use crate::Result;

/// Capacity of the status event channel. Slow subscribers miss events
/// rather than slowing down runs.
const EVENT_CAPACITY: usize = 256;

/// Lifecycle state of a source.
///
/// A finished run leaves the source in `completed` or `failed` until the
/// next run starts; a source never goes back to `idle` within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceState {
    /// No run has happened in this process yet
    Idle,
    Running,
    Completed,
    Failed,
}

impl std::fmt::Display for SourceState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceState::Idle => "idle",
            SourceState::Running => "running",
            SourceState::Completed => "completed",
            SourceState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// What operators see for one source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceStatus {
    pub source_id: String,
    pub status: SourceState,
    /// End of the last completed run
    pub last_sync: Option<DateTime<Utc>>,
    /// Start of the most recent run, whatever its outcome
    pub last_run_at: Option<DateTime<Utc>>,
    /// Distinct components upserted by the last completed run
    pub components_count: usize,
    /// Wall-clock duration of the most recent run
    pub duration_ms: Option<u64>,
    pub last_error: Option<String>,
    /// Commit observed by the last completed run of a git source
    pub revision: Option<String>,
}

impl SourceStatus {
    pub fn new(source_id: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            status: SourceState::Idle,
            last_sync: None,
            last_run_at: None,
            components_count: 0,
            duration_ms: None,
            last_error: None,
            revision: None,
        }
    }

    pub fn duration(&self) -> Option<Duration> {
        self.duration_ms.map(Duration::from_millis)
    }
}

/// A status transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    Started {
        source_id: String,
    },
    Completed {
        source_id: String,
        components_count: usize,
        last_error: Option<String>,
    },
    Failed {
        source_id: String,
        error: String,
    },
}

impl StatusEvent {
    pub fn source_id(&self) -> &str {
        match self {
            StatusEvent::Started { source_id }
            | StatusEvent::Completed { source_id, .. }
            | StatusEvent::Failed { source_id, .. } => source_id,
        }
    }
}

/// Outcome of a successful run, as recorded by [`StatusTracker::complete`].
#[derive(Debug, Clone, Default)]
pub struct Completion {
    pub components_count: usize,
    /// Summary of manifest failures, if any
    pub last_error: Option<String>,
    pub revision: Option<String>,
}

/// Proof that a run was admitted by [`StatusTracker::try_begin`].
#[derive(Debug)]
pub struct RunTicket {
    source_id: String,
    started: Instant,
}

impl RunTicket {
    pub fn source_id(&self) -> &str {
        &self.source_id
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

/// Where the board is written, and the newest generation written there.
struct Persistence {
    path: NormalizedPath,
    written: Mutex<u64>,
}

impl Persistence {
    fn write(&self, generation: u64, snapshot: &[SourceStatus]) -> Result<()> {
        let mut written = self.written.lock();
        if generation <= *written {
            return Ok(());
        }
        save_snapshot(&self.path, snapshot)?;
        *written = generation;
        Ok(())
    }
}

/// Tracks the status of every configured source.
pub struct StatusTracker {
    statuses: RwLock<BTreeMap<String, SourceStatus>>,
    /// Bumped under the `statuses` write lock on every terminal transition
    generation: AtomicU64,
    events: broadcast::Sender<StatusEvent>,
    persistence: Option<Arc<Persistence>>,
}

impl StatusTracker {
    /// A tracker with one idle entry per source id.
    pub fn new<I, S>(source_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let statuses = source_ids
            .into_iter()
            .map(|id| {
                let id = id.into();
                (id.clone(), SourceStatus::new(id))
            })
            .collect();
        let (events, _) = broadcast::channel(EVENT_CAPACITY);

        Self {
            statuses: RwLock::new(statuses),
            generation: AtomicU64::new(0),
            events,
            persistence: None,
        }
    }

    /// Let [`persist`](Self::persist) write snapshots to `path`.
    pub fn with_persistence(mut self, path: NormalizedPath) -> Self {
        self.persistence = Some(Arc::new(Persistence {
            path,
            written: Mutex::new(0),
        }));
        self
    }

    /// Add an idle entry for `source_id` unless one exists.
    pub fn register(&self, source_id: &str) {
        self.statuses
            .write()
            .entry(source_id.to_string())
            .or_insert_with(|| SourceStatus::new(source_id));
    }

    /// Carry over bookkeeping from a previous process.
    ///
    /// Only known sources are restored, and their state stays `idle`.
    pub fn restore(&self, previous: Vec<SourceStatus>) {
        let mut statuses = self.statuses.write();
        for old in previous {
            if let Some(current) = statuses.get_mut(&old.source_id) {
                *current = SourceStatus {
                    status: SourceState::Idle,
                    ..old
                };
            }
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.events.subscribe()
    }

    pub fn get(&self, source_id: &str) -> Option<SourceStatus> {
        self.statuses.read().get(source_id).cloned()
    }

    /// Every status, ordered by source id.
    pub fn all(&self) -> Vec<SourceStatus> {
        self.statuses.read().values().cloned().collect()
    }

    pub fn is_running(&self, source_id: &str) -> bool {
        self.statuses
            .read()
            .get(source_id)
            .is_some_and(|s| s.status == SourceState::Running)
    }

    /// Move `source_id` to `running`.
    ///
    /// Returns `None` when the source is unknown or a run is already in
    /// flight; the caller must then not start a run.
    pub fn try_begin(&self, source_id: &str) -> Option<RunTicket> {
        {
            let mut statuses = self.statuses.write();
            let status = statuses.get_mut(source_id)?;
            if status.status == SourceState::Running {
                return None;
            }
            status.status = SourceState::Running;
            status.last_run_at = Some(Utc::now());
        }

        self.publish(StatusEvent::Started {
            source_id: source_id.to_string(),
        });
        Some(RunTicket {
            source_id: source_id.to_string(),
            started: Instant::now(),
        })
    }

    /// Record a completed run. `last_error` is replaced by the completion's
    /// summary, which clears it when the run had no manifest failures.
    pub fn complete(&self, ticket: RunTicket, completion: Completion) {
        let elapsed = ticket.elapsed();
        self.finish(&ticket.source_id, |status| {
            status.status = SourceState::Completed;
            status.last_sync = Some(Utc::now());
            status.components_count = completion.components_count;
            status.duration_ms = Some(duration_ms(elapsed));
            status.last_error = completion.last_error.clone();
            if completion.revision.is_some() {
                status.revision = completion.revision.clone();
            }
        });

        self.publish(StatusEvent::Completed {
            source_id: ticket.source_id,
            components_count: completion.components_count,
            last_error: completion.last_error,
        });
    }

    /// Record a failed run. `lastSync`, `componentsCount` and `revision`
    /// keep the values of the last completed run.
    pub fn fail(&self, ticket: RunTicket, error: impl Into<String>) {
        let error = error.into();
        let elapsed = ticket.elapsed();
        self.finish(&ticket.source_id, |status| {
            status.status = SourceState::Failed;
            status.duration_ms = Some(duration_ms(elapsed));
            status.last_error = Some(error.clone());
        });

        self.publish(StatusEvent::Failed {
            source_id: ticket.source_id,
            error,
        });
    }

    fn finish(&self, source_id: &str, update: impl FnOnce(&mut SourceStatus)) {
        let mut statuses = self.statuses.write();
        if let Some(status) = statuses.get_mut(source_id) {
            update(status);
        }
        self.generation.fetch_add(1, Ordering::AcqRel);
    }

    /// Write the current board to `status.json` on the blocking pool.
    ///
    /// Writes land in generation order: a snapshot older than the last one
    /// written is skipped. Dropping the returned future does not cancel the
    /// write. Does nothing without persistence.
    pub async fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        let (generation, snapshot) = {
            let statuses = self.statuses.read();
            (
                self.generation.load(Ordering::Acquire),
                statuses.values().cloned().collect::<Vec<_>>(),
            )
        };

        let writer = Arc::clone(persistence);
        let written =
            tokio::task::spawn_blocking(move || writer.write(generation, &snapshot)).await;
        match written {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::warn!(path = %persistence.path, error = %e, "failed to persist source status");
            }
            Err(e) => {
                tracing::warn!(path = %persistence.path, error = %e, "status writer task failed");
            }
        }
    }

    fn publish(&self, event: StatusEvent) {
        // No subscribers is not an error
        let _ = self.events.send(event);
    }
}

/// Read a status snapshot written by a (possibly different) process.
pub fn load_snapshot(path: &NormalizedPath) -> Result<Vec<SourceStatus>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = catalog_fs::io::read_text(path)?;
    Ok(serde_json::from_str(&content)?)
}

fn save_snapshot(path: &NormalizedPath, snapshot: &[SourceStatus]) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(snapshot)?;
    write_atomic(path, &bytes)?;
    Ok(())
}

fn duration_ms(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
