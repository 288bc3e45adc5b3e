//! Upload job tracking and progress delivery
//!
//! One registry per process owns every job's lifecycle: coarse status
//! (`pending → processing → uploading → completed | failed`), fine-grained
//! pipeline phase, per-file counters, and the subscribers watching it all.
//!
//! Delivery is best-effort pub/sub: each subscriber holds the receiving
//! end of a channel, and a send that fails (receiver gone) prunes that
//! subscriber without disturbing the rest. Jobs are swept out after a
//! fixed TTL whether or not they finished; consumers are expected to
//! observe a job's stream at most once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, warn};
use uuid::Uuid;

/// Configuration for the job registry
#[derive(Debug, Clone)]
pub struct JobRegistryConfig {
    /// How long a job is retained after creation, terminal or not
    pub job_ttl: Duration,
    /// How often expired jobs are swept out
    pub sweep_interval: Duration,
    /// Pause between the final progress frame and the terminal event
    pub terminal_event_delay: Duration,
}

impl Default for JobRegistryConfig {
    fn default() -> Self {
        Self {
            job_ttl: Duration::from_secs(3600),
            sweep_interval: Duration::from_secs(60),
            terminal_event_delay: Duration::from_millis(250),
        }
    }
}

/// Coarse job state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Uploading,
    Completed,
    Failed,
}

/// Fine-grained pipeline stage, independent of coarse status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadPhase {
    Validating,
    Compressing,
    Uploading,
    CreatingManifest,
    Finalizing,
    Done,
}

/// Per-file progress counters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobProgress {
    pub files_processed: u32,
    pub total_files: u32,
    pub files_uploaded: u32,
    pub files_reused: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_file_status: Option<String>,
    pub phase: UploadPhase,
}

impl JobProgress {
    fn new(total_files: u32) -> Self {
        Self {
            files_processed: 0,
            total_files,
            files_uploaded: 0,
            files_reused: 0,
            current_file: None,
            current_file_status: None,
            phase: UploadPhase::Validating,
        }
    }
}

/// One tracked upload job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadJob {
    pub id: String,
    pub did: String,
    pub site_name: String,
    pub status: JobStatus,
    pub progress: JobProgress,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Partial update merged into a job
#[derive(Debug, Clone, Default)]
pub struct JobUpdate {
    pub status: Option<JobStatus>,
    pub progress: Option<ProgressUpdate>,
    pub result: Option<Value>,
    pub error: Option<String>,
}

/// Partial update merged into a job's progress counters
#[derive(Debug, Clone, Default)]
pub struct ProgressUpdate {
    pub files_processed: Option<u32>,
    pub total_files: Option<u32>,
    pub files_uploaded: Option<u32>,
    pub files_reused: Option<u32>,
    pub current_file: Option<String>,
    pub current_file_status: Option<String>,
    pub phase: Option<UploadPhase>,
}

impl ProgressUpdate {
    pub fn phase(phase: UploadPhase) -> Self {
        Self {
            phase: Some(phase),
            ..Self::default()
        }
    }
}

/// Events delivered to job subscribers
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JobEvent {
    /// Snapshot after every update
    Progress {
        status: JobStatus,
        progress: JobProgress,
        #[serde(skip_serializing_if = "Option::is_none")]
        result: Option<Value>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    /// Terminal success, carrying the job result
    Done { result: Option<Value> },
    /// Terminal failure
    Error { message: String },
}

struct TrackedJob {
    job: UploadJob,
    created: Instant,
}

struct Listener {
    id: u64,
    tx: mpsc::UnboundedSender<JobEvent>,
}

struct RegistryInner {
    jobs: Mutex<HashMap<String, TrackedJob>>,
    listeners: Mutex<HashMap<String, Vec<Listener>>>,
    next_listener_id: AtomicU64,
}

/// Removes its listener when dropped, leaving the rest of the set intact
pub struct SubscriptionGuard {
    inner: Weak<RegistryInner>,
    job_id: String,
    listener_id: u64,
}

impl SubscriptionGuard {
    pub fn unsubscribe(self) {}
}

impl Drop for SubscriptionGuard {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            let mut listeners = inner.listeners.lock().expect("listener map poisoned");
            if let Some(set) = listeners.get_mut(&self.job_id) {
                set.retain(|l| l.id != self.listener_id);
            }
        }
    }
}

/// Registry owning every upload job in this process
///
/// Constructed once and shared by reference with the request layer. Needs
/// a running tokio runtime: the TTL sweep task is spawned on creation.
pub struct JobRegistry {
    inner: Arc<RegistryInner>,
    config: JobRegistryConfig,
}

impl JobRegistry {
    pub fn new(config: JobRegistryConfig) -> Self {
        let registry = Self {
            inner: Arc::new(RegistryInner {
                jobs: Mutex::new(HashMap::new()),
                listeners: Mutex::new(HashMap::new()),
                next_listener_id: AtomicU64::new(1),
            }),
            config,
        };
        registry.start_sweep_task();
        registry
    }

    /// Allocate a job in `pending` state
    pub fn create(
        &self,
        did: impl Into<String>,
        site_name: impl Into<String>,
        total_files: u32,
    ) -> String {
        let id = Uuid::new_v4().to_string();
        let now = Utc::now();
        let job = UploadJob {
            id: id.clone(),
            did: did.into(),
            site_name: site_name.into(),
            status: JobStatus::Pending,
            progress: JobProgress::new(total_files),
            result: None,
            error: None,
            created_at: now,
            updated_at: now,
        };

        let mut jobs = self.inner.jobs.lock().expect("job map poisoned");
        jobs.insert(
            id.clone(),
            TrackedJob {
                job,
                created: Instant::now(),
            },
        );
        debug!(job_id = %id, total_files, "Job created");
        id
    }

    pub fn get(&self, job_id: &str) -> Option<UploadJob> {
        let jobs = self.inner.jobs.lock().expect("job map poisoned");
        jobs.get(job_id).map(|t| t.job.clone())
    }

    /// Merge fields into a job and broadcast a progress snapshot.
    /// Updating a missing or expired job is a logged no-op.
    pub fn update(&self, job_id: &str, update: JobUpdate) {
        let event = {
            let mut jobs = self.inner.jobs.lock().expect("job map poisoned");
            let Some(tracked) = jobs.get_mut(job_id) else {
                warn!(job_id, "Update for unknown job, ignoring");
                return;
            };
            let job = &mut tracked.job;

            if let Some(status) = update.status {
                job.status = status;
            }
            if let Some(progress) = update.progress {
                merge_progress(&mut job.progress, progress);
            }
            if let Some(result) = update.result {
                job.result = Some(result);
            }
            if let Some(error) = update.error {
                job.error = Some(error);
            }
            job.updated_at = Utc::now();

            JobEvent::Progress {
                status: job.status,
                progress: job.progress.clone(),
                result: job.result.clone(),
                error: job.error.clone(),
            }
        };

        broadcast(&self.inner, job_id, event);
    }

    /// Merge progress counters only
    pub fn update_progress(&self, job_id: &str, progress: ProgressUpdate) {
        self.update(
            job_id,
            JobUpdate {
                progress: Some(progress),
                ..JobUpdate::default()
            },
        );
    }

    /// Mark the job completed and, after a short delay so the final
    /// progress frame can be observed, deliver the terminal `done` event
    /// and release all listeners.
    pub fn complete(&self, job_id: &str, result: Value) {
        self.update(
            job_id,
            JobUpdate {
                status: Some(JobStatus::Completed),
                progress: Some(ProgressUpdate::phase(UploadPhase::Done)),
                result: Some(result.clone()),
                ..JobUpdate::default()
            },
        );
        self.finish(job_id, JobEvent::Done {
            result: Some(result),
        });
    }

    /// Mark the job failed; every subscriber receives the terminal `error`
    /// event after the same delay.
    pub fn fail(&self, job_id: &str, error: impl Into<String>) {
        let message = error.into();
        self.update(
            job_id,
            JobUpdate {
                status: Some(JobStatus::Failed),
                error: Some(message.clone()),
                ..JobUpdate::default()
            },
        );
        self.finish(job_id, JobEvent::Error { message });
    }

    fn finish(&self, job_id: &str, event: JobEvent) {
        let inner = Arc::downgrade(&self.inner);
        let job_id = job_id.to_string();
        let delay = self.config.terminal_event_delay;
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let Some(inner) = inner.upgrade() else { return };
            broadcast(&inner, &job_id, event);
            let mut listeners = inner.listeners.lock().expect("listener map poisoned");
            listeners.remove(&job_id);
        });
    }

    /// Register a subscriber for one job's event stream.
    ///
    /// Returns the receiving end plus a guard that removes just this
    /// subscriber when dropped. `None` when the job does not exist.
    pub fn subscribe(
        &self,
        job_id: &str,
    ) -> Option<(mpsc::UnboundedReceiver<JobEvent>, SubscriptionGuard)> {
        {
            let jobs = self.inner.jobs.lock().expect("job map poisoned");
            if !jobs.contains_key(job_id) {
                return None;
            }
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::SeqCst);
        let mut listeners = self.inner.listeners.lock().expect("listener map poisoned");
        listeners
            .entry(job_id.to_string())
            .or_default()
            .push(Listener { id, tx });

        Some((
            rx,
            SubscriptionGuard {
                inner: Arc::downgrade(&self.inner),
                job_id: job_id.to_string(),
                listener_id: id,
            },
        ))
    }

    /// Subscribers currently registered for a job
    pub fn listener_count(&self, job_id: &str) -> usize {
        let listeners = self.inner.listeners.lock().expect("listener map poisoned");
        listeners.get(job_id).map(Vec::len).unwrap_or(0)
    }

    fn start_sweep_task(&self) {
        let inner = Arc::downgrade(&self.inner);
        let ttl = self.config.job_ttl;
        let period = self.config.sweep_interval;
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                let Some(inner) = inner.upgrade() else { break };

                let expired: Vec<String> = {
                    let mut jobs = inner.jobs.lock().expect("job map poisoned");
                    let now = Instant::now();
                    let expired = jobs
                        .iter()
                        .filter(|(_, t)| now.duration_since(t.created) >= ttl)
                        .map(|(id, _)| id.clone())
                        .collect::<Vec<_>>();
                    for id in &expired {
                        jobs.remove(id);
                    }
                    expired
                };

                if !expired.is_empty() {
                    let mut listeners = inner.listeners.lock().expect("listener map poisoned");
                    for id in &expired {
                        listeners.remove(id);
                    }
                    debug!(removed = expired.len(), "Swept expired jobs");
                }
            }
        });
    }
}

fn merge_progress(progress: &mut JobProgress, update: ProgressUpdate) {
    if let Some(v) = update.files_processed {
        progress.files_processed = v;
    }
    if let Some(v) = update.total_files {
        progress.total_files = v;
    }
    if let Some(v) = update.files_uploaded {
        progress.files_uploaded = v;
    }
    if let Some(v) = update.files_reused {
        progress.files_reused = v;
    }
    if let Some(v) = update.current_file {
        progress.current_file = Some(v);
    }
    if let Some(v) = update.current_file_status {
        progress.current_file_status = Some(v);
    }
    if let Some(v) = update.phase {
        progress.phase = v;
    }
}

/// Send to every listener of a job, pruning the ones whose receiver is
/// gone. Remaining listeners are unaffected by a peer's failure.
fn broadcast(inner: &RegistryInner, job_id: &str, event: JobEvent) {
    let mut listeners = inner.listeners.lock().expect("listener map poisoned");
    let Some(set) = listeners.get_mut(job_id) else {
        return;
    };
    let before = set.len();
    set.retain(|listener| listener.tx.send(event.clone()).is_ok());
    let pruned = before - set.len();
    if pruned > 0 {
        debug!(job_id, pruned, "Pruned disconnected job listeners");
    }
}
