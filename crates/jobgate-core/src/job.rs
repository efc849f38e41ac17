//! Scheduled-job envelopes and the forwarder behind `scheduleJob`.
//!
//! The forwarder does not run jobs. It stamps each accepted request with a
//! process-unique id and pushes it onto a bounded job queue; the execution
//! backend drains the queue and owns everything after that. A job is only
//! reported as queued once it is in the queue, so a full or closed queue
//! fails the request instead of dropping the job.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::info;

use crate::BoxFuture;
use crate::command::{JobRequest, Payload};
use crate::dispatch::{CommandHandler, HandlerError};

/// An accepted job as pushed onto the job queue.
#[derive(Debug, Clone)]
pub struct ScheduledJob {
    /// Process-unique, increasing job identifier.
    pub id: u64,

    /// When the forwarder accepted the job.
    pub accepted_at: SystemTime,

    pub request: JobRequest,
}

impl ScheduledJob {
    pub fn new(request: JobRequest) -> Self {
        static NEXT_ID: AtomicU64 = AtomicU64::new(1);

        Self {
            id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
            accepted_at: SystemTime::now(),
            request,
        }
    }
}

/// Response body for an accepted `scheduleJob`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobAccepted {
    pub job_id: u64,
    pub daemon_target: String,
    pub status: String,
}

/// `scheduleJob` handler pushing jobs onto a bounded queue.
pub struct JobForwarder {
    queue: mpsc::Sender<ScheduledJob>,
}

impl JobForwarder {
    pub fn new(queue: mpsc::Sender<ScheduledJob>) -> Self {
        Self { queue }
    }
}

impl CommandHandler for JobForwarder {
    fn handle<'a>(&'a self, payload: &'a Payload) -> BoxFuture<'a, Result<Value, HandlerError>> {
        Box::pin(async move {
            let job = ScheduledJob::new(JobRequest::from_payload(payload)?);
            let accepted = JobAccepted {
                job_id: job.id,
                daemon_target: job.request.daemon_target.clone(),
                status: "queued".to_string(),
            };

            self.queue.try_send(job).map_err(|e| match e {
                TrySendError::Full(_) => HandlerError::from("job queue is full"),
                TrySendError::Closed(_) => HandlerError::from("job queue is closed"),
            })?;
            info!(
                job_id = accepted.job_id,
                daemon = %accepted.daemon_target,
                "job queued"
            );

            Ok::<_, HandlerError>(serde_json::to_value(accepted)?)
        })
    }
}
