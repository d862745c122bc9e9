//! Status polling: drives a submitted prediction to a terminal state

use std::time::Duration;
use log::{debug, info, trace, warn};
use serde_json::Value;

use crate::config::PollingConfig;
use crate::error::{Error, Result};
use crate::transport::Transport;

/// Status string reported by the remote service
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus
{   Starting
  , Processing
  , Succeeded
  , Failed
  , /// Terminal; ends the wait with `Error::PredictionCanceled`
    Canceled
  , Other(String)
}

impl JobStatus
{   pub fn parse(status: &str) -> Self
    {   match status
        {   "starting" => JobStatus::Starting
          , "processing" => JobStatus::Processing
          , "succeeded" => JobStatus::Succeeded
          , "failed" => JobStatus::Failed
          , "canceled" => JobStatus::Canceled
          , other => JobStatus::Other(other.to_string())
        }
    }

    /// Status field of a response document; absent reads as empty
    pub fn from_payload(payload: &Value) -> Self
    {   JobStatus::parse(
          payload.get("status").and_then(Value::as_str).unwrap_or("")
        )
    }

    pub fn is_terminal(&self) -> bool
    {   matches!(
          self,
          JobStatus::Succeeded | JobStatus::Failed | JobStatus::Canceled
        )
    }
}

/// Caller-side view of a job
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState
{   Pending
  , Succeeded
  , Failed
}

impl From<&JobStatus> for JobState
{   fn from(status: &JobStatus) -> Self
    {   match status
        {   JobStatus::Succeeded => JobState::Succeeded
          , JobStatus::Failed | JobStatus::Canceled => JobState::Failed
          , _ => JobState::Pending
        }
    }
}

/// A submitted prediction and the last response seen for it
#[derive(Debug, Clone)]
pub struct PredictionJob
{   pub id: Option<String>
  , pub status_url: String
  , pub status: JobStatus
  , pub payload: Value
}

impl PredictionJob
{   pub fn state(&self) -> JobState
    {   JobState::from(&self.status)
    }
}

/// Delays and limits applied while polling
#[derive(Debug, Clone)]
pub struct PollPolicy
{   pub poll_interval: Duration
  , pub error_backoff: Duration
  , pub max_errors: usize
  , pub max_wait: Option<Duration>
}

impl Default for PollPolicy
{   fn default() -> Self
    {   PollPolicy::from(&PollingConfig::default())
    }
}

impl From<&PollingConfig> for PollPolicy
{   fn from(config: &PollingConfig) -> Self
    {   PollPolicy
        {   poll_interval: config.poll_interval()
          , error_backoff: config.error_backoff()
          , max_errors: config.max_poll_errors
          , max_wait: config.max_wait()
        }
    }
}

/// Poll `job` until it reaches a terminal status.
///
/// Returns the full `succeeded` payload. A `failed` or `canceled` status
/// ends the wait with the payload attached to the error. Transport errors
/// are tolerated up to `policy.max_errors` times per job.
pub async fn wait_for_completion(
  transport: &dyn Transport
, job: PredictionJob
, policy: &PollPolicy
) -> Result<Value>
{   match policy.max_wait
    {   Some(limit) => {
          tokio::time::timeout(limit, poll_loop(transport, job, policy))
            .await
            .map_err(|_| {
              warn!("Prediction still pending after {:?}", limit);
              Error::Timeout
            })?
        }
      , None => poll_loop(transport, job, policy).await
    }
}

async fn poll_loop(
  transport: &dyn Transport
, mut job: PredictionJob
, policy: &PollPolicy
) -> Result<Value>
{   let mut errors = 0usize;
    let mut attempt = 0usize;

    loop
    {   tokio::time::sleep(policy.poll_interval).await;
        attempt += 1;
        trace!("Poll attempt {} for {}", attempt, job.status_url);

        let payload = match transport.get_json(&job.status_url).await
        {   Ok(payload) => payload
          , Err(e) => {
              errors += 1;
              if errors > policy.max_errors
              {   warn!(
                    "Giving up on {} after {} errors: {}",
                    job.status_url, errors, e
                  );
                  return Err(Error::polling(e));
              }
              warn!(
                "Poll error {}/{} for {}: {}",
                errors, policy.max_errors, job.status_url, e
              );
              tokio::time::sleep(policy.error_backoff).await;
              continue;
            }
        };

        job.status = JobStatus::from_payload(&payload);
        job.payload = payload;

        match job.state()
        {   JobState::Pending => {
              debug!("Job {:?} still {:?}", job.id, job.status);
            }
          , JobState::Succeeded => {
              info!("Job {:?} succeeded after {} polls", job.id, attempt);
              return Ok(job.payload);
            }
          , JobState::Failed if job.status == JobStatus::Canceled => {
              warn!("Job {:?} was canceled", job.id);
              return Err(Error::PredictionCanceled(job.payload));
            }
          , JobState::Failed => {
              warn!("Job {:?} failed", job.id);
              return Err(Error::PredictionFailed(job.payload));
            }
        }
    }
}
