use tokio::sync::mpsc;
use log::{debug, error, info};
use crate::job::JobClient;
use crate::PredictorFoot;

/// Public API for the predictor backend - owns the task
pub struct PredictorBackend
{   hand: crate::PredictorHand
  , _task_handle: tokio::task::JoinHandle<()>
}

impl PredictorBackend
{   /// Create and spawn a backend over HTTP
    /// Returns immediately - spawns background task
    pub fn new(
      config: &crate::config::ClientConfig
    ) -> Result<Self, crate::error::Error>
    {   let client = JobClient::new(config)?;
        Ok(PredictorBackend::with_client(client))
    }

    /// Create and spawn a backend around an existing client
    pub fn with_client(client: JobClient) -> Self
    {   debug!("Creating PredictorBackend with task ownership");

        let (run_inference_tx, run_inference_rx)
          = mpsc::unbounded_channel();
        let (list_versions_tx, list_versions_rx)
          = mpsc::unbounded_channel();
        let (list_properties_tx, list_properties_rx)
          = mpsc::unbounded_channel();
        let (kill_process_tx, kill_process_rx)
          = mpsc::unbounded_channel();

        let hand = crate::PredictorHand
        {   run_inference_tx
          , list_versions_tx
          , list_properties_tx
          , kill_process_tx
        };

        let foot = crate::PredictorFoot
        {   run_inference_rx
          , list_versions_rx
          , list_properties_rx
          , kill_process_rx
        };

        let _task_handle = tokio::spawn(async move {
          run_backend_loop(foot, client).await
        });

        PredictorBackend
        {   hand
          , _task_handle
        }
    }

    /// Queue a batch - returns almost immediately
    pub async fn run_inference(
      &self
    , model: crate::ModelReference
    , items: Vec<Vec<crate::PropertySelection>>
    ) -> Result<
        mpsc::UnboundedReceiver<crate::RunInferenceReply>,
        crate::error::Error
      >
    {   debug!("run_inference queuing {} item(s) for {}", items.len(), model);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::RunInferenceArgs
        {   model
          , items
          , reply: reply_tx
        };

        self.hand.run_inference_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Queue a version listing - returns almost immediately
    pub async fn list_versions(
      &self
    , model_name: String
    , filter: String
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ListVersionsReply>,
        crate::error::Error
      >
    {   debug!("list_versions queuing for {}", model_name);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ListVersionsArgs
        {   model_name
          , filter
          , reply: reply_tx
        };

        self.hand.list_versions_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Queue a schema lookup - returns almost immediately
    pub async fn list_properties(
      &self
    , model: crate::ModelReference
    ) -> Result<
        mpsc::UnboundedReceiver<crate::ListPropertiesReply>,
        crate::error::Error
      >
    {   debug!("list_properties queuing for {}", model);
        let (reply_tx, reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::ListPropertiesArgs
        {   model
          , reply: reply_tx
        };

        self.hand.list_properties_tx
          .send(cmd)
          .map_err(|_| disconnected())?;

        Ok(reply_rx)
    }

    /// Gracefully shutdown the backend
    pub async fn shutdown(self)
      -> Result<(), crate::error::Error>
    {   debug!("Shutting down PredictorBackend");
        let (reply_tx, mut reply_rx)
          = mpsc::unbounded_channel();

        let cmd = crate::KillProcessArgs
        {   reply: reply_tx
        };

        self.hand.kill_process_tx
          .send(cmd)
          .map_err(|_| {
            error!("Backend channel already closed");
            crate::error::Error::Other(
              "Backend already shutdown".to_string()
            )
          })?;

        if let Some(result) = reply_rx.recv().await
        {   debug!("Backend shutdown confirmed");
            result
        } else
        {   error!("Backend exited without confirming shutdown");
            Err(crate::error::Error::Other(
              "Backend disconnected".to_string()
            ))
        }
    }
}

fn disconnected() -> crate::error::Error
{   error!("Backend channel closed");
    crate::error::Error::Other(
      "Backend disconnected".to_string()
    )
}

/// Main backend event loop
///
/// Commands run to completion one at a time, so two batches queued on
/// the same backend never interleave.
async fn run_backend_loop(
  foot: crate::PredictorFoot
, client: JobClient
)
{   debug!("Starting PredictorBackend event loop");
    let PredictorFoot
    {   mut run_inference_rx
      , mut list_versions_rx
      , mut list_properties_rx
      , mut kill_process_rx
    } = foot;

    loop
    { tokio::select!
      { Some(cmd) = run_inference_rx.recv() => {
          debug!("Received RunInference for {}", cmd.model);
          let result = client
            .run_batch(&cmd.model, &cmd.items)
            .await
            .map(|results| {
              results.into_iter().map(|r| r.payload).collect()
            });
          let _ = cmd.reply.send(result);
        }
      , Some(cmd) = list_versions_rx.recv() => {
          debug!("Received ListVersions for {}", cmd.model_name);
          let result = client
            .list_versions(&cmd.model_name, &cmd.filter)
            .await;
          let _ = cmd.reply.send(result);
        }
      , Some(cmd) = list_properties_rx.recv() => {
          debug!("Received ListProperties for {}", cmd.model);
          let result = client
            .resolve_input_schema(&cmd.model)
            .await;
          let _ = cmd.reply.send(result);
        }
      , Some(cmd) = kill_process_rx.recv() => {
          debug!("Received KillProcess");
          let _ = cmd.reply.send(Ok(()));
          info!("PredictorBackend shutting down");
          break;
        }
      , else => {
          debug!("All command channels closed");
          break;
        }
      }
    }
}
