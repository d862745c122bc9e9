//! Job client: submission, batch orchestration and the registry queries
//! (schema discovery, version listing) behind them.

use std::collections::HashSet;
use std::sync::Arc;
use log::{debug, error, info, trace, warn};
use serde_json::{Map, Value};

use crate::config::ClientConfig;
use crate::error::{Error, Result};
use crate::polling::{wait_for_completion, JobStatus, PollPolicy, PredictionJob};
use crate::request::{
  ItemResult, PredictionRequest, VersionDescriptor, VersionPage
};
use crate::schema;
use crate::transport::{HttpTransport, Transport};
use crate::{InputSchemaEntry, ModelReference, PropertySelection};

/// Client for the remote prediction API
#[derive(Clone)]
pub struct JobClient
{   base_url: String
  , policy: PollPolicy
  , transport: Arc<dyn Transport>
}

impl JobClient
{   /// Client over HTTP, authenticated with the configured token
    pub fn new(config: &ClientConfig) -> Result<Self>
    {   let transport = HttpTransport::new(config)?;
        Ok(JobClient::with_transport(config, Arc::new(transport)))
    }

    /// Client over any transport
    pub fn with_transport(
      config: &ClientConfig
    , transport: Arc<dyn Transport>
    ) -> Self
    {   debug!("Creating JobClient for {}", config.base_url());
        JobClient
        {   base_url: config.base_url().to_string()
          , policy: PollPolicy::from(&config.polling)
          , transport
        }
    }

    /// Submit one prediction. Fails without retry when the response
    /// carries no status URL.
    pub async fn submit(
      &self
    , version: &str
    , input: Map<String, Value>
    ) -> Result<PredictionJob>
    {   let request = PredictionRequest
        {   version: version.to_string()
          , input
        };
        debug!("Submitting prediction for version {}", version);
        let body = serde_json::to_value(&request)?;

        let payload = self.transport
          .post_json(&format!("{}/predictions", self.base_url), &body)
          .await?;
        trace!("Submission response: {}", payload);

        let status_url = payload.pointer("/urls/get")
          .and_then(Value::as_str)
          .map(str::to_string)
          .ok_or_else(|| {
            error!("Submission response has no status URL");
            Error::Submission("missing status URL".to_string())
          })?;

        let id = payload.get("id").and_then(|id| match id
        {   Value::String(s) => Some(s.clone())
          , Value::Null => None
          , other => Some(other.to_string())
        });
        let status = payload.get("status")
          .and_then(Value::as_str)
          .map(JobStatus::parse)
          .unwrap_or(JobStatus::Starting);
        info!("Prediction {:?} submitted ({:?})", id, status);

        Ok(PredictionJob
        {   id
          , status_url
          , status
          , payload
        })
    }

    /// Poll a submitted job until it is terminal
    pub async fn wait(&self, job: PredictionJob) -> Result<Value>
    {   wait_for_completion(self.transport.as_ref(), job, &self.policy)
          .await
    }

    /// Submit one input item and wait for its terminal payload
    pub async fn run(
      &self
    , model: &ModelReference
    , selections: &[PropertySelection]
    ) -> Result<Value>
    {   let input = schema::build_input(selections);
        let job = self.submit(&model.version, input).await?;
        self.wait(job).await
    }

    /// Run every item in order. The first failure aborts the batch and
    /// discards results gathered so far.
    pub async fn run_batch(
      &self
    , model: &ModelReference
    , items: &[Vec<PropertySelection>]
    ) -> Result<Vec<ItemResult>>
    {   info!("Running {} item(s) on {}", items.len(), model);
        let mut results = Vec::with_capacity(items.len());

        for (index, selections) in items.iter().enumerate()
        {   debug!("Item {} of {}", index + 1, items.len());
            let payload = self.run(model, selections).await
              .map_err(|e| {
                error!("Item {} failed: {}", index, e);
                e
              })?;
            results.push(ItemResult { index, payload });
        }

        Ok(results)
    }

    /// Input properties declared by a model version, in schema order
    pub async fn resolve_input_schema(
      &self
    , model: &ModelReference
    ) -> Result<Vec<InputSchemaEntry>>
    {   let url = format!(
          "{}/models/{}/{}/versions/{}",
          self.base_url, model.owner()?, model.model()?, model.version
        );
        debug!("Fetching schema for {}", model);
        let document = self.transport.get_json(&url).await?;
        schema::list_properties(&document)
    }

    /// All versions of `model_name`, newest first, keeping ids that
    /// contain `filter`
    pub async fn list_versions(
      &self
    , model_name: &str
    , filter: &str
    ) -> Result<Vec<VersionDescriptor>>
    {   let (owner, name) = ModelReference::split_name(model_name)?;
        let mut next = Some(format!(
          "{}/models/{}/{}/versions",
          self.base_url, owner, name
        ));
        let mut versions = Vec::new();
        let mut visited = HashSet::new();

        while let Some(url) = next
        {   if !visited.insert(url.clone())
            {   warn!("Version listing revisits {}, stopping", url);
                break;
            }
            let page: VersionPage = serde_json::from_value(
              self.transport.get_json(&url).await?
            )?;
            trace!("Version page with {} entries", page.results.len());
            versions.extend(page.results);
            next = page.next.filter(|n| !n.is_empty());
        }

        debug!("Retrieved {} versions of {}", versions.len(), model_name);
        Ok(schema::sort_and_filter_versions(versions, filter))
    }
}
