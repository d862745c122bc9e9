pub mod error;
pub mod config;
pub mod request;
pub mod schema;
pub mod transport;
pub mod polling;
pub mod job;
pub mod client;

use std::fmt;
use serde::{Deserialize, Serialize};

pub use client::PredictorBackend;
pub use config::{ClientConfig, PollingConfig};
pub use error::{Error, Result};
pub use job::JobClient;
pub use polling::{JobState, JobStatus, PollPolicy, PredictionJob};
pub use request::{ItemResult, VersionDescriptor};

/*

predictor: async client for hosted model inference APIs. A host hands
over a model reference and typed input selections; each item is
submitted as a prediction and polled until the remote job settles.

predictor/
├── src/
│   ├── lib.rs          # Shared types and the backend channel interface
│   ├── error.rs        # Error type
│   ├── config.rs       # Client and polling configuration
│   ├── request.rs      # Wire types
│   ├── schema.rs       # Input schema translation, version ordering
│   ├── transport.rs    # HTTP seam
│   ├── polling.rs      # Status polling state machine
│   ├── job.rs          # Submission and batch orchestration
│   └── client.rs       # Backend task owning a JobClient
└── tests/

*/

/// PREDICTOR API INTERFACE:

// ===== RunInference =====

pub type RunInferenceReply
  = Result<Vec<serde_json::Value>, crate::error::Error>;
pub type RunInferenceReplySender
  = tokio::sync::mpsc::UnboundedSender<RunInferenceReply>;

pub struct RunInferenceArgs
{   pub model: ModelReference
  , pub items: Vec<Vec<PropertySelection>>
  , pub reply: RunInferenceReplySender
}

// ===== ListVersions =====

pub type ListVersionsReply
  = Result<Vec<VersionDescriptor>, crate::error::Error>;
pub type ListVersionsReplySender
  = tokio::sync::mpsc::UnboundedSender<ListVersionsReply>;

pub struct ListVersionsArgs
{   pub model_name: String
  , pub filter: String
  , pub reply: ListVersionsReplySender
}

// ===== ListProperties =====

pub type ListPropertiesReply
  = Result<Vec<InputSchemaEntry>, crate::error::Error>;
pub type ListPropertiesReplySender
  = tokio::sync::mpsc::UnboundedSender<ListPropertiesReply>;

pub struct ListPropertiesArgs
{   pub model: ModelReference
  , pub reply: ListPropertiesReplySender
}

// ===== KillProcess =====

pub type KillProcessReply = Result<(), crate::error::Error>;
pub type KillProcessReplySender
  = tokio::sync::mpsc::UnboundedSender<KillProcessReply>;

pub struct KillProcessArgs
{   pub reply: KillProcessReplySender
}

// ===== PredictorHand (sender side) =====

pub struct PredictorHand
{   pub run_inference_tx
      : tokio::sync::mpsc::UnboundedSender<RunInferenceArgs>
  , pub list_versions_tx
      : tokio::sync::mpsc::UnboundedSender<ListVersionsArgs>
  , pub list_properties_tx
      : tokio::sync::mpsc::UnboundedSender<ListPropertiesArgs>
  , pub kill_process_tx
      : tokio::sync::mpsc::UnboundedSender<KillProcessArgs>
}

// ===== PredictorFoot (receiver side) =====

pub struct PredictorFoot
{   pub run_inference_rx
      : tokio::sync::mpsc::UnboundedReceiver<RunInferenceArgs>
  , pub list_versions_rx
      : tokio::sync::mpsc::UnboundedReceiver<ListVersionsArgs>
  , pub list_properties_rx
      : tokio::sync::mpsc::UnboundedReceiver<ListPropertiesArgs>
  , pub kill_process_rx
      : tokio::sync::mpsc::UnboundedReceiver<KillProcessArgs>
}

/// PREDICTOR STRUCTURES:

/// Model and published version to run
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct ModelReference
{   /// `owner/model-name`
    pub name: String
  , /// Opaque version identifier
    pub version: String
}

impl ModelReference
{   pub fn new(
      name: impl Into<String>
    , version: impl Into<String>
    ) -> Self
    {   ModelReference
        {   name: name.into()
          , version: version.into()
        }
    }

    /// Parse `owner/model-name:version`
    pub fn parse(reference: &str) -> Result<Self>
    {   let (name, version) = reference.split_once(':')
          .filter(|(_, v)| !v.is_empty())
          .ok_or_else(|| Error::InvalidConfiguration(
            format!("expected owner/model:version, got {:?}", reference)
          ))?;
        ModelReference::split_name(name)?;
        Ok(ModelReference::new(name, version))
    }

    /// Split `owner/model-name` into its two parts
    pub fn split_name(name: &str) -> Result<(&str, &str)>
    {   match name.split_once('/')
        {   Some((owner, model))
              if !owner.is_empty()
                && !model.is_empty()
                && !model.contains('/') => Ok((owner, model))
          , _ => Err(Error::InvalidConfiguration(
              format!("expected owner/model, got {:?}", name)
            ))
        }
    }

    pub fn owner(&self) -> Result<&str>
    {   ModelReference::split_name(&self.name).map(|(owner, _)| owner)
    }

    pub fn model(&self) -> Result<&str>
    {   ModelReference::split_name(&self.name).map(|(_, model)| model)
    }
}

impl fmt::Display for ModelReference
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   write!(f, "{}:{}", self.name, self.version)
    }
}

/// The three value kinds a model input can take
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind
{   Number
  , Boolean
  , String
}

impl ValueKind
{   pub fn as_str(&self) -> &'static str
    {   match self
        {   ValueKind::Number => "number"
          , ValueKind::Boolean => "boolean"
          , ValueKind::String => "string"
        }
    }
}

impl fmt::Display for ValueKind
{   fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {   f.write_str(self.as_str())
    }
}

/// One input property declared by a model version
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct InputSchemaEntry
{   pub key: String
  , /// Display title, the key when the schema gives none
    pub title: String
  , pub description: String
  , /// Type exactly as declared; empty when the schema omits it
    pub declared_type: String
  , /// Schema default, if any
    pub default: Option<serde_json::Value>
  , /// `x-order` hint, if any
    pub order: Option<i64>
}

impl InputSchemaEntry
{   pub fn kind(&self) -> ValueKind
    {   schema::coerce(&self.declared_type)
    }
}

/// A configured input field. `kind` decides which slot is read.
#[derive(Debug, Clone, PartialEq, Default, Deserialize, Serialize)]
pub struct PropertySelection
{   pub key: String
  , pub kind: ValueKind
  , #[serde(default)]
    pub boolean_value: Option<bool>
  , #[serde(default)]
    pub number_value: Option<f64>
  , #[serde(default)]
    pub string_value: Option<String>
}

impl Default for ValueKind
{   fn default() -> Self
    {   ValueKind::String
    }
}

impl PropertySelection
{   pub fn boolean(key: impl Into<String>, value: bool) -> Self
    {   PropertySelection
        {   key: key.into()
          , kind: ValueKind::Boolean
          , boolean_value: Some(value)
          , ..Default::default()
        }
    }

    pub fn number(key: impl Into<String>, value: f64) -> Self
    {   PropertySelection
        {   key: key.into()
          , kind: ValueKind::Number
          , number_value: Some(value)
          , ..Default::default()
        }
    }

    pub fn string(key: impl Into<String>, value: impl Into<String>) -> Self
    {   PropertySelection
        {   key: key.into()
          , kind: ValueKind::String
          , string_value: Some(value.into())
          , ..Default::default()
        }
    }

    /// Selection with no slot filled; resolves to the kind's zero value
    pub fn empty(key: impl Into<String>, kind: ValueKind) -> Self
    {   PropertySelection
        {   key: key.into()
          , kind
          , ..Default::default()
        }
    }
}
