//! Wire types for the prediction API

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Body of the submission call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionRequest
{   pub version: String
  , pub input: Map<String, Value>
}

/// One published revision of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionDescriptor
{   pub id: String
  , pub created_at: DateTime<Utc>
  , #[serde(default)]
    pub cog_version: Option<String>
}

/// A page of the version listing
#[derive(Debug, Clone, Deserialize)]
pub struct VersionPage
{   #[serde(default)]
    pub results: Vec<VersionDescriptor>
  , #[serde(default)]
    pub next: Option<String>
}

/// Result of one successful batch item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemResult
{   /// Position of the item in the submitted batch
    pub index: usize
  , /// Terminal status payload, passed through untouched
    pub payload: Value
}
