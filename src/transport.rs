//! HTTP seam between the job client and the remote API

use std::time::Duration;
use async_trait::async_trait;
use log::{error, trace};
use serde_json::Value;

use crate::config::ClientConfig;
use crate::error::{Error, Result};

/// JSON-over-HTTP calls the job client needs.
/// Every call is authenticated by the implementation.
#[async_trait]
pub trait Transport: Send + Sync
{   async fn get_json(&self, url: &str) -> Result<Value>;

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>;
}

/// reqwest-backed transport sending a bearer token
#[derive(Debug, Clone)]
pub struct HttpTransport
{   api_token: Option<String>
  , http_client: reqwest::Client
}

impl HttpTransport
{   pub fn new(config: &ClientConfig) -> Result<Self>
    {   let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs
        {   builder = builder.timeout(Duration::from_secs(secs));
        }
        let http_client = builder.build().map_err(|e| {
          error!("Failed to build HTTP client: {}", e);
          Error::InvalidConfiguration(e.to_string())
        })?;

        Ok(HttpTransport
        {   api_token: config.api_token.clone()
          , http_client
        })
    }

    fn token(&self) -> Result<&str>
    {   self.api_token.as_deref().ok_or_else(|| {
          error!("No API token configured");
          Error::MissingApiKey("prediction API".to_string())
        })
    }

    async fn read_json(response: reqwest::Response) -> Result<Value>
    {   let status = response.status();
        trace!("Response status: {}", status);

        if !status.is_success()
        {   let error_text = response.text().await
              .unwrap_or_else(|_|
                "Unknown error".to_string()
              );
            error!("API error {}: {}", status, error_text);
            return Err(Error::ApiError
            {   status: status.as_u16()
              , message: error_text
            });
        }

        response.json().await.map_err(|e| {
          error!("Parse error: {}", e);
          Error::ParseError(e.to_string())
        })
    }
}

#[async_trait]
impl Transport for HttpTransport
{   async fn get_json(&self, url: &str) -> Result<Value>
    {   let token = self.token()?;
        trace!("GET {}", url);

        let response = self.http_client
          .get(url)
          .header("Authorization", format!("Bearer {}", token))
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::HttpError(e.to_string())
          })?;

        Self::read_json(response).await
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>
    {   let token = self.token()?;
        trace!("POST {}: {}", url, body);

        let response = self.http_client
          .post(url)
          .header("Authorization", format!("Bearer {}", token))
          .header("Content-Type", "application/json")
          .json(body)
          .send()
          .await
          .map_err(|e| {
            error!("HTTP error: {}", e);
            Error::HttpError(e.to_string())
          })?;

        Self::read_json(response).await
    }
}
