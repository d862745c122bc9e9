use std::fmt;

/// Result alias used across the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Custom error type for predictor operations
/// Implements Clone for sending through channels
#[derive(Debug, Clone, PartialEq)]
pub enum Error
{   /// No API token was handed to the client
    MissingApiKey(String)
  , /// Invalid configuration (bad model reference, bad base url)
    InvalidConfiguration(String)
  , /// HTTP request error
    HttpError(String)
  , /// API returned a non-success status
    ApiError
    {   status: u16
      , message: String
    }
  , /// Failed to parse API response
    ParseError(String)
  , /// Submission response was unusable; never retried
    Submission(String)
  , /// Status polling gave up after repeated transport errors
    Polling
    {   message: String
      , source: Box<Error>
    }
  , /// Remote job reported `failed`; carries the full payload
    PredictionFailed(serde_json::Value)
  , /// Remote job reported `canceled`; carries the full payload
    PredictionCanceled(serde_json::Value)
  , /// Configured maximum wait elapsed before a terminal status
    Timeout
  , /// Generic error
    Other(String)
}

impl Error
{   /// Build the error raised once the polling error cap is hit
    pub fn polling(last: Error) -> Self
    {   Error::Polling
        {   message: "error getting data from remote service".to_string()
          , source: Box::new(last)
        }
    }

    /// Remote payload attached to a failed or canceled prediction
    pub fn payload(&self) -> Option<&serde_json::Value>
    {   match self
        {   Error::PredictionFailed(payload)
          | Error::PredictionCanceled(payload) => Some(payload)
          , _ => None
        }
    }
}

impl fmt::Display for Error
{   fn fmt(&self, f: &mut fmt::Formatter<'_>)
      -> fmt::Result
    {   match self
        {   Error::MissingApiKey(what) => {
              write!(f, "Missing API key for: {}", what)
            }
          , Error::InvalidConfiguration(msg) => {
              write!(f, "Invalid configuration: {}", msg)
            }
          , Error::HttpError(msg) => {
              write!(f, "HTTP error: {}", msg)
            }
          , Error::ApiError { status, message } => {
              write!(f, "API error (status {}): {}", status, message)
            }
          , Error::ParseError(msg) => {
              write!(f, "Parse error: {}", msg)
            }
          , Error::Submission(msg) => {
              write!(f, "Submission failed: {}", msg)
            }
          , Error::Polling { message, source } => {
              write!(f, "{}: {}", message, source)
            }
          , Error::PredictionFailed(payload) => {
              let detail = payload.get("error")
                .filter(|e| !e.is_null())
                .map(|e| e.to_string())
                .unwrap_or_else(|| payload.to_string());
              write!(f, "Prediction failed: {}", detail)
            }
          , Error::PredictionCanceled(payload) => {
              let id = payload.get("id")
                .and_then(|id| id.as_str())
                .unwrap_or("unknown");
              write!(f, "Prediction canceled: {}", id)
            }
          , Error::Timeout => {
              write!(f, "Timed out waiting for prediction")
            }
          , Error::Other(msg) => {
              write!(f, "Error: {}", msg)
            }
        }
    }
}

impl std::error::Error for Error
{   fn source(&self)
      -> Option<&(dyn std::error::Error + 'static)>
    {   match self
        {   Error::Polling { source, .. } => Some(source.as_ref())
          , _ => None
        }
    }
}

impl From<reqwest::Error> for Error
{   fn from(e: reqwest::Error) -> Self
    {   Error::HttpError(e.to_string())
    }
}

impl From<serde_json::Error> for Error
{   fn from(e: serde_json::Error) -> Self
    {   Error::ParseError(e.to_string())
    }
}

impl From<String> for Error
{   fn from(s: String) -> Self
    {   Error::Other(s)
    }
}

impl From<&str> for Error
{   fn from(s: &str) -> Self
    {   Error::Other(s.to_string())
    }
}

#[cfg(test)]
mod tests
{   use super::*;
    use std::error::Error as _;

    #[test]
    fn polling_error_exposes_last_transport_error()
    {   let err = Error::polling(Error::HttpError("reset".to_string()));
        assert_eq!(
          err.to_string(),
          "error getting data from remote service: HTTP error: reset"
        );
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("HTTP error: reset"));
    }

    #[test]
    fn prediction_failed_prefers_remote_error_field()
    {   let err = Error::PredictionFailed(serde_json::json!({
          "status": "failed",
          "error": "CUDA out of memory"
        }));
        assert_eq!(
          err.to_string(),
          "Prediction failed: \"CUDA out of memory\""
        );
        assert!(err.payload().is_some());
    }
}
