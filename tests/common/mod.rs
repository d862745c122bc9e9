#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::{Duration, Instant};

use predictor::error::{Error, Result};
use predictor::transport::Transport;
use predictor::{ClientConfig, JobClient};

pub const BASE: &str = "https://api.test/v1";

pub fn init_logging()
{   let _ = env_logger::builder().is_test(true).try_init();
}

/// A recorded transport call
#[derive(Debug, Clone, PartialEq)]
pub enum Call
{   Get(String)
  , Post(String, Value)
}

/// Transport answering from pre-loaded queues
pub struct ScriptedTransport
{   gets: Mutex<VecDeque<Result<Value>>>
  , posts: Mutex<VecDeque<Result<Value>>>
  , fallback_get: Option<Value>
  , calls: Mutex<Vec<(Instant, Call)>>
  , started: Instant
}

impl ScriptedTransport
{   pub fn new() -> Self
    {   ScriptedTransport
        {   gets: Mutex::new(VecDeque::new())
          , posts: Mutex::new(VecDeque::new())
          , fallback_get: None
          , calls: Mutex::new(Vec::new())
          , started: Instant::now()
        }
    }

    pub fn get(self, reply: Result<Value>) -> Self
    {   self.gets.lock().unwrap().push_back(reply);
        self
    }

    pub fn post(self, reply: Result<Value>) -> Self
    {   self.posts.lock().unwrap().push_back(reply);
        self
    }

    /// Answer every unscripted GET with `reply`
    pub fn otherwise_get(mut self, reply: Value) -> Self
    {   self.fallback_get = Some(reply);
        self
    }

    pub fn calls(&self) -> Vec<Call>
    {   self.calls.lock().unwrap().iter().map(|(_, c)| c.clone()).collect()
    }

    /// Offsets from creation at which each GET was issued
    pub fn get_times(&self) -> Vec<Duration>
    {   self.calls.lock().unwrap().iter()
          .filter(|(_, c)| matches!(c, Call::Get(_)))
          .map(|(at, _)| at.duration_since(self.started))
          .collect()
    }

    fn record(&self, call: Call)
    {   self.calls.lock().unwrap().push((Instant::now(), call));
    }
}

#[async_trait]
impl Transport for ScriptedTransport
{   async fn get_json(&self, url: &str) -> Result<Value>
    {   self.record(Call::Get(url.to_string()));
        let scripted = self.gets.lock().unwrap().pop_front();
        match (scripted, &self.fallback_get)
        {   (Some(reply), _) => reply
          , (None, Some(reply)) => Ok(reply.clone())
          , (None, None) => Err(Error::Other(format!("unexpected GET {}", url)))
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> Result<Value>
    {   self.record(Call::Post(url.to_string(), body.clone()));
        self.posts.lock().unwrap().pop_front()
          .unwrap_or_else(|| Err(Error::Other(format!("unexpected POST {}", url))))
    }
}

pub fn client(transport: Arc<ScriptedTransport>) -> JobClient
{   client_with(ClientConfig::default().with_api_base(BASE), transport)
}

pub fn client_with(config: ClientConfig, transport: Arc<ScriptedTransport>) -> JobClient
{   JobClient::with_transport(&config, transport)
}

/// Submission response pointing at `/predictions/{id}`
pub fn submitted(id: &str) -> Value
{   json!({
      "id": id,
      "status": "starting",
      "urls": {
        "get": status_url(id),
        "cancel": format!("{}/predictions/{}/cancel", BASE, id)
      }
    })
}

pub fn status_url(id: &str) -> String
{   format!("{}/predictions/{}", BASE, id)
}

pub fn status(id: &str, status: &str) -> Value
{   json!({ "id": id, "status": status })
}
