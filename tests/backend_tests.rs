mod common;

use std::sync::Arc;
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use common::{client, status, submitted, Call, ScriptedTransport};
use predictor::error::Error;
use predictor::{ClientConfig, ModelReference, PredictorBackend, PropertySelection};

fn model() -> ModelReference
{   ModelReference::new("acme/upscaler", "v2")
}

#[tokio::test]
async fn test_backend_initialization()
{   common::init_logging();
    let backend = assert_ok!(PredictorBackend::new(&ClientConfig::default()));
    assert_ok!(backend.shutdown().await);
}

#[tokio::test(start_paused = true)]
async fn test_backend_run_inference()
{   let transport = Arc::new(
      ScriptedTransport::new()
        .post(Ok(submitted("a")))
        .get(Ok(status("a", "processing")))
        .get(Ok(json!({ "id": "a", "status": "succeeded", "output": 1 })))
        .post(Ok(submitted("b")))
        .get(Ok(json!({ "id": "b", "status": "succeeded", "output": 2 })))
    );
    let backend = PredictorBackend::with_client(client(transport.clone()));

    let mut rx = assert_ok!(
      backend.run_inference(
        model(),
        vec![
          vec![PropertySelection::number("scale", 2.0)],
          vec![PropertySelection::number("scale", 4.0)],
        ]
      ).await
    );

    let outputs = assert_ok!(rx.recv().await.expect("reply"));
    let values: Vec<_> = outputs.iter().map(|o| o["output"].clone()).collect();
    assert_eq!(values, vec![json!(1), json!(2)]);

    let bodies: Vec<_> = transport.calls().into_iter()
      .filter_map(|c| match c
      {   Call::Post(_, body) => Some(body)
        , Call::Get(_) => None
      })
      .collect();
    assert_eq!(bodies[0]["input"], json!({ "scale": 2 }));
    assert_eq!(bodies[1]["input"], json!({ "scale": 4 }));

    assert_ok!(backend.shutdown().await);
}

#[tokio::test(start_paused = true)]
async fn test_backend_reports_failed_batch()
{   let transport = Arc::new(
      ScriptedTransport::new()
        .post(Ok(json!({ "id": "a" })))
    );
    let backend = PredictorBackend::with_client(client(transport));

    let mut rx = assert_ok!(
      backend.run_inference(model(), vec![vec![], vec![]]).await
    );

    let err = assert_err!(rx.recv().await.expect("reply"));
    assert_eq!(err, Error::Submission("missing status URL".to_string()));

    assert_ok!(backend.shutdown().await);
}

#[tokio::test]
async fn test_backend_list_versions()
{   let transport = Arc::new(
      ScriptedTransport::new().get(Ok(json!({
        "next": null,
        "results": [
          { "id": "v1", "created_at": "2024-01-01T00:00:00Z" },
          { "id": "v2", "created_at": "2024-05-01T00:00:00Z" }
        ]
      })))
    );
    let backend = PredictorBackend::with_client(client(transport));

    let mut rx = assert_ok!(
      backend.list_versions("acme/upscaler".to_string(), String::new()).await
    );
    let versions = assert_ok!(rx.recv().await.expect("reply"));
    let ids: Vec<_> = versions.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["v2", "v1"]);

    assert_ok!(backend.shutdown().await);
}

#[tokio::test]
async fn test_backend_list_properties()
{   let transport = Arc::new(
      ScriptedTransport::new().get(Ok(json!({
        "openapi_schema": { "components": { "schemas": { "Input": {
          "properties": {
            "image": { "type": "string", "format": "uri" },
            "scale": { "type": "integer", "default": 4 },
            "face_enhance": { "type": "boolean" }
          }
        }}}}
      })))
    );
    let backend = PredictorBackend::with_client(client(transport));

    let mut rx = assert_ok!(backend.list_properties(model()).await);
    let entries = assert_ok!(rx.recv().await.expect("reply"));
    let keys: Vec<_> = entries.iter().map(|e| e.key.as_str()).collect();
    assert_eq!(keys, vec!["image", "scale", "face_enhance"]);

    assert_ok!(backend.shutdown().await);
}
