use crate::clients::{endpoint, http_client, service_error, Describer, RemoteError};
use crate::model::{Caption, PhotoRef};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// BLIP-2 model version on Replicate.
pub const BLIP2_VERSION: &str =
    "andreasjansson/blip-2:4b32258c42e9efd4288bb9910bc532a69727f9acd26aa08e175713a0a857a608";

#[derive(Debug, Serialize)]
struct PredictionRequest<'a> {
    version: &'a str,
    input: PredictionInput,
}

#[derive(Debug, Serialize)]
struct PredictionInput {
    image: String,
    caption: bool,
}

#[derive(Debug, Deserialize)]
struct Prediction {
    status: String,
    #[serde(default)]
    output: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Captioning client for the Replicate predictions API.
///
/// Uses a synchronous prediction (`Prefer: wait`) so one HTTP round trip
/// yields the caption.
#[derive(Debug, Clone)]
pub struct ReplicateDescriber {
    http: reqwest::Client,
    url: String,
    api_token: String,
    model_version: String,
}

impl ReplicateDescriber {
    pub fn new(
        base_url: &str,
        api_token: impl Into<String>,
        model_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            http: http_client(timeout)?,
            url: endpoint(base_url, "predictions"),
            api_token: api_token.into(),
            model_version: model_version.into(),
        })
    }
}

#[async_trait]
impl Describer for ReplicateDescriber {
    #[instrument(skip(self, photo), fields(photo = %photo))]
    async fn describe(&self, photo: &PhotoRef) -> Result<Caption, RemoteError> {
        let bytes = tokio::fs::read(photo.path())
            .await
            .map_err(|e| RemoteError::Artifact(format!("{}: {}", photo, e)))?;

        let request = PredictionRequest {
            version: &self.model_version,
            input: PredictionInput {
                image: format!("data:image/jpeg;base64,{}", STANDARD.encode(&bytes)),
                caption: true,
            },
        };

        debug!(bytes = bytes.len(), url = %self.url, "Requesting caption");
        let response = self
            .http
            .post(&self.url)
            .bearer_auth(&self.api_token)
            .header("Prefer", "wait")
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let error = service_error("captioning service", response).await;
            warn!(error = %error, "Caption request rejected");
            return Err(error);
        }

        let prediction: Prediction = response.json().await?;
        let caption = caption_from(prediction)?;
        info!(caption = %caption, "Caption received");
        Ok(caption)
    }
}

fn caption_from(prediction: Prediction) -> Result<Caption, RemoteError> {
    if prediction.status != "succeeded" {
        let detail = prediction
            .error
            .map(|e| match e {
                Value::String(s) => s,
                other => other.to_string(),
            })
            .unwrap_or_default();
        return Err(RemoteError::Service(format!(
            "prediction {}: {}",
            prediction.status, detail
        )));
    }

    let text = match prediction.output {
        Some(Value::String(text)) => text,
        Some(Value::Array(parts)) => parts
            .iter()
            .filter_map(Value::as_str)
            .collect::<Vec<_>>()
            .join(" "),
        _ => String::new(),
    };

    let caption = Caption::new(text);
    if caption.is_empty() {
        return Err(RemoteError::Service("prediction returned no caption".to_string()));
    }
    Ok(caption)
}
