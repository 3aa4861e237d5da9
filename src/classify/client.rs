use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{StatusCode, Url};
use tracing::{debug, info, warn};

use super::response::parse_classification;
use crate::config::{ServiceTask, Settings};
use crate::error::FlowError;
use crate::state::data::Classification;

/// Name used in service error messages
pub const SERVICE_NAME: &str = "Roboflow";

/// Something that turns image bytes into a classification
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Checked before a request starts; an error means nothing is sent
    fn check_ready(&self) -> Result<(), FlowError>;

    async fn classify(&self, image: Vec<u8>) -> Result<Classification, FlowError>;
}

/// Client for Roboflow's hosted inference API
#[derive(Debug, Clone)]
pub struct RoboflowClient {
    http: reqwest::Client,
    settings: Settings,
}

impl RoboflowClient {
    pub fn new(settings: Settings) -> Result<Self, reqwest::Error> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self { http, settings })
    }

    /// `{base}/{model-id}/{version}`, plus detection thresholds.
    /// The API key is added per request so this URL is safe to log.
    pub fn endpoint(&self) -> Result<Url, FlowError> {
        let raw = format!(
            "{}/{}/{}",
            self.settings.base_url(),
            self.settings.model_id.trim_matches('/'),
            self.settings.model_version
        );
        let mut url = Url::parse(&raw)
            .map_err(|e| FlowError::Transport(format!("Invalid endpoint {}: {}", raw, e)))?;

        if self.settings.task == ServiceTask::Detection {
            url.query_pairs_mut()
                .append_pair("confidence", &self.settings.confidence.to_string())
                .append_pair("overlap", &self.settings.overlap.to_string());
        }
        Ok(url)
    }
}

#[async_trait]
impl Classifier for RoboflowClient {
    fn check_ready(&self) -> Result<(), FlowError> {
        if self.settings.has_credential() {
            Ok(())
        } else {
            Err(FlowError::MissingCredential)
        }
    }

    async fn classify(&self, image: Vec<u8>) -> Result<Classification, FlowError> {
        self.check_ready()?;
        let endpoint = self.endpoint()?;
        info!("🌿 Uploading {} bytes to {}", image.len(), endpoint);

        let response = self
            .http
            .post(endpoint)
            .query(&[("api_key", self.settings.api_key.as_str())])
            .header(CONTENT_TYPE, "application/octet-stream")
            .body(image)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("{} answered {}", SERVICE_NAME, status);
            return Err(FlowError::Service {
                service: SERVICE_NAME,
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        debug!("Response body: {}", body);
        parse_classification(&body)
    }
}
