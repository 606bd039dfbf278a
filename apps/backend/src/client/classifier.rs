use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::drawing::Drawing;
use crate::errors::domain::DomainError;

/// External image classifier: best-guess label for a drawing.
///
/// Any failure, including an empty answer, is `ClassifierUnavailable`;
/// callers cannot tell the causes apart.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, drawing: &Drawing) -> Result<String, DomainError>;
}

#[derive(Serialize)]
struct ClassifyRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
struct ClassifyResponse {
    #[serde(default)]
    answer: Option<String>,
}

/// Posts `{"image": <data url>}` and reads `{"answer": "..."}`.
pub struct HttpClassifier {
    client: reqwest::Client,
    url: String,
}

impl HttpClassifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::classifier(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Classifier for HttpClassifier {
    async fn classify(&self, drawing: &Drawing) -> Result<String, DomainError> {
        let data_url = drawing.to_data_url();
        let response = self
            .client
            .post(&self.url)
            .json(&ClassifyRequest { image: &data_url })
            .send()
            .await
            .map_err(|e| DomainError::classifier(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(DomainError::classifier(format!("classifier returned {status}")));
        }

        let body: ClassifyResponse = response
            .json()
            .await
            .map_err(|e| DomainError::classifier(format!("unreadable response: {e}")))?;

        match body.answer {
            Some(answer) if !answer.is_empty() => {
                debug!(answer = %answer, "classifier answered");
                Ok(answer)
            }
            _ => Err(DomainError::classifier("no answer in response")),
        }
    }
}
