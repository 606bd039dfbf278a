use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use super::drawing::Drawing;
use crate::errors::domain::DomainError;

/// One classified attempt, kept for audit whatever the verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveRecord {
    pub game_id: String,
    pub round: u32,
    pub word: String,
    pub guess: String,
    pub address: String,
    /// Data URL of the drawing.
    pub image: String,
    pub digest: String,
}

impl ArchiveRecord {
    pub fn new(
        game_id: &str,
        round: u32,
        word: &str,
        guess: &str,
        address: &str,
        drawing: &Drawing,
    ) -> Self {
        Self {
            game_id: game_id.to_string(),
            round,
            word: word.to_string(),
            guess: guess.to_string(),
            address: address.to_string(),
            image: drawing.to_data_url(),
            digest: drawing.digest(),
        }
    }
}

#[async_trait]
pub trait Archive: Send + Sync {
    async fn store(&self, record: ArchiveRecord) -> Result<(), DomainError>;
}

/// Posts each record as JSON to an external store.
pub struct HttpArchive {
    client: reqwest::Client,
    url: String,
}

impl HttpArchive {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, DomainError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DomainError::persistence(format!("http client: {e}")))?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Archive for HttpArchive {
    async fn store(&self, record: ArchiveRecord) -> Result<(), DomainError> {
        let response = self
            .client
            .post(&self.url)
            .json(&record)
            .send()
            .await
            .map_err(|e| DomainError::persistence(format!("archive request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(DomainError::persistence(format!(
                "archive returned {}",
                response.status()
            )));
        }
        Ok(())
    }
}

/// Archive that drops every record; used when no archive URL is configured.
pub struct NoopArchive;

#[async_trait]
impl Archive for NoopArchive {
    async fn store(&self, _record: ArchiveRecord) -> Result<(), DomainError> {
        Ok(())
    }
}
