//! Resend broadcast API client.
//!
//! Only the two calls a newsletter send needs: create a broadcast for an
//! audience, then send it. Neither is retried; a duplicate create or send
//! would mail the audience twice.

use crate::constants::{ERROR_BODY_PREVIEW_LENGTH, RESEND_API_BASE_URL, RESEND_REQUEST_TIMEOUT};
use crate::error::AppError;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};

/// A broadcast to create.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Broadcast {
    pub audience_id: String,
    pub from: String,
    pub subject: String,
    pub html: String,
    /// Label shown in the provider dashboard.
    pub name: String,
}

/// Outbound email seam, faked in tests.
#[async_trait::async_trait]
pub trait EmailProvider: Send + Sync {
    /// Creates a broadcast and returns its id.
    async fn create_broadcast(&self, broadcast: &Broadcast) -> Result<String, AppError>;

    /// Sends a created broadcast immediately.
    async fn send_broadcast(&self, broadcast_id: &str) -> Result<(), AppError>;
}

#[derive(Debug, Deserialize)]
struct CreatedObject {
    id: String,
}

#[derive(Debug, Deserialize)]
struct ResendErrorBody {
    #[serde(default)]
    name: String,
    message: String,
}

pub struct ResendClient {
    client: Client,
    base_url: String,
}

impl ResendClient {
    pub fn new(api_key: &str) -> Result<Self, AppError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(AppError::MissingConfiguration(
                "Resend API key is empty".to_string(),
            ));
        }

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            header::HeaderValue::from_str(&format!("Bearer {}", api_key)).map_err(|e| {
                AppError::MissingConfiguration(format!("Invalid Resend API key format: {}", e))
            })?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(RESEND_REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            base_url: RESEND_API_BASE_URL.to_string(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    async fn post(&self, endpoint: &str, body: &serde_json::Value) -> Result<String, AppError> {
        let url = format!("{}/{}", self.base_url, endpoint);
        log::debug!("POST {}", url);

        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        let message = match serde_json::from_str::<ResendErrorBody>(&text) {
            Ok(body) if body.name.is_empty() => body.message,
            Ok(body) => format!("{}: {}", body.name, body.message),
            Err(_) => text.chars().take(ERROR_BODY_PREVIEW_LENGTH).collect(),
        };
        log::error!("Resend {} failed with {}: {}", endpoint, status, message);
        Err(AppError::EmailProvider {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait::async_trait]
impl EmailProvider for ResendClient {
    async fn create_broadcast(&self, broadcast: &Broadcast) -> Result<String, AppError> {
        let body = serde_json::to_value(broadcast)?;
        let text = self.post("broadcasts", &body).await?;
        let created: CreatedObject = serde_json::from_str(&text)?;
        log::info!("Created broadcast {}", created.id);
        Ok(created.id)
    }

    async fn send_broadcast(&self, broadcast_id: &str) -> Result<(), AppError> {
        let endpoint = format!("broadcasts/{}/send", broadcast_id);
        self.post(&endpoint, &serde_json::json!({})).await?;
        log::info!("Sent broadcast {}", broadcast_id);
        Ok(())
    }
}
