use reqwest::{Client, Response};
use serde_json::Value;

use crate::{
    api::types::{ApiError, DetailResponse, MessageResponse, PasswordResetRequest},
    config::{self, RuntimeConfig},
};

pub struct ApiClient {
    client: Client,
    config: RuntimeConfig,
}

impl ApiClient {
    /// Client built from the process-wide runtime config.
    pub fn new() -> Self {
        Self::with_config(config::current())
    }

    pub fn new_with_base_url(base_url: impl Into<String>) -> Self {
        let mut config = config::current();
        config.api_base_url = base_url.into().trim_end_matches('/').to_string();
        Self::with_config(config)
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "Falling back to default HTTP client");
                Client::new()
            });
        Self { client, config }
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Any 2xx counts as acknowledged. The body is optional and only read
    /// for a human-readable message.
    pub async fn request_password_reset(
        &self,
        email: &str,
    ) -> Result<Option<MessageResponse>, ApiError> {
        let url = self.config.reset_request_url();
        tracing::debug!(%url, "Requesting password reset");
        let response = self
            .client
            .post(&url)
            .json(&PasswordResetRequest {
                email: email.to_string(),
            })
            .send()
            .await
            .map_err(|e| ApiError::request_failed(format!("Request failed: {}", e)))?;

        if response.status().is_success() {
            let body = response
                .bytes()
                .await
                .map_err(|e| ApiError::request_failed(format!("Failed to read response: {}", e)))?;
            Ok(serde_json::from_slice::<MessageResponse>(&body).ok())
        } else {
            Err(error_from_response(response).await)
        }
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new()
    }
}

async fn error_from_response(response: Response) -> ApiError {
    let status = response.status();
    let body = match response.bytes().await {
        Ok(body) => body,
        Err(e) => return ApiError::request_failed(format!("Failed to read error body: {}", e)),
    };

    if let Ok(error) = serde_json::from_slice::<ApiError>(&body) {
        return error;
    }
    let message = serde_json::from_slice::<DetailResponse>(&body)
        .map(|detail| detail.detail)
        .ok()
        .or_else(|| {
            serde_json::from_slice::<Value>(&body)
                .ok()
                .and_then(|value| first_field_error(&value))
        })
        .unwrap_or_else(|| {
            status
                .canonical_reason()
                .unwrap_or("Request failed")
                .to_string()
        });
    ApiError::from_status(status.as_u16(), message)
}

/// First message of a Django REST framework field-error map such as
/// `{"email": ["Enter a valid email address."]}`.
fn first_field_error(value: &Value) -> Option<String> {
    let fields = value.as_object()?;
    let pick = |errors: &Value| {
        errors
            .as_array()?
            .iter()
            .find_map(|item| item.as_str().map(str::to_string))
    };
    fields
        .get("email")
        .and_then(pick)
        .or_else(|| fields.values().find_map(pick))
}
