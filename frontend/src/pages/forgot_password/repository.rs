use super::validation::Email;
use crate::api::{
    ApiClient, ApiError, BAD_REQUEST, INTERNAL_SERVER_ERROR, NOT_FOUND, REQUEST_FAILED,
    VALIDATION_ERROR,
};
use async_trait::async_trait;
use std::{fmt, rc::Rc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    Network,
    Server,
    InvalidEmailServerSide,
    Unknown,
}

impl RejectionReason {
    pub fn as_str(self) -> &'static str {
        match self {
            RejectionReason::Network => "network",
            RejectionReason::Server => "server",
            RejectionReason::InvalidEmailServerSide => "invalid-email-server-side",
            RejectionReason::Unknown => "unknown",
        }
    }

    fn from_api_code(code: &str) -> Self {
        match code {
            REQUEST_FAILED => RejectionReason::Network,
            VALIDATION_ERROR | BAD_REQUEST | NOT_FOUND => RejectionReason::InvalidEmailServerSide,
            INTERNAL_SERVER_ERROR => RejectionReason::Server,
            _ => RejectionReason::Unknown,
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the reset service reported for one request. The client never sees
/// a token or any other payload on acceptance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResetOutcome {
    Accepted,
    Rejected {
        reason: RejectionReason,
        message: Option<String>,
    },
}

impl ResetOutcome {
    pub fn rejected(reason: RejectionReason) -> Self {
        ResetOutcome::Rejected {
            reason,
            message: None,
        }
    }
}

impl From<ApiError> for ResetOutcome {
    fn from(error: ApiError) -> Self {
        ResetOutcome::Rejected {
            reason: RejectionReason::from_api_code(&error.code),
            message: Some(error.error),
        }
    }
}

/// Capability that delivers a reset email. Implementations own transport,
/// retries and timeouts, and must fold every failure into
/// [`ResetOutcome::Rejected`].
#[async_trait(?Send)]
pub trait ResetRequestService {
    async fn request_reset(&self, email: &Email) -> ResetOutcome;
}

#[derive(Clone)]
pub struct ForgotPasswordRepository {
    client: Rc<ApiClient>,
}

impl ForgotPasswordRepository {
    pub fn new_with_client(client: Rc<ApiClient>) -> Self {
        Self { client }
    }
}

#[async_trait(?Send)]
impl ResetRequestService for ForgotPasswordRepository {
    async fn request_reset(&self, email: &Email) -> ResetOutcome {
        match self.client.request_password_reset(email.as_str()).await {
            Ok(Some(resp)) => {
                tracing::debug!(response = %resp.message, "Password reset accepted");
                ResetOutcome::Accepted
            }
            Ok(None) => {
                tracing::debug!("Password reset accepted without a message");
                ResetOutcome::Accepted
            }
            Err(err) => {
                tracing::warn!(code = %err.code, error = %err.error, "Password reset rejected");
                err.into()
            }
        }
    }
}
