use super::repository::{RejectionReason, ResetOutcome, ResetRequestService};
use super::validation::{validate, Email, InvalidEmail};
use chrono::{DateTime, Utc};
use std::rc::Rc;
use thiserror::Error;
use tokio::{sync::watch, task::JoinHandle};
use uuid::Uuid;

/// One submission of a valid address. Identity is the `id`, so submitting the
/// same address twice produces two distinct requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetRequest {
    id: Uuid,
    email: Email,
    submitted_at: DateTime<Utc>,
}

impl ResetRequest {
    fn new(email: Email) -> Self {
        Self {
            id: Uuid::new_v4(),
            email,
            submitted_at: Utc::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn email(&self) -> &Email {
        &self.email
    }

    pub fn submitted_at(&self) -> DateTime<Utc> {
        self.submitted_at
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureReason {
    InvalidEmail(InvalidEmail),
    Rejected {
        reason: RejectionReason,
        message: Option<String>,
    },
}

impl FailureReason {
    /// Text suitable for showing next to the form.
    pub fn message(&self) -> String {
        match self {
            FailureReason::InvalidEmail(err) => err.to_string(),
            FailureReason::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            FailureReason::Rejected { reason, .. } => match reason {
                RejectionReason::Network => "Could not reach the server".to_string(),
                RejectionReason::Server => "The server could not process the request".to_string(),
                RejectionReason::InvalidEmailServerSide => "Email was not accepted".to_string(),
                RejectionReason::Unknown => "Password reset request failed".to_string(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState {
    #[default]
    Idle,
    Submitting(ResetRequest),
    Succeeded(ResetRequest),
    /// `request` is `None` only when the input was rejected locally.
    Failed {
        request: Option<ResetRequest>,
        reason: FailureReason,
    },
}

impl RequestState {
    pub fn name(&self) -> &'static str {
        match self {
            RequestState::Idle => "idle",
            RequestState::Submitting(_) => "submitting",
            RequestState::Succeeded(_) => "succeeded",
            RequestState::Failed { .. } => "failed",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, RequestState::Submitting(_))
    }

    pub fn pending_request(&self) -> Option<&ResetRequest> {
        match self {
            RequestState::Submitting(request) => Some(request),
            _ => None,
        }
    }

    pub fn success_request(&self) -> Option<&ResetRequest> {
        match self {
            RequestState::Succeeded(request) => Some(request),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<String> {
        match self {
            RequestState::Failed { reason, .. } => Some(reason.message()),
            _ => None,
        }
    }

    fn is_submitting(&self, request: &ResetRequest) -> bool {
        matches!(self, RequestState::Submitting(pending) if pending.id == request.id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("cannot {action} while {state}")]
    InvalidTransition {
        action: &'static str,
        state: &'static str,
    },
}

/// Drives the forgot-password form through its request lifecycle.
///
/// The controller is the only writer of [`RequestState`]. Every transition
/// replaces the whole value in a `watch` channel, so any number of readers can
/// observe it through [`current_state`](Self::current_state) or
/// [`subscribe`](Self::subscribe).
///
/// Service calls are dispatched with [`tokio::task::spawn_local`], so the
/// controller must be used from within a [`tokio::task::LocalSet`].
pub struct PasswordResetController<S> {
    service: Rc<S>,
    state: Rc<watch::Sender<RequestState>>,
}

impl<S> PasswordResetController<S>
where
    S: ResetRequestService + 'static,
{
    pub fn new(service: S) -> Self {
        Self::with_service(Rc::new(service))
    }

    pub fn with_service(service: Rc<S>) -> Self {
        let (state, _) = watch::channel(RequestState::Idle);
        Self {
            service,
            state: Rc::new(state),
        }
    }

    pub fn current_state(&self) -> RequestState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.state.subscribe()
    }

    /// Validates `raw_email` and, when it passes, dispatches exactly one
    /// service call. Returns the handle of the dispatched task, or `None` when
    /// nothing was sent (input rejected locally, or a request is in flight).
    ///
    /// # Panics
    ///
    /// Panics if called outside a `LocalSet` with valid input, because the
    /// service call cannot be spawned. The state is left untouched in that
    /// case, so a later submit from inside a `LocalSet` still goes through.
    pub fn submit(&self, raw_email: &str) -> Option<JoinHandle<()>> {
        let in_flight = self.state.borrow().pending_request().map(ResetRequest::id);
        if let Some(request_id) = in_flight {
            tracing::debug!(%request_id, "Ignoring submit while a reset request is in flight");
            return None;
        }

        let email = match validate(raw_email) {
            Ok(email) => email,
            Err(err) => {
                tracing::info!(error = %err, "Password reset input rejected locally");
                self.state.send_replace(RequestState::Failed {
                    request: None,
                    reason: FailureReason::InvalidEmail(err),
                });
                return None;
            }
        };

        let request = ResetRequest::new(email);
        let service = Rc::clone(&self.service);
        let state = Rc::clone(&self.state);
        let dispatched = request.clone();
        // The task cannot run before this call returns, so it always finds
        // its request in `Submitting`.
        let handle = tokio::task::spawn_local(async move {
            let outcome = service.request_reset(&dispatched.email).await;
            settle(&state, &dispatched, outcome);
        });

        tracing::info!(request_id = %request.id, "Dispatching password reset request");
        self.state.send_replace(RequestState::Submitting(request));
        Some(handle)
    }

    /// Applies a service outcome for `request`. Outcomes for anything other
    /// than the request currently being submitted are discarded. Returns
    /// whether the state changed.
    pub fn resolve(&self, request: &ResetRequest, outcome: ResetOutcome) -> bool {
        settle(&self.state, request, outcome)
    }

    /// Returns to `Idle` after a finished cycle. Resetting while a request is
    /// in flight is refused; use [`abandon`](Self::abandon) to supersede it.
    pub fn reset(&self) -> Result<(), ControllerError> {
        let mut result = Ok(());
        self.state.send_if_modified(|current| {
            let state = current.name();
            match current {
                RequestState::Submitting(_) => {
                    result = Err(ControllerError::InvalidTransition {
                        action: "reset",
                        state,
                    });
                    false
                }
                RequestState::Idle => false,
                RequestState::Succeeded(_) | RequestState::Failed { .. } => {
                    *current = RequestState::Idle;
                    true
                }
            }
        });
        result
    }

    /// Gives up on the in-flight request and returns to `Idle`. The request's
    /// response, when it arrives, is discarded as stale.
    pub fn abandon(&self) -> Option<ResetRequest> {
        let mut abandoned = None;
        self.state.send_if_modified(|current| {
            if !current.is_pending() {
                return false;
            }
            if let RequestState::Submitting(request) = std::mem::take(current) {
                abandoned = Some(request);
            }
            true
        });
        if let Some(request) = &abandoned {
            tracing::info!(request_id = %request.id, "Abandoned in-flight password reset request");
        }
        abandoned
    }
}

fn settle(
    state: &watch::Sender<RequestState>,
    request: &ResetRequest,
    outcome: ResetOutcome,
) -> bool {
    state.send_if_modified(|current| {
        if !current.is_submitting(request) {
            tracing::debug!(
                request_id = %request.id,
                state = current.name(),
                "Discarding stale password reset response"
            );
            return false;
        }

        *current = match outcome {
            ResetOutcome::Accepted => {
                tracing::info!(request_id = %request.id, "Password reset request accepted");
                RequestState::Succeeded(request.clone())
            }
            ResetOutcome::Rejected { reason, message } => {
                tracing::warn!(request_id = %request.id, %reason, "Password reset request rejected");
                RequestState::Failed {
                    request: Some(request.clone()),
                    reason: FailureReason::Rejected { reason, message },
                }
            }
        };
        true
    })
}
