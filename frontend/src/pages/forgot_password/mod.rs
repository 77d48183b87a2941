//! Forgot-password flow: validate the address, send one reset request per
//! user action, and expose the request lifecycle to whatever renders it.

mod repository;
mod validation;
mod view_model;

use crate::api::ApiClient;
use std::rc::Rc;

pub use repository::{ForgotPasswordRepository, RejectionReason, ResetOutcome, ResetRequestService};
pub use validation::{validate, Email, InvalidEmail};
pub use view_model::{
    ControllerError, FailureReason, PasswordResetController, RequestState, ResetRequest,
};

/// Controller wired to the HTTP API using the process-wide runtime config.
pub fn use_forgot_password_controller() -> PasswordResetController<ForgotPasswordRepository> {
    with_api_client(ApiClient::new())
}

pub fn with_api_client(api: ApiClient) -> PasswordResetController<ForgotPasswordRepository> {
    let repository = ForgotPasswordRepository::new_with_client(Rc::new(api));
    PasswordResetController::new(repository)
}
