pub mod api;
pub mod config;
pub mod pages;

pub use pages::forgot_password::{
    use_forgot_password_controller, Email, PasswordResetController, RequestState,
    ResetOutcome, ResetRequestService,
};
