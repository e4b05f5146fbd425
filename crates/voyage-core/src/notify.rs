//! Side channels out of the session layer.
//!
//! `Notifier` carries user-visible notices and the error reporting channel;
//! `PushTokenSource` supplies the device push token forwarded after sign-in.

use tracing::{error, warn};

use crate::api::ApiError;

pub trait Notifier: Send + Sync {
    /// Sign-in was refused with 401.
    fn invalid_credentials(&self);

    /// A request failed and the failure is not retried.
    fn report_error(&self, operation: &str, error: &ApiError);
}

/// Routes everything to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn invalid_credentials(&self) {
        warn!("Invalid credentials");
    }

    fn report_error(&self, operation: &str, error: &ApiError) {
        error!(operation, error = %error, kind = ?error.kind(), "Request failed");
    }
}

pub trait PushTokenSource: Send + Sync {
    fn device_token(&self) -> Option<String>;
}

/// A push token fixed at startup, e.g. read from the environment.
#[derive(Debug, Default, Clone)]
pub struct StaticPushToken(pub Option<String>);

impl PushTokenSource for StaticPushToken {
    fn device_token(&self) -> Option<String> {
        self.0.clone()
    }
}
