//! The catalog of remote calls the session layer depends on.

use async_trait::async_trait;

use crate::models::{
    Booking, LoginRequest, PayDetails, PayRequest, PickSeatRequest, PushTokenRequest,
    RegisterRequest, Schedule, Seat, Trip, TripQuery, User,
};

use super::ApiError;

/// Build the authorization header value for a stored token.
pub fn bearer(token: &str) -> String {
    format!("Bearer {}", token)
}

/// A response that reached us. Transport failures are `Err(ApiError)` instead.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse<T> {
    Success { status: u16, body: T },
    Failure { status: u16, body: String },
}

/// Remote calls used by the session manager and the request orchestrator.
///
/// `auth` is always the full header value produced by [`bearer`].
#[async_trait]
pub trait RemoteOperations: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<User>, ApiError>;

    async fn register(&self, request: &RegisterRequest) -> Result<ApiResponse<User>, ApiError>;

    async fn logout(&self, auth: &str) -> Result<ApiResponse<()>, ApiError>;

    async fn current_user(&self, auth: &str) -> Result<ApiResponse<User>, ApiError>;

    async fn schedules(&self, auth: &str) -> Result<ApiResponse<Vec<Schedule>>, ApiError>;

    async fn trips(&self, auth: &str, query: &TripQuery)
        -> Result<ApiResponse<Vec<Trip>>, ApiError>;

    async fn seats(&self, auth: &str, bus_id: i64) -> Result<ApiResponse<Vec<Seat>>, ApiError>;

    async fn pick_seat(
        &self,
        auth: &str,
        request: &PickSeatRequest,
    ) -> Result<ApiResponse<PayDetails>, ApiError>;

    /// Payment is posted to a URL handed out by `pick_seat`, not a fixed route.
    async fn pay(
        &self,
        url: &str,
        auth: &str,
        request: &PayRequest,
    ) -> Result<ApiResponse<()>, ApiError>;

    async fn bookings(&self, auth: &str) -> Result<ApiResponse<Vec<Booking>>, ApiError>;

    async fn register_push_token(
        &self,
        auth: &str,
        request: &PushTokenRequest,
    ) -> Result<ApiResponse<()>, ApiError>;
}
