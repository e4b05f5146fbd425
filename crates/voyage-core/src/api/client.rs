//! API client for communicating with the Voyage REST API.
//!
//! This module provides the `ApiClient` struct, the production
//! implementation of [`RemoteOperations`] on top of reqwest.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::config::Config;
use crate::models::{
    Booking, LoginRequest, PayDetails, PayRequest, PickSeatRequest, PushTokenRequest,
    RegisterRequest, Schedule, Seat, Trip, TripQuery, User,
};

use super::{ApiError, ApiResponse, RemoteOperations};

/// API client for the Voyage service.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    /// Create a new API client for the given base URL
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .default_headers(Self::default_headers())
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(
            &config.base_url,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn default_headers() -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );
        headers
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request and parse a JSON body on success.
    async fn send_json<T: DeserializeOwned>(
        request: RequestBuilder,
    ) -> Result<ApiResponse<T>, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            let text = response.text().await?;
            let body = serde_json::from_str(&text).map_err(|e| {
                ApiError::InvalidResponse(format!(
                    "{}: {}",
                    e,
                    ApiError::truncate_body(&text)
                ))
            })?;
            Ok(ApiResponse::Success {
                status: status.as_u16(),
                body,
            })
        } else {
            Self::failure(response).await
        }
    }

    /// Send a request whose success body carries nothing we use.
    async fn send_empty(request: RequestBuilder) -> Result<ApiResponse<()>, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(ApiResponse::Success {
                status: status.as_u16(),
                body: (),
            })
        } else {
            Self::failure(response).await
        }
    }

    async fn failure<T>(response: reqwest::Response) -> Result<ApiResponse<T>, ApiError> {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        debug!(status, "Request returned non-success status");
        Ok(ApiResponse::Failure {
            status,
            body: ApiError::truncate_body(&body),
        })
    }
}

#[async_trait]
impl RemoteOperations for ApiClient {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<User>, ApiError> {
        Self::send_json(self.client.post(self.url("login")).json(request)).await
    }

    async fn register(&self, request: &RegisterRequest) -> Result<ApiResponse<User>, ApiError> {
        Self::send_json(self.client.post(self.url("register")).json(request)).await
    }

    async fn logout(&self, auth: &str) -> Result<ApiResponse<()>, ApiError> {
        Self::send_empty(
            self.client
                .post(self.url("logout"))
                .header(header::AUTHORIZATION, auth),
        )
        .await
    }

    async fn current_user(&self, auth: &str) -> Result<ApiResponse<User>, ApiError> {
        Self::send_json(
            self.client
                .get(self.url("user"))
                .header(header::AUTHORIZATION, auth),
        )
        .await
    }

    async fn schedules(&self, auth: &str) -> Result<ApiResponse<Vec<Schedule>>, ApiError> {
        Self::send_json(
            self.client
                .get(self.url("schedules"))
                .header(header::AUTHORIZATION, auth),
        )
        .await
    }

    async fn trips(
        &self,
        auth: &str,
        query: &TripQuery,
    ) -> Result<ApiResponse<Vec<Trip>>, ApiError> {
        Self::send_json(
            self.client
                .post(self.url("trips"))
                .header(header::AUTHORIZATION, auth)
                .json(query),
        )
        .await
    }

    async fn seats(&self, auth: &str, bus_id: i64) -> Result<ApiResponse<Vec<Seat>>, ApiError> {
        Self::send_json(
            self.client
                .get(self.url(&format!("buses/{}/seats", bus_id)))
                .header(header::AUTHORIZATION, auth),
        )
        .await
    }

    async fn pick_seat(
        &self,
        auth: &str,
        request: &PickSeatRequest,
    ) -> Result<ApiResponse<PayDetails>, ApiError> {
        Self::send_json(
            self.client
                .post(self.url("seats/pick"))
                .header(header::AUTHORIZATION, auth)
                .json(request),
        )
        .await
    }

    async fn pay(
        &self,
        url: &str,
        auth: &str,
        request: &PayRequest,
    ) -> Result<ApiResponse<()>, ApiError> {
        Self::send_empty(
            self.client
                .post(url)
                .header(header::AUTHORIZATION, auth)
                .json(request),
        )
        .await
    }

    async fn bookings(&self, auth: &str) -> Result<ApiResponse<Vec<Booking>>, ApiError> {
        Self::send_json(
            self.client
                .get(self.url("bookings"))
                .header(header::AUTHORIZATION, auth),
        )
        .await
    }

    async fn register_push_token(
        &self,
        auth: &str,
        request: &PushTokenRequest,
    ) -> Result<ApiResponse<()>, ApiError> {
        Self::send_empty(
            self.client
                .post(self.url("fcm-token"))
                .header(header::AUTHORIZATION, auth)
                .json(request),
        )
        .await
    }
}
