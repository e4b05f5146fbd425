//! REST API module for the Voyage booking service.
//!
//! This module provides the `RemoteOperations` seam that the session
//! manager and the request orchestrator call through, the reqwest-backed
//! `ApiClient` implementing it, and the `ApiError` taxonomy.
//!
//! Authenticated endpoints take the full authorization header value,
//! built with [`bearer`].

pub mod client;
pub mod error;
pub mod remote;

pub use client::ApiClient;
pub use error::{ApiError, FailureKind};
pub use remote::{bearer, ApiResponse, RemoteOperations};
