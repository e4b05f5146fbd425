//! Session-aware data access for the Voyage bus booking client.
//!
//! - [`auth::SessionManager`] owns the signed-in identity: sign-in, sign-up,
//!   sign-out and lazy lookup from a stored token, shared through a
//!   [`auth::SessionHandle`].
//! - [`repository::Repository`] runs remote calls as the current user and
//!   publishes results into observable [`repository::ResultStream`]s,
//!   signing out when the server rejects the token.
//! - [`Voyage`] wires both together once at startup.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;
pub mod notify;
pub mod repository;

#[cfg(test)]
pub(crate) mod testing;

pub use context::Voyage;
