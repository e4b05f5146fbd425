//! Authenticated data access for the booking screens.
//!
//! `Repository` runs each remote call as the current user and publishes the
//! result into a per-resource `ResultStream` that screens observe.

pub mod orchestrator;
pub mod seats;
pub mod stream;

pub use orchestrator::{DispatchOutcome, Repository, Streams};
pub use seats::{SeatRowCollection, ROW_WIDTH};
pub use stream::{ResultStream, StreamState};
