//! Data models for Voyage entities.
//!
//! This module contains the request and response structures exchanged
//! with the Voyage booking API:
//!
//! - `User`, `LoginRequest`, `RegisterRequest`: Account and auth payloads
//! - `Schedule`, `Trip`, `TripQuery`: Timetables and trip search
//! - `Seat`, `PickSeatRequest`: Bus seat layout and reservation
//! - `Booking`, `PayDetails`, `PayRequest`, `PayStatus`: Payment and history

pub mod booking;
pub mod seat;
pub mod trip;
pub mod user;

pub use booking::{Booking, PayDetails, PayRequest, PayStatus, PushTokenRequest};
pub use seat::{PickSeatRequest, Seat};
pub use trip::{Schedule, Trip, TripQuery};
pub use user::{LoginRequest, RegisterRequest, User};
