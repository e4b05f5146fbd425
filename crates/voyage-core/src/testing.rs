//! Scripted doubles shared by the unit tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::Notify;

use crate::api::{ApiError, ApiResponse, FailureKind, RemoteOperations};
use crate::models::{
    Booking, LoginRequest, PayDetails, PayRequest, PickSeatRequest, PushTokenRequest,
    RegisterRequest, Schedule, Seat, Trip, TripQuery, User,
};
use crate::notify::Notifier;

pub(crate) const TOKEN: &str = "tok-1";

/// What a mocked endpoint answers with.
#[derive(Debug, Clone)]
pub(crate) enum Canned<T> {
    Reply(u16, T),
    Status(u16, &'static str),
    Transport,
}

impl<T: Clone> Canned<T> {
    fn respond(&self) -> Result<ApiResponse<T>, ApiError> {
        match self {
            Canned::Reply(status, body) => Ok(ApiResponse::Success {
                status: *status,
                body: body.clone(),
            }),
            Canned::Status(status, body) => Ok(ApiResponse::Failure {
                status: *status,
                body: body.to_string(),
            }),
            Canned::Transport => Err(ApiError::Transport("connection refused".to_string())),
        }
    }
}

pub(crate) fn ok<T>(body: T) -> Canned<T> {
    Canned::Reply(200, body)
}

pub(crate) fn rider(token: Option<&str>) -> User {
    User {
        id: 42,
        first_name: "Wanjiru".to_string(),
        last_name: "Kamau".to_string(),
        email: "wanjiru@example.com".to_string(),
        token: token.map(str::to_string),
    }
}

pub(crate) fn schedule(id: i64) -> Schedule {
    Schedule {
        id,
        departure: "Nairobi".to_string(),
        destination: "Mombasa".to_string(),
        departure_time: Some("08:00".to_string()),
        fare: Some(1500.0),
    }
}

pub(crate) fn trip(id: i64) -> Trip {
    Trip {
        id,
        bus_id: 7,
        departure: "Nairobi".to_string(),
        destination: "Kisumu".to_string(),
        date: Some("2026-11-02".to_string()),
        departure_time: None,
        fare: None,
        available_seats: Some(12),
    }
}

pub(crate) fn seat_list(count: i64) -> Vec<Seat> {
    (1..=count)
        .map(|id| Seat {
            id,
            number: Some(format!("S{}", id)),
            booked: false,
        })
        .collect()
}

pub(crate) fn pay_details() -> PayDetails {
    PayDetails {
        url: "https://pay.example.com/checkout/9".to_string(),
        amount: Some(3000.0),
        currency: Some("KES".to_string()),
        seats: vec![3, 4],
    }
}

pub(crate) fn booking(id: i64) -> Booking {
    Booking {
        id,
        trip_id: 5,
        seats: vec![3],
        status: Some("paid".to_string()),
        created_at: None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Call {
    pub operation: &'static str,
    pub auth: Option<String>,
    pub detail: Option<String>,
}

pub(crate) struct MockRemote {
    pub login: Mutex<Canned<User>>,
    pub register: Mutex<Canned<User>>,
    pub logout: Mutex<Canned<()>>,
    pub current_user: Mutex<Canned<User>>,
    pub schedules: Mutex<Canned<Vec<Schedule>>>,
    pub trips: Mutex<Canned<Vec<Trip>>>,
    pub seats: Mutex<Canned<Vec<Seat>>>,
    pub pick_seat: Mutex<Canned<PayDetails>>,
    pub pay: Mutex<Canned<()>>,
    pub bookings: Mutex<Canned<Vec<Booking>>>,
    pub push: Mutex<Canned<()>>,
    /// Delay applied to the current-user lookup so callers can overlap it.
    pub lookup_delay: Mutex<Option<Duration>>,
    /// When set, the bookings call waits here until notified.
    pub bookings_gate: Mutex<Option<Arc<Notify>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockRemote {
    pub fn new() -> Self {
        Self {
            login: Mutex::new(ok(rider(Some(TOKEN)))),
            register: Mutex::new(ok(rider(Some(TOKEN)))),
            logout: Mutex::new(ok(())),
            current_user: Mutex::new(ok(rider(None))),
            schedules: Mutex::new(ok(vec![schedule(1), schedule(2)])),
            trips: Mutex::new(ok(vec![trip(1)])),
            seats: Mutex::new(ok(seat_list(10))),
            pick_seat: Mutex::new(ok(pay_details())),
            pay: Mutex::new(ok(())),
            bookings: Mutex::new(ok(vec![booking(1)])),
            push: Mutex::new(ok(())),
            lookup_delay: Mutex::new(None),
            bookings_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn record(&self, operation: &'static str, auth: Option<&str>, detail: Option<String>) {
        self.calls.lock().push(Call {
            operation,
            auth: auth.map(str::to_string),
            detail,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().clone()
    }

    pub fn count(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn last(&self, operation: &str) -> Option<Call> {
        self.calls
            .lock()
            .iter()
            .rev()
            .find(|c| c.operation == operation)
            .cloned()
    }
}

#[async_trait]
impl RemoteOperations for MockRemote {
    async fn login(&self, request: &LoginRequest) -> Result<ApiResponse<User>, ApiError> {
        self.record("login", None, Some(request.email.clone()));
        self.login.lock().respond()
    }

    async fn register(&self, request: &RegisterRequest) -> Result<ApiResponse<User>, ApiError> {
        self.record("register", None, Some(request.email.clone()));
        self.register.lock().respond()
    }

    async fn logout(&self, auth: &str) -> Result<ApiResponse<()>, ApiError> {
        self.record("logout", Some(auth), None);
        self.logout.lock().respond()
    }

    async fn current_user(&self, auth: &str) -> Result<ApiResponse<User>, ApiError> {
        self.record("current_user", Some(auth), None);
        let delay = *self.lookup_delay.lock();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.current_user.lock().respond()
    }

    async fn schedules(&self, auth: &str) -> Result<ApiResponse<Vec<Schedule>>, ApiError> {
        self.record("schedules", Some(auth), None);
        self.schedules.lock().respond()
    }

    async fn trips(
        &self,
        auth: &str,
        query: &TripQuery,
    ) -> Result<ApiResponse<Vec<Trip>>, ApiError> {
        let detail = format!("{}->{} {}", query.departure, query.destination, query.date);
        self.record("trips", Some(auth), Some(detail));
        self.trips.lock().respond()
    }

    async fn seats(&self, auth: &str, bus_id: i64) -> Result<ApiResponse<Vec<Seat>>, ApiError> {
        self.record("seats", Some(auth), Some(bus_id.to_string()));
        self.seats.lock().respond()
    }

    async fn pick_seat(
        &self,
        auth: &str,
        request: &PickSeatRequest,
    ) -> Result<ApiResponse<PayDetails>, ApiError> {
        self.record("pick_seat", Some(auth), Some(format!("{:?}", request.seats)));
        self.pick_seat.lock().respond()
    }

    async fn pay(
        &self,
        url: &str,
        auth: &str,
        request: &PayRequest,
    ) -> Result<ApiResponse<()>, ApiError> {
        self.record("pay", Some(auth), Some(format!("{} {}", url, request.phone_number)));
        self.pay.lock().respond()
    }

    async fn bookings(&self, auth: &str) -> Result<ApiResponse<Vec<Booking>>, ApiError> {
        self.record("bookings", Some(auth), None);
        let gate = self.bookings_gate.lock().clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        self.bookings.lock().respond()
    }

    async fn register_push_token(
        &self,
        auth: &str,
        request: &PushTokenRequest,
    ) -> Result<ApiResponse<()>, ApiError> {
        self.record("push", Some(auth), Some(request.fcm_token.clone()));
        self.push.lock().respond()
    }
}

#[derive(Default)]
pub(crate) struct RecordingNotifier {
    invalid: AtomicUsize,
    errors: Mutex<Vec<(String, FailureKind)>>,
}

impl RecordingNotifier {
    pub fn invalid_credentials_shown(&self) -> usize {
        self.invalid.load(Ordering::SeqCst)
    }

    pub fn errors(&self) -> Vec<(String, FailureKind)> {
        self.errors.lock().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn invalid_credentials(&self) {
        self.invalid.fetch_add(1, Ordering::SeqCst);
    }

    fn report_error(&self, operation: &str, error: &ApiError) {
        self.errors.lock().push((operation.to_string(), error.kind()));
    }
}

/// Poll `check` until it holds or roughly half a second passes.
pub(crate) async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}
