use std::future::Future;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::api::{bearer, ApiError, ApiResponse, FailureKind, RemoteOperations};
use crate::auth::{Identity, SessionManager};
use crate::models::{
    Booking, PayDetails, PayRequest, PayStatus, PickSeatRequest, PushTokenRequest, Schedule,
    Trip, TripQuery,
};
use crate::notify::{Notifier, PushTokenSource};

use super::{ResultStream, SeatRowCollection};

/// What happened to a single orchestrated call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// Success; the stream holds the new value.
    Published,
    /// Success status, but not one that publishes (pay only publishes on 200).
    Ignored { status: u16 },
    /// 401; the session was signed out and the stream left alone.
    Unauthorized,
    /// Any other non-success status; reported, stream left alone.
    Rejected { status: u16 },
    /// No response; reported and the stream set to `Failed`.
    Failed,
    /// No usable session, so nothing was sent.
    NoSession,
}

/// The observable result slots, one per resource.
#[derive(Debug, Default)]
pub struct Streams {
    pub schedules: ResultStream<Vec<Schedule>>,
    pub trips: ResultStream<Vec<Trip>>,
    pub seats: ResultStream<SeatRowCollection>,
    pub pay_details: ResultStream<PayDetails>,
    pub pay_status: ResultStream<PayStatus>,
    pub bookings: ResultStream<Vec<Booking>>,
}

/// Runs remote operations as the signed-in user.
/// Clone is cheap - every field is shared.
#[derive(Clone)]
pub struct Repository {
    remote: Arc<dyn RemoteOperations>,
    session: Arc<SessionManager>,
    notifier: Arc<dyn Notifier>,
    push: Arc<dyn PushTokenSource>,
    streams: Arc<Streams>,
}

impl Repository {
    pub fn new(
        remote: Arc<dyn RemoteOperations>,
        session: Arc<SessionManager>,
        notifier: Arc<dyn Notifier>,
        push: Arc<dyn PushTokenSource>,
    ) -> Self {
        Self {
            remote,
            session,
            notifier,
            push,
            streams: Arc::new(Streams::default()),
        }
    }

    pub fn streams(&self) -> &Streams {
        &self.streams
    }

    pub fn session(&self) -> &Arc<SessionManager> {
        &self.session
    }

    // ===== Schedules =====

    pub async fn load_schedules(&self) -> DispatchOutcome {
        self.dispatch(
            "schedules",
            Some(&self.streams.schedules),
            |remote, auth| async move { remote.schedules(&auth).await },
            |_, schedules| Some(schedules),
        )
        .await
    }

    // ===== Trips =====

    pub async fn search_trips(
        &self,
        departure: &str,
        destination: &str,
        date: &str,
    ) -> DispatchOutcome {
        let query = TripQuery {
            departure: departure.to_string(),
            destination: destination.to_string(),
            date: date.to_string(),
        };
        self.dispatch(
            "trips",
            Some(&self.streams.trips),
            move |remote, auth| async move { remote.trips(&auth, &query).await },
            |_, trips| Some(trips),
        )
        .await
    }

    // ===== Seats =====

    /// Fetch the bus layout and publish it grouped into rows.
    pub async fn load_seats(&self, bus_id: i64) -> DispatchOutcome {
        self.dispatch(
            "seats",
            Some(&self.streams.seats),
            move |remote, auth| async move { remote.seats(&auth, bus_id).await },
            |_, seats| Some(SeatRowCollection::from_seats(seats)),
        )
        .await
    }

    pub async fn reserve_seats(
        &self,
        pick_point: i64,
        drop_point: i64,
        trip_id: i64,
        seats: Vec<i64>,
    ) -> DispatchOutcome {
        let request = PickSeatRequest {
            pick_point,
            drop_point,
            trip_id,
            seats,
        };
        self.dispatch(
            "pick_seat",
            Some(&self.streams.pay_details),
            move |remote, auth| async move { remote.pick_seat(&auth, &request).await },
            |_, details| Some(details),
        )
        .await
    }

    // ===== Payment =====

    /// Post payment to `url` (from [`PayDetails`]). Publishes
    /// [`PayStatus::Accepted`] only on a 200.
    pub async fn pay(
        &self,
        url: &str,
        phone_number: &str,
        trip_id: i64,
        pick_point: i64,
        drop_point: i64,
        seats: Vec<i64>,
    ) -> DispatchOutcome {
        let url = url.to_string();
        let request = PayRequest {
            phone_number: phone_number.to_string(),
            pick_point,
            drop_point,
            trip_id,
            seats,
        };
        self.dispatch(
            "pay",
            Some(&self.streams.pay_status),
            move |remote, auth| async move { remote.pay(&url, &auth, &request).await },
            |status, ()| (status == 200).then_some(PayStatus::Accepted),
        )
        .await
    }

    // ===== Bookings =====

    /// Publishes only on a 200, like [`Repository::pay`].
    pub async fn load_bookings(&self) -> DispatchOutcome {
        self.dispatch(
            "bookings",
            Some(&self.streams.bookings),
            |remote, auth| async move { remote.bookings(&auth).await },
            |status, bookings| (status == 200).then_some(bookings),
        )
        .await
    }

    // ===== Push registration =====

    /// Forward the device push token, if there is one. `None` means no token.
    pub async fn register_device(&self) -> Option<DispatchOutcome> {
        match self.push.device_token() {
            Some(token) => Some(self.register_push_token(token).await),
            None => {
                debug!("Push token absent");
                None
            }
        }
    }

    pub async fn register_push_token(&self, token: String) -> DispatchOutcome {
        let request = PushTokenRequest { fcm_token: token };
        self.dispatch(
            "push_token",
            None::<&ResultStream<()>>,
            move |remote, auth| async move { remote.register_push_token(&auth, &request).await },
            |_, ()| Some(()),
        )
        .await
    }

    /// Resolve the session, call `call` with its authorization header, and
    /// route the response into `stream`.
    ///
    /// Call arguments (body, path parameter, URL override) travel inside
    /// `call`. `publish` turns a success body into the stream value, or
    /// `None` to leave the stream alone.
    async fn dispatch<T, U, F, Fut>(
        &self,
        operation: &'static str,
        stream: Option<&ResultStream<U>>,
        call: F,
        publish: impl FnOnce(u16, T) -> Option<U>,
    ) -> DispatchOutcome
    where
        F: FnOnce(Arc<dyn RemoteOperations>, String) -> Fut,
        Fut: Future<Output = Result<ApiResponse<T>, ApiError>>,
    {
        let Some(handle) = self.session.current_user() else {
            debug!(operation, "No signed-in user, skipping request");
            return DispatchOutcome::NoSession;
        };

        let token = match handle.resolved().await {
            Some(Identity::User(user)) => match user.token {
                Some(token) => token,
                None => {
                    warn!(operation, "Session has no token, skipping request");
                    return DispatchOutcome::NoSession;
                }
            },
            Some(Identity::Degraded { reason }) => {
                warn!(operation, reason = %reason, "Session unavailable, skipping request");
                return DispatchOutcome::NoSession;
            }
            None => {
                debug!(operation, "Session reset before request, skipping");
                return DispatchOutcome::NoSession;
            }
        };

        match call(Arc::clone(&self.remote), bearer(&token)).await {
            Ok(ApiResponse::Success { status, body }) => match publish(status, body) {
                Some(value) => {
                    if let Some(stream) = stream {
                        stream.publish(value);
                    }
                    debug!(operation, status, "Published response");
                    DispatchOutcome::Published
                }
                None => {
                    debug!(operation, status, "Response not published");
                    DispatchOutcome::Ignored { status }
                }
            },
            Ok(ApiResponse::Failure { status, body }) => {
                let error = ApiError::from_status(status, &body);
                if error.kind() == FailureKind::Authorization {
                    // Only the session this request ran under may be ended
                    if self.session.sign_out_if_current(&handle) {
                        warn!(operation, "Token rejected, logging out user");
                    } else {
                        debug!(operation, "Token rejected for a session already replaced");
                    }
                    DispatchOutcome::Unauthorized
                } else {
                    warn!(operation, status, body = %body, "Request rejected");
                    self.notifier.report_error(operation, &error);
                    DispatchOutcome::Rejected { status }
                }
            }
            Err(error) => {
                self.notifier.report_error(operation, &error);
                if let Some(stream) = stream {
                    stream.fail();
                }
                DispatchOutcome::Failed
            }
        }
    }
}
