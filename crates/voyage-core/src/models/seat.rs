use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seat {
    pub id: i64,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub booked: bool,
}

/// Reservation request for one or more seats on a trip.
#[derive(Debug, Clone, Serialize)]
pub struct PickSeatRequest {
    pub pick_point: i64,
    pub drop_point: i64,
    pub trip_id: i64,
    pub seats: Vec<i64>,
}
