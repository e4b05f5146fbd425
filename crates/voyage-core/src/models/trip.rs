use serde::{Deserialize, Serialize};

/// A recurring departure on a route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub departure: String,
    pub destination: String,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub fare: Option<f64>,
}

/// A concrete bus journey on a given date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: i64,
    pub bus_id: i64,
    pub departure: String,
    pub destination: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub departure_time: Option<String>,
    #[serde(default)]
    pub fare: Option<f64>,
    #[serde(default)]
    pub available_seats: Option<u32>,
}

/// Search parameters for the trips endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct TripQuery {
    pub departure: String,
    pub destination: String,
    pub date: String,
}
