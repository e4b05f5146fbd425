use serde::{Deserialize, Serialize};

/// Quote returned after seats are reserved; `url` is where payment is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayDetails {
    pub url: String,
    #[serde(default)]
    pub amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub seats: Vec<i64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PayRequest {
    pub phone_number: String,
    pub pick_point: i64,
    pub drop_point: i64,
    pub trip_id: i64,
    pub seats: Vec<i64>,
}

/// Published on the pay-status stream when the payment endpoint answers 200.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayStatus {
    Accepted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    pub id: i64,
    pub trip_id: i64,
    #[serde(default)]
    pub seats: Vec<i64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PushTokenRequest {
    #[serde(rename = "FcmToken")]
    pub fcm_token: String,
}
