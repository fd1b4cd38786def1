use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a captured booking search stays eligible for a reminder.
pub const BOOKING_INTENT_TTL_HOURS: i64 = 24;

/// Dates and party size from the booking search form, stored under the
/// page's original JSON keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingIntent {
    pub dates: String,
    pub guests: String,
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
}

impl BookingIntent {
    pub fn is_fresh(&self, now: DateTime<Utc>) -> bool {
        now - self.captured_at < Duration::hours(BOOKING_INTENT_TTL_HOURS)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactOptIn {
    pub name: String,
    pub email: String,
    pub comments: String,
    #[serde(rename = "whatsappOptin")]
    pub whatsapp_optin: bool,
    #[serde(rename = "timestamp")]
    pub captured_at: DateTime<Utc>,
}
