use chrono::NaiveDateTime;
use serde::Serialize;

use super::{OptInRequest, PhoneNumber};

pub const DEFAULT_OPT_IN_SOURCE: &str = "website";

#[derive(Debug, Clone, Serialize)]
pub struct OptInRecord {
    pub phone: PhoneNumber,
    pub name: String,
    pub email: String,
    pub timestamp: String,
    pub source: String,
}

impl OptInRecord {
    pub fn from_request(request: OptInRequest, now: NaiveDateTime) -> Self {
        Self {
            phone: request.phone,
            name: request.name,
            email: request.email,
            timestamp: now.format("%Y-%m-%d %H:%M:%S").to_string(),
            source: request
                .source
                .unwrap_or_else(|| DEFAULT_OPT_IN_SOURCE.to_string()),
        }
    }
}
