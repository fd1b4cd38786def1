use std::env;
use std::time::Duration;

pub const DEFAULT_BOOKING_URL: &str = "https://156euphoriavilla.co.za/booking";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeliveryMode {
    /// Build payloads and echo them back without calling the provider.
    Simulate,
    Live,
}

impl DeliveryMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryMode::Simulate => "simulate",
            DeliveryMode::Live => "live",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "live" | "production" => DeliveryMode::Live,
            _ => DeliveryMode::Simulate,
        }
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub mode: DeliveryMode,
    pub access_token: String,
    pub phone_number_id: String,
    pub api_version: String,
    pub base_url: String,
    pub provider_timeout: Duration,
    pub max_retries: u32,
    pub booking_url: String,
    pub cors_allow_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            mode: env::var("WHATSAPP_MODE")
                .map(|v| DeliveryMode::parse(&v))
                .unwrap_or(DeliveryMode::Simulate),
            access_token: env::var("WHATSAPP_ACCESS_TOKEN").unwrap_or_default(),
            phone_number_id: env::var("WHATSAPP_PHONE_NUMBER_ID").unwrap_or_default(),
            api_version: env::var("WHATSAPP_API_VERSION").unwrap_or_else(|_| "v18.0".to_string()),
            base_url: env::var("WHATSAPP_BASE_URL")
                .unwrap_or_else(|_| "https://graph.facebook.com/".to_string()),
            provider_timeout: Duration::from_secs(
                env::var("WHATSAPP_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            max_retries: env::var("WHATSAPP_MAX_RETRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(2),
            booking_url: env::var("BOOKING_URL")
                .unwrap_or_else(|_| DEFAULT_BOOKING_URL.to_string()),
            cors_allow_origin: env::var("CORS_ALLOW_ORIGIN").ok().filter(|v| !v.is_empty()),
        }
    }

    /// `{base}{version}/{phone_number_id}/messages`, tolerating a base URL
    /// without its trailing slash.
    pub fn messages_url(&self) -> String {
        let base = if self.base_url.ends_with('/') {
            self.base_url.clone()
        } else {
            format!("{}/", self.base_url)
        };
        format!("{base}{}/{}/messages", self.api_version, self.phone_number_id)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            mode: DeliveryMode::Simulate,
            access_token: String::new(),
            phone_number_id: String::new(),
            api_version: "v18.0".to_string(),
            base_url: "https://graph.facebook.com/".to_string(),
            provider_timeout: Duration::from_secs(10),
            max_retries: 2,
            booking_url: DEFAULT_BOOKING_URL.to_string(),
            cors_allow_origin: None,
        }
    }
}
