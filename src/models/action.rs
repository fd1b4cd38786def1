use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::PhoneNumber;
use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionKind {
    OptIn,
    SendTemplate,
    SendPromotional,
    SendAbandonedCart,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::OptIn => "opt_in",
            ActionKind::SendTemplate => "send_template",
            ActionKind::SendPromotional => "send_promotional",
            ActionKind::SendAbandonedCart => "send_abandoned_cart",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "opt_in" => Some(ActionKind::OptIn),
            "send_template" => Some(ActionKind::SendTemplate),
            "send_promotional" => Some(ActionKind::SendPromotional),
            "send_abandoned_cart" => Some(ActionKind::SendAbandonedCart),
            _ => None,
        }
    }

    /// Used in "Missing required fields for ..." messages.
    pub fn label(&self) -> &'static str {
        match self {
            ActionKind::OptIn => "opt-in",
            ActionKind::SendTemplate => "template message",
            ActionKind::SendPromotional => "promotional broadcast",
            ActionKind::SendAbandonedCart => "abandoned cart reminder",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OptInRequest {
    pub phone: PhoneNumber,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateRequest {
    pub phone: PhoneNumber,
    pub template: String,
    pub language: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

/// Recipients are kept as submitted; each is normalised when its send is
/// built so one bad number only fails its own entry.
#[derive(Debug, Clone, Serialize)]
pub struct BroadcastRequest {
    pub phones: Vec<String>,
    pub template: String,
    pub language: String,
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AbandonedCartRequest {
    pub phone: PhoneNumber,
    #[serde(rename = "bookingDetails")]
    pub booking_details: BookingDetails,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookingDetails {
    pub dates: String,
    pub guests: String,
}

/// The dispatcher envelope: `{"action": "...", ...fields}`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ActionRequest {
    OptIn(OptInRequest),
    SendTemplate(TemplateRequest),
    SendPromotional(BroadcastRequest),
    SendAbandonedCart(AbandonedCartRequest),
}

impl ActionRequest {
    pub fn kind(&self) -> ActionKind {
        match self {
            ActionRequest::OptIn(_) => ActionKind::OptIn,
            ActionRequest::SendTemplate(_) => ActionKind::SendTemplate,
            ActionRequest::SendPromotional(_) => ActionKind::SendPromotional,
            ActionRequest::SendAbandonedCart(_) => ActionKind::SendAbandonedCart,
        }
    }

    /// A body that is not JSON is handled like one without an `action`.
    pub fn from_slice(body: &[u8]) -> Result<Self, AppError> {
        let value = serde_json::from_slice(body).unwrap_or(Value::Null);
        Self::from_value(value)
    }

    pub fn from_value(value: Value) -> Result<Self, AppError> {
        let action = match value.get("action") {
            None | Some(Value::Null) => return Err(AppError::MissingAction),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        };
        let kind = ActionKind::parse(&action).ok_or(AppError::UnknownAction(action))?;
        let missing = || AppError::MissingFields(kind);

        let request = match kind {
            ActionKind::OptIn => {
                let raw: RawOptIn = serde_json::from_value(value).map_err(|_| missing())?;
                ActionRequest::OptIn(OptInRequest {
                    phone: raw.phone.as_deref().and_then(PhoneNumber::normalize).ok_or_else(missing)?,
                    name: raw.name.ok_or_else(missing)?,
                    email: raw.email.ok_or_else(missing)?,
                    source: raw.source,
                })
            }
            ActionKind::SendTemplate => {
                let raw: RawTemplate = serde_json::from_value(value).map_err(|_| missing())?;
                ActionRequest::SendTemplate(TemplateRequest {
                    phone: raw.phone.as_deref().and_then(PhoneNumber::normalize).ok_or_else(missing)?,
                    template: raw.template.ok_or_else(missing)?,
                    language: raw.language.ok_or_else(missing)?,
                    // Anything other than an array is ignored.
                    parameters: raw.parameters.as_ref().and_then(text_list).unwrap_or_default(),
                })
            }
            ActionKind::SendPromotional => {
                let raw: RawPromotional = serde_json::from_value(value).map_err(|_| missing())?;
                let phones = raw
                    .phones
                    .as_ref()
                    .and_then(text_list)
                    .filter(|phones| !phones.is_empty())
                    .ok_or_else(missing)?;
                ActionRequest::SendPromotional(BroadcastRequest {
                    phones,
                    template: raw.template.ok_or_else(missing)?,
                    language: raw.language.ok_or_else(missing)?,
                    parameters: raw.parameters.as_ref().and_then(text_list).ok_or_else(missing)?,
                })
            }
            ActionKind::SendAbandonedCart => {
                let raw: RawAbandonedCart = serde_json::from_value(value).map_err(|_| missing())?;
                let details = raw.booking_details.ok_or_else(missing)?;
                ActionRequest::SendAbandonedCart(AbandonedCartRequest {
                    phone: raw.phone.as_deref().and_then(PhoneNumber::normalize).ok_or_else(missing)?,
                    booking_details: BookingDetails {
                        dates: details.get("dates").and_then(scalar_text).ok_or_else(missing)?,
                        guests: details.get("guests").and_then(scalar_text).ok_or_else(missing)?,
                    },
                })
            }
        };

        Ok(request)
    }
}

// Loose shapes straight off the wire. A field is present when the key exists
// and is not null; numbers are accepted where text is expected.

#[derive(Deserialize)]
struct RawOptIn {
    #[serde(default, deserialize_with = "lenient_text")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    email: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    source: Option<String>,
}

#[derive(Deserialize)]
struct RawTemplate {
    #[serde(default, deserialize_with = "lenient_text")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    template: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    language: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
}

#[derive(Deserialize)]
struct RawPromotional {
    #[serde(default)]
    phones: Option<Value>,
    #[serde(default, deserialize_with = "lenient_text")]
    template: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    language: Option<String>,
    #[serde(default)]
    parameters: Option<Value>,
}

#[derive(Deserialize)]
struct RawAbandonedCart {
    #[serde(default, deserialize_with = "lenient_text")]
    phone: Option<String>,
    #[serde(default, rename = "bookingDetails")]
    booking_details: Option<serde_json::Map<String, Value>>,
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(scalar_text))
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn text_list(value: &Value) -> Option<Vec<String>> {
    value.as_array().map(|items| {
        items
            .iter()
            .map(|item| scalar_text(item).unwrap_or_else(|| item.to_string()))
            .collect()
    })
}
