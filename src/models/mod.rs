pub mod action;
pub mod intent;
pub mod opt_in;
pub mod phone;
pub mod template;

pub use action::{
    AbandonedCartRequest, ActionKind, ActionRequest, BookingDetails, BroadcastRequest,
    OptInRequest, TemplateRequest,
};
pub use intent::{BookingIntent, ContactOptIn};
pub use opt_in::OptInRecord;
pub use phone::PhoneNumber;
pub use template::{TemplatePayload, TemplateRef};
