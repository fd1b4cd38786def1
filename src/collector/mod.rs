//! Page-side intent capture: the booking and contact forms, WhatsApp link
//! clicks, and the envelopes the page sends to the dispatcher.
//!
//! Nothing here blocks a form submission; every capture either records
//! something in the store or quietly does nothing.

pub mod analytics;
pub mod client;
pub mod deep_link;
pub mod storage;

use anyhow::Context;
use chrono::{DateTime, Utc};

use crate::config::DEFAULT_BOOKING_URL;
use crate::models::{
    ActionRequest, BookingIntent, BroadcastRequest, ContactOptIn, PhoneNumber, TemplateRef,
    TemplateRequest,
};

pub use analytics::{AnalyticsEvent, AnalyticsSink, TracingAnalytics};
pub use client::{DispatchClient, DispatchReply};
pub use deep_link::deep_link;
pub use storage::{KeyValueStore, MemoryStore};

use storage::{ACCESS_TOKEN_KEY, BOOKING_INTENT_KEY, CONTACT_OPT_IN_KEY};

pub const FOLLOW_UP_GREETING: &str = "Hello, I just submitted an inquiry about 156Euphoria Boutique Villa. I would like to receive updates via WhatsApp.";

#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    pub welcome: TemplateRef,
    pub booking_confirmation: TemplateRef,
    pub abandoned_cart: TemplateRef,
    pub promotional_offer: TemplateRef,
}

impl Default for TemplateCatalog {
    fn default() -> Self {
        Self {
            welcome: TemplateRef::new("welcome_message", "en"),
            booking_confirmation: TemplateRef::new("booking_confirmation", "en"),
            abandoned_cart: TemplateRef::new("abandoned_cart", "en"),
            promotional_offer: TemplateRef::new("promotional_offer", "en"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// The business's own WhatsApp number, target of deep links.
    pub business_phone: String,
    pub booking_url: String,
    pub follow_up_greeting: String,
    pub templates: TemplateCatalog,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            business_phone: "27798393537".to_string(),
            booking_url: DEFAULT_BOOKING_URL.to_string(),
            follow_up_greeting: FOLLOW_UP_GREETING.to_string(),
            templates: TemplateCatalog::default(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ContactForm {
    pub name: String,
    pub email: String,
    pub comments: String,
    pub whatsapp_optin: bool,
}

#[derive(Debug, Clone)]
pub struct OfferDetails {
    pub title: String,
    pub discount: String,
    pub valid_until: String,
    pub booking_link: String,
}

/// Shown after an opted-in contact form goes through.
#[derive(Debug, Clone, PartialEq)]
pub struct FollowUp {
    pub link: String,
}

impl FollowUp {
    pub fn render(&self) -> String {
        format!(
            r#"<div class="alert_message success">
    <p>Thank you for your message! We'll get back to you soon.</p>
    <p>Would you like to receive updates via WhatsApp?</p>
    <a href="{}" class="btn" target="_blank" rel="noopener noreferrer">
        <i class="fa-brands fa-whatsapp"></i> Continue on WhatsApp
    </a>
</div>"#,
            self.link
        )
    }
}

pub struct IntentCollector<S: KeyValueStore> {
    config: CollectorConfig,
    store: S,
    analytics: Box<dyn AnalyticsSink>,
    access_token: Option<String>,
}

impl<S: KeyValueStore> IntentCollector<S> {
    pub fn new(config: CollectorConfig, store: S, analytics: Box<dyn AnalyticsSink>) -> Self {
        let access_token = store.get(ACCESS_TOKEN_KEY);
        tracing::debug!(has_token = access_token.is_some(), "intent collector initialized");
        Self {
            config,
            store,
            analytics,
            access_token,
        }
    }

    pub fn config(&self) -> &CollectorConfig {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Token read from storage at construction. Nothing authenticates with it.
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    /// Tracks clicks on `wa.me` links. Navigation always proceeds.
    pub fn on_link_click(&self, href: &str) {
        if is_whatsapp_link(href) {
            self.analytics.track(&AnalyticsEvent::whatsapp_click());
        }
    }

    /// Stores the search as the current booking intent when both fields are
    /// filled in, replacing any earlier one.
    pub fn capture_booking_intent(
        &mut self,
        dates: &str,
        guests: &str,
    ) -> anyhow::Result<Option<BookingIntent>> {
        if dates.is_empty() || guests.is_empty() {
            return Ok(None);
        }

        let intent = BookingIntent {
            dates: dates.to_string(),
            guests: guests.to_string(),
            captured_at: Utc::now(),
        };
        let json = serde_json::to_string(&intent).context("failed to encode booking intent")?;
        self.store.set(BOOKING_INTENT_KEY, json);
        tracing::info!(dates = %intent.dates, guests = %intent.guests, "booking intent captured");

        Ok(Some(intent))
    }

    /// Only opted-in contacts are kept; they get a follow-up link back.
    pub fn capture_contact(&mut self, form: ContactForm) -> anyhow::Result<Option<FollowUp>> {
        if !form.whatsapp_optin {
            return Ok(None);
        }

        let contact = ContactOptIn {
            name: form.name,
            email: form.email,
            comments: form.comments,
            whatsapp_optin: true,
            captured_at: Utc::now(),
        };
        let json = serde_json::to_string(&contact).context("failed to encode contact opt-in")?;
        self.store.set(CONTACT_OPT_IN_KEY, json);
        tracing::info!(email = %contact.email, "contact with WhatsApp opt-in captured");

        Ok(Some(FollowUp {
            link: self.follow_up_link(),
        }))
    }

    pub fn follow_up_link(&self) -> String {
        deep_link(&self.config.business_phone, &self.config.follow_up_greeting)
    }

    pub fn stored_booking_intent(&self) -> Option<BookingIntent> {
        let raw = self.store.get(BOOKING_INTENT_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(intent) => Some(intent),
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unreadable booking intent");
                None
            }
        }
    }

    /// Reminder for a booking search made less than 24 hours before `now`.
    pub fn abandoned_cart_request(&self, phone: &str, now: DateTime<Utc>) -> Option<ActionRequest> {
        let intent = self
            .stored_booking_intent()
            .filter(|i| !i.dates.is_empty() && !i.guests.is_empty())?;
        if !intent.is_fresh(now) {
            tracing::debug!(captured_at = %intent.captured_at, "booking intent too old for a reminder");
            return None;
        }

        self.template_request(
            phone,
            &self.config.templates.abandoned_cart,
            vec![intent.dates, intent.guests, self.config.booking_url.clone()],
        )
    }

    pub fn promotional_request(&self, phones: Vec<String>, offer: &OfferDetails) -> ActionRequest {
        let template = &self.config.templates.promotional_offer;
        ActionRequest::SendPromotional(BroadcastRequest {
            phones,
            template: template.name.clone(),
            language: template.language.clone(),
            parameters: vec![
                offer.title.clone(),
                offer.discount.clone(),
                offer.valid_until.clone(),
                offer.booking_link.clone(),
            ],
        })
    }

    /// `None` when the phone has no digits to send to.
    pub fn template_request(
        &self,
        phone: &str,
        template: &TemplateRef,
        parameters: Vec<String>,
    ) -> Option<ActionRequest> {
        let phone = PhoneNumber::normalize(phone)?;
        Some(ActionRequest::SendTemplate(TemplateRequest {
            phone,
            template: template.name.clone(),
            language: template.language.clone(),
            parameters,
        }))
    }
}

pub fn is_whatsapp_link(href: &str) -> bool {
    href.starts_with("http://wa.me") || href.starts_with("https://wa.me")
}
