use std::collections::HashMap;

pub const ACCESS_TOKEN_KEY: &str = "whatsapp_access_token";
pub const BOOKING_INTENT_KEY: &str = "booking_intent";
pub const CONTACT_OPT_IN_KEY: &str = "contact_whatsapp_optin";

/// String key-value storage scoped to one page session, the shape of the
/// browser's `localStorage`.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: String);
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: String) {
        self.entries.insert(key.to_string(), value);
    }
}
