use url::form_urlencoded;

/// `https://wa.me/<digits>?text=<message>`, opening a chat with the message
/// pre-filled.
pub fn deep_link(phone: &str, text: &str) -> String {
    let digits: String = phone.chars().filter(char::is_ascii_digit).collect();
    format!("https://wa.me/{digits}?text={}", encode_component(text))
}

// Form encoding writes spaces as '+'; the link wants %20. Literal '+' has
// already become %2B at this point.
fn encode_component(text: &str) -> String {
    form_urlencoded::byte_serialize(text.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
