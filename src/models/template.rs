use serde::{Deserialize, Serialize};

use super::PhoneNumber;

/// A pre-approved template known to the page script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRef {
    pub name: String,
    pub language: String,
}

impl TemplateRef {
    pub fn new(name: &str, language: &str) -> Self {
        Self {
            name: name.to_string(),
            language: language.to_string(),
        }
    }
}

// Cloud API message body for `type: template`.
#[derive(Debug, Clone, Serialize)]
pub struct TemplatePayload {
    pub messaging_product: &'static str,
    pub to: PhoneNumber,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub template: TemplateBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateBody {
    pub name: String,
    pub language: TemplateLanguage,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub components: Vec<TemplateComponent>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateLanguage {
    pub code: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TemplateComponent {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub parameters: Vec<TextParameter>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TextParameter {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

impl TemplatePayload {
    /// Parameters, if any, go into a single `body` component in order.
    pub fn new(to: PhoneNumber, name: &str, language: &str, parameters: &[String]) -> Self {
        let components = if parameters.is_empty() {
            Vec::new()
        } else {
            vec![TemplateComponent {
                kind: "body",
                parameters: parameters
                    .iter()
                    .map(|text| TextParameter {
                        kind: "text",
                        text: text.clone(),
                    })
                    .collect(),
            }]
        };

        Self {
            messaging_product: "whatsapp",
            to,
            kind: "template",
            template: TemplateBody {
                name: name.to_string(),
                language: TemplateLanguage {
                    code: language.to_string(),
                },
                components,
            },
        }
    }
}
