//! Newsletter subscribers and the sign-up body.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use yemeni_market_core::SubscriberId;

/// A newsletter subscriber.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: SubscriberId,
    pub email: String,
    pub is_active: bool,
    pub lang: String,
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /api/newsletter`.
#[derive(Debug, Clone, Deserialize)]
pub struct NewsletterRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gdpr_consent: Option<serde_json::Value>,
    #[serde(default)]
    pub lang: Option<String>,
}

impl NewsletterRequest {
    /// Consent counts when it is `true`, a non-zero number or a non-empty string.
    #[must_use]
    pub fn has_consent(&self) -> bool {
        match &self.gdpr_consent {
            Some(serde_json::Value::Bool(b)) => *b,
            Some(serde_json::Value::Number(n)) => n.as_f64().is_some_and(|v| v != 0.0),
            Some(serde_json::Value::String(s)) => !s.is_empty(),
            Some(serde_json::Value::Array(_) | serde_json::Value::Object(_)) => true,
            Some(serde_json::Value::Null) | None => false,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(consent: serde_json::Value) -> NewsletterRequest {
        NewsletterRequest {
            email: Some("a@b.fr".to_owned()),
            gdpr_consent: Some(consent),
            lang: None,
        }
    }

    #[test]
    fn test_consent() {
        assert!(request(json!(true)).has_consent());
        assert!(!request(json!(false)).has_consent());
        assert!(!request(json!(null)).has_consent());
        assert!(request(json!("on")).has_consent());
        assert!(!request(json!("")).has_consent());
        assert!(request(json!(1)).has_consent());
        assert!(!request(json!(0)).has_consent());
    }

    #[test]
    fn test_missing_fields_default_to_none() {
        let req: NewsletterRequest = serde_json::from_value(json!({ "email": "a@b.fr" })).unwrap();
        assert_eq!(req.email.as_deref(), Some("a@b.fr"));
        assert!(!req.has_consent());
        assert!(req.lang.is_none());
    }
}
