//! Customer, admin and address types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use yemeni_market_core::{AddressId, AdminId, AdminRole, CustomerId, Email};

/// A storefront customer.
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer {
    pub id: CustomerId,
    pub email: Email,
    #[serde(skip)]
    pub password_hash: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// First and last name joined, without stray whitespace.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_owned()
    }
}

/// A back-office account.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Admin {
    pub id: AdminId,
    pub email: Email,
    #[serde(skip)]
    pub password_hash: String,
    pub name: String,
    #[sqlx(try_from = "String")]
    pub role: AdminRole,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A saved customer address.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Address {
    pub id: AddressId,
    pub customer_id: CustomerId,
    pub label: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressDraft {
    pub label: String,
    pub street_address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
    pub is_default: bool,
}

/// Body of `POST /api/customer/address`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressInput {
    pub label: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub phone: Option<String>,
}

impl AddressInput {
    /// Validate and apply defaults (`Home`, `France`, not default).
    ///
    /// Returns `None` when street or city is missing.
    #[must_use]
    pub fn into_draft(self) -> Option<AddressDraft> {
        let filled = |v: Option<String>| v.map(|s| s.trim().to_owned()).filter(|s| !s.is_empty());

        Some(AddressDraft {
            street_address: filled(self.street_address)?,
            city: filled(self.city)?,
            label: filled(self.label).unwrap_or_else(|| "Home".to_owned()),
            state: String::new(),
            postal_code: filled(self.postal_code).unwrap_or_default(),
            country: filled(self.country).unwrap_or_else(|| "France".to_owned()),
            phone: filled(self.phone).unwrap_or_default(),
            is_default: false,
        })
    }
}

/// Customer as listed in the back-office.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCustomer {
    #[serde(flatten)]
    pub customer: Customer,
    pub addresses: Vec<Address>,
    #[serde(rename = "orderCount")]
    pub order_count: i64,
    #[serde(rename = "totalSpent", with = "rust_decimal::serde::float")]
    pub total_spent: Decimal,
}

/// Customer row with order aggregates.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CustomerStatsRow {
    #[sqlx(flatten)]
    pub customer: Customer,
    pub order_count: i64,
    pub total_spent: Decimal,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_full_name_trims() {
        let customer = Customer {
            id: CustomerId::new(1),
            email: Email::parse("amina@example.com").unwrap(),
            password_hash: Some("$2b$10$hash".to_owned()),
            first_name: "Amina".to_owned(),
            last_name: String::new(),
            phone: None,
            created_at: Utc::now(),
        };
        assert_eq!(customer.full_name(), "Amina");

        let value = serde_json::to_value(&customer).unwrap();
        assert!(value.get("password_hash").is_none());
        assert_eq!(value["email"], "amina@example.com");
    }

    #[test]
    fn test_address_defaults() {
        let draft = AddressInput {
            street_address: Some("12 rue de la Paix".to_owned()),
            city: Some("Paris".to_owned()),
            ..AddressInput::default()
        }
        .into_draft()
        .unwrap();
        assert_eq!(draft.label, "Home");
        assert_eq!(draft.country, "France");
        assert!(!draft.is_default);
    }

    #[test]
    fn test_address_requires_street_and_city() {
        let missing_city = AddressInput {
            street_address: Some("12 rue de la Paix".to_owned()),
            city: Some("  ".to_owned()),
            ..AddressInput::default()
        };
        assert!(missing_city.into_draft().is_none());
    }
}
