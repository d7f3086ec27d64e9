//! Status and kind enums stored as text columns.
//!
//! Each enum round-trips through its exact database/wire spelling via
//! `as_str()`, `Display`, `FromStr` and `TryFrom<String>`. Repository row
//! types decode them with `#[sqlx(try_from = "String")]`.

use serde::{Deserialize, Serialize};

/// Error returned when a string does not name a known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid {kind}: {value}")]
pub struct UnknownVariant {
    /// Name of the enum being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

macro_rules! text_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [Self] = &[$(Self::$variant),+];

            /// The exact text stored in the database and sent over the wire.
            #[must_use]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = UnknownVariant;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    _ => Err(UnknownVariant {
                        kind: $kind,
                        value: s.to_owned(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}

/// Order lifecycle status, changed by admins from the back-office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum OrderStatus {
    #[default]
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

text_enum!(OrderStatus, "order status", {
    Processing => "Processing",
    Shipped => "Shipped",
    Delivered => "Delivered",
    Cancelled => "Cancelled",
});

/// Invoice payment status. Invoices are only issued for paid orders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Paid,
}

text_enum!(InvoiceStatus, "invoice status", { Paid => "PAID" });

/// Status of a payment transaction recorded against an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Completed,
}

text_enum!(TransactionStatus, "transaction status", { Completed => "COMPLETED" });

/// Payment processor that captured the funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentProvider {
    #[default]
    Stripe,
}

text_enum!(PaymentProvider, "payment provider", { Stripe => "STRIPE" });

/// How a coupon's value is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    /// `value` is a percentage of the subtotal.
    Percentage,
    /// `value` is an amount in store currency.
    Fixed,
}

text_enum!(DiscountType, "discount type", {
    Percentage => "percentage",
    Fixed => "fixed",
});

/// Back-office role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminRole {
    /// Full access including admin account management.
    SuperAdmin,
    /// Full access to store management.
    Admin,
}

text_enum!(AdminRole, "admin role", {
    SuperAdmin => "SUPER_ADMIN",
    Admin => "ADMIN",
});

/// Kind of principal a token was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountKind {
    Customer,
    Admin,
    /// Single-purpose password reset token; never grants API access.
    Reset,
}

text_enum!(AccountKind, "account kind", {
    Customer => "customer",
    Admin => "admin",
    Reset => "reset",
});

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_order_status_accepts_only_exact_names() {
        assert_eq!("Shipped".parse::<OrderStatus>().unwrap(), OrderStatus::Shipped);
        assert!("shipped".parse::<OrderStatus>().is_err());
        assert!("Lost".parse::<OrderStatus>().is_err());
        assert_eq!(OrderStatus::ALL.len(), 4);
    }

    #[test]
    fn test_serde_matches_text_form() {
        for status in OrderStatus::ALL {
            let json = serde_json::to_string(status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
        }
        for kind in DiscountType::ALL {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.as_str()));
        }
        assert_eq!(
            serde_json::to_string(&AdminRole::SuperAdmin).unwrap(),
            "\"SUPER_ADMIN\""
        );
    }

    #[test]
    fn test_try_from_string() {
        let role = AdminRole::try_from("ADMIN".to_owned()).unwrap();
        assert_eq!(role, AdminRole::Admin);
        let err = AccountKind::try_from("guest".to_owned()).unwrap_err();
        assert_eq!(err.to_string(), "invalid account kind: guest");
    }

    #[test]
    fn test_defaults_for_new_orders() {
        assert_eq!(OrderStatus::default().as_str(), "Processing");
        assert_eq!(InvoiceStatus::default().as_str(), "PAID");
        assert_eq!(TransactionStatus::default().as_str(), "COMPLETED");
        assert_eq!(PaymentProvider::default().as_str(), "STRIPE");
    }
}
