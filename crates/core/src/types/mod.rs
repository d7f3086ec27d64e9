//! Core types for Yemeni Market.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod money;
pub mod slug;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use money::{CheckoutTotals, Discount, LineAmount, round_money, to_minor_units};
pub use slug::{slugify, unique_slug};
pub use status::*;
