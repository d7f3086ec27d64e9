//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Password accounts and signed bearer tokens
//! - `checkout` - Cart pricing and the order transaction
//! - `email` - Transactional and newsletter email over SMTP
//! - `invoice_pdf` - Invoice document rendering
//! - `payments` - Stripe payment intents
//! - `settings` - Runtime settings snapshot (SMTP, Stripe)

pub mod auth;
pub mod checkout;
pub mod email;
pub mod invoice_pdf;
pub mod payments;
pub mod settings;
