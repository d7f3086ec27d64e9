//! Domain models for the storefront API.
//!
//! Row types derive `sqlx::FromRow` and are serialized directly as API
//! responses. Request bodies are accepted loosely (numbers may arrive as
//! strings) and validated into drafts before anything is written.

pub mod account;
pub mod catalog;
pub mod coupon;
pub mod newsletter;
pub mod order;
pub mod review;
pub mod store_config;

pub use account::{Address, AddressDraft, AddressInput, Admin, AdminCustomer, Customer};
pub use catalog::{
    AdminProduct, Category, Product, ProductDetail, ProductDraft, ProductFilter, ProductInput,
    ProductListing, ProductQuery, ProductSort, ProductVariant,
};
pub use coupon::{Coupon, CouponRejection, CouponValidation, CouponValidationRequest};
pub use order::{
    AdminOrder, CartLine, CheckoutRequest, Invoice, InvoiceDocument, InvoiceWithOrder, Order,
    OrderItem, OrderWithItems, PaymentIntentRequest, ShippingAddress, StoreStats, Transaction,
};
pub use review::{NewReview, Review, ReviewWithAuthor};
pub use newsletter::{NewsletterRequest, Subscriber};
pub use store_config::{StoreConfigEntry, StoreConfigUpdate};
