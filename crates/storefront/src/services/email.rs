//! Email service for order and account notifications.
//!
//! Uses SMTP via lettre for delivery with Askama HTML and plain-text
//! templates. Transport settings come from the current store settings
//! snapshot on every send, so SMTP changes made in the back-office apply
//! without a restart. Delivery is best effort: callers log failures and
//! never retry.

use std::sync::Arc;

use askama::Template;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use yemeni_market_core::CheckoutTotals;

use super::settings::{SettingsStore, SmtpSettings};
use crate::models::OrderItem;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),
}

// =============================================================================
// Templates
// =============================================================================

/// An order line as printed in the confirmation.
#[derive(Debug, Clone)]
struct LineView {
    name: String,
    quantity: i32,
    total: String,
}

/// Order totals formatted for display.
#[derive(Debug, Clone)]
struct SummaryView {
    subtotal: String,
    discount: Option<String>,
    tax: String,
    /// `Gratuite` when shipping is free.
    shipping: String,
    total: String,
}

impl SummaryView {
    fn new(totals: &CheckoutTotals) -> Self {
        Self {
            subtotal: money(totals.subtotal),
            discount: (!totals.discount.is_zero()).then(|| money(totals.discount)),
            tax: money(totals.tax),
            shipping: if totals.has_free_shipping() {
                "Gratuite".to_owned()
            } else {
                format!("${}", money(totals.shipping))
            },
            total: money(totals.total),
        }
    }
}

fn money(amount: Decimal) -> String {
    format!("{amount:.2}")
}

#[derive(Template)]
#[template(path = "email/order_confirmation.html")]
struct OrderConfirmationHtml<'a> {
    order_number: &'a str,
    lines: &'a [LineView],
    summary: &'a SummaryView,
}

#[derive(Template)]
#[template(path = "email/order_confirmation.txt")]
struct OrderConfirmationText<'a> {
    order_number: &'a str,
    lines: &'a [LineView],
    summary: &'a SummaryView,
}

#[derive(Template)]
#[template(path = "email/order_shipped.html")]
struct OrderShippedHtml<'a> {
    order_number: &'a str,
}

#[derive(Template)]
#[template(path = "email/order_shipped.txt")]
struct OrderShippedText<'a> {
    order_number: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.html")]
struct PasswordResetHtml<'a> {
    reset_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/password_reset.txt")]
struct PasswordResetText<'a> {
    reset_link: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_welcome.html")]
struct NewsletterWelcomeHtml<'a> {
    copy: &'a NewsletterCopy,
    products_url: &'a str,
}

#[derive(Template)]
#[template(path = "email/newsletter_welcome.txt")]
struct NewsletterWelcomeText<'a> {
    copy: &'a NewsletterCopy,
    products_url: &'a str,
}

/// Localized newsletter welcome text.
#[derive(Debug)]
pub struct NewsletterCopy {
    pub lang: &'static str,
    /// `rtl` for Arabic.
    pub dir: &'static str,
    pub subject: &'static str,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub body: &'static str,
    pub button: &'static str,
    pub footer: &'static str,
    pub rights: &'static str,
}

const NEWSLETTER_FR: NewsletterCopy = NewsletterCopy {
    lang: "fr",
    dir: "ltr",
    subject: "Bienvenue dans l'univers Yemeni Market",
    title: "Bienvenue parmi nous",
    subtitle: "Merci de rejoindre notre cercle exclusif.",
    body: "Soyez le premier informé de nos récoltes rares de café Haraz, de nos miels de Sidr \
           précieux et de nos offres spéciales réservées aux membres.",
    button: "Découvrir la Collection",
    footer: "Vous recevez cet email car vous avez accepté de rejoindre notre newsletter.",
    rights: "Tous droits réservés",
};

const NEWSLETTER_EN: NewsletterCopy = NewsletterCopy {
    lang: "en",
    dir: "ltr",
    subject: "Welcome to the Yemeni Market Universe",
    title: "Welcome to the Circle",
    subtitle: "Thank you for joining our exclusive community.",
    body: "Be the first to know about our rare Haraz coffee harvests, precious Sidr honey, \
           and special member-only offers.",
    button: "Discover the Collection",
    footer: "You are receiving this email because you opted in to our newsletter.",
    rights: "All rights reserved",
};

const NEWSLETTER_AR: NewsletterCopy = NewsletterCopy {
    lang: "ar",
    dir: "rtl",
    subject: "مرحباً بكم في عالم يمني ماركت",
    title: "مرحباً بكم في مجتمعنا",
    subtitle: "شكراً لانضمامكم إلى دائرتنا الحصرية.",
    body: "كن أول من يعلم عن حصاد قهوة حراز النادرة، وعسل السدر الملكي الفاخر، والعروض الخاصة للأعضاء فقط.",
    button: "اكتشف المجموعة",
    footer: "تصلك هذه الرسالة لأنك وافقت على الانضمام إلى نشرتنا البريدية.",
    rights: "جميع الحقوق محفوظة",
};

impl NewsletterCopy {
    /// Copy for a language code; unknown languages get French.
    #[must_use]
    pub fn for_lang(lang: &str) -> &'static Self {
        match lang {
            "en" => &NEWSLETTER_EN,
            "ar" => &NEWSLETTER_AR,
            _ => &NEWSLETTER_FR,
        }
    }
}

/// A rendered message, ready to send.
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// Render the order confirmation.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_order_confirmation(
    order_number: &str,
    items: &[OrderItem],
    totals: &CheckoutTotals,
) -> Result<RenderedEmail, EmailError> {
    let lines: Vec<LineView> = items
        .iter()
        .map(|item| LineView {
            name: item.product_name.clone(),
            quantity: item.quantity,
            total: money(item.total_price),
        })
        .collect();
    let summary = SummaryView::new(totals);

    Ok(RenderedEmail {
        subject: format!("Confirmation de votre commande {order_number}"),
        html: OrderConfirmationHtml {
            order_number,
            lines: &lines,
            summary: &summary,
        }
        .render()?,
        text: OrderConfirmationText {
            order_number,
            lines: &lines,
            summary: &summary,
        }
        .render()?,
    })
}

/// Render the shipping notification.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_order_shipped(order_number: &str) -> Result<RenderedEmail, EmailError> {
    Ok(RenderedEmail {
        subject: format!("Commande Expédiée {order_number}"),
        html: OrderShippedHtml { order_number }.render()?,
        text: OrderShippedText { order_number }.render()?,
    })
}

/// Render the password reset email.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_password_reset(reset_link: &str) -> Result<RenderedEmail, EmailError> {
    Ok(RenderedEmail {
        subject: "Réinitialisation de mot de passe".to_owned(),
        html: PasswordResetHtml { reset_link }.render()?,
        text: PasswordResetText { reset_link }.render()?,
    })
}

/// Render the newsletter welcome in the subscriber's language.
///
/// # Errors
///
/// Returns `EmailError::Template` if rendering fails.
pub fn render_newsletter_welcome(
    lang: &str,
    products_url: &str,
) -> Result<RenderedEmail, EmailError> {
    let copy = NewsletterCopy::for_lang(lang);
    Ok(RenderedEmail {
        subject: copy.subject.to_owned(),
        html: NewsletterWelcomeHtml { copy, products_url }.render()?,
        text: NewsletterWelcomeText { copy, products_url }.render()?,
    })
}

// =============================================================================
// Delivery
// =============================================================================

/// Email service for sending transactional emails.
#[derive(Clone)]
pub struct EmailService {
    settings: Arc<SettingsStore>,
}

impl EmailService {
    /// Create an email service reading SMTP settings from the store.
    #[must_use]
    pub const fn new(settings: Arc<SettingsStore>) -> Self {
        Self { settings }
    }

    /// Send the order confirmation.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_confirmation(
        &self,
        to: &str,
        order_number: &str,
        items: &[OrderItem],
        totals: &CheckoutTotals,
    ) -> Result<(), EmailError> {
        let email = render_order_confirmation(order_number, items, totals)?;
        self.send(to, &email).await
    }

    /// Tell the customer their order has shipped.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_order_shipped(&self, to: &str, order_number: &str) -> Result<(), EmailError> {
        let email = render_order_shipped(order_number)?;
        self.send(to, &email).await
    }

    /// Send a password reset link.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_password_reset(&self, to: &str, reset_link: &str) -> Result<(), EmailError> {
        let email = render_password_reset(reset_link)?;
        self.send(to, &email).await
    }

    /// Welcome a new newsletter subscriber.
    ///
    /// # Errors
    ///
    /// Returns error if the email fails to render or send.
    pub async fn send_newsletter_welcome(
        &self,
        to: &str,
        lang: &str,
        products_url: &str,
    ) -> Result<(), EmailError> {
        let email = render_newsletter_welcome(lang, products_url)?;
        self.send(to, &email).await
    }

    /// Send a multipart email with both plain text and HTML versions.
    ///
    /// Skips delivery with a warning when SMTP is not configured.
    async fn send(&self, to: &str, email: &RenderedEmail) -> Result<(), EmailError> {
        let Some(smtp) = self.settings.snapshot().await.smtp() else {
            tracing::warn!(to = %to, subject = %email.subject, "SMTP not configured, email skipped");
            return Ok(());
        };

        let from = Mailbox::new(
            Some(smtp.from_name.clone()),
            smtp.user
                .parse()
                .map_err(|_| EmailError::InvalidAddress(smtp.user.clone()))?,
        );
        let message = Message::builder()
            .from(from)
            .to(to
                .parse()
                .map_err(|_| EmailError::InvalidAddress(to.to_owned()))?)
            .subject(email.subject.as_str())
            .multipart(
                MultiPart::alternative()
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(email.text.clone()),
                    )
                    .singlepart(
                        SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(email.html.clone()),
                    ),
            )?;

        transport(&smtp)?.send(message).await?;

        tracing::info!(to = %to, subject = %email.subject, "Email sent successfully");
        Ok(())
    }
}

/// Build the SMTP transport: implicit TLS when `secure`, STARTTLS otherwise.
fn transport(smtp: &SmtpSettings) -> Result<AsyncSmtpTransport<Tokio1Executor>, SmtpError> {
    let credentials = Credentials::new(
        smtp.user.clone(),
        smtp.password.expose_secret().to_owned(),
    );
    let builder = if smtp.secure {
        AsyncSmtpTransport::<Tokio1Executor>::relay(&smtp.host)?
    } else {
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&smtp.host)?
    };

    Ok(builder.port(smtp.port).credentials(credentials).build())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use yemeni_market_core::{LineAmount, OrderId, OrderItemId, ProductId};

    fn item(name: &str, quantity: i32, price: i64) -> OrderItem {
        let price = Decimal::from(price);
        OrderItem {
            id: OrderItemId::new(1),
            order_id: OrderId::new(1),
            product_id: ProductId::new(1),
            product_name: name.to_owned(),
            quantity,
            price,
            total_price: price * Decimal::from(quantity),
        }
    }

    #[test]
    fn test_order_confirmation_lists_items_and_totals() {
        let items = vec![item("Miel de Sidr Royal", 2, 40)];
        let totals = CheckoutTotals::compute(&[LineAmount::new(Decimal::from(40), 2)], None);
        let email = render_order_confirmation("ORD-1-7", &items, &totals).unwrap();

        assert_eq!(email.subject, "Confirmation de votre commande ORD-1-7");
        assert!(email.html.contains("Miel de Sidr Royal"));
        assert!(email.html.contains("$80.00"));
        assert!(email.html.contains("TVA (20%)"));
        assert!(email.html.contains("$16.00"));
        assert!(email.text.contains("Livraison : $15.00"));
        assert!(email.text.contains("Total : $111.00"));
        assert!(!email.text.contains("Réduction"));
    }

    #[test]
    fn test_free_shipping_reads_gratuite() {
        let items = vec![item("Café Haraz", 3, 45)];
        let totals = CheckoutTotals::compute(&[LineAmount::new(Decimal::from(45), 3)], None);
        let email = render_order_confirmation("ORD-2-1", &items, &totals).unwrap();
        assert!(email.html.contains("Gratuite"));
    }

    #[test]
    fn test_html_escapes_product_names() {
        let items = vec![item("<script>alert(1)</script>", 1, 10)];
        let totals = CheckoutTotals::compute(&[LineAmount::new(Decimal::from(10), 1)], None);
        let email = render_order_confirmation("ORD-3-1", &items, &totals).unwrap();
        assert!(!email.html.contains("<script>"));
        assert!(email.text.contains("<script>"));
    }

    #[test]
    fn test_password_reset_contains_link() {
        let email = render_password_reset("http://localhost:5173/reset-password?token=abc").unwrap();
        assert_eq!(email.subject, "Réinitialisation de mot de passe");
        assert!(email.text.contains("reset-password?token=abc"));
        assert!(email.html.contains("Ce lien expire dans 1 heure."));
    }

    #[test]
    fn test_shipped_subject() {
        let email = render_order_shipped("ORD-9-9").unwrap();
        assert_eq!(email.subject, "Commande Expédiée ORD-9-9");
        assert!(email.text.contains("a été expédiée"));
    }

    #[test]
    fn test_newsletter_languages() {
        let ar = render_newsletter_welcome("ar", "https://yemenimarket.fr/products").unwrap();
        assert!(ar.html.contains(r#"dir="rtl""#));
        assert_eq!(ar.subject, "مرحباً بكم في عالم يمني ماركت");

        let en = render_newsletter_welcome("en", "https://yemenimarket.fr/products").unwrap();
        assert_eq!(en.subject, "Welcome to the Yemeni Market Universe");
        assert!(en.html.contains("https://yemenimarket.fr/products"));

        let fallback = render_newsletter_welcome("de", "https://yemenimarket.fr/products").unwrap();
        assert_eq!(fallback.subject, "Bienvenue dans l'univers Yemeni Market");
        assert!(fallback.html.contains(r#"dir="ltr""#));
    }

    #[tokio::test]
    async fn test_send_without_smtp_is_skipped() {
        let store = Arc::new(SettingsStore::new(
            crate::config::SmtpOverrides::default(),
            crate::config::StripeFallback::default(),
        ));
        let service = EmailService::new(store);
        assert!(
            service
                .send_order_shipped("amina@example.com", "ORD-1-1")
                .await
                .is_ok()
        );
    }
}
