//! Invoice PDF rendering.
//!
//! Produces a single A4 document per invoice using the PDF base-14 fonts,
//! so no font files need to ship with the server. Long orders continue on
//! additional pages.

use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Rect, Rgb,
};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{InvoiceDocument, ShippingAddress};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const ROW_HEIGHT: f32 = 8.0;
/// Lowest baseline for table rows before starting a new page.
const TABLE_BOTTOM: f32 = 45.0;

// #2C1E14, #D4AF37, #F9F7F5
const COFFEE: (f32, f32, f32) = (0.173, 0.118, 0.078);
const GOLD: (f32, f32, f32) = (0.831, 0.686, 0.216);
const ZEBRA: (f32, f32, f32) = (0.976, 0.969, 0.961);
const INK: (f32, f32, f32) = (0.1, 0.1, 0.1);
const MUTED: (f32, f32, f32) = (0.45, 0.45, 0.45);
const WHITE: (f32, f32, f32) = (1.0, 1.0, 1.0);

/// Item table column positions (left edge, mm).
const COL_DESCRIPTION: f32 = MARGIN + 2.0;
const COL_QTY: f32 = 118.0;
const COL_PRICE: f32 = 138.0;
const COL_TOTAL: f32 = 166.0;

/// Errors that can occur while rendering an invoice.
#[derive(Debug, Error)]
pub enum InvoicePdfError {
    /// The PDF writer failed.
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

fn render_error(e: impl std::fmt::Debug) -> InvoicePdfError {
    InvoicePdfError::Render(format!("{e:?}"))
}

fn color((r, g, b): (f32, f32, f32)) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn dollars(amount: Decimal) -> String {
    format!("${amount:.2}")
}

/// Lines of the "Billed To" address block.
///
/// Addresses stored as JSON objects are laid out field by field; anything
/// else is wrapped as free text.
fn address_lines(stored: &str) -> Vec<String> {
    if let Ok(address) = serde_json::from_str::<ShippingAddress>(stored) {
        let filled = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned)
        };
        let city_line = [filled(&address.postal_code), filled(&address.city)]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        return [
            filled(&address.line1),
            filled(&address.line2),
            Some(city_line).filter(|l| !l.is_empty()),
            filled(&address.state),
            filled(&address.country),
        ]
        .into_iter()
        .flatten()
        .collect();
    }
    wrap(stored.trim(), 42)
}

/// Greedy word wrap on character count.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.chars().count() + 1 + word.chars().count() > width {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Shorten a product name to fit the description column.
fn fit(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut short: String = text.chars().take(max.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

struct Fonts {
    regular: IndirectFontRef,
    bold: IndirectFontRef,
}

fn new_page(doc: &PdfDocumentReference) -> PdfLayerReference {
    let (page, layer) = doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    doc.get_page(page).get_layer(layer)
}

fn fill_rect(layer: &PdfLayerReference, rgb: (f32, f32, f32), x: f32, y: f32, w: f32, h: f32) {
    layer.set_fill_color(color(rgb));
    layer.add_rect(Rect::new(Mm(x), Mm(y), Mm(x + w), Mm(y + h)));
}

fn text(
    layer: &PdfLayerReference,
    font: &IndirectFontRef,
    rgb: (f32, f32, f32),
    size: f32,
    x: f32,
    y: f32,
    value: &str,
) {
    layer.set_fill_color(color(rgb));
    layer.use_text(value, size, Mm(x), Mm(y), font);
}

fn table_header(layer: &PdfLayerReference, fonts: &Fonts, y: f32) {
    fill_rect(layer, COFFEE, MARGIN, y - 3.0, PAGE_WIDTH - 2.0 * MARGIN, ROW_HEIGHT);
    text(layer, &fonts.bold, WHITE, 10.0, COL_DESCRIPTION, y, "Item Description");
    text(layer, &fonts.bold, WHITE, 10.0, COL_QTY, y, "Qty");
    text(layer, &fonts.bold, WHITE, 10.0, COL_PRICE, y, "Price");
    text(layer, &fonts.bold, WHITE, 10.0, COL_TOTAL, y, "Total");
}

fn footer(layer: &PdfLayerReference, fonts: &Fonts) {
    text(
        layer,
        &fonts.regular,
        MUTED,
        9.0,
        MARGIN,
        24.0,
        "Thank you for choosing Yemeni Market. We appreciate your purchase of our authentic heritage products.",
    );
    text(
        layer,
        &fonts.regular,
        GOLD,
        9.0,
        MARGIN,
        18.0,
        "\u{a9} 2026 Yemeni Market - Heritage & Excellence",
    );
}

/// Render an invoice as PDF bytes.
///
/// # Errors
///
/// Returns `InvoicePdfError::Render` if the PDF cannot be written.
pub fn render_invoice(document: &InvoiceDocument) -> Result<Vec<u8>, InvoicePdfError> {
    let invoice = &document.invoice;
    let order = &document.order;
    let title = format!("Invoice {}", invoice.invoice_number);

    let (doc, page, layer) = PdfDocument::new(&title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
    let fonts = Fonts {
        regular: doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(render_error)?,
        bold: doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?,
    };
    let mut layer = doc.get_page(page).get_layer(layer);

    // Header band
    fill_rect(&layer, COFFEE, 0.0, PAGE_HEIGHT - 53.0, PAGE_WIDTH, 53.0);
    text(&layer, &fonts.bold, GOLD, 24.0, MARGIN, 272.0, "YEMENI.MARKET");
    text(&layer, &fonts.regular, WHITE, 9.0, MARGIN, 264.0, "AUTHENTICITY & HERITAGE");
    text(
        &layer,
        &fonts.bold,
        WHITE,
        14.0,
        120.0,
        272.0,
        &format!("INVOICE #{}", invoice.invoice_number),
    );

    // Billed to
    let mut y = 228.0;
    text(&layer, &fonts.bold, COFFEE, 11.0, MARGIN, y, "Billed To:");
    let mut billed = match &document.customer {
        Some(customer) => vec![customer.full_name(), customer.email.as_str().to_owned()],
        None => vec!["Guest Customer".to_owned()],
    };
    if document.customer.is_none()
        && let Some(email) = order.contact_email.as_deref().filter(|e| !e.is_empty())
    {
        billed.push(email.to_owned());
    }
    billed.extend(address_lines(&order.shipping_address));
    for line in &billed {
        y -= 5.5;
        text(&layer, &fonts.regular, INK, 10.0, MARGIN, y, line);
    }

    // Invoice details
    let details = [
        format!("Order Number: {}", order.order_number),
        format!("Issued Date: {}", invoice.issued_at.format("%Y-%m-%d")),
        format!("Payment Status: {}", invoice.status),
    ];
    let mut detail_y = 228.0;
    text(&layer, &fonts.bold, COFFEE, 11.0, 120.0, detail_y, "Invoice Details:");
    for line in &details {
        detail_y -= 5.5;
        text(&layer, &fonts.regular, INK, 10.0, 120.0, detail_y, line);
    }

    // Item table
    let mut row_y = y.min(detail_y) - 16.0;
    table_header(&layer, &fonts, row_y);
    for (index, item) in document.items.iter().enumerate() {
        row_y -= ROW_HEIGHT;
        if row_y < TABLE_BOTTOM {
            footer(&layer, &fonts);
            layer = new_page(&doc);
            row_y = PAGE_HEIGHT - 30.0;
            table_header(&layer, &fonts, row_y);
            row_y -= ROW_HEIGHT;
        }
        if index % 2 == 1 {
            fill_rect(&layer, ZEBRA, MARGIN, row_y - 3.0, PAGE_WIDTH - 2.0 * MARGIN, ROW_HEIGHT);
        }
        text(&layer, &fonts.regular, INK, 10.0, COL_DESCRIPTION, row_y, &fit(&item.product_name, 52));
        text(&layer, &fonts.regular, INK, 10.0, COL_QTY, row_y, &item.quantity.to_string());
        text(&layer, &fonts.regular, INK, 10.0, COL_PRICE, row_y, &dollars(item.price));
        text(&layer, &fonts.regular, INK, 10.0, COL_TOTAL, row_y, &dollars(item.total_price));
    }

    // Total
    if row_y - 14.0 < TABLE_BOTTOM {
        footer(&layer, &fonts);
        layer = new_page(&doc);
        row_y = PAGE_HEIGHT - 30.0;
    }
    row_y -= 14.0;
    text(&layer, &fonts.bold, COFFEE, 12.0, COL_PRICE - 20.0, row_y, "Total Amount");
    text(&layer, &fonts.bold, GOLD, 12.0, COL_TOTAL, row_y, &dollars(invoice.amount));

    footer(&layer, &fonts);

    doc.save_to_bytes().map_err(render_error)
}
