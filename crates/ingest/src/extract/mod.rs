//! Turning raw email bodies into order drafts.

pub mod engine;
pub mod markup;
pub mod plain_text;
pub mod strategy;
pub mod vendor;

use scraper::{ElementRef, Html};

pub use engine::{DropReason, Extraction, ExtractionEngine, RejectReason};
pub use strategy::Strategy;
pub use vendor::{LoadBoardVendor, VendorAdapter};

const BLOCK_ELEMENTS: [&str; 13] = [
    "p", "div", "tr", "li", "table", "h1", "h2", "h3", "h4", "h5", "h6", "ul", "ol",
];

fn push_text(element: ElementRef<'_>, out: &mut String) {
    for child in element.children() {
        if let Some(text) = child.value().as_text() {
            out.push_str(text);
            continue;
        }
        let Some(child) = ElementRef::wrap(child) else {
            continue;
        };
        match child.value().name() {
            "br" => out.push('\n'),
            "script" | "style" | "head" => {}
            name => {
                out.push(' ');
                push_text(child, out);
                out.push(if BLOCK_ELEMENTS.contains(&name) { '\n' } else { ' ' });
            }
        }
    }
}

/// Reduces HTML to text with entities decoded, keeping block boundaries as
/// line breaks.
pub fn strip_tags(html: &str) -> String {
    let doc = Html::parse_document(html);
    let mut text = String::with_capacity(html.len());
    push_text(doc.root_element(), &mut text);
    text.replace('\u{a0}', " ")
}

/// Name of the first empty required field.
pub fn missing_required_field(
    order_number: &str,
    pickup_city: &str,
    delivery_city: &str,
) -> Option<&'static str> {
    if order_number.trim().is_empty() {
        Some("order number")
    } else if pickup_city.trim().is_empty() {
        Some("pickup city")
    } else if delivery_city.trim().is_empty() {
        Some("delivery city")
    } else {
        None
    }
}
