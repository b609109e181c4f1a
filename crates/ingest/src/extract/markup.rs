//! Field extractors over HTML bodies.
//!
//! Two layouts are understood: load tenders with labelled table cells and a
//! `stopsDiv` stop table, and order notifications whose fields are labelled
//! paragraphs with a stop-event table.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;

use super::plain_text::{self, StopEvent};
use crate::error::ExtractError;
use crate::model::{ItemDraft, LocationDraft, OrderDraft};
use crate::normalize::units::clean_text;
use crate::normalize::{
    parse_city_state_zip, parse_date_time, parse_feet, parse_miles, parse_weight, parse_yes_no,
};

static ROW: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static STOP_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#stopsDiv tr").unwrap());
static COMMODITY_TABLE: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("div#commodityDiv table").unwrap());
static COMMENT_ROWS: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("table#comments tr").unwrap());
static PARAGRAPH: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p").unwrap());
static NOTE_BLOCK: LazyLock<Selector> = LazyLock::new(|| Selector::parse("p, h4").unwrap());

/// Parses an HTML body. Bodies without any markup are rejected.
pub fn parse_document(html: &str) -> Result<Html, ExtractError> {
    if html.trim().is_empty() {
        return Err(ExtractError::UnparseableDocument("empty HTML body".to_string()));
    }
    if !html.contains('<') {
        return Err(ExtractError::UnparseableDocument("HTML body has no markup".to_string()));
    }
    Ok(Html::parse_document(html))
}

fn text_of(element: ElementRef<'_>) -> String {
    clean_text(&element.text().collect::<String>())
}

fn cells_of(row: ElementRef<'_>) -> Vec<String> {
    row.select(&CELL).map(text_of).collect()
}

/// Value of the first table cell starting with `label`, with the label and
/// separating colons removed. A bare label cell yields the next cell.
pub fn value_after_label(doc: &Html, label: &str) -> Option<String> {
    for row in doc.select(&ROW) {
        let cells = cells_of(row);
        for (index, text) in cells.iter().enumerate() {
            let Some(rest) = text.strip_prefix(label) else {
                continue;
            };
            let value = rest.trim_matches(|c: char| c == ':' || c.is_whitespace());
            if !value.is_empty() {
                return Some(value.to_string());
            }
            if let Some(next) = cells.get(index + 1).filter(|next| !next.is_empty()) {
                return Some(next.clone());
            }
        }
    }
    None
}

/// `(origin, destination)` city/state text from the stop table.
pub fn stop_locations(doc: &Html) -> (String, String) {
    let mut origin = String::new();
    let mut destination = String::new();
    for row in doc.select(&STOP_ROWS) {
        let cells = cells_of(row);
        match (cells.first().map(String::as_str), cells.get(1)) {
            (Some("Origin"), Some(place)) => origin = place.clone(),
            (Some("Destination"), Some(place)) => destination = place.clone(),
            _ => {}
        }
    }
    debug!(%origin, %destination, "Read stop table");
    (origin, destination)
}

/// First data row of the commodity table: length, width and height in
/// columns 2-4, weight in 5 and the hazardous flag in 6.
pub fn commodity(doc: &Html) -> ItemDraft {
    let Some(table) = doc.select(&COMMODITY_TABLE).next() else {
        return ItemDraft::default();
    };
    table
        .select(&ROW)
        .skip(1)
        .map(cells_of)
        .find(|cells| cells.len() > 5)
        .map(|cells| ItemDraft {
            length: parse_feet(&cells[2]).unwrap_or(0.0),
            width: parse_feet(&cells[3]).unwrap_or(0.0),
            height: parse_feet(&cells[4]).unwrap_or(0.0),
            weight: parse_weight(&cells[5]).unwrap_or(0.0),
            hazardous: cells.get(6).is_some_and(|flag| parse_yes_no(flag)),
            ..ItemDraft::default()
        })
        .unwrap_or_default()
}

/// Comment rows below the header of the comments table.
pub fn comments(doc: &Html) -> String {
    doc.select(&COMMENT_ROWS)
        .skip(1)
        .flat_map(cells_of)
        .filter(|text| !text.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The stop table only decides here for engines built without the load-board
/// vendor, which otherwise claims every `stopsDiv` document first.
pub fn is_load_tender(doc: &Html) -> bool {
    doc.select(&STOP_ROWS).next().is_some() || value_after_label(doc, "Load #").is_some()
}

/// Drafts a load tender: labelled cells, stop table, commodity table and
/// comments table.
pub fn draft_load_tender(doc: &Html) -> OrderDraft {
    let (origin, destination) = stop_locations(doc);
    OrderDraft {
        order_number: value_after_label(doc, "Load #").unwrap_or_default(),
        trailer_type: value_after_label(doc, "Trailer Type").unwrap_or_default(),
        estimated_miles: value_after_label(doc, "Miles")
            .and_then(|miles| parse_miles(&miles))
            .unwrap_or(0),
        notes: comments(doc),
        pickup: parse_city_state_zip(&origin),
        delivery: parse_city_state_zip(&destination),
        pickup_date: value_after_label(doc, "Pickup").and_then(|v| parse_date_time(&v)),
        delivery_date: value_after_label(doc, "Delivery").and_then(|v| parse_date_time(&v)),
        item: commodity(doc),
    }
}

fn paragraph_containing<'a>(doc: &'a Html, needle: &str) -> Option<ElementRef<'a>> {
    doc.select(&PARAGRAPH)
        .find(|p| p.text().collect::<String>().contains(needle))
}

/// Raw paragraph text with line breaks kept.
fn paragraph_text(doc: &Html, needle: &str) -> Option<String> {
    paragraph_containing(doc, needle).map(|p| p.text().collect::<String>())
}

/// Stop-event row: event name in column 1, then city, state, postal code,
/// country and time.
fn stop_event(
    doc: &Html,
    event: StopEvent,
) -> Option<(LocationDraft, Option<chrono::NaiveDateTime>)> {
    doc.select(&ROW).map(cells_of).find_map(|cells| {
        if !cells.get(1)?.contains(event.label()) || cells.len() < 6 {
            return None;
        }
        let location = plain_text::location_from_parts(&cells[2], &cells[3], &cells[4], &cells[5]);
        let when = cells.get(6).and_then(|text| parse_date_time(text));
        Some((location, when))
    })
}

/// Length, width, height and stackable flag from the table that follows
/// the `Dimensions` paragraph.
fn dimensions(doc: &Html) -> ItemDraft {
    let Some(paragraph) = paragraph_containing(doc, "Dimensions") else {
        return ItemDraft::default();
    };
    let Some(table) = paragraph
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|sibling| sibling.value().name() == "table")
    else {
        return ItemDraft::default();
    };
    table
        .select(&ROW)
        .nth(1)
        .map(cells_of)
        .map(|cells| {
            let feet = |index: usize| cells.get(index).and_then(|c| parse_feet(c)).unwrap_or(0.0);
            ItemDraft {
                length: feet(0),
                width: feet(1),
                height: feet(2),
                stackable: cells.get(3).map(|flag| parse_yes_no(flag)),
                ..ItemDraft::default()
            }
        })
        .unwrap_or_default()
}

/// Text after the last `Notes:` marker in a paragraph or heading.
fn order_notes(doc: &Html) -> String {
    doc.select(&NOTE_BLOCK)
        .filter_map(|block| {
            let text = block.text().collect::<String>();
            text.split_once("Notes:").map(|(_, notes)| clean_text(notes))
        })
        .last()
        .unwrap_or_default()
}

/// Drafts an order notification laid out as labelled paragraphs.
pub fn draft_order_notice(doc: &Html) -> OrderDraft {
    let (pickup, pickup_date) = stop_event(doc, StopEvent::PickUp).unwrap_or_default();
    let (delivery, delivery_date) = stop_event(doc, StopEvent::Delivery).unwrap_or_default();

    let mut item = dimensions(doc);
    item.weight = paragraph_text(doc, "Total Weight")
        .and_then(|text| plain_text::total_weight(&text))
        .unwrap_or(0.0);
    item.pieces =
        paragraph_text(doc, "Total Pieces").and_then(|text| plain_text::total_pieces(&text));
    item.hazardous = paragraph_text(doc, "Hazardous?")
        .and_then(|text| plain_text::hazardous(&text))
        .unwrap_or(false);

    OrderDraft {
        order_number: paragraph_text(doc, "ORDER NUMBER")
            .and_then(|text| plain_text::order_number(&text))
            .unwrap_or_default(),
        trailer_type: paragraph_text(doc, "Requested Vehicle Class")
            .and_then(|text| plain_text::vehicle_class(&text))
            .unwrap_or_default(),
        estimated_miles: paragraph_text(doc, "Distance")
            .and_then(|text| plain_text::distance_miles(&text))
            .unwrap_or(0),
        notes: order_notes(doc),
        pickup,
        delivery,
        pickup_date,
        delivery_date,
        item,
    }
}

/// Drafts whichever layout the document uses.
pub fn draft(doc: &Html) -> OrderDraft {
    if is_load_tender(doc) {
        draft_load_tender(doc)
    } else {
        draft_order_notice(doc)
    }
}
