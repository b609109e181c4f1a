//! Regex field extractors over plain text.
//!
//! The paragraph-labelled HTML layout reuses the label helpers here on the
//! text of individual paragraphs.

use chrono::NaiveDateTime;
use regex::Regex;
use std::sync::LazyLock;

use crate::model::{ItemDraft, LocationDraft, OrderDraft};
use crate::normalize::units::clean_text;
use crate::normalize::{
    parse_date_time, parse_miles, parse_weight, parse_yes_no, resolve_country, resolve_state,
};

static ORDER_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:order\s*number|order(?:\.ref)?|ref\.\s*#|reference)\s*[:#]\s*(\d+)")
        .unwrap()
});

static VEHICLE_CLASS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Requested Vehicle Class\s*:[ \t]*([^\r\n]+)").unwrap());

static SHARED_NOTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Shared Order notes\s*:[ \t]*([^\r\n]*)").unwrap());

static DISTANCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Distance\s*:\s*([\d,]+)\s*mi").unwrap());

static TOTAL_WEIGHT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Total Weight\s*:\s*([\d,]+(?:\.\d+)?\s*(?:lbs?|pounds?|kgs?)?)").unwrap()
});

static TOTAL_PIECES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total Pieces\s*:\s*(\d+)").unwrap());

static HAZARDOUS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Hazardous\?\s*:\s*(\w+)").unwrap());

static STACKABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Stackable\s*:\s*(\w+)").unwrap());

/// `4 skids (48"L x 40"W x 50"H) @ 1,200 lbs`
static SKIDS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"(?i)(?P<count>\d+)\s*skids?\s*\(\s*(?P<l>\d+(?:\.\d+)?)"\s*L\s*x\s*(?P<w>\d+(?:\.\d+)?)"\s*W\s*x\s*(?P<h>\d+(?:\.\d+)?)"\s*H\s*\)\s*@\s*(?P<weight>[\d,]+(?:\.\d+)?)\s*lbs?"#,
    )
    .unwrap()
});

static PICKUP_STOP: LazyLock<Regex> = LazyLock::new(|| stop_pattern("Pick Up"));
static DELIVERY_STOP: LazyLock<Regex> = LazyLock::new(|| stop_pattern("Delivery"));
static PICKUP_TIME: LazyLock<Regex> = LazyLock::new(|| time_pattern("Pick Up"));
static DELIVERY_TIME: LazyLock<Regex> = LazyLock::new(|| time_pattern("Delivery"));

fn stop_pattern(event: &str) -> Regex {
    Regex::new(&format!(
        r"{event}\s+(?:\d+\s+)?(?P<city>[A-Za-z][A-Za-z .'-]*?)\s+(?P<state>[A-Z]{{2}})\s+(?P<zip>\d{{5}})\s+(?P<country>[A-Z]{{2,3}})\b"
    ))
    .unwrap()
}

fn time_pattern(event: &str) -> Regex {
    Regex::new(&format!(
        r"(?s){event}.*?(?P<ts>\d{{4}}-\d{{2}}-\d{{2}} \d{{2}}:\d{{2}}(?::\d{{2}})?)"
    ))
    .unwrap()
}

/// A stop event in order notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopEvent {
    PickUp,
    Delivery,
}

impl StopEvent {
    pub fn label(self) -> &'static str {
        match self {
            StopEvent::PickUp => "Pick Up",
            StopEvent::Delivery => "Delivery",
        }
    }

    fn location_pattern(self) -> &'static Regex {
        match self {
            StopEvent::PickUp => &PICKUP_STOP,
            StopEvent::Delivery => &DELIVERY_STOP,
        }
    }

    fn time_pattern(self) -> &'static Regex {
        match self {
            StopEvent::PickUp => &PICKUP_TIME,
            StopEvent::Delivery => &DELIVERY_TIME,
        }
    }
}

fn first_capture(pattern: &Regex, text: &str) -> Option<String> {
    pattern
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| clean_text(m.as_str()))
        .filter(|value| !value.is_empty())
}

pub fn order_number(text: &str) -> Option<String> {
    first_capture(&ORDER_NUMBER, text)
}

pub fn vehicle_class(text: &str) -> Option<String> {
    first_capture(&VEHICLE_CLASS, text)
}

pub fn shared_notes(text: &str) -> Option<String> {
    first_capture(&SHARED_NOTES, text)
}

pub fn distance_miles(text: &str) -> Option<i32> {
    first_capture(&DISTANCE, text).and_then(|miles| parse_miles(&miles))
}

pub fn total_weight(text: &str) -> Option<f64> {
    first_capture(&TOTAL_WEIGHT, text).and_then(|weight| parse_weight(&weight))
}

pub fn total_pieces(text: &str) -> Option<i32> {
    first_capture(&TOTAL_PIECES, text).and_then(|pieces| pieces.parse().ok())
}

pub fn hazardous(text: &str) -> Option<bool> {
    first_capture(&HAZARDOUS, text).map(|token| parse_yes_no(&token))
}

pub fn stackable(text: &str) -> Option<bool> {
    first_capture(&STACKABLE, text).map(|token| parse_yes_no(&token))
}

/// Builds a location from separate city, state, postal code and country
/// values.
pub fn location_from_parts(
    city: &str,
    state: &str,
    postal_code: &str,
    country: &str,
) -> LocationDraft {
    let city = clean_text(city);
    if city.is_empty() {
        return LocationDraft::default();
    }
    let state = resolve_state(&clean_text(state));
    let (country_code, country_name) = resolve_country(&clean_text(country));
    LocationDraft {
        city,
        state: state.name,
        state_code: state.code,
        postal_code: clean_text(postal_code),
        country_code,
        country_name,
        ..LocationDraft::default()
    }
}

pub fn stop_location(text: &str, event: StopEvent) -> LocationDraft {
    event
        .location_pattern()
        .captures(text)
        .map(|caps| {
            location_from_parts(&caps["city"], &caps["state"], &caps["zip"], &caps["country"])
        })
        .unwrap_or_default()
}

pub fn stop_time(text: &str, event: StopEvent) -> Option<NaiveDateTime> {
    event
        .time_pattern()
        .captures(text)
        .and_then(|caps| parse_date_time(&caps["ts"]))
}

/// Skid line dimensions, converted from inches to feet.
fn skids(text: &str) -> Option<ItemDraft> {
    let caps = SKIDS.captures(text)?;
    let inches = |name: &str| -> f64 {
        caps[name].parse::<f64>().map(|v| (v / 12.0 * 100.0).round() / 100.0).unwrap_or(0.0)
    };
    Some(ItemDraft {
        length: inches("l"),
        width: inches("w"),
        height: inches("h"),
        weight: parse_weight(&caps["weight"]).unwrap_or(0.0),
        pieces: caps["count"].parse().ok(),
        ..ItemDraft::default()
    })
}

/// Drafts an order from a plain-text body.
pub fn draft(text: &str) -> OrderDraft {
    let mut item = skids(text).unwrap_or_default();
    if item.weight == 0.0 {
        item.weight = total_weight(text).unwrap_or(0.0);
    }
    if item.pieces.is_none() {
        item.pieces = total_pieces(text);
    }
    item.stackable = stackable(text);
    item.hazardous = hazardous(text).unwrap_or(false);

    OrderDraft {
        order_number: order_number(text).unwrap_or_default(),
        trailer_type: vehicle_class(text).unwrap_or_default(),
        estimated_miles: distance_miles(text).unwrap_or(0),
        notes: shared_notes(text).unwrap_or_default(),
        pickup: stop_location(text, StopEvent::PickUp),
        delivery: stop_location(text, StopEvent::Delivery),
        pickup_date: stop_time(text, StopEvent::PickUp),
        delivery_date: stop_time(text, StopEvent::Delivery),
        item,
    }
}
