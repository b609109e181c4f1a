use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Serialize;

use crate::normalize::truck_size::TruckClass;

/// Order type assigned to every order that arrives through email tenders.
pub const EMAIL_TENDER_ORDER_TYPE: i32 = 4;

/// An inbound email as delivered by the webhook. Consumed once.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawEmailMessage {
    pub subject: String,
    pub body_html: String,
    pub body_plain: String,
    pub message_id: String,
    /// `reply-to` field supplied by the mail provider's form post.
    pub reply_to_hint: String,
}

/// Audit row tracking one ingestion attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserLogEntry {
    pub id: i64,
    pub parser_type: String,
    pub body_html: String,
    pub body_plain: String,
    pub subject: String,
    pub order_id: Option<i64>,
    pub error_type: Option<String>,
    pub error_text: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewParserLog {
    pub parser_type: String,
    pub subject: String,
    pub body_html: String,
    pub body_plain: String,
}

/// Final linkage written once the order rows exist.
#[derive(Debug, Clone, PartialEq)]
pub struct CompleteParserLog {
    pub id: i64,
    pub parser_type: String,
    pub subject: String,
    pub body_html: String,
    pub body_plain: String,
    pub order_id: i64,
}

/// One end of a shipment as extracted from the email.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocationDraft {
    pub city: String,
    pub state: String,
    pub state_code: String,
    pub postal_code: String,
    pub country_code: String,
    pub country_name: String,
    pub street: String,
    pub house_number: String,
}

/// Commodity dimensions, always in feet and pounds.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemDraft {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub pieces: Option<i32>,
    pub stackable: Option<bool>,
    pub hazardous: bool,
}

/// Output of an extraction strategy before any validation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderDraft {
    pub order_number: String,
    /// Trailer type / vehicle class exactly as the sender wrote it.
    pub trailer_type: String,
    pub estimated_miles: i32,
    pub notes: String,
    pub pickup: LocationDraft,
    pub delivery: LocationDraft,
    pub pickup_date: Option<NaiveDateTime>,
    pub delivery_date: Option<NaiveDateTime>,
    pub item: ItemDraft,
}

/// Resolved commodity line with defaults applied.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderItemSpec {
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub pieces: i32,
    pub stackable: bool,
    pub hazardous: bool,
}

/// A draft that passed every gate and was normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalOrder {
    pub parser_type: String,
    pub order_number: String,
    pub original_truck_size: String,
    pub truck_class: TruckClass,
    pub order_type_id: i32,
    pub estimated_miles: i32,
    pub notes: String,
    pub pickup: LocationDraft,
    pub delivery: LocationDraft,
    pub pickup_label: String,
    pub delivery_label: String,
    pub pickup_date: Option<NaiveDateTime>,
    pub delivery_date: Option<NaiveDateTime>,
    pub item: OrderItemSpec,
    pub reply_to: String,
    pub subject: String,
    pub body_html: String,
    pub body_plain: String,
    pub message_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub parser_log_id: i64,
    pub order_number: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub pickup_date: Option<NaiveDateTime>,
    pub delivery_date: Option<NaiveDateTime>,
    pub suggested_truck_size: String,
    pub original_truck_size: String,
    pub notes: String,
    pub pickup_zip: String,
    pub delivery_zip: String,
    pub order_type_id: i32,
    pub truck_type_id: i32,
    pub estimated_miles: i32,
}

/// Geocoded coordinates of one location, when the lookup ran.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
    pub county: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocationRecord {
    pub label: String,
    pub location: LocationDraft,
    pub coordinates: Coordinates,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderLocation {
    pub order_id: i64,
    pub pickup: LocationRecord,
    pub delivery: LocationRecord,
    pub estimated_miles: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub order_id: i64,
    pub item: OrderItemSpec,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderEmail {
    pub order_id: i64,
    pub reply_to: String,
    pub subject: String,
    pub message_id: String,
}
