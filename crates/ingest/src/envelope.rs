//! JSON envelope carried by the queue between intake and the workers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::CanonicalOrder;
use crate::normalize::dates::format_wire;

/// Flattened order plus the id of its parser log row.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueMessage {
    pub order_number: String,
    pub pickup_location: String,
    pub delivery_location: String,
    pub pickup_date: String,
    pub delivery_date: String,
    pub suggested_truck_size: String,
    pub truck_type_id: i32,
    pub original_truck_size: String,
    pub notes: String,
    pub pickup_zip: String,
    pub delivery_zip: String,
    pub pickup_city: String,
    pub pickup_state: String,
    pub pickup_state_code: String,
    pub pickup_country_code: String,
    pub pickup_country_name: String,
    pub pickup_street: String,
    pub pickup_house_number: String,
    pub delivery_city: String,
    pub delivery_state: String,
    pub delivery_state_code: String,
    pub delivery_country_code: String,
    pub delivery_country_name: String,
    pub delivery_street: String,
    pub delivery_house_number: String,
    pub estimated_miles: i32,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    pub weight: f64,
    pub pieces: i32,
    pub stackable: bool,
    pub hazardous: bool,
    pub order_type_id: i32,
    pub reply_to: String,
    pub subject: String,
    #[serde(rename = "bodyHTML")]
    pub body_html: String,
    pub body_plain: String,
    #[serde(rename = "messageID")]
    pub message_id: String,
    #[serde(rename = "parserLogID")]
    pub parser_log_id: i64,
    pub parser_type: String,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl QueueMessage {
    pub fn from_order(order: &CanonicalOrder, parser_log_id: i64, now: DateTime<Utc>) -> Self {
        Self {
            order_number: order.order_number.clone(),
            pickup_location: order.pickup_label.clone(),
            delivery_location: order.delivery_label.clone(),
            pickup_date: format_wire(order.pickup_date),
            delivery_date: format_wire(order.delivery_date),
            suggested_truck_size: order.truck_class.display_name().to_string(),
            truck_type_id: order.truck_class.id(),
            original_truck_size: order.original_truck_size.clone(),
            notes: order.notes.clone(),
            pickup_zip: order.pickup.postal_code.clone(),
            delivery_zip: order.delivery.postal_code.clone(),
            pickup_city: order.pickup.city.clone(),
            pickup_state: order.pickup.state.clone(),
            pickup_state_code: order.pickup.state_code.clone(),
            pickup_country_code: order.pickup.country_code.clone(),
            pickup_country_name: order.pickup.country_name.clone(),
            pickup_street: order.pickup.street.clone(),
            pickup_house_number: order.pickup.house_number.clone(),
            delivery_city: order.delivery.city.clone(),
            delivery_state: order.delivery.state.clone(),
            delivery_state_code: order.delivery.state_code.clone(),
            delivery_country_code: order.delivery.country_code.clone(),
            delivery_country_name: order.delivery.country_name.clone(),
            delivery_street: order.delivery.street.clone(),
            delivery_house_number: order.delivery.house_number.clone(),
            estimated_miles: order.estimated_miles,
            length: order.item.length,
            width: order.item.width,
            height: order.item.height,
            weight: order.item.weight,
            pieces: order.item.pieces,
            stackable: order.item.stackable,
            hazardous: order.item.hazardous,
            order_type_id: order.order_type_id,
            reply_to: order.reply_to.clone(),
            subject: order.subject.clone(),
            body_html: order.body_html.clone(),
            body_plain: order.body_plain.clone(),
            message_id: order.message_id.clone(),
            parser_log_id,
            parser_type: order.parser_type.clone(),
            created_at: Some(now),
            updated_at: Some(now),
        }
    }

    /// First required field that is empty, if any.
    pub fn missing_required_field(&self) -> Option<&'static str> {
        crate::extract::missing_required_field(
            &self.order_number,
            &self.pickup_city,
            &self.delivery_city,
        )
    }
}
