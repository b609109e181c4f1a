//! Worker-side pipeline for one queue message.

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::envelope::QueueMessage;
use crate::error::{GeocodeError, NotifyError, RepositoryError};
use crate::geocode::Geocoder;
use crate::model::{
    CompleteParserLog, Coordinates, LocationDraft, LocationRecord, NewOrder, NewOrderEmail,
    NewOrderItem, NewOrderLocation, OrderItemSpec,
};
use crate::normalize::parse_date_time;
use crate::notify::OrderNotifier;
use crate::repository::{OrderRepository, ParserLogRepository};

#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("malformed queue message: {0}")]
    Envelope(#[from] serde_json::Error),

    #[error("parser log {0} not found")]
    ParserLogNotFound(i64),

    #[error("queue message is missing {0}")]
    MissingRequiredField(&'static str),

    #[error("geocoding {address:?} failed: {source}")]
    Geocode {
        address: String,
        #[source]
        source: GeocodeError,
    },

    #[error("persistence failed: {0}")]
    Repository(#[from] RepositoryError),

    #[error("downstream notify failed: {0}")]
    Notify(#[from] NotifyError),
}

/// Processes one message body. `Ok` means the message may be acknowledged.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, body: &str) -> Result<(), ProcessError>;
}

/// Geocodes, persists and announces queued orders.
pub struct OrderProcessor {
    parser_logs: Arc<dyn ParserLogRepository>,
    orders: Arc<dyn OrderRepository>,
    geocoder: Arc<dyn Geocoder>,
    notifier: Arc<dyn OrderNotifier>,
}

struct Stop<'a> {
    label: &'a str,
    zip: &'a str,
    city: &'a str,
    state: &'a str,
    state_code: &'a str,
    country_code: &'a str,
    country_name: &'a str,
    street: &'a str,
    house_number: &'a str,
}

impl Stop<'_> {
    /// `"{zip}, {city}, {state}, {country}"`, only when all four are known.
    fn geocode_address(&self) -> Option<String> {
        let parts = [self.zip, self.city, self.state, self.country_code];
        parts
            .iter()
            .all(|part| !part.trim().is_empty())
            .then(|| parts.join(", "))
    }

    fn record(&self, coordinates: Coordinates) -> LocationRecord {
        LocationRecord {
            label: self.label.to_string(),
            location: LocationDraft {
                city: self.city.to_string(),
                state: self.state.to_string(),
                state_code: self.state_code.to_string(),
                postal_code: self.zip.to_string(),
                country_code: self.country_code.to_string(),
                country_name: self.country_name.to_string(),
                street: self.street.to_string(),
                house_number: self.house_number.to_string(),
            },
            coordinates,
        }
    }
}

fn pickup(message: &QueueMessage) -> Stop<'_> {
    Stop {
        label: &message.pickup_location,
        zip: &message.pickup_zip,
        city: &message.pickup_city,
        state: &message.pickup_state,
        state_code: &message.pickup_state_code,
        country_code: &message.pickup_country_code,
        country_name: &message.pickup_country_name,
        street: &message.pickup_street,
        house_number: &message.pickup_house_number,
    }
}

fn delivery(message: &QueueMessage) -> Stop<'_> {
    Stop {
        label: &message.delivery_location,
        zip: &message.delivery_zip,
        city: &message.delivery_city,
        state: &message.delivery_state,
        state_code: &message.delivery_state_code,
        country_code: &message.delivery_country_code,
        country_name: &message.delivery_country_name,
        street: &message.delivery_street,
        house_number: &message.delivery_house_number,
    }
}

impl OrderProcessor {
    pub fn new(
        parser_logs: Arc<dyn ParserLogRepository>,
        orders: Arc<dyn OrderRepository>,
        geocoder: Arc<dyn Geocoder>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        Self {
            parser_logs,
            orders,
            geocoder,
            notifier,
        }
    }

    async fn geocode(&self, stop: &Stop<'_>) -> Result<Coordinates, ProcessError> {
        let Some(address) = stop.geocode_address() else {
            debug!(city = stop.city, "Skipping geocoding, address incomplete");
            return Ok(Coordinates::default());
        };
        match self.geocoder.search(&address).await {
            Ok(result) => Ok(Coordinates {
                lat: result.lat,
                lng: result.lng,
                county: result.county.unwrap_or_default(),
            }),
            Err(source) => Err(ProcessError::Geocode { address, source }),
        }
    }

    /// Runs every step for `message` and returns the order id.
    #[instrument(
        skip_all,
        fields(parser_log_id = message.parser_log_id, order_number = %message.order_number)
    )]
    pub async fn process(&self, message: &QueueMessage) -> Result<i64, ProcessError> {
        let log = self
            .parser_logs
            .get(message.parser_log_id)
            .await?
            .ok_or(ProcessError::ParserLogNotFound(message.parser_log_id))?;

        if let Some(field) = message.missing_required_field() {
            return Err(ProcessError::MissingRequiredField(field));
        }

        let pickup = pickup(message);
        let delivery = delivery(message);
        let pickup_coordinates = self.geocode(&pickup).await?;
        let delivery_coordinates = self.geocode(&delivery).await?;

        let order_id = self
            .orders
            .create_order(NewOrder {
                parser_log_id: log.id,
                order_number: message.order_number.clone(),
                pickup_location: message.pickup_location.clone(),
                delivery_location: message.delivery_location.clone(),
                pickup_date: parse_date_time(&message.pickup_date),
                delivery_date: parse_date_time(&message.delivery_date),
                suggested_truck_size: message.suggested_truck_size.clone(),
                original_truck_size: message.original_truck_size.clone(),
                notes: message.notes.clone(),
                pickup_zip: message.pickup_zip.clone(),
                delivery_zip: message.delivery_zip.clone(),
                order_type_id: message.order_type_id,
                truck_type_id: message.truck_type_id,
                estimated_miles: message.estimated_miles,
            })
            .await?;
        debug!(order_id, "Order row written");

        self.orders
            .create_order_location(NewOrderLocation {
                order_id,
                pickup: pickup.record(pickup_coordinates),
                delivery: delivery.record(delivery_coordinates),
                estimated_miles: f64::from(message.estimated_miles),
            })
            .await?;

        self.orders
            .create_order_item(NewOrderItem {
                order_id,
                item: OrderItemSpec {
                    length: message.length,
                    width: message.width,
                    height: message.height,
                    weight: message.weight,
                    pieces: message.pieces,
                    stackable: message.stackable,
                    hazardous: message.hazardous,
                },
            })
            .await?;

        self.orders
            .create_order_email(NewOrderEmail {
                order_id,
                reply_to: message.reply_to.clone(),
                subject: message.subject.clone(),
                message_id: message.message_id.clone(),
            })
            .await?;

        let parser_type = if message.parser_type.is_empty() {
            log.parser_type
        } else {
            message.parser_type.clone()
        };
        self.parser_logs
            .complete(CompleteParserLog {
                id: log.id,
                parser_type,
                subject: message.subject.clone(),
                body_html: message.body_html.clone(),
                body_plain: message.body_plain.clone(),
                order_id,
            })
            .await?;

        self.notifier.notify(order_id).await?;

        info!(order_id, "Order processed");
        Ok(order_id)
    }
}

#[async_trait]
impl MessageHandler for OrderProcessor {
    async fn handle(&self, body: &str) -> Result<(), ProcessError> {
        let message: QueueMessage = serde_json::from_str(body)?;
        self.process(&message).await.map(|_| ())
    }
}
