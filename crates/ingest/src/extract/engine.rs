use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use super::missing_required_field;
use super::strategy::{plain_text_body, Strategy};
use super::vendor::{LoadBoardVendor, VendorAdapter};
use crate::error::ExtractError;
use crate::geocode::{GeocodeResult, Geocoder};
use crate::model::{
    CanonicalOrder, LocationDraft, OrderDraft, OrderItemSpec, RawEmailMessage,
    EMAIL_TENDER_ORDER_TYPE,
};
use crate::normalize::{
    extract_reply_to, is_disallowed_equipment, location_label, recover_length, TruckClass,
};

/// Why a draft was dropped without being treated as a rejection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    MissingRequiredField(&'static str),
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DropReason::MissingRequiredField(field) => write!(f, "missing required field: {field}"),
        }
    }
}

/// Business rules that discard a draft.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectReason {
    DisallowedEquipment(String),
    UnknownLength(String),
    UnsupportedLength(f64),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::DisallowedEquipment(trailer) => {
                write!(f, "disallowed equipment: {trailer}")
            }
            RejectReason::UnknownLength(trailer) => {
                write!(f, "no length found in trailer type: {trailer:?}")
            }
            RejectReason::UnsupportedLength(length) => {
                write!(f, "length {length} ft is outside the supported classes")
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Accepted(Box<CanonicalOrder>),
    Dropped(DropReason),
    Rejected(RejectReason),
}

/// Runs vendor adapters or the generic strategies, then validates and
/// normalizes the draft.
pub struct ExtractionEngine {
    vendors: Vec<Box<dyn VendorAdapter>>,
    geocoder: Arc<dyn Geocoder>,
}

impl ExtractionEngine {
    pub fn new(geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            vendors: Vec::new(),
            geocoder,
        }
    }

    /// Engine with every built-in vendor registered.
    pub fn with_default_vendors(geocoder: Arc<dyn Geocoder>) -> Self {
        Self::new(geocoder).with_vendor(LoadBoardVendor::default())
    }

    pub fn with_vendor(mut self, vendor: impl VendorAdapter + 'static) -> Self {
        self.vendors.push(Box::new(vendor));
        self
    }

    fn vendor_for(&self, raw: &RawEmailMessage) -> Option<&dyn VendorAdapter> {
        self.vendors
            .iter()
            .map(|vendor| vendor.as_ref())
            .find(|vendor| vendor.matches(raw))
    }

    /// Parser type recorded for `raw` before extraction runs.
    pub fn source_name(&self, raw: &RawEmailMessage) -> String {
        self.vendor_for(raw)
            .map(|vendor| vendor.name().to_string())
            .unwrap_or_else(|| "generic".to_string())
    }

    /// Produces a draft and the name of whatever produced it.
    ///
    /// A matching vendor is used exclusively. Otherwise structured markup is
    /// tried first and plain text takes over when the HTML is unusable or
    /// yields neither city.
    pub fn draft(&self, raw: &RawEmailMessage) -> Result<(String, OrderDraft), ExtractError> {
        if let Some(vendor) = self.vendor_for(raw) {
            let draft = vendor.draft(raw)?;
            return Ok((vendor.name().to_string(), draft));
        }

        if raw.body_html.trim().is_empty() && raw.body_plain.trim().is_empty() {
            return Err(ExtractError::MissingBody);
        }

        match Strategy::StructuredMarkup.draft(raw) {
            Ok(draft) if !(draft.pickup.city.is_empty() && draft.delivery.city.is_empty()) => {
                return Ok((Strategy::StructuredMarkup.name().to_string(), draft));
            }
            Ok(_) => debug!("Markup yielded no cities, falling back to plain text"),
            Err(e) => debug!(error = %e, "Markup unusable, falling back to plain text"),
        }

        let draft = Strategy::PlainText.draft(raw)?;
        Ok((Strategy::PlainText.name().to_string(), draft))
    }

    #[instrument(skip_all, fields(message_id = %raw.message_id))]
    pub async fn extract(&self, raw: &RawEmailMessage) -> Result<Extraction, ExtractError> {
        let (parser_type, draft) = self.draft(raw)?;
        debug!(%parser_type, order_number = %draft.order_number, "Drafted order");

        if is_disallowed_equipment(&draft.trailer_type) {
            return Ok(Extraction::Rejected(RejectReason::DisallowedEquipment(
                draft.trailer_type,
            )));
        }

        if let Some(field) = missing_required_field(
            &draft.order_number,
            &draft.pickup.city,
            &draft.delivery.city,
        ) {
            return Ok(Extraction::Dropped(DropReason::MissingRequiredField(field)));
        }

        let length = if draft.item.length > 0.0 {
            draft.item.length
        } else {
            match recover_length(&draft.trailer_type) {
                Some(length) => length,
                None => {
                    return Ok(Extraction::Rejected(RejectReason::UnknownLength(
                        draft.trailer_type,
                    )))
                }
            }
        };
        let Some(truck_class) = TruckClass::classify(length) else {
            return Ok(Extraction::Rejected(RejectReason::UnsupportedLength(length)));
        };

        let mut pickup = draft.pickup;
        let mut delivery = draft.delivery;
        self.backfill_postal_code(&mut pickup).await;
        self.backfill_postal_code(&mut delivery).await;

        let reply_to = extract_reply_to(&plain_text_body(raw), &raw.reply_to_hint);
        let order = CanonicalOrder {
            parser_type,
            order_number: draft.order_number,
            original_truck_size: draft.trailer_type,
            truck_class,
            order_type_id: EMAIL_TENDER_ORDER_TYPE,
            estimated_miles: draft.estimated_miles,
            notes: draft.notes,
            pickup_label: location_label(&pickup),
            delivery_label: location_label(&delivery),
            pickup,
            delivery,
            pickup_date: draft.pickup_date,
            delivery_date: draft.delivery_date,
            item: OrderItemSpec {
                length,
                width: draft.item.width,
                height: draft.item.height,
                weight: draft.item.weight,
                pieces: draft.item.pieces.unwrap_or(1),
                stackable: draft.item.stackable.unwrap_or(false),
                hazardous: draft.item.hazardous,
            },
            reply_to,
            subject: raw.subject.clone(),
            body_html: raw.body_html.clone(),
            body_plain: raw.body_plain.clone(),
            message_id: raw.message_id.clone(),
        };
        info!(
            order_number = %order.order_number,
            truck_class = order.truck_class.display_name(),
            "Order accepted"
        );
        Ok(Extraction::Accepted(Box::new(order)))
    }

    /// Looks up a missing postal code by `"{city}, {state}"`. Failures leave
    /// it empty.
    async fn backfill_postal_code(&self, location: &mut LocationDraft) {
        if !location.postal_code.is_empty() || location.city.is_empty() {
            return;
        }
        let query = format!("{}, {}", location.city, location.state);
        match self.geocoder.search(&query).await {
            Ok(GeocodeResult {
                postal_code: Some(postal_code),
                ..
            }) => location.postal_code = postal_code,
            Ok(_) => warn!(%query, "Geocoder returned no postal code"),
            Err(e) => warn!(%query, error = %e, "Postal code lookup failed"),
        }
    }
}
