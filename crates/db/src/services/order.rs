use async_trait::async_trait;
use ingest::error::RepositoryResult;
use ingest::model::{NewOrder, NewOrderEmail, NewOrderItem, NewOrderLocation};
use ingest::repository::OrderRepository;
use sqlx::PgPool;
use tracing::debug;

use crate::services::error::ServiceError;

/// Order tables. Each insert upserts on its unique key (`parser_log_id`
/// for orders, `order_id` for child rows) so redelivered messages reuse the
/// rows written by an earlier attempt.
#[derive(Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderRepository for PgOrderStore {
    async fn create_order(&self, order: NewOrder) -> RepositoryResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO orders (
                parser_log_id, order_number, pickup_location, delivery_location,
                pickup_date, delivery_date, suggested_truck_size, original_truck_size,
                notes, pickup_zip, delivery_zip, order_type_id, truck_type_id, estimated_miles
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (parser_log_id) DO UPDATE SET
                order_number = EXCLUDED.order_number,
                pickup_location = EXCLUDED.pickup_location,
                delivery_location = EXCLUDED.delivery_location,
                pickup_date = EXCLUDED.pickup_date,
                delivery_date = EXCLUDED.delivery_date,
                suggested_truck_size = EXCLUDED.suggested_truck_size,
                original_truck_size = EXCLUDED.original_truck_size,
                notes = EXCLUDED.notes,
                pickup_zip = EXCLUDED.pickup_zip,
                delivery_zip = EXCLUDED.delivery_zip,
                order_type_id = EXCLUDED.order_type_id,
                truck_type_id = EXCLUDED.truck_type_id,
                estimated_miles = EXCLUDED.estimated_miles,
                updated_at = NOW()
            RETURNING id
            "#,
        )
        .bind(order.parser_log_id)
        .bind(&order.order_number)
        .bind(&order.pickup_location)
        .bind(&order.delivery_location)
        .bind(order.pickup_date)
        .bind(order.delivery_date)
        .bind(&order.suggested_truck_size)
        .bind(&order.original_truck_size)
        .bind(&order.notes)
        .bind(&order.pickup_zip)
        .bind(&order.delivery_zip)
        .bind(order.order_type_id)
        .bind(order.truck_type_id)
        .bind(order.estimated_miles)
        .fetch_one(&self.pool)
        .await
        .map_err(ServiceError::from)?;

        debug!(order_id = id, parser_log_id = order.parser_log_id, "Order upserted");
        Ok(id)
    }

    async fn create_order_location(&self, location: NewOrderLocation) -> RepositoryResult<i64> {
        let pickup = &location.pickup;
        let delivery = &location.delivery;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_locations (
                order_id,
                pickup_label, pickup_city, pickup_state, pickup_state_code,
                pickup_postal_code,
                pickup_country_code, pickup_country_name, pickup_street, pickup_house_number,
                pickup_lat, pickup_lng, pickup_county,
                delivery_label, delivery_city, delivery_state, delivery_state_code,
                delivery_postal_code, delivery_country_code, delivery_country_name,
                delivery_street, delivery_house_number,
                delivery_lat, delivery_lng, delivery_county,
                estimated_miles
            )
            VALUES (
                $1,
                $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13,
                $14, $15, $16, $17, $18, $19, $20, $21, $22, $23, $24, $25,
                $26
            )
            ON CONFLICT (order_id) DO UPDATE SET
                pickup_label = EXCLUDED.pickup_label,
                pickup_city = EXCLUDED.pickup_city,
                pickup_state = EXCLUDED.pickup_state,
                pickup_state_code = EXCLUDED.pickup_state_code,
                pickup_postal_code = EXCLUDED.pickup_postal_code,
                pickup_country_code = EXCLUDED.pickup_country_code,
                pickup_country_name = EXCLUDED.pickup_country_name,
                pickup_street = EXCLUDED.pickup_street,
                pickup_house_number = EXCLUDED.pickup_house_number,
                pickup_lat = EXCLUDED.pickup_lat,
                pickup_lng = EXCLUDED.pickup_lng,
                pickup_county = EXCLUDED.pickup_county,
                delivery_label = EXCLUDED.delivery_label,
                delivery_city = EXCLUDED.delivery_city,
                delivery_state = EXCLUDED.delivery_state,
                delivery_state_code = EXCLUDED.delivery_state_code,
                delivery_postal_code = EXCLUDED.delivery_postal_code,
                delivery_country_code = EXCLUDED.delivery_country_code,
                delivery_country_name = EXCLUDED.delivery_country_name,
                delivery_street = EXCLUDED.delivery_street,
                delivery_house_number = EXCLUDED.delivery_house_number,
                delivery_lat = EXCLUDED.delivery_lat,
                delivery_lng = EXCLUDED.delivery_lng,
                delivery_county = EXCLUDED.delivery_county,
                estimated_miles = EXCLUDED.estimated_miles
            RETURNING id
            "#,
        )
        .bind(location.order_id)
        .bind(&pickup.label)
        .bind(&pickup.location.city)
        .bind(&pickup.location.state)
        .bind(&pickup.location.state_code)
        .bind(&pickup.location.postal_code)
        .bind(&pickup.location.country_code)
        .bind(&pickup.location.country_name)
        .bind(&pickup.location.street)
        .bind(&pickup.location.house_number)
        .bind(pickup.coordinates.lat)
        .bind(pickup.coordinates.lng)
        .bind(&pickup.coordinates.county)
        .bind(&delivery.label)
        .bind(&delivery.location.city)
        .bind(&delivery.location.state)
        .bind(&delivery.location.state_code)
        .bind(&delivery.location.postal_code)
        .bind(&delivery.location.country_code)
        .bind(&delivery.location.country_name)
        .bind(&delivery.location.street)
        .bind(&delivery.location.house_number)
        .bind(delivery.coordinates.lat)
        .bind(delivery.coordinates.lng)
        .bind(&delivery.coordinates.county)
        .bind(location.estimated_miles)
        .fetch_one(&self.pool)
        .await
        .map_err(ServiceError::from)?;
        Ok(id)
    }

    async fn create_order_item(&self, item: NewOrderItem) -> RepositoryResult<i64> {
        let spec = &item.item;
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_items (
                order_id, length, width, height, weight, pieces, stackable, hazardous
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (order_id) DO UPDATE SET
                length = EXCLUDED.length,
                width = EXCLUDED.width,
                height = EXCLUDED.height,
                weight = EXCLUDED.weight,
                pieces = EXCLUDED.pieces,
                stackable = EXCLUDED.stackable,
                hazardous = EXCLUDED.hazardous
            RETURNING id
            "#,
        )
        .bind(item.order_id)
        .bind(spec.length)
        .bind(spec.width)
        .bind(spec.height)
        .bind(spec.weight)
        .bind(spec.pieces)
        .bind(spec.stackable)
        .bind(spec.hazardous)
        .fetch_one(&self.pool)
        .await
        .map_err(ServiceError::from)?;
        Ok(id)
    }

    async fn create_order_email(&self, email: NewOrderEmail) -> RepositoryResult<i64> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO order_emails (order_id, reply_to, subject, message_id)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (order_id) DO UPDATE SET
                reply_to = EXCLUDED.reply_to,
                subject = EXCLUDED.subject,
                message_id = EXCLUDED.message_id
            RETURNING id
            "#,
        )
        .bind(email.order_id)
        .bind(&email.reply_to)
        .bind(&email.subject)
        .bind(&email.message_id)
        .fetch_one(&self.pool)
        .await
        .map_err(ServiceError::from)?;
        Ok(id)
    }
}
