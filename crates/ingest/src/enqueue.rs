use chrono::Utc;
use std::sync::Arc;
use tracing::{info, instrument};

use crate::envelope::QueueMessage;
use crate::error::QueueError;
use crate::model::CanonicalOrder;
use crate::queue::MessageQueue;

/// Serializes accepted orders onto the queue.
#[derive(Clone)]
pub struct Enqueuer {
    queue: Arc<dyn MessageQueue>,
}

impl Enqueuer {
    pub fn new(queue: Arc<dyn MessageQueue>) -> Self {
        Self { queue }
    }

    #[instrument(skip(self, order), fields(order_number = %order.order_number))]
    pub async fn enqueue(
        &self,
        order: &CanonicalOrder,
        parser_log_id: i64,
    ) -> Result<(), QueueError> {
        let message = QueueMessage::from_order(order, parser_log_id, Utc::now());
        let body = serde_json::to_string(&message)?;
        self.queue.send(body).await?;
        info!(parser_log_id, "Order enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LocationDraft, OrderItemSpec, EMAIL_TENDER_ORDER_TYPE};
    use crate::normalize::TruckClass;
    use crate::queue::MockMessageQueue;

    fn order() -> CanonicalOrder {
        CanonicalOrder {
            parser_type: "load_board".into(),
            order_number: "12345".into(),
            original_truck_size: "53 FT Dry Van".into(),
            truck_class: TruckClass::LargeStraight,
            order_type_id: EMAIL_TENDER_ORDER_TYPE,
            estimated_miles: 1200,
            notes: String::new(),
            pickup: LocationDraft {
                city: "Chicago".into(),
                ..LocationDraft::default()
            },
            delivery: LocationDraft {
                city: "Dallas".into(),
                ..LocationDraft::default()
            },
            pickup_label: "Chicago".into(),
            delivery_label: "Dallas".into(),
            pickup_date: None,
            delivery_date: None,
            item: OrderItemSpec {
                length: 20.0,
                width: 4.0,
                height: 4.0,
                weight: 900.0,
                pieces: 1,
                stackable: false,
                hazardous: false,
            },
            reply_to: String::new(),
            subject: String::new(),
            body_html: String::new(),
            body_plain: String::new(),
            message_id: String::new(),
        }
    }

    #[tokio::test]
    async fn sends_serialized_envelope() {
        let mut queue = MockMessageQueue::new();
        queue
            .expect_send()
            .withf(|body| {
                let message: QueueMessage = serde_json::from_str(body).unwrap();
                message.parser_log_id == 9
                    && message.truck_type_id == 2
                    && message.suggested_truck_size == "Large Straight"
                    && message.pickup_date.is_empty()
            })
            .times(1)
            .returning(|_| Ok(()));

        Enqueuer::new(Arc::new(queue)).enqueue(&order(), 9).await.unwrap();
    }

    #[tokio::test]
    async fn surfaces_send_failures() {
        let mut queue = MockMessageQueue::new();
        queue
            .expect_send()
            .returning(|_| Err(QueueError::Backend(anyhow::anyhow!("queue down"))));

        let err = Enqueuer::new(Arc::new(queue)).enqueue(&order(), 1).await.unwrap_err();
        assert!(matches!(err, QueueError::Backend(_)));
    }
}
