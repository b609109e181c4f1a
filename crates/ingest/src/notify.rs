use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, instrument};

use crate::error::NotifyError;
use crate::retry::RetryPolicy;

/// Tells downstream systems that an order was created.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OrderNotifier: Send + Sync {
    async fn notify(&self, order_id: i64) -> Result<(), NotifyError>;
}

/// `GET {url}?order_id={id}`; anything but 200 is an error.
pub struct HttpNotifier {
    client: reqwest::Client,
    url: String,
    retry: RetryPolicy,
}

impl HttpNotifier {
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        retry: RetryPolicy,
    ) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
            retry,
        })
    }

    async fn send(&self, order_id: i64) -> Result<(), NotifyError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("order_id", order_id)])
            .send()
            .await?;
        if response.status() != reqwest::StatusCode::OK {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderNotifier for HttpNotifier {
    #[instrument(skip(self))]
    async fn notify(&self, order_id: i64) -> Result<(), NotifyError> {
        self.retry.run("notify", || self.send(order_id)).await?;
        info!(order_id, "Downstream notified");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{extract::Query, http::StatusCode, routing::get, Router};
    use serde::Deserialize;
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    #[derive(Deserialize)]
    struct Params {
        order_id: i64,
    }

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}/send_order", addr)
    }

    #[tokio::test]
    async fn sends_order_id_as_query() {
        let seen = Arc::new(AtomicI64::new(0));
        let recorder = seen.clone();
        let router = Router::new().route(
            "/send_order",
            get(move |Query(params): Query<Params>| {
                let recorder = recorder.clone();
                async move {
                    recorder.store(params.order_id, Ordering::SeqCst);
                    "ok"
                }
            }),
        );
        let url = serve(router).await;

        let notifier = HttpNotifier::new(url, Duration::from_secs(5), RetryPolicy::none()).unwrap();
        notifier.notify(77).await.unwrap();
        assert_eq!(seen.load(Ordering::SeqCst), 77);
    }

    #[tokio::test]
    async fn non_200_is_an_error() {
        let router = Router::new().route("/send_order", get(|| async { StatusCode::ACCEPTED }));
        let url = serve(router).await;

        let notifier = HttpNotifier::new(url, Duration::from_secs(5), RetryPolicy::none()).unwrap();
        let err = notifier.notify(1).await.unwrap_err();
        assert!(matches!(err, NotifyError::Status(202)));
    }
}
