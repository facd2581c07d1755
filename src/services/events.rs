use tracing::{debug, warn};

use crate::domain::events::DomainEvent;

/// Publishes drained domain events to NATS, or only logs them when no broker is configured.
/// Publishing never fails the operation that raised the events.
#[derive(Clone)]
pub struct EventPublisher {
    nats: Option<async_nats::Client>,
    subject_prefix: String,
}

impl EventPublisher {
    pub fn disabled() -> Self { Self { nats: None, subject_prefix: "storefront".to_string() } }

    pub fn nats(client: async_nats::Client, subject_prefix: impl Into<String>) -> Self {
        Self { nats: Some(client), subject_prefix: subject_prefix.into() }
    }

    pub async fn publish(&self, events: Vec<DomainEvent>) {
        for event in events {
            let subject = format!("{}.{}", self.subject_prefix, event.subject());
            let Some(client) = &self.nats else {
                debug!(%subject, ?event, "Domain event");
                continue;
            };
            let payload = match serde_json::to_vec(&event) {
                Ok(payload) => payload,
                Err(e) => { warn!(%subject, error = %e, "Failed to encode domain event"); continue; }
            };
            if let Err(e) = client.publish(subject.clone(), payload.into()).await {
                warn!(%subject, error = %e, "Failed to publish domain event");
            }
        }
    }
}
