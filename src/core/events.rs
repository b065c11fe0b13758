//! Audit notifications emitted once per successful transfer.
//!
//! Delivery is best-effort: [`EventBus::publish`] never fails its caller, and an event with
//! no listening subscriber is dropped after being logged.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Commercial terms of one transfer as seen by external listeners.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEvent {
    /// Selling party
    pub supplier_id: String,
    /// Buying party
    pub customer_id: String,
    /// Unix timestamp supplied with the transfer
    pub transaction_date: i64,
    /// Unit price the bill was computed from
    pub per_unit_selling_price: u32,
    /// Manufacturer of the transferred units
    pub manufacturer_id: String,
    /// Product id within the manufacturer's catalog
    pub product_id: String,
    /// Number of units transferred
    pub total_parcel_units: u64,
    /// Bill amount written on the receipt
    pub total_bill: u64,
}

/// A named audit event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditNotification {
    /// Event name, e.g. `Distributor Shipment Alert`
    pub name: String,
    /// Event payload
    pub event: AuditEvent,
}

/// In-process fan-out of audit notifications over a `tokio` broadcast channel.
#[derive(Debug)]
pub struct EventBus {
    sender: broadcast::Sender<AuditNotification>,
    published: AtomicU64,
}

impl EventBus {
    /// Creates a bus buffering at most `capacity` notifications per lagging subscriber.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    /// Registers a new listener. It receives every notification published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<AuditNotification> {
        debug!("Audit subscriber added");
        self.sender.subscribe()
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Total notifications published, delivered or not.
    #[must_use]
    pub fn published(&self) -> u64 {
        self.published.load(Ordering::Relaxed)
    }

    /// Publishes a notification and returns how many subscribers received it.
    pub fn publish(&self, notification: AuditNotification) -> usize {
        self.published.fetch_add(1, Ordering::Relaxed);
        let name = notification.name.clone();
        match self.sender.send(notification) {
            Ok(receivers) => {
                debug!(event = %name, receivers, "Audit event published");
                receivers
            }
            Err(broadcast::error::SendError(dropped)) => {
                warn!(
                    event = %name,
                    supplier = %dropped.event.supplier_id,
                    customer = %dropped.event.customer_id,
                    "Audit event dropped (no subscribers)"
                );
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    fn notification(bill: u64) -> AuditNotification {
        AuditNotification {
            name: "Distributor Shipment Alert".to_string(),
            event: AuditEvent {
                supplier_id: "M1".to_string(),
                customer_id: "D1".to_string(),
                transaction_date: 1_700_000_000,
                per_unit_selling_price: 5,
                manufacturer_id: "M1".to_string(),
                product_id: "P1".to_string(),
                total_parcel_units: 2,
                total_bill: bill,
            },
        }
    }

    #[test]
    fn test_publish_without_subscribers_is_not_an_error() {
        let bus = EventBus::with_capacity(4);
        assert_eq!(bus.publish(notification(30)), 0);
        assert_eq!(bus.published(), 1);
    }

    #[tokio::test]
    async fn test_subscribers_receive_notifications_in_order() {
        let bus = EventBus::with_capacity(4);
        let mut first = bus.subscribe();
        let mut second = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        assert_eq!(bus.publish(notification(10)), 2);
        assert_eq!(bus.publish(notification(20)), 2);

        assert_eq!(first.recv().await.unwrap().event.total_bill, 10);
        assert_eq!(first.recv().await.unwrap().event.total_bill, 20);
        assert_eq!(second.recv().await.unwrap(), notification(10));
    }

    #[test]
    fn test_event_wire_field_names() {
        let value = serde_json::to_value(notification(30).event).unwrap();
        for field in [
            "supplierId",
            "customerId",
            "transactionDate",
            "perUnitSellingPrice",
            "manufacturerId",
            "productId",
            "totalParcelUnits",
            "totalBill",
        ] {
            assert!(value.get(field).is_some(), "missing {field}");
        }
    }
}
