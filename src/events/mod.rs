use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Tanks holding less than this many liters after an offload trigger a
/// restocking alert in the processing loop.
const LOW_VOLUME_ALERT_LITERS: Decimal = dec!(100);

#[derive(Debug, Clone)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }
}

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Milk movement events
    MilkReceived {
        record_id: Uuid,
        tank_number: String,
        volume_liters: Decimal,
        supplier_name: Option<String>,
        received_at: DateTime<Utc>,
    },
    MilkOffloaded {
        record_id: Uuid,
        tank_number: String,
        volume_liters: Decimal,
        destination: String,
        available_after: Decimal,
    },
    OffloadRejected {
        tank_number: Option<String>,
        failure_count: usize,
    },

    // Directory events
    SupplierCreated(Uuid),
    EmployeeCreated(Uuid),
}

/// Processes events from the event channel until every sender is gone.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Event processing loop started");

    while let Some(event) = rx.recv().await {
        match event {
            Event::MilkReceived {
                record_id,
                tank_number,
                volume_liters,
                supplier_name,
                ..
            } => {
                info!(
                    "Milk received: record={}, tank={}, volume={}L, supplier={}",
                    record_id,
                    tank_number,
                    volume_liters,
                    supplier_name.as_deref().unwrap_or("unknown")
                );
            }
            Event::MilkOffloaded {
                record_id,
                tank_number,
                volume_liters,
                destination,
                available_after,
            } => {
                if let Err(e) = handle_milk_offloaded(
                    record_id,
                    &tank_number,
                    volume_liters,
                    &destination,
                    available_after,
                )
                .await
                {
                    error!(
                        "Failed to handle offload event: record={}, error={}",
                        record_id, e
                    );
                }
            }
            Event::OffloadRejected {
                tank_number,
                failure_count,
            } => {
                warn!(
                    "Offload rejected: tank={}, failures={}",
                    tank_number.as_deref().unwrap_or("unspecified"),
                    failure_count
                );
            }
            Event::SupplierCreated(supplier_id) => {
                info!("Supplier created: {}", supplier_id);
            }
            Event::EmployeeCreated(employee_id) => {
                info!("Employee created: {}", employee_id);
            }
        }
    }

    warn!("Event processing loop has ended");
}

// Handler functions for specific events
async fn handle_milk_offloaded(
    record_id: Uuid,
    tank_number: &str,
    volume_liters: Decimal,
    destination: &str,
    available_after: Decimal,
) -> Result<(), String> {
    info!(
        "Processing offload: record={}, tank={}, volume={}L, destination={}",
        record_id, tank_number, volume_liters, destination
    );

    if available_after < LOW_VOLUME_ALERT_LITERS {
        warn!(
            "Low volume alert: {} holds only {}L after offload",
            tank_number, available_after
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[tokio::test]
    async fn sender_delivers_events_in_order() {
        let (tx, mut rx) = mpsc::channel(8);
        let sender = EventSender::new(tx);

        sender
            .send(Event::MilkReceived {
                record_id: Uuid::new_v4(),
                tank_number: "Tank A".into(),
                volume_liters: dec!(250),
                supplier_name: Some("Meadow Farm".into()),
                received_at: Utc::now(),
            })
            .await
            .unwrap();
        sender
            .send(Event::OffloadRejected {
                tank_number: Some("Tank A".into()),
                failure_count: 2,
            })
            .await
            .unwrap();

        assert_matches!(rx.recv().await, Some(Event::MilkReceived { tank_number, .. }) => {
            assert_eq!(tank_number, "Tank A");
        });
        assert_matches!(
            rx.recv().await,
            Some(Event::OffloadRejected { failure_count: 2, .. })
        );
    }

    #[tokio::test]
    async fn send_fails_once_the_receiver_is_gone() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);

        let sender = EventSender::new(tx);
        let result = sender.send(Event::SupplierCreated(Uuid::new_v4())).await;
        assert!(result.is_err());
    }
}
