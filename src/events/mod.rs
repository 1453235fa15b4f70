use metrics::counter;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::enums::{MovementType, OrderStatus};

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

    /// Sends an event, logging instead of failing when the channel is gone.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!(error = %e, "dropping domain event");
            counter!("backoffice_events.dropped", 1);
        }
    }
}

/// Domain events emitted after a write commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    ItemCreated(Uuid),
    ItemUpdated(Uuid),
    ItemDeleted(Uuid),
    CustomerCreated {
        customer_id: Uuid,
        customer_number: i64,
    },
    OrderCreated(Uuid),
    OrderStatusChanged {
        order_id: Uuid,
        old_status: OrderStatus,
        new_status: OrderStatus,
    },
    StockMoved {
        item_id: Uuid,
        inventory_id: Uuid,
        movement: MovementType,
        amount: i32,
        new_stock: i32,
    },
    VendorLedgerPosted {
        vendor_id: Uuid,
        ledger_id: Uuid,
        debit: Decimal,
        credit: Decimal,
    },
    UserSignedUp(Uuid),
    LoginFailed {
        email: String,
    },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ItemCreated(_) => "item_created",
            Event::ItemUpdated(_) => "item_updated",
            Event::ItemDeleted(_) => "item_deleted",
            Event::CustomerCreated { .. } => "customer_created",
            Event::OrderCreated(_) => "order_created",
            Event::OrderStatusChanged { .. } => "order_status_changed",
            Event::StockMoved { .. } => "stock_moved",
            Event::VendorLedgerPosted { .. } => "vendor_ledger_posted",
            Event::UserSignedUp(_) => "user_signed_up",
            Event::LoginFailed { .. } => "login_failed",
        }
    }
}

/// Drains the event channel until every sender is dropped.
pub async fn process_events(mut rx: mpsc::Receiver<Event>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        counter!("backoffice_events.processed", 1, "event" => event.name());

        match &event {
            Event::StockMoved {
                item_id,
                movement,
                amount,
                new_stock,
                ..
            } => {
                info!(%item_id, ?movement, amount, new_stock, "stock moved");
            }
            Event::OrderStatusChanged {
                order_id,
                old_status,
                new_status,
            } => {
                info!(%order_id, ?old_status, ?new_status, "order status changed");
            }
            Event::LoginFailed { email } => {
                warn!(%email, "login failed");
            }
            other => info!(event = other.name(), payload = ?other, "domain event"),
        }
    }

    info!("Event processing loop stopped");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_reach_the_receiver_in_order() {
        let (tx, mut rx) = mpsc::channel(4);
        let sender = EventSender::new(tx);
        let id = Uuid::new_v4();

        sender.send(Event::ItemCreated(id)).await.unwrap();
        sender.send(Event::ItemDeleted(id)).await.unwrap();

        assert_eq!(rx.recv().await, Some(Event::ItemCreated(id)));
        assert_eq!(rx.recv().await, Some(Event::ItemDeleted(id)));
    }

    #[tokio::test]
    async fn send_or_log_survives_a_closed_channel() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let sender = EventSender::new(tx);
        assert!(sender.send(Event::UserSignedUp(Uuid::new_v4())).await.is_err());
        sender.send_or_log(Event::UserSignedUp(Uuid::new_v4())).await;
    }

    #[tokio::test]
    async fn process_events_stops_when_senders_drop() {
        let (tx, rx) = mpsc::channel(2);
        let sender = EventSender::new(tx);
        sender
            .send(Event::LoginFailed {
                email: "a@b.c".into(),
            })
            .await
            .unwrap();
        drop(sender);
        process_events(rx).await;
    }
}
