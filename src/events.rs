use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::models::{NotificationInput, NotificationKind};
use crate::services::notifications::NotificationHub;

// Define the various events that can occur in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    CartItemAdded {
        product_name: String,
        user_email: Option<String>,
    },
    WishlistItemAdded {
        product_name: String,
        user_email: Option<String>,
    },
    OrderPlaced {
        order_id: String,
        user_email: String,
        order_value: Decimal,
    },
    UserSignedUp {
        user_email: String,
    },
}

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

    /// Sends an event, logging instead of failing when the channel is
    /// unavailable. Event delivery never fails the caller's action.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping event: {}", e);
        }
    }
}

/// Consumes domain events and turns each into a notification record.
/// Running this loop on a single task is the serialization point that
/// keeps log insertion ordered across concurrent producers.
pub async fn process_events(mut rx: mpsc::Receiver<Event>, hub: Arc<NotificationHub>) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        let input = match event {
            Event::CartItemAdded {
                product_name,
                user_email,
            } => {
                let mut input = NotificationInput::new(
                    NotificationKind::CartAdd,
                    format!("{} added to cart", product_name),
                )
                .with_product_name(product_name);
                if let Some(email) = user_email {
                    input = input.with_user_email(email);
                }
                input
            }
            Event::WishlistItemAdded {
                product_name,
                user_email,
            } => {
                let mut input = NotificationInput::new(
                    NotificationKind::WishlistAdd,
                    format!("{} added to wishlist", product_name),
                )
                .with_product_name(product_name);
                if let Some(email) = user_email {
                    input = input.with_user_email(email);
                }
                input
            }
            Event::OrderPlaced {
                order_id,
                user_email,
                order_value,
            } => {
                info!("Order placed: {}", order_id);
                NotificationInput::new(
                    NotificationKind::OrderPlaced,
                    format!("New order placed - ₹{}/-", order_value),
                )
                .with_user_email(user_email)
                .with_order_value(order_value)
            }
            Event::UserSignedUp { user_email } => NotificationInput::new(
                NotificationKind::UserSignup,
                format!("New user registered: {}", user_email),
            )
            .with_user_email(user_email),
        };

        hub.record(input).await;
    }

    warn!("Event processing loop has ended");
}
