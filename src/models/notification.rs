use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;
use uuid::Uuid;

/// Semantic event kind carried by a notification. Wire names match the
/// admin ingestion contract (`cart_add`, `order_placed`, ...).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, ToSchema,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum NotificationKind {
    CartAdd,
    OrderPlaced,
    UserSignup,
    WishlistAdd,
}

/// One entry in the admin-facing notification log. Optional fields are
/// populated per kind: product name for cart/wishlist adds, order value
/// for placed orders, user email wherever one is known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Notification {
    pub id: Uuid,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order_value: Option<Decimal>,
}

/// Payload for recording a notification; id and timestamp are assigned at
/// the dispatch boundary.
#[derive(Debug, Clone)]
pub struct NotificationInput {
    pub kind: NotificationKind,
    pub message: String,
    pub user_email: Option<String>,
    pub product_name: Option<String>,
    pub order_value: Option<Decimal>,
}

impl NotificationInput {
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            user_email: None,
            product_name: None,
            order_value: None,
        }
    }

    pub fn with_user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = Some(email.into());
        self
    }

    pub fn with_product_name(mut self, name: impl Into<String>) -> Self {
        self.product_name = Some(name.into());
        self
    }

    pub fn with_order_value(mut self, value: Decimal) -> Self {
        self.order_value = Some(value);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_serializes_to_snake_case_wire_names() {
        assert_eq!(
            serde_json::to_value(NotificationKind::CartAdd).unwrap(),
            serde_json::json!("cart_add")
        );
        assert_eq!(
            serde_json::to_value(NotificationKind::OrderPlaced).unwrap(),
            serde_json::json!("order_placed")
        );
        assert_eq!(NotificationKind::WishlistAdd.to_string(), "wishlist_add");
    }

    #[test]
    fn kind_field_is_renamed_to_type_on_the_wire() {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: NotificationKind::UserSignup,
            message: "New user registered".to_string(),
            timestamp: Utc::now(),
            user_email: Some("shopper@example.com".to_string()),
            product_name: None,
            order_value: None,
        };

        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "user_signup");
        assert!(value.get("product_name").is_none());
    }
}
