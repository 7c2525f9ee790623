// Core models
pub mod cart;
pub mod notification;
pub mod order;

pub use cart::{Cart, CartItem, Product};
pub use notification::{Notification, NotificationInput, NotificationKind};
pub use order::{
    CardDetails, CustomerInfo, Order, OrderSummary, PaymentMethod, PaymentRecord, PricingPolicy,
    ShippingAddress, ShippingForm,
};
