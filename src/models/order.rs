use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use strum::Display;
use utoipa::ToSchema;

use super::cart::CartItem;

/// Pricing constants, sourced from configuration rather than call sites.
#[derive(Debug, Clone, PartialEq)]
pub struct PricingPolicy {
    pub free_shipping_threshold: Decimal,
    pub shipping_flat_fee: Decimal,
    pub tax_rate: Decimal,
}

/// Derived totals for a set of cart lines. Never stored independently of
/// the lines it was computed from; recompute whenever the cart changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct OrderSummary {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub tax: Decimal,
    pub total: Decimal,
}

impl OrderSummary {
    /// Computes subtotal, shipping, tax, and total for the given lines.
    ///
    /// Shipping is free above the threshold and a flat fee otherwise (zero
    /// for an empty set). Tax is rounded to integral currency units with
    /// half-away-from-zero rounding.
    pub fn compute(items: &[CartItem], policy: &PricingPolicy) -> Self {
        let subtotal: Decimal = items.iter().map(CartItem::line_total).sum();

        let shipping = if subtotal > policy.free_shipping_threshold {
            Decimal::ZERO
        } else if subtotal > Decimal::ZERO {
            policy.shipping_flat_fee
        } else {
            Decimal::ZERO
        };

        let tax = (subtotal * policy.tax_rate)
            .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);

        Self {
            subtotal,
            shipping,
            tax,
            total: subtotal + shipping + tax,
        }
    }
}

/// Payment selector offered at checkout. Only `Gateway` performs real
/// verification; the other methods are accepted after simulated
/// processing and must not be reused as-is for production rails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, ToSchema)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PaymentMethod {
    Gateway,
    Card,
    Upi,
    CashOnDelivery,
}

/// Shipping step form. Every field is required before the checkout can
/// advance past the shipping step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingForm {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
}

/// Card sub-fields, required only when the payment method is `Card`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CardDetails {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
    pub name_on_card: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CustomerInfo {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingAddress {
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
}

impl ShippingForm {
    pub fn customer_info(&self) -> CustomerInfo {
        CustomerInfo {
            email: self.email.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            phone: self.phone.clone(),
        }
    }

    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            address: self.address.clone(),
            city: self.city.clone(),
            state: self.state.clone(),
            zip_code: self.zip_code.clone(),
        }
    }
}

/// Payment metadata recorded on a built order. Gateway identifiers are
/// present only for gateway payments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentRecord {
    pub method: PaymentMethod,
    pub amount: Decimal,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_payment_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_signature: Option<String>,
}

/// Immutable order record. Built only after payment verification
/// succeeded (or the simulated non-gateway path completed) and owned by
/// the caller thereafter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub order_id: String,
    pub items: Vec<CartItem>,
    pub customer: CustomerInfo,
    pub shipping_address: ShippingAddress,
    pub payment: PaymentRecord,
    pub summary: OrderSummary,
    pub placed_at: DateTime<Utc>,
}
