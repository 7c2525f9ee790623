use chrono::Utc;
use std::sync::atomic::{AtomicU16, Ordering};

use crate::errors::ServiceError;
use crate::models::{CartItem, Order, OrderSummary, PaymentRecord, ShippingForm};

/// Generates order ids of the form `{prefix}-{unix_millis}-{hex suffix}`.
/// The suffix is a randomly seeded counter, so ids stay unique when two
/// orders are built within the same millisecond.
#[derive(Debug)]
pub struct OrderIdGenerator {
    prefix: String,
    counter: AtomicU16,
}

impl OrderIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: AtomicU16::new(rand::random()),
        }
    }

    pub fn next(&self) -> String {
        let suffix = self.counter.fetch_add(1, Ordering::Relaxed);
        format!(
            "{}-{}-{:04X}",
            self.prefix,
            Utc::now().timestamp_millis(),
            suffix
        )
    }
}

/// Assembles immutable order records from a cart snapshot, validated
/// customer form data, and a payment result. Emitting the `order_placed`
/// notification is the caller's responsibility, exactly once per order.
#[derive(Debug)]
pub struct OrderBuilder {
    ids: OrderIdGenerator,
}

impl OrderBuilder {
    pub fn new(order_id_prefix: impl Into<String>) -> Self {
        Self {
            ids: OrderIdGenerator::new(order_id_prefix),
        }
    }

    /// Builds an order. An empty cart is a caller error, never a
    /// zero-item order.
    pub fn build(
        &self,
        items: Vec<CartItem>,
        form: &ShippingForm,
        summary: OrderSummary,
        payment: PaymentRecord,
    ) -> Result<Order, ServiceError> {
        if items.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "cannot build an order from an empty cart".to_string(),
            ));
        }

        Ok(Order {
            order_id: self.ids.next(),
            items,
            customer: form.customer_info(),
            shipping_address: form.shipping_address(),
            payment,
            summary,
            placed_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PaymentMethod, PricingPolicy};
    use rust_decimal_macros::dec;
    use std::collections::HashSet;

    fn items() -> Vec<CartItem> {
        vec![CartItem {
            product_id: 3,
            name: "Denim Jacket".to_string(),
            price: dec!(1600),
            image: "/images/jacket.jpg".to_string(),
            size: "L".to_string(),
            quantity: 1,
        }]
    }

    fn form() -> ShippingForm {
        ShippingForm {
            email: "shopper@example.com".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            state: "KA".to_string(),
            zip_code: "560001".to_string(),
            phone: "+91 9000000000".to_string(),
        }
    }

    fn summary() -> OrderSummary {
        OrderSummary::compute(
            &items(),
            &PricingPolicy {
                free_shipping_threshold: dec!(1500),
                shipping_flat_fee: dec!(99),
                tax_rate: dec!(0.18),
            },
        )
    }

    fn payment() -> PaymentRecord {
        PaymentRecord {
            method: PaymentMethod::Gateway,
            amount: dec!(1888),
            verified: true,
            gateway_order_id: Some("order_abc".to_string()),
            gateway_payment_id: Some("pay_def".to_string()),
            gateway_signature: Some("sig".to_string()),
        }
    }

    #[test]
    fn builds_order_from_snapshot() {
        let builder = OrderBuilder::new("ORD");
        let order = builder.build(items(), &form(), summary(), payment()).unwrap();

        assert!(order.order_id.starts_with("ORD-"));
        assert_eq!(order.items.len(), 1);
        assert_eq!(order.customer.email, "shopper@example.com");
        assert_eq!(order.shipping_address.city, "Bengaluru");
        assert_eq!(order.summary.total, dec!(1888));
        assert!(order.payment.verified);
    }

    #[test]
    fn empty_cart_is_rejected() {
        let builder = OrderBuilder::new("ORD");
        let result = builder.build(Vec::new(), &form(), summary(), payment());

        assert!(matches!(result, Err(ServiceError::InvalidOperation(_))));
    }

    #[test]
    fn generated_ids_are_unique_within_a_burst() {
        let ids = OrderIdGenerator::new("ORD");
        let generated: HashSet<String> = (0..100).map(|_| ids.next()).collect();

        assert_eq!(generated.len(), 100);
    }

    #[test]
    fn id_carries_prefix_and_three_segments() {
        let id = OrderIdGenerator::new("STORE").next();
        let parts: Vec<&str> = id.splitn(3, '-').collect();

        assert_eq!(parts[0], "STORE");
        assert!(parts[1].parse::<i64>().is_ok());
        assert_eq!(parts[2].len(), 4);
    }
}
