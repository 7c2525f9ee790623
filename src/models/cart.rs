use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Catalog item snapshot carried by cart lines. The catalog itself lives
/// outside this service; cart operations only need the fields below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Product {
    pub id: u32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    /// Declared size options; an empty list means the product is unsized.
    #[serde(default)]
    pub sizes: Vec<String>,
}

/// One cart line. Identity is (product id, size): the same product in two
/// sizes is two lines, and re-adding an existing (product, size) pair
/// increments the quantity instead of duplicating the line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CartItem {
    pub product_id: u32,
    pub name: String,
    pub price: Decimal,
    pub image: String,
    pub size: String,
    pub quantity: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: u32, size: &str) -> bool {
        self.product_id == product_id && self.size == size
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Cart {
    pub items: Vec<CartItem>,
}

impl Cart {
    /// Adds `quantity` units of (product, size), merging into an existing
    /// line when the pair is already present.
    pub fn add(&mut self, product: &Product, size: &str, quantity: u32) {
        if let Some(item) = self
            .items
            .iter_mut()
            .find(|item| item.matches(product.id, size))
        {
            item.quantity += quantity;
            return;
        }
        self.items.push(CartItem {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image: product.image.clone(),
            size: size.to_string(),
            quantity,
        });
    }

    /// Sets the quantity of an existing line. Zero removes the line.
    /// Returns false when no line matches (product id, size).
    pub fn set_quantity(&mut self, product_id: u32, size: &str, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id, size);
        }
        match self
            .items
            .iter_mut()
            .find(|item| item.matches(product_id, size))
        {
            Some(item) => {
                item.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Removes a line entirely. Returns false when no line matches.
    pub fn remove(&mut self, product_id: u32, size: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| !item.matches(product_id, size));
        self.items.len() != before
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn tee() -> Product {
        Product {
            id: 1,
            name: "Oversized Tee".to_string(),
            price: dec!(700),
            image: "/images/tee.jpg".to_string(),
            sizes: vec!["S".to_string(), "M".to_string(), "L".to_string()],
        }
    }

    #[test]
    fn adding_same_product_and_size_merges_lines() {
        let mut cart = Cart::default();
        cart.add(&tee(), "M", 1);
        cart.add(&tee(), "M", 1);

        assert_eq!(cart.items.len(), 1);
        assert_eq!(cart.items[0].quantity, 2);
    }

    #[test]
    fn same_product_different_sizes_are_distinct_lines() {
        let mut cart = Cart::default();
        cart.add(&tee(), "M", 1);
        cart.add(&tee(), "L", 1);

        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn setting_quantity_to_zero_removes_the_line() {
        let mut cart = Cart::default();
        cart.add(&tee(), "M", 1);

        assert!(cart.set_quantity(1, "M", 0));
        assert!(cart.is_empty());
    }

    #[test]
    fn removing_unknown_line_is_reported() {
        let mut cart = Cart::default();
        cart.add(&tee(), "M", 1);

        assert!(!cart.remove(1, "XL"));
        assert_eq!(cart.items.len(), 1);
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let mut cart = Cart::default();
        cart.add(&tee(), "M", 2);
        cart.add(&tee(), "L", 1);

        assert_eq!(cart.subtotal(), dec!(2100));
    }
}
