use dashmap::DashMap;
use tracing::{info, instrument};

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{Cart, Product};

/// In-memory cart and wishlist store, keyed by the client's session id.
///
/// Line identity is (product id, size): re-adding an existing pair
/// increments its quantity instead of duplicating the line. Cart adds
/// and wishlist adds are announced through the event channel so the
/// admin log and SMS fan-out see them; event delivery never blocks or
/// fails the cart mutation.
pub struct CartService {
    carts: DashMap<String, Cart>,
    wishlists: DashMap<String, Vec<Product>>,
    events: EventSender,
}

impl CartService {
    pub fn new(events: EventSender) -> Self {
        Self {
            carts: DashMap::new(),
            wishlists: DashMap::new(),
            events,
        }
    }

    /// Current cart contents for a session; a session with no cart yet is
    /// an empty cart.
    pub fn get(&self, session: &str) -> Cart {
        self.carts
            .get(session)
            .map(|cart| cart.clone())
            .unwrap_or_default()
    }

    /// Adds units of (product, size) to the session's cart, merging into
    /// an existing line when present.
    #[instrument(skip(self, product), fields(product_id = product.id))]
    pub async fn add_item(
        &self,
        session: &str,
        product: Product,
        size: String,
        quantity: u32,
        user_email: Option<String>,
    ) -> Result<Cart, ServiceError> {
        if quantity == 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be at least 1".to_string(),
            ));
        }
        if !product.sizes.is_empty() && !product.sizes.contains(&size) {
            return Err(ServiceError::ValidationError(format!(
                "size {} is not offered for {}",
                size, product.name
            )));
        }

        let snapshot = {
            let mut cart = self.carts.entry(session.to_string()).or_default();
            cart.add(&product, &size, quantity);
            cart.clone()
        };

        self.events
            .send_or_log(Event::CartItemAdded {
                product_name: product.name.clone(),
                user_email,
            })
            .await;

        info!(
            "Added to cart {}: {} ({}) x{}",
            session, product.name, size, quantity
        );
        Ok(snapshot)
    }

    /// Sets a line's quantity. Zero removes the line entirely.
    #[instrument(skip(self))]
    pub fn set_quantity(
        &self,
        session: &str,
        product_id: u32,
        size: &str,
        quantity: u32,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self
            .carts
            .get_mut(session)
            .ok_or_else(|| ServiceError::NotFound(format!("cart for session {}", session)))?;

        if !cart.set_quantity(product_id, size, quantity) {
            return Err(ServiceError::NotFound(format!(
                "cart line ({}, {})",
                product_id, size
            )));
        }
        Ok(cart.clone())
    }

    /// Removes a line entirely.
    #[instrument(skip(self))]
    pub fn remove_item(
        &self,
        session: &str,
        product_id: u32,
        size: &str,
    ) -> Result<Cart, ServiceError> {
        let mut cart = self
            .carts
            .get_mut(session)
            .ok_or_else(|| ServiceError::NotFound(format!("cart for session {}", session)))?;

        if !cart.remove(product_id, size) {
            return Err(ServiceError::NotFound(format!(
                "cart line ({}, {})",
                product_id, size
            )));
        }
        Ok(cart.clone())
    }

    /// Empties the session's cart. Called by checkout on confirmation;
    /// aborting a checkout must NOT call this.
    #[instrument(skip(self))]
    pub fn clear(&self, session: &str) {
        if let Some(mut cart) = self.carts.get_mut(session) {
            cart.clear();
            info!("Cleared cart for session {}", session);
        }
    }

    /// Toggles a product on the session's wishlist. Returns whether the
    /// product is now present; only additions emit a notification.
    #[instrument(skip(self, product), fields(product_id = product.id))]
    pub async fn toggle_wishlist(
        &self,
        session: &str,
        product: Product,
        user_email: Option<String>,
    ) -> (bool, Vec<Product>) {
        let (added, snapshot) = {
            let mut wishlist = self.wishlists.entry(session.to_string()).or_default();
            if let Some(position) = wishlist.iter().position(|p| p.id == product.id) {
                wishlist.remove(position);
                (false, wishlist.clone())
            } else {
                wishlist.push(product.clone());
                (true, wishlist.clone())
            }
        };

        if added {
            self.events
                .send_or_log(Event::WishlistItemAdded {
                    product_name: product.name.clone(),
                    user_email,
                })
                .await;
            info!("Added {} to wishlist {}", product.name, session);
        } else {
            info!("Removed {} from wishlist {}", product.name, session);
        }

        (added, snapshot)
    }

    pub fn wishlist(&self, session: &str) -> Vec<Product> {
        self.wishlists
            .get(session)
            .map(|wishlist| wishlist.clone())
            .unwrap_or_default()
    }
}
