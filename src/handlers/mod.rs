pub mod admin;
pub mod auth;
pub mod carts;
pub mod checkout;
pub mod common;
pub mod payments;
pub mod sms;
pub mod toasts;

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::carts::CartService;
use crate::services::checkout::CheckoutService;
use crate::services::notifications::NotificationHub;
use crate::services::payments::{PaymentGateway, RazorpayGateway, SignatureVerifier};
use crate::services::sms::{SimulatedSmsSender, SmsSender};
use crate::services::toasts::ToastStore;
use crate::services::users::{AuthService, InMemoryUserRepository};

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub carts: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub notifications: Arc<NotificationHub>,
    pub sms: Arc<dyn SmsSender>,
    pub auth: Arc<AuthService>,
    pub toasts: Arc<ToastStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub verifier: SignatureVerifier,
}

impl AppServices {
    /// Builds the service container: the gateway client and signature
    /// verifier from the configured credentials, the notification hub
    /// wired to the simulated SMS sender, and the in-memory cart, user,
    /// and toast stores.
    pub fn new(config: &AppConfig, events: EventSender) -> Self {
        let sms: Arc<dyn SmsSender> = Arc::new(SimulatedSmsSender::new(Duration::from_millis(
            config.sms_send_delay_ms,
        )));
        let notifications = Arc::new(NotificationHub::new(config, sms.clone()));
        let gateway: Arc<dyn PaymentGateway> = Arc::new(RazorpayGateway::new(config));
        let carts = Arc::new(CartService::new(events.clone()));
        let checkout = Arc::new(CheckoutService::new(
            config,
            gateway.clone(),
            carts.clone(),
            events.clone(),
        ));
        let auth = Arc::new(AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            events,
        ));
        let toasts = Arc::new(ToastStore::new(config));
        let verifier = SignatureVerifier::new(config.gateway_key_secret.clone());

        Self {
            carts,
            checkout,
            notifications,
            sms,
            auth,
            toasts,
            gateway,
            verifier,
        }
    }
}
