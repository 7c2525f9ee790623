use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::config::AppConfig;
use crate::errors::ServiceError;
use crate::events::{Event, EventSender};
use crate::models::{
    CardDetails, CartItem, Order, OrderSummary, PaymentMethod, PaymentRecord, PricingPolicy,
    ShippingForm,
};
use crate::services::carts::CartService;
use crate::services::orders::OrderBuilder;
use crate::services::payments::{
    GatewayCompletion, PaymentGateway, PaymentOutcome, SignatureVerifier,
};

const VERIFICATION_FAILED_MESSAGE: &str = "Payment verification failed. Please contact support.";
const CANCELLED_MESSAGE: &str = "Payment was cancelled. Please try again.";
const GATEWAY_UNREACHABLE_MESSAGE: &str = "Payment gateway unreachable. Please try again.";

/// Why a payment attempt failed. Distinct reasons drive distinct
/// user-facing messages; operators get the specifics from the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentFailureReason {
    VerificationFailed,
    Cancelled,
    GatewayUnreachable,
}

/// Checkout progression. `PaymentError` is re-enterable: every payment
/// operation accepts it as a starting point so the shopper can retry.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum CheckoutState {
    ShippingInfo,
    Payment,
    PaymentError {
        reason: PaymentFailureReason,
        message: String,
    },
    Confirmed,
}

/// One shopper's in-flight checkout. Holds a cart snapshot taken at
/// start; the live cart is only cleared when the session confirms.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutSession {
    pub id: Uuid,
    pub cart_session: String,
    pub items: Vec<CartItem>,
    pub summary: OrderSummary,
    pub state: CheckoutState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping: Option<ShippingForm>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_order_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<Order>,
    pub created_at: DateTime<Utc>,
}

/// Parameters for opening the hosted payment interface, with customer
/// prefill. The gateway secret never appears here.
#[derive(Debug, Clone, Serialize)]
pub struct HostedPaymentParams {
    pub key_id: String,
    pub gateway_order_id: String,
    pub amount: i64,
    pub currency: String,
    pub prefill: PaymentPrefill,
}

#[derive(Debug, Clone, Serialize)]
pub struct PaymentPrefill {
    pub name: String,
    pub email: String,
    pub contact: String,
}

/// Drives the shipping-info → payment → confirmation flow, invoking the
/// gateway and the signature verifier, and holding error/retry state.
pub struct CheckoutService {
    sessions: DashMap<Uuid, CheckoutSession>,
    carts: Arc<CartService>,
    gateway: Arc<dyn PaymentGateway>,
    verifier: SignatureVerifier,
    builder: OrderBuilder,
    events: EventSender,
    pricing: PricingPolicy,
    gateway_key_id: String,
    currency: String,
    simulated_delay: Duration,
}

impl CheckoutService {
    pub fn new(
        config: &AppConfig,
        gateway: Arc<dyn PaymentGateway>,
        carts: Arc<CartService>,
        events: EventSender,
    ) -> Self {
        Self {
            sessions: DashMap::new(),
            carts,
            gateway,
            verifier: SignatureVerifier::new(config.gateway_key_secret.clone()),
            builder: OrderBuilder::new(config.order_id_prefix.clone()),
            events,
            pricing: PricingPolicy {
                free_shipping_threshold: config.free_shipping_threshold,
                shipping_flat_fee: config.shipping_flat_fee,
                tax_rate: config.tax_rate,
            },
            gateway_key_id: config.gateway_key_id.clone(),
            currency: config.currency.clone(),
            simulated_delay: Duration::from_millis(config.simulated_processing_delay_ms),
        }
    }

    /// Starts a checkout from the session's current cart. The cart must
    /// be non-empty; its contents are snapshotted into the session.
    #[instrument(skip(self))]
    pub fn start(&self, cart_session: &str) -> Result<CheckoutSession, ServiceError> {
        let cart = self.carts.get(cart_session);
        if cart.is_empty() {
            return Err(ServiceError::InvalidOperation(
                "cannot start checkout with an empty cart".to_string(),
            ));
        }

        let summary = OrderSummary::compute(&cart.items, &self.pricing);
        let session = CheckoutSession {
            id: Uuid::new_v4(),
            cart_session: cart_session.to_string(),
            items: cart.items,
            summary,
            state: CheckoutState::ShippingInfo,
            shipping: None,
            gateway_order_id: None,
            order: None,
            created_at: Utc::now(),
        };

        self.sessions.insert(session.id, session.clone());
        info!("Started checkout {} for cart {}", session.id, cart_session);
        Ok(session)
    }

    pub fn get(&self, id: Uuid) -> Result<CheckoutSession, ServiceError> {
        self.sessions
            .get(&id)
            .map(|session| session.clone())
            .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))
    }

    /// Advances shipping-info → payment. Every shipping field must be
    /// populated; otherwise the session stays put and the field errors
    /// are surfaced.
    #[instrument(skip(self, form))]
    pub fn submit_shipping(
        &self,
        id: Uuid,
        form: ShippingForm,
    ) -> Result<CheckoutSession, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;

        if session.state != CheckoutState::ShippingInfo {
            return Err(ServiceError::InvalidOperation(
                "shipping details can only be submitted from the shipping step".to_string(),
            ));
        }

        let errors = shipping_field_errors(&form);
        if !errors.is_empty() {
            return Err(ServiceError::ValidationError(errors.join("; ")));
        }

        session.shipping = Some(form);
        session.state = CheckoutState::Payment;
        Ok(session.clone())
    }

    /// User-initiated back-navigation. Entered shipping data survives.
    #[instrument(skip(self))]
    pub fn back_to_shipping(&self, id: Uuid) -> Result<CheckoutSession, ServiceError> {
        let mut session = self
            .sessions
            .get_mut(&id)
            .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;

        match session.state {
            CheckoutState::Payment | CheckoutState::PaymentError { .. } => {
                session.state = CheckoutState::ShippingInfo;
                Ok(session.clone())
            }
            CheckoutState::ShippingInfo => Err(ServiceError::InvalidOperation(
                "already at the shipping step".to_string(),
            )),
            CheckoutState::Confirmed => Err(ServiceError::InvalidOperation(
                "checkout is already confirmed".to_string(),
            )),
        }
    }

    /// Creates a gateway order for the session total and returns the
    /// parameters for opening the hosted payment interface. On gateway
    /// failure the session lands in a retryable `PaymentError`.
    #[instrument(skip(self))]
    pub async fn initiate_gateway_payment(
        &self,
        id: Uuid,
    ) -> Result<HostedPaymentParams, ServiceError> {
        let (amount_minor, prefill) = {
            let session = self
                .sessions
                .get(&id)
                .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;
            ensure_payment_step(&session.state)?;

            let form = session.shipping.as_ref().ok_or_else(|| {
                ServiceError::InvalidOperation(
                    "shipping details are required before payment".to_string(),
                )
            })?;

            let amount_minor = (session.summary.total * Decimal::from(100))
                .to_i64()
                .ok_or_else(|| {
                    ServiceError::InternalError(
                        "order total does not fit in minor currency units".to_string(),
                    )
                })?;

            (
                amount_minor,
                PaymentPrefill {
                    name: format!("{} {}", form.first_name, form.last_name),
                    email: form.email.clone(),
                    contact: form.phone.clone(),
                },
            )
        };

        match self.gateway.create_order(amount_minor, &self.currency).await {
            Ok(order) => {
                let mut session = self
                    .sessions
                    .get_mut(&id)
                    .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;
                session.gateway_order_id = Some(order.id.clone());
                // A retry from PaymentError re-enters Payment here.
                session.state = CheckoutState::Payment;

                Ok(HostedPaymentParams {
                    key_id: self.gateway_key_id.clone(),
                    gateway_order_id: order.id,
                    amount: order.amount,
                    currency: order.currency,
                    prefill,
                })
            }
            Err(err) => {
                if let Some(mut session) = self.sessions.get_mut(&id) {
                    session.state = CheckoutState::PaymentError {
                        reason: PaymentFailureReason::GatewayUnreachable,
                        message: GATEWAY_UNREACHABLE_MESSAGE.to_string(),
                    };
                }
                warn!("Gateway order creation failed for checkout {}: {}", id, err);
                Err(err)
            }
        }
    }

    /// Handles the hosted interface's completion callback. The signature
    /// is verified server-side before any state transition; no order
    /// exists unless verification returned true.
    #[instrument(skip(self, completion))]
    pub async fn complete_gateway_payment(
        &self,
        id: Uuid,
        completion: GatewayCompletion,
    ) -> Result<CheckoutSession, ServiceError> {
        let outcome = {
            let session = self
                .sessions
                .get(&id)
                .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;

            if session.state != CheckoutState::Payment {
                return Err(ServiceError::InvalidOperation(
                    "no payment is in progress for this checkout".to_string(),
                ));
            }

            match completion {
                GatewayCompletion::Dismissed => {
                    info!("Hosted payment dismissed for checkout {}", id);
                    PaymentOutcome::Cancelled
                }
                GatewayCompletion::Completed {
                    razorpay_order_id,
                    razorpay_payment_id,
                    razorpay_signature,
                } => {
                    if session.gateway_order_id.as_deref() != Some(razorpay_order_id.as_str()) {
                        warn!(
                            "Callback order id {} does not match checkout {}",
                            razorpay_order_id, id
                        );
                        PaymentOutcome::VerificationFailed
                    } else if self.verifier.verify(
                        &razorpay_order_id,
                        &razorpay_payment_id,
                        &razorpay_signature,
                    ) {
                        let form = session.shipping.as_ref().ok_or_else(|| {
                            ServiceError::InvalidOperation(
                                "shipping details are required before payment".to_string(),
                            )
                        })?;
                        let payment = PaymentRecord {
                            method: PaymentMethod::Gateway,
                            amount: session.summary.total,
                            verified: true,
                            gateway_order_id: Some(razorpay_order_id),
                            gateway_payment_id: Some(razorpay_payment_id),
                            gateway_signature: Some(razorpay_signature),
                        };
                        let order = self.builder.build(
                            session.items.clone(),
                            form,
                            session.summary.clone(),
                            payment,
                        )?;
                        PaymentOutcome::VerifiedSuccess(Box::new(order))
                    } else {
                        warn!(
                            "Signature verification failed for gateway order {:?} on checkout {}",
                            session.gateway_order_id, id
                        );
                        PaymentOutcome::VerificationFailed
                    }
                }
            }
        };

        self.apply_outcome(id, outcome).await
    }

    /// Non-gateway payment: validates method-specific fields, simulates
    /// processing, then confirms. No real verification happens on this
    /// path; do not reuse it for production payment rails.
    #[instrument(skip(self, card))]
    pub async fn pay_with_method(
        &self,
        id: Uuid,
        method: PaymentMethod,
        card: Option<CardDetails>,
    ) -> Result<CheckoutSession, ServiceError> {
        {
            let session = self
                .sessions
                .get(&id)
                .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;
            ensure_payment_step(&session.state)?;

            if method == PaymentMethod::Gateway {
                return Err(ServiceError::InvalidOperation(
                    "hosted gateway payments start with the gateway order, not direct processing"
                        .to_string(),
                ));
            }
            if method == PaymentMethod::Card {
                let errors = card_field_errors(card.as_ref());
                if !errors.is_empty() {
                    return Err(ServiceError::ValidationError(errors.join("; ")));
                }
            }
            if session.shipping.is_none() {
                return Err(ServiceError::InvalidOperation(
                    "shipping details are required before payment".to_string(),
                ));
            }
        }

        tokio::time::sleep(self.simulated_delay).await;

        let order = {
            let session = self
                .sessions
                .get(&id)
                .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;
            let form = session.shipping.as_ref().ok_or_else(|| {
                ServiceError::InvalidOperation(
                    "shipping details are required before payment".to_string(),
                )
            })?;
            let payment = PaymentRecord {
                method,
                amount: session.summary.total,
                verified: true,
                gateway_order_id: None,
                gateway_payment_id: None,
                gateway_signature: None,
            };
            self.builder
                .build(session.items.clone(), form, session.summary.clone(), payment)?
        };

        self.apply_outcome(id, PaymentOutcome::VerifiedSuccess(Box::new(order)))
            .await
    }

    /// Discards the whole flow. The cart is never cleared on abort.
    #[instrument(skip(self))]
    pub fn abort(&self, id: Uuid) -> Result<(), ServiceError> {
        self.sessions
            .remove(&id)
            .map(|_| info!("Aborted checkout {}", id))
            .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))
    }

    /// Applies a payment outcome to the session. Only a verified (or
    /// simulated) success clears the cart and announces the order.
    async fn apply_outcome(
        &self,
        id: Uuid,
        outcome: PaymentOutcome,
    ) -> Result<CheckoutSession, ServiceError> {
        let (snapshot, placed) = {
            let mut session = self
                .sessions
                .get_mut(&id)
                .ok_or_else(|| ServiceError::NotFound(format!("checkout session {}", id)))?;

            match outcome {
                PaymentOutcome::VerifiedSuccess(order) => {
                    session.order = Some(*order.clone());
                    session.state = CheckoutState::Confirmed;
                    (session.clone(), Some(*order))
                }
                PaymentOutcome::VerificationFailed => {
                    session.state = CheckoutState::PaymentError {
                        reason: PaymentFailureReason::VerificationFailed,
                        message: VERIFICATION_FAILED_MESSAGE.to_string(),
                    };
                    (session.clone(), None)
                }
                PaymentOutcome::Cancelled => {
                    session.state = CheckoutState::PaymentError {
                        reason: PaymentFailureReason::Cancelled,
                        message: CANCELLED_MESSAGE.to_string(),
                    };
                    (session.clone(), None)
                }
            }
        };

        if let Some(order) = placed {
            self.carts.clear(&snapshot.cart_session);
            self.events
                .send_or_log(Event::OrderPlaced {
                    order_id: order.order_id.clone(),
                    user_email: order.customer.email.clone(),
                    order_value: order.summary.total,
                })
                .await;
            info!(
                "Checkout {} confirmed: order {} for ₹{}/-",
                id, order.order_id, order.summary.total
            );
        }

        Ok(snapshot)
    }
}

fn ensure_payment_step(state: &CheckoutState) -> Result<(), ServiceError> {
    match state {
        CheckoutState::Payment | CheckoutState::PaymentError { .. } => Ok(()),
        CheckoutState::ShippingInfo => Err(ServiceError::InvalidOperation(
            "complete the shipping step before paying".to_string(),
        )),
        CheckoutState::Confirmed => Err(ServiceError::InvalidOperation(
            "checkout is already confirmed".to_string(),
        )),
    }
}

/// Field-level validation for the shipping step, mirroring the required
/// fields the shopper sees.
pub fn shipping_field_errors(form: &ShippingForm) -> Vec<String> {
    let mut errors = Vec::new();
    let required: [(&str, &str, &str); 8] = [
        ("email", &form.email, "Email is required"),
        ("first_name", &form.first_name, "First name is required"),
        ("last_name", &form.last_name, "Last name is required"),
        ("address", &form.address, "Address is required"),
        ("city", &form.city, "City is required"),
        ("state", &form.state, "State is required"),
        ("zip_code", &form.zip_code, "ZIP code is required"),
        ("phone", &form.phone, "Phone number is required"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            errors.push(format!("{}: {}", field, message));
        }
    }
    errors
}

/// Card sub-fields become mandatory only when the method is `Card`.
pub fn card_field_errors(card: Option<&CardDetails>) -> Vec<String> {
    let Some(card) = card else {
        return vec!["card: Card details are required".to_string()];
    };
    let mut errors = Vec::new();
    let required: [(&str, &str, &str); 4] = [
        ("number", &card.number, "Card number is required"),
        ("expiry", &card.expiry, "Expiry date is required"),
        ("cvv", &card.cvv, "CVV is required"),
        ("name_on_card", &card.name_on_card, "Name on card is required"),
    ];
    for (field, value, message) in required {
        if value.trim().is_empty() {
            errors.push(format!("{}: {}", field, message));
        }
    }
    errors
}
