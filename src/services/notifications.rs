use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::{AppConfig, SmsEligibility};
use crate::models::{Notification, NotificationInput, NotificationKind};
use crate::services::sms::SmsSender;

/// Summary statistics derived from the notification log. Recomputed from
/// the log on every read; never maintained as independent state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
pub struct DashboardStats {
    pub total_orders: u64,
    pub total_revenue: Decimal,
    pub total_signups: u64,
    pub cart_additions: u64,
}

/// Process-wide notification dispatcher and admin log.
///
/// `record` is the single write path: it assigns id and timestamp,
/// prepends to the capped log (append and truncate happen under one
/// write lock, so concurrent producers cannot each evict a different
/// entry), schedules removal from the transient "recent" view, and fans
/// out to the SMS channel for eligible kinds. SMS and recent-view
/// bookkeeping are fire-and-forget; their failures are logged and never
/// surface to the caller.
pub struct NotificationHub {
    log: Arc<RwLock<VecDeque<Notification>>>,
    recent: Arc<RwLock<Vec<Uuid>>>,
    capacity: usize,
    recent_window: Duration,
    admin_phone: String,
    eligibility: SmsEligibility,
    sms: Arc<dyn SmsSender>,
}

impl NotificationHub {
    pub fn new(config: &AppConfig, sms: Arc<dyn SmsSender>) -> Self {
        Self {
            log: Arc::new(RwLock::new(VecDeque::new())),
            recent: Arc::new(RwLock::new(Vec::new())),
            capacity: config.notification_log_capacity,
            recent_window: Duration::from_secs(config.recent_window_secs),
            admin_phone: config.admin_phone.clone(),
            eligibility: config.sms.clone(),
            sms,
        }
    }

    /// Records a notification and fans it out. Returns the stored record.
    #[instrument(skip(self, input), fields(kind = %input.kind))]
    pub async fn record(&self, input: NotificationInput) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            kind: input.kind,
            message: input.message,
            timestamp: chrono::Utc::now(),
            user_email: input.user_email,
            product_name: input.product_name,
            order_value: input.order_value,
        };

        {
            let mut log = self.log.write().await;
            log.push_front(notification.clone());
            log.truncate(self.capacity);
        }

        self.recent.write().await.insert(0, notification.id);
        let recent = Arc::clone(&self.recent);
        let window = self.recent_window;
        let expired = notification.id;
        tokio::spawn(async move {
            tokio::time::sleep(window).await;
            recent.write().await.retain(|id| *id != expired);
        });

        if self.sms_eligible(notification.kind) {
            let sms = Arc::clone(&self.sms);
            let to = self.admin_phone.clone();
            let message = self.sms_message(&notification);
            let kind = notification.kind.to_string();
            tokio::spawn(async move {
                if let Err(err) = sms.send(&to, &message, &kind).await {
                    warn!("Admin SMS delivery failed (ignored): {}", err);
                }
            });
        } else {
            debug!("Notification kind {} not SMS-eligible", notification.kind);
        }

        info!("Recorded notification: {}", notification.message);
        notification
    }

    pub fn sms_eligible(&self, kind: NotificationKind) -> bool {
        match kind {
            NotificationKind::CartAdd => self.eligibility.cart_add,
            NotificationKind::OrderPlaced => self.eligibility.order_placed,
            NotificationKind::UserSignup => self.eligibility.user_signup,
            NotificationKind::WishlistAdd => self.eligibility.wishlist_add,
        }
    }

    fn sms_message(&self, notification: &Notification) -> String {
        let user = notification
            .user_email
            .as_deref()
            .unwrap_or("Guest")
            .to_string();
        match notification.kind {
            NotificationKind::CartAdd => format!(
                "🛒 New item added to cart!\nProduct: {}\nUser: {}",
                notification.product_name.as_deref().unwrap_or("unknown"),
                user
            ),
            NotificationKind::OrderPlaced => format!(
                "🎉 NEW ORDER RECEIVED!\nOrder value: ₹{}/-\nCustomer: {}",
                notification.order_value.unwrap_or_default(),
                user
            ),
            NotificationKind::UserSignup => {
                format!("👤 New user registered!\nEmail: {}", user)
            }
            NotificationKind::WishlistAdd => format!(
                "❤️ Item added to wishlist!\nProduct: {}\nUser: {}",
                notification.product_name.as_deref().unwrap_or("unknown"),
                user
            ),
        }
    }

    /// Full log, newest first.
    pub async fn notifications(&self) -> Vec<Notification> {
        self.log.read().await.iter().cloned().collect()
    }

    /// Transient view of notifications still inside the recent window,
    /// newest first. The persistent log is unaffected by expiry here.
    pub async fn recent(&self) -> Vec<Notification> {
        let recent_ids = self.recent.read().await.clone();
        let log = self.log.read().await;
        recent_ids
            .iter()
            .filter_map(|id| log.iter().find(|n| n.id == *id).cloned())
            .collect()
    }

    pub async fn clear(&self) {
        self.log.write().await.clear();
        self.recent.write().await.clear();
    }

    /// Derives dashboard statistics from the current log.
    pub async fn dashboard_stats(&self) -> DashboardStats {
        let log = self.log.read().await;
        let mut stats = DashboardStats::default();
        for notification in log.iter() {
            match notification.kind {
                NotificationKind::OrderPlaced => {
                    stats.total_orders += 1;
                    stats.total_revenue += notification.order_value.unwrap_or_default();
                }
                NotificationKind::UserSignup => stats.total_signups += 1,
                NotificationKind::CartAdd => stats.cart_additions += 1,
                NotificationKind::WishlistAdd => {}
            }
        }
        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::services::sms::{SmsError, SmsReceipt};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSms {
        sent: AtomicUsize,
    }

    #[async_trait]
    impl SmsSender for CountingSms {
        async fn send(&self, _to: &str, _message: &str, _kind: &str) -> Result<SmsReceipt, SmsError> {
            self.sent.fetch_add(1, Ordering::SeqCst);
            Ok(SmsReceipt {
                message_id: "msg_1".to_string(),
            })
        }
    }

    struct FailingSms;

    #[async_trait]
    impl SmsSender for FailingSms {
        async fn send(&self, _to: &str, _message: &str, _kind: &str) -> Result<SmsReceipt, SmsError> {
            Err(SmsError::Delivery("provider down".to_string()))
        }
    }

    fn hub_with(sms: Arc<dyn SmsSender>) -> Arc<NotificationHub> {
        Arc::new(NotificationHub::new(&test_config(), sms))
    }

    fn counting_hub() -> (Arc<NotificationHub>, Arc<CountingSms>) {
        let sms = Arc::new(CountingSms {
            sent: AtomicUsize::new(0),
        });
        let hub = Arc::new(NotificationHub::new(&test_config(), sms.clone()));
        (hub, sms)
    }

    #[tokio::test]
    async fn log_keeps_the_fifty_most_recent_in_reverse_chronological_order() {
        let (hub, _) = counting_hub();

        for i in 0..55u32 {
            hub.record(NotificationInput::new(
                NotificationKind::CartAdd,
                format!("item {} added to cart", i),
            ))
            .await;
        }

        let log = hub.notifications().await;
        assert_eq!(log.len(), 50);
        // Newest first: entry 54 leads, entries 0-4 evicted.
        assert_eq!(log[0].message, "item 54 added to cart");
        assert_eq!(log[49].message, "item 5 added to cart");
        for pair in log.windows(2) {
            assert!(pair[0].timestamp >= pair[1].timestamp);
        }
    }

    #[tokio::test]
    async fn revenue_aggregates_order_values_and_ignores_cart_adds() {
        let (hub, _) = counting_hub();

        for value in [dec!(500), dec!(1200), dec!(300)] {
            hub.record(
                NotificationInput::new(NotificationKind::OrderPlaced, "order placed")
                    .with_user_email("shopper@example.com")
                    .with_order_value(value),
            )
            .await;
        }
        hub.record(NotificationInput::new(
            NotificationKind::CartAdd,
            "tee added to cart",
        ))
        .await;

        let stats = hub.dashboard_stats().await;
        assert_eq!(stats.total_orders, 3);
        assert_eq!(stats.total_revenue, dec!(2000));
        assert_eq!(stats.cart_additions, 1);
        assert_eq!(stats.total_signups, 0);
    }

    #[tokio::test]
    async fn order_without_value_counts_as_zero_revenue() {
        let (hub, _) = counting_hub();

        hub.record(NotificationInput::new(
            NotificationKind::OrderPlaced,
            "order placed",
        ))
        .await;

        let stats = hub.dashboard_stats().await;
        assert_eq!(stats.total_orders, 1);
        assert_eq!(stats.total_revenue, Decimal::ZERO);
    }

    #[tokio::test]
    async fn sms_fans_out_only_for_eligible_kinds() {
        let (hub, sms) = counting_hub();

        hub.record(NotificationInput::new(NotificationKind::CartAdd, "cart"))
            .await;
        hub.record(NotificationInput::new(
            NotificationKind::OrderPlaced,
            "order",
        ))
        .await;
        hub.record(NotificationInput::new(
            NotificationKind::UserSignup,
            "signup",
        ))
        .await;
        hub.record(NotificationInput::new(
            NotificationKind::WishlistAdd,
            "wishlist",
        ))
        .await;

        // Fan-out tasks are fire-and-forget; give them a beat to land.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(sms.sent.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn sms_failure_never_reaches_the_caller() {
        let hub = hub_with(Arc::new(FailingSms));

        let recorded = hub
            .record(NotificationInput::new(
                NotificationKind::OrderPlaced,
                "order placed",
            ))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(hub.notifications().await.len(), 1);
        assert_eq!(recorded.kind, NotificationKind::OrderPlaced);
    }

    #[tokio::test]
    async fn recent_view_expires_without_touching_the_log() {
        let mut config = test_config();
        config.recent_window_secs = 0;
        let hub = Arc::new(NotificationHub::new(
            &config,
            Arc::new(CountingSms {
                sent: AtomicUsize::new(0),
            }) as Arc<dyn SmsSender>,
        ));

        hub.record(NotificationInput::new(NotificationKind::CartAdd, "cart"))
            .await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(hub.recent().await.is_empty());
        assert_eq!(hub.notifications().await.len(), 1);
    }

    #[tokio::test]
    async fn clear_empties_log_and_stats() {
        let (hub, _) = counting_hub();

        hub.record(
            NotificationInput::new(NotificationKind::OrderPlaced, "order")
                .with_order_value(dec!(700)),
        )
        .await;
        hub.clear().await;

        assert!(hub.notifications().await.is_empty());
        assert_eq!(hub.dashboard_stats().await, DashboardStats::default());
    }
}
