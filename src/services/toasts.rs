use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::config::AppConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ToastKind {
    Success,
    Error,
    Info,
}

/// Transient on-screen confirmation message. Purely presentational and
/// unrelated to the persisted notification log.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Toast {
    pub id: Uuid,
    pub kind: ToastKind,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// Capped, self-expiring toast list: at most `capacity` visible at once
/// (newest first, oldest pushed out), each removed after `ttl`.
pub struct ToastStore {
    toasts: Arc<RwLock<Vec<Toast>>>,
    capacity: usize,
    ttl: Duration,
}

impl ToastStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            toasts: Arc::new(RwLock::new(Vec::new())),
            capacity: config.toast_capacity,
            ttl: Duration::from_secs(config.toast_ttl_secs),
        }
    }

    pub async fn push(&self, kind: ToastKind, message: impl Into<String>) -> Toast {
        let toast = Toast {
            id: Uuid::new_v4(),
            kind,
            message: message.into(),
            created_at: Utc::now(),
        };

        {
            let mut toasts = self.toasts.write().await;
            toasts.insert(0, toast.clone());
            toasts.truncate(self.capacity);
        }

        let toasts = Arc::clone(&self.toasts);
        let ttl = self.ttl;
        let expired = toast.id;
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            toasts.write().await.retain(|toast| toast.id != expired);
        });

        toast
    }

    pub async fn dismiss(&self, id: Uuid) {
        self.toasts.write().await.retain(|toast| toast.id != id);
    }

    /// Currently visible toasts, newest first.
    pub async fn active(&self) -> Vec<Toast> {
        self.toasts.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;

    #[tokio::test]
    async fn at_most_five_toasts_are_visible() {
        let store = Arc::new(ToastStore::new(&test_config()));

        for i in 0..6 {
            store.push(ToastKind::Success, format!("toast {}", i)).await;
        }

        let active = store.active().await;
        assert_eq!(active.len(), 5);
        // Newest first; toast 0 was pushed out.
        assert_eq!(active[0].message, "toast 5");
        assert_eq!(active[4].message, "toast 1");
    }

    #[tokio::test]
    async fn toasts_expire_on_their_own() {
        let mut config = test_config();
        config.toast_ttl_secs = 0;
        let store = Arc::new(ToastStore::new(&config));

        store.push(ToastKind::Info, "ephemeral").await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert!(store.active().await.is_empty());
    }

    #[tokio::test]
    async fn dismiss_removes_a_single_toast() {
        let store = Arc::new(ToastStore::new(&test_config()));
        let keep = store.push(ToastKind::Success, "keep").await;
        let drop = store.push(ToastKind::Error, "drop").await;

        store.dismiss(drop.id).await;

        let active = store.active().await;
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, keep.id);
    }
}
