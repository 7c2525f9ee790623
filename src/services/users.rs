use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;
use crate::events::{Event, EventSender};

/// Stored user record. The credential check is an exact match against the
/// stored password, per the external auth contract; responses go through
/// `UserProfile`, which never carries the password.
#[derive(Debug, Clone)]
pub struct User {
    pub id: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

/// User shape returned to clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: String,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone: user.phone.clone(),
            created_at: user.created_at,
        }
    }
}

/// Credential storage seam: lookup-by-key, insert, exists. The in-memory
/// adapter serves this deployment and tests; a persistent adapter slots
/// in without touching `AuthService`.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Option<User>;
    async fn insert(&self, user: User) -> Result<(), ServiceError>;
    async fn exists(&self, email: &str) -> bool;
}

/// In-memory user store keyed by lowercased email.
#[derive(Default)]
pub struct InMemoryUserRepository {
    users: DashMap<String, User>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_email(&self, email: &str) -> Option<User> {
        self.users.get(email).map(|user| user.clone())
    }

    async fn insert(&self, user: User) -> Result<(), ServiceError> {
        use dashmap::mapref::entry::Entry;
        match self.users.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(ServiceError::BadRequest(
                "User already exists".to_string(),
            )),
            Entry::Vacant(slot) => {
                slot.insert(user);
                Ok(())
            }
        }
    }

    async fn exists(&self, email: &str) -> bool {
        self.users.contains_key(email)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

pub struct AuthService {
    repo: Arc<dyn UserRepository>,
    events: EventSender,
}

impl AuthService {
    pub fn new(repo: Arc<dyn UserRepository>, events: EventSender) -> Self {
        Self { repo, events }
    }

    /// Seeds a user directly, bypassing signup notifications. Used by the
    /// composition root for demo data; core logic never hardcodes users.
    pub async fn seed_user(&self, user: User) -> Result<(), ServiceError> {
        self.repo.insert(user).await
    }

    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<UserProfile, ServiceError> {
        let email = email.to_lowercase();
        let user = match self.repo.find_by_email(&email).await {
            Some(user) if user.password == password => user,
            _ => {
                warn!("Failed login attempt for {}", email);
                return Err(ServiceError::Unauthorized(
                    "Invalid credentials".to_string(),
                ));
            }
        };

        info!("User logged in: {}", user.email);
        Ok(UserProfile::from(&user))
    }

    #[instrument(skip(self, new_user), fields(email = %new_user.email))]
    pub async fn signup(&self, new_user: NewUser) -> Result<UserProfile, ServiceError> {
        let email = new_user.email.to_lowercase();
        if self.repo.exists(&email).await {
            return Err(ServiceError::BadRequest("User already exists".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            email: email.clone(),
            password: new_user.password,
            first_name: new_user.first_name,
            last_name: new_user.last_name,
            phone: new_user.phone.unwrap_or_default(),
            created_at: Utc::now(),
        };
        self.repo.insert(user.clone()).await?;

        self.events
            .send_or_log(Event::UserSignedUp {
                user_email: email.clone(),
            })
            .await;

        info!("User registered: {}", email);
        Ok(UserProfile::from(&user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::sync::Arc;
    use tokio::sync::mpsc;

    fn service() -> AuthService {
        let (tx, _rx) = mpsc::channel(8);
        AuthService::new(
            Arc::new(InMemoryUserRepository::new()),
            EventSender::new(tx),
        )
    }

    fn new_user() -> NewUser {
        NewUser {
            email: "Shopper@Example.com".to_string(),
            password: "password123".to_string(),
            first_name: "Asha".to_string(),
            last_name: "Rao".to_string(),
            phone: None,
        }
    }

    #[tokio::test]
    async fn signup_then_login_round_trip() {
        let auth = service();
        let profile = auth.signup(new_user()).await.unwrap();
        assert_eq!(profile.email, "shopper@example.com");

        let profile = auth
            .login("shopper@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(profile.first_name, "Asha");
    }

    #[tokio::test]
    async fn email_lookup_is_case_insensitive() {
        let auth = service();
        auth.signup(new_user()).await.unwrap();

        assert!(auth
            .login("SHOPPER@example.COM", "password123")
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn wrong_password_is_unauthorized() {
        let auth = service();
        auth.signup(new_user()).await.unwrap();

        assert_matches!(
            auth.login("shopper@example.com", "nope").await,
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[tokio::test]
    async fn unknown_user_is_unauthorized() {
        let auth = service();
        assert_matches!(
            auth.login("ghost@example.com", "password123").await,
            Err(ServiceError::Unauthorized(_))
        );
    }

    #[tokio::test]
    async fn duplicate_signup_is_rejected() {
        let auth = service();
        auth.signup(new_user()).await.unwrap();

        assert_matches!(
            auth.signup(new_user()).await,
            Err(ServiceError::BadRequest(_))
        );
    }

    #[tokio::test]
    async fn profile_serialization_has_no_password_field() {
        let auth = service();
        let profile = auth.signup(new_user()).await.unwrap();

        let value = serde_json::to_value(&profile).unwrap();
        assert!(value.get("password").is_none());
        assert_eq!(value["email"], "shopper@example.com");
    }
}
