use std::sync::Arc;

use chrono::Utc;
use rand::Rng;
use tracing::{debug, info, warn};

use shared_database::DocumentStore;
use shared_models::auth::{LoginRequest, Session};
use shared_models::error::AppError;

const MAX_TOKEN_ATTEMPTS: usize = 5;

type TokenSource = Arc<dyn Fn() -> String + Send + Sync>;

/// Issues session tokens and resolves them back to sessions.
pub struct SessionRegistry {
    store: Arc<dyn DocumentStore>,
    token_source: TokenSource,
}

impl SessionRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_token_source(store, generate_token)
    }

    pub fn with_token_source<F>(store: Arc<dyn DocumentStore>, token_source: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            store,
            token_source: Arc::new(token_source),
        }
    }

    /// Issue a session for `email`. Each call yields a fresh token, so one
    /// email can hold several live sessions.
    pub async fn login(&self, request: &LoginRequest) -> Result<Session, AppError> {
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());
        let has_password = request
            .password
            .as_deref()
            .is_some_and(|password| !password.trim().is_empty());

        let email = match email {
            Some(email) if has_password => email,
            _ => {
                warn!("Login rejected: email or password missing");
                return Err(AppError::InvalidCredentials);
            }
        };

        for attempt in 1..=MAX_TOKEN_ATTEMPTS {
            let token = (self.token_source)();

            let existing: Option<Session> = self
                .store
                .get(&token)
                .await?
                .and_then(|document| serde_json::from_value(document).ok());

            let session = match existing {
                Some(previous) if previous.email != email => {
                    debug!("Token collision on attempt {}, drawing again", attempt);
                    continue;
                }
                Some(previous) => Session::new(email, previous.token),
                None => Session::new(email, token.clone()),
            };

            let document = serde_json::to_value(&session)
                .map_err(|e| AppError::Internal(format!("Failed to encode session: {}", e)))?;
            self.store.set(&token, "$", &document).await?;

            info!("Issued {} session for {}", session.role, session.email);
            return Ok(session);
        }

        Err(AppError::StoreUnavailable(
            "Could not allocate a session token".to_string(),
        ))
    }

    /// Session for `token`, restricted to the `user` role.
    pub async fn validate(&self, token: &str) -> Result<Session, AppError> {
        let session = self.resolve(token).await?;

        if !session.is_user() {
            warn!("Session for {} rejected: role {}", session.email, session.role);
            return Err(AppError::Unauthorized);
        }

        Ok(session)
    }

    /// Session for `token` regardless of role.
    pub async fn resolve(&self, token: &str) -> Result<Session, AppError> {
        if token.is_empty() {
            return Err(AppError::Unauthorized);
        }

        let document = self
            .store
            .get(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        serde_json::from_value(document).map_err(|e| {
            debug!("Stored session is unreadable: {}", e);
            AppError::Unauthorized
        })
    }
}

/// Opaque numeric token: a uniform draw scaled by the current epoch millis.
pub fn generate_token() -> String {
    let now_ms = Utc::now().timestamp_millis().max(1) as f64;
    let draw: f64 = rand::thread_rng().gen();
    ((draw * now_ms).ceil() as u64).max(1).to_string()
}
