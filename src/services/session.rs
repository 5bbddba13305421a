//! Session service
//!
//! This module owns the authentication state of the running client:
//! - Loading and validating a persisted token on startup
//! - Signing in with email and password
//! - Installing and removing the bearer token on the API client
//! - Clearing the request cache on logout
//!
//! There is exactly one [`SessionContext`] per client; views read its state
//! through [`SessionContext::state`] and the route guard.

use async_trait::async_trait;
use chrono::Utc;
use data_encoding::BASE64URL_NOPAD;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::cache::QueryCache;
use crate::models::User;

use super::mutation::Mutation;
use super::notify::Notifier;
use super::validation::{rule, Constraint, Rule, Validate};
use super::ServiceError;

/// Token persistence failures
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access token file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Token file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable storage for the session token
#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn load(&self) -> Result<Option<String>, StoreError>;
    async fn save(&self, token: &str) -> Result<(), StoreError>;
    async fn clear(&self) -> Result<(), StoreError>;
}

#[derive(Debug, Serialize, Deserialize)]
struct StoredToken {
    token: String,
    saved_at: chrono::DateTime<Utc>,
}

/// Token kept as JSON in the data directory
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(None);
        }

        let stored: StoredToken = serde_json::from_str(&content).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        Ok(Some(stored.token))
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| self.io_error(e))?;
        }

        let stored = StoredToken {
            token: token.to_string(),
            saved_at: Utc::now(),
        };
        let json = serde_json::to_string_pretty(&stored).map_err(|source| StoreError::Corrupt {
            path: self.path.clone(),
            source,
        })?;

        tokio::fs::write(&self.path, json).await.map_err(|e| self.io_error(e))
    }

    async fn clear(&self) -> Result<(), StoreError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

/// Token kept only for the lifetime of the process
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Mutex::new(Some(token.into())),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.token.lock().ok().and_then(|t| t.clone()))
    }

    async fn save(&self, token: &str) -> Result<(), StoreError> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = Some(token.to_string());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), StoreError> {
        if let Ok(mut guard) = self.token.lock() {
            *guard = None;
        }
        Ok(())
    }
}

/// Claims the client reads from a JWT payload. Every field is optional;
/// the signature is never checked here, the server does that.
#[derive(Debug, Default, Deserialize)]
pub struct TokenClaims {
    #[serde(default)]
    pub exp: Option<i64>,
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub roles: Vec<String>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT; `None` for opaque tokens
    pub fn decode(token: &str) -> Option<Self> {
        let mut parts = token.split('.');
        let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let bytes = BASE64URL_NOPAD.decode(payload.trim_end_matches('=').as_bytes()).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    pub fn is_expired(&self) -> bool {
        self.exp.is_some_and(|exp| exp <= Utc::now().timestamp())
    }

    /// Session owner as far as the token tells
    pub fn user(&self) -> Option<User> {
        Some(User {
            id: self.id?,
            name: self.name.clone().unwrap_or_default(),
            email: self.email.clone()?,
            mobile: String::new(),
            image: String::new(),
            domain: String::new(),
            bio: String::new(),
            role: String::new(),
            roles: self.roles.clone(),
            created_at: None,
            updated_at: None,
        })
    }
}

/// Snapshot of the authentication state
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
    pub is_authenticated: bool,
    pub is_loading: bool,
}

impl SessionState {
    fn loading() -> Self {
        Self {
            token: None,
            user: None,
            is_authenticated: false,
            is_loading: true,
        }
    }

    fn signed_out() -> Self {
        Self {
            is_loading: false,
            ..Self::loading()
        }
    }
}

/// Login form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl Validate for LoginForm {
    fn rules() -> &'static [Rule] {
        const RULES: &[Rule] = &[
            rule("email", Constraint::Email, "Invalid email address"),
            rule("password", Constraint::MinLen(6), "Password must be at least 6 characters"),
        ];
        RULES
    }

    fn value(&self, field: &str) -> String {
        match field {
            "email" => self.email.clone(),
            "password" => self.password.clone(),
            _ => String::new(),
        }
    }
}

/// Authentication context shared by every view
pub struct SessionContext {
    api: Arc<ApiClient>,
    cache: Arc<QueryCache>,
    store: Arc<dyn TokenStore>,
    notifier: Arc<Notifier>,
    state: RwLock<SessionState>,
    sign_in: Mutation,
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext").finish_non_exhaustive()
    }
}

impl SessionContext {
    /// Create a context that is still loading; call [`init`](Self::init) next
    pub fn new(
        api: Arc<ApiClient>,
        cache: Arc<QueryCache>,
        store: Arc<dyn TokenStore>,
        notifier: Arc<Notifier>,
    ) -> Self {
        Self {
            api,
            cache,
            store,
            notifier,
            state: RwLock::new(SessionState::loading()),
            sign_in: Mutation::new(),
        }
    }

    /// Restore a persisted session, discarding an expired token
    pub async fn init(&self) -> Result<(), ServiceError> {
        let loaded = self.store.load().await;

        let token = match loaded {
            Ok(token) => token,
            Err(e) => {
                // A corrupt file must not lock the creator out
                warn!("Ignoring unreadable session: {}", e);
                self.store.clear().await?;
                None
            }
        };

        let mut next = SessionState::signed_out();

        if let Some(token) = token {
            let claims = TokenClaims::decode(&token);
            if claims.as_ref().is_some_and(TokenClaims::is_expired) {
                info!("Stored session expired, signing out");
                self.store.clear().await?;
            } else {
                self.api.set_token(&token);
                next.user = claims.and_then(|c| c.user());
                next.token = Some(token);
                next.is_authenticated = true;
                debug!("Session restored");
            }
        }

        *self.state.write().await = next;
        Ok(())
    }

    /// Persist a token received from login or registration
    pub async fn login(&self, token: &str) -> Result<(), ServiceError> {
        self.store.save(token).await?;
        self.api.set_token(token);

        let user = TokenClaims::decode(token).and_then(|c| c.user());
        let mut state = self.state.write().await;
        *state = SessionState {
            token: Some(token.to_string()),
            user,
            is_authenticated: true,
            is_loading: false,
        };

        info!("Signed in");
        Ok(())
    }

    /// End the session. The in-memory session is always reset; a failure to
    /// remove the stored token is reported afterwards.
    pub async fn logout(&self) -> Result<(), ServiceError> {
        self.api.clear_token();
        *self.state.write().await = SessionState::signed_out();
        let cleared = self.cache.clear().await;
        let removed = self.store.clear().await;

        info!("Signed out");
        if let Err(e) = &removed {
            warn!("Failed to remove stored token: {}", e);
        }
        cleared?;
        removed?;
        Ok(())
    }

    /// Validate the login form, authenticate, and start the session
    pub async fn sign_in(&self, form: &LoginForm) -> Result<(), ServiceError> {
        form.validate().map_err(|e| self.notifier.fail(e))?;
        let _pending = self.sign_in.begin()?;

        let response = self
            .api
            .login(&form.email, &form.password)
            .await
            .map_err(|e| self.notifier.fail(e))?;

        self.login(&response.token).await?;
        self.notifier.success(response.message);
        Ok(())
    }

    pub async fn state(&self) -> SessionState {
        self.state.read().await.clone()
    }

    /// Sign out after the server rejected the bearer token of an active
    /// session. Returns whether the session was ended.
    pub async fn expire_if_rejected(&self, err: &ServiceError) -> Result<bool, ServiceError> {
        if !err.is_unauthorized() || !self.is_authenticated().await {
            return Ok(false);
        }

        warn!("Server rejected the session token");
        self.logout().await?;
        self.notifier.info("Your session has expired. Please log in again.");
        Ok(true)
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.is_authenticated
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{create_cache, QueryKey};
    use crate::config::{ApiConfig, CacheConfig};
    use crate::services::routes::{guard, Route, RouteDecision};
    use tempfile::TempDir;

    fn jwt(payload: serde_json::Value) -> String {
        let header = BASE64URL_NOPAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = BASE64URL_NOPAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.signature", header, body)
    }

    fn context(store: Arc<dyn TokenStore>) -> (SessionContext, Arc<ApiClient>, Arc<QueryCache>) {
        let api = Arc::new(ApiClient::new(&ApiConfig::default()).unwrap());
        let cache = create_cache(&CacheConfig::default());
        let ctx = SessionContext::new(api.clone(), cache.clone(), store, Arc::new(Notifier::new()));
        (ctx, api, cache)
    }

    #[test]
    fn test_decode_claims() {
        let exp = Utc::now().timestamp() + 3600;
        let token = jwt(serde_json::json!({"id": 3, "email": "jone@example.com", "name": "Jone Dow", "exp": exp}));

        let claims = TokenClaims::decode(&token).unwrap();
        assert!(!claims.is_expired());

        let user = claims.user().unwrap();
        assert_eq!(user.id, 3);
        assert_eq!(user.name, "Jone Dow");
    }

    #[test]
    fn test_decode_opaque_token() {
        assert!(TokenClaims::decode("opaque-session-token").is_none());
        assert!(TokenClaims::decode("a.%%%.c").is_none());
    }

    #[tokio::test]
    async fn test_new_context_is_loading() {
        let (ctx, _, _) = context(Arc::new(MemoryTokenStore::new()));
        assert!(ctx.state().await.is_loading);
    }

    #[tokio::test]
    async fn test_init_without_token() {
        let (ctx, api, _) = context(Arc::new(MemoryTokenStore::new()));
        ctx.init().await.unwrap();

        let state = ctx.state().await;
        assert!(!state.is_loading);
        assert!(!state.is_authenticated);
        assert!(api.token().is_none());
    }

    #[tokio::test]
    async fn test_init_restores_valid_token() {
        let token = jwt(serde_json::json!({"exp": Utc::now().timestamp() + 3600}));
        let (ctx, api, _) = context(Arc::new(MemoryTokenStore::with_token(token.clone())));

        ctx.init().await.unwrap();

        assert!(ctx.is_authenticated().await);
        assert_eq!(api.token(), Some(token));
    }

    #[tokio::test]
    async fn test_init_discards_expired_token() {
        let token = jwt(serde_json::json!({"exp": Utc::now().timestamp() - 10}));
        let store = Arc::new(MemoryTokenStore::with_token(token));
        let (ctx, api, _) = context(store.clone());

        ctx.init().await.unwrap();

        assert!(!ctx.is_authenticated().await);
        assert!(!ctx.state().await.is_loading);
        assert!(api.token().is_none());
        assert_eq!(store.load().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_logout_clears_everything() {
        let store = Arc::new(MemoryTokenStore::new());
        let (ctx, api, cache) = context(store.clone());
        ctx.init().await.unwrap();
        ctx.login("opaque-token").await.unwrap();
        cache.set(&QueryKey::Courses, &vec![1, 2]).await.unwrap();

        ctx.logout().await.unwrap();

        assert!(!ctx.is_authenticated().await);
        assert!(api.token().is_none());
        assert_eq!(store.load().await.unwrap(), None);
        assert!(cache.get::<Vec<i32>>(&QueryKey::Courses).await.unwrap().is_none());
    }

    struct ReadOnlyStore;

    #[async_trait]
    impl TokenStore for ReadOnlyStore {
        async fn load(&self) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        async fn save(&self, _token: &str) -> Result<(), StoreError> {
            Ok(())
        }

        async fn clear(&self) -> Result<(), StoreError> {
            Err(StoreError::Io {
                path: PathBuf::from("session.json"),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            })
        }
    }

    #[tokio::test]
    async fn test_logout_signs_out_when_token_file_cannot_be_removed() {
        let (ctx, api, cache) = context(Arc::new(ReadOnlyStore));
        ctx.init().await.unwrap();
        ctx.login("opaque").await.unwrap();
        cache.set(&QueryKey::Courses, &vec![1]).await.unwrap();

        assert!(matches!(ctx.logout().await, Err(ServiceError::Store(_))));

        assert!(api.token().is_none());
        assert!(cache.get::<Vec<i32>>(&QueryKey::Courses).await.unwrap().is_none());
        let state = ctx.state().await;
        assert_eq!(guard(&state, &Route::Courses), RouteDecision::Redirect(Route::Login));
    }

    #[tokio::test]
    async fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("session.json"));

        assert_eq!(store.load().await.unwrap(), None);

        store.save("abc.def.ghi").await.unwrap();
        assert_eq!(store.load().await.unwrap(), Some("abc.def.ghi".to_string()));

        store.clear().await.unwrap();
        assert_eq!(store.load().await.unwrap(), None);
        store.clear().await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupt_file_signs_out() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let (ctx, _, _) = context(Arc::new(FileTokenStore::new(&path)));
        ctx.init().await.unwrap();

        assert!(!ctx.is_authenticated().await);
        assert!(!path.exists());
    }

    #[test]
    fn test_login_form_rules() {
        let form = LoginForm {
            email: "jone".into(),
            password: "123".into(),
        };
        let err = form.validate().unwrap_err();
        assert!(err.has_field("email"));
        assert!(err.has_field("password"));
    }
}
