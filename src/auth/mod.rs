//! Auth session and auth service.
//!
//! The session is an explicitly constructed context object: create it at app
//! start, share it via `Arc`, tear it down at logout. Nothing outside this
//! module and the HTTP client reads the raw token.

use std::path::PathBuf;
use std::sync::RwLock;

use tokio::sync::watch;

use crate::errors::ApiError;
use crate::http::HttpClient;
use crate::models::{
    AuthResponse, AuthTokens, Credentials, MessageResponse, PasswordResetRequest, RefreshRequest,
    RegisterRequest, ResetPassword, UserProfile,
};

/// Process-wide auth state: the token pair and the identity derived from it.
///
/// Lifecycle: created on login/registration, replaced on refresh, destroyed on
/// logout or irrecoverable auth failure. When the token pair is cleared by a
/// 401 or a failed refresh, the `unauthorized` watch channel flips to `true`
/// so the embedding UI can navigate to its login route.
pub struct AuthSession {
    tokens: RwLock<Option<AuthTokens>>,
    user: RwLock<Option<UserProfile>>,
    token_path: Option<PathBuf>,
    unauthorized_tx: watch::Sender<bool>,
}

impl AuthSession {
    /// Create a session, loading a previously persisted token pair if a token
    /// file is configured and present.
    pub fn new(token_path: Option<PathBuf>) -> Self {
        let tokens = token_path.as_ref().and_then(|path| {
            let raw = std::fs::read_to_string(path).ok()?;
            match serde_json::from_str::<AuthTokens>(&raw) {
                Ok(tokens) => Some(tokens),
                Err(e) => {
                    tracing::warn!("Ignoring unreadable token file {:?}: {}", path, e);
                    None
                }
            }
        });

        let (unauthorized_tx, _) = watch::channel(false);

        Self {
            tokens: RwLock::new(tokens),
            user: RwLock::new(None),
            token_path,
            unauthorized_tx,
        }
    }

    /// The only accessor for the raw access token.
    pub fn access_token(&self) -> Option<String> {
        self.tokens
            .read()
            .expect("auth session lock poisoned")
            .as_ref()
            .map(|t| t.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        self.tokens
            .read()
            .expect("auth session lock poisoned")
            .as_ref()
            .map(|t| t.refresh_token.clone())
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.user.read().expect("auth session lock poisoned").clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.tokens
            .read()
            .expect("auth session lock poisoned")
            .is_some()
    }

    /// Store a fresh token pair (and identity, when the server sent one),
    /// persisting the pair if a token file is configured.
    pub fn store(&self, tokens: AuthTokens, user: Option<UserProfile>) -> Result<(), ApiError> {
        if let Some(path) = &self.token_path {
            let raw = serde_json::to_string_pretty(&tokens)?;
            std::fs::write(path, raw)?;
        }
        *self.tokens.write().expect("auth session lock poisoned") = Some(tokens);
        if let Some(user) = user {
            *self.user.write().expect("auth session lock poisoned") = Some(user);
        }
        // A successful (re)authentication resets the unauthorized signal.
        self.unauthorized_tx.send_replace(false);
        Ok(())
    }

    /// Drop all auth state and remove the persisted token file.
    pub fn clear(&self) {
        *self.tokens.write().expect("auth session lock poisoned") = None;
        *self.user.write().expect("auth session lock poisoned") = None;
        if let Some(path) = &self.token_path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!("Failed to remove token file {:?}: {}", path, e);
                }
            }
        }
    }

    /// Forced de-authentication: clear state and signal subscribers.
    ///
    /// Called by the HTTP client on a 401 response and by a failed refresh.
    pub fn invalidate(&self) {
        self.clear();
        self.unauthorized_tx.send_replace(true);
    }

    /// Subscribe to forced de-authentication events.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.unauthorized_tx.subscribe()
    }
}

/// Auth operations against the `/auth/*` endpoints.
#[derive(Clone)]
pub struct AuthService {
    http: HttpClient,
}

impl AuthService {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// POST /auth/login - Authenticate and start a session.
    pub async fn login(&self, credentials: &Credentials) -> Result<UserProfile, ApiError> {
        let resp: AuthResponse = self.http.post("/auth/login", credentials).await?;
        self.http
            .session()
            .store(resp.tokens, Some(resp.user.clone()))?;
        tracing::info!("Logged in as {}", resp.user.email);
        Ok(resp.user)
    }

    /// POST /auth/register - Create an account and start a session.
    pub async fn register(&self, request: &RegisterRequest) -> Result<UserProfile, ApiError> {
        let resp: AuthResponse = self.http.post("/auth/register", request).await?;
        self.http
            .session()
            .store(resp.tokens, Some(resp.user.clone()))?;
        Ok(resp.user)
    }

    /// POST /auth/refresh-token - Exchange the refresh token for a new pair.
    ///
    /// Refresh is always explicit; the HTTP client never performs it silently.
    /// A failed refresh is irrecoverable and destroys the session.
    pub async fn refresh(&self) -> Result<(), ApiError> {
        let session = self.http.session();
        let refresh_token = session.refresh_token().ok_or_else(|| {
            ApiError::Unauthorized("No refresh token available".to_string())
        })?;

        let request = RefreshRequest { refresh_token };
        match self
            .http
            .post::<_, AuthTokens>("/auth/refresh-token", &request)
            .await
        {
            Ok(tokens) => {
                session.store(tokens, None)?;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("Token refresh failed, tearing down session: {}", e);
                session.invalidate();
                Err(e)
            }
        }
    }

    /// POST /auth/logout - End the session.
    ///
    /// The local session is cleared even when the server call fails.
    pub async fn logout(&self) -> Result<(), ApiError> {
        let result = self
            .http
            .post::<_, MessageResponse>("/auth/logout", &serde_json::json!({}))
            .await;
        self.http.session().clear();
        match result {
            Ok(_) => Ok(()),
            // The session is gone either way; a 401 here just means it already was.
            Err(ApiError::Unauthorized(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// POST /auth/request-password-reset - Ask for a reset email.
    pub async fn request_password_reset(&self, email: &str) -> Result<String, ApiError> {
        let request = PasswordResetRequest {
            email: email.to_string(),
        };
        let resp: MessageResponse = self
            .http
            .post("/auth/request-password-reset", &request)
            .await?;
        Ok(resp.message)
    }

    /// POST /auth/reset-password - Complete a password reset.
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), ApiError> {
        let request = ResetPassword {
            token: token.to_string(),
            new_password: new_password.to_string(),
        };
        self.http
            .post::<_, MessageResponse>("/auth/reset-password", &request)
            .await?;
        Ok(())
    }
}
