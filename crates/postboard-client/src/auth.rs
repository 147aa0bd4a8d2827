//! Auth service: signup, login, logout, session restore, and the two push
//! streams (auth status, user email) components subscribe to.

use chrono::{Duration as ChronoDuration, Utc};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::{sync::watch, task::JoinHandle};

use crate::{
    error::{ClientError, Result},
    rest::RestClient,
    routing::Navigator,
    types::{Credentials, LoginResponse, SavedAuth},
};

/// The two auth push streams. Created before the router so the route guard
/// and the service observe the same status.
#[derive(Clone)]
pub struct AuthSession {
    status: Arc<watch::Sender<bool>>,
    email: Arc<watch::Sender<String>>,
}

impl AuthSession {
    pub fn new() -> Self {
        let (status, _) = watch::channel(false);
        let (email, _) = watch::channel(String::new());
        Self {
            status: Arc::new(status),
            email: Arc::new(email),
        }
    }

    pub fn auth_status_listener(&self) -> watch::Receiver<bool> {
        self.status.subscribe()
    }

    pub fn user_email_listener(&self) -> watch::Receiver<String> {
        self.email.subscribe()
    }
}

impl Default for AuthSession {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone)]
pub struct AuthService {
    inner: Arc<Inner>,
}

struct Inner {
    rest: RestClient,
    session: AuthSession,
    navigator: Arc<dyn Navigator>,
    current: Mutex<Option<SavedAuth>>,
    timer: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        if let Some(handle) = lock(&self.timer).take() {
            handle.abort();
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AuthService {
    pub fn new(rest: RestClient, session: AuthSession, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            inner: Arc::new(Inner {
                rest,
                session,
                navigator,
                current: Mutex::new(None),
                timer: Mutex::new(None),
            }),
        }
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn is_auth(&self) -> bool {
        *self.inner.session.status.borrow()
    }

    pub fn user_email(&self) -> String {
        self.inner.session.email.borrow().clone()
    }

    pub fn user_id(&self) -> Option<String> {
        lock(&self.inner.current).as_ref().map(|s| s.user_id.clone())
    }

    pub fn token(&self) -> Option<String> {
        lock(&self.inner.current).as_ref().map(|s| s.token.clone())
    }

    /// Current session, for persisting and later feeding to `auto_auth_user`.
    pub fn saved_auth(&self) -> Option<SavedAuth> {
        lock(&self.inner.current).clone()
    }

    pub fn auth_status_listener(&self) -> watch::Receiver<bool> {
        self.inner.session.auth_status_listener()
    }

    pub fn user_email_listener(&self) -> watch::Receiver<String> {
        self.inner.session.user_email_listener()
    }

    // ── Commands ──────────────────────────────────────────────────────────────

    /// `POST /user/signup`, then back to the post list.
    pub async fn create_user(&self, email: &str, password: &str) -> Result<()> {
        let body = Credentials { email, password };
        match self.inner.rest.post_json::<Value, _>("/user/signup", &body).await {
            Ok(_) => {
                tracing::info!(email, "Account created");
                self.inner.navigator.navigate_by_url("/");
                Ok(())
            }
            Err(e) => {
                self.inner.session.status.send_replace(false);
                Err(e)
            }
        }
    }

    /// `POST /user/login`; on success the session is applied, the expiry
    /// timer armed, and the user sent to the post list.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let body = Credentials { email, password };
        let resp: LoginResponse = match self.inner.rest.post_json("/user/login", &body).await {
            Ok(resp) => resp,
            Err(e) => {
                self.inner.session.status.send_replace(false);
                return Err(e);
            }
        };
        if resp.token.is_empty() {
            self.inner.session.status.send_replace(false);
            return Err(ClientError::MissingToken);
        }

        let ttl = Duration::from_secs(resp.expires_in);
        let expires_at = Utc::now()
            + ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::seconds(0));
        self.apply(
            SavedAuth {
                token: resp.token,
                expires_at,
                user_id: resp.user_id,
                email: email.to_owned(),
            },
            ttl,
        );
        tracing::info!(email, expires_in = resp.expires_in, "Logged in");
        self.inner.navigator.navigate_by_url("/");
        Ok(())
    }

    /// Restore a saved session. Returns `false` when it has already expired.
    pub fn auto_auth_user(&self, saved: SavedAuth) -> bool {
        let remaining = match (saved.expires_at - Utc::now()).to_std() {
            Ok(d) if !d.is_zero() => d,
            _ => {
                tracing::debug!("Saved session expired");
                return false;
            }
        };
        self.apply(saved, remaining);
        true
    }

    pub fn logout(&self) {
        self.clear();
        self.inner.navigator.navigate_by_url("/");
    }

    // ── Internal ──────────────────────────────────────────────────────────────

    fn apply(&self, saved: SavedAuth, ttl: Duration) {
        self.inner.rest.set_token(Some(saved.token.clone()));
        let email = saved.email.clone();
        *lock(&self.inner.current) = Some(saved);
        self.set_timer(ttl);
        self.inner.session.status.send_replace(true);
        self.inner.session.email.send_replace(email);
    }

    fn clear(&self) {
        self.inner.rest.set_token(None);
        *lock(&self.inner.current) = None;
        if let Some(handle) = lock(&self.inner.timer).take() {
            handle.abort();
        }
        self.inner.session.status.send_replace(false);
        self.inner.session.email.send_replace(String::new());
    }

    fn set_timer(&self, ttl: Duration) {
        let weak: Weak<Inner> = Arc::downgrade(&self.inner);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = weak.upgrade() {
                tracing::info!("Session expired, logging out");
                // Detached: logout must not abort this task.
                lock(&inner.timer).take();
                AuthService { inner }.logout();
            }
        });
        if let Some(previous) = lock(&self.inner.timer).replace(handle) {
            previous.abort();
        }
    }
}
