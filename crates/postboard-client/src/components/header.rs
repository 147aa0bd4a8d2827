use std::sync::{Arc, Mutex};
use tokio::{sync::watch, task::JoinHandle};

use super::{lock, unsubscribe_all};
use crate::auth::AuthService;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HeaderState {
    pub user_is_authenticated: bool,
    pub user_email: String,
}

/// Navigation header: shows login state and the signed-in email.
pub struct HeaderComponent {
    auth: AuthService,
    state: Arc<Mutex<HeaderState>>,
    subscriptions: Vec<JoinHandle<()>>,
}

impl HeaderComponent {
    /// Seed from the current values and subscribe to both auth streams.
    /// Must be called inside a tokio runtime.
    pub fn init(auth: AuthService) -> Self {
        let state = Arc::new(Mutex::new(HeaderState::default()));

        let status = auth.auth_status_listener();
        let email = auth.user_email_listener();
        let subscriptions = vec![
            follow(status, state.clone(), |s, v| s.user_is_authenticated = v),
            follow(email, state.clone(), |s, v| s.user_email = v),
        ];

        Self { auth, state, subscriptions }
    }

    pub fn state(&self) -> HeaderState {
        lock(&self.state).clone()
    }

    pub fn user_is_authenticated(&self) -> bool {
        lock(&self.state).user_is_authenticated
    }

    pub fn user_email(&self) -> String {
        lock(&self.state).user_email.clone()
    }

    pub fn on_logout(&self) {
        self.auth.logout();
    }

    pub fn is_destroyed(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Drop both subscriptions. State stays readable but no longer changes.
    pub async fn destroy(&mut self) {
        unsubscribe_all(&mut self.subscriptions).await;
        tracing::trace!("Header destroyed");
    }
}

impl Drop for HeaderComponent {
    fn drop(&mut self) {
        for handle in &self.subscriptions {
            handle.abort();
        }
    }
}

fn follow<T, F>(
    mut rx: watch::Receiver<T>,
    state: Arc<Mutex<HeaderState>>,
    apply: F,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
    F: Fn(&mut HeaderState, T) + Send + 'static,
{
    let current = rx.borrow_and_update().clone();
    apply(&mut *lock(&state), current);
    tokio::spawn(async move {
        while rx.changed().await.is_ok() {
            let value = rx.borrow_and_update().clone();
            apply(&mut *lock(&state), value);
        }
    })
}
