use std::sync::{Arc, Mutex};
use tokio::{sync::broadcast, task::JoinHandle};

use super::{lock, unsubscribe_all};
use crate::{
    auth::AuthService,
    error::Result,
    posts::PostsService,
    types::Post,
};

pub const PAGE_SIZE_OPTIONS: [u32; 4] = [1, 2, 5, 10];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostListState {
    pub posts: Vec<Post>,
    pub total_posts: u64,
    pub posts_per_page: u32,
    /// 1-based.
    pub current_page: u32,
    pub is_loading: bool,
    pub user_is_authenticated: bool,
    pub user_id: Option<String>,
}

impl Default for PostListState {
    fn default() -> Self {
        Self {
            posts: Vec::new(),
            total_posts: 0,
            posts_per_page: 2,
            current_page: 1,
            is_loading: false,
            user_is_authenticated: false,
            user_id: None,
        }
    }
}

impl PostListState {
    /// Whether the signed-in user may edit or delete `post`.
    pub fn can_edit(&self, post: &Post) -> bool {
        self.user_is_authenticated && self.user_id.as_deref() == Some(post.creator.as_str())
    }
}

/// Paginated post list.
pub struct PostListComponent {
    posts_service: PostsService,
    state: Arc<Mutex<PostListState>>,
    subscriptions: Vec<JoinHandle<()>>,
}

impl PostListComponent {
    /// Subscribe to list snapshots and auth status, then fetch the first page.
    pub async fn init(posts_service: PostsService, auth: AuthService) -> Result<Self> {
        let state = Arc::new(Mutex::new(PostListState {
            is_loading: true,
            user_is_authenticated: auth.is_auth(),
            user_id: auth.user_id(),
            ..PostListState::default()
        }));

        let mut updates = posts_service.posts_update_listener();
        let list_state = state.clone();
        let on_posts = tokio::spawn(async move {
            loop {
                match updates.recv().await {
                    Ok(update) => {
                        let mut s = lock(&list_state);
                        s.is_loading = false;
                        s.total_posts = update.post_count;
                        s.posts = update.posts;
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::debug!(skipped = n, "Post list lagged behind updates");
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        });

        let mut status = auth.auth_status_listener();
        let auth_state = state.clone();
        let on_auth = tokio::spawn(async move {
            while status.changed().await.is_ok() {
                let is_auth = *status.borrow_and_update();
                let mut s = lock(&auth_state);
                s.user_is_authenticated = is_auth;
                s.user_id = auth.user_id();
            }
        });

        let component = Self {
            posts_service,
            state,
            subscriptions: vec![on_posts, on_auth],
        };
        component.fetch().await?;
        Ok(component)
    }

    pub fn state(&self) -> PostListState {
        lock(&self.state).clone()
    }

    /// Paginator callback; `page_index` is 0-based.
    pub async fn on_change_page(&self, page_index: u32, page_size: u32) -> Result<()> {
        {
            let mut s = lock(&self.state);
            s.current_page = page_index + 1;
            s.posts_per_page = page_size;
        }
        self.fetch().await
    }

    /// Delete, then reload the current page.
    pub async fn on_delete(&self, post_id: &str) -> Result<()> {
        lock(&self.state).is_loading = true;
        if let Err(e) = self.posts_service.delete_post(post_id).await {
            lock(&self.state).is_loading = false;
            return Err(e);
        }
        self.fetch().await
    }

    pub fn is_destroyed(&self) -> bool {
        self.subscriptions.is_empty()
    }

    pub async fn destroy(&mut self) {
        unsubscribe_all(&mut self.subscriptions).await;
    }

    async fn fetch(&self) -> Result<()> {
        let (per_page, page) = {
            let mut s = lock(&self.state);
            s.is_loading = true;
            (s.posts_per_page, s.current_page)
        };
        match self.posts_service.get_posts(per_page, page).await {
            Ok(_) => Ok(()),
            Err(e) => {
                lock(&self.state).is_loading = false;
                Err(e)
            }
        }
    }
}

impl Drop for PostListComponent {
    fn drop(&mut self) {
        for handle in &self.subscriptions {
            handle.abort();
        }
    }
}
