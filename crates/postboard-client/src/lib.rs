//! Postboard client.
//!
//! Typed services over the Postboard REST API, the push streams components
//! subscribe to, headless components, and the client route table.
//!
//! # Quick start
//!
//! ```rust,no_run
//! use postboard_client::PostboardApp;
//!
//! #[tokio::main]
//! async fn main() -> postboard_client::Result<()> {
//!     let app = PostboardApp::new(None, None)?;
//!     app.auth.login("ann@example.com", "secret1").await?;
//!     let page = app.posts.get_posts(10, 1).await?;
//!     println!("{} of {} posts", page.posts.len(), page.post_count);
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod catalog;
pub mod components;
pub mod error;
pub mod posts;
pub mod rest;
pub mod routing;
pub mod types;

pub use auth::{AuthService, AuthSession};
pub use catalog::{Product, ProductService};
pub use error::{ClientError, Result};
pub use posts::PostsService;
pub use rest::RestClient;
pub use routing::{AuthGuard, Navigation, NavigationError, Navigator, Router, View};
pub use types::{ImageFile, Post, PostImage, PostsUpdate, SavedAuth};

use std::sync::Arc;

/// Every service wired together the way the application uses them: one
/// shared session, one router, services navigating through that router.
pub struct PostboardApp {
    pub router: Arc<Router>,
    pub auth: AuthService,
    pub posts: PostsService,
    pub products: ProductService,
}

impl PostboardApp {
    /// `api_base` defaults to [`rest::DEFAULT_BASE`], `catalog_base` to
    /// [`catalog::DEFAULT_CATALOG_BASE`].
    pub fn new(api_base: Option<&str>, catalog_base: Option<&str>) -> Result<Self> {
        let rest = RestClient::new(api_base)?;
        let session = AuthSession::new();
        let router = Arc::new(Router::new(
            routing::app_routes(),
            AuthGuard::new(session.auth_status_listener()),
        ));
        let navigator: Arc<dyn Navigator> = router.clone();

        let auth = AuthService::new(rest.clone(), session, navigator.clone());
        let posts = PostsService::new(rest, navigator);
        let products = ProductService::new(RestClient::new(Some(
            catalog_base.unwrap_or(catalog::DEFAULT_CATALOG_BASE),
        ))?);

        Ok(Self { router, auth, posts, products })
    }
}
