//! Client-side route table, auth gate, and lazily loaded child modules.
//!
//! ```text
//! ""            → post list
//! create        → post editor          (auth)
//! edit/:postId  → post editor          (auth)
//! auth/...      → login / signup       (loaded on first use)
//! ```

use std::sync::OnceLock;
use tokio::sync::watch;

/// Where the guard sends anonymous users.
pub const LOGIN_URL: &str = "/auth/login";

/// Seam the services use to move the user around.
pub trait Navigator: Send + Sync {
    fn navigate_by_url(&self, url: &str);
}

/// The screen a URL resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    PostList,
    /// Create mode when `post_id` is `None`, edit mode otherwise.
    PostCreate { post_id: Option<String> },
    Login,
    Signup,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Navigation {
    pub url: String,
    pub view: View,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    #[error("No route matches '{0}'")]
    NotFound(String),

    #[error("Navigation to '{url}' rejected, redirected to '{redirect}'")]
    Rejected { url: String, redirect: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    PostList,
    PostCreate,
    Login,
    Signup,
}

enum Target {
    Screen(Screen),
    Children(LazyModule),
}

pub struct Route {
    path: &'static str,
    target: Target,
    guarded: bool,
}

impl Route {
    fn screen(path: &'static str, screen: Screen) -> Self {
        Self { path, target: Target::Screen(screen), guarded: false }
    }

    fn guarded(mut self) -> Self {
        self.guarded = true;
        self
    }

    fn lazy(path: &'static str, module: LazyModule) -> Self {
        Self { path, target: Target::Children(module), guarded: false }
    }

    pub fn path(&self) -> &str {
        self.path
    }

    pub fn is_guarded(&self) -> bool {
        self.guarded
    }
}

/// Child routes built the first time a URL under their prefix is resolved.
pub struct LazyModule {
    name: &'static str,
    load: fn() -> Vec<Route>,
    routes: OnceLock<Vec<Route>>,
}

impl LazyModule {
    pub fn new(name: &'static str, load: fn() -> Vec<Route>) -> Self {
        Self { name, load, routes: OnceLock::new() }
    }

    pub fn is_loaded(&self) -> bool {
        self.routes.get().is_some()
    }

    fn routes(&self) -> &[Route] {
        self.routes.get_or_init(|| {
            tracing::debug!(module = self.name, "Loading lazy route module");
            (self.load)()
        })
    }
}

/// Application routes.
pub fn app_routes() -> Vec<Route> {
    vec![
        Route::screen("", Screen::PostList),
        Route::screen("create", Screen::PostCreate).guarded(),
        Route::screen("edit/:postId", Screen::PostCreate).guarded(),
        Route::lazy("auth", LazyModule::new("auth", auth_routes)),
    ]
}

fn auth_routes() -> Vec<Route> {
    vec![
        Route::screen("login", Screen::Login),
        Route::screen("signup", Screen::Signup),
    ]
}

// ============================================================
// Guard
// ============================================================

/// Lets a navigation through only while the user is authenticated.
#[derive(Clone)]
pub struct AuthGuard {
    status: watch::Receiver<bool>,
}

impl AuthGuard {
    pub fn new(status: watch::Receiver<bool>) -> Self {
        Self { status }
    }

    /// `Ok(())` to allow, `Err(redirect)` otherwise.
    pub fn can_activate(&self) -> Result<(), &'static str> {
        if *self.status.borrow() {
            Ok(())
        } else {
            Err(LOGIN_URL)
        }
    }
}

// ============================================================
// Router
// ============================================================

pub struct Router {
    routes: Vec<Route>,
    guard: AuthGuard,
    current: watch::Sender<String>,
}

impl Router {
    pub fn new(routes: Vec<Route>, guard: AuthGuard) -> Self {
        let (current, _) = watch::channel("/".to_owned());
        Self { routes, guard, current }
    }

    pub fn current_url(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn url_listener(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    /// Resolve `url`, run the guard, and publish the new location.
    ///
    /// A rejected navigation publishes the redirect target instead.
    pub fn navigate(&self, url: &str) -> Result<Navigation, NavigationError> {
        let path = normalize(url);
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let (view, guarded) = resolve(&self.routes, &segments)
            .ok_or_else(|| NavigationError::NotFound(path.clone()))?;

        if guarded {
            if let Err(redirect) = self.guard.can_activate() {
                tracing::debug!(url = %path, redirect, "Navigation rejected by auth guard");
                self.current.send_replace(redirect.to_owned());
                return Err(NavigationError::Rejected { url: path, redirect: redirect.to_owned() });
            }
        }

        self.current.send_replace(path.clone());
        Ok(Navigation { url: path, view })
    }
}

impl Navigator for Router {
    fn navigate_by_url(&self, url: &str) {
        if let Err(e) = self.navigate(url) {
            tracing::warn!(error = %e, "Navigation failed");
        }
    }
}

fn normalize(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    let trimmed = path.trim_matches('/');
    format!("/{trimmed}")
}

fn resolve(routes: &[Route], segments: &[&str]) -> Option<(View, bool)> {
    for route in routes {
        let pattern: Vec<&str> = route.path.split('/').filter(|s| !s.is_empty()).collect();
        match &route.target {
            Target::Screen(screen) => {
                if let Some(param) = match_full(&pattern, segments) {
                    return Some((view_for(*screen, param), route.guarded));
                }
            }
            Target::Children(module) => {
                if segments.len() >= pattern.len() && pattern.iter().zip(segments).all(|(p, s)| p == s) {
                    let rest = &segments[pattern.len()..];
                    if let Some((view, guarded)) = resolve(module.routes(), rest) {
                        return Some((view, guarded || route.guarded));
                    }
                }
            }
        }
    }
    None
}

/// Whole-path match; returns the single captured parameter, if any.
fn match_full(pattern: &[&str], segments: &[&str]) -> Option<Option<String>> {
    if pattern.len() != segments.len() {
        return None;
    }
    let mut param = None;
    for (p, s) in pattern.iter().zip(segments) {
        if p.starts_with(':') {
            param = Some((*s).to_owned());
        } else if p != s {
            return None;
        }
    }
    Some(param)
}

fn view_for(screen: Screen, param: Option<String>) -> View {
    match screen {
        Screen::PostList => View::PostList,
        Screen::PostCreate => View::PostCreate { post_id: param },
        Screen::Login => View::Login,
        Screen::Signup => View::Signup,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn router(authenticated: bool) -> (Router, watch::Sender<bool>) {
        let (tx, rx) = watch::channel(authenticated);
        (Router::new(app_routes(), AuthGuard::new(rx)), tx)
    }

    #[test]
    fn only_editor_routes_are_guarded() {
        let routes = app_routes();
        let guarded: Vec<&str> = routes
            .iter()
            .filter(|r| r.is_guarded())
            .map(|r| r.path())
            .collect();
        assert_eq!(guarded, ["create", "edit/:postId"]);
    }

    #[test]
    fn root_resolves_to_post_list() {
        let (router, _tx) = router(false);
        let nav = router.navigate("/").unwrap();
        assert_eq!(nav.view, View::PostList);
        assert_eq!(router.navigate("").unwrap().url, "/");
    }

    #[test]
    fn guarded_routes_redirect_anonymous_users() {
        let (router, _tx) = router(false);
        let err = router.navigate("/create").unwrap_err();
        assert_eq!(
            err,
            NavigationError::Rejected { url: "/create".into(), redirect: LOGIN_URL.into() }
        );
        assert_eq!(router.current_url(), LOGIN_URL);
    }

    #[test]
    fn guarded_routes_open_after_login() {
        let (router, tx) = router(false);
        assert!(router.navigate("/edit/abc").is_err());

        tx.send_replace(true);
        let nav = router.navigate("/edit/abc").unwrap();
        assert_eq!(nav.view, View::PostCreate { post_id: Some("abc".into()) });
        assert_eq!(router.navigate("/create").unwrap().view, View::PostCreate { post_id: None });
        assert_eq!(router.current_url(), "/create");
    }

    #[test]
    fn auth_module_loads_on_first_use() {
        let (router, _tx) = router(false);
        let Target::Children(module) = &router.routes[3].target else {
            panic!("auth route should be lazy");
        };
        assert!(!module.is_loaded());

        router.navigate("/").unwrap();
        assert!(!module.is_loaded());

        assert_eq!(router.navigate("/auth/login").unwrap().view, View::Login);
        assert!(module.is_loaded());
        assert_eq!(router.navigate("/auth/signup?next=1").unwrap().view, View::Signup);
    }

    #[test]
    fn unknown_urls_are_not_found() {
        let (router, _tx) = router(true);
        assert!(matches!(router.navigate("/nope"), Err(NavigationError::NotFound(_))));
        assert!(matches!(router.navigate("/auth"), Err(NavigationError::NotFound(_))));
        assert!(matches!(router.navigate("/edit"), Err(NavigationError::NotFound(_))));
        assert_eq!(router.current_url(), "/");
    }

    #[test]
    fn url_listener_sees_navigation() {
        let (router, tx) = router(false);
        let mut rx = router.url_listener();
        tx.send_replace(true);
        router.navigate_by_url("/create");
        assert!(rx.has_changed().unwrap());
        assert_eq!(*rx.borrow_and_update(), "/create");
    }
}
