use axum::Router;

/// A group of routes registered with an [`App`](crate::App) as one unit
///
/// ```rust,no_run
/// use axum::{Router, routing::get};
/// use bulwark::RouteModule;
///
/// struct PagesModule;
///
/// impl RouteModule for PagesModule {
///     fn routes(&self) -> Router {
///         Router::new().route("/about", get(|| async { "About" }))
///     }
///
///     fn prefix(&self) -> Option<&str> {
///         Some("/pages")
///     }
/// }
/// ```
pub trait RouteModule {
    /// Returns a router with all routes for this module
    fn routes(&self) -> Router;

    /// Optional: specify a path prefix for all routes in this module
    fn prefix(&self) -> Option<&str> {
        None
    }

    /// Registers this module's routes into `router`, nesting under the prefix
    fn register(self, router: Router) -> Router
    where
        Self: Sized,
    {
        let routes = self.routes();

        match self.prefix() {
            Some(prefix) => router.nest(prefix, routes),
            None => router.merge(routes),
        }
    }
}
