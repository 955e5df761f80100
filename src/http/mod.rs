//! Route organisation.

pub mod routes;

pub use routes::RouteModule;
