// Application Query Service: owner-scoped CRUD plus the filtered, sorted,
// paginated list behind the dashboard.

pub mod filters;
pub mod handlers;
pub mod service;
pub mod store;
pub mod validation;

pub use store::ApplicationStore;
