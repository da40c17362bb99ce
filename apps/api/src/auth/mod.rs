// Minimal accounts and cookie sessions; enough to derive the owner id
// every other module is scoped by.

pub mod extractor;
pub mod handlers;
pub mod password;
pub mod store;

pub use store::AccountStore;
