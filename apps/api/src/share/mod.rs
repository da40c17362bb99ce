// Share Gateway: one opaque, rotatable token per user granting a
// read-only, redacted view of their applications.

pub mod gateway;
pub mod handlers;
pub mod store;

pub use gateway::ShareGateway;
pub use store::ShareStore;
