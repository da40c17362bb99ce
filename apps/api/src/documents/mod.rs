// Document Registry: validated uploads, owner-scoped metadata, and two
// interchangeable blob backends.

pub mod handlers;
pub mod registry;
pub mod storage;
pub mod store;
pub mod upload;

pub use registry::DocumentRegistry;
pub use store::DocumentStore;
