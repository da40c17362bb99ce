pub mod application;
pub mod document;
pub mod share;
pub mod user;

pub use application::{ApplicationStatus, JobApplication};
pub use document::{Document, DocumentSummary, DocumentType};
pub use share::ShareSettings;
pub use user::{Session, User};
