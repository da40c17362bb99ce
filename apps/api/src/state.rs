use std::sync::Arc;

use crate::applications::ApplicationStore;
use crate::auth::AccountStore;
use crate::config::Config;
use crate::documents::storage::BlobStore;
use crate::documents::{DocumentRegistry, DocumentStore};
use crate::share::{ShareGateway, ShareStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub accounts: Arc<dyn AccountStore>,
    pub applications: Arc<dyn ApplicationStore>,
    pub documents: DocumentRegistry,
    pub share: ShareGateway,
    pub config: Config,
}

impl AppState {
    /// Wires every service to one store implementation and a blob backend.
    pub fn new<S>(store: Arc<S>, blobs: Arc<dyn BlobStore>, config: Config) -> Self
    where
        S: AccountStore + ApplicationStore + DocumentStore + ShareStore + 'static,
    {
        let applications: Arc<dyn ApplicationStore> = store.clone();
        let documents = DocumentRegistry::new(store.clone(), blobs);
        Self {
            accounts: store.clone(),
            share: ShareGateway::new(store, applications.clone(), documents.clone()),
            documents,
            applications,
            config,
        }
    }
}
