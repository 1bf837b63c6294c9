//! Application state shared across request handlers.

use std::sync::Arc;

use crate::service::VillaService;

/// Shared application state.
///
/// This is passed to all request handlers via Axum's state extractor.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    service: VillaService,
}

impl AppState {
    /// Create a new application state.
    pub fn new(service: VillaService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { service }),
        }
    }

    /// Get a reference to the villa service.
    pub fn service(&self) -> &VillaService {
        &self.inner.service
    }
}
