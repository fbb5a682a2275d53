//! Shared application state for axum handlers.

use std::sync::Arc;

use routerdesk_app::guard::MutationGuard;
use routerdesk_app::ports::ConfigBackend;
use routerdesk_app::views::ViewSession;

/// Application state shared across all axum handlers.
///
/// Generic over the backend to avoid dynamic dispatch. `Clone` is
/// implemented manually so the backend itself does not need to be `Clone`;
/// only the `Arc` wrappers are cloned.
pub struct AppState<B> {
    /// Configuration backend every handler talks to.
    pub backend: Arc<B>,
    /// One in-flight mutation per entity, across all requests.
    pub guard: Arc<MutationGuard>,
    /// Interface names offered by the service forms.
    pub interfaces: Arc<[String]>,
}

impl<B> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            guard: Arc::clone(&self.guard),
            interfaces: Arc::clone(&self.interfaces),
        }
    }
}

impl<B> AppState<B>
where
    B: ConfigBackend + Send + Sync + 'static,
{
    /// Create a new application state around `backend`.
    pub fn new(backend: B, interfaces: Vec<String>) -> Self {
        Self {
            backend: Arc::new(backend),
            guard: Arc::new(MutationGuard::new()),
            interfaces: interfaces.into(),
        }
    }

    /// Start the view session of one dashboard request.
    #[must_use]
    pub fn session(&self) -> ViewSession {
        ViewSession::new(Arc::clone(&self.guard))
    }
}
