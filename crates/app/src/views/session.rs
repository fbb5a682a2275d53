//! Per-view-session state passed down to every view.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::ServerName;

use crate::guard::{EntityKey, MutationGuard, MutationPermit};
use crate::views::dialog::DialogTab;

/// What the operator is currently looking at.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewContext {
    pub selected: Option<ServerName>,
    pub dialog: Option<DialogTab>,
}

/// Generation captured before a request; compared when the response lands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewTicket(u64);

/// Result of a response checked against the session before applying it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Applied<T> {
    Applied(T),
    /// The view changed while the request was in flight.
    Discarded,
}

impl<T> Applied<T> {
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Applied(value) => Some(value),
            Self::Discarded => None,
        }
    }
}

/// Explicit view-session context: selection, staleness and mutation guard.
///
/// Navigating bumps the generation so that responses to requests issued
/// from the previous view are dropped instead of applied.
#[derive(Debug)]
pub struct ViewSession {
    generation: AtomicU64,
    context: Mutex<ViewContext>,
    guard: Arc<MutationGuard>,
}

impl Default for ViewSession {
    fn default() -> Self {
        Self::new(Arc::new(MutationGuard::new()))
    }
}

impl ViewSession {
    /// Start a session that shares `guard` with other sessions.
    #[must_use]
    pub fn new(guard: Arc<MutationGuard>) -> Self {
        Self {
            generation: AtomicU64::new(0),
            context: Mutex::new(ViewContext::default()),
            guard,
        }
    }

    #[must_use]
    pub fn ticket(&self) -> ViewTicket {
        ViewTicket(self.generation.load(Ordering::SeqCst))
    }

    /// Whether the view that issued `ticket` is still the active one.
    #[must_use]
    pub fn is_current(&self, ticket: ViewTicket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Apply `value` only if the view that issued `ticket` is still active.
    pub fn apply<T>(&self, ticket: ViewTicket, value: T) -> Applied<T> {
        if self.is_current(ticket) {
            Applied::Applied(value)
        } else {
            tracing::debug!("discarding response for a view that is gone");
            Applied::Discarded
        }
    }

    #[must_use]
    pub fn context(&self) -> ViewContext {
        self.context
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Switch to another view.
    pub fn navigate(&self, context: ViewContext) {
        *self.context.lock().unwrap_or_else(PoisonError::into_inner) = context;
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    /// Leave the current view without opening another one.
    pub fn navigate_away(&self) {
        self.navigate(ViewContext::default());
    }

    /// Reserve `key` for one mutation.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::Busy`] while another mutation of the same
    /// entity is in flight.
    pub fn begin_mutation(&self, key: EntityKey) -> Result<MutationPermit, RouterDeskError> {
        Ok(self.guard.try_acquire(key)?)
    }

    #[must_use]
    pub fn guard(&self) -> &Arc<MutationGuard> {
        &self.guard
    }
}
