//! View models rendered by the dashboard.
//!
//! Views talk to a [`ConfigBackend`](crate::ports::ConfigBackend) only and
//! keep their state in plain values: a [`TableView`] per entity list, a
//! [`FormView`] per open form, and a [`ViewSession`] carrying the selection,
//! the staleness counter and the shared mutation guard.

pub mod dialog;
pub mod drafts;
pub mod feedback;
pub mod form;
pub mod overview;
pub mod rows;
pub mod session;
pub mod table;

pub use dialog::{DhcpServerDialog, DialogTab};
pub use drafts::{
    DhcpServerDraft, Forwarder, ForwardingDraft, ForwardingScope, PppoeDraft, PppoeScope,
    StaticMappingDraft, delete_service,
};
pub use feedback::{Feedback, FieldErrors};
pub use form::{
    FieldKind, FieldSpec, FormDraft, FormMode, FormValues, FormView, Refresh, SubmitOutcome,
};
pub use overview::Overview;
pub use rows::{
    DeletableRow, LeaseRow, ListableRow, MappingRow, MappingScope, RowAction, ServerRow, TableRow,
};
pub use session::{Applied, ViewContext, ViewSession, ViewTicket};
pub use table::{TableState, TableView};
