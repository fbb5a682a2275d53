//! How an error is shown to the operator.

use std::collections::BTreeMap;

use routerdesk_domain::error::RouterDeskError;

/// Per-field messages of a form, keyed by input name.
pub type FieldErrors = BTreeMap<&'static str, String>;

/// User-visible signal for a failed action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Attached to one input of the form.
    Field {
        field: &'static str,
        message: String,
    },
    /// Shown next to the form or row that triggered the action.
    Inline(String),
    /// Dismissible banner; the operator retries by submitting again.
    Banner(String),
}

impl Feedback {
    #[must_use]
    pub fn from_error(err: &RouterDeskError) -> Self {
        match err {
            RouterDeskError::Transport(source) => {
                tracing::error!(error = %source, "backend unavailable");
                Self::Banner(format!("{err}, please try again"))
            }
            _ => match err.field() {
                Some(field) => Self::Field {
                    field,
                    message: err.to_string(),
                },
                None => Self::Inline(err.to_string()),
            },
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::Field { message, .. } | Self::Inline(message) | Self::Banner(message) => message,
        }
    }
}
