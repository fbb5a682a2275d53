//! Storage-specific error type wrapping sqlx errors.

use std::str::FromStr;

use routerdesk_domain::error::{ConflictError, RouterDeskError};

/// Errors originating from the `SQLite` storage layer.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// A query or connection failed.
    #[error("database error")]
    Database(#[from] sqlx::Error),

    /// Failed to serialize or deserialize a stored JSON value.
    #[error("JSON serialization error")]
    Json(#[from] serde_json::Error),

    /// Failed to run migrations.
    #[error("migration error")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<StorageError> for RouterDeskError {
    fn from(err: StorageError) -> Self {
        Self::Transport(Box::new(err))
    }
}

/// Parse a stored column, reporting failures as decode errors.
pub(crate) fn decode<T>(raw: &str) -> Result<T, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.parse().map_err(|err| sqlx::Error::Decode(Box::new(err)))
}

/// [`decode`] for nullable columns.
pub(crate) fn decode_optional<T>(raw: Option<String>) -> Result<Option<T>, sqlx::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    raw.as_deref().map(decode).transpose()
}

/// Map a failed write, turning a unique-constraint violation into a
/// [`ConflictError`] on the offending column.
///
/// `values` pairs each unique column with the value that was written.
pub(crate) fn write_error(
    err: sqlx::Error,
    entity: &'static str,
    values: &[(&'static str, String)],
) -> RouterDeskError {
    let violated = err
        .as_database_error()
        .filter(|db| db.is_unique_violation())
        .and_then(|db| {
            let message = db.message();
            values
                .iter()
                .find(|(column, _)| message.ends_with(&format!(".{column}")))
        });
    if let Some((column, value)) = violated {
        return ConflictError {
            entity,
            field: form_field(*column),
            value: value.clone(),
        }
        .into();
    }
    StorageError::from(err).into()
}

fn form_field(column: &'static str) -> &'static str {
    match column {
        "mac_address" => "macaddress",
        "ip_address" => "ipaddress",
        other => other,
    }
}
