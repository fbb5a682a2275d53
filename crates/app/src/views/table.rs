//! Entity table view: load, filter, delete with confirmation.

use std::collections::BTreeMap;
use std::future::Future;

use routerdesk_domain::error::{NotFoundError, RouterDeskError};

use crate::ports::ConfigBackend;
use crate::views::feedback::Feedback;
use crate::views::rows::{DeletableRow, ListableRow, TableRow};
use crate::views::session::{Applied, ViewSession};

/// Load state of a table. A failed load never shows rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableState<R> {
    Loading,
    Loaded(Vec<R>),
    Failed(String),
}

/// Transient copy of one entity list, owned by the view that shows it.
#[derive(Debug, Clone)]
pub struct TableView<R: TableRow> {
    state: TableState<R>,
    filter: String,
    pending_delete: Option<R::Key>,
    row_errors: BTreeMap<R::Key, String>,
}

impl<R: TableRow> Default for TableView<R> {
    fn default() -> Self {
        Self {
            state: TableState::Loading,
            filter: String::new(),
            pending_delete: None,
            row_errors: BTreeMap::new(),
        }
    }
}

impl<R: TableRow> TableView<R> {
    #[must_use]
    pub fn loaded(rows: Vec<R>) -> Self {
        Self {
            state: TableState::Loaded(rows),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            state: TableState::Failed(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn state(&self) -> &TableState<R> {
        &self.state
    }

    /// Message of a failed load.
    #[must_use]
    pub fn failure(&self) -> Option<&str> {
        match &self.state {
            TableState::Failed(message) => Some(message),
            TableState::Loading | TableState::Loaded(_) => None,
        }
    }

    #[must_use]
    pub fn filter(&self) -> &str {
        &self.filter
    }

    pub fn set_filter(&mut self, filter: impl Into<String>) {
        self.filter = filter.into();
    }

    /// Rows matching the filter, case-insensitively on any summary cell.
    #[must_use]
    pub fn visible_rows(&self) -> Vec<&R> {
        let TableState::Loaded(rows) = &self.state else {
            return Vec::new();
        };
        let needle = self.filter.trim().to_lowercase();
        rows.iter()
            .filter(|row| {
                needle.is_empty()
                    || row
                        .cells()
                        .iter()
                        .any(|cell| cell.to_lowercase().contains(&needle))
            })
            .collect()
    }

    /// Number of loaded rows, ignoring the filter.
    #[must_use]
    pub fn len(&self) -> usize {
        match &self.state {
            TableState::Loaded(rows) => rows.len(),
            TableState::Loading | TableState::Failed(_) => 0,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub fn row(&self, key: &R::Key) -> Option<&R> {
        match &self.state {
            TableState::Loaded(rows) => rows.iter().find(|row| &row.key() == key),
            TableState::Loading | TableState::Failed(_) => None,
        }
    }

    /// Inline error left on a row by a failed action.
    #[must_use]
    pub fn row_error(&self, key: &R::Key) -> Option<&str> {
        self.row_errors.get(key).map(String::as_str)
    }

    /// Ask for confirmation before deleting the row identified by `key`.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] when no such row is shown.
    pub fn request_delete(&mut self, key: R::Key) -> Result<(), RouterDeskError> {
        if self.row(&key).is_none() {
            return Err(NotFoundError {
                entity: "row",
                id: key.to_string(),
            }
            .into());
        }
        self.pending_delete = Some(key);
        Ok(())
    }

    /// Row awaiting delete confirmation.
    #[must_use]
    pub fn pending_delete(&self) -> Option<&R> {
        self.pending_delete.as_ref().and_then(|key| self.row(key))
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    fn remove_row(&mut self, key: &R::Key) {
        if let TableState::Loaded(rows) = &mut self.state {
            rows.retain(|row| &row.key() != key);
        }
        self.row_errors.remove(key);
    }
}

impl<R: ListableRow> TableView<R> {
    /// Fetch the rows of `scope`. A failed fetch yields the failed state.
    ///
    /// The session ticket is taken when the request is issued, so leaving
    /// the view before the rows arrive discards them.
    pub fn load<B>(
        session: &ViewSession,
        backend: &B,
        scope: &R::Scope,
    ) -> impl Future<Output = Applied<Self>> + Send
    where
        B: ConfigBackend + Sync,
    {
        let ticket = session.ticket();
        async move {
            let table = match R::fetch(backend, scope).await {
                Ok(rows) => Self::loaded(rows),
                Err(err) => {
                    tracing::warn!(error = %err, "failed to load table");
                    Self::failed(Feedback::from_error(&err).message())
                }
            };
            session.apply(ticket, table)
        }
    }

    /// Reload from the backend, keeping the filter. Nothing changes when the
    /// response arrives after the view was left.
    pub async fn refresh<B>(&mut self, session: &ViewSession, backend: &B, scope: &R::Scope) -> bool
    where
        B: ConfigBackend + Sync,
    {
        match Self::load(session, backend, scope).await {
            Applied::Applied(fresh) => {
                self.state = fresh.state;
                self.pending_delete = None;
                self.row_errors.clear();
                true
            }
            Applied::Discarded => false,
        }
    }
}

impl<R: DeletableRow> TableView<R> {
    /// Delete the row awaiting confirmation.
    ///
    /// On success, or when the entity is already gone, the row is removed
    /// locally. On failure the row stays and carries the error.
    ///
    /// # Errors
    ///
    /// Returns [`RouterDeskError::NotFound`] when no delete is pending,
    /// [`RouterDeskError::Busy`] while another change to the entity is in
    /// flight, or the backend error.
    pub async fn confirm_delete<B>(
        &mut self,
        session: &ViewSession,
        backend: &B,
    ) -> Result<Applied<()>, RouterDeskError>
    where
        B: ConfigBackend + Sync,
    {
        let Some(row) = self.pending_delete().cloned() else {
            return Err(NotFoundError {
                entity: "row",
                id: "pending delete".to_string(),
            }
            .into());
        };
        let key = row.key();
        let permit = match session.begin_mutation(row.entity_key()) {
            Ok(permit) => permit,
            Err(err) => {
                self.row_errors.insert(key, err.to_string());
                return Err(err);
            }
        };
        let ticket = session.ticket();
        let result = row.delete(backend).await;
        drop(permit);
        if !session.is_current(ticket) {
            return Ok(Applied::Discarded);
        }
        self.pending_delete = None;
        match result {
            Ok(()) | Err(RouterDeskError::NotFound(_)) => {
                tracing::info!(row = %key, "row deleted");
                self.remove_row(&key);
                Ok(Applied::Applied(()))
            }
            Err(err) => {
                tracing::warn!(row = %key, error = %err, "delete failed");
                self.row_errors
                    .insert(key, Feedback::from_error(&err).message().to_string());
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::EntityKey;
    use crate::ports::ConfigBackend;
    use crate::testing::{Gate, Harness, lan0, lease, mapping, server_name};
    use crate::views::rows::{LeaseRow, MappingRow, MappingScope, ServerRow};
    use std::sync::Arc;

    async fn seeded() -> Harness {
        let harness = Harness::new();
        let backend = harness.backend();
        backend.create_server(lan0()).await.unwrap();
        for (id, mac, octet) in [
            ("nas", "00:11:22:33:44:01", 20),
            ("printer", "00:11:22:33:44:02", 21),
            ("camera", "00:11:22:33:44:03", 22),
        ] {
            backend
                .create_mapping(&server_name("lan0"), mapping(id, mac, octet))
                .await
                .unwrap();
        }
        harness
    }

    fn scope() -> MappingScope {
        MappingScope {
            server: server_name("lan0"),
            read_only: false,
        }
    }

    #[tokio::test]
    async fn should_render_one_row_per_entity_matching_filter() {
        let harness = seeded().await;
        let session = ViewSession::default();
        let mut table = TableView::<MappingRow>::load(&session, &harness.backend(), &scope())
            .await
            .into_option()
            .unwrap();
        assert_eq!(table.visible_rows().len(), 3);

        table.set_filter("PRINT");
        assert_eq!(table.visible_rows().len(), 1);
        table.set_filter("00:11:22:33:44");
        assert_eq!(table.visible_rows().len(), 3);
        table.set_filter("192.0.2.2");
        assert_eq!(table.visible_rows().len(), 3);
        table.set_filter("no-such-row");
        assert!(table.visible_rows().is_empty());
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn should_show_failed_state_instead_of_rows_when_load_fails() {
        let harness = seeded().await;
        harness.mappings.tracker.set_down(true);
        let session = ViewSession::default();
        let table = TableView::<MappingRow>::load(&session, &harness.backend(), &scope())
            .await
            .into_option()
            .unwrap();
        assert!(table.failure().is_some());
        assert!(table.visible_rows().is_empty());
    }

    #[tokio::test]
    async fn should_discard_load_when_view_left() {
        let harness = seeded().await;
        let session = ViewSession::default();
        let backend = harness.backend();
        let load = TableView::<ServerRow>::load(&session, &backend, &());
        session.navigate_away();
        assert_eq!(load.await.into_option().map(|t| t.len()), None);
    }

    #[tokio::test]
    async fn should_remove_exactly_one_row_after_confirmed_delete() {
        let harness = seeded().await;
        let backend = harness.backend();
        let session = ViewSession::default();
        let mut table = TableView::<MappingRow>::load(&session, &backend, &scope())
            .await
            .into_option()
            .unwrap();

        let printer = crate::testing::mapping_id("printer");
        table.request_delete(printer.clone()).unwrap();
        assert_eq!(table.pending_delete().unwrap().key(), printer);
        table.confirm_delete(&session, &backend).await.unwrap();

        assert_eq!(table.len(), 2);
        assert!(table.row(&printer).is_none());
        let remaining = backend.list_mappings(&server_name("lan0")).await.unwrap();
        assert_eq!(remaining.len(), 2);
        assert!(remaining.iter().all(|m| m.id != printer));
    }

    #[tokio::test]
    async fn should_not_delete_until_confirmed() {
        let harness = seeded().await;
        let backend = harness.backend();
        let session = ViewSession::default();
        let mut table = TableView::<MappingRow>::load(&session, &backend, &scope())
            .await
            .into_option()
            .unwrap();
        table
            .request_delete(crate::testing::mapping_id("nas"))
            .unwrap();
        table.cancel_delete();
        assert!(table.confirm_delete(&session, &backend).await.is_err());
        assert_eq!(backend.list_mappings(&server_name("lan0")).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn should_keep_row_and_show_error_when_delete_fails() {
        let harness = seeded().await;
        let backend = harness.backend();
        let session = ViewSession::default();
        let mut table = TableView::<MappingRow>::load(&session, &backend, &scope())
            .await
            .into_option()
            .unwrap();
        let nas = crate::testing::mapping_id("nas");
        table.request_delete(nas.clone()).unwrap();
        harness.mappings.tracker.set_down(true);

        let err = table.confirm_delete(&session, &backend).await.unwrap_err();
        assert!(matches!(err, RouterDeskError::Transport(_)));
        assert!(table.row(&nas).is_some());
        assert!(table.row_error(&nas).is_some());
    }

    #[tokio::test]
    async fn should_keep_server_mappings_when_server_delete_fails() {
        let harness = seeded().await;
        let backend = harness.backend();
        let session = ViewSession::default();
        let mut table = TableView::<ServerRow>::load(&session, &backend, &())
            .await
            .into_option()
            .unwrap();
        table.request_delete(server_name("lan0")).unwrap();
        harness.servers.tracker.set_down(true);

        let err = table.confirm_delete(&session, &backend).await.unwrap_err();
        assert!(matches!(err, RouterDeskError::Transport(_)));
        assert!(table.row(&server_name("lan0")).is_some());

        harness.servers.tracker.set_down(false);
        let mappings = backend.list_mappings(&server_name("lan0")).await.unwrap();
        assert_eq!(mappings.len(), 3);
    }

    #[tokio::test]
    async fn should_drop_row_when_entity_already_gone() {
        let harness = seeded().await;
        let backend = harness.backend();
        let session = ViewSession::default();
        let mut table = TableView::<ServerRow>::load(&session, &backend, &())
            .await
            .into_option()
            .unwrap();
        backend.delete_server(&server_name("lan0")).await.unwrap();

        table.request_delete(server_name("lan0")).unwrap();
        table.confirm_delete(&session, &backend).await.unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn should_reject_delete_while_update_in_flight() {
        let gate = Arc::new(Gate::default());
        let mut harness = Harness::new();
        harness.servers.update_gate = Some(Arc::clone(&gate));
        let backend = Arc::new(harness.backend());
        backend.create_server(lan0()).await.unwrap();
        let session = Arc::new(ViewSession::default());

        let mut table = TableView::<ServerRow>::load(&session, backend.as_ref(), &())
            .await
            .into_option()
            .unwrap();
        let row = table.row(&server_name("lan0")).cloned().unwrap();

        let update = tokio::spawn({
            let session = Arc::clone(&session);
            let backend = Arc::clone(&backend);
            async move { row.toggle_status(&session, backend.as_ref()).await }
        });
        gate.entered.notified().await;
        assert!(
            session
                .guard()
                .is_in_flight(&EntityKey::Server(server_name("lan0")))
        );

        table.request_delete(server_name("lan0")).unwrap();
        let err = table
            .confirm_delete(&session, backend.as_ref())
            .await
            .unwrap_err();
        assert!(matches!(err, RouterDeskError::Busy(_)));
        assert!(table.row_error(&server_name("lan0")).is_some());

        gate.release.notify_one();
        update.await.unwrap().unwrap();

        table.request_delete(server_name("lan0")).unwrap();
        table.confirm_delete(&session, backend.as_ref()).await.unwrap();
        assert!(backend.list_servers().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn should_refresh_from_backend_state() {
        let harness = seeded().await;
        let backend = harness.backend();
        let session = ViewSession::default();
        let mut table = TableView::<LeaseRow>::load(&session, &backend, &server_name("lan0"))
            .await
            .into_option()
            .unwrap();
        assert!(table.is_empty());

        backend
            .record_lease(lease(50, "00:11:22:33:44:50", None))
            .await
            .unwrap();
        assert!(table.refresh(&session, &backend, &server_name("lan0")).await);
        assert_eq!(table.len(), 1);
    }
}
