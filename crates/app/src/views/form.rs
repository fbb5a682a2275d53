//! Entity form view: create and edit drafts, local checks, submit.

use std::collections::{BTreeMap, BTreeSet};
use std::future::Future;

use uuid::Uuid;

use routerdesk_domain::error::RouterDeskError;
use routerdesk_domain::id::ServerName;
use routerdesk_domain::service::ServiceKind;

use crate::guard::EntityKey;
use crate::ports::ConfigBackend;
use crate::views::feedback::{Feedback, FieldErrors};
use crate::views::session::ViewSession;

/// How an input is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Checkbox,
    /// Multi-select of known interfaces plus a free-text `other-<name>` input.
    Interfaces,
}

/// Static description of one form input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub hint: Option<&'static str>,
    pub suffix: Option<&'static str>,
}

impl FieldSpec {
    #[must_use]
    pub const fn text(name: &'static str, label: &'static str) -> Self {
        Self {
            name,
            label,
            kind: FieldKind::Text,
            required: false,
            hint: None,
            suffix: None,
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn kind(mut self, kind: FieldKind) -> Self {
        self.kind = kind;
        self
    }

    #[must_use]
    pub const fn hint(mut self, hint: &'static str) -> Self {
        self.hint = Some(hint);
        self
    }

    #[must_use]
    pub const fn suffix(mut self, suffix: &'static str) -> Self {
        self.suffix = Some(suffix);
        self
    }

    /// Name of the free-text companion input of an interface selector.
    #[must_use]
    pub fn other_name(&self) -> String {
        format!("other-{}", self.name)
    }
}

/// Raw form input, as submitted: every input name maps to its values.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues(BTreeMap<String, Vec<String>>);

impl FormValues {
    #[must_use]
    pub fn from_pairs(pairs: impl IntoIterator<Item = (String, String)>) -> Self {
        let mut values = Self::default();
        for (name, value) in pairs {
            values.push(name, value);
        }
        values
    }

    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.entry(name.into()).or_default().push(value.into());
    }

    /// Replace every value of `name`.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), vec![value.into()]);
    }

    /// First value of `name`, or `""`.
    #[must_use]
    pub fn first(&self, name: &str) -> &str {
        self.0
            .get(name)
            .and_then(|values| values.first())
            .map_or("", String::as_str)
    }

    #[must_use]
    pub fn all(&self, name: &str) -> &[String] {
        self.0.get(name).map_or(&[], Vec::as_slice)
    }

    /// Whether `name` has no non-blank value.
    #[must_use]
    pub fn is_blank(&self, name: &str) -> bool {
        self.all(name).iter().all(|value| value.trim().is_empty())
    }

    fn copy_from(&mut self, other: &Self, name: &str) {
        match other.0.get(name) {
            Some(values) => {
                self.0.insert(name.to_string(), values.clone());
            }
            None => {
                self.0.remove(name);
            }
        }
    }
}

/// Whether a form creates a new entity or edits an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit,
}

/// Table to reload after a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refresh {
    Servers,
    Mappings(ServerName),
    Service(ServiceKind),
}

/// Typed, editable copy of one entity's fields.
pub trait FormDraft: Clone + PartialEq + Send + Sync + Sized {
    type Entity: Clone + Send + Sync;
    type Scope: Send + Sync;

    const FIELDS: &'static [FieldSpec];

    /// Fields that identify the entity and are locked in edit mode.
    const IDENTITY: &'static [&'static str];

    /// Values a create form starts from.
    fn defaults(scope: &Self::Scope) -> Self;

    fn from_entity(entity: &Self::Entity) -> Self;

    fn from_values(values: &FormValues) -> Self;

    fn to_values(&self) -> FormValues;

    /// Parse the draft, collecting one message per offending field.
    ///
    /// # Errors
    ///
    /// Returns the per-field messages when any value is malformed or breaks
    /// a domain invariant.
    fn parse(&self, scope: &Self::Scope) -> Result<Self::Entity, FieldErrors>;

    fn entity_key(scope: &Self::Scope, entity: &Self::Entity) -> EntityKey;

    fn save<B>(
        backend: &B,
        scope: &Self::Scope,
        mode: FormMode,
        entity: Self::Entity,
    ) -> impl Future<Output = Result<Self::Entity, RouterDeskError>> + Send
    where
        B: ConfigBackend + Sync;

    fn refresh(scope: &Self::Scope) -> Refresh;

    /// Interface names offered by [`FieldKind::Interfaces`] inputs.
    fn interface_choices(_scope: &Self::Scope) -> &[String] {
        &[]
    }
}

/// Outcome of a submit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome<E> {
    /// Stored; the form closes and `refresh` names the table to reload.
    Saved { entity: E, refresh: Refresh },
    /// Kept open with field errors, an inline message or a banner.
    Rejected,
    /// The view was left before the backend answered.
    Discarded,
}

/// A create or edit form bound to one draft type.
#[derive(Debug, Clone)]
pub struct FormView<D: FormDraft> {
    instance: Uuid,
    mode: FormMode,
    draft: D,
    snapshot: D,
    locked: BTreeSet<&'static str>,
    errors: FieldErrors,
    message: Option<String>,
    banner: Option<String>,
}

impl<D: FormDraft> FormView<D> {
    fn with(mode: FormMode, draft: D, locked: &[&'static str]) -> Self {
        Self {
            instance: Uuid::new_v4(),
            mode,
            snapshot: draft.clone(),
            draft,
            locked: locked.iter().copied().collect(),
            errors: FieldErrors::new(),
            message: None,
            banner: None,
        }
    }

    /// Empty create form with defaults applied.
    #[must_use]
    pub fn create(scope: &D::Scope) -> Self {
        Self::with(FormMode::Create, D::defaults(scope), &[])
    }

    /// Create form pre-filled by the caller, with some inputs locked.
    #[must_use]
    pub fn prefilled(draft: D, locked: &[&'static str]) -> Self {
        Self::with(FormMode::Create, draft, locked)
    }

    /// Edit form populated from the entity snapshot.
    #[must_use]
    pub fn edit(entity: &D::Entity) -> Self {
        Self::with(FormMode::Edit, D::from_entity(entity), D::IDENTITY)
    }

    /// Per-instance id, used to keep input ids unique on a page.
    #[must_use]
    pub fn instance(&self) -> Uuid {
        self.instance
    }

    #[must_use]
    pub fn mode(&self) -> FormMode {
        self.mode
    }

    #[must_use]
    pub fn draft(&self) -> &D {
        &self.draft
    }

    #[must_use]
    pub fn values(&self) -> FormValues {
        self.draft.to_values()
    }

    #[must_use]
    pub fn is_locked(&self, field: &str) -> bool {
        self.locked.contains(field)
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.draft != self.snapshot
    }

    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    #[must_use]
    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    #[must_use]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        self.banner.as_deref()
    }

    /// Take submitted input. Locked inputs keep their current value.
    pub fn accept(&mut self, submitted: FormValues) {
        let current = self.draft.to_values();
        let mut values = submitted;
        for field in &self.locked {
            values.copy_from(&current, field);
        }
        self.draft = D::from_values(&values);
    }

    /// Discard edits and go back to the snapshot.
    pub fn reset(&mut self) {
        self.draft = self.snapshot.clone();
        self.clear_feedback();
    }

    fn clear_feedback(&mut self) {
        self.errors.clear();
        self.message = None;
        self.banner = None;
    }

    /// Required inputs left blank, with their messages.
    fn missing_fields(&self) -> FieldErrors {
        let values = self.draft.to_values();
        D::FIELDS
            .iter()
            .filter(|spec| spec.required)
            .filter(|spec| match spec.kind {
                FieldKind::Interfaces => {
                    values.is_blank(spec.name) && values.is_blank(&spec.other_name())
                }
                FieldKind::Text | FieldKind::Checkbox => values.is_blank(spec.name),
            })
            .map(|spec| (spec.name, format!("{} is required", spec.label)))
            .collect()
    }

    fn show(&mut self, err: &RouterDeskError) {
        match Feedback::from_error(err) {
            Feedback::Field { field, message } if D::FIELDS.iter().any(|f| f.name == field) => {
                self.errors.insert(field, message);
            }
            Feedback::Field { message, .. } | Feedback::Inline(message) => {
                self.message = Some(message);
            }
            Feedback::Banner(message) => self.banner = Some(message),
        }
    }

    /// Check, parse and store the draft.
    ///
    /// Blank required inputs and malformed values are reported without
    /// contacting the backend.
    pub async fn submit<B>(
        &mut self,
        session: &ViewSession,
        backend: &B,
        scope: &D::Scope,
    ) -> SubmitOutcome<D::Entity>
    where
        B: ConfigBackend + Sync,
    {
        self.clear_feedback();
        let missing = self.missing_fields();
        if !missing.is_empty() {
            tracing::debug!(fields = ?missing.keys().collect::<Vec<_>>(), "required fields missing");
            self.errors = missing;
            return SubmitOutcome::Rejected;
        }
        let entity = match self.draft.parse(scope) {
            Ok(entity) => entity,
            Err(errors) => {
                self.errors = errors;
                return SubmitOutcome::Rejected;
            }
        };
        let permit = match session.begin_mutation(D::entity_key(scope, &entity)) {
            Ok(permit) => permit,
            Err(err) => {
                self.show(&err);
                return SubmitOutcome::Rejected;
            }
        };
        let ticket = session.ticket();
        let result = D::save(backend, scope, self.mode, entity).await;
        drop(permit);
        if !session.is_current(ticket) {
            return SubmitOutcome::Discarded;
        }
        match result {
            Ok(entity) => {
                self.snapshot = D::from_entity(&entity);
                self.draft = self.snapshot.clone();
                SubmitOutcome::Saved {
                    entity,
                    refresh: D::refresh(scope),
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "save rejected by backend");
                self.show(&err);
                SubmitOutcome::Rejected
            }
        }
    }
}
