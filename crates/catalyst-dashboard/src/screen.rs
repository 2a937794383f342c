//! Record list screen controller
//!
//! One [`RecordScreen`] drives the list, the detail drawer and optimistic
//! status edits for a single resource. It is parameterised by a
//! [`ResourceDescriptor`]; claims and uploads share this controller.
//!
//! State lives behind a `parking_lot::RwLock` that is never held across an
//! await, so reads stay available while a fetch or save is in flight. Every
//! in-flight operation races the screen's cancellation token; once the screen
//! is unmounted, late results are dropped without touching state.
//!
//! Saves on one screen run one at a time. A rollback restores the list as it
//! was when that save started, so a later save only snapshots once the
//! earlier one has settled.

use crate::notify::{Notifier, SAVE_FAILED_MESSAGE, SAVED_MESSAGE, SAVING_MESSAGE};
use catalyst_client::{ListQuery, RecordApi, TokenProvider};
use catalyst_core::{
    Comment, Error, FieldChanges, Record, RecordId, ResourceDescriptor, Result,
    StatusHistoryEntry,
};
use parking_lot::RwLock;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Lifecycle state of a screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ScreenState {
    /// Collection fetch in flight
    Loading,
    /// List shown, no detail open
    Ready,
    /// A record's detail drawer is open
    DetailOpen,
}

/// Everything a screen renders
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScreenModel {
    /// Lifecycle state
    pub state: ScreenState,
    /// Current list
    pub records: Vec<Record>,
    /// Record shown in the detail drawer
    pub detail: Option<Record>,
    /// Status history of the detail record
    pub history: Vec<StatusHistoryEntry>,
    /// Comments on the detail record
    pub comments: Vec<Comment>,
    /// Error banner
    pub error: Option<String>,
}

impl Default for ScreenModel {
    fn default() -> Self {
        Self {
            state: ScreenState::Loading,
            records: Vec::new(),
            detail: None,
            history: Vec::new(),
            comments: Vec::new(),
            error: None,
        }
    }
}

impl ScreenModel {
    /// Look up a listed record
    #[must_use]
    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    fn close_detail(&mut self) {
        self.detail = None;
        self.history.clear();
        self.comments.clear();
        if self.state == ScreenState::DetailOpen {
            self.state = ScreenState::Ready;
        }
    }
}

/// Why a save was not attempted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// Nothing to send
    EmptyChanges,
    /// The id is not in the current list
    UnknownRecord(RecordId),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyChanges => write!(f, "no fields changed"),
            Self::UnknownRecord(id) => write!(f, "record {id} is not in the current list"),
        }
    }
}

/// Result of an optimistic save
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The backend accepted the change; the local edit stands
    Saved,
    /// The backend rejected the change; the list was restored
    RolledBack(String),
    /// Nothing was changed or sent
    Skipped(SkipReason),
}

impl SaveOutcome {
    /// Whether the change is now confirmed
    #[must_use]
    pub const fn is_saved(&self) -> bool {
        matches!(self, Self::Saved)
    }
}

/// Controller for one resource's list/detail screen
pub struct RecordScreen {
    api: RecordApi,
    tokens: Arc<dyn TokenProvider>,
    notifier: Arc<dyn Notifier>,
    model: RwLock<ScreenModel>,
    saving: tokio::sync::Mutex<()>,
    cancel: CancellationToken,
}

impl fmt::Debug for RecordScreen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RecordScreen")
            .field("resource", &self.api.descriptor().name)
            .field("state", &self.model.read().state)
            .field("mounted", &self.is_mounted())
            .finish_non_exhaustive()
    }
}

impl RecordScreen {
    /// Create a screen; call [`RecordScreen::load`] to mount it
    #[must_use]
    pub fn new(
        api: RecordApi,
        tokens: Arc<dyn TokenProvider>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            api,
            tokens,
            notifier,
            model: RwLock::new(ScreenModel::default()),
            saving: tokio::sync::Mutex::new(()),
            cancel: CancellationToken::new(),
        }
    }

    /// Resource this screen shows
    #[must_use]
    pub const fn descriptor(&self) -> &ResourceDescriptor {
        self.api.descriptor()
    }

    /// Copy of the current model
    #[must_use]
    pub fn snapshot(&self) -> ScreenModel {
        self.model.read().clone()
    }

    /// Whether [`RecordScreen::unmount`] has not been called yet
    #[must_use]
    pub fn is_mounted(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Tear the screen down, abandoning in-flight operations
    pub fn unmount(&self) {
        debug!(resource = %self.descriptor().name, "Unmounting screen");
        self.cancel.cancel();
    }

    /// Mount: fetch the collection
    ///
    /// On failure the list is emptied, the error banner is set and the screen
    /// still ends up `Ready`.
    pub async fn load(&self) -> Result<()> {
        self.load_filtered(&ListQuery::new()).await
    }

    /// Mount with collection filters
    #[instrument(skip(self), fields(resource = %self.descriptor().name))]
    pub async fn load_filtered(&self, query: &ListQuery) -> Result<()> {
        self.ensure_mounted()?;
        {
            let mut model = self.model.write();
            model.state = ScreenState::Loading;
            model.error = None;
            model.close_detail();
        }

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.list_filtered(&token, query).await
            })
            .await;
        self.ensure_mounted()?;

        let mut model = self.model.write();
        model.state = ScreenState::Ready;
        match result {
            Ok(records) => {
                debug!(count = records.len(), "Records loaded");
                model.records = records;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load records");
                model.records.clear();
                model.error = Some(format!("Failed to load {}: {e}", self.descriptor().title));
                Err(e)
            }
        }
    }

    /// Re-fetch the collection, keeping the detail drawer as it is
    ///
    /// On failure the previous list is kept and the error banner is set.
    #[instrument(skip(self), fields(resource = %self.descriptor().name))]
    pub async fn refresh(&self) -> Result<()> {
        self.ensure_mounted()?;

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.list(&token).await
            })
            .await;
        self.ensure_mounted()?;

        let mut model = self.model.write();
        if model.state == ScreenState::Loading {
            model.state = ScreenState::Ready;
        }
        match result {
            Ok(records) => {
                model.records = records;
                model.error = None;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to refresh records");
                model.error = Some(format!("Failed to refresh {}: {e}", self.descriptor().title));
                Err(e)
            }
        }
    }

    /// Open the detail drawer for a record
    ///
    /// On failure no detail is shown and the screen stays `Ready`.
    #[instrument(skip(self), fields(resource = %self.descriptor().name))]
    pub async fn select(&self, id: RecordId) -> Result<()> {
        self.ensure_mounted()?;

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.get(&token, id).await
            })
            .await;
        self.ensure_mounted()?;

        let mut model = self.model.write();
        model.close_detail();
        match result {
            Ok(record) => {
                model.detail = Some(record);
                model.state = ScreenState::DetailOpen;
                model.error = None;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load record detail");
                model.state = ScreenState::Ready;
                model.error = Some(format!(
                    "Failed to load {} {id}: {e}",
                    self.descriptor().singular
                ));
                Err(e)
            }
        }
    }

    /// Close the detail drawer
    pub fn close_detail(&self) {
        self.model.write().close_detail();
    }

    /// Optimistically apply `changes` to record `id` and persist them
    ///
    /// The list is updated and the drawer closed before the request is sent.
    /// If the write fails (including token acquisition) the list is restored
    /// to exactly what it was before the edit and the drawer stays closed.
    ///
    /// Empty changes or an id missing from the list are skipped with a
    /// warning and change nothing. A save started while another is in flight
    /// waits for it to settle before applying its own edit.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Cancelled`] if the screen is or becomes unmounted.
    /// Backend failures are reported as [`SaveOutcome::RolledBack`].
    #[instrument(skip(self, changes), fields(resource = %self.descriptor().name))]
    pub async fn save(&self, id: RecordId, changes: FieldChanges) -> Result<SaveOutcome> {
        self.ensure_mounted()?;

        if changes.is_empty() {
            let reason = SkipReason::EmptyChanges;
            warn!(%reason, "Skipping save");
            return Ok(SaveOutcome::Skipped(reason));
        }

        let _in_flight = self.guarded(async { Ok(self.saving.lock().await) }).await?;

        let snapshot = {
            let mut model = self.model.write();
            let before = model.records.clone();
            let Some(record) = model.records.iter_mut().find(|r| r.id == id) else {
                let reason = SkipReason::UnknownRecord(id);
                warn!(%reason, "Skipping save");
                return Ok(SaveOutcome::Skipped(reason));
            };

            record.apply(&changes);
            model.close_detail();
            before
        };

        let toast = self.notifier.loading(SAVING_MESSAGE);

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.update(&token, id, &changes).await
            })
            .await;

        if !self.is_mounted() {
            self.notifier.dismiss(toast);
            return Err(Error::Cancelled);
        }

        match result {
            Ok(_) => {
                info!(id, fields = ?changes.keys().collect::<Vec<_>>(), "Record updated");
                self.notifier.success(SAVED_MESSAGE, Some(toast));
                Ok(SaveOutcome::Saved)
            }
            Err(e) => {
                error!(id, error = %e, "Failed to save record, rolling back");
                self.model.write().records = snapshot;
                self.notifier.error(SAVE_FAILED_MESSAGE, Some(toast));
                Ok(SaveOutcome::RolledBack(e.to_string()))
            }
        }
    }

    /// Optimistically set one editable field
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `key` is not an editable field of this
    /// resource or `value` is not one of its allowed options.
    pub async fn set_field(&self, id: RecordId, key: &str, value: Value) -> Result<SaveOutcome> {
        let Some(field) = self.descriptor().status_field(key) else {
            return Err(Error::Validation {
                field: key.to_string(),
                message: format!("not an editable field of {}", self.descriptor().name),
            });
        };

        if !field.options.is_empty() {
            let allowed = value
                .as_str()
                .is_some_and(|v| field.options.iter().any(|o| o == v));
            if !allowed {
                return Err(Error::Validation {
                    field: key.to_string(),
                    message: format!("must be one of: {}", field.options.join(", ")),
                });
            }
        }

        let mut changes = FieldChanges::new();
        changes.insert(key.to_string(), value);
        self.save(id, changes).await
    }

    /// Fetch the status history of a record into the model
    #[instrument(skip(self), fields(resource = %self.descriptor().name))]
    pub async fn load_history(&self, id: RecordId) -> Result<()> {
        self.ensure_mounted()?;

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.history(&token, id).await
            })
            .await;
        self.ensure_mounted()?;

        let mut model = self.model.write();
        match result {
            Ok(entries) => {
                model.history = entries;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load status history");
                model.history.clear();
                model.error = Some(format!("Failed to load status history: {e}"));
                Err(e)
            }
        }
    }

    /// Fetch the comments of a record into the model
    #[instrument(skip(self), fields(resource = %self.descriptor().name))]
    pub async fn load_comments(&self, id: RecordId) -> Result<()> {
        self.ensure_mounted()?;

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.comments(&token, id).await
            })
            .await;
        self.ensure_mounted()?;

        let mut model = self.model.write();
        match result {
            Ok(comments) => {
                model.comments = comments;
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Failed to load comments");
                model.comments.clear();
                model.error = Some(format!("Failed to load comments: {e}"));
                Err(e)
            }
        }
    }

    /// Post a comment and show it
    #[instrument(skip(self, text), fields(resource = %self.descriptor().name))]
    pub async fn add_comment(&self, id: RecordId, text: &str) -> Result<()> {
        self.ensure_mounted()?;

        let result = self
            .guarded(async {
                let token = self.tokens.acquire_token().await?;
                self.api.add_comment(&token, id, text).await
            })
            .await;
        self.ensure_mounted()?;

        match result {
            Ok(Some(comment)) => {
                self.model.write().comments.push(comment);
                self.notifier.success("Comment added.", None);
                Ok(())
            }
            Ok(None) => {
                self.notifier.success("Comment added.", None);
                self.load_comments(id).await
            }
            Err(e) => {
                error!(error = %e, "Failed to add comment");
                self.notifier.error("Failed to add comment.", None);
                Err(e)
            }
        }
    }

    fn ensure_mounted(&self) -> Result<()> {
        if self.is_mounted() {
            Ok(())
        } else {
            Err(Error::Cancelled)
        }
    }

    async fn guarded<T>(&self, operation: impl Future<Output = Result<T>>) -> Result<T> {
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(Error::Cancelled),
            result = operation => result,
        }
    }
}
