//! View-state synchronizer.
//!
//! Keeps the displayed task list in step with the remote store. Delete is
//! applied optimistically and rolled back on failure; toggle is applied only
//! after the store confirms; add prepends whatever record the store echoes.
//! Failures never propagate: they land in a single, most-recent-wins error
//! slot that only [`Synchronizer::load_all`] clears.

use crate::model::{NewTask, Task, TaskId, TaskPatch};
use crate::store::{ListOrder, StoreError, TaskStore};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

pub const FETCH_FAILED: &str = "Failed to fetch tasks.";
pub const ADD_FAILED: &str = "Failed to add task.";
pub const UPDATE_FAILED: &str = "Failed to update task.";
pub const DELETE_FAILED: &str = "Failed to delete task.";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ViewState {
    pub tasks: Vec<Task>,
    pub error: Option<String>,
    pub loading: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Blank input; nothing was sent.
    Ignored,
    Prepended(Task),
    /// The store accepted the insert without echoing the record, so the list was refetched.
    Reloaded,
    Failed,
}

pub struct Synchronizer<S> {
    store: S,
    state: Mutex<ViewState>,
}

fn failure_message(err: &StoreError, fallback: &str) -> String {
    let message = err.message();
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}

impl<S: TaskStore> Synchronizer<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            state: Mutex::new(ViewState::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state().tasks.clone()
    }

    pub fn error(&self) -> Option<String> {
        self.state().error.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state().loading
    }

    pub fn find(&self, id: &TaskId) -> Option<Task> {
        self.state().tasks.iter().find(|task| &task.id == id).cloned()
    }

    /// Replaces the local list with the full remote collection, newest first.
    pub async fn load_all(&self) -> bool {
        {
            let mut state = self.state();
            state.loading = true;
            state.error = None;
        }

        let result = self.store.list(ListOrder::newest_first()).await;

        let mut state = self.state();
        state.loading = false;
        match result {
            Ok(tasks) => {
                debug!(count = tasks.len(), "load_all: replaced local list");
                state.tasks = tasks;
                state.error = None;
                true
            }
            Err(err) => {
                warn!(status = ?err.status(), error = %err, "load_all: fetch failed");
                state.tasks.clear();
                state.error = Some(failure_message(&err, FETCH_FAILED));
                false
            }
        }
    }

    pub async fn add_task(&self, input: &str) -> AddOutcome {
        let text = input.trim();
        if text.is_empty() {
            return AddOutcome::Ignored;
        }

        match self.store.insert(&NewTask::new(text)).await {
            Ok(Some(task)) => {
                debug!(id = %task.id, "add_task: prepending created record");
                self.prepend(task.clone());
                AddOutcome::Prepended(task)
            }
            Ok(None) => {
                debug!("add_task: store returned no record, reloading");
                self.load_all().await;
                AddOutcome::Reloaded
            }
            Err(err) => {
                warn!(status = ?err.status(), error = %err, "add_task: insert failed");
                self.record_error(&err, ADD_FAILED);
                AddOutcome::Failed
            }
        }
    }

    /// Sets the flag to `!last_known` once the store confirms the update.
    pub async fn toggle_completion(&self, id: &TaskId, last_known: bool) -> bool {
        let completed = !last_known;
        match self.store.update(id, &TaskPatch { completed }).await {
            Ok(()) => {
                debug!(%id, completed, "toggle_completion: confirmed");
                self.set_completed(id, completed);
                true
            }
            Err(err) => {
                warn!(%id, status = ?err.status(), error = %err, "toggle_completion: update failed");
                self.record_error(&err, UPDATE_FAILED);
                false
            }
        }
    }

    /// Removes the record immediately; restores the pre-delete list if the store refuses.
    pub async fn delete_task(&self, id: &TaskId) -> bool {
        let snapshot = self.remove(id);

        match self.store.delete(id).await {
            Ok(()) => {
                debug!(%id, "delete_task: confirmed");
                true
            }
            Err(err) => {
                warn!(
                    %id,
                    status = ?err.status(),
                    error = %err,
                    "delete_task: delete failed, restoring list"
                );
                let mut state = self.state();
                state.tasks = snapshot;
                state.error = Some(failure_message(&err, DELETE_FAILED));
                false
            }
        }
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record_error(&self, err: &StoreError, fallback: &str) {
        self.state().error = Some(failure_message(err, fallback));
    }

    fn prepend(&self, task: Task) {
        let mut state = self.state();
        state.tasks.retain(|existing| existing.id != task.id);
        state.tasks.insert(0, task);
    }

    fn set_completed(&self, id: &TaskId, completed: bool) {
        let mut state = self.state();
        for task in state.tasks.iter_mut().filter(|task| &task.id == id) {
            task.completed = completed;
        }
    }

    fn remove(&self, id: &TaskId) -> Vec<Task> {
        let mut state = self.state();
        let snapshot = state.tasks.clone();
        state.tasks.retain(|task| &task.id != id);
        snapshot
    }
}
