//! Remote task collection seam.
//!
//! The synchronizer only talks to a [`TaskStore`]; every call yields exactly
//! one outcome, a payload or a [`StoreError`].

use crate::model::{NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod rest;

pub use memory::{MemoryStore, StoreOp};
pub use rest::RestStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl StoreError {
    /// Human-readable reason, empty when the backend gave none.
    pub fn message(&self) -> String {
        match self {
            StoreError::Api { message, .. } => message.trim().to_string(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            StoreError::Api { status, .. } => Some(*status),
            StoreError::Network(err) => err.status().map(|status| status.as_u16()),
            StoreError::InvalidResponse(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListOrder {
    pub column: &'static str,
    pub direction: SortDirection,
}

impl ListOrder {
    pub fn newest_first() -> Self {
        Self {
            column: "created_at",
            direction: SortDirection::Descending,
        }
    }

    /// Query-string form, e.g. `created_at.desc`.
    pub fn to_query(&self) -> String {
        let direction = match self.direction {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        };
        format!("{}.{}", self.column, direction)
    }
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn list(&self, order: ListOrder) -> Result<Vec<Task>, StoreError>;

    /// Returns the created record when the backend echoes it back.
    async fn insert(&self, task: &NewTask) -> Result<Option<Task>, StoreError>;

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StoreError>;

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError>;
}
