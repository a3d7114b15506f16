use super::{ListOrder, SortDirection, StoreError, TaskStore};
use crate::model::{NewTask, Task, TaskId, TaskPatch};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use time::{Duration, OffsetDateTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    List,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Inner {
    tasks: Vec<Task>,
    next_id: u64,
    failures: HashMap<StoreOp, String>,
    calls: HashMap<StoreOp, usize>,
    omit_inserted: bool,
}

/// In-process [`TaskStore`] with scripted failures. Used to exercise the
/// synchronizer without a backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: Vec<Task>) -> Self {
        let next_id = tasks
            .iter()
            .filter_map(|task| task.id.as_str().parse::<u64>().ok())
            .max()
            .unwrap_or(0);
        Self {
            inner: Mutex::new(Inner {
                tasks,
                next_id,
                ..Inner::default()
            }),
        }
    }

    /// Makes every later call of `op` fail with `message` until [`recover`](Self::recover).
    pub fn fail<M: Into<String>>(&self, op: StoreOp, message: M) {
        self.lock().failures.insert(op, message.into());
    }

    pub fn recover(&self, op: StoreOp) {
        self.lock().failures.remove(&op);
    }

    /// Inserts succeed but echo no record back.
    pub fn omit_inserted_records(&self, omit: bool) {
        self.lock().omit_inserted = omit;
    }

    pub fn calls(&self, op: StoreOp) -> usize {
        self.lock().calls.get(&op).copied().unwrap_or(0)
    }

    pub fn records(&self) -> Vec<Task> {
        self.lock().tasks.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn begin(&self, op: StoreOp) -> Result<MutexGuard<'_, Inner>, StoreError> {
        let mut inner = self.lock();
        *inner.calls.entry(op).or_insert(0) += 1;
        if let Some(message) = inner.failures.get(&op) {
            return Err(StoreError::Api {
                status: 503,
                message: message.clone(),
            });
        }
        Ok(inner)
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn list(&self, order: ListOrder) -> Result<Vec<Task>, StoreError> {
        let inner = self.begin(StoreOp::List)?;
        let mut tasks = inner.tasks.clone();
        tasks.sort_by_key(|task| task.created_at);
        if order.direction == SortDirection::Descending {
            tasks.reverse();
        }
        Ok(tasks)
    }

    async fn insert(&self, task: &NewTask) -> Result<Option<Task>, StoreError> {
        let mut inner = self.begin(StoreOp::Insert)?;
        inner.next_id += 1;

        let now = OffsetDateTime::now_utc();
        let created_at = inner
            .tasks
            .iter()
            .map(|existing| existing.created_at + Duration::nanoseconds(1))
            .fold(now, OffsetDateTime::max);
        let created = Task {
            id: TaskId::from(inner.next_id),
            text: task.text.clone(),
            completed: false,
            created_at,
        };
        inner.tasks.push(created.clone());

        if inner.omit_inserted {
            Ok(None)
        } else {
            Ok(Some(created))
        }
    }

    async fn update(&self, id: &TaskId, patch: &TaskPatch) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::Update)?;
        for task in inner.tasks.iter_mut().filter(|task| &task.id == id) {
            task.completed = patch.completed;
        }
        Ok(())
    }

    async fn delete(&self, id: &TaskId) -> Result<(), StoreError> {
        let mut inner = self.begin(StoreOp::Delete)?;
        inner.tasks.retain(|task| &task.id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{MemoryStore, StoreOp};
    use crate::model::{NewTask, Task, TaskId, TaskPatch};
    use crate::store::{ListOrder, StoreError, TaskStore};
    use time::macros::datetime;

    fn seeded() -> MemoryStore {
        MemoryStore::with_tasks(vec![
            Task {
                id: TaskId::from(1u64),
                text: "older".into(),
                completed: false,
                created_at: datetime!(2025-12-20 08:00 UTC),
            },
            Task {
                id: TaskId::from(2u64),
                text: "newer".into(),
                completed: false,
                created_at: datetime!(2025-12-20 09:00 UTC),
            },
        ])
    }

    #[tokio::test]
    async fn list_orders_newest_first() {
        let store = seeded();
        let tasks = store.list(ListOrder::newest_first()).await.unwrap();
        let ids: Vec<_> = tasks.iter().map(|task| task.id.to_string()).collect();
        assert_eq!(ids, ["2", "1"]);
    }

    #[tokio::test]
    async fn insert_assigns_fresh_id_and_latest_timestamp() {
        let store = seeded();
        let created = store
            .insert(&NewTask::new("third"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(created.id, TaskId::from(3u64));
        assert!(!created.completed);
        let tasks = store.list(ListOrder::newest_first()).await.unwrap();
        assert_eq!(tasks[0].id, created.id);
    }

    #[tokio::test]
    async fn scripted_failures_count_calls_and_can_recover() {
        let store = seeded();
        store.fail(StoreOp::Update, "row is locked");

        let err = store
            .update(&TaskId::from(1u64), &TaskPatch { completed: true })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Api { status: 503, .. }));
        assert_eq!(err.message(), "row is locked");

        store.recover(StoreOp::Update);
        store
            .update(&TaskId::from(1u64), &TaskPatch { completed: true })
            .await
            .unwrap();

        assert_eq!(store.calls(StoreOp::Update), 2);
        assert!(store.records().iter().any(|task| task.completed));
    }

    #[tokio::test]
    async fn omitted_insert_still_persists() {
        let store = MemoryStore::new();
        store.omit_inserted_records(true);

        assert!(store.insert(&NewTask::new("x")).await.unwrap().is_none());
        assert_eq!(store.records().len(), 1);
    }
}
