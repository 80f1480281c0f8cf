//! Persistence gateway for tasks.
//!
//! The gateway reports absence and missed writes as data (`None`, zero rows
//! affected); deciding whether that is an error is left to the caller.

use async_trait::async_trait;
use sqlx::PgPool;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::config::StoreKind;
use crate::models::{NewTask, Task};
use crate::{db, Config, Result};

#[async_trait]
pub trait TaskGateway: Send + Sync {
    /// All stored tasks, ordered by id
    async fn list_all(&self) -> Result<Vec<Task>>;
    /// The task with this id, if any
    async fn get_by_id(&self, id: i64) -> Result<Option<Task>>;
    /// Store a new task and return it with its generated id
    async fn insert(&self, task: &NewTask) -> Result<Task>;
    /// Overwrite the task with `task.id`. Returns the number of rows affected
    async fn update(&self, task: &Task) -> Result<u64>;
    /// Remove the task. Returns the number of rows affected
    async fn delete(&self, id: i64) -> Result<u64>;
}

/// Build the gateway selected by the configuration.
pub async fn connect(config: &Config) -> Result<Arc<dyn TaskGateway>> {
    match config.store {
        StoreKind::Postgres => {
            let pool = db::create_pool(config).await?;
            info!("Using PostgreSQL task store");
            Ok(Arc::new(PgTaskGateway::new(pool)))
        }
        StoreKind::Memory => {
            info!("Using in-memory task store");
            Ok(Arc::new(InMemoryTaskGateway::new()))
        }
    }
}

/// Gateway backed by the `tasks` table.
pub struct PgTaskGateway {
    pool: PgPool,
}

impl PgTaskGateway {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaskGateway for PgTaskGateway {
    async fn list_all(&self) -> Result<Vec<Task>> {
        let tasks = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, details, due_date, start_date, category, priority, completed
            FROM tasks
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(tasks)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            SELECT id, title, details, due_date, start_date, category, priority, completed
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn insert(&self, task: &NewTask) -> Result<Task> {
        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (title, details, due_date, start_date, category, priority, completed)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, title, details, due_date, start_date, category, priority, completed
            "#,
        )
        .bind(&task.title)
        .bind(&task.details)
        .bind(task.due_date)
        .bind(task.start_date)
        .bind(&task.category)
        .bind(&task.priority)
        .bind(task.completed)
        .fetch_one(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update(&self, task: &Task) -> Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, details = $3, due_date = $4, start_date = $5,
                category = $6, priority = $7, completed = $8
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.details)
        .bind(task.due_date)
        .bind(task.start_date)
        .bind(&task.category)
        .bind(&task.priority)
        .bind(task.completed)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[derive(Default)]
struct MemoryTable {
    last_id: i64,
    rows: BTreeMap<i64, Task>,
}

/// Process-local gateway. Ids start at 1 and are never reused.
#[derive(Default)]
pub struct InMemoryTaskGateway {
    table: RwLock<MemoryTable>,
}

impl InMemoryTaskGateway {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskGateway for InMemoryTaskGateway {
    async fn list_all(&self) -> Result<Vec<Task>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Task>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn insert(&self, task: &NewTask) -> Result<Task> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        let stored = Task::from_new(table.last_id, task.clone());
        table.rows.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(&self, task: &Task) -> Result<u64> {
        let mut table = self.table.write().await;
        match table.rows.get_mut(&task.id) {
            Some(row) => {
                *row = task.clone();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete(&self, id: i64) -> Result<u64> {
        let mut table = self.table.write().await;
        Ok(u64::from(table.rows.remove(&id).is_some()))
    }
}
