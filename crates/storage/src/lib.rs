use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow},
    Pool, Row, Sqlite,
};
use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};
use tracing::debug;

use shared::domain::{
    demo_work_orders, NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch, WorkOrderPriority,
    WorkOrderStatus,
};

const WORK_ORDER_COLUMNS: &str =
    "id, title, description, status, priority, assignee, due_date, created_at";

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    /// Waits for checked-out connections and closes the pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    pub async fn list_work_orders(&self) -> Result<Vec<WorkOrder>> {
        let rows = sqlx::query(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders ORDER BY id ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .context("failed to list work orders")?;
        rows.iter().map(work_order_from_row).collect()
    }

    pub async fn get_work_order(&self, id: &WorkOrderId) -> Result<Option<WorkOrder>> {
        let Some(row_id) = id.numeric() else {
            return Ok(None);
        };
        let row = sqlx::query(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE id = ?"
        ))
        .bind(row_id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(work_order_from_row).transpose()
    }

    pub async fn count_work_orders(&self) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM work_orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn insert_work_order(&self, new: &NewWorkOrder) -> Result<WorkOrder> {
        let created_at = Utc::now();
        let rec = sqlx::query(
            "INSERT INTO work_orders (title, description, status, priority, assignee, due_date, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)
             RETURNING id",
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(new.status.as_str())
        .bind(new.priority.as_str())
        .bind(new.assignee.as_deref())
        .bind(new.due_date)
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .context("failed to insert work order")?;

        let id = WorkOrderId::from(rec.get::<i64, _>(0));
        debug!(%id, "inserted work order");
        Ok(WorkOrder::from_new(id, new.clone(), created_at))
    }

    /// Read-merge-write inside one transaction. `None` when the id is unknown.
    pub async fn update_work_order(
        &self,
        id: &WorkOrderId,
        patch: WorkOrderPatch,
    ) -> Result<Option<WorkOrder>> {
        let Some(row_id) = id.numeric() else {
            return Ok(None);
        };

        let mut tx = self.pool.begin().await?;
        let row = sqlx::query(&format!(
            "SELECT {WORK_ORDER_COLUMNS} FROM work_orders WHERE id = ?"
        ))
        .bind(row_id)
        .fetch_optional(&mut *tx)
        .await?;
        let Some(row) = row else {
            return Ok(None);
        };

        let mut work_order = work_order_from_row(&row)?;
        work_order.apply(patch);

        sqlx::query(
            "UPDATE work_orders
             SET title = ?, description = ?, status = ?, priority = ?, assignee = ?, due_date = ?
             WHERE id = ?",
        )
        .bind(&work_order.title)
        .bind(&work_order.description)
        .bind(work_order.status.as_str())
        .bind(work_order.priority.as_str())
        .bind(work_order.assignee.as_deref())
        .bind(work_order.due_date)
        .bind(row_id)
        .execute(&mut *tx)
        .await
        .context("failed to update work order")?;
        tx.commit().await?;

        debug!(%id, "updated work order");
        Ok(Some(work_order))
    }

    pub async fn delete_work_order(&self, id: &WorkOrderId) -> Result<bool> {
        let Some(row_id) = id.numeric() else {
            return Ok(false);
        };
        let result = sqlx::query("DELETE FROM work_orders WHERE id = ?")
            .bind(row_id)
            .execute(&self.pool)
            .await
            .context("failed to delete work order")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_work_orders(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM work_orders")
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Inserts the demo orders, but only into an empty table. Returns how many were added.
    pub async fn seed_demo_work_orders(&self) -> Result<usize> {
        if self.count_work_orders().await? > 0 {
            return Ok(0);
        }
        let demo = demo_work_orders();
        for new in &demo {
            self.insert_work_order(new).await?;
        }
        Ok(demo.len())
    }
}

fn work_order_from_row(row: &SqliteRow) -> Result<WorkOrder> {
    let status: String = row.try_get("status")?;
    let priority: String = row.try_get("priority")?;
    Ok(WorkOrder {
        id: WorkOrderId::from(row.try_get::<i64, _>("id")?),
        title: row.try_get("title")?,
        description: row.try_get("description")?,
        status: WorkOrderStatus::from_str(&status)?,
        priority: WorkOrderPriority::from_str(&priority)?,
        assignee: row.try_get("assignee")?,
        due_date: row.try_get::<Option<NaiveDate>, _>("due_date")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
