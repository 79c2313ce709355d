use std::sync::Arc;

use anyhow::Result;
use chrono::NaiveDate;
use shared::domain::{NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch};
use tokio::sync::RwLock;
use tracing::warn;

use crate::{store::WorkOrderStore, view::WorkOrderStats};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ControllerSnapshot {
    pub work_orders: Vec<WorkOrder>,
    pub is_loading: bool,
    pub error: Option<String>,
}

/// Front door for presentation code.
///
/// Holds the last-known-good collection. A failed operation leaves that
/// collection alone, records its message in `error`, and still returns the
/// error to the caller. Overlapping calls are last-write-wins.
pub struct WorkOrderController {
    store: Arc<dyn WorkOrderStore>,
    state: RwLock<ControllerSnapshot>,
}

impl WorkOrderController {
    pub fn new(store: Arc<dyn WorkOrderStore>) -> Self {
        Self {
            store,
            state: RwLock::new(ControllerSnapshot::default()),
        }
    }

    pub async fn snapshot(&self) -> ControllerSnapshot {
        self.state.read().await.clone()
    }

    pub async fn work_orders(&self) -> Vec<WorkOrder> {
        self.state.read().await.work_orders.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state.read().await.is_loading
    }

    pub async fn error(&self) -> Option<String> {
        self.state.read().await.error.clone()
    }

    pub async fn stats(&self, today: NaiveDate) -> WorkOrderStats {
        WorkOrderStats::from_orders(&self.state.read().await.work_orders, today)
    }

    pub async fn refresh(&self) -> Result<Vec<WorkOrder>> {
        self.state.write().await.is_loading = true;
        let result = self.store.list().await;

        let mut state = self.state.write().await;
        state.is_loading = false;
        match result {
            Ok(orders) => {
                state.work_orders = orders.clone();
                state.error = None;
                Ok(orders)
            }
            Err(err) => Err(record(&mut state, "refresh", err)),
        }
    }

    pub async fn create(&self, new: NewWorkOrder) -> Result<WorkOrder> {
        let result = self.store.create(new).await;

        let mut state = self.state.write().await;
        match result {
            Ok(created) => {
                state.work_orders.push(created.clone());
                state.error = None;
                Ok(created)
            }
            Err(err) => Err(record(&mut state, "create", err)),
        }
    }

    pub async fn update(
        &self,
        id: &WorkOrderId,
        patch: WorkOrderPatch,
    ) -> Result<Option<WorkOrder>> {
        let result = self.store.update(id, patch).await;

        let mut state = self.state.write().await;
        match result {
            Ok(Some(updated)) => {
                if let Some(slot) = state.work_orders.iter_mut().find(|o| o.id == updated.id) {
                    *slot = updated.clone();
                }
                state.error = None;
                Ok(Some(updated))
            }
            Ok(None) => {
                state.error = None;
                Ok(None)
            }
            Err(err) => Err(record(&mut state, "update", err)),
        }
    }

    pub async fn delete(&self, id: &WorkOrderId) -> Result<bool> {
        let result = self.store.delete(id).await;

        let mut state = self.state.write().await;
        match result {
            Ok(removed) => {
                state.work_orders.retain(|order| &order.id != id);
                state.error = None;
                Ok(removed)
            }
            Err(err) => Err(record(&mut state, "delete", err)),
        }
    }
}

fn record(state: &mut ControllerSnapshot, operation: &str, err: anyhow::Error) -> anyhow::Error {
    warn!(operation, error = %err, "work order operation failed");
    state.error = Some(err.to_string());
    err
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
