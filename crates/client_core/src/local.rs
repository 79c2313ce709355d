use anyhow::Result;
use async_trait::async_trait;
use shared::domain::{NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch};
use storage::Storage;

use crate::store::WorkOrderStore;

/// Offline use against a SQLite file, without a server in between.
#[async_trait]
impl WorkOrderStore for Storage {
    async fn list(&self) -> Result<Vec<WorkOrder>> {
        self.list_work_orders().await
    }

    async fn create(&self, new: NewWorkOrder) -> Result<WorkOrder> {
        self.insert_work_order(&new).await
    }

    async fn update(&self, id: &WorkOrderId, patch: WorkOrderPatch) -> Result<Option<WorkOrder>> {
        self.update_work_order(id, patch).await
    }

    async fn delete(&self, id: &WorkOrderId) -> Result<bool> {
        self.delete_work_order(id).await
    }
}
