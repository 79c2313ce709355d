use shared::{
    domain::{NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch},
    error::ApiError,
};
use storage::Storage;
use tracing::info;

#[derive(Clone)]
pub struct ApiContext {
    pub storage: Storage,
}

pub async fn list_work_orders(ctx: &ApiContext) -> Result<Vec<WorkOrder>, ApiError> {
    ctx.storage.list_work_orders().await.map_err(internal)
}

pub async fn get_work_order(ctx: &ApiContext, id: &WorkOrderId) -> Result<WorkOrder, ApiError> {
    ctx.storage
        .get_work_order(id)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))
}

pub async fn create_work_order(
    ctx: &ApiContext,
    mut new: NewWorkOrder,
) -> Result<WorkOrder, ApiError> {
    new.title = new.title.trim().to_string();
    let created = ctx
        .storage
        .insert_work_order(&new)
        .await
        .map_err(internal)?;
    info!(id = %created.id, title = %created.title, "work order created");
    Ok(created)
}

pub async fn update_work_order(
    ctx: &ApiContext,
    id: &WorkOrderId,
    mut patch: WorkOrderPatch,
) -> Result<WorkOrder, ApiError> {
    if let Some(title) = patch.title.as_mut() {
        *title = title.trim().to_string();
    }
    let updated = ctx
        .storage
        .update_work_order(id, patch)
        .await
        .map_err(internal)?
        .ok_or_else(|| not_found(id))?;
    info!(%id, status = %updated.status, "work order updated");
    Ok(updated)
}

pub async fn delete_work_order(ctx: &ApiContext, id: &WorkOrderId) -> Result<(), ApiError> {
    let removed = ctx
        .storage
        .delete_work_order(id)
        .await
        .map_err(internal)?;
    if !removed {
        return Err(not_found(id));
    }
    info!(%id, "work order deleted");
    Ok(())
}

fn not_found(id: &WorkOrderId) -> ApiError {
    ApiError::not_found(format!("work order {id} not found"))
}

fn internal(err: anyhow::Error) -> ApiError {
    ApiError::internal(err.to_string())
}
