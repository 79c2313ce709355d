use shared::domain::{NewWorkOrder, WorkOrderId, WorkOrderPatch, WorkOrderStatus};
use storage::Storage;

#[tokio::test]
async fn work_orders_survive_reopening_the_database_file() {
    let temp_root = tempfile::tempdir().expect("tempdir");
    let db_path = temp_root.path().join("workorders.db");
    let database_url = format!("sqlite://{}", db_path.to_string_lossy().replace('\\', "/"));

    let created_id: WorkOrderId = {
        let storage = Storage::new(&database_url).await.expect("db");
        storage.seed_demo_work_orders().await.expect("seed");
        let created = storage
            .insert_work_order(&NewWorkOrder::titled("Sump pump alarm"))
            .await
            .expect("insert");
        storage
            .update_work_order(
                &created.id,
                WorkOrderPatch {
                    status: Some(WorkOrderStatus::Completed),
                    ..Default::default()
                },
            )
            .await
            .expect("update")
            .expect("found");
        storage.close().await;
        created.id
    };

    let reopened = Storage::new(&database_url).await.expect("reopen");
    let orders = reopened.list_work_orders().await.expect("list");
    assert_eq!(orders.len(), 4);

    let reloaded = reopened
        .get_work_order(&created_id)
        .await
        .expect("get")
        .expect("present after reopen");
    assert_eq!(reloaded.title, "Sump pump alarm");
    assert_eq!(reloaded.status, WorkOrderStatus::Completed);

    assert_eq!(reopened.seed_demo_work_orders().await.expect("seed"), 0);
}
