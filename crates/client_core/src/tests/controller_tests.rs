use super::*;
use crate::store::InMemoryWorkOrderStore;
use shared::domain::WorkOrderStatus;
use std::time::Duration;

fn controller_over(store: Arc<InMemoryWorkOrderStore>) -> WorkOrderController {
    WorkOrderController::new(store)
}

fn seeded() -> (Arc<InMemoryWorkOrderStore>, WorkOrderController) {
    let store = Arc::new(InMemoryWorkOrderStore::new().with_latency(Duration::ZERO));
    (store.clone(), controller_over(store))
}

#[tokio::test]
async fn refresh_populates_collection() {
    let (_store, controller) = seeded();
    assert!(controller.work_orders().await.is_empty());

    let orders = controller.refresh().await.expect("refresh");
    assert_eq!(orders.len(), 3);

    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.work_orders, orders);
    assert!(!snapshot.is_loading);
    assert!(snapshot.error.is_none());
}

#[tokio::test(start_paused = true)]
async fn is_loading_while_first_fetch_is_pending() {
    let store = Arc::new(InMemoryWorkOrderStore::new());
    let controller = Arc::new(controller_over(store));

    let background = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.refresh().await })
    };
    tokio::task::yield_now().await;
    assert!(controller.is_loading().await);

    background.await.expect("join").expect("refresh");
    assert!(!controller.is_loading().await);
    assert_eq!(controller.work_orders().await.len(), 3);
}

#[tokio::test]
async fn mutations_keep_cache_in_step_with_store() {
    let (store, controller) = seeded();
    controller.refresh().await.expect("refresh");

    let created = controller
        .create(NewWorkOrder::titled("Fire pump test"))
        .await
        .expect("create");
    controller
        .update(
            &created.id,
            WorkOrderPatch {
                status: Some(WorkOrderStatus::InProgress),
                ..Default::default()
            },
        )
        .await
        .expect("update")
        .expect("found");
    assert!(controller
        .delete(&WorkOrderId::from("1"))
        .await
        .expect("delete"));

    let cached = controller.work_orders().await;
    assert_eq!(cached, store.list().await.expect("list"));
    let last = cached.last().expect("created order");
    assert_eq!(last.status, WorkOrderStatus::InProgress);
}

#[tokio::test]
async fn failure_is_recorded_and_returned_while_cache_is_kept() {
    let (store, controller) = seeded();
    let before = controller.refresh().await.expect("refresh");

    store.fail_next("network down").await;
    let err = controller
        .create(NewWorkOrder::titled("lost"))
        .await
        .expect_err("failure propagates");
    assert_eq!(err.to_string(), "network down");
    assert_eq!(controller.error().await.as_deref(), Some("network down"));
    assert_eq!(controller.work_orders().await, before);

    store.fail_next("still down").await;
    controller
        .delete(&WorkOrderId::from("1"))
        .await
        .expect_err("failure propagates");
    assert_eq!(controller.work_orders().await, before);
    assert_eq!(controller.error().await.as_deref(), Some("still down"));

    controller.refresh().await.expect("refresh");
    assert!(controller.error().await.is_none());
}

#[tokio::test]
async fn unknown_ids_are_reported_not_errors() {
    let (_store, controller) = seeded();
    controller.refresh().await.expect("refresh");
    let missing = WorkOrderId::from("99");

    assert!(controller
        .update(&missing, WorkOrderPatch::default())
        .await
        .expect("update")
        .is_none());
    assert!(!controller.delete(&missing).await.expect("delete"));
    assert!(controller.error().await.is_none());
    assert_eq!(controller.work_orders().await.len(), 3);
}

#[tokio::test]
async fn stats_count_cached_orders() {
    let (_store, controller) = seeded();
    controller.refresh().await.expect("refresh");
    let today = NaiveDate::from_ymd_opt(2024, 2, 12).expect("date");

    let stats = controller.stats(today).await;
    assert_eq!(stats.total, 3);
    assert_eq!(stats.pending, 1);
    assert_eq!(stats.in_progress, 1);
    assert_eq!(stats.completed, 1);
    assert_eq!(stats.high_priority, 1);
    assert_eq!(stats.overdue, 1);
}
