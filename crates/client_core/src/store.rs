use std::time::Duration;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{TimeDelta, Utc};
use shared::domain::{demo_work_orders, NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::StoreError;

/// How long the in-memory store pretends the first fetch takes.
pub const DEFAULT_SIMULATED_LATENCY: Duration = Duration::from_secs(1);

/// CRUD seam between consumers and whatever holds the work orders.
///
/// `update` yields `None` and `delete` yields `false` when no work order has
/// the given id; the collection is left untouched in both cases.
#[async_trait]
pub trait WorkOrderStore: Send + Sync {
    async fn list(&self) -> Result<Vec<WorkOrder>>;
    async fn create(&self, new: NewWorkOrder) -> Result<WorkOrder>;
    async fn update(&self, id: &WorkOrderId, patch: WorkOrderPatch) -> Result<Option<WorkOrder>>;
    async fn delete(&self, id: &WorkOrderId) -> Result<bool>;
}

pub struct InMemoryWorkOrderStore {
    state: Mutex<InMemoryState>,
    latency: Duration,
}

struct InMemoryState {
    orders: Vec<WorkOrder>,
    last_id: i64,
    loaded: bool,
    fail_next: Option<String>,
}

impl InMemoryState {
    fn take_failure(&mut self) -> Result<()> {
        match self.fail_next.take() {
            Some(message) => Err(StoreError::Injected(message).into()),
            None => Ok(()),
        }
    }

    fn next_id(&mut self) -> Result<WorkOrderId> {
        self.last_id = self
            .last_id
            .checked_add(1)
            .ok_or_else(|| anyhow!("work order ids exhausted after {}", self.last_id))?;
        Ok(WorkOrderId::from(self.last_id))
    }
}

impl InMemoryWorkOrderStore {
    /// Seeded with the three demo orders (ids `1`, `2`, `3`).
    pub fn new() -> Self {
        let now = Utc::now();
        let orders = demo_work_orders()
            .into_iter()
            .zip(1_i64..)
            .map(|(new, n)| {
                WorkOrder::from_new(WorkOrderId::from(n), new, now - TimeDelta::days(30 - n))
            })
            .collect();
        Self::with_orders(orders)
    }

    pub fn empty() -> Self {
        Self::with_orders(Vec::new())
    }

    pub fn with_orders(orders: Vec<WorkOrder>) -> Self {
        let last_id = orders
            .iter()
            .filter_map(|order| order.id.numeric())
            .max()
            .unwrap_or(0);
        Self {
            state: Mutex::new(InMemoryState {
                orders,
                last_id,
                loaded: false,
                fail_next: None,
            }),
            latency: DEFAULT_SIMULATED_LATENCY,
        }
    }

    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Makes the next operation, whichever it is, fail with `message`.
    pub async fn fail_next(&self, message: impl Into<String>) {
        self.state.lock().await.fail_next = Some(message.into());
    }
}

impl Default for InMemoryWorkOrderStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WorkOrderStore for InMemoryWorkOrderStore {
    async fn list(&self) -> Result<Vec<WorkOrder>> {
        let first_load = {
            let mut state = self.state.lock().await;
            state.take_failure()?;
            !std::mem::replace(&mut state.loaded, true)
        };
        if first_load && !self.latency.is_zero() {
            debug!(latency_ms = self.latency.as_millis() as u64, "simulating initial fetch");
            tokio::time::sleep(self.latency).await;
        }
        Ok(self.state.lock().await.orders.clone())
    }

    async fn create(&self, new: NewWorkOrder) -> Result<WorkOrder> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let id = state.next_id()?;
        let order = WorkOrder::from_new(id, new, Utc::now());
        state.orders.push(order.clone());
        debug!(id = %order.id, "created work order in memory");
        Ok(order)
    }

    async fn update(&self, id: &WorkOrderId, patch: WorkOrderPatch) -> Result<Option<WorkOrder>> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let Some(order) = state.orders.iter_mut().find(|order| &order.id == id) else {
            debug!(%id, "update skipped, unknown id");
            return Ok(None);
        };
        order.apply(patch);
        Ok(Some(order.clone()))
    }

    async fn delete(&self, id: &WorkOrderId) -> Result<bool> {
        let mut state = self.state.lock().await;
        state.take_failure()?;
        let before = state.orders.len();
        state.orders.retain(|order| &order.id != id);
        Ok(state.orders.len() != before)
    }
}

#[cfg(test)]
#[path = "tests/store_tests.rs"]
mod tests;
