use serde::{Deserialize, Serialize};

use crate::domain::{WorkOrder, WorkOrderId};

pub const WORK_ORDERS_ROUTE: &str = "/work_orders";
pub const EVENTS_ROUTE: &str = "/ws";
pub const HEALTH_ROUTE: &str = "/healthz";

/// Pushed to every `/ws` subscriber after a mutation commits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum WorkOrderEvent {
    Created { work_order: WorkOrder },
    Updated { work_order: WorkOrder },
    Deleted { id: WorkOrderId },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deleted_event_is_tagged() {
        let event = WorkOrderEvent::Deleted {
            id: WorkOrderId::from("9"),
        };
        let value = serde_json::to_value(&event).expect("json");
        assert_eq!(value["type"], "deleted");
        assert_eq!(value["payload"]["id"], "9");
    }
}
