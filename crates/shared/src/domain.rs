use std::{fmt, str::FromStr};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkOrderId(pub String);

impl WorkOrderId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric view of the id, for backends that allocate integer row ids.
    /// Only the canonical spelling counts: `"02"`, `" 2"` and `"+2"` are not `2`.
    pub fn numeric(&self) -> Option<i64> {
        self.0
            .parse::<i64>()
            .ok()
            .filter(|n| n.to_string() == self.0)
    }
}

impl fmt::Display for WorkOrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for WorkOrderId {
    fn from(value: i64) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for WorkOrderId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkOrderStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl WorkOrderStatus {
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for WorkOrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "in-progress" | "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(UnknownVariant {
                kind: "status",
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkOrderPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl WorkOrderPriority {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for WorkOrderPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkOrderPriority {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(UnknownVariant {
                kind: "priority",
                value: other.to_string(),
            }),
        }
    }
}

/// A maintenance task tracked through status, priority and assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    pub id: WorkOrderId,
    pub title: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl WorkOrder {
    pub fn from_new(id: WorkOrderId, new: NewWorkOrder, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: new.title,
            description: new.description,
            status: new.status,
            priority: new.priority,
            assignee: new.assignee,
            due_date: new.due_date,
            created_at,
        }
    }

    /// Merges the fields present in `patch`; everything else is left alone.
    pub fn apply(&mut self, patch: WorkOrderPatch) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(priority) = patch.priority {
            self.priority = priority;
        }
        if let Some(assignee) = patch.assignee {
            self.assignee = Some(assignee);
        }
        if let Some(due_date) = patch.due_date {
            self.due_date = Some(due_date);
        }
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != WorkOrderStatus::Completed
            && self.due_date.is_some_and(|due| due < today)
    }
}

/// Create payload: every field but the id and creation timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NewWorkOrder {
    pub title: String,
    pub description: String,
    pub status: WorkOrderStatus,
    pub priority: WorkOrderPriority,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

impl NewWorkOrder {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WorkOrderPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<WorkOrderStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<WorkOrderPriority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
}

/// The three demo orders every fresh in-memory store and seeded database start with.
pub fn demo_work_orders() -> Vec<NewWorkOrder> {
    vec![
        NewWorkOrder {
            title: "HVAC filter replacement".into(),
            description: "Replace air handler filters on floors 2 and 3".into(),
            status: WorkOrderStatus::Pending,
            priority: WorkOrderPriority::Medium,
            assignee: Some("John Smith".into()),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 15),
        },
        NewWorkOrder {
            title: "Loading dock door repair".into(),
            description: "Roll-up door at dock 4 sticks halfway".into(),
            status: WorkOrderStatus::InProgress,
            priority: WorkOrderPriority::High,
            assignee: Some("Sarah Johnson".into()),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 10),
        },
        NewWorkOrder {
            title: "Emergency lighting inspection".into(),
            description: "Quarterly test of exit signs and emergency lights".into(),
            status: WorkOrderStatus::Completed,
            priority: WorkOrderPriority::Low,
            assignee: Some("Mike Wilson".into()),
            due_date: NaiveDate::from_ymd_opt(2024, 2, 1),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_uses_kebab_case_on_the_wire() {
        let json = serde_json::to_string(&WorkOrderStatus::InProgress).expect("json");
        assert_eq!(json, "\"in-progress\"");
        assert_eq!(
            "In_Progress".parse::<WorkOrderStatus>().expect("parse"),
            WorkOrderStatus::InProgress
        );
        assert!("archived".parse::<WorkOrderStatus>().is_err());
    }

    #[test]
    fn numeric_ids_must_be_canonical() {
        assert_eq!(WorkOrderId::from("2").numeric(), Some(2));
        assert_eq!(WorkOrderId::from("-7").numeric(), Some(-7));
        for id in ["02", " 2", "2 ", "+2", "1?x", "", "two"] {
            assert_eq!(WorkOrderId::from(id).numeric(), None, "{id:?}");
        }
    }

    #[test]
    fn new_work_order_defaults_missing_fields() {
        let new: NewWorkOrder =
            serde_json::from_str(r#"{"title":"Test","status":"pending","priority":"low"}"#)
                .expect("json");
        assert_eq!(new.title, "Test");
        assert_eq!(new.priority, WorkOrderPriority::Low);
        assert!(new.description.is_empty());
        assert!(new.assignee.is_none());
        assert!(new.due_date.is_none());
    }

    #[test]
    fn apply_only_touches_present_fields() {
        let mut order = WorkOrder::from_new(
            WorkOrderId::from(7),
            NewWorkOrder {
                title: "Boiler".into(),
                description: "Annual service".into(),
                assignee: Some("Ana".into()),
                ..Default::default()
            },
            Utc::now(),
        );
        let before = order.clone();
        order.apply(WorkOrderPatch {
            status: Some(WorkOrderStatus::Completed),
            ..Default::default()
        });

        assert_eq!(order.status, WorkOrderStatus::Completed);
        assert_eq!(order.title, before.title);
        assert_eq!(order.description, before.description);
        assert_eq!(order.assignee, before.assignee);
        assert_eq!(order.created_at, before.created_at);
    }

    #[test]
    fn work_order_serializes_camel_case_keys() {
        let order = WorkOrder::from_new(
            WorkOrderId::from("1"),
            NewWorkOrder {
                due_date: NaiveDate::from_ymd_opt(2024, 3, 1),
                ..NewWorkOrder::titled("Roof drain")
            },
            Utc::now(),
        );
        let value = serde_json::to_value(&order).expect("json");
        assert_eq!(value["id"], "1");
        assert_eq!(value["dueDate"], "2024-03-01");
        assert!(value.get("createdAt").is_some());
        assert!(value.get("assignee").is_none());
    }

    #[test]
    fn completed_orders_are_never_overdue() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
        let mut order = WorkOrder::from_new(
            WorkOrderId::from(1),
            NewWorkOrder {
                due_date: NaiveDate::from_ymd_opt(2024, 2, 1),
                ..Default::default()
            },
            Utc::now(),
        );
        assert!(order.is_overdue(today));
        order.status = WorkOrderStatus::Completed;
        assert!(!order.is_overdue(today));
    }
}
