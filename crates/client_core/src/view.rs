use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::Serialize;
use shared::domain::{WorkOrder, WorkOrderPriority, WorkOrderStatus};

use crate::preferences::Preferences;

/// Filters, sorts and pages `orders` the way `prefs` asks.
///
/// Pages are 1-based; page 0 is treated as page 1. A `page_size` of 0 shows
/// everything on one page. Unknown `sort_by` keys keep insertion order.
pub fn apply_preferences(orders: &[WorkOrder], prefs: &Preferences, page: usize) -> Vec<WorkOrder> {
    let mut visible: Vec<WorkOrder> = orders
        .iter()
        .filter(|order| prefs.show_completed || order.status != WorkOrderStatus::Completed)
        .cloned()
        .collect();

    if let Some(compare) = comparator(&prefs.sort_by) {
        visible.sort_by(compare);
    }
    if prefs.is_descending() {
        visible.reverse();
    }

    let size = prefs.page_size as usize;
    if size == 0 {
        return visible;
    }
    let start = (page.max(1) - 1).saturating_mul(size);
    visible.into_iter().skip(start).take(size).collect()
}

/// Number of pages `apply_preferences` would produce for `orders`.
pub fn page_count(orders: &[WorkOrder], prefs: &Preferences) -> usize {
    let visible = orders
        .iter()
        .filter(|order| prefs.show_completed || order.status != WorkOrderStatus::Completed)
        .count();
    match prefs.page_size as usize {
        0 => 1,
        size => visible.div_ceil(size).max(1),
    }
}

type Comparator = fn(&WorkOrder, &WorkOrder) -> Ordering;

fn comparator(sort_by: &str) -> Option<Comparator> {
    let compare: Comparator = match sort_by {
        "dueDate" => by_due_date,
        "createdAt" => by_created_at,
        "priority" => by_priority,
        "status" => by_status,
        "title" => by_title,
        _ => return None,
    };
    Some(compare)
}

fn by_due_date(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    match (a.due_date, b.due_date) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn by_created_at(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    a.created_at.cmp(&b.created_at)
}

fn by_priority(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    a.priority.cmp(&b.priority)
}

fn by_status(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    status_rank(a.status).cmp(&status_rank(b.status))
}

fn by_title(a: &WorkOrder, b: &WorkOrder) -> Ordering {
    a.title.to_lowercase().cmp(&b.title.to_lowercase())
}

fn status_rank(status: WorkOrderStatus) -> usize {
    WorkOrderStatus::ALL
        .iter()
        .position(|candidate| *candidate == status)
        .unwrap_or(usize::MAX)
}

/// Counts behind the dashboard stat cards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderStats {
    pub total: usize,
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub high_priority: usize,
    pub overdue: usize,
}

impl WorkOrderStats {
    pub fn from_orders(orders: &[WorkOrder], today: NaiveDate) -> Self {
        orders.iter().fold(Self::default(), |mut stats, order| {
            stats.total += 1;
            match order.status {
                WorkOrderStatus::Pending => stats.pending += 1,
                WorkOrderStatus::InProgress => stats.in_progress += 1,
                WorkOrderStatus::Completed => stats.completed += 1,
            }
            if order.priority == WorkOrderPriority::High {
                stats.high_priority += 1;
            }
            if order.is_overdue(today) {
                stats.overdue += 1;
            }
            stats
        })
    }
}
