//! Board Utilities
//!
//! Helpers for rendering the Kanban board.

use std::collections::HashMap;

use chrono::{Duration, NaiveDateTime};

use crate::models::{Column, ColumnId, ColumnType, Priority, Task};

/// A column with the tasks currently cached for it
#[derive(Debug, Clone, PartialEq)]
pub struct BoardColumn {
    pub column: Column,
    pub tasks: Vec<Task>,
}

/// Group tasks under their columns, columns ordered by position.
/// Tasks referencing an unknown column are left out.
pub fn merge_columns(columns: &[Column], tasks: &[Task]) -> Vec<BoardColumn> {
    let mut by_column: HashMap<ColumnId, Vec<Task>> = HashMap::new();
    for task in tasks {
        by_column.entry(task.column_id).or_default().push(task.clone());
    }

    let mut ordered: Vec<&Column> = columns.iter().collect();
    ordered.sort_by_key(|c| (c.position, c.id));

    ordered
        .into_iter()
        .map(|column| BoardColumn {
            column: column.clone(),
            tasks: by_column.remove(&column.id).unwrap_or_default(),
        })
        .collect()
}

pub fn is_overdue(task: &Task, now: NaiveDateTime) -> bool {
    task.due_date.is_some_and(|due| due < now)
}

/// "Today", "Tomorrow", otherwise "May 3"
pub fn due_label(due: NaiveDateTime, now: NaiveDateTime) -> String {
    let today = now.date();
    if due.date() == today {
        "Today".to_string()
    } else if due.date() == today + Duration::days(1) {
        "Tomorrow".to_string()
    } else {
        due.format("%b %-d").to_string()
    }
}

pub fn column_class(column_type: ColumnType) -> &'static str {
    match column_type {
        ColumnType::Backlog => "column-backlog",
        ColumnType::ToDo => "column-todo",
        ColumnType::InProgress => "column-in-progress",
        ColumnType::Done => "column-done",
    }
}

pub fn priority_class(priority: Priority) -> &'static str {
    match priority {
        Priority::High => "priority-high",
        Priority::Medium => "priority-medium",
        Priority::Low => "priority-low",
    }
}
