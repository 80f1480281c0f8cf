//! Task service: passthrough to the gateway plus the calendar projection.

use chrono::Days;
use std::sync::Arc;
use tracing::info;

use crate::gateway::TaskGateway;
use crate::models::{priority_color, CalendarEvent, NewTask, Task};
use crate::{Error, Result};

/// Convert a task into a calendar event.
///
/// The event starts on the start date, falling back to the due date, and ends
/// the day after the due date (calendar end dates are exclusive). A task with
/// neither date cannot be placed on the calendar.
pub fn to_event(task: &Task) -> Result<CalendarEvent> {
    let start = task.start_date.or(task.due_date).ok_or_else(|| {
        Error::Validation(format!(
            "Task {} has neither a start date nor a due date",
            task.id
        ))
    })?;

    let end = match task.due_date {
        Some(due) => Some(
            due.checked_add_days(Days::new(1))
                .ok_or_else(|| Error::Validation(format!("Task {} due date is out of range", task.id)))?,
        ),
        None => None,
    };

    let color = priority_color(task.priority.as_deref());

    Ok(CalendarEvent {
        id: task.id,
        title: task.title.clone(),
        url: format!("/task/{}", task.id),
        background_color: color.to_string(),
        border_color: color.to_string(),
        start: start.format("%Y-%m-%d").to_string(),
        end: end.map(|d| d.format("%Y-%m-%d").to_string()),
    })
}

/// Business layer between the HTTP handler and the gateway.
#[derive(Clone)]
pub struct TaskService {
    gateway: Arc<dyn TaskGateway>,
}

impl TaskService {
    pub fn new(gateway: Arc<dyn TaskGateway>) -> Self {
        Self { gateway }
    }

    pub async fn find_all_tasks(&self) -> Result<Vec<Task>> {
        self.gateway.list_all().await
    }

    /// Every task projected for the calendar, in gateway order.
    pub async fn list_all_events(&self) -> Result<Vec<CalendarEvent>> {
        let tasks = self.gateway.list_all().await?;
        tasks.iter().map(to_event).collect()
    }

    pub async fn get_task(&self, id: i64) -> Result<Task> {
        self.gateway
            .get_by_id(id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Task {} not found", id)))
    }

    pub async fn create_task(&self, task: NewTask) -> Result<Task> {
        let task = self.gateway.insert(&task).await?;
        info!("Created task {}", task.id);
        Ok(task)
    }

    pub async fn update_task(&self, task: Task) -> Result<()> {
        if self.gateway.update(&task).await? == 0 {
            return Err(Error::NotFound(format!("Task {} not found", task.id)));
        }
        info!("Updated task {}", task.id);
        Ok(())
    }

    pub async fn delete_task(&self, id: i64) -> Result<()> {
        if self.gateway.delete(id).await? == 0 {
            return Err(Error::NotFound(format!("Task {} not found", id)));
        }
        info!("Deleted task {}", id);
        Ok(())
    }
}
