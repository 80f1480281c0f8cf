//! Task records, the calendar read model, and form binding.

use chrono::NaiveDate;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use validator::{Validate, ValidationError};

use crate::{Error, Result};

/// Color used for tasks without a recognised priority.
pub const DEFAULT_COLOR: &str = "#5bc0de";

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    /// Parse a stored priority label. Matching is exact; labels written by the
    /// older Japanese UI are accepted as well.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "high" | "高" => Some(Priority::High),
            "medium" | "中" => Some(Priority::Medium),
            "low" | "低" => Some(Priority::Low),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Priority::High => "#d9534f",
            Priority::Medium => "#f0ad4e",
            Priority::Low => "#5cb85c",
        }
    }
}

/// Calendar color for a raw priority value.
pub fn priority_color(priority: Option<&str>) -> &'static str {
    priority
        .and_then(Priority::from_label)
        .map_or(DEFAULT_COLOR, |p| p.color())
}

/// A task that has not been stored yet. Also serves as the empty form template.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub title: String,
    pub details: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub completed: bool,
}

/// A stored task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub details: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub start_date: Option<NaiveDate>,
    pub category: Option<String>,
    pub priority: Option<String>,
    pub completed: bool,
}

impl Task {
    pub fn from_new(id: i64, task: NewTask) -> Self {
        Self {
            id,
            title: task.title,
            details: task.details,
            due_date: task.due_date,
            start_date: task.start_date,
            category: task.category,
            priority: task.priority,
            completed: task.completed,
        }
    }

    /// The task's fields without its id.
    pub fn to_new(&self) -> NewTask {
        NewTask {
            title: self.title.clone(),
            details: self.details.clone(),
            due_date: self.due_date,
            start_date: self.start_date,
            category: self.category.clone(),
            priority: self.priority.clone(),
            completed: self.completed,
        }
    }
}

/// Calendar widget event derived from a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: i64,
    pub title: String,
    pub url: String,
    pub background_color: String,
    pub border_color: String,
    /// ISO 8601 date
    pub start: String,
    /// ISO 8601 date, exclusive
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Task fields as posted by the create and edit forms.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_task_dates"))]
pub struct TaskForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<i64>,
    #[serde(default, deserialize_with = "trimmed")]
    #[validate(length(min = 1, max = 255, message = "title must be between 1 and 255 characters"))]
    pub title: String,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub details: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "empty_as_none")]
    pub priority: Option<String>,
    #[serde(default, deserialize_with = "checkbox")]
    pub completed: bool,
}

impl TaskForm {
    /// Validate and convert into a task to create. Any posted id is ignored.
    pub fn into_new_task(self) -> Result<NewTask> {
        self.validate()?;
        Ok(self.into_parts().1)
    }

    /// Validate and convert into an existing task.
    pub fn into_task(self) -> Result<Task> {
        self.validate()?;
        let (id, task) = self.into_parts();
        let id = id.ok_or_else(|| Error::Validation("id is required".to_string()))?;
        Ok(Task::from_new(id, task))
    }

    fn into_parts(self) -> (Option<i64>, NewTask) {
        (
            self.id,
            NewTask {
                title: self.title,
                details: self.details,
                due_date: self.due_date,
                start_date: self.start_date,
                category: self.category,
                priority: self.priority,
                completed: self.completed,
            },
        )
    }
}

fn validate_task_dates(form: &TaskForm) -> std::result::Result<(), ValidationError> {
    match (form.start_date, form.due_date) {
        (None, None) => {
            let mut err = ValidationError::new("missing_date");
            err.message = Some("either a due date or a start date is required".into());
            Err(err)
        }
        (Some(start), Some(due)) if start > due => {
            let mut err = ValidationError::new("date_order");
            err.message = Some("start date must not be after the due date".into());
            Err(err)
        }
        _ => Ok(()),
    }
}

/// Body of the delete form.
#[derive(Debug, Deserialize)]
pub struct DeleteForm {
    #[serde(default, deserialize_with = "empty_as_none")]
    pub id: Option<i64>,
}

impl DeleteForm {
    pub fn id(&self) -> Result<i64> {
        self.id
            .ok_or_else(|| Error::Validation("id is required".to_string()))
    }
}

/// Form fields arrive as strings; an empty field means "absent".
fn empty_as_none<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
    T::Err: fmt::Display,
{
    let text = match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::String(s)) => s,
        Some(other) => other.to_string(),
    };

    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed.parse().map(Some).map_err(de::Error::custom)
}

/// Surrounding whitespace is dropped so a blank field reads as empty.
fn trimmed<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(other) => other.to_string(),
    })
}

/// HTML checkboxes are only sent when ticked.
fn checkbox<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Bool(b)) => b,
        Some(Value::String(s)) => matches!(
            s.trim().to_ascii_lowercase().as_str(),
            "on" | "true" | "1" | "yes"
        ),
        _ => false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn form(value: Value) -> TaskForm {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_priority_labels() {
        assert_eq!(Priority::from_label("high"), Some(Priority::High));
        assert_eq!(Priority::from_label("low"), Some(Priority::Low));
        assert_eq!(Priority::from_label("High"), None);
        assert_eq!(Priority::from_label(" low "), None);
        assert_eq!(Priority::from_label("中"), Some(Priority::Medium));
        assert_eq!(Priority::from_label("urgent"), None);
        assert_eq!(priority_color(None), DEFAULT_COLOR);
    }

    #[test]
    fn test_form_blank_fields_are_absent() {
        let form = form(json!({
            "title": "Dentist",
            "details": "",
            "dueDate": "2024-06-10",
            "startDate": "",
            "category": "  ",
            "priority": "low"
        }));
        assert_eq!(form.details, None);
        assert_eq!(form.start_date, None);
        assert_eq!(form.category, None);
        assert_eq!(form.due_date, Some(date("2024-06-10")));
        assert!(!form.completed);
    }

    #[test]
    fn test_form_accepts_numeric_and_string_ids() {
        assert_eq!(form(json!({"id": 12})).id, Some(12));
        assert_eq!(form(json!({"id": "12"})).id, Some(12));
        assert!(serde_json::from_value::<TaskForm>(json!({"id": "abc"})).is_err());
    }

    #[test]
    fn test_checkbox_values() {
        assert!(form(json!({"completed": "on"})).completed);
        assert!(form(json!({"completed": true})).completed);
        assert!(!form(json!({"completed": "off"})).completed);
    }

    #[test]
    fn test_into_new_task_requires_a_date() {
        let err = form(json!({"title": "No dates"})).into_new_task().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let task = form(json!({"title": "Start only", "startDate": "2024-06-01"}))
            .into_new_task()
            .unwrap();
        assert_eq!(task.start_date, Some(date("2024-06-01")));
    }

    #[test]
    fn test_into_new_task_rejects_inverted_dates() {
        let err = form(json!({
            "title": "Backwards",
            "startDate": "2024-06-12",
            "dueDate": "2024-06-10"
        }))
        .into_new_task()
        .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_into_new_task_requires_title() {
        let err = form(json!({"title": "", "dueDate": "2024-06-10"}))
            .into_new_task()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_blank_title_is_rejected() {
        let form = form(json!({"title": "   ", "dueDate": "2024-06-10"}));
        assert_eq!(form.title, "");
        let err = form.into_new_task().unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_title_is_trimmed() {
        let task = form(json!({"title": "  Dentist ", "dueDate": "2024-06-10"}))
            .into_new_task()
            .unwrap();
        assert_eq!(task.title, "Dentist");
    }

    #[test]
    fn test_into_task_requires_id() {
        let err = form(json!({"title": "Edit", "dueDate": "2024-06-10"}))
            .into_task()
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        let task = form(json!({"id": "3", "title": "Edit", "dueDate": "2024-06-10"}))
            .into_task()
            .unwrap();
        assert_eq!(task.id, 3);
        assert_eq!(task.title, "Edit");
    }

    #[test]
    fn test_event_omits_missing_end() {
        let event = CalendarEvent {
            id: 1,
            title: "Kickoff".to_string(),
            url: "/task/1".to_string(),
            background_color: DEFAULT_COLOR.to_string(),
            border_color: DEFAULT_COLOR.to_string(),
            start: "2024-06-01".to_string(),
            end: None,
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["backgroundColor"], DEFAULT_COLOR);
        assert!(json.get("end").is_none());
    }
}
