//! Server-rendered pages.

use chrono::NaiveDate;

use crate::models::{NewTask, Priority, Task};

const FULLCALENDAR_JS: &str = "https://cdn.jsdelivr.net/npm/fullcalendar@6.1.11/index.global.min.js";

/// Escape text for use in HTML content and attribute values.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn layout(title: &str, head: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
{head}
</head>
<body>
{body}
</body>
</html>
"#,
        title = escape_html(title),
        head = head,
        body = body,
    )
}

fn date_value(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

fn priority_options(selected: Option<&str>) -> String {
    let selected = selected.and_then(Priority::from_label);
    let mut options = format!(
        r#"<option value=""{}>-</option>"#,
        if selected.is_none() { " selected" } else { "" }
    );
    for priority in [Priority::High, Priority::Medium, Priority::Low] {
        options.push_str(&format!(
            r#"<option value="{value}"{sel}>{value}</option>"#,
            value = priority.as_str(),
            sel = if selected == Some(priority) { " selected" } else { "" },
        ));
    }
    options
}

/// Fields shared by the create and edit forms.
fn task_fields(task: &NewTask) -> String {
    format!(
        r#"<label>Title <input type="text" name="title" value="{title}" required maxlength="255"></label>
<label>Details <textarea name="details">{details}</textarea></label>
<label>Start date <input type="date" name="startDate" value="{start}"></label>
<label>Due date <input type="date" name="dueDate" value="{due}"></label>
<label>Category <input type="text" name="category" value="{category}"></label>
<label>Priority <select name="priority">{priorities}</select></label>
<label><input type="checkbox" name="completed"{checked}> Completed</label>"#,
        title = escape_html(&task.title),
        details = escape_html(task.details.as_deref().unwrap_or("")),
        start = date_value(task.start_date),
        due = date_value(task.due_date),
        category = escape_html(task.category.as_deref().unwrap_or("")),
        priorities = priority_options(task.priority.as_deref()),
        checked = if task.completed { " checked" } else { "" },
    )
}

/// Calendar page with the creation form bound to `new_task`.
pub fn render_calendar_page(new_task: &NewTask) -> String {
    let head = format!(
        r#"<script src="{src}"></script>
<script>
document.addEventListener('DOMContentLoaded', function () {{
  var calendar = new FullCalendar.Calendar(document.getElementById('calendar'), {{
    initialView: 'dayGridMonth',
    events: '/api/tasks'
  }});
  calendar.render();
}});
</script>"#,
        src = FULLCALENDAR_JS,
    );

    let body = format!(
        r#"<h1>Tasks</h1>
<div id="calendar"></div>
<section>
<h2>New task</h2>
<form method="post" action="/task/new">
{fields}
<button type="submit">Add</button>
</form>
</section>"#,
        fields = task_fields(new_task),
    );

    layout("Task Calendar", &head, &body)
}

/// Detail page with the edit and delete forms for `task`.
pub fn render_task_detail(task: &Task) -> String {
    let body = format!(
        r#"<h1>{title}</h1>
<form method="post" action="/task/edit">
<input type="hidden" name="id" value="{id}">
{fields}
<button type="submit">Save</button>
</form>
<form method="post" action="/task/delete">
<input type="hidden" name="id" value="{id}">
<button type="submit">Delete</button>
</form>
<a href="/">Back to calendar</a>"#,
        title = escape_html(&task.title),
        id = task.id,
        fields = task_fields(&task.to_new()),
    );

    layout(&task.title, "", &body)
}

pub fn render_error_page(status: u16, message: &str) -> String {
    let body = format!(
        r#"<h1>{status}</h1>
<p>{message}</p>
<a href="/">Back to calendar</a>"#,
        status = status,
        message = escape_html(message),
    );

    layout("Error", "", &body)
}
