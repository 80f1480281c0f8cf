//! Tasks Lambda - Calendar pages, task forms and the calendar event feed.
//!
//! Endpoints:
//! - GET / - Calendar page with the new-task form
//! - GET /api/tasks - Tasks as calendar events (JSON)
//! - GET /task/{id} - Task detail page with edit and delete forms
//! - POST /task/new - Create a task, redirect to /
//! - POST /task/edit - Update a task, redirect to /
//! - POST /task/delete - Delete a task, redirect to /

use lambda_http::{run, service_fn, Body, Error, Request, Response};
use shared::http::{error_response, html_response, json_response, parse_form, redirect_response};
use shared::{gateway, views, Config, DeleteForm, NewTask, TaskForm, TaskService};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Application state
struct AppState {
    service: TaskService,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let gateway = gateway::connect(&config).await?;

        Ok(Self {
            service: TaskService::new(gateway),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Route {
    Calendar,
    EventFeed,
    TaskDetail(i64),
    CreateTask,
    UpdateTask,
    DeleteTask,
}

impl Route {
    fn resolve(method: &str, path: &str) -> Option<Self> {
        match (method, path) {
            ("GET", "/") => Some(Route::Calendar),
            ("GET", "/api/tasks") => Some(Route::EventFeed),
            ("POST", "/task/new") => Some(Route::CreateTask),
            ("POST", "/task/edit") => Some(Route::UpdateTask),
            ("POST", "/task/delete") => Some(Route::DeleteTask),
            ("GET", _) => path
                .strip_prefix("/task/")
                .and_then(|id| id.parse().ok())
                .map(Route::TaskDetail),
            _ => None,
        }
    }

    /// Whether failures should be rendered as HTML rather than JSON
    fn is_page(self) -> bool {
        !matches!(self, Route::EventFeed)
    }
}

fn normalize_path(raw: &str) -> &str {
    match raw.trim_end_matches('/') {
        "" => "/",
        path => path,
    }
}

async fn dispatch(state: &AppState, route: Route, event: &Request) -> shared::Result<Response<Body>> {
    match route {
        Route::Calendar => html_response(200, views::render_calendar_page(&NewTask::default())),

        Route::EventFeed => {
            let events = state.service.list_all_events().await?;
            json_response(200, &events)
        }

        Route::TaskDetail(id) => {
            let task = state.service.get_task(id).await?;
            html_response(200, views::render_task_detail(&task))
        }

        Route::CreateTask => {
            let form: TaskForm = parse_form(event)?;
            state.service.create_task(form.into_new_task()?).await?;
            redirect_response("/")
        }

        Route::UpdateTask => {
            let form: TaskForm = parse_form(event)?;
            state.service.update_task(form.into_task()?).await?;
            redirect_response("/")
        }

        Route::DeleteTask => {
            let form: DeleteForm = parse_form(event)?;
            state.service.delete_task(form.id()?).await?;
            redirect_response("/")
        }
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let method = event.method().as_str();
    let path = normalize_path(event.uri().path());

    info!("Tasks request: {} {}", method, path);

    let Some(route) = Route::resolve(method, path) else {
        if path.starts_with("/api/") {
            return Ok(error_response(404, "Not found")?);
        }
        return Ok(html_response(404, views::render_error_page(404, "Not found"))?);
    };

    match dispatch(&state, route, &event).await {
        Ok(response) => Ok(response),
        Err(e) => {
            let status = e.status_code();
            if status >= 500 {
                error!("{} {} failed: {}", method, path, e);
            } else {
                warn!("{} {} rejected: {}", method, path, e);
            }

            let message = e.public_message();
            if route.is_page() {
                Ok(html_response(status, views::render_error_page(status, &message))?)
            } else {
                Ok(error_response(status, message)?)
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);
    let state_clone = state.clone();

    run(service_fn(move |event| {
        let state = state_clone.clone();
        async move { handler(state, event).await }
    }))
    .await
}
