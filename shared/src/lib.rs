//! Shared library for the Task Calendar Lambda functions.
//!
//! This crate provides the task model, persistence gateway, service layer,
//! and page rendering used by the HTTP handler.

pub mod config;
pub mod db;
pub mod error;
pub mod gateway;
pub mod http;
pub mod models;
pub mod secrets;
pub mod service;
pub mod views;

pub use config::{Config, StoreKind};
pub use error::{Error, Result};
pub use gateway::{InMemoryTaskGateway, PgTaskGateway, TaskGateway};
pub use models::{CalendarEvent, DeleteForm, NewTask, Priority, Task, TaskForm};
pub use service::TaskService;
