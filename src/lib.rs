#![doc = "The `taskdesk` library crate."]
#![doc = ""]
#![doc = "Domain models, checklist-driven progress tracking, authentication and"]
#![doc = "authorization, storage backends, reporting and the actix-web routes of the"]
#![doc = "taskdesk task-management API. `main.rs` assembles them into a server; the"]
#![doc = "integration tests assemble the same pieces against the in-memory store."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod progress;
pub mod reporting;
pub mod response;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::AppError;
pub use state::AppState;
