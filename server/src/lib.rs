//! Campus Buzz REST API: authentication, events, registrations, feedback
//! and admin statistics over Postgres.

pub mod auth;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod state;
pub mod store;
pub mod utils;

pub use routes::create_routes;
pub use state::AppState;
