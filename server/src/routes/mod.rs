use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::{create_cors_layer, create_security_headers_layer};
use crate::handlers::{admin, auth, events, health_check, registrations, route_not_found};
use crate::state::AppState;

pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/events", get(events::list_events).post(events::create_event))
        .route("/events/:id", get(events::get_event))
        .route("/events/:id/register", post(registrations::register_for_event))
        .route("/events/:id/feedback", post(registrations::submit_feedback))
        .route("/user/registrations", get(registrations::user_registrations))
        .route(
            "/admin/events/:id/registrations",
            get(admin::event_registrations),
        )
        .route("/admin/dashboard", get(admin::dashboard))
}

pub fn create_routes(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .fallback(route_not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(create_security_headers_layer())
        .layer(create_cors_layer())
}
