//! Gateway to the REST API.

use async_trait::async_trait;
use mockall::automock;

pub mod client;
pub mod error;
pub mod types;

pub use client::ApiClient;
pub use error::ApiError;
pub use types::{
    ApiUser, AuthResponse, DashboardStats, Event, EventQuery, Feedback, Health, NewEvent,
    Registration, RegistrationStatus, RegistrationWithEvent, RegistrationWithUser, SignupForm,
    DEFAULT_QUANTITY,
};

/// The calls the auth session makes against the API.
#[automock]
#[async_trait]
pub trait AuthGateway: Send + Sync {
    /// Adopts the returned token on success.
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError>;

    /// Adopts the returned token on success.
    async fn register(&self, form: &SignupForm) -> Result<AuthResponse, ApiError>;

    fn clear_token(&self);
}
