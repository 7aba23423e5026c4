//! Persistence seam for the API.
//!
//! Handlers only talk to [`Store`]. [`PgStore`] is the production backend;
//! [`MemoryStore`] keeps everything in process and backs the router tests.

use async_trait::async_trait;
use thiserror::Error;

use crate::models::registration::Rejection;
use crate::models::{
    DashboardStats, Event, EventQuery, Feedback, FeedbackRequest, NewEvent, NewUser,
    Registration, RegistrationWithEvent, RegistrationWithUser, User,
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("event {0} not found")]
    EventNotFound(i32),

    #[error("email already registered")]
    EmailTaken,

    #[error(transparent)]
    Rejected(#[from] Rejection),

    #[error("no confirmed registration for this event")]
    NotRegistered,

    #[error("feedback already submitted")]
    FeedbackExists,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    /// Fails with [`StoreError::EmailTaken`] when the email is already in use.
    async fn create_user(&self, user: NewUser) -> Result<User, StoreError>;

    /// Published events matching `query`, newest first.
    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError>;

    async fn get_event(&self, id: i32) -> Result<Option<Event>, StoreError>;

    async fn create_event(&self, event: NewEvent, created_by: i32) -> Result<Event, StoreError>;

    /// Admits a confirmed registration if the event has room and the user
    /// holds none yet. The capacity check and the insert are atomic.
    async fn register_for_event(
        &self,
        event_id: i32,
        user_id: i32,
        quantity: i32,
    ) -> Result<Registration, StoreError>;

    async fn user_registrations(
        &self,
        user_id: i32,
    ) -> Result<Vec<RegistrationWithEvent>, StoreError>;

    async fn submit_feedback(
        &self,
        event_id: i32,
        user_id: i32,
        feedback: FeedbackRequest,
    ) -> Result<Feedback, StoreError>;

    async fn event_registrations(
        &self,
        event_id: i32,
    ) -> Result<Vec<RegistrationWithUser>, StoreError>;

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError>;
}
