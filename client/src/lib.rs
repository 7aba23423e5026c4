//! Campus Buzz client core: the persisted cart/ticket store, the auth
//! session and the HTTP gateway to the REST API.

pub mod api;
pub mod auth;
pub mod checkout;
pub mod config;
pub mod models;
pub mod storage;
pub mod store;

pub use api::{ApiClient, ApiError, AuthGateway};
pub use auth::{AuthSession, Redirect};
pub use config::ClientConfig;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::{ClientStore, StoreState};
