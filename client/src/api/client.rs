use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use super::error::ApiError;
use super::types::{
    AuthResponse, DashboardStats, ErrorEnvelope, Event, EventQuery, Feedback,
    FeedbackRequest, Health, LoginRequest, NewEvent, RegisterRequest, Registration,
    RegistrationWithEvent, RegistrationWithUser, SignupForm,
};
use super::AuthGateway;
use crate::config::ClientConfig;
use crate::storage::{load_json, save_json, Storage, TOKEN_KEY};

/// HTTP client for the Campus Buzz API.
///
/// Holds the bearer token in memory and mirrors it to storage under
/// [`TOKEN_KEY`], so a new client picks up an earlier session.
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: RwLock<Option<String>>,
    storage: Arc<dyn Storage>,
}

impl ApiClient {
    pub fn new(config: &ClientConfig, storage: Arc<dyn Storage>) -> Self {
        Self::with_base_url(config.api_url.clone(), storage)
    }

    pub fn with_base_url(base_url: impl Into<String>, storage: Arc<dyn Storage>) -> Self {
        let token = match load_json::<String>(storage.as_ref(), TOKEN_KEY) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, key = TOKEN_KEY, "ignoring unreadable stored token");
                None
            }
        };

        Self {
            http: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: RwLock::new(token),
            storage,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn set_token(&self, token: impl Into<String>) {
        let token = token.into();
        if let Err(e) = save_json(self.storage.as_ref(), TOKEN_KEY, &token) {
            warn!(error = %e, key = TOKEN_KEY, "token not persisted");
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    pub fn clear_token(&self) {
        if let Err(e) = self.storage.remove(TOKEN_KEY) {
            warn!(error = %e, key = TOKEN_KEY, "stored token not removed");
        }
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn builder(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, endpoint);
        let mut builder = self
            .http
            .request(method, url)
            .header(CONTENT_TYPE, "application/json");

        if let Some(token) = self.token() {
            builder = builder.header(AUTHORIZATION, format!("Bearer {token}"));
        }
        builder
    }

    async fn execute<T>(&self, builder: RequestBuilder) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        let response = builder.send().await.map_err(|e| {
            debug!(error = %e, "api request failed");
            ApiError::from(e)
        })?;

        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<ErrorEnvelope>(&body)
                .ok()
                .and_then(|envelope| envelope.error)
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));

            debug!(status = status.as_u16(), %message, "api request rejected");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_slice(&body).map_err(|e| {
            debug!(error = %e, "api response not decodable");
            ApiError::from(e)
        })
    }

    /// Sends `body` as JSON to `endpoint` and decodes the response as `T`.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let mut builder = self.builder(method, endpoint);
        if let Some(body) = body {
            builder = builder.json(body);
        }
        self.execute(builder).await
    }

    async fn get<T>(&self, endpoint: &str) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
    {
        self.request::<T, ()>(Method::GET, endpoint, None).await
    }

    async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    pub async fn register(&self, form: &SignupForm) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self.post("/auth/register", form).await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let auth: AuthResponse = self
            .post("/auth/login", &LoginRequest { email, password })
            .await?;
        self.set_token(auth.token.clone());
        Ok(auth)
    }

    pub async fn events(&self, query: &EventQuery) -> Result<Vec<Event>, ApiError> {
        let builder = self.builder(Method::GET, "/events").query(query);
        self.execute(builder).await
    }

    pub async fn event(&self, id: i32) -> Result<Event, ApiError> {
        self.get(&format!("/events/{id}")).await
    }

    /// Admin only; the server enforces the role.
    pub async fn create_event(&self, event: &NewEvent) -> Result<Event, ApiError> {
        self.post("/events", event).await
    }

    pub async fn register_for_event(
        &self,
        event_id: i32,
        quantity: i32,
    ) -> Result<Registration, ApiError> {
        self.post(
            &format!("/events/{event_id}/register"),
            &RegisterRequest { quantity },
        )
        .await
    }

    pub async fn submit_feedback(
        &self,
        event_id: i32,
        rating: i32,
        comment: Option<&str>,
    ) -> Result<Feedback, ApiError> {
        self.post(
            &format!("/events/{event_id}/feedback"),
            &FeedbackRequest { rating, comment },
        )
        .await
    }

    pub async fn user_registrations(&self) -> Result<Vec<RegistrationWithEvent>, ApiError> {
        self.get("/user/registrations").await
    }

    pub async fn admin_dashboard(&self) -> Result<DashboardStats, ApiError> {
        self.get("/admin/dashboard").await
    }

    pub async fn event_registrations(
        &self,
        event_id: i32,
    ) -> Result<Vec<RegistrationWithUser>, ApiError> {
        self.get(&format!("/admin/events/{event_id}/registrations"))
            .await
    }

    pub async fn health_check(&self) -> Result<Health, ApiError> {
        self.get("/health").await
    }
}

#[async_trait]
impl AuthGateway for ApiClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        ApiClient::login(self, email, password).await
    }

    async fn register(&self, form: &SignupForm) -> Result<AuthResponse, ApiError> {
        ApiClient::register(self, form).await
    }

    fn clear_token(&self) {
        ApiClient::clear_token(self);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use axum::extract::Query;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use testresult::TestResult;
    use tokio::net::TcpListener;

    use super::*;
    use crate::storage::MemoryStorage;

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}/api")
    }

    fn stub() -> Router {
        Router::new()
            .route(
                "/api/health",
                get(|headers: HeaderMap| async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    Json(json!({"status": "ok", "service": auth}))
                }),
            )
            .route(
                "/api/auth/login",
                post(|Json(body): Json<Value>| async move {
                    if body["password"] != "pw" {
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"error": "Invalid credentials"})),
                        );
                    }
                    (
                        StatusCode::OK,
                        Json(json!({
                            "token": "issued-token",
                            "user": {
                                "id": 3, "name": "Admin User", "email": body["email"],
                                "role": "admin", "phone": null, "department": "Student Affairs",
                                "year": null, "studentId": null, "adminId": "ADM-1",
                            },
                        })),
                    )
                }),
            )
            .route(
                "/api/events",
                get(|Query(q): Query<HashMap<String, String>>| async move {
                    let expected = q.get("category").map(String::as_str) == Some("Music")
                        && q.get("limit").map(String::as_str) == Some("3")
                        && !q.contains_key("search");
                    if expected {
                        (StatusCode::OK, Json(json!([])))
                    } else {
                        (
                            StatusCode::BAD_REQUEST,
                            Json(json!({"error": format!("{q:?}")})),
                        )
                    }
                }),
            )
            .route(
                "/api/admin/dashboard",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "upstream exploded") }),
            )
            .route(
                "/api/user/registrations",
                get(|| async { Json(json!({"data": []})) }),
            )
    }

    #[tokio::test]
    async fn attaches_bearer_token_when_held() -> TestResult {
        let base = serve(stub()).await;
        let client = ApiClient::with_base_url(base, Arc::new(MemoryStorage::new()));

        assert_eq!(client.health_check().await?.service, "");

        client.set_token("abc");
        assert_eq!(client.health_check().await?.service, "Bearer abc");

        client.clear_token();
        assert_eq!(client.health_check().await?.service, "");
        Ok(())
    }

    #[tokio::test]
    async fn login_adopts_and_persists_token() -> TestResult {
        let base = serve(stub()).await;
        let storage = Arc::new(MemoryStorage::new());
        let client = ApiClient::with_base_url(base.clone(), storage.clone());

        let auth = client.login("admin@college.edu", "pw").await?;
        assert_eq!(auth.user.email, "admin@college.edu");
        assert_eq!(client.token().as_deref(), Some("issued-token"));

        let reloaded = ApiClient::with_base_url(base, storage.clone());
        assert_eq!(reloaded.token().as_deref(), Some("issued-token"));

        reloaded.clear_token();
        assert!(storage.keys().is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn server_error_message_is_surfaced() {
        let base = serve(stub()).await;
        let client = ApiClient::with_base_url(base, Arc::new(MemoryStorage::new()));

        let err = client.login("admin@college.edu", "wrong").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
        assert_eq!(err.to_string(), "Invalid credentials");
        assert_eq!(client.token(), None);
    }

    #[tokio::test]
    async fn error_without_message_falls_back_to_status() {
        let base = serve(stub()).await;
        let client = ApiClient::with_base_url(base, Arc::new(MemoryStorage::new()));

        let err = client.admin_dashboard().await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 500");

        let err = client.event(1).await.unwrap_err();
        assert_eq!(err.to_string(), "HTTP error! status: 404");
    }

    #[tokio::test]
    async fn undecodable_success_body_is_decode_error() {
        let base = serve(stub()).await;
        let client = ApiClient::with_base_url(base, Arc::new(MemoryStorage::new()));

        let err = client.user_registrations().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }

    #[tokio::test]
    async fn event_filters_become_query_parameters() -> TestResult {
        let base = serve(stub()).await;
        let client = ApiClient::with_base_url(base, Arc::new(MemoryStorage::new()));

        let events = client
            .events(&EventQuery {
                category: Some("Music".to_string()),
                search: None,
                limit: Some(3),
            })
            .await?;
        assert!(events.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_server_is_transport_error() -> TestResult {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        drop(listener);

        let client =
            ApiClient::with_base_url(format!("http://{addr}/api"), Arc::new(MemoryStorage::new()));
        let err = client.health_check().await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
        Ok(())
    }
}
