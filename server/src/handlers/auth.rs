use axum::extract::State;
use axum::response::Response;

use crate::auth::password::{hash_password, verify_password};
use crate::models::user::{AuthPayload, LoginRequest, RegisterUser};
use crate::models::{NewUser, PublicUser, Role};
use crate::state::AppState;
use crate::utils::error::AppError;
use crate::utils::json::ApiJson;
use crate::utils::response::{created, success};

fn required(value: String, field: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn invalid_credentials() -> AppError {
    AppError::ValidationError("Invalid credentials".to_string())
}

pub async fn register(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<RegisterUser>,
) -> Result<Response, AppError> {
    let first_name = required(body.first_name, "First name")?;
    let last_name = required(body.last_name, "Last name")?;
    let email = required(body.email, "Email")?.to_lowercase();
    if !email.contains('@') {
        return Err(AppError::ValidationError("Email is invalid".to_string()));
    }
    if body.password.is_empty() {
        return Err(AppError::ValidationError("Password is required".to_string()));
    }

    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict(
            "User already exists with this email".to_string(),
        ));
    }

    let password_hash = hash_password(body.password, state.bcrypt_cost).await?;

    let is_student = body.role == Role::Student;
    let user = state
        .store
        .create_user(NewUser {
            first_name,
            last_name,
            email,
            password_hash,
            phone: body.phone,
            role: body.role,
            department: body.department,
            year: body.year.filter(|_| is_student),
            student_id: body.student_id.filter(|_| is_student),
            admin_id: body.admin_id.filter(|_| !is_student),
        })
        .await?;

    tracing::info!(user_id = user.id, role = user.role.as_str(), "User registered");

    let token = state.tokens.issue(&user)?;
    let payload = AuthPayload {
        token,
        user: PublicUser::from(&user),
    };

    Ok(created(payload))
}

pub async fn login(
    State(state): State<AppState>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<Response, AppError> {
    let email = body.email.trim().to_lowercase();

    let Some(user) = state.store.find_user_by_email(&email).await? else {
        return Err(invalid_credentials());
    };

    if !verify_password(body.password, user.password.clone()).await? {
        return Err(invalid_credentials());
    }

    let token = state.tokens.issue(&user)?;
    let payload = AuthPayload {
        token,
        user: PublicUser::from(&user),
    };

    Ok(success(payload))
}
