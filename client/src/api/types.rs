//! Request and response bodies of the REST API.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::Role;

pub const DEFAULT_QUANTITY: i32 = 1;

/// Failure body: `{"error": "<message>"}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: Option<String>,
}

/// Account as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiUser {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub role: Role,
    pub department: Option<String>,
    pub year: Option<String>,
    pub student_id: Option<String>,
    pub admin_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: ApiUser,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub role: Role,
    pub department: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub student_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EventQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Event {
    pub id: i32,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    pub price: Decimal,
    pub max_participants: i32,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub published: bool,
    pub featured_event: bool,
    pub image_url: Option<String>,
    pub created_by: Option<i32>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    pub price: Decimal,
    pub max_participants: i32,
    pub contact_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contact_phone: Option<String>,
    pub published: bool,
    pub featured_event: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Registration {
    pub id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub quantity: i32,
    pub total_amount: Decimal,
    pub status: RegistrationStatus,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegistrationWithEvent {
    #[serde(flatten)]
    pub registration: Registration,
    pub title: String,
    pub category: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    pub price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegistrationWithUser {
    #[serde(flatten)]
    pub registration: Registration,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub student_id: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct RegisterRequest {
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FeedbackRequest<'a> {
    pub rating: i32,
    pub comment: Option<&'a str>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Feedback {
    pub id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub rating: i32,
    pub comment: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_events: i64,
    pub total_registrations: i64,
    pub total_revenue: Decimal,
    pub upcoming_events: i64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Health {
    pub status: String,
    pub service: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_body_carries_a_plain_message() {
        let body: ErrorEnvelope = serde_json::from_str(r#"{"error":"Invalid token"}"#).unwrap();
        assert_eq!(body.error.as_deref(), Some("Invalid token"));

        assert!(serde_json::from_str::<ErrorEnvelope>(r#"{"error":{"message":"x"}}"#).is_err());
    }

    #[test]
    fn signup_form_omits_absent_role_fields() {
        let form = SignupForm {
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada@college.edu".to_string(),
            password: "pw".to_string(),
            phone: "+91 98765 43210".to_string(),
            role: Role::Admin,
            department: "Student Affairs".to_string(),
            year: None,
            student_id: None,
            admin_id: Some("ADM-1".to_string()),
        };

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["firstName"], "Ada");
        assert_eq!(value["adminId"], "ADM-1");
        assert!(value.get("year").is_none());
    }
}
