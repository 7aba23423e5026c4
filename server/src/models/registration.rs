use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use thiserror::Error;

pub const DEFAULT_QUANTITY: i32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl RegistrationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegistrationStatus::Confirmed => "confirmed",
            RegistrationStatus::Cancelled => "cancelled",
            RegistrationStatus::Completed => "completed",
        }
    }
}

#[derive(Debug, Error)]
#[error("unknown registration status '{0}'")]
pub struct UnknownStatus(pub String);

impl TryFrom<String> for RegistrationStatus {
    type Error = UnknownStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "confirmed" => Ok(RegistrationStatus::Confirmed),
            "cancelled" => Ok(RegistrationStatus::Cancelled),
            "completed" => Ok(RegistrationStatus::Completed),
            _ => Err(UnknownStatus(value)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Registration {
    pub id: i32,
    pub event_id: i32,
    pub user_id: i32,
    pub quantity: i32,
    pub total_amount: Decimal,
    #[sqlx(try_from = "String")]
    pub status: RegistrationStatus,
    pub payment_method: Option<String>,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
}

/// A caller's registration joined with the event it belongs to.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationWithEvent {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: Registration,
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    pub price: Decimal,
    pub contact_email: String,
    pub contact_phone: Option<String>,
}

/// An event's registration joined with the registrant, for admins.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RegistrationWithUser {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub registration: Registration,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub student_id: Option<String>,
}

/// Body of `POST /api/events/:id/register`.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

impl Default for RegisterRequest {
    fn default() -> Self {
        Self {
            quantity: DEFAULT_QUANTITY,
        }
    }
}

fn default_quantity() -> i32 {
    DEFAULT_QUANTITY
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Rejection {
    #[error("Already registered for this event")]
    AlreadyRegistered,

    #[error("Not enough seats available")]
    CapacityExceeded,
}

/// Admission rule for a new registration.
///
/// `confirmed` is the summed quantity of the event's confirmed registrations.
/// A second registration by the same user is refused whatever its quantity.
pub fn admit(
    max_participants: i32,
    confirmed: i64,
    quantity: i32,
    already_registered: bool,
) -> Result<(), Rejection> {
    if already_registered {
        return Err(Rejection::AlreadyRegistered);
    }
    if confirmed + i64::from(quantity) > i64::from(max_participants) {
        return Err(Rejection::CapacityExceeded);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admits_up_to_exact_capacity() {
        assert_eq!(admit(10, 7, 3, false), Ok(()));
        assert_eq!(admit(10, 0, 10, false), Ok(()));
    }

    #[test]
    fn rejects_when_capacity_would_be_exceeded() {
        assert_eq!(admit(10, 8, 3, false), Err(Rejection::CapacityExceeded));
        assert_eq!(admit(0, 0, 1, false), Err(Rejection::CapacityExceeded));
    }

    #[test]
    fn duplicate_is_rejected_regardless_of_quantity() {
        assert_eq!(admit(100, 1, 1, true), Err(Rejection::AlreadyRegistered));
        assert_eq!(admit(100, 1, 500, true), Err(Rejection::AlreadyRegistered));
    }

    #[test]
    fn missing_quantity_defaults_to_one() {
        let body: RegisterRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(body.quantity, 1);
    }
}
