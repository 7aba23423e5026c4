use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::utils::error::AppError;

pub const DEFAULT_EVENT_LIMIT: i64 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
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
    pub updated_at: DateTime<Utc>,
}

/// Body of `POST /api/events`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub category: String,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub venue: String,
    #[serde(default)]
    pub price: Decimal,
    pub max_participants: i32,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    #[serde(default)]
    pub published: bool,
    #[serde(default)]
    pub featured_event: bool,
    pub image_url: Option<String>,
}

impl NewEvent {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.title.trim().is_empty() {
            return Err(AppError::ValidationError("Event title is required".to_string()));
        }
        if self.venue.trim().is_empty() {
            return Err(AppError::ValidationError("Event venue is required".to_string()));
        }
        if self.contact_email.trim().is_empty() {
            return Err(AppError::ValidationError(
                "Contact email is required".to_string(),
            ));
        }
        if self.max_participants < 0 {
            return Err(AppError::ValidationError(
                "Maximum participants cannot be negative".to_string(),
            ));
        }
        if self.price.is_sign_negative() {
            return Err(AppError::ValidationError("Price cannot be negative".to_string()));
        }
        Ok(())
    }
}

/// Query string of `GET /api/events`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventQuery {
    pub category: Option<String>,
    pub search: Option<String>,
    pub limit: Option<i64>,
}

impl EventQuery {
    /// Category filter, ignoring the `all` sentinel and blank values.
    pub fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != "all")
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            Some(limit) if limit > 0 => limit,
            _ => DEFAULT_EVENT_LIMIT,
        }
    }

    /// In-process equivalent of the SQL filter.
    pub fn matches(&self, event: &Event) -> bool {
        if !event.published {
            return false;
        }
        if let Some(category) = self.category_filter() {
            if event.category != category {
                return false;
            }
        }
        if let Some(term) = self.search_term() {
            let needle = term.to_lowercase();
            let in_title = event.title.to_lowercase().contains(&needle);
            let in_description = event
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle));
            if !in_title && !in_description {
                return false;
            }
        }
        true
    }
}
