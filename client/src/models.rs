use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type EventId = i32;

/// Upper bound on tickets per event in one cart entry.
pub const MAX_TICKETS_PER_EVENT: u32 = 5;

/// Bounds a requested cart quantity to `1..=MAX_TICKETS_PER_EVENT`.
pub fn clamp_quantity(requested: i64) -> u32 {
    let clamped = requested.clamp(1, i64::from(MAX_TICKETS_PER_EVENT));
    u32::try_from(clamped).unwrap_or(1)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub event_id: EventId,
    pub title: String,
    pub price: Decimal,
    pub date: String,
    pub time: String,
    pub location: String,
    pub building: String,
    pub room: String,
    pub category: String,
    pub image: String,
    pub organizer: String,
    pub quantity: u32,
    /// Display only.
    pub max_attendees: u32,
    /// Display only.
    pub attendees: u32,
}

impl CartItem {
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Success,
    Error,
    Info,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub title: String,
    pub message: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    pub read: bool,
    pub timestamp: DateTime<Utc>,
}

/// A notification before the store assigns its id and timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
}

impl NewNotification {
    pub fn new(
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
            kind,
            read: false,
        }
    }

    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationKind::Success)
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(title, message, NotificationKind::Error)
    }

    pub fn already_read(mut self) -> Self {
        self.read = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Confirmed,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: String,
    pub event_id: EventId,
    pub title: String,
    pub category: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub building: String,
    pub room: String,
    pub price: Decimal,
    pub purchase_date: String,
    pub status: TicketStatus,
    pub image: String,
    pub organizer: String,
    pub organizer_contact: String,
    pub organizer_email: String,
    pub qr_code: String,
    pub seat_number: String,
    pub ticket_type: String,
    pub order_number: String,
    pub payment_method: String,
    pub refundable: bool,
    pub transferable: bool,
    pub description: String,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refund_status: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Admin => "admin",
        }
    }
}

/// The signed-in identity held by the session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<String>,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Partial profile update. Present fields replace, absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub department: Option<String>,
    pub year: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
}

impl UserPatch {
    pub fn apply(self, user: &mut User) {
        if let Some(name) = self.name {
            user.name = name;
        }
        if let Some(email) = self.email {
            user.email = email;
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(department) = self.department {
            user.department = department;
        }
        if let Some(year) = self.year {
            user.year = Some(year);
        }
        if let Some(phone) = self.phone {
            user.phone = phone;
        }
        if let Some(avatar) = self.avatar {
            user.avatar = Some(avatar);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn student() -> User {
        User {
            id: "7".to_string(),
            name: "John Doe".to_string(),
            email: "john.doe@college.edu".to_string(),
            role: Role::Student,
            department: "Computer Science".to_string(),
            year: Some("3rd Year".to_string()),
            phone: "+91 98765 43210".to_string(),
            avatar: None,
        }
    }

    #[test]
    fn clamp_quantity_bounds_to_ticket_limit() {
        assert_eq!(clamp_quantity(-3), 1);
        assert_eq!(clamp_quantity(0), 1);
        assert_eq!(clamp_quantity(3), 3);
        assert_eq!(clamp_quantity(6), MAX_TICKETS_PER_EVENT);
    }

    #[test]
    fn patch_overrides_present_fields_only() {
        let mut user = student();
        UserPatch {
            phone: Some("+91 90000 00000".to_string()),
            avatar: Some("/me.png".to_string()),
            ..UserPatch::default()
        }
        .apply(&mut user);

        assert_eq!(user.phone, "+91 90000 00000");
        assert_eq!(user.avatar.as_deref(), Some("/me.png"));
        assert_eq!(user.name, "John Doe");
        assert_eq!(user.year.as_deref(), Some("3rd Year"));
    }

    #[test]
    fn empty_patch_is_identity() {
        let mut user = student();
        UserPatch::default().apply(&mut user);
        assert_eq!(user, student());
    }

    #[test]
    fn notification_kind_serializes_as_type() {
        let notification = Notification {
            id: "1".to_string(),
            title: "t".to_string(),
            message: "m".to_string(),
            kind: NotificationKind::Warning,
            read: false,
            timestamp: Utc::now(),
        };
        let value = serde_json::to_value(&notification).unwrap();
        assert_eq!(value["type"], "warning");
    }
}
