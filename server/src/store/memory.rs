use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use super::{Store, StoreError};
use crate::models::registration::{admit, RegistrationStatus};
use crate::models::{
    DashboardStats, Event, EventQuery, Feedback, FeedbackRequest, NewEvent, NewUser,
    Registration, RegistrationWithEvent, RegistrationWithUser, User,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<User>,
    events: Vec<Event>,
    registrations: Vec<Registration>,
    feedback: Vec<Feedback>,
    next_id: i32,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn confirmed_quantity(&self, event_id: i32) -> i64 {
        self.registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.status == RegistrationStatus::Confirmed)
            .map(|r| i64::from(r.quantity))
            .sum()
    }
}

/// Process-local [`Store`]. One lock guards every table, so each operation
/// is atomic with respect to all others.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::EmailTaken);
        }

        let now = Utc::now();
        let created = User {
            id: tables.next_id(),
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            password: user.password_hash,
            phone: user.phone,
            role: user.role,
            department: user.department,
            year: user.year,
            student_id: user.student_id,
            admin_id: user.admin_id,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.lock().await;
        let mut events: Vec<Event> = tables
            .events
            .iter()
            .filter(|e| query.matches(e))
            .cloned()
            .collect();
        events.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        events.truncate(usize::try_from(query.effective_limit()).unwrap_or(usize::MAX));
        Ok(events)
    }

    async fn get_event(&self, id: i32) -> Result<Option<Event>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.events.iter().find(|e| e.id == id).cloned())
    }

    async fn create_event(&self, event: NewEvent, created_by: i32) -> Result<Event, StoreError> {
        let mut tables = self.tables.lock().await;
        let now = Utc::now();
        let created = Event {
            id: tables.next_id(),
            title: event.title,
            description: event.description,
            category: event.category,
            date: event.date,
            start_time: event.start_time,
            end_time: event.end_time,
            venue: event.venue,
            price: event.price,
            max_participants: event.max_participants,
            contact_email: event.contact_email,
            contact_phone: event.contact_phone,
            published: event.published,
            featured_event: event.featured_event,
            image_url: event.image_url,
            created_by: Some(created_by),
            created_at: now,
            updated_at: now,
        };
        tables.events.push(created.clone());
        Ok(created)
    }

    async fn register_for_event(
        &self,
        event_id: i32,
        user_id: i32,
        quantity: i32,
    ) -> Result<Registration, StoreError> {
        let mut tables = self.tables.lock().await;

        let (max_participants, price) = tables
            .events
            .iter()
            .find(|e| e.id == event_id)
            .map(|e| (e.max_participants, e.price))
            .ok_or(StoreError::EventNotFound(event_id))?;

        let already_registered = tables
            .registrations
            .iter()
            .any(|r| r.event_id == event_id && r.user_id == user_id);

        admit(
            max_participants,
            tables.confirmed_quantity(event_id),
            quantity,
            already_registered,
        )?;

        let registration = Registration {
            id: tables.next_id(),
            event_id,
            user_id,
            quantity,
            total_amount: price * Decimal::from(quantity),
            status: RegistrationStatus::Confirmed,
            payment_method: None,
            payment_status: "pending".to_string(),
            created_at: Utc::now(),
        };
        tables.registrations.push(registration.clone());
        Ok(registration)
    }

    async fn user_registrations(
        &self,
        user_id: i32,
    ) -> Result<Vec<RegistrationWithEvent>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<RegistrationWithEvent> = tables
            .registrations
            .iter()
            .filter(|r| r.user_id == user_id)
            .filter_map(|r| {
                let event = tables.events.iter().find(|e| e.id == r.event_id)?;
                Some(RegistrationWithEvent {
                    registration: r.clone(),
                    title: event.title.clone(),
                    description: event.description.clone(),
                    category: event.category.clone(),
                    date: event.date,
                    start_time: event.start_time,
                    end_time: event.end_time,
                    venue: event.venue.clone(),
                    price: event.price,
                    contact_email: event.contact_email.clone(),
                    contact_phone: event.contact_phone.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.registration.id.cmp(&a.registration.id));
        Ok(rows)
    }

    async fn submit_feedback(
        &self,
        event_id: i32,
        user_id: i32,
        feedback: FeedbackRequest,
    ) -> Result<Feedback, StoreError> {
        let mut tables = self.tables.lock().await;

        let registered = tables.registrations.iter().any(|r| {
            r.event_id == event_id
                && r.user_id == user_id
                && r.status == RegistrationStatus::Confirmed
        });
        if !registered {
            return Err(StoreError::NotRegistered);
        }

        if tables
            .feedback
            .iter()
            .any(|f| f.event_id == event_id && f.user_id == user_id)
        {
            return Err(StoreError::FeedbackExists);
        }

        let created = Feedback {
            id: tables.next_id(),
            event_id,
            user_id,
            rating: feedback.rating,
            comment: feedback.comment,
            created_at: Utc::now(),
        };
        tables.feedback.push(created.clone());
        Ok(created)
    }

    async fn event_registrations(
        &self,
        event_id: i32,
    ) -> Result<Vec<RegistrationWithUser>, StoreError> {
        let tables = self.tables.lock().await;
        let mut rows: Vec<RegistrationWithUser> = tables
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .filter_map(|r| {
                let user = tables.users.iter().find(|u| u.id == r.user_id)?;
                Some(RegistrationWithUser {
                    registration: r.clone(),
                    first_name: user.first_name.clone(),
                    last_name: user.last_name.clone(),
                    email: user.email.clone(),
                    phone: user.phone.clone(),
                    student_id: user.student_id.clone(),
                })
            })
            .collect();
        rows.sort_by(|a, b| b.registration.id.cmp(&a.registration.id));
        Ok(rows)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let tables = self.tables.lock().await;
        let today = Utc::now().date_naive();

        Ok(DashboardStats {
            total_events: tables.events.len() as i64,
            total_registrations: tables.registrations.len() as i64,
            total_revenue: tables
                .registrations
                .iter()
                .filter(|r| r.status == RegistrationStatus::Confirmed)
                .map(|r| r.total_amount)
                .sum(),
            upcoming_events: tables.events.iter().filter(|e| e.date >= today).count() as i64,
        })
    }
}
