use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Postgres, QueryBuilder};

use super::{Store, StoreError};
use crate::models::registration::{admit, Rejection, RegistrationStatus};
use crate::models::{
    DashboardStats, Event, EventQuery, Feedback, FeedbackRequest, NewEvent, NewUser,
    Registration, RegistrationWithEvent, RegistrationWithUser, User,
};

const USER_REGISTRATIONS_SQL: &str = "\
SELECT r.*, e.title, e.description, e.category, e.date, e.start_time, e.end_time, \
       e.venue, e.price, e.contact_email, e.contact_phone \
FROM registrations r \
JOIN events e ON r.event_id = e.id \
WHERE r.user_id = $1 \
ORDER BY r.created_at DESC, r.id DESC";

const EVENT_REGISTRATIONS_SQL: &str = "\
SELECT r.*, u.first_name, u.last_name, u.email, u.phone, u.student_id \
FROM registrations r \
JOIN users u ON r.user_id = u.id \
WHERE r.event_id = $1 \
ORDER BY r.created_at DESC, r.id DESC";

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;
        Ok(Self::new(pool))
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!().run(&self.pool).await
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl Store for PgStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    async fn create_user(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(
            "INSERT INTO users (first_name, last_name, email, password, phone, role, department, year, student_id, admin_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             RETURNING *",
        )
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.phone)
        .bind(user.role.as_str())
        .bind(&user.department)
        .bind(&user.year)
        .bind(&user.student_id)
        .bind(&user.admin_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::EmailTaken
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn list_events(&self, query: &EventQuery) -> Result<Vec<Event>, StoreError> {
        let mut builder =
            QueryBuilder::<Postgres>::new("SELECT * FROM events WHERE published = true");

        if let Some(category) = query.category_filter() {
            builder.push(" AND category = ").push_bind(category.to_string());
        }

        if let Some(term) = query.search_term() {
            let pattern = format!("%{term}%");
            builder
                .push(" AND (title ILIKE ")
                .push_bind(pattern.clone())
                .push(" OR description ILIKE ")
                .push_bind(pattern)
                .push(")");
        }

        builder
            .push(" ORDER BY created_at DESC, id DESC LIMIT ")
            .push_bind(query.effective_limit());

        let events = builder
            .build_query_as::<Event>()
            .fetch_all(&self.pool)
            .await?;
        Ok(events)
    }

    async fn get_event(&self, id: i32) -> Result<Option<Event>, StoreError> {
        let event = sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(event)
    }

    async fn create_event(&self, event: NewEvent, created_by: i32) -> Result<Event, StoreError> {
        let created = sqlx::query_as::<_, Event>(
            "INSERT INTO events (title, description, category, date, start_time, end_time, venue, price, \
             max_participants, contact_email, contact_phone, published, featured_event, image_url, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             RETURNING *",
        )
        .bind(&event.title)
        .bind(&event.description)
        .bind(&event.category)
        .bind(event.date)
        .bind(event.start_time)
        .bind(event.end_time)
        .bind(&event.venue)
        .bind(event.price)
        .bind(event.max_participants)
        .bind(&event.contact_email)
        .bind(&event.contact_phone)
        .bind(event.published)
        .bind(event.featured_event)
        .bind(&event.image_url)
        .bind(created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn register_for_event(
        &self,
        event_id: i32,
        user_id: i32,
        quantity: i32,
    ) -> Result<Registration, StoreError> {
        let mut tx = self.pool.begin().await?;

        // Row lock serializes concurrent registrations for the same event.
        let event: Option<(i32, Decimal)> = sqlx::query_as(
            "SELECT max_participants, price FROM events WHERE id = $1 FOR UPDATE",
        )
        .bind(event_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((max_participants, price)) = event else {
            return Err(StoreError::EventNotFound(event_id));
        };

        let confirmed: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(quantity), 0)::BIGINT FROM registrations \
             WHERE event_id = $1 AND status = $2",
        )
        .bind(event_id)
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_one(&mut *tx)
        .await?;

        let already_registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM registrations WHERE event_id = $1 AND user_id = $2)",
        )
        .bind(event_id)
        .bind(user_id)
        .fetch_one(&mut *tx)
        .await?;

        admit(max_participants, confirmed, quantity, already_registered)?;

        let registration = sqlx::query_as::<_, Registration>(
            "INSERT INTO registrations (event_id, user_id, quantity, total_amount, status) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING *",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(quantity)
        .bind(price * Decimal::from(quantity))
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::Rejected(Rejection::AlreadyRegistered)
            } else {
                StoreError::Database(e)
            }
        })?;

        tx.commit().await?;

        Ok(registration)
    }

    async fn user_registrations(
        &self,
        user_id: i32,
    ) -> Result<Vec<RegistrationWithEvent>, StoreError> {
        let rows = sqlx::query_as::<_, RegistrationWithEvent>(USER_REGISTRATIONS_SQL)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn submit_feedback(
        &self,
        event_id: i32,
        user_id: i32,
        feedback: FeedbackRequest,
    ) -> Result<Feedback, StoreError> {
        let registered: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM registrations \
             WHERE event_id = $1 AND user_id = $2 AND status = $3)",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_one(&self.pool)
        .await?;

        if !registered {
            return Err(StoreError::NotRegistered);
        }

        sqlx::query_as::<_, Feedback>(
            "INSERT INTO feedback (event_id, user_id, rating, comment) \
             VALUES ($1, $2, $3, $4) \
             RETURNING *",
        )
        .bind(event_id)
        .bind(user_id)
        .bind(feedback.rating)
        .bind(&feedback.comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                StoreError::FeedbackExists
            } else {
                StoreError::Database(e)
            }
        })
    }

    async fn event_registrations(
        &self,
        event_id: i32,
    ) -> Result<Vec<RegistrationWithUser>, StoreError> {
        let rows = sqlx::query_as::<_, RegistrationWithUser>(EVENT_REGISTRATIONS_SQL)
            .bind(event_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let total_events: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;

        let total_registrations: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM registrations")
            .fetch_one(&self.pool)
            .await?;

        let total_revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total_amount), 0) FROM registrations WHERE status = $1",
        )
        .bind(RegistrationStatus::Confirmed.as_str())
        .fetch_one(&self.pool)
        .await?;

        let upcoming_events: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM events WHERE date >= CURRENT_DATE")
                .fetch_one(&self.pool)
                .await?;

        Ok(DashboardStats {
            total_events,
            total_registrations,
            total_revenue,
            upcoming_events,
        })
    }
}
