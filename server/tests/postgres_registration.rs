//! Registration invariants against a live database.
//!
//! Run with `DATABASE_URL=postgres://... cargo test -- --ignored`.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use testresult::TestResult;

use campus_buzz_server::models::registration::Rejection;
use campus_buzz_server::models::{NewEvent, NewUser, Role};
use campus_buzz_server::store::{PgStore, Store, StoreError};

async fn store() -> Result<PgStore, Box<dyn std::error::Error>> {
    let url = std::env::var("DATABASE_URL")?;
    let store = PgStore::connect(&url, 10).await?;
    store.migrate().await?;
    Ok(store)
}

fn unique_suffix() -> String {
    format!(
        "{}-{}",
        std::process::id(),
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}

async fn user(store: &PgStore, tag: &str) -> Result<i32, StoreError> {
    let created = store
        .create_user(NewUser {
            first_name: "Load".to_string(),
            last_name: "Tester".to_string(),
            email: format!("{tag}-{}@college.edu", unique_suffix()),
            password_hash: "not-a-real-hash".to_string(),
            phone: None,
            role: Role::Student,
            department: None,
            year: None,
            student_id: None,
            admin_id: None,
        })
        .await?;
    Ok(created.id)
}

async fn event(store: &PgStore, max_participants: i32) -> Result<i32, StoreError> {
    let created = store
        .create_event(
            NewEvent {
                title: format!("Capacity check {}", unique_suffix()),
                description: None,
                category: "Technology".to_string(),
                date: NaiveDate::from_ymd_opt(2030, 1, 1).unwrap(),
                start_time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
                end_time: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
                venue: "Seminar Hall".to_string(),
                price: Decimal::new(50, 0),
                max_participants,
                contact_email: "events@college.edu".to_string(),
                contact_phone: None,
                published: false,
                featured_event: false,
                image_url: None,
            },
            user(store, "organizer").await?,
        )
        .await?;
    Ok(created.id)
}

async fn confirmed_seats(store: &PgStore, event_id: i32) -> Result<i32, StoreError> {
    Ok(store
        .event_registrations(event_id)
        .await?
        .iter()
        .map(|r| r.registration.quantity)
        .sum())
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn over_capacity_request_leaves_no_row() -> TestResult {
    let store = store().await?;
    let event_id = event(&store, 4).await?;

    store
        .register_for_event(event_id, user(&store, "a").await?, 3)
        .await?;
    let err = store
        .register_for_event(event_id, user(&store, "b").await?, 2)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        StoreError::Rejected(Rejection::CapacityExceeded)
    ));
    assert_eq!(store.event_registrations(event_id).await?.len(), 1);
    Ok(())
}

#[tokio::test]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn duplicate_registration_is_rejected() -> TestResult {
    let store = store().await?;
    let event_id = event(&store, 10).await?;
    let user_id = user(&store, "dup").await?;

    let first = store.register_for_event(event_id, user_id, 2).await?;
    assert_eq!(first.total_amount, Decimal::new(100, 0));

    let err = store
        .register_for_event(event_id, user_id, 1)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        StoreError::Rejected(Rejection::AlreadyRegistered)
    ));
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore = "requires a Postgres DATABASE_URL"]
async fn concurrent_registrations_never_exceed_capacity() -> TestResult {
    let store = Arc::new(store().await?);
    let event_id = event(&store, 7).await?;

    let mut users = Vec::new();
    for i in 0..20 {
        users.push(user(&store, &format!("c{i}")).await?);
    }

    let handles: Vec<_> = users
        .into_iter()
        .map(|user_id| {
            let store = store.clone();
            tokio::spawn(async move { store.register_for_event(event_id, user_id, 2).await })
        })
        .collect();

    let mut admitted = 0;
    for handle in handles {
        match handle.await? {
            Ok(_) => admitted += 1,
            Err(StoreError::Rejected(Rejection::CapacityExceeded)) => {}
            Err(other) => return Err(other.into()),
        }
    }

    assert_eq!(admitted, 3);
    assert_eq!(confirmed_seats(&store, event_id).await?, 6);
    Ok(())
}
