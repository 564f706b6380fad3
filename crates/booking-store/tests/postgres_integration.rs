//! PostgreSQL integration tests
//!
//! These tests use a shared PostgreSQL container for efficiency and are
//! serialized because each one truncates the bookings table.
//!
//! ```bash
//! cargo test -p booking-store --test postgres_integration
//! ```

use std::sync::Arc;

use booking_store::{
    BookingId, BookingRecord, BookingStore, PageRequest, PostgresBookingStore, StoreError, UserId,
    Version,
};
use chrono::{Duration, DurationRound, Utc};
use serial_test::serial;
use sqlx::PgPool;
use testcontainers::{ContainerAsync, runners::AsyncRunner};
use testcontainers_modules::postgres::Postgres;
use tokio::sync::OnceCell;

/// Shared container info - container stays alive for all tests
struct ContainerInfo {
    #[allow(dead_code)] // Container must stay alive for tests
    container: ContainerAsync<Postgres>,
    connection_string: String,
}

/// Global shared container
static CONTAINER: OnceCell<Arc<ContainerInfo>> = OnceCell::const_new();

async fn get_container_info() -> Arc<ContainerInfo> {
    CONTAINER
        .get_or_init(|| async {
            let container = Postgres::default().start().await.unwrap();

            let host = container.get_host().await.unwrap();
            let port = container.get_host_port_ipv4(5432).await.unwrap();

            let connection_string =
                format!("postgres://postgres:postgres@{}:{}/postgres", host, port);

            let temp_pool = PgPool::connect(&connection_string).await.unwrap();

            sqlx::raw_sql(include_str!(
                "../../../migrations/001_create_bookings_table.sql"
            ))
            .execute(&temp_pool)
            .await
            .unwrap();

            temp_pool.close().await;

            Arc::new(ContainerInfo {
                container,
                connection_string,
            })
        })
        .await
        .clone()
}

/// Get a fresh store with its own pool and an empty bookings table
async fn get_test_store() -> PostgresBookingStore {
    let info = get_container_info().await;

    let pool = sqlx::postgres::PgPoolOptions::new()
        .max_connections(5)
        .connect(&info.connection_string)
        .await
        .unwrap();

    sqlx::query("TRUNCATE TABLE bookings")
        .execute(&pool)
        .await
        .unwrap();

    PostgresBookingStore::new(pool)
}

fn create_test_record(number: &str, owner_id: UserId) -> BookingRecord {
    // Postgres keeps microseconds; truncate so round-trips compare equal.
    let now = Utc::now()
        .duration_trunc(Duration::microseconds(1))
        .unwrap();
    BookingRecord {
        id: BookingId::new(),
        booking_number: number.to_string(),
        owner_id,
        runner_id: None,
        status: "requested".to_string(),
        pet_spec: serde_json::json!({"pet_type": "cat", "name": "Milo", "weight_kg": 4.0}),
        crate_requirement: serde_json::json!({"minimum_size": "small", "needs_ventilation": true}),
        pickup_address: serde_json::json!({"line1": "1 Jalan Ampang", "latitude": 3.15, "longitude": 101.7}),
        dropoff_address: serde_json::json!({"line1": "9 Jalan Klang Lama", "latitude": 3.1, "longitude": 101.68}),
        route_spec: None,
        estimated_price_cents: 2150,
        final_price_cents: None,
        currency: "MYR".to_string(),
        scheduled_at: None,
        picked_up_at: None,
        delivered_at: None,
        cancelled_at: None,
        cancel_note: String::new(),
        notes: "ring the bell".to_string(),
        version: Version::first(),
        created_at: now,
        updated_at: now,
    }
}

fn next_revision(record: &BookingRecord, status: &str) -> BookingRecord {
    let mut next = record.clone();
    next.status = status.to_string();
    next.version = record.version.next();
    next
}

#[tokio::test]
#[serial]
async fn insert_and_retrieve_booking() {
    let store = get_test_store().await;
    let record = create_test_record("BK-PG0001", UserId::new());

    store.insert(record.clone()).await.unwrap();

    let by_id = store.find_by_id(record.id).await.unwrap();
    assert_eq!(by_id, Some(record.clone()));

    let by_number = store.find_by_number("BK-PG0001").await.unwrap();
    assert_eq!(by_number.map(|r| r.id), Some(record.id));
}

#[tokio::test]
#[serial]
async fn missing_booking_returns_none() {
    let store = get_test_store().await;
    assert!(store.find_by_id(BookingId::new()).await.unwrap().is_none());
    assert!(store.find_by_number("BK-NOPE00").await.unwrap().is_none());
}

#[tokio::test]
#[serial]
async fn duplicate_booking_number_is_rejected() {
    let store = get_test_store().await;
    store
        .insert(create_test_record("BK-DUP001", UserId::new()))
        .await
        .unwrap();

    let result = store
        .insert(create_test_record("BK-DUP001", UserId::new()))
        .await;

    assert!(matches!(
        result,
        Err(StoreError::Duplicate {
            field: "booking_number",
            ..
        })
    ));
}

#[tokio::test]
#[serial]
async fn duplicate_id_is_rejected() {
    let store = get_test_store().await;
    let record = create_test_record("BK-ID0001", UserId::new());
    store.insert(record.clone()).await.unwrap();

    let mut again = record;
    again.booking_number = "BK-ID0002".to_string();
    let result = store.insert(again).await;

    assert!(matches!(
        result,
        Err(StoreError::Duplicate { field: "id", .. })
    ));
}

#[tokio::test]
#[serial]
async fn conditional_update_applies_on_expected_version() {
    let store = get_test_store().await;
    let record = create_test_record("BK-UPD001", UserId::new());
    store.insert(record.clone()).await.unwrap();

    let runner = UserId::new();
    let mut accepted = next_revision(&record, "accepted");
    accepted.runner_id = Some(runner);
    accepted.route_spec = Some(serde_json::json!({"distance_km": 6.2}));
    store.update(accepted.clone()).await.unwrap();

    let stored = store.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "accepted");
    assert_eq!(stored.runner_id, Some(runner));
    assert_eq!(stored.version, Version::new(2));
    assert_eq!(stored.route_spec, accepted.route_spec);
}

#[tokio::test]
#[serial]
async fn stale_update_is_a_conflict() {
    let store = get_test_store().await;
    let record = create_test_record("BK-UPD002", UserId::new());
    store.insert(record.clone()).await.unwrap();

    store
        .update(next_revision(&record, "accepted"))
        .await
        .unwrap();
    let result = store.update(next_revision(&record, "cancelled")).await;

    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));

    let stored = store.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.status, "accepted");
    assert_eq!(stored.version, Version::new(2));
}

#[tokio::test]
#[serial]
async fn update_of_missing_booking_is_a_conflict() {
    let store = get_test_store().await;
    let record = create_test_record("BK-GONE01", UserId::new());

    let result = store.update(next_revision(&record, "accepted")).await;
    assert!(matches!(result, Err(StoreError::VersionConflict { .. })));
}

#[tokio::test]
#[serial]
async fn concurrent_updates_exactly_one_wins() {
    let store = get_test_store().await;
    let record = create_test_record("BK-RACE01", UserId::new());
    store.insert(record.clone()).await.unwrap();

    let a = {
        let store = store.clone();
        let next = next_revision(&record, "accepted");
        tokio::spawn(async move { store.update(next).await })
    };
    let b = {
        let store = store.clone();
        let next = next_revision(&record, "cancelled");
        tokio::spawn(async move { store.update(next).await })
    };

    let results = [a.await.unwrap(), b.await.unwrap()];
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(StoreError::VersionConflict { .. })))
        .count();

    assert_eq!(wins, 1);
    assert_eq!(conflicts, 1);

    let stored = store.find_by_id(record.id).await.unwrap().unwrap();
    assert_eq!(stored.version, Version::new(2));
}

#[tokio::test]
#[serial]
async fn owner_listing_is_paginated_newest_first() {
    let store = get_test_store().await;
    let owner = UserId::new();

    let mut ids = Vec::new();
    for i in 0..3 {
        let mut record = create_test_record(&format!("BK-OWN00{i}"), owner);
        record.created_at += Duration::seconds(i);
        ids.push(record.id);
        store.insert(record).await.unwrap();
    }
    store
        .insert(create_test_record("BK-OTHER1", UserId::new()))
        .await
        .unwrap();

    let page = store
        .find_by_owner_id(owner, PageRequest::new(1, 2))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, ids[2]);
    assert_eq!(page.items[1].id, ids[1]);

    let page = store
        .find_by_owner_id(owner, PageRequest::new(2, 2))
        .await
        .unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].id, ids[0]);

    let all = store.list_all(PageRequest::first()).await.unwrap();
    assert_eq!(all.total, 4);
}

#[tokio::test]
#[serial]
async fn runner_listing_and_status_counts() {
    let store = get_test_store().await;
    let runner = UserId::new();

    let first = create_test_record("BK-RUN001", UserId::new());
    store.insert(first.clone()).await.unwrap();
    store
        .insert(create_test_record("BK-RUN002", UserId::new()))
        .await
        .unwrap();

    let mut accepted = next_revision(&first, "accepted");
    accepted.runner_id = Some(runner);
    store.update(accepted).await.unwrap();

    let assigned = store
        .find_by_runner_id(runner, PageRequest::first())
        .await
        .unwrap();
    assert_eq!(assigned.total, 1);
    assert_eq!(assigned.items[0].id, first.id);

    let counts = store.count_by_status().await.unwrap();
    assert_eq!(counts.get("accepted"), Some(&1));
    assert_eq!(counts.get("requested"), Some(&1));
}
