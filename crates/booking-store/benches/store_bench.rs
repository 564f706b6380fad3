use booking_store::{
    BookingId, BookingRecord, BookingStore, InMemoryBookingStore, PageRequest, UserId, Version,
};
use chrono::Utc;
use criterion::{Criterion, criterion_group, criterion_main};

fn make_record(owner_id: UserId, n: usize) -> BookingRecord {
    let now = Utc::now();
    BookingRecord {
        id: BookingId::new(),
        booking_number: format!("BK-{n:06}"),
        owner_id,
        runner_id: None,
        status: "requested".to_string(),
        pet_spec: serde_json::json!({"pet_type": "dog", "name": "Rex", "weight_kg": 12.0}),
        crate_requirement: serde_json::json!({"minimum_size": "medium"}),
        pickup_address: serde_json::json!({"line1": "1 Jalan Ampang"}),
        dropoff_address: serde_json::json!({"line1": "2 Jalan Tun Razak"}),
        route_spec: None,
        estimated_price_cents: 4000,
        final_price_cents: None,
        currency: "MYR".to_string(),
        scheduled_at: None,
        picked_up_at: None,
        delivered_at: None,
        cancelled_at: None,
        cancel_note: String::new(),
        notes: String::new(),
        version: Version::first(),
        created_at: now,
        updated_at: now,
    }
}

fn bench_insert(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("booking_store/insert", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryBookingStore::new();
                store
                    .insert(make_record(UserId::new(), 1))
                    .await
                    .unwrap();
            });
        });
    });
}

fn bench_conditional_update(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();

    c.bench_function("booking_store/conditional_update", |b| {
        b.iter(|| {
            rt.block_on(async {
                let store = InMemoryBookingStore::new();
                let record = make_record(UserId::new(), 1);
                store.insert(record.clone()).await.unwrap();

                let mut next = record;
                next.status = "accepted".to_string();
                next.version = next.version.next();
                store.update(next).await.unwrap();
            });
        });
    });
}

fn bench_owner_page(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryBookingStore::new();
    let owner = UserId::new();

    // 1000 bookings, half of them for the owner under test
    rt.block_on(async {
        for n in 0..1000 {
            let owner_id = if n % 2 == 0 { owner } else { UserId::new() };
            store.insert(make_record(owner_id, n)).await.unwrap();
        }
    });

    c.bench_function("booking_store/owner_page_of_20", |b| {
        b.iter(|| {
            rt.block_on(async {
                let page = store
                    .find_by_owner_id(owner, PageRequest::first())
                    .await
                    .unwrap();
                assert_eq!(page.total, 500);
            });
        });
    });
}

fn bench_count_by_status(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let store = InMemoryBookingStore::new();

    rt.block_on(async {
        for n in 0..1000 {
            store.insert(make_record(UserId::new(), n)).await.unwrap();
        }
    });

    c.bench_function("booking_store/count_by_status_1000", |b| {
        b.iter(|| {
            rt.block_on(async {
                store.count_by_status().await.unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_insert,
    bench_conditional_update,
    bench_owner_page,
    bench_count_by_status,
);
criterion_main!(benches);
