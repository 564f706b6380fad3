use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    BookingId, BookingRecord, Page, PageRequest, Result, StoreError, UserId,
    store::{BookingStore, validate_record_for_insert, validate_record_for_update},
};

#[derive(Default)]
struct Tables {
    rows: HashMap<BookingId, BookingRecord>,
    numbers: HashMap<String, BookingId>,
}

/// In-memory booking store implementation.
///
/// Provides the same contract as the PostgreSQL implementation. The version
/// check and the write happen under one write lock, which makes `update` an
/// atomic compare-and-swap.
#[derive(Clone, Default)]
pub struct InMemoryBookingStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryBookingStore {
    /// Creates a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the total number of bookings stored.
    pub async fn booking_count(&self) -> usize {
        self.tables.read().await.rows.len()
    }

    /// Removes every booking.
    pub async fn clear(&self) {
        let mut tables = self.tables.write().await;
        tables.rows.clear();
        tables.numbers.clear();
    }

    async fn page_where(
        &self,
        page: PageRequest,
        filter: impl Fn(&BookingRecord) -> bool,
    ) -> Page<BookingRecord> {
        let tables = self.tables.read().await;
        let mut matching: Vec<_> = tables.rows.values().filter(|r| filter(r)).collect();

        // Newest first; id breaks ties so paging is stable.
        matching.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then(a.id.as_uuid().cmp(&b.id.as_uuid()))
        });

        let total = matching.len() as i64;
        let items = matching
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .cloned()
            .collect();

        Page::new(items, total, page)
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn find_by_id(&self, id: BookingId) -> Result<Option<BookingRecord>> {
        let tables = self.tables.read().await;
        Ok(tables.rows.get(&id).cloned())
    }

    async fn find_by_number(&self, booking_number: &str) -> Result<Option<BookingRecord>> {
        let tables = self.tables.read().await;
        Ok(tables
            .numbers
            .get(booking_number)
            .and_then(|id| tables.rows.get(id))
            .cloned())
    }

    async fn find_by_owner_id(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>> {
        Ok(self.page_where(page, |r| r.owner_id == owner_id).await)
    }

    async fn find_by_runner_id(
        &self,
        runner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>> {
        Ok(self
            .page_where(page, |r| r.runner_id == Some(runner_id))
            .await)
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<BookingRecord>> {
        Ok(self.page_where(page, |_| true).await)
    }

    async fn count_by_status(&self) -> Result<HashMap<String, i64>> {
        let tables = self.tables.read().await;
        let mut counts = HashMap::new();
        for record in tables.rows.values() {
            *counts.entry(record.status.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn insert(&self, record: BookingRecord) -> Result<()> {
        validate_record_for_insert(&record)?;

        let mut tables = self.tables.write().await;

        if tables.rows.contains_key(&record.id) {
            return Err(StoreError::Duplicate {
                field: "id",
                value: record.id.to_string(),
            });
        }
        if tables.numbers.contains_key(&record.booking_number) {
            return Err(StoreError::Duplicate {
                field: "booking_number",
                value: record.booking_number,
            });
        }

        tables
            .numbers
            .insert(record.booking_number.clone(), record.id);
        tables.rows.insert(record.id, record);

        Ok(())
    }

    async fn update(&self, record: BookingRecord) -> Result<()> {
        validate_record_for_update(&record)?;

        let expected = record.expected_stored_version();
        let mut tables = self.tables.write().await;

        let Some(stored) = tables.rows.get_mut(&record.id) else {
            tracing::debug!(booking_id = %record.id, "update matched no booking");
            return Err(StoreError::VersionConflict {
                booking_id: record.id,
                expected,
            });
        };

        if stored.version != expected {
            tracing::debug!(
                booking_id = %record.id,
                %expected,
                actual = %stored.version,
                "stale booking version"
            );
            return Err(StoreError::VersionConflict {
                booking_id: record.id,
                expected,
            });
        }

        // Identity columns are never rewritten by an update.
        let BookingRecord {
            id: _,
            booking_number: _,
            owner_id: _,
            created_at: _,
            runner_id,
            status,
            pet_spec,
            crate_requirement,
            pickup_address,
            dropoff_address,
            route_spec,
            estimated_price_cents,
            final_price_cents,
            currency,
            scheduled_at,
            picked_up_at,
            delivered_at,
            cancelled_at,
            cancel_note,
            notes,
            version,
            updated_at,
        } = record;

        stored.runner_id = runner_id;
        stored.status = status;
        stored.pet_spec = pet_spec;
        stored.crate_requirement = crate_requirement;
        stored.pickup_address = pickup_address;
        stored.dropoff_address = dropoff_address;
        stored.route_spec = route_spec;
        stored.estimated_price_cents = estimated_price_cents;
        stored.final_price_cents = final_price_cents;
        stored.currency = currency;
        stored.scheduled_at = scheduled_at;
        stored.picked_up_at = picked_up_at;
        stored.delivered_at = delivered_at;
        stored.cancelled_at = cancelled_at;
        stored.cancel_note = cancel_note;
        stored.notes = notes;
        stored.version = version;
        stored.updated_at = updated_at;

        Ok(())
    }
}
