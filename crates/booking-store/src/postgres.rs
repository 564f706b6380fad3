use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};
use uuid::Uuid;

use crate::{
    BookingId, BookingRecord, Page, PageRequest, Result, StoreError, UserId, Version,
    store::{BookingStore, validate_record_for_insert, validate_record_for_update},
};

const SELECT_COLUMNS: &str = r#"
    SELECT id, booking_number, owner_id, runner_id, status, pet_spec, crate_requirement,
           pickup_address, dropoff_address, route_spec, estimated_price_cents,
           final_price_cents, currency, scheduled_at, picked_up_at, delivered_at,
           cancelled_at, cancel_note, notes, version, created_at, updated_at
    FROM bookings
"#;

/// PostgreSQL-backed booking store implementation.
#[derive(Clone)]
pub struct PostgresBookingStore {
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Creates a new PostgreSQL booking store.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    fn row_to_record(row: PgRow) -> Result<BookingRecord> {
        Ok(BookingRecord {
            id: BookingId::from_uuid(row.try_get::<Uuid, _>("id")?),
            booking_number: row.try_get("booking_number")?,
            owner_id: UserId::from_uuid(row.try_get::<Uuid, _>("owner_id")?),
            runner_id: row
                .try_get::<Option<Uuid>, _>("runner_id")?
                .map(UserId::from_uuid),
            status: row.try_get("status")?,
            pet_spec: row.try_get("pet_spec")?,
            crate_requirement: row.try_get("crate_requirement")?,
            pickup_address: row.try_get("pickup_address")?,
            dropoff_address: row.try_get("dropoff_address")?,
            route_spec: row.try_get("route_spec")?,
            estimated_price_cents: row.try_get("estimated_price_cents")?,
            final_price_cents: row.try_get("final_price_cents")?,
            currency: row.try_get("currency")?,
            scheduled_at: row.try_get("scheduled_at")?,
            picked_up_at: row.try_get("picked_up_at")?,
            delivered_at: row.try_get("delivered_at")?,
            cancelled_at: row.try_get("cancelled_at")?,
            cancel_note: row.try_get("cancel_note")?,
            notes: row.try_get("notes")?,
            version: Version::new(row.try_get("version")?),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    async fn fetch_page(
        &self,
        filter: Option<(&str, Uuid)>,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>> {
        let (where_clause, count_sql) = match filter {
            Some((column, _)) => (
                format!(" WHERE {column} = $1"),
                format!("SELECT COUNT(*) FROM bookings WHERE {column} = $1"),
            ),
            None => (String::new(), "SELECT COUNT(*) FROM bookings".to_string()),
        };

        let (limit_param, offset_param) = if filter.is_some() { (2, 3) } else { (1, 2) };
        let sql = format!(
            "{SELECT_COLUMNS}{where_clause} ORDER BY created_at DESC, id ASC LIMIT ${limit_param} OFFSET ${offset_param}"
        );

        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
        let mut rows_query = sqlx::query(&sql);
        if let Some((_, value)) = filter {
            count_query = count_query.bind(value);
            rows_query = rows_query.bind(value);
        }

        let total = count_query.fetch_one(&self.pool).await?;
        let rows = rows_query
            .bind(i64::from(page.limit()))
            .bind(page.offset() as i64)
            .fetch_all(&self.pool)
            .await?;

        let items = rows
            .into_iter()
            .map(Self::row_to_record)
            .collect::<Result<Vec<_>>>()?;

        Ok(Page::new(items, total, page))
    }
}

#[async_trait]
impl BookingStore for PostgresBookingStore {
    async fn find_by_id(&self, id: BookingId) -> Result<Option<BookingRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE id = $1");
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn find_by_number(&self, booking_number: &str) -> Result<Option<BookingRecord>> {
        let sql = format!("{SELECT_COLUMNS} WHERE booking_number = $1");
        let row = sqlx::query(&sql)
            .bind(booking_number)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Self::row_to_record).transpose()
    }

    async fn find_by_owner_id(
        &self,
        owner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>> {
        self.fetch_page(Some(("owner_id", owner_id.as_uuid())), page)
            .await
    }

    async fn find_by_runner_id(
        &self,
        runner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<BookingRecord>> {
        self.fetch_page(Some(("runner_id", runner_id.as_uuid())), page)
            .await
    }

    async fn list_all(&self, page: PageRequest) -> Result<Page<BookingRecord>> {
        self.fetch_page(None, page).await
    }

    async fn count_by_status(&self) -> Result<HashMap<String, i64>> {
        let rows = sqlx::query("SELECT status, COUNT(*) AS count FROM bookings GROUP BY status")
            .fetch_all(&self.pool)
            .await?;

        let mut counts = HashMap::with_capacity(rows.len());
        for row in rows {
            counts.insert(row.try_get("status")?, row.try_get("count")?);
        }
        Ok(counts)
    }

    async fn insert(&self, record: BookingRecord) -> Result<()> {
        validate_record_for_insert(&record)?;

        sqlx::query(
            r#"
            INSERT INTO bookings (
                id, booking_number, owner_id, runner_id, status, pet_spec, crate_requirement,
                pickup_address, dropoff_address, route_spec, estimated_price_cents,
                final_price_cents, currency, scheduled_at, picked_up_at, delivered_at,
                cancelled_at, cancel_note, notes, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11,
                    $12, $13, $14, $15, $16, $17, $18, $19, $20, $21, $22)
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(&record.booking_number)
        .bind(record.owner_id.as_uuid())
        .bind(record.runner_id.map(|id| id.as_uuid()))
        .bind(&record.status)
        .bind(&record.pet_spec)
        .bind(&record.crate_requirement)
        .bind(&record.pickup_address)
        .bind(&record.dropoff_address)
        .bind(&record.route_spec)
        .bind(record.estimated_price_cents)
        .bind(record.final_price_cents)
        .bind(&record.currency)
        .bind(record.scheduled_at)
        .bind(record.picked_up_at)
        .bind(record.delivered_at)
        .bind(record.cancelled_at)
        .bind(&record.cancel_note)
        .bind(&record.notes)
        .bind(record.version.as_i64())
        .bind(record.created_at)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                match db_err.constraint() {
                    Some("bookings_pkey") => {
                        return StoreError::Duplicate {
                            field: "id",
                            value: record.id.to_string(),
                        };
                    }
                    Some("unique_booking_number") => {
                        return StoreError::Duplicate {
                            field: "booking_number",
                            value: record.booking_number.clone(),
                        };
                    }
                    _ => {}
                }
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn update(&self, record: BookingRecord) -> Result<()> {
        validate_record_for_update(&record)?;

        let expected = record.expected_stored_version();

        let result = sqlx::query(
            r#"
            UPDATE bookings SET
                runner_id = $3,
                status = $4,
                pet_spec = $5,
                crate_requirement = $6,
                pickup_address = $7,
                dropoff_address = $8,
                route_spec = $9,
                estimated_price_cents = $10,
                final_price_cents = $11,
                currency = $12,
                scheduled_at = $13,
                picked_up_at = $14,
                delivered_at = $15,
                cancelled_at = $16,
                cancel_note = $17,
                notes = $18,
                version = $19,
                updated_at = $20
            WHERE id = $1 AND version = $2
            "#,
        )
        .bind(record.id.as_uuid())
        .bind(expected.as_i64())
        .bind(record.runner_id.map(|id| id.as_uuid()))
        .bind(&record.status)
        .bind(&record.pet_spec)
        .bind(&record.crate_requirement)
        .bind(&record.pickup_address)
        .bind(&record.dropoff_address)
        .bind(&record.route_spec)
        .bind(record.estimated_price_cents)
        .bind(record.final_price_cents)
        .bind(&record.currency)
        .bind(record.scheduled_at)
        .bind(record.picked_up_at)
        .bind(record.delivered_at)
        .bind(record.cancelled_at)
        .bind(&record.cancel_note)
        .bind(&record.notes)
        .bind(record.version.as_i64())
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            tracing::debug!(booking_id = %record.id, %expected, "conditional update matched no row");
            return Err(StoreError::VersionConflict {
                booking_id: record.id,
                expected,
            });
        }

        Ok(())
    }
}
