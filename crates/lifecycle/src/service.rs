//! Booking service driving the lifecycle use cases.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use booking_store::{BookingStore, Page, PageRequest};
use common::{BookingId, UserId};
use domain::{
    AcceptBooking, Aggregate, Booking, BookingError, BookingEvent, BookingRepository,
    BookingStatus, CancelBooking, Command, CommandResult, CompleteBooking, ConfirmDelivery,
    CrateRequirement, CreateBooking, DomainEvent, NewBooking, PricingParams, PricingStrategy,
    RandomSource, RebookBooking, StandardPricing, StartDelivery, ThreadRandomSource,
    haversine_km,
};
use serde::Serialize;

use crate::envelope::IntegrationEvent;
use crate::error::{LifecycleError, Result};
use crate::publisher::EventPublisher;
use crate::topics::{BOOKING_EVENTS_TOPIC, SERVICE_SOURCE};

/// Settings the service stamps onto bookings and envelopes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LifecycleSettings {
    /// `source` attribute of published envelopes.
    pub source: String,
    /// Topic booking events are published on.
    pub booking_events_topic: String,
    /// Currency new bookings are priced in.
    pub currency: String,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            source: SERVICE_SOURCE.to_string(),
            booking_events_topic: BOOKING_EVENTS_TOPIC.to_string(),
            currency: "MYR".to_string(),
        }
    }
}

/// Booking totals for the admin dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookingStats {
    pub total_bookings: i64,
    pub by_status: HashMap<BookingStatus, i64>,
}

/// Service for managing bookings.
///
/// Every mutating use case loads the booking, applies one transition, bumps
/// the version and commits through the store's compare-and-swap. The event
/// is published only after the commit succeeds; a failed publish is logged
/// and does not undo the commit. A lost race surfaces as
/// [`LifecycleError::Conflict`] and is never retried here.
pub struct BookingService<S: BookingStore, P: EventPublisher> {
    repo: BookingRepository<S>,
    publisher: P,
    pricing: Arc<dyn PricingStrategy>,
    rng: Arc<dyn RandomSource>,
    settings: LifecycleSettings,
}

impl<S: BookingStore, P: EventPublisher> BookingService<S, P> {
    /// Creates a service with standard pricing and random booking numbers.
    pub fn new(store: S, publisher: P) -> Self {
        Self {
            repo: BookingRepository::new(store),
            publisher,
            pricing: Arc::new(StandardPricing::new()),
            rng: Arc::new(ThreadRandomSource),
            settings: LifecycleSettings::default(),
        }
    }

    pub fn with_pricing(mut self, pricing: Arc<dyn PricingStrategy>) -> Self {
        self.pricing = pricing;
        self
    }

    /// Replaces the source of booking-number randomness.
    pub fn with_random_source(mut self, rng: Arc<dyn RandomSource>) -> Self {
        self.rng = rng;
        self
    }

    pub fn with_settings(mut self, settings: LifecycleSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Returns a reference to the underlying repository.
    pub fn repository(&self) -> &BookingRepository<S> {
        &self.repo
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    /// Creates a new booking priced from the route and the pet.
    #[tracing::instrument(skip(self, cmd), fields(owner_id = %cmd.owner_id))]
    pub async fn create_booking(&self, cmd: CreateBooking) -> Result<Booking> {
        let started = Instant::now();

        let pet_type = Booking::validate_request(
            cmd.owner_id,
            &cmd.pet_spec,
            &cmd.pickup_address,
            &cmd.dropoff_address,
        )?;
        let crate_requirement = CrateRequirement::for_pet(&cmd.pet_spec);
        let distance_km = haversine_km(
            cmd.pickup_address.latitude,
            cmd.pickup_address.longitude,
            cmd.dropoff_address.latitude,
            cmd.dropoff_address.longitude,
        );

        let estimated_price = self
            .pricing
            .calculate(&PricingParams {
                distance_km,
                pet_type,
                crate_size: crate_requirement.minimum_size,
                is_scheduled: cmd.scheduled_at.is_some(),
            })
            .map_err(BookingError::from)?;

        let (booking, event) = Booking::create(
            NewBooking {
                owner_id: cmd.owner_id,
                pet_spec: cmd.pet_spec,
                pickup_address: cmd.pickup_address,
                dropoff_address: cmd.dropoff_address,
                estimated_price,
                currency: self.settings.currency.clone(),
                scheduled_at: cmd.scheduled_at,
                notes: cmd.notes,
            },
            self.rng.as_ref(),
        )?;

        self.repo.insert(&booking).await?;

        self.record_transition("create", started);
        tracing::info!(
            booking_id = %booking.id(),
            booking_number = %booking.booking_number(),
            distance_km,
            estimated_price = estimated_price.cents(),
            "booking created"
        );

        self.publish(&event).await;
        Ok(booking)
    }

    /// Assigns a runner to an open booking.
    #[tracing::instrument(skip(self))]
    pub async fn accept_booking(&self, cmd: AcceptBooking) -> Result<Booking> {
        self.transition(&cmd, "accept").await
    }

    /// Records that the runner picked up the pet.
    #[tracing::instrument(skip(self))]
    pub async fn start_delivery(&self, cmd: StartDelivery) -> Result<Booking> {
        self.transition(&cmd, "start_delivery").await
    }

    /// Records that the pet was handed over.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_delivery(&self, cmd: ConfirmDelivery) -> Result<Booking> {
        self.transition(&cmd, "confirm_delivery").await
    }

    /// Completes a delivered booking at its estimated price.
    #[tracing::instrument(skip(self))]
    pub async fn complete_booking(&self, cmd: CompleteBooking) -> Result<Booking> {
        self.transition(&cmd, "complete").await
    }

    /// Cancels a booking that has not reached delivery.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_booking(&self, cmd: CancelBooking) -> Result<Booking> {
        self.transition(&cmd, "cancel").await
    }

    /// Creates a fresh booking with the pet, addresses and notes of an
    /// earlier one. Only the earlier booking's owner may rebook.
    #[tracing::instrument(skip(self))]
    pub async fn rebook(&self, cmd: RebookBooking) -> Result<Booking> {
        let original = self.repo.load(cmd.original_booking_id).await?;

        if original.owner_id() != cmd.owner_id {
            return Err(LifecycleError::Forbidden(
                "booking does not belong to this user".to_string(),
            ));
        }

        let mut create = CreateBooking::new(
            cmd.owner_id,
            original.pet_spec().clone(),
            original.pickup_address().clone(),
            original.dropoff_address().clone(),
        );
        create.notes = original.notes().to_string();

        self.create_booking(create).await
    }

    /// Loads a booking by id.
    pub async fn get_booking(&self, booking_id: BookingId) -> Result<Booking> {
        Ok(self.repo.load(booking_id).await?)
    }

    /// Loads a booking by its human-readable number.
    pub async fn find_by_number(&self, number: &str) -> Result<Booking> {
        self.repo
            .find_by_number(number)
            .await?
            .ok_or_else(|| LifecycleError::NotFound {
                entity: Booking::aggregate_type(),
                key: number.to_string(),
            })
    }

    pub async fn owner_bookings(&self, owner_id: UserId, page: PageRequest) -> Result<Page<Booking>> {
        Ok(self.repo.find_by_owner(owner_id, page).await?)
    }

    pub async fn runner_bookings(
        &self,
        runner_id: UserId,
        page: PageRequest,
    ) -> Result<Page<Booking>> {
        Ok(self.repo.find_by_runner(runner_id, page).await?)
    }

    /// Lists every booking, newest first.
    pub async fn list_all_bookings(&self, page: PageRequest) -> Result<Page<Booking>> {
        Ok(self.repo.list_all(page).await?)
    }

    /// Returns per-status counts and their sum.
    pub async fn booking_stats(&self) -> Result<BookingStats> {
        let by_status = self.repo.count_by_status().await?;
        let total_bookings = by_status.values().sum();
        Ok(BookingStats {
            total_bookings,
            by_status,
        })
    }

    async fn transition<C>(&self, cmd: &C, transition: &'static str) -> Result<Booking>
    where
        C: Command<Aggregate = Booking>,
    {
        let booking_id = cmd.aggregate_id();
        let started = Instant::now();

        match self.repo.handle(cmd).await {
            Ok(CommandResult {
                aggregate,
                event,
                new_version,
            }) => {
                self.record_transition(transition, started);
                tracing::info!(
                    booking_id = %booking_id,
                    transition,
                    status = %aggregate.status(),
                    version = %new_version,
                    "booking transitioned"
                );
                self.publish(&event).await;
                Ok(aggregate)
            }
            Err(e) if e.is_conflict() => {
                metrics::counter!("booking_version_conflicts_total").increment(1);
                tracing::warn!(booking_id = %booking_id, transition, "version conflict");
                Err(e.into())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn record_transition(&self, transition: &'static str, started: Instant) {
        metrics::counter!("booking_transitions_total", "transition" => transition).increment(1);
        metrics::histogram!("booking_transition_duration_seconds", "transition" => transition)
            .record(started.elapsed().as_secs_f64());
    }

    /// Publishes a committed event. Failures are logged and counted only.
    async fn publish(&self, event: &BookingEvent) {
        let topic = self.settings.booking_events_topic.as_str();
        let key = event.booking_id().to_string();

        let envelope = event
            .data()
            .map_err(crate::envelope::EnvelopeError::from)
            .and_then(|data| {
                IntegrationEvent::builder()
                    .source(self.settings.source.as_str())
                    .event_type(event.event_type())
                    .data_raw(data)
                    .build()
            });

        let result = match envelope {
            Ok(envelope) => self
                .publisher
                .publish(topic, &key, &envelope)
                .await
                .map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match result {
            Ok(()) => {
                metrics::counter!("booking_events_published_total").increment(1);
                tracing::debug!(
                    booking_id = %key,
                    event_type = event.event_type(),
                    topic,
                    "event published"
                );
            }
            Err(error) => {
                metrics::counter!("booking_event_publish_failures_total").increment(1);
                tracing::error!(
                    booking_id = %key,
                    event_type = event.event_type(),
                    topic,
                    error = %error,
                    "failed to publish event"
                );
            }
        }
    }
}
