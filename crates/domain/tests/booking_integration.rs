//! Integration tests for the Booking aggregate.
//!
//! These tests drive bookings through the repository over the in-memory
//! store, covering the full lifecycle, version bookkeeping and concurrent
//! writers racing on the same version.

use std::sync::Arc;

use booking_store::{BookingStore, InMemoryBookingStore, PageRequest};
use common::{BookingId, UserId, Version};
use domain::{
    Address, Aggregate, Booking, BookingError, BookingRepository, BookingStatus, CrateSize,
    DomainError, DomainEvent, Money, NewBooking, PetSpecification, PricingParams,
    PricingStrategy, StandardPricing, ThreadRandomSource, haversine_km,
};

fn create_repo() -> BookingRepository<InMemoryBookingStore> {
    BookingRepository::new(InMemoryBookingStore::new())
}

fn dog_booking(owner_id: UserId) -> NewBooking {
    NewBooking {
        owner_id,
        pet_spec: PetSpecification::new("dog", "Rex", 12.0),
        pickup_address: Address::new("1 Jalan Ampang", 3.1579, 101.7116),
        dropoff_address: Address::new("2 Jalan Tun Razak", 3.1615, 101.7190),
        estimated_price: Money::from_cents(4000),
        currency: "MYR".to_string(),
        scheduled_at: None,
        notes: String::new(),
    }
}

async fn insert_booking(repo: &BookingRepository<InMemoryBookingStore>) -> Booking {
    let (booking, _) = Booking::create(dog_booking(UserId::new()), &ThreadRandomSource).unwrap();
    repo.insert(&booking).await.unwrap();
    booking
}

mod booking_lifecycle {
    use super::*;

    #[tokio::test]
    async fn complete_booking_lifecycle() {
        let repo = create_repo();
        let booking = insert_booking(&repo).await;
        let id = booking.id();
        let runner = UserId::new();

        let result = repo.execute(id, |b| b.accept(runner)).await.unwrap();
        assert_eq!(result.aggregate.status(), BookingStatus::Accepted);
        assert_eq!(result.new_version, Version::new(2));
        assert_eq!(result.event.event_type(), "booking.accepted");

        let result = repo.execute(id, |b| b.start_delivery()).await.unwrap();
        assert_eq!(result.aggregate.status(), BookingStatus::InProgress);
        assert_eq!(result.event.event_type(), "booking.pet_picked_up");

        let result = repo.execute(id, |b| b.confirm_delivery()).await.unwrap();
        assert_eq!(result.aggregate.status(), BookingStatus::Delivered);

        let result = repo
            .execute(id, |b| {
                let price = b.estimated_price();
                b.complete(price)
            })
            .await
            .unwrap();
        assert_eq!(result.new_version, Version::new(5));
        assert_eq!(result.event.event_type(), "booking.completed");

        let stored = repo.load(id).await.unwrap();
        assert_eq!(stored.status(), BookingStatus::Completed);
        assert_eq!(stored.final_price(), Some(Money::from_cents(4000)));
        assert_eq!(stored.runner_id(), Some(runner));
        assert!(stored.picked_up_at().is_some());
        assert!(stored.delivered_at().is_some());
        assert!(stored.cancelled_at().is_none());
    }

    #[tokio::test]
    async fn completing_twice_keeps_price_and_version() {
        let repo = create_repo();
        let booking = insert_booking(&repo).await;
        let id = booking.id();

        repo.execute(id, |b| b.accept(UserId::new())).await.unwrap();
        repo.execute(id, |b| b.start_delivery()).await.unwrap();
        repo.execute(id, |b| b.confirm_delivery()).await.unwrap();
        repo.execute(id, |b| b.complete(Money::from_cents(4000)))
            .await
            .unwrap();

        let result = repo
            .execute(id, |b| b.complete(Money::from_cents(1)))
            .await;

        assert!(matches!(
            result,
            Err(DomainError::Booking(BookingError::InvalidStateTransition {
                current: BookingStatus::Completed,
                target: BookingStatus::Completed,
            }))
        ));
        let stored = repo.load(id).await.unwrap();
        assert_eq!(stored.final_price(), Some(Money::from_cents(4000)));
        assert_eq!(stored.version(), Version::new(5));
    }

    #[tokio::test]
    async fn cancel_stamps_once_and_blocks_further_moves() {
        let repo = create_repo();
        let booking = insert_booking(&repo).await;
        let id = booking.id();
        let owner = booking.owner_id();

        repo.execute(id, |b| b.accept(UserId::new())).await.unwrap();
        let result = repo
            .execute(id, |b| b.cancel("vet appointment", owner))
            .await
            .unwrap();
        let cancelled_at = result.aggregate.cancelled_at();
        assert!(cancelled_at.is_some());

        let again = repo.execute(id, |b| b.cancel("again", owner)).await;
        assert!(again.is_err());
        let start = repo.execute(id, |b| b.start_delivery()).await;
        assert!(start.is_err());

        let stored = repo.load(id).await.unwrap();
        assert_eq!(stored.cancelled_at(), cancelled_at);
        assert_eq!(stored.cancel_note(), "vet appointment");
        assert_eq!(stored.version(), Version::new(3));
    }
}

mod version_bookkeeping {
    use super::*;

    #[tokio::test]
    async fn illegal_transition_leaves_stored_version() {
        let repo = create_repo();
        let booking = insert_booking(&repo).await;

        for attempt in 0..3 {
            let result = match attempt {
                0 => repo.execute(booking.id(), |b| b.start_delivery()).await,
                1 => repo.execute(booking.id(), |b| b.confirm_delivery()).await,
                _ => {
                    repo.execute(booking.id(), |b| b.complete(Money::from_cents(1)))
                        .await
                }
            };
            assert!(result.is_err());
        }

        let record = repo.store().find_by_id(booking.id()).await.unwrap().unwrap();
        assert_eq!(record.version, Version::first());
        assert_eq!(record.status, "requested");
    }

    #[tokio::test]
    async fn missing_booking_is_not_found_not_conflict() {
        let repo = create_repo();
        let result = repo
            .execute(BookingId::new(), |b| b.accept(UserId::new()))
            .await;

        assert!(matches!(result, Err(DomainError::AggregateNotFound { .. })));
    }
}

mod concurrency {
    use super::*;

    #[tokio::test]
    async fn concurrent_writers_on_same_version() {
        let repo = Arc::new(create_repo());
        let booking = insert_booking(&repo).await;

        // Both writers start from the same loaded snapshot.
        let mut accepted = booking.clone();
        accepted.accept(UserId::new()).unwrap();
        accepted.increment_version();

        let mut cancelled = booking.clone();
        cancelled.cancel("owner changed mind", booking.owner_id()).unwrap();
        cancelled.increment_version();

        let r1 = {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.update(&accepted).await })
        };
        let r2 = {
            let repo = Arc::clone(&repo);
            tokio::spawn(async move { repo.update(&cancelled).await })
        };

        let results = [r1.await.unwrap(), r2.await.unwrap()];
        let wins = results.iter().filter(|r| r.is_ok()).count();
        let conflicts = results
            .iter()
            .filter(|r| matches!(r, Err(e) if e.is_conflict()))
            .count();
        assert_eq!(wins, 1);
        assert_eq!(conflicts, 1);

        let stored = repo.load(booking.id()).await.unwrap();
        assert_eq!(stored.version(), Version::new(2));
        let winner_accepted = results[0].is_ok();
        if winner_accepted {
            assert_eq!(stored.status(), BookingStatus::Accepted);
        } else {
            assert_eq!(stored.status(), BookingStatus::Cancelled);
        }
    }
}

mod queries {
    use super::*;

    #[tokio::test]
    async fn owner_pages_newest_first() {
        let repo = create_repo();
        let owner = UserId::new();

        let mut ids = Vec::new();
        for _ in 0..3 {
            let (booking, _) = Booking::create(dog_booking(owner), &ThreadRandomSource).unwrap();
            repo.insert(&booking).await.unwrap();
            ids.push(booking.id());
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }
        insert_booking(&repo).await;

        let page = repo
            .find_by_owner(owner, PageRequest::new(1, 2))
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.items[0].id(), ids[2]);
        assert_eq!(page.items[1].id(), ids[1]);

        let all = repo.list_all(PageRequest::first()).await.unwrap();
        assert_eq!(all.total, 4);
    }

    #[tokio::test]
    async fn runner_bookings_follow_acceptance() {
        let repo = create_repo();
        let runner = UserId::new();
        let booking = insert_booking(&repo).await;
        insert_booking(&repo).await;

        repo.execute(booking.id(), |b| b.accept(runner)).await.unwrap();

        let page = repo
            .find_by_runner(runner, PageRequest::first())
            .await
            .unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].id(), booking.id());
    }
}

mod pricing {
    use super::*;

    #[test]
    fn estimated_price_for_ten_km_dog() {
        let price = StandardPricing::new()
            .calculate(&PricingParams {
                distance_km: 10.0,
                pet_type: domain::PetType::Dog,
                crate_size: CrateSize::for_weight(12.0),
                is_scheduled: false,
            })
            .unwrap();
        assert_eq!(price, Money::from_cents(4000));
    }

    #[test]
    fn route_distance_feeds_price() {
        // Kuala Lumpur to Petaling Jaya, roughly 10 km
        let distance = haversine_km(3.1390, 101.6869, 3.1073, 101.6067);
        assert!(distance > 9.0 && distance < 10.5, "got {distance}");
    }
}
