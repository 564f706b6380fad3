//! Price estimation for bookings.
//!
//! All amounts are in minor currency units (sen for MYR).

use thiserror::Error;

use super::{CrateSize, Money, PetType};

const EARTH_RADIUS_KM: f64 = 6371.0;

const BASE_FARE: i64 = 500;
const PER_KM: f64 = 250.0;

/// Errors raised while estimating a price.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PricingError {
    #[error("distance cannot be negative: {0}")]
    NegativeDistance(f64),
}

/// Inputs for price calculation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PricingParams {
    pub distance_km: f64,
    pub pet_type: PetType,
    pub crate_size: CrateSize,
    /// Whether the booking has a scheduled pickup time.
    pub is_scheduled: bool,
}

/// Strategy for estimating the price of a booking.
pub trait PricingStrategy: Send + Sync {
    fn calculate(&self, params: &PricingParams) -> Result<Money, PricingError>;
}

/// Default tariff: base fare, a per-km rate, and pet/crate surcharges.
///
/// Scheduling does not affect the standard tariff.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPricing;

impl StandardPricing {
    pub fn new() -> Self {
        Self
    }

    fn pet_surcharge(pet_type: PetType) -> i64 {
        match pet_type {
            PetType::Dog => 500,
            PetType::Cat => 300,
            PetType::Bird => 200,
            PetType::Reptile => 800,
            PetType::Rabbit => 300,
            PetType::Other => 500,
        }
    }

    fn crate_surcharge(size: CrateSize) -> i64 {
        match size {
            CrateSize::Small => 0,
            CrateSize::Medium => 500,
            CrateSize::Large => 1000,
            CrateSize::XLarge => 2000,
        }
    }
}

impl PricingStrategy for StandardPricing {
    fn calculate(&self, params: &PricingParams) -> Result<Money, PricingError> {
        if params.distance_km < 0.0 || params.distance_km.is_nan() {
            return Err(PricingError::NegativeDistance(params.distance_km));
        }

        // `as` truncates toward zero.
        let distance_charge = (params.distance_km * PER_KM) as i64;

        Ok(Money::from_cents(
            BASE_FARE
                + distance_charge
                + Self::pet_surcharge(params.pet_type)
                + Self::crate_surcharge(params.crate_size),
        ))
    }
}

/// Great-circle distance in kilometres between two coordinates in degrees.
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
