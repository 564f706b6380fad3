//! Value objects for the booking domain.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of animal being transported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PetType {
    Cat,
    Dog,
    Bird,
    Rabbit,
    Reptile,
    Other,
}

impl PetType {
    /// Returns the pet type name as stored and published.
    pub fn as_str(&self) -> &'static str {
        match self {
            PetType::Cat => "cat",
            PetType::Dog => "dog",
            PetType::Bird => "bird",
            PetType::Rabbit => "rabbit",
            PetType::Reptile => "reptile",
            PetType::Other => "other",
        }
    }
}

impl std::fmt::Display for PetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PetType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cat" => Ok(PetType::Cat),
            "dog" => Ok(PetType::Dog),
            "bird" => Ok(PetType::Bird),
            "rabbit" => Ok(PetType::Rabbit),
            "reptile" => Ok(PetType::Reptile),
            "other" => Ok(PetType::Other),
            other => Err(format!("invalid pet type: {other}")),
        }
    }
}

/// Size class of the transport crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrateSize {
    Small,
    Medium,
    Large,
    #[serde(rename = "xlarge")]
    XLarge,
}

impl CrateSize {
    /// Smallest crate that fits a pet of the given weight.
    pub fn for_weight(weight_kg: f64) -> Self {
        if weight_kg <= 5.0 {
            CrateSize::Small
        } else if weight_kg <= 15.0 {
            CrateSize::Medium
        } else if weight_kg <= 30.0 {
            CrateSize::Large
        } else {
            CrateSize::XLarge
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CrateSize::Small => "small",
            CrateSize::Medium => "medium",
            CrateSize::Large => "large",
            CrateSize::XLarge => "xlarge",
        }
    }
}

impl std::fmt::Display for CrateSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single vaccination entry for a pet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub vaccine_name: String,
    pub date_given: DateTime<Utc>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub vet_name: String,
    #[serde(default)]
    pub verified: bool,
}

/// Immutable description of the pet to be transported.
///
/// `pet_type` is kept as received so that an unrecognized value can be
/// reported as a validation error when the booking is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PetSpecification {
    pub pet_type: String,
    #[serde(default)]
    pub breed: String,
    pub name: String,
    pub weight_kg: f64,
    #[serde(default)]
    pub age_months: u32,
    #[serde(default)]
    pub vaccinations: Vec<VaccinationRecord>,
    #[serde(default)]
    pub special_needs: String,
    #[serde(default)]
    pub photo_url: String,
}

impl PetSpecification {
    /// Creates a pet specification with only the required fields set.
    pub fn new(pet_type: impl Into<String>, name: impl Into<String>, weight_kg: f64) -> Self {
        Self {
            pet_type: pet_type.into(),
            breed: String::new(),
            name: name.into(),
            weight_kg,
            age_months: 0,
            vaccinations: Vec::new(),
            special_needs: String::new(),
            photo_url: String::new(),
        }
    }

    /// Returns the recognized pet type, if any.
    pub fn kind(&self) -> Option<PetType> {
        self.pet_type.parse().ok()
    }
}

/// Minimum crate specification derived from the pet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CrateRequirement {
    pub minimum_size: CrateSize,
    pub needs_ventilation: bool,
    pub needs_temp_control: bool,
    pub minimum_weight_capacity: f64,
}

impl CrateRequirement {
    /// Derives the crate requirement for a pet.
    ///
    /// Ventilation is always required, temperature control only for
    /// reptiles, and the weight capacity carries a 20% margin.
    pub fn for_pet(spec: &PetSpecification) -> Self {
        Self {
            minimum_size: CrateSize::for_weight(spec.weight_kg),
            needs_ventilation: true,
            needs_temp_control: spec.kind() == Some(PetType::Reptile),
            minimum_weight_capacity: spec.weight_kg * 1.2,
        }
    }
}

/// A postal address with coordinates.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Address {
    pub line1: String,
    #[serde(default)]
    pub line2: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub postal_code: String,
    #[serde(default)]
    pub country: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl Address {
    /// Creates an address with a first line and coordinates.
    pub fn new(line1: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            line1: line1.into(),
            latitude,
            longitude,
            ..Default::default()
        }
    }

    pub fn has_finite_coordinates(&self) -> bool {
        self.latitude.is_finite() && self.longitude.is_finite()
    }
}

/// A computed route between pickup and dropoff.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSpecification {
    pub pickup_lat: f64,
    pub pickup_lng: f64,
    pub dropoff_lat: f64,
    pub dropoff_lng: f64,
    pub distance_km: f64,
    pub estimated_duration_min: u32,
    #[serde(default)]
    pub polyline: String,
}

/// Money amount in minor currency units (sen, cents).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a new amount from minor units.
    pub fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Returns zero money.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Returns the amount in minor units.
    pub fn cents(&self) -> i64 {
        self.0
    }

    /// Returns true if the amount is positive.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl std::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Self) -> Self::Output {
        Money(self.0 + rhs.0)
    }
}

impl std::ops::AddAssign for Money {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pet_type_parse() {
        assert_eq!("dog".parse::<PetType>(), Ok(PetType::Dog));
        assert_eq!("reptile".parse::<PetType>(), Ok(PetType::Reptile));
        assert!("dragon".parse::<PetType>().is_err());
        assert!("Dog".parse::<PetType>().is_err());
    }

    #[test]
    fn test_crate_size_thresholds() {
        assert_eq!(CrateSize::for_weight(4.0), CrateSize::Small);
        assert_eq!(CrateSize::for_weight(5.0), CrateSize::Small);
        assert_eq!(CrateSize::for_weight(5.1), CrateSize::Medium);
        assert_eq!(CrateSize::for_weight(15.0), CrateSize::Medium);
        assert_eq!(CrateSize::for_weight(20.0), CrateSize::Large);
        assert_eq!(CrateSize::for_weight(30.0), CrateSize::Large);
        assert_eq!(CrateSize::for_weight(30.5), CrateSize::XLarge);
    }

    #[test]
    fn test_crate_requirement_small_dog() {
        let req = CrateRequirement::for_pet(&PetSpecification::new("dog", "Rex", 4.0));
        assert_eq!(req.minimum_size, CrateSize::Small);
        assert!(req.needs_ventilation);
        assert!(!req.needs_temp_control);
        assert!((req.minimum_weight_capacity - 4.8).abs() < 1e-9);
    }

    #[test]
    fn test_crate_requirement_large() {
        let req = CrateRequirement::for_pet(&PetSpecification::new("dog", "Bruno", 20.0));
        assert_eq!(req.minimum_size, CrateSize::Large);
        assert!((req.minimum_weight_capacity - 24.0).abs() < 1e-9);
    }

    #[test]
    fn test_reptile_needs_temp_control_at_any_weight() {
        for weight in [0.2, 8.0, 45.0] {
            let req = CrateRequirement::for_pet(&PetSpecification::new("reptile", "Iggy", weight));
            assert!(req.needs_temp_control);
            assert!(req.needs_ventilation);
        }
    }

    #[test]
    fn test_crate_size_serializes_xlarge() {
        let json = serde_json::to_string(&CrateSize::XLarge).unwrap();
        assert_eq!(json, "\"xlarge\"");
    }

    #[test]
    fn test_money_display() {
        assert_eq!(Money::from_cents(4000).to_string(), "40.00");
        assert_eq!(Money::from_cents(5).to_string(), "0.05");
        assert_eq!(Money::from_cents(-1234).to_string(), "-12.34");
    }

    #[test]
    fn test_money_add_assign() {
        let mut money = Money::from_cents(500);
        money += Money::from_cents(250);
        assert_eq!(money.cents(), 750);
        assert_eq!((money + Money::zero()).cents(), 750);
    }
}
