//! Sport capability contract and the closed registry of supported sports
//!
//! Every sport turns its own payload into a [`LoadVector`]. The registry is
//! assembled once from the built-in set and is read-only afterwards; it is
//! shared by reference through the engine rather than through global state.

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::{Result, SamcError, ValidationError};
use crate::exercise::StressProfileMapper;
use crate::models::{LoadVector, SportConfig, StressVector};

pub mod bicycle_commuting;
pub mod weight_lifting;

pub use bicycle_commuting::BicycleCommuting;
pub use weight_lifting::WeightLifting;

/// Allowed range for the per-session intensity multiplier
pub const INTENSITY_MODIFIER_RANGE: (f64, f64) = (0.1, 3.0);

/// Capability contract every sport must satisfy
pub trait SportPlugin: Send + Sync {
    /// Stable identifier used in payloads and configs, e.g. `weight_lifting`
    fn sport_id(&self) -> &'static str;

    fn display_name(&self) -> &'static str;

    /// Average demand profile of the sport. Informational for sports that
    /// derive a profile per exercise.
    fn default_stress_profile(&self) -> StressVector;

    /// Check the payload shape and every field bound
    fn validate_payload(&self, payload: &Value) -> Result<()>;

    /// Compute the session load. Validates the payload first.
    fn compute_load(
        &self,
        payload: &Value,
        intensity_modifier: f64,
        mapper: &StressProfileMapper,
    ) -> Result<LoadVector>;

    /// Background sports add load but never occupy micro-cycle slots
    fn is_background(&self) -> bool {
        false
    }

    fn recovery_days_hint(&self) -> u32 {
        1
    }

    fn sessions_per_cycle_default(&self) -> u32 {
        1
    }

    fn default_config(&self) -> SportConfig {
        SportConfig {
            sport_id: self.sport_id().to_string(),
            is_background: self.is_background(),
            sessions_per_cycle: self.sessions_per_cycle_default(),
            recovery_days_hint: self.recovery_days_hint(),
            is_active: true,
        }
    }
}

/// Read-only lookup of sport capabilities by id
pub struct SportRegistry {
    plugins: BTreeMap<&'static str, Box<dyn SportPlugin>>,
}

impl SportRegistry {
    /// Registry holding every built-in sport
    pub fn builtin() -> Self {
        let builtin: [Box<dyn SportPlugin>; 2] = [Box::new(WeightLifting), Box::new(BicycleCommuting)];
        let plugins: BTreeMap<_, _> = builtin
            .into_iter()
            .map(|plugin| (plugin.sport_id(), plugin))
            .collect();
        debug_assert_eq!(plugins.len(), 2, "built-in sport ids must be unique");
        SportRegistry { plugins }
    }

    /// Build a registry from a fixed plugin set, rejecting duplicate ids
    pub fn from_plugins(plugins: Vec<Box<dyn SportPlugin>>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for plugin in plugins {
            let id = plugin.sport_id();
            if map.insert(id, plugin).is_some() {
                return Err(SamcError::Configuration(format!(
                    "sport '{}' is registered twice",
                    id
                )));
            }
        }
        Ok(SportRegistry { plugins: map })
    }

    pub fn get(&self, sport_id: &str) -> Option<&dyn SportPlugin> {
        self.plugins.get(sport_id).map(|plugin| plugin.as_ref())
    }

    pub fn get_or_err(&self, sport_id: &str) -> Result<&dyn SportPlugin> {
        self.get(sport_id).ok_or_else(|| SamcError::UnknownSport {
            sport_id: sport_id.to_string(),
            available: self.ids().join(", "),
        })
    }

    /// Registered ids in sorted order
    pub fn ids(&self) -> Vec<&'static str> {
        self.plugins.keys().copied().collect()
    }

    pub fn plugins(&self) -> impl Iterator<Item = &dyn SportPlugin> {
        self.plugins.values().map(|plugin| plugin.as_ref())
    }

    /// Default config for every registered sport
    pub fn default_configs(&self) -> Vec<SportConfig> {
        self.plugins().map(|plugin| plugin.default_config()).collect()
    }
}

impl std::fmt::Debug for SportRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SportRegistry").field("sports", &self.ids()).finish()
    }
}

/// Deserialize a JSON payload into a sport's typed session data
pub(crate) fn parse_payload<T: DeserializeOwned>(payload: &Value) -> Result<T> {
    serde_json::from_value(payload.clone())
        .map_err(|e| SamcError::validation("payload", e.to_string()))
}

/// Inclusive range check for a numeric payload field
pub(crate) fn check_range<T>(field: &str, value: T, min: T, max: T) -> std::result::Result<(), ValidationError>
where
    T: PartialOrd + std::fmt::Display + Copy,
{
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ValidationError::new(
            field,
            format!("{} is outside the allowed range [{}, {}]", value, min, max),
        ))
    }
}

pub(crate) fn validate_intensity_modifier(intensity_modifier: f64) -> Result<()> {
    let (min, max) = INTENSITY_MODIFIER_RANGE;
    if !intensity_modifier.is_finite() {
        return Err(SamcError::validation("intensity_modifier", "must be a finite number"));
    }
    check_range("intensity_modifier", intensity_modifier, min, max)?;
    Ok(())
}
