//! Bicycle commuting: steady-state, low-skill, metabolically dominated
//!
//! A background sport. Its load counts toward exposure and fatigue but it
//! never occupies a micro-cycle slot.
//!
//! Reference session: 30 minutes at RPE 5 gives a factor of 1.0. Climbing adds
//! 10% of the base load per 100 m of elevation gain.

use serde::Deserialize;
use serde_json::Value;

use super::{check_range, parse_payload, validate_intensity_modifier, SportPlugin};
use crate::error::Result;
use crate::exercise::StressProfileMapper;
use crate::models::{LoadVector, StressVector};

const REFERENCE_DURATION_MIN: f64 = 30.0;
const REFERENCE_RPE: f64 = 5.0;

fn default_rpe() -> f64 {
    REFERENCE_RPE
}

/// Sport-specific session data for bicycle commuting
#[derive(Debug, Clone, Deserialize)]
pub struct BicycleCommutingSession {
    pub distance_km: f64,
    pub duration_min: i64,
    #[serde(default)]
    pub avg_heart_rate: Option<i64>,
    #[serde(default)]
    pub elevation_gain_m: f64,
    #[serde(default = "default_rpe")]
    pub rpe: f64,
}

impl BicycleCommutingSession {
    fn validate(&self) -> Result<()> {
        check_range("distance_km", self.distance_km, 0.1, 300.0)?;
        check_range("duration_min", self.duration_min, 1, 600)?;
        if let Some(hr) = self.avg_heart_rate {
            check_range("avg_heart_rate", hr, 40, 220)?;
        }
        check_range("elevation_gain_m", self.elevation_gain_m, 0.0, 5000.0)?;
        check_range("rpe", self.rpe, 1.0, 10.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BicycleCommuting;

impl SportPlugin for BicycleCommuting {
    fn sport_id(&self) -> &'static str {
        "bicycle_commuting"
    }

    fn display_name(&self) -> &'static str {
        "Bicycle Commuting"
    }

    fn default_stress_profile(&self) -> StressVector {
        StressVector::new(0.7, 0.2, 0.3, 0.4, 0.1)
    }

    fn validate_payload(&self, payload: &Value) -> Result<()> {
        let session: BicycleCommutingSession = parse_payload(payload)?;
        session.validate()
    }

    fn compute_load(
        &self,
        payload: &Value,
        intensity_modifier: f64,
        _mapper: &StressProfileMapper,
    ) -> Result<LoadVector> {
        validate_intensity_modifier(intensity_modifier)?;
        let session: BicycleCommutingSession = parse_payload(payload)?;
        session.validate()?;

        let base = (session.duration_min as f64 / REFERENCE_DURATION_MIN)
            * (session.rpe / REFERENCE_RPE)
            * intensity_modifier;
        let profile = self.default_stress_profile();
        let elevation_bonus = profile.scaled_unclamped(base * session.elevation_gain_m / 1000.0);

        Ok(profile.scaled_unclamped(base).add(&elevation_bonus))
    }

    fn is_background(&self) -> bool {
        true
    }

    fn recovery_days_hint(&self) -> u32 {
        0
    }

    fn sessions_per_cycle_default(&self) -> u32 {
        0
    }
}
