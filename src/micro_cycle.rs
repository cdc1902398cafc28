use serde::{Deserialize, Serialize};

use crate::error::{Result, SamcError};
use crate::models::SportConfig;

/// Default rest days appended to every cycle
pub const DEFAULT_MIN_REST_DAYS: u32 = 1;

/// Allowed range for `min_rest_days`
pub const MIN_REST_DAYS_RANGE: (u32, u32) = (0, 3);

/// Allowed range for a user override of the cycle length
pub const OVERRIDE_DAYS_RANGE: (u32, u32) = (3, 21);

/// Micro-cycle sizing configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MicroCycleConfig {
    pub min_rest_days: u32,

    /// Replaces the computed length when set
    pub override_days: Option<u32>,
}

impl Default for MicroCycleConfig {
    fn default() -> Self {
        MicroCycleConfig {
            min_rest_days: DEFAULT_MIN_REST_DAYS,
            override_days: None,
        }
    }
}

impl MicroCycleConfig {
    pub fn validate(&self) -> Result<()> {
        validate_inputs(self.min_rest_days, self.override_days)
    }
}

/// Sized micro-cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MicroCycleLength {
    pub computed_days: u32,
    pub override_days: Option<u32>,

    /// Override when present, computed length otherwise
    pub effective_days: u32,
}

fn validate_inputs(min_rest_days: u32, override_days: Option<u32>) -> Result<()> {
    let (min, max) = MIN_REST_DAYS_RANGE;
    if !(min..=max).contains(&min_rest_days) {
        return Err(SamcError::validation(
            "min_rest_days",
            format!("{} is outside the allowed range [{}, {}]", min_rest_days, min, max),
        ));
    }
    if let Some(days) = override_days {
        let (min, max) = OVERRIDE_DAYS_RANGE;
        if !(min..=max).contains(&days) {
            return Err(SamcError::validation(
                "override_days",
                format!("{} is outside the allowed range [{}, {}]", days, min, max),
            ));
        }
    }
    Ok(())
}

/// Size the micro-cycle from the active, non-background sports.
///
/// `computed = Σ sessions_per_cycle + max recovery_days_hint + min_rest_days`.
/// With no such sport the cycle is `min_rest_days` long, floored at one day.
pub fn compute_micro_cycle_length(
    configs: &[SportConfig],
    min_rest_days: u32,
    override_days: Option<u32>,
) -> Result<MicroCycleLength> {
    validate_inputs(min_rest_days, override_days)?;

    let slotted: Vec<&SportConfig> = configs
        .iter()
        .filter(|config| config.is_active && !config.is_background)
        .collect();

    let computed_days = if slotted.is_empty() {
        min_rest_days.max(1)
    } else {
        let total_slots: u32 = slotted.iter().map(|config| config.sessions_per_cycle).sum();
        let max_recovery = slotted
            .iter()
            .map(|config| config.recovery_days_hint)
            .max()
            .unwrap_or(0);
        total_slots + max_recovery + min_rest_days
    };

    let effective_days = override_days.unwrap_or(computed_days);

    tracing::debug!(
        sports = slotted.len(),
        computed_days,
        ?override_days,
        effective_days,
        "Sized micro-cycle"
    );

    Ok(MicroCycleLength {
        computed_days,
        override_days,
        effective_days,
    })
}
