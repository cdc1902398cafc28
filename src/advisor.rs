//! Daily advisor: combines exposure and recovery into one recommendation
//!
//! Three layers:
//! 1. ACWR is the guardrail: it detects spikes and under-exposure.
//! 2. Readiness is the decisor: it evaluates per-domain recovery.
//! 3. The advisor is the consequence: a pure lookup over both.
//!
//! The advisor answers whether to train today, at what volume, and which
//! domains can take load. It never prescribes exercises.
//!
//! The non-structural volume table below is a first calibration and is
//! pending review by a domain expert.

use serde::{Deserialize, Serialize};

use crate::acwr::{AcwrReport, AcwrStatus};
use crate::error::{Result, SamcError};
use crate::models::{Domain, PerDomain};
use crate::readiness::{ReadinessReport, ReadinessStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdvisorAction {
    Rest,
    LightSession,
    TrainReduced,
    Train,
}

impl AdvisorAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvisorAction::Rest => "rest",
            AdvisorAction::LightSession => "light_session",
            AdvisorAction::TrainReduced => "train_reduced",
            AdvisorAction::Train => "train",
        }
    }
}

impl std::fmt::Display for AdvisorAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VolumeLabel {
    Rest,
    Minimal,
    Reduced,
    Moderate,
    Full,
}

impl VolumeLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeLabel::Rest => "rest",
            VolumeLabel::Minimal => "minimal",
            VolumeLabel::Reduced => "reduced",
            VolumeLabel::Moderate => "moderate",
            VolumeLabel::Full => "full",
        }
    }
}

/// Volume scaling for today's session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VolumeModifier {
    /// Fraction of planned volume, in [0, 1]
    pub factor: f64,
    pub label: VolumeLabel,
    pub reason: String,
}

/// Whether a domain can take load today, and why
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainGuidance {
    pub can_load: bool,
    pub acwr_status: AcwrStatus,
    pub readiness_status: ReadinessStatus,
    pub readiness: Option<f64>,
    pub guidance: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AdvisorRecommendation {
    pub action: AdvisorAction,
    pub volume: VolumeModifier,
    pub domains: PerDomain<DomainGuidance>,
    pub trainable_domains: Vec<Domain>,
    pub blocked_domains: Vec<Domain>,
    pub summary: String,
}

/// Exposure and recovery state of one domain, as seen by the advisor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainState {
    pub acwr_status: AcwrStatus,
    pub readiness_status: ReadinessStatus,
    pub readiness: Option<f64>,
}

impl DomainState {
    pub fn new(acwr_status: AcwrStatus, readiness_status: ReadinessStatus) -> Self {
        DomainState {
            acwr_status,
            readiness_status,
            readiness: None,
        }
    }

    /// High spike or fatigued
    pub fn is_blocked(&self) -> bool {
        self.acwr_status == AcwrStatus::HighSpike || self.readiness_status == ReadinessStatus::Fatigued
    }
}

/// Recovery severity used by the non-structural table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ReadinessTier {
    Clear,
    Partial,
    Fatigued,
}

impl From<ReadinessStatus> for ReadinessTier {
    fn from(status: ReadinessStatus) -> Self {
        match status {
            ReadinessStatus::Recovered | ReadinessStatus::NoData => ReadinessTier::Clear,
            ReadinessStatus::Partial => ReadinessTier::Partial,
            ReadinessStatus::Fatigued => ReadinessTier::Fatigued,
        }
    }
}

/// Exposure severity used by the non-structural table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum ExposureTier {
    Clear,
    Spike,
    HighSpike,
}

impl From<AcwrStatus> for ExposureTier {
    fn from(status: AcwrStatus) -> Self {
        match status {
            AcwrStatus::InsufficientHistory | AcwrStatus::Underexposed | AcwrStatus::InRange => ExposureTier::Clear,
            AcwrStatus::Spike => ExposureTier::Spike,
            AcwrStatus::HighSpike => ExposureTier::HighSpike,
        }
    }
}

/// Advisor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdvisorConfig {
    /// Volume factor of a light session
    pub light_session_factor: f64,
}

impl Default for AdvisorConfig {
    fn default() -> Self {
        AdvisorConfig {
            light_session_factor: 0.3,
        }
    }
}

impl AdvisorConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.light_session_factor > 0.0 && self.light_session_factor < 0.5) {
            return Err(SamcError::Configuration(format!(
                "advisor.light_session_factor must lie in (0, 0.5), got {}",
                self.light_session_factor
            )));
        }
        Ok(())
    }
}

/// Fixed guidance text for an (exposure, recovery) pair
pub fn guidance_text(acwr: AcwrStatus, readiness: ReadinessStatus) -> &'static str {
    use AcwrStatus as A;
    use ReadinessStatus as R;

    match (acwr, readiness) {
        (A::HighSpike, R::Fatigued) => "High spike and still fatigued: no load on this domain.",
        (A::HighSpike, _) => "Exposure far above baseline: avoid loading this domain.",
        (_, R::Fatigued) => "Still fatigued: avoid direct load.",
        (A::Spike, R::Partial) => "Partial recovery with rising exposure: keep load light.",
        (_, R::Partial) => "Partial recovery: moderate load possible.",
        (A::Spike, R::Recovered) => "Recovered but exposure is rising: hold volume steady.",
        (A::Underexposed, R::Recovered) => "Recovered and underexposed: room to build load.",
        (A::InRange | A::InsufficientHistory, R::Recovered) => "Recovered: ready for full load.",
        (A::Spike, R::NoData) => "No recovery data and exposure is rising: proceed with care.",
        (A::Underexposed | A::InRange | A::InsufficientHistory, R::NoData) => {
            "No recent data: proceed normally."
        }
    }
}

/// Daily advisor, a pure combinator over ACWR and readiness
#[derive(Debug, Clone, Default)]
pub struct DailyAdvisor {
    config: AdvisorConfig,
}

impl DailyAdvisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: AdvisorConfig) -> Self {
        DailyAdvisor { config }
    }

    /// Combine an ACWR report and a readiness report computed for the same day
    pub fn advise_reports(&self, acwr: &AcwrReport, readiness: &ReadinessReport) -> AdvisorRecommendation {
        let states = PerDomain::from_fn(|domain| DomainState {
            acwr_status: acwr.domains[domain].status,
            readiness_status: readiness.domains[domain].status,
            readiness: readiness.domains[domain].readiness,
        });
        self.advise(&states)
    }

    pub fn advise(&self, states: &PerDomain<DomainState>) -> AdvisorRecommendation {
        let blocked = states.map(|_, state| state.is_blocked());
        let neuromuscular_blocked = blocked[Domain::Neuromuscular];
        let tendon_blocked = blocked[Domain::Tendon];

        let (action, volume) = if neuromuscular_blocked && tendon_blocked {
            (
                AdvisorAction::Rest,
                VolumeModifier {
                    factor: 0.0,
                    label: VolumeLabel::Rest,
                    reason: "Both structural domains (N + T) need recovery.".to_string(),
                },
            )
        } else if neuromuscular_blocked || tendon_blocked {
            (
                AdvisorAction::LightSession,
                VolumeModifier {
                    factor: self.config.light_session_factor,
                    label: VolumeLabel::Minimal,
                    reason: "One structural domain is blocked: light session only.".to_string(),
                },
            )
        } else {
            self.non_structural_volume(states)
        };

        let domains = states.map(|domain, state| DomainGuidance {
            can_load: action != AdvisorAction::Rest && !blocked[domain],
            acwr_status: state.acwr_status,
            readiness_status: state.readiness_status,
            readiness: state.readiness,
            guidance: guidance_text(state.acwr_status, state.readiness_status).to_string(),
        });

        let trainable_domains: Vec<Domain> = domains
            .iter()
            .filter(|(_, guidance)| guidance.can_load)
            .map(|(domain, _)| domain)
            .collect();
        let blocked_domains: Vec<Domain> = domains
            .iter()
            .filter(|(_, guidance)| !guidance.can_load)
            .map(|(domain, _)| domain)
            .collect();

        let summary = summary_line(action, volume.label, &blocked_domains);

        if action == AdvisorAction::Rest {
            tracing::warn!(blocked = ?blocked_domains, "Structural domains blocked, rest recommended");
        }
        tracing::debug!(
            action = %action,
            factor = volume.factor,
            label = volume.label.as_str(),
            blocked = ?blocked_domains,
            "Computed daily advice"
        );

        AdvisorRecommendation {
            action,
            volume,
            domains,
            trainable_domains,
            blocked_domains,
            summary,
        }
    }

    /// Fully enumerated lookup over the worst non-structural tiers
    fn non_structural_volume(&self, states: &PerDomain<DomainState>) -> (AdvisorAction, VolumeModifier) {
        let readiness = Domain::NON_STRUCTURAL
            .iter()
            .map(|&d| ReadinessTier::from(states[d].readiness_status))
            .max()
            .unwrap_or(ReadinessTier::Clear);
        let exposure = Domain::NON_STRUCTURAL
            .iter()
            .map(|&d| ExposureTier::from(states[d].acwr_status))
            .max()
            .unwrap_or(ExposureTier::Clear);

        use AdvisorAction::{LightSession, Train, TrainReduced};
        use ExposureTier as E;
        use ReadinessTier as R;
        use VolumeLabel::{Full, Minimal, Moderate, Reduced};

        let (action, label, factor, reason) = match (readiness, exposure) {
            (R::Clear, E::Clear) => (Train, Full, 1.0, "Recovered: full volume."),
            (R::Clear, E::Spike) => (TrainReduced, Reduced, 0.7, "Exposure spike: reduce volume by 30%."),
            (R::Clear, E::HighSpike) => (TrainReduced, Reduced, 0.5, "High exposure spike: halve volume."),
            (R::Partial, E::Clear) => (TrainReduced, Moderate, 0.8, "Partial recovery: moderate volume."),
            (R::Partial, E::Spike) => (TrainReduced, Reduced, 0.6, "Partial recovery with an exposure spike: reduce volume."),
            (R::Partial, E::HighSpike) => (TrainReduced, Reduced, 0.5, "Partial recovery with a high spike: halve volume."),
            (R::Fatigued, E::Clear) => (TrainReduced, Reduced, 0.5, "Low readiness: reduce volume."),
            (R::Fatigued, E::Spike) => (TrainReduced, Reduced, 0.5, "Low readiness with an exposure spike: reduce volume."),
            (R::Fatigued, E::HighSpike) => (
                LightSession,
                Minimal,
                self.config.light_session_factor,
                "Low readiness with a high spike: very light session.",
            ),
        };

        (
            action,
            VolumeModifier {
                factor,
                label,
                reason: reason.to_string(),
            },
        )
    }
}

fn summary_line(action: AdvisorAction, label: VolumeLabel, blocked: &[Domain]) -> String {
    let blocked_names = blocked.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ");
    match (action, label) {
        (AdvisorAction::Rest, _) => "Rest recommended: the structural domains need recovery.".to_string(),
        (AdvisorAction::LightSession, _) => {
            format!("Light session recommended: avoid loading {}.", blocked_names)
        }
        (AdvisorAction::TrainReduced, VolumeLabel::Moderate) => {
            "Training possible at moderate volume: partial recovery.".to_string()
        }
        (AdvisorAction::TrainReduced, _) => "Training possible at reduced volume.".to_string(),
        (AdvisorAction::Train, _) if blocked.is_empty() => {
            "Every domain recovered: full training possible.".to_string()
        }
        (AdvisorAction::Train, _) => format!("Full training possible: watch {}.", blocked_names),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ACWR_STATUSES: [AcwrStatus; 5] = [
        AcwrStatus::InsufficientHistory,
        AcwrStatus::Underexposed,
        AcwrStatus::InRange,
        AcwrStatus::Spike,
        AcwrStatus::HighSpike,
    ];

    const READINESS_STATUSES: [ReadinessStatus; 4] = [
        ReadinessStatus::Recovered,
        ReadinessStatus::Partial,
        ReadinessStatus::Fatigued,
        ReadinessStatus::NoData,
    ];

    fn all_clear() -> PerDomain<DomainState> {
        PerDomain::from_fn(|_| DomainState::new(AcwrStatus::InRange, ReadinessStatus::Recovered))
    }

    fn all_states() -> Vec<DomainState> {
        ACWR_STATUSES
            .iter()
            .flat_map(|&a| READINESS_STATUSES.iter().map(move |&r| DomainState::new(a, r)))
            .collect()
    }

    #[test]
    fn test_all_clear_trains_full() {
        let advice = DailyAdvisor::new().advise(&all_clear());
        assert_eq!(advice.action, AdvisorAction::Train);
        assert_eq!(advice.volume.label, VolumeLabel::Full);
        assert_eq!(advice.volume.factor, 1.0);
        assert_eq!(advice.trainable_domains.len(), 5);
        assert!(advice.blocked_domains.is_empty());
    }

    #[test]
    fn test_both_structural_blocked_rests_for_every_combination() {
        let advisor = DailyAdvisor::new();
        let states = all_states();
        for m in &states {
            for a in &states {
                for c in &states {
                    let input = PerDomain::new(
                        *m,
                        DomainState::new(AcwrStatus::HighSpike, ReadinessStatus::Recovered),
                        DomainState::new(AcwrStatus::InRange, ReadinessStatus::Fatigued),
                        *a,
                        *c,
                    );
                    let advice = advisor.advise(&input);
                    assert_eq!(advice.action, AdvisorAction::Rest);
                    assert_eq!(advice.volume.factor, 0.0);
                    assert!(advice.domains.iter().all(|(_, g)| !g.can_load));
                }
            }
        }
    }

    #[test]
    fn test_one_structural_blocked_is_light_session() {
        let mut states = all_clear();
        states[Domain::Tendon] = DomainState::new(AcwrStatus::InRange, ReadinessStatus::Fatigued);
        let advice = DailyAdvisor::new().advise(&states);
        assert_eq!(advice.action, AdvisorAction::LightSession);
        assert_eq!(advice.volume.label, VolumeLabel::Minimal);
        assert_eq!(advice.volume.factor, 0.3);
        assert!(!advice.domains[Domain::Tendon].can_load);
        assert!(advice.domains[Domain::Neuromuscular].can_load);
        assert_eq!(advice.blocked_domains, vec![Domain::Tendon]);
        assert_eq!(advice.summary, "Light session recommended: avoid loading tendon.");
    }

    #[test]
    fn test_non_structural_table() {
        let advisor = DailyAdvisor::new();
        let cases = [
            (ReadinessStatus::Recovered, AcwrStatus::Spike, AdvisorAction::TrainReduced, VolumeLabel::Reduced, 0.7),
            (ReadinessStatus::NoData, AcwrStatus::HighSpike, AdvisorAction::TrainReduced, VolumeLabel::Reduced, 0.5),
            (ReadinessStatus::Partial, AcwrStatus::Underexposed, AdvisorAction::TrainReduced, VolumeLabel::Moderate, 0.8),
            (ReadinessStatus::Partial, AcwrStatus::Spike, AdvisorAction::TrainReduced, VolumeLabel::Reduced, 0.6),
            (ReadinessStatus::Fatigued, AcwrStatus::InsufficientHistory, AdvisorAction::TrainReduced, VolumeLabel::Reduced, 0.5),
            (ReadinessStatus::Fatigued, AcwrStatus::HighSpike, AdvisorAction::LightSession, VolumeLabel::Minimal, 0.3),
        ];

        for (readiness, acwr, action, label, factor) in cases {
            let mut states = all_clear();
            states[Domain::Autonomic] = DomainState::new(acwr, readiness);
            let advice = advisor.advise(&states);
            assert_eq!(advice.action, action, "{:?}/{:?}", readiness, acwr);
            assert_eq!(advice.volume.label, label);
            assert!((advice.volume.factor - factor).abs() < 1e-12);
        }
    }

    #[test]
    fn test_worst_tiers_come_from_different_domains() {
        let mut states = all_clear();
        states[Domain::Metabolic] = DomainState::new(AcwrStatus::Spike, ReadinessStatus::Recovered);
        states[Domain::Coordination] = DomainState::new(AcwrStatus::InRange, ReadinessStatus::Partial);
        let advice = DailyAdvisor::new().advise(&states);
        assert_eq!(advice.volume.factor, 0.6);
        assert_eq!(advice.trainable_domains.len(), 5);
    }

    #[test]
    fn test_guidance_text_is_fixed() {
        for acwr in ACWR_STATUSES {
            for readiness in READINESS_STATUSES {
                assert!(!guidance_text(acwr, readiness).is_empty());
            }
        }
        assert_eq!(
            guidance_text(AcwrStatus::InRange, ReadinessStatus::Recovered),
            "Recovered: ready for full load."
        );
    }

    #[test]
    fn test_config_validation() {
        assert!(AdvisorConfig::default().validate().is_ok());
        assert!(AdvisorConfig { light_session_factor: 0.0 }.validate().is_err());
        assert!(AdvisorConfig { light_session_factor: 0.25 }.validate().is_ok());
    }

    fn arb_state() -> impl Strategy<Value = DomainState> {
        (0usize..5, 0usize..4).prop_map(|(a, r)| DomainState::new(ACWR_STATUSES[a], READINESS_STATUSES[r]))
    }

    proptest! {
        #[test]
        fn prop_advice_is_consistent(
            m in arb_state(), n in arb_state(), t in arb_state(), a in arb_state(), c in arb_state(),
        ) {
            let states = PerDomain::new(m, n, t, a, c);
            let advisor = DailyAdvisor::new();
            let advice = advisor.advise(&states);

            prop_assert_eq!(&advice, &advisor.advise(&states));
            prop_assert!((0.0..=1.0).contains(&advice.volume.factor));
            prop_assert_eq!(advice.action == AdvisorAction::Rest, n.is_blocked() && t.is_blocked());
            if advice.action != AdvisorAction::Rest {
                for (domain, guidance) in advice.domains.iter() {
                    prop_assert_eq!(guidance.can_load, !states[domain].is_blocked());
                }
            }
        }
    }
}
