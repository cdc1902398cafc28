//! Domain Readiness: per-domain short-term recovery
//!
//! Where the ACWR tracks load ratios over weeks, readiness models the
//! recovery state hours to days after training.
//!
//! # Model
//!
//! Each session deposits load on every domain. The residual fatigue of a
//! session decays exponentially with a domain-specific time constant:
//!
//! ```text
//! fatigue_i(t) = load_i × exp(-(t - t_i) / tau)
//! ```
//!
//! Fatigue from several sessions is summed (superposition) and normalised
//! against the athlete's own reference load, the average per-session load in
//! that domain over the trailing 28 days:
//!
//! ```text
//! readiness = clamp(1 - Σ fatigue_i / reference, 0, 1)
//! ```
//!
//! A domain without reference load reports `no_data`, whatever its fatigue.
//!
//! # Recovery time constants
//!
//! | Domain | tau (h) | Dominant process |
//! |--------|---------|------------------|
//! | Metabolic | 36 | glycogen resynthesis, cardiovascular |
//! | Coordination | 36 | motor pattern consolidation |
//! | Autonomic | 60 | ANS balance, HRV recovery |
//! | Neuromuscular | 72 | CNS fatigue, motor unit recovery |
//! | Tendon | 120 | collagen turnover |
//!
//! These are heuristic starting points. The relative ordering
//! (M, C < A < N < T) is the well-established part.

use chrono::{DateTime, Days, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::acwr::default_domain_weights;
use crate::error::{Result, SamcError};
use crate::models::{round3, Domain, PerDomain, TrainingSession};

/// Recovery classification for one domain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadinessStatus {
    /// Readiness >= 0.85
    Recovered,
    /// Readiness in [0.5, 0.85)
    Partial,
    /// Readiness < 0.5
    Fatigued,
    /// No reference load in the trailing window
    NoData,
}

impl ReadinessStatus {
    pub fn from_readiness(readiness: f64) -> Self {
        if readiness >= 0.85 {
            ReadinessStatus::Recovered
        } else if readiness >= 0.5 {
            ReadinessStatus::Partial
        } else {
            ReadinessStatus::Fatigued
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadinessStatus::Recovered => "recovered",
            ReadinessStatus::Partial => "partial",
            ReadinessStatus::Fatigued => "fatigued",
            ReadinessStatus::NoData => "no_data",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            ReadinessStatus::Recovered => "Residual fatigue is negligible",
            ReadinessStatus::Partial => "Some residual fatigue remains",
            ReadinessStatus::Fatigued => "Residual fatigue exceeds half a typical session",
            ReadinessStatus::NoData => "No recent load to compare against",
        }
    }
}

impl fmt::Display for ReadinessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Allowed range for `lookback_taus`, lower bound exclusive
pub const LOOKBACK_TAUS_RANGE: (f64, f64) = (0.0, 20.0);

/// Ceiling on the suggested lookback, ten years
const MAX_LOOKBACK_HOURS: f64 = 10.0 * 365.0 * 24.0;

/// Readiness configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessConfig {
    /// Recovery time constant per domain, in hours
    pub tau_hours: PerDomain<f64>,

    /// Trailing window for the reference load, in days
    pub reference_days: u32,

    /// Weights for the overall readiness
    pub weights: PerDomain<f64>,

    /// Lookback suggested to data layers, in multiples of the largest tau
    pub lookback_taus: f64,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        ReadinessConfig {
            tau_hours: PerDomain::new(36.0, 72.0, 120.0, 60.0, 36.0),
            reference_days: 28,
            weights: default_domain_weights(),
            lookback_taus: 5.0,
        }
    }
}

impl ReadinessConfig {
    pub fn max_tau_hours(&self) -> f64 {
        self.tau_hours.values().iter().copied().fold(0.0, f64::max)
    }

    /// Earliest instant whose sessions still matter (exp(-5) ≈ 0.007).
    ///
    /// The engine itself sums every past session; this bound is for callers
    /// that want to limit their history query.
    pub fn lookback_start(&self, as_of: DateTime<Utc>) -> DateTime<Utc> {
        let hours = (self.max_tau_hours() * self.lookback_taus).min(MAX_LOOKBACK_HOURS);
        let reference_start = self
            .reference_start(as_of.date_naive())
            .and_hms_opt(0, 0, 0)
            .map(|naive| naive.and_utc());
        let decay_start = as_of.checked_sub_signed(Duration::seconds((hours * 3600.0) as i64));

        match (decay_start, reference_start) {
            (Some(decay), Some(reference)) => decay.min(reference),
            (Some(decay), None) => decay,
            (None, Some(reference)) => reference,
            (None, None) => as_of,
        }
    }

    fn reference_start(&self, as_of: NaiveDate) -> NaiveDate {
        as_of
            .checked_sub_days(Days::new(self.reference_days.saturating_sub(1) as u64))
            .unwrap_or(NaiveDate::MIN)
    }

    pub fn validate(&self) -> Result<()> {
        for (domain, tau) in self.tau_hours.iter() {
            if !tau.is_finite() || *tau <= 0.0 {
                return Err(SamcError::Configuration(format!(
                    "readiness.tau_hours.{} must be positive",
                    domain
                )));
            }
        }
        for (domain, weight) in self.weights.iter() {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(SamcError::Configuration(format!(
                    "readiness.weights.{} must be a non-negative number",
                    domain
                )));
            }
        }
        if self.reference_days == 0 {
            return Err(SamcError::Configuration(
                "readiness.reference_days must be at least 1".to_string(),
            ));
        }
        let (min, max) = LOOKBACK_TAUS_RANGE;
        if !self.lookback_taus.is_finite() || self.lookback_taus <= min || self.lookback_taus > max {
            return Err(SamcError::Configuration(format!(
                "readiness.lookback_taus must lie in ({}, {}], got {}",
                min, max, self.lookback_taus
            )));
        }
        Ok(())
    }
}

/// Readiness state for a single domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainReadiness {
    /// Absolute residual fatigue (same units as load)
    pub residual_fatigue: f64,

    /// Average per-session load in the reference window
    pub reference_load: f64,

    /// `None` when there is no reference load
    pub readiness: Option<f64>,

    /// Hours since the last session with load in this domain
    pub hours_since_load: Option<f64>,

    pub tau_hours: f64,
    pub status: ReadinessStatus,
}

/// Per-domain readiness and overall summary at an instant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadinessReport {
    pub as_of: DateTime<Utc>,
    pub domains: PerDomain<DomainReadiness>,

    /// Weighted mean readiness over domains with data
    pub overall_readiness: Option<f64>,
    pub overall_status: ReadinessStatus,

    /// Least recovered domain, if any domain carries fatigue
    pub bottleneck: Option<Domain>,

    pub hours_since_last_session: Option<f64>,
    pub notes: Vec<String>,
}

impl ReadinessReport {
    pub fn status(&self, domain: Domain) -> ReadinessStatus {
        self.domains[domain].status
    }
}

/// Superposed exponential decay of `(hours_ago, load)` contributions
pub fn residual_fatigue<I>(contributions: I, tau_hours: f64) -> f64
where
    I: IntoIterator<Item = (f64, f64)>,
{
    contributions
        .into_iter()
        .map(|(hours_ago, load)| load * (-hours_ago.max(0.0) / tau_hours).exp())
        .sum()
}

fn hours_between(earlier: DateTime<Utc>, later: DateTime<Utc>) -> f64 {
    (later - earlier).num_milliseconds() as f64 / 3_600_000.0
}

fn join_domains(domains: &[Domain]) -> String {
    domains.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
}

/// Readiness calculation engine
#[derive(Debug, Clone, Default)]
pub struct ReadinessEngine {
    config: ReadinessConfig,
}

impl ReadinessEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: ReadinessConfig) -> Self {
        ReadinessEngine { config }
    }

    pub fn config(&self) -> &ReadinessConfig {
        &self.config
    }

    /// Per-domain readiness at `as_of`. Sessions after `as_of` are ignored.
    pub fn calculate(&self, history: &[TrainingSession], as_of: DateTime<Utc>) -> ReadinessReport {
        let past: Vec<&TrainingSession> = history.iter().filter(|s| s.timestamp <= as_of).collect();
        let reference_start = self.config.reference_start(as_of.date_naive());

        let domains = PerDomain::from_fn(|domain| self.domain_readiness(domain, &past, reference_start, as_of));

        let hours_since_last_session = past
            .iter()
            .map(|s| hours_between(s.timestamp, as_of))
            .fold(None, |best: Option<f64>, hours| Some(best.map_or(hours, |b| b.min(hours))));

        let (overall_readiness, overall_status, bottleneck) = self.overall(&domains);
        let notes = readiness_notes(&domains, bottleneck);

        tracing::debug!(
            %as_of,
            overall = ?overall_readiness,
            status = %overall_status,
            bottleneck = ?bottleneck,
            sessions = past.len(),
            "Computed domain readiness"
        );

        ReadinessReport {
            as_of,
            domains,
            overall_readiness,
            overall_status,
            bottleneck,
            hours_since_last_session,
            notes,
        }
    }

    fn domain_readiness(
        &self,
        domain: Domain,
        past: &[&TrainingSession],
        reference_start: NaiveDate,
        as_of: DateTime<Utc>,
    ) -> DomainReadiness {
        let tau = self.config.tau_hours[domain];
        let loaded: Vec<(f64, f64)> = past
            .iter()
            .filter(|s| s.load.get(domain) > 0.0)
            .map(|s| (hours_between(s.timestamp, as_of), s.load.get(domain)))
            .collect();

        let fatigue = residual_fatigue(loaded.iter().copied(), tau);
        let hours_since_load = loaded.iter().map(|(hours, _)| *hours).reduce(f64::min);

        let (reference_sum, reference_count) = past
            .iter()
            .filter(|s| s.date() >= reference_start && s.load.get(domain) > 0.0)
            .fold((0.0, 0u32), |(sum, count), s| (sum + s.load.get(domain), count + 1));
        let reference_load = if reference_count > 0 {
            reference_sum / reference_count as f64
        } else {
            0.0
        };

        let (readiness, status) = if reference_load > 0.0 {
            let value = round3((1.0 - fatigue / reference_load).clamp(0.0, 1.0));
            (Some(value), ReadinessStatus::from_readiness(value))
        } else {
            (None, ReadinessStatus::NoData)
        };

        tracing::trace!(
            domain = %domain,
            fatigue,
            reference_load,
            contributing = loaded.len(),
            "Residual fatigue"
        );

        DomainReadiness {
            residual_fatigue: fatigue,
            reference_load,
            readiness,
            hours_since_load,
            tau_hours: tau,
            status,
        }
    }

    fn overall(&self, domains: &PerDomain<DomainReadiness>) -> (Option<f64>, ReadinessStatus, Option<Domain>) {
        let mut weighted_sum = 0.0;
        let mut total_weight = 0.0;
        let mut bottleneck: Option<(Domain, f64)> = None;

        for (domain, state) in domains.iter() {
            let Some(readiness) = state.readiness else {
                continue;
            };
            let weight = self.config.weights[domain];
            weighted_sum += readiness * weight;
            total_weight += weight;

            if readiness < 1.0 && bottleneck.map_or(true, |(_, lowest)| readiness < lowest) {
                bottleneck = Some((domain, readiness));
            }
        }

        if total_weight <= 0.0 {
            return (None, ReadinessStatus::NoData, None);
        }

        let overall = round3(weighted_sum / total_weight);
        (
            Some(overall),
            ReadinessStatus::from_readiness(overall),
            bottleneck.map(|(domain, _)| domain),
        )
    }
}

/// Deterministic notes from a fixed phrase table
fn readiness_notes(domains: &PerDomain<DomainReadiness>, bottleneck: Option<Domain>) -> Vec<String> {
    let with_status = |status: ReadinessStatus| -> Vec<Domain> {
        domains
            .iter()
            .filter(|(_, state)| state.status == status)
            .map(|(domain, _)| domain)
            .collect()
    };

    if with_status(ReadinessStatus::NoData).len() == Domain::ALL.len() {
        return vec!["No recent training data: ready to train.".to_string()];
    }

    let mut notes = Vec::new();
    let fatigued = with_status(ReadinessStatus::Fatigued);
    if !fatigued.is_empty() {
        notes.push(format!("Still fatigued: {}.", join_domains(&fatigued)));
    }
    let partial = with_status(ReadinessStatus::Partial);
    if !partial.is_empty() {
        notes.push(format!("Partially recovered: {}.", join_domains(&partial)));
    }
    if let Some(domain) = bottleneck.filter(|d| d.is_structural()) {
        if let Some(readiness) = domains[domain].readiness {
            notes.push(format!(
                "Structural bottleneck: {} (readiness {:.0}%).",
                domain,
                readiness * 100.0
            ));
        }
    }

    if notes.is_empty() {
        notes.push("Every domain recovered: ready to train.".to_string());
    }
    notes
}
