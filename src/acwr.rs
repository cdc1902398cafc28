//! Acute:Chronic Workload Ratio per physiological domain
//!
//! The ACWR is a monitoring signal. It flags spikes and under-exposure per
//! domain; it does not predict injury and does not block training on its own.
//! Thresholds are operational categories:
//!
//! - `< 0.8` underexposed
//! - `[0.8, 1.3]` in range
//! - `(1.3, 1.5]` spike
//! - `> 1.5` high spike
//!
//! A domain whose chronic weekly load is below its minimum is reported as
//! `insufficient_history` with no ratio. The aggregate status is a weighted
//! mean ratio across domains with history, escalated by the structural veto:
//! it can never be less severe than the worse of N and T.

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::{Result, SamcError};
use crate::load::aggregate_daily_loads;
use crate::models::{round3, Domain, LoadVector, PerDomain, TrainingSession};

/// Exposure classification for one domain (or the aggregate).
///
/// Variants are declared in severity order, so `Ord` compares severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrStatus {
    InsufficientHistory,
    Underexposed,
    InRange,
    Spike,
    HighSpike,
}

impl AcwrStatus {
    /// Classify a defined ratio
    pub fn from_ratio(ratio: f64) -> Self {
        if ratio < 0.8 {
            AcwrStatus::Underexposed
        } else if ratio <= 1.3 {
            AcwrStatus::InRange
        } else if ratio <= 1.5 {
            AcwrStatus::Spike
        } else {
            AcwrStatus::HighSpike
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AcwrStatus::InsufficientHistory => "insufficient_history",
            AcwrStatus::Underexposed => "underexposed",
            AcwrStatus::InRange => "in_range",
            AcwrStatus::Spike => "spike",
            AcwrStatus::HighSpike => "high_spike",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            AcwrStatus::InsufficientHistory => "Not enough chronic load to compute a ratio",
            AcwrStatus::Underexposed => "Recent load well below the chronic baseline",
            AcwrStatus::InRange => "Recent load consistent with the chronic baseline",
            AcwrStatus::Spike => "Recent load above the chronic baseline",
            AcwrStatus::HighSpike => "Recent load far above the chronic baseline",
        }
    }

    pub fn is_spike(&self) -> bool {
        matches!(self, AcwrStatus::Spike | AcwrStatus::HighSpike)
    }
}

impl std::fmt::Display for AcwrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combined state of the structural domains (N + T)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StructuralStatus {
    Ok,
    Caution,
    Alert,
    InsufficientData,
}

impl StructuralStatus {
    /// Derived from the structural domains that have enough history
    pub fn from_domains(neuromuscular: &DomainAcwr, tendon: &DomainAcwr) -> Self {
        let statuses: Vec<AcwrStatus> = [neuromuscular, tendon]
            .iter()
            .filter(|d| d.has_sufficient_history)
            .map(|d| d.status)
            .collect();

        if statuses.is_empty() {
            StructuralStatus::InsufficientData
        } else if statuses.contains(&AcwrStatus::HighSpike) {
            StructuralStatus::Alert
        } else if statuses.contains(&AcwrStatus::Spike) {
            StructuralStatus::Caution
        } else {
            StructuralStatus::Ok
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StructuralStatus::Ok => "ok",
            StructuralStatus::Caution => "caution",
            StructuralStatus::Alert => "alert",
            StructuralStatus::InsufficientData => "insufficient_data",
        }
    }
}

/// Exposure-window strategy selector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcwrMethod {
    /// Plain rolling sums (default)
    #[default]
    RollingAverage,
    /// Exponentially weighted moving averages
    Ewma,
}

/// ACWR configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AcwrConfig {
    /// Acute window length in days, inclusive of the evaluation date (3-14)
    pub acute_days: u32,

    /// Chronic window length in days, inclusive of the evaluation date (14-56)
    pub chronic_days: u32,

    pub method: AcwrMethod,

    /// Minimum chronic weekly load below which a domain has no ratio
    pub min_chronic: PerDomain<f64>,

    /// Domain weights for the aggregate ratio
    pub weights: PerDomain<f64>,
}

impl Default for AcwrConfig {
    fn default() -> Self {
        AcwrConfig {
            acute_days: 7,
            chronic_days: 28,
            method: AcwrMethod::RollingAverage,
            // ~5% of a typical tonnage-based training week
            min_chronic: PerDomain::new(500.0, 600.0, 500.0, 500.0, 150.0),
            weights: default_domain_weights(),
        }
    }
}

/// Domain priority weights: structural first, autonomic as modulator
pub fn default_domain_weights() -> PerDomain<f64> {
    PerDomain::new(0.3, 1.0, 1.0, 0.6, 0.2)
}

impl AcwrConfig {
    pub fn chronic_weeks(&self) -> f64 {
        self.chronic_days as f64 / 7.0
    }

    pub fn validate(&self) -> Result<()> {
        if !(3..=14).contains(&self.acute_days) {
            return Err(SamcError::Configuration(format!(
                "acwr.acute_days must be within 3-14, got {}",
                self.acute_days
            )));
        }
        if !(14..=56).contains(&self.chronic_days) {
            return Err(SamcError::Configuration(format!(
                "acwr.chronic_days must be within 14-56, got {}",
                self.chronic_days
            )));
        }
        for (domain, value) in self.min_chronic.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(SamcError::Configuration(format!(
                    "acwr.min_chronic.{} must be a non-negative number",
                    domain
                )));
            }
        }
        for (domain, value) in self.weights.iter() {
            if !value.is_finite() || *value < 0.0 {
                return Err(SamcError::Configuration(format!(
                    "acwr.weights.{} must be a non-negative number",
                    domain
                )));
            }
        }
        Ok(())
    }

    /// Window strategy selected by `method`
    pub fn exposure_window(&self) -> Box<dyn ExposureWindow> {
        match self.method {
            AcwrMethod::RollingAverage => Box::new(RollingSum::new(self.acute_days, self.chronic_days)),
            AcwrMethod::Ewma => Box::new(Ewma::new(self.acute_days, self.chronic_days)),
        }
    }
}

/// Acute load and chronic weekly average for one domain
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowedExposure {
    pub acute: f64,
    pub chronic_weekly: f64,
}

/// Strategy summarizing a domain's daily series as of a date.
///
/// Entries dated after `as_of` must be ignored.
pub trait ExposureWindow: Send + Sync {
    fn exposure(&self, daily: &BTreeMap<NaiveDate, f64>, as_of: NaiveDate) -> WindowedExposure;

    fn name(&self) -> &'static str;
}

fn window_start(as_of: NaiveDate, days: u32) -> NaiveDate {
    as_of
        .checked_sub_days(Days::new(days.saturating_sub(1) as u64))
        .unwrap_or(NaiveDate::MIN)
}

/// Rolling sums over fixed windows ending at `as_of`
#[derive(Debug, Clone, Copy)]
pub struct RollingSum {
    acute_days: u32,
    chronic_days: u32,
}

impl RollingSum {
    pub fn new(acute_days: u32, chronic_days: u32) -> Self {
        RollingSum { acute_days, chronic_days }
    }

    fn sum(daily: &BTreeMap<NaiveDate, f64>, start: NaiveDate, end: NaiveDate) -> f64 {
        daily.range(start..=end).map(|(_, value)| value).sum()
    }
}

impl ExposureWindow for RollingSum {
    fn exposure(&self, daily: &BTreeMap<NaiveDate, f64>, as_of: NaiveDate) -> WindowedExposure {
        let acute = Self::sum(daily, window_start(as_of, self.acute_days), as_of);
        let chronic = Self::sum(daily, window_start(as_of, self.chronic_days), as_of);
        WindowedExposure {
            acute,
            chronic_weekly: chronic / (self.chronic_days as f64 / 7.0),
        }
    }

    fn name(&self) -> &'static str {
        "rolling_average"
    }
}

/// Exponentially weighted daily averages, `k = 2 / (N + 1)`.
///
/// The acute average is scaled to the acute window length and the chronic
/// average to a week, so a constant daily load gives the same numbers as
/// [`RollingSum`].
#[derive(Debug, Clone, Copy)]
pub struct Ewma {
    acute_days: u32,
    chronic_days: u32,
}

impl Ewma {
    pub fn new(acute_days: u32, chronic_days: u32) -> Self {
        Ewma { acute_days, chronic_days }
    }

    fn decay(days: u32) -> f64 {
        2.0 / (days as f64 + 1.0)
    }
}

impl ExposureWindow for Ewma {
    fn exposure(&self, daily: &BTreeMap<NaiveDate, f64>, as_of: NaiveDate) -> WindowedExposure {
        let Some((&first, _)) = daily.range(..=as_of).next() else {
            return WindowedExposure::default();
        };

        let k_acute = Self::decay(self.acute_days);
        let k_chronic = Self::decay(self.chronic_days);
        let mut acute = 0.0;
        let mut chronic = 0.0;

        for date in first.iter_days().take_while(|date| *date <= as_of) {
            let value = daily.get(&date).copied().unwrap_or(0.0);
            acute += (value - acute) * k_acute;
            chronic += (value - chronic) * k_chronic;
        }

        WindowedExposure {
            acute: acute * self.acute_days as f64,
            chronic_weekly: chronic * 7.0,
        }
    }

    fn name(&self) -> &'static str {
        "ewma"
    }
}

/// ACWR state for a single domain
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DomainAcwr {
    /// Ratio, `None` when the chronic baseline is below the minimum
    pub ratio: Option<f64>,
    pub status: AcwrStatus,
    pub acute_load: f64,
    pub chronic_weekly_load: f64,
    pub has_sufficient_history: bool,
}

impl DomainAcwr {
    /// Classify one domain's exposure against its chronic minimum
    pub fn from_exposure(exposure: WindowedExposure, min_chronic: f64) -> Self {
        let WindowedExposure { acute, chronic_weekly } = exposure;
        if chronic_weekly < min_chronic || chronic_weekly <= 0.0 {
            return DomainAcwr {
                ratio: None,
                status: AcwrStatus::InsufficientHistory,
                acute_load: acute,
                chronic_weekly_load: chronic_weekly,
                has_sufficient_history: false,
            };
        }

        let ratio = round3(acute / chronic_weekly);
        DomainAcwr {
            ratio: Some(ratio),
            status: AcwrStatus::from_ratio(ratio),
            acute_load: acute,
            chronic_weekly_load: chronic_weekly,
            has_sufficient_history: true,
        }
    }
}

/// Full vectorial training state as of a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcwrReport {
    pub as_of: NaiveDate,
    pub domains: PerDomain<DomainAcwr>,

    /// Weighted mean ratio over domains with sufficient history
    pub weighted_ratio: Option<f64>,

    /// Weighted bucket escalated by the structural veto
    pub aggregate_status: AcwrStatus,
    pub structural_status: StructuralStatus,

    pub acute_load: LoadVector,
    pub chronic_load: LoadVector,

    /// Sessions inside the chronic window
    pub session_count: u32,

    /// Distinct training days inside the chronic window
    pub days_of_data: u32,

    pub context_notes: Vec<String>,
}

impl AcwrReport {
    pub fn status(&self, domain: Domain) -> AcwrStatus {
        self.domains[domain].status
    }
}

/// Weighted mean ratio over domains with history, and its bucket
pub fn weighted_aggregate(domains: &PerDomain<DomainAcwr>, weights: &PerDomain<f64>) -> (Option<f64>, AcwrStatus) {
    let mut weighted_sum = 0.0;
    let mut total_weight = 0.0;

    for (domain, state) in domains.iter() {
        if let Some(ratio) = state.ratio {
            weighted_sum += ratio * weights[domain];
            total_weight += weights[domain];
        }
    }

    if total_weight <= 0.0 {
        return (None, AcwrStatus::InsufficientHistory);
    }

    let ratio = round3(weighted_sum / total_weight);
    (Some(ratio), AcwrStatus::from_ratio(ratio))
}

/// The aggregate is never less severe than the worse structural domain
pub fn apply_structural_veto(bucket: AcwrStatus, domains: &PerDomain<DomainAcwr>) -> AcwrStatus {
    let structural = Domain::STRUCTURAL
        .iter()
        .map(|&domain| domains[domain].status)
        .max()
        .unwrap_or(AcwrStatus::InsufficientHistory);
    bucket.max(structural)
}

fn join_domains(domains: &[Domain]) -> String {
    domains.iter().map(|d| d.name()).collect::<Vec<_>>().join(", ")
}

/// Deterministic interpretive notes from a fixed phrase table
pub fn context_notes(domains: &PerDomain<DomainAcwr>, structural: StructuralStatus) -> Vec<String> {
    let insufficient: Vec<Domain> = domains
        .iter()
        .filter(|(_, state)| !state.has_sufficient_history)
        .map(|(domain, _)| domain)
        .collect();

    if insufficient.len() == Domain::ALL.len() {
        return vec!["Insufficient data in every domain: keep logging sessions.".to_string()];
    }

    let mut notes = Vec::new();
    if !insufficient.is_empty() {
        notes.push(format!("Insufficient data for: {}.", join_domains(&insufficient)));
    }

    match structural {
        StructuralStatus::Alert => {
            let spiked: Vec<Domain> = Domain::STRUCTURAL
                .iter()
                .copied()
                .filter(|&d| domains[d].has_sufficient_history && domains[d].status.is_spike())
                .collect();
            notes.push(format!(
                "Spike in structural domains ({}): consider reducing volume or adding recovery.",
                join_domains(&spiked)
            ));
        }
        StructuralStatus::Caution => {
            notes.push("Caution on structural domains: monitor the next cycle.".to_string());
        }
        StructuralStatus::Ok | StructuralStatus::InsufficientData => {}
    }

    for domain in Domain::NON_STRUCTURAL {
        let state = &domains[domain];
        if let (true, Some(ratio)) = (state.status.is_spike(), state.ratio) {
            notes.push(format!("Spike in {} (ACWR {:.2}).", domain, ratio));
        }
    }

    let underexposed: Vec<Domain> = domains
        .iter()
        .filter(|(_, state)| state.status == AcwrStatus::Underexposed)
        .map(|(domain, _)| domain)
        .collect();
    if !underexposed.is_empty() {
        notes.push(format!("Underexposed: {}.", join_domains(&underexposed)));
    }

    if notes.is_empty() {
        notes.push("Stable load, every domain within operating range.".to_string());
    }
    notes
}

/// ACWR calculation engine
pub struct AcwrCalculator {
    config: AcwrConfig,
    window: Box<dyn ExposureWindow>,
}

impl AcwrCalculator {
    /// Create new ACWR calculator with default configuration
    pub fn new() -> Self {
        Self::with_config(AcwrConfig::default())
    }

    pub fn with_config(config: AcwrConfig) -> Self {
        let window = config.exposure_window();
        AcwrCalculator { config, window }
    }

    pub fn config(&self) -> &AcwrConfig {
        &self.config
    }

    /// Compute the per-domain ACWR and aggregate state as of a date.
    /// Sessions dated after `as_of` are ignored.
    pub fn calculate(&self, history: &[TrainingSession], as_of: NaiveDate) -> AcwrReport {
        let daily = aggregate_daily_loads(history);
        let chronic_start = window_start(as_of, self.config.chronic_days);

        let exposures: PerDomain<WindowedExposure> = PerDomain::from_fn(|domain| {
            let series: BTreeMap<NaiveDate, f64> = daily
                .iter()
                .map(|(date, day)| (*date, day.total.get(domain)))
                .collect();
            self.window.exposure(&series, as_of)
        });

        let domains = exposures.map(|domain, exposure| {
            let state = DomainAcwr::from_exposure(*exposure, self.config.min_chronic[domain]);
            tracing::trace!(
                domain = %domain,
                acute = exposure.acute,
                chronic_weekly = exposure.chronic_weekly,
                "Windowed exposure"
            );
            state
        });

        let (weighted_ratio, bucket) = weighted_aggregate(&domains, &self.config.weights);
        let aggregate_status = apply_structural_veto(bucket, &domains);
        if aggregate_status > bucket {
            tracing::warn!(
                %as_of,
                weighted = %bucket,
                escalated = %aggregate_status,
                neuromuscular = %domains[Domain::Neuromuscular].status,
                tendon = %domains[Domain::Tendon].status,
                "Structural veto escalated aggregate ACWR status"
            );
        }

        let structural_status =
            StructuralStatus::from_domains(&domains[Domain::Neuromuscular], &domains[Domain::Tendon]);
        let context_notes = context_notes(&domains, structural_status);

        let in_chronic_window = |session: &&TrainingSession| {
            let date = session.date();
            date >= chronic_start && date <= as_of
        };
        let session_count = history.iter().filter(in_chronic_window).count() as u32;
        let days_of_data = daily.range(chronic_start..=as_of).count() as u32;

        tracing::debug!(
            %as_of,
            method = self.window.name(),
            aggregate = %aggregate_status,
            structural = structural_status.as_str(),
            session_count,
            "Computed ACWR"
        );

        AcwrReport {
            as_of,
            acute_load: LoadVector::from_fn(|d| exposures[d].acute),
            chronic_load: LoadVector::from_fn(|d| exposures[d].chronic_weekly),
            domains,
            weighted_ratio,
            aggregate_status,
            structural_status,
            session_count,
            days_of_data,
            context_notes,
        }
    }
}

impl Default for AcwrCalculator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AcwrCalculator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcwrCalculator")
            .field("config", &self.config)
            .field("window", &self.window.name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn create_test_session(day: NaiveDate, load: LoadVector) -> TrainingSession {
        TrainingSession::new(
            Utc.from_utc_datetime(&day.and_hms_opt(9, 0, 0).unwrap()),
            "weight_lifting",
            load,
        )
    }

    fn constant_history(end: NaiveDate, days: u64, load: LoadVector) -> Vec<TrainingSession> {
        (0..days)
            .map(|offset| create_test_session(end - Days::new(offset), load))
            .collect()
    }

    fn state(status: AcwrStatus, ratio: Option<f64>) -> DomainAcwr {
        DomainAcwr {
            ratio,
            status,
            acute_load: 0.0,
            chronic_weekly_load: 0.0,
            has_sufficient_history: ratio.is_some(),
        }
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(AcwrStatus::from_ratio(0.79), AcwrStatus::Underexposed);
        assert_eq!(AcwrStatus::from_ratio(0.8), AcwrStatus::InRange);
        assert_eq!(AcwrStatus::from_ratio(1.3), AcwrStatus::InRange);
        assert_eq!(AcwrStatus::from_ratio(1.31), AcwrStatus::Spike);
        assert_eq!(AcwrStatus::from_ratio(1.5), AcwrStatus::Spike);
        assert_eq!(AcwrStatus::from_ratio(1.500001), AcwrStatus::HighSpike);
    }

    #[test]
    fn test_exact_boundary_ratios_from_fractional_loads() {
        let as_of = date(2025, 6, 30);
        let config = AcwrConfig {
            min_chronic: PerDomain::new(0.5, 0.5, 0.5, 0.5, 0.5),
            ..AcwrConfig::default()
        };
        let calculator = AcwrCalculator::with_config(config);

        for (target, expected) in [
            (0.8, AcwrStatus::InRange),
            (1.3, AcwrStatus::InRange),
            (1.5, AcwrStatus::Spike),
        ] {
            for k in 1..200 {
                // Chronic weekly load k, acute load target * k
                let k = k as f64;
                let older = (4.0 - target) * k / 21.0;
                let recent = target * k / 7.0;
                let history: Vec<TrainingSession> = (0..28u64)
                    .map(|offset| {
                        let load = if offset < 7 { recent } else { older };
                        create_test_session(as_of - Days::new(offset), LoadVector::new(load, load, load, load, load))
                    })
                    .collect();

                let report = calculator.calculate(&history, as_of);
                let neuromuscular = report.domains[Domain::Neuromuscular];
                assert_eq!(neuromuscular.ratio, Some(target), "k={}", k);
                assert_eq!(neuromuscular.status, expected, "k={} target={}", k, target);
                assert_eq!(report.weighted_ratio, Some(target), "k={}", k);
            }
        }
    }

    #[test]
    fn test_severity_order() {
        assert!(AcwrStatus::InsufficientHistory < AcwrStatus::Underexposed);
        assert!(AcwrStatus::Underexposed < AcwrStatus::InRange);
        assert!(AcwrStatus::InRange < AcwrStatus::Spike);
        assert!(AcwrStatus::Spike < AcwrStatus::HighSpike);
    }

    #[test]
    fn test_status_descriptions_are_distinct() {
        let statuses = [
            AcwrStatus::InsufficientHistory,
            AcwrStatus::Underexposed,
            AcwrStatus::InRange,
            AcwrStatus::Spike,
            AcwrStatus::HighSpike,
        ];
        let descriptions: std::collections::HashSet<&str> =
            statuses.iter().map(|s| s.description()).collect();
        assert_eq!(descriptions.len(), statuses.len());
        assert!(descriptions.iter().all(|d| !d.is_empty()));
    }

    #[test]
    fn test_constant_load_gives_unit_ratio() {
        let as_of = date(2025, 3, 28);
        let history = constant_history(as_of, 28, LoadVector::new(100.0, 100.0, 100.0, 100.0, 100.0));

        let report = AcwrCalculator::new().calculate(&history, as_of);
        for (domain, state) in report.domains.iter() {
            let ratio = state.ratio.unwrap_or_else(|| panic!("{} has no ratio", domain));
            assert!((ratio - 1.0).abs() < 1e-9);
            assert_eq!(state.status, AcwrStatus::InRange);
            assert!((state.acute_load - 700.0).abs() < 1e-9);
            assert!((state.chronic_weekly_load - 700.0).abs() < 1e-9);
        }
        assert_eq!(report.aggregate_status, AcwrStatus::InRange);
        assert_eq!(report.structural_status, StructuralStatus::Ok);
        assert_eq!(report.session_count, 28);
        assert_eq!(report.days_of_data, 28);
        assert_eq!(report.context_notes, vec!["Stable load, every domain within operating range."]);
    }

    #[test]
    fn test_empty_history_is_insufficient_not_error() {
        let report = AcwrCalculator::new().calculate(&[], date(2025, 3, 28));
        for (_, state) in report.domains.iter() {
            assert_eq!(state.status, AcwrStatus::InsufficientHistory);
            assert!(state.ratio.is_none());
        }
        assert_eq!(report.aggregate_status, AcwrStatus::InsufficientHistory);
        assert_eq!(report.structural_status, StructuralStatus::InsufficientData);
        assert!(report.weighted_ratio.is_none());
        assert_eq!(report.context_notes.len(), 1);
    }

    #[test]
    fn test_below_minimum_has_no_ratio() {
        let as_of = date(2025, 3, 28);
        // 10/day -> 70/week, below every default minimum
        let history = constant_history(as_of, 28, LoadVector::new(10.0, 10.0, 10.0, 10.0, 10.0));
        let report = AcwrCalculator::new().calculate(&history, as_of);
        assert!(report.domains[Domain::Neuromuscular].ratio.is_none());
        assert_eq!(report.status(Domain::Coordination), AcwrStatus::InsufficientHistory);
    }

    #[test]
    fn test_windows_exclude_old_and_future_sessions() {
        let as_of = date(2025, 3, 28);
        let load = LoadVector::new(100.0, 100.0, 100.0, 100.0, 100.0);
        let mut history = constant_history(as_of, 28, load);
        // Outside the chronic window and after as_of
        history.push(create_test_session(date(2025, 2, 28), LoadVector::new(1e6, 1e6, 1e6, 1e6, 1e6)));
        history.push(create_test_session(date(2025, 3, 29), LoadVector::new(1e6, 1e6, 1e6, 1e6, 1e6)));

        let report = AcwrCalculator::new().calculate(&history, as_of);
        assert!((report.domains[Domain::Tendon].ratio.unwrap() - 1.0).abs() < 1e-9);
        assert_eq!(report.session_count, 28);
    }

    #[test]
    fn test_structural_veto_forces_high_spike() {
        let domains = PerDomain::new(
            state(AcwrStatus::InRange, Some(1.0)),
            state(AcwrStatus::HighSpike, Some(1.8)),
            state(AcwrStatus::InRange, Some(1.0)),
            state(AcwrStatus::InRange, Some(1.0)),
            state(AcwrStatus::InRange, Some(1.0)),
        );
        let (ratio, bucket) = weighted_aggregate(&domains, &default_domain_weights());
        // (0.3 + 1.8 + 1.0 + 0.6 + 0.2) / 3.1
        assert_eq!(ratio, Some(1.258));
        assert_eq!(bucket, AcwrStatus::InRange);
        assert_eq!(apply_structural_veto(bucket, &domains), AcwrStatus::HighSpike);
    }

    #[test]
    fn test_veto_never_lowers_bucket() {
        let domains = PerDomain::new(
            state(AcwrStatus::HighSpike, Some(3.0)),
            state(AcwrStatus::InsufficientHistory, None),
            state(AcwrStatus::InRange, Some(1.0)),
            state(AcwrStatus::HighSpike, Some(3.0)),
            state(AcwrStatus::HighSpike, Some(3.0)),
        );
        let (_, bucket) = weighted_aggregate(&domains, &default_domain_weights());
        assert_eq!(bucket, AcwrStatus::HighSpike);
        assert_eq!(apply_structural_veto(bucket, &domains), AcwrStatus::HighSpike);
        assert_eq!(
            StructuralStatus::from_domains(&domains[Domain::Neuromuscular], &domains[Domain::Tendon]),
            StructuralStatus::Ok
        );
    }

    #[test]
    fn test_structural_spike_in_report() {
        let as_of = date(2025, 3, 28);
        let base = LoadVector::new(100.0, 100.0, 100.0, 100.0, 100.0);
        let mut history = constant_history(as_of, 28, base);
        // Heavy tendon week on top of the baseline
        for offset in 0..7 {
            history.push(create_test_session(as_of - Days::new(offset), LoadVector::new(0.0, 0.0, 150.0, 0.0, 0.0)));
        }

        let report = AcwrCalculator::new().calculate(&history, as_of);
        assert_eq!(report.status(Domain::Tendon), AcwrStatus::HighSpike);
        assert_eq!(report.aggregate_status, AcwrStatus::HighSpike);
        assert_eq!(report.structural_status, StructuralStatus::Alert);
        assert!(report.context_notes.iter().any(|n| n.contains("structural domains (tendon)")));
    }

    #[test]
    fn test_ewma_constant_load_converges_to_unit_ratio() {
        let as_of = date(2025, 6, 30);
        let history = constant_history(as_of, 150, LoadVector::new(100.0, 100.0, 100.0, 100.0, 100.0));
        let config = AcwrConfig {
            method: AcwrMethod::Ewma,
            ..AcwrConfig::default()
        };
        let report = AcwrCalculator::with_config(config).calculate(&history, as_of);
        let ratio = report.domains[Domain::Neuromuscular].ratio.unwrap();
        assert!((ratio - 1.0).abs() < 0.01, "ratio {}", ratio);
    }

    #[test]
    fn test_config_validation() {
        assert!(AcwrConfig::default().validate().is_ok());
        let bad = AcwrConfig {
            acute_days: 2,
            ..AcwrConfig::default()
        };
        assert!(bad.validate().is_err());
        let bad = AcwrConfig {
            chronic_days: 60,
            ..AcwrConfig::default()
        };
        assert!(bad.validate().is_err());
    }

    proptest! {
        #[test]
        fn prop_ratio_defined_iff_sufficient(
            loads in proptest::collection::vec((0.0f64..2000.0, 0.0f64..2000.0), 0..40),
        ) {
            let as_of = date(2025, 3, 28);
            let history: Vec<TrainingSession> = loads
                .iter()
                .enumerate()
                .map(|(i, (n, t))| create_test_session(
                    as_of - Days::new(i as u64),
                    LoadVector::new(*n, *n, *t, *t, *n),
                ))
                .collect();

            let report = AcwrCalculator::new().calculate(&history, as_of);
            for (_, state) in report.domains.iter() {
                prop_assert_eq!(state.ratio.is_none(), state.status == AcwrStatus::InsufficientHistory);
                if let Some(ratio) = state.ratio {
                    prop_assert!(ratio.is_finite() && ratio >= 0.0);
                }
            }
            let worst_structural = report.status(Domain::Neuromuscular).max(report.status(Domain::Tendon));
            prop_assert!(report.aggregate_status >= worst_structural);
        }
    }
}
