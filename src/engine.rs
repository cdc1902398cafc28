//! Engine facade
//!
//! [`SamcEngine`] bundles the sport registry, the stress profile mapper and
//! every calculator configuration into one immutable object. It holds no
//! mutable state, so a single instance can be shared across threads and
//! passed to every entry point.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::acwr::{AcwrCalculator, AcwrConfig, AcwrReport};
use crate::advisor::{AdvisorConfig, AdvisorRecommendation, DailyAdvisor};
use crate::error::Result;
use crate::exercise::{BuiltinCatalog, ContributionTable, ExerciseCatalog, StressProfileMapper};
use crate::load::LoadAggregator;
use crate::micro_cycle::{compute_micro_cycle_length, MicroCycleConfig, MicroCycleLength};
use crate::models::{LoadVector, SportConfig, TrainingSession};
use crate::readiness::{ReadinessConfig, ReadinessEngine, ReadinessReport};
use crate::sports::SportRegistry;

/// Everything configurable about an engine instance
#[derive(Debug, Clone, Default)]
pub struct EngineSettings {
    pub contribution_table: ContributionTable,
    pub acwr: AcwrConfig,
    pub readiness: ReadinessConfig,
    pub advisor: AdvisorConfig,
    pub micro_cycle: MicroCycleConfig,
}

impl EngineSettings {
    pub fn validate(&self) -> Result<()> {
        self.contribution_table.validate()?;
        self.acwr.validate()?;
        self.readiness.validate()?;
        self.advisor.validate()?;
        self.micro_cycle.validate()?;
        Ok(())
    }
}

/// Full evaluation of one day: exposure, recovery and the resulting advice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyEvaluation {
    pub date: NaiveDate,
    pub acwr: AcwrReport,
    pub readiness: ReadinessReport,
    pub advice: AdvisorRecommendation,
}

/// The SAMC decision engine
pub struct SamcEngine {
    registry: SportRegistry,
    mapper: StressProfileMapper,
    acwr: AcwrCalculator,
    readiness: ReadinessEngine,
    advisor: DailyAdvisor,
    micro_cycle: MicroCycleConfig,
}

impl SamcEngine {
    /// Engine with built-in sports, catalog and default configuration
    pub fn new() -> Self {
        let settings = EngineSettings::default();
        Self::assemble(settings, Box::new(BuiltinCatalog::new()))
    }

    /// Engine with validated custom settings and the built-in catalog
    pub fn with_settings(settings: EngineSettings) -> Result<Self> {
        Self::with_catalog(settings, Box::new(BuiltinCatalog::new()))
    }

    /// Engine with validated custom settings and an external exercise catalog
    pub fn with_catalog(settings: EngineSettings, catalog: Box<dyn ExerciseCatalog>) -> Result<Self> {
        settings.validate()?;
        Ok(Self::assemble(settings, catalog))
    }

    fn assemble(settings: EngineSettings, catalog: Box<dyn ExerciseCatalog>) -> Self {
        info!(
            table = %settings.contribution_table.version,
            acwr_method = ?settings.acwr.method,
            acute_days = settings.acwr.acute_days,
            chronic_days = settings.acwr.chronic_days,
            "Initialized SAMC engine"
        );

        SamcEngine {
            registry: SportRegistry::builtin(),
            mapper: StressProfileMapper::new(settings.contribution_table, catalog),
            acwr: AcwrCalculator::with_config(settings.acwr),
            readiness: ReadinessEngine::with_config(settings.readiness),
            advisor: DailyAdvisor::with_config(settings.advisor),
            micro_cycle: settings.micro_cycle,
        }
    }

    pub fn registry(&self) -> &SportRegistry {
        &self.registry
    }

    pub fn mapper(&self) -> &StressProfileMapper {
        &self.mapper
    }

    pub fn acwr_config(&self) -> &AcwrConfig {
        self.acwr.config()
    }

    pub fn readiness_config(&self) -> &ReadinessConfig {
        self.readiness.config()
    }

    pub fn load_aggregator(&self) -> LoadAggregator<'_> {
        LoadAggregator::new(&self.registry, &self.mapper)
    }

    pub fn compute_session_load(&self, sport_id: &str, payload: &Value) -> Result<LoadVector> {
        self.load_aggregator().compute_session_load(sport_id, payload)
    }

    pub fn compute_session_load_with_modifier(
        &self,
        sport_id: &str,
        payload: &Value,
        intensity_modifier: f64,
    ) -> Result<LoadVector> {
        self.load_aggregator()
            .compute_session_load_with_modifier(sport_id, payload, intensity_modifier)
    }

    pub fn build_session(
        &self,
        timestamp: DateTime<Utc>,
        sport_id: &str,
        payload: &Value,
        intensity_modifier: Option<f64>,
    ) -> Result<TrainingSession> {
        self.load_aggregator()
            .build_session(timestamp, sport_id, payload, intensity_modifier)
    }

    pub fn compute_acwr(&self, history: &[TrainingSession], as_of: NaiveDate) -> AcwrReport {
        self.acwr.calculate(history, as_of)
    }

    pub fn compute_domain_readiness(&self, history: &[TrainingSession], as_of: DateTime<Utc>) -> ReadinessReport {
        self.readiness.calculate(history, as_of)
    }

    pub fn compute_daily_advice(&self, acwr: &AcwrReport, readiness: &ReadinessReport) -> AdvisorRecommendation {
        self.advisor.advise_reports(acwr, readiness)
    }

    pub fn compute_micro_cycle_length(
        &self,
        configs: &[SportConfig],
        min_rest_days: u32,
        override_days: Option<u32>,
    ) -> Result<MicroCycleLength> {
        compute_micro_cycle_length(configs, min_rest_days, override_days)
    }

    /// Size the micro-cycle with the engine's configured rest days and override
    pub fn micro_cycle_for(&self, configs: &[SportConfig]) -> Result<MicroCycleLength> {
        compute_micro_cycle_length(configs, self.micro_cycle.min_rest_days, self.micro_cycle.override_days)
    }

    /// ACWR as of the instant's date, readiness at the instant, and the advice
    pub fn evaluate_day(&self, history: &[TrainingSession], as_of: DateTime<Utc>) -> DailyEvaluation {
        let date = as_of.date_naive();
        let acwr = self.compute_acwr(history, date);
        let readiness = self.compute_domain_readiness(history, as_of);
        let advice = self.compute_daily_advice(&acwr, &readiness);

        DailyEvaluation {
            date,
            acwr,
            readiness,
            advice,
        }
    }

    /// Evaluate many instants in parallel. Results come back in date order,
    /// identical to evaluating each instant sequentially.
    pub fn backtest(&self, history: &[TrainingSession], instants: &[DateTime<Utc>]) -> Vec<DailyEvaluation> {
        let mut ordered = instants.to_vec();
        ordered.sort();

        let evaluations: Vec<DailyEvaluation> = ordered
            .par_iter()
            .map(|instant| self.evaluate_day(history, *instant))
            .collect();

        debug!(days = evaluations.len(), sessions = history.len(), "Backtest complete");
        evaluations
    }

    /// Backtest every day of an inclusive date range at a fixed time of day
    pub fn backtest_range(
        &self,
        history: &[TrainingSession],
        start: NaiveDate,
        end: NaiveDate,
        time_of_day: NaiveTime,
    ) -> Vec<DailyEvaluation> {
        let instants: Vec<DateTime<Utc>> = start
            .iter_days()
            .take_while(|date| *date <= end)
            .map(|date| date.and_time(time_of_day).and_utc())
            .collect();
        self.backtest(history, &instants)
    }
}

impl Default for SamcEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SamcEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SamcEngine")
            .field("registry", &self.registry)
            .field("mapper", &self.mapper)
            .field("acwr", &self.acwr)
            .field("readiness", &self.readiness)
            .field("advisor", &self.advisor)
            .field("micro_cycle", &self.micro_cycle)
            .finish()
    }
}
