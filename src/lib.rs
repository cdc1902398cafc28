// Library interface for the SAMC engine
// The `samc` binary and the integration tests build on these modules

pub mod acwr;
pub mod advisor;
pub mod config;
pub mod engine;
pub mod error;
pub mod exercise;
pub mod load;
pub mod logging;
pub mod micro_cycle;
pub mod models;
pub mod readiness;
pub mod sports;

// Re-export commonly used types for convenience
pub use models::*;
pub use acwr::{AcwrCalculator, AcwrConfig, AcwrMethod, AcwrReport, AcwrStatus, StructuralStatus};
pub use advisor::{AdvisorAction, AdvisorRecommendation, DailyAdvisor, VolumeModifier};
pub use config::SamcConfig;
pub use engine::{DailyEvaluation, EngineSettings, SamcEngine};
pub use error::{Result, SamcError, ValidationError};
pub use exercise::{
    map_stress_profile, ContributionTable, ExerciseCatalog, ExerciseTags, StressProfileMapper,
};
pub use load::LoadAggregator;
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use micro_cycle::{compute_micro_cycle_length, MicroCycleLength};
pub use readiness::{ReadinessEngine, ReadinessReport, ReadinessStatus};
pub use sports::{SportPlugin, SportRegistry};
