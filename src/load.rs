use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::Result;
use crate::exercise::StressProfileMapper;
use crate::models::{Domain, LoadVector, TrainingSession};
use crate::sports::SportRegistry;

/// Intensity multiplier applied when the caller gives none
pub const DEFAULT_INTENSITY_MODIFIER: f64 = 1.0;

/// Per-day load record with the sessions that produced it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLoad {
    /// Calendar day (UTC)
    pub date: NaiveDate,

    /// Element-wise sum of the day's session loads
    pub total: LoadVector,

    /// Number of sessions logged on this day
    pub session_count: u32,
}

/// Turns raw sport payloads into load vectors
pub struct LoadAggregator<'a> {
    registry: &'a SportRegistry,
    mapper: &'a StressProfileMapper,
}

impl<'a> LoadAggregator<'a> {
    pub fn new(registry: &'a SportRegistry, mapper: &'a StressProfileMapper) -> Self {
        LoadAggregator { registry, mapper }
    }

    /// Compute a session load with the default intensity modifier
    pub fn compute_session_load(&self, sport_id: &str, payload: &Value) -> Result<LoadVector> {
        self.compute_session_load_with_modifier(sport_id, payload, DEFAULT_INTENSITY_MODIFIER)
    }

    pub fn compute_session_load_with_modifier(
        &self,
        sport_id: &str,
        payload: &Value,
        intensity_modifier: f64,
    ) -> Result<LoadVector> {
        let plugin = self.registry.get_or_err(sport_id)?;
        let load = plugin.compute_load(payload, intensity_modifier, self.mapper)?;

        tracing::debug!(
            sport = sport_id,
            intensity_modifier,
            metabolic = load.get(Domain::Metabolic),
            neuromuscular = load.get(Domain::Neuromuscular),
            tendon = load.get(Domain::Tendon),
            autonomic = load.get(Domain::Autonomic),
            coordination = load.get(Domain::Coordination),
            "Computed session load"
        );

        Ok(load)
    }

    /// Compute the load once and wrap it into an immutable session record
    pub fn build_session(
        &self,
        timestamp: DateTime<Utc>,
        sport_id: &str,
        payload: &Value,
        intensity_modifier: Option<f64>,
    ) -> Result<TrainingSession> {
        let load = self.compute_session_load_with_modifier(
            sport_id,
            payload,
            intensity_modifier.unwrap_or(DEFAULT_INTENSITY_MODIFIER),
        )?;
        Ok(TrainingSession::new(timestamp, sport_id, load))
    }
}

/// Group sessions by calendar day, summing loads element-wise
pub fn aggregate_daily_loads(sessions: &[TrainingSession]) -> BTreeMap<NaiveDate, DailyLoad> {
    let mut daily: BTreeMap<NaiveDate, DailyLoad> = BTreeMap::new();

    for session in sessions {
        let date = session.date();
        daily
            .entry(date)
            .and_modify(|day| {
                day.total = day.total.add(&session.load);
                day.session_count += 1;
            })
            .or_insert(DailyLoad {
                date,
                total: session.load,
                session_count: 1,
            });
    }

    daily
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SamcError;
    use chrono::TimeZone;
    use serde_json::json;

    fn create_test_session(day: u32, hour: u32, load: f64) -> TrainingSession {
        TrainingSession::new(
            Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap(),
            "weight_lifting",
            LoadVector::new(load, load, load, load, load),
        )
    }

    #[test]
    fn test_daily_load_aggregation() {
        let sessions = vec![
            create_test_session(3, 7, 50.0),
            create_test_session(3, 18, 30.0),
            create_test_session(4, 7, 10.0),
        ];

        let daily = aggregate_daily_loads(&sessions);
        assert_eq!(daily.len(), 2);

        let day = daily.get(&NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()).unwrap();
        assert_eq!(day.total.get(Domain::Tendon), 80.0);
        assert_eq!(day.session_count, 2);
    }

    #[test]
    fn test_session_count_past_u16_range() {
        let sessions = vec![create_test_session(5, 12, 0.0); 70_000];

        let daily = aggregate_daily_loads(&sessions);
        let day = daily.get(&NaiveDate::from_ymd_opt(2025, 3, 5).unwrap()).unwrap();
        assert_eq!(day.session_count, 70_000);
    }

    #[test]
    fn test_unknown_sport() {
        let registry = SportRegistry::builtin();
        let mapper = StressProfileMapper::default();
        let aggregator = LoadAggregator::new(&registry, &mapper);

        let err = aggregator.compute_session_load("rowing", &json!({})).unwrap_err();
        assert!(matches!(err, SamcError::UnknownSport { .. }));
    }

    #[test]
    fn test_build_session_records_load() {
        let registry = SportRegistry::builtin();
        let mapper = StressProfileMapper::default();
        let aggregator = LoadAggregator::new(&registry, &mapper);
        let timestamp = Utc.with_ymd_and_hms(2025, 3, 3, 7, 30, 0).unwrap();

        let session = aggregator
            .build_session(
                timestamp,
                "bicycle_commuting",
                &json!({ "distance_km": 8.0, "duration_min": 30 }),
                Some(2.0),
            )
            .unwrap();
        assert_eq!(session.sport_id, "bicycle_commuting");
        assert_eq!(session.timestamp, timestamp);
        assert!((session.load.get(Domain::Metabolic) - 1.4).abs() < 1e-9);
    }

    #[test]
    fn test_modifier_out_of_range() {
        let registry = SportRegistry::builtin();
        let mapper = StressProfileMapper::default();
        let aggregator = LoadAggregator::new(&registry, &mapper);

        let err = aggregator
            .compute_session_load_with_modifier(
                "bicycle_commuting",
                &json!({ "distance_km": 8.0, "duration_min": 30 }),
                5.0,
            )
            .unwrap_err();
        assert_eq!(err.field(), Some("intensity_modifier"));
    }
}
