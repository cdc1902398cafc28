//! Weight lifting: per-exercise stress profiling
//!
//! Each exercise contributes `stress ⊙ (sets × reps × weight_kg × rpe/10)`,
//! where `stress` comes from the exercise's five tags. The session load is the
//! sum over exercises, scaled by the intensity modifier. There is no reference
//! constant: the ACWR ratio calibrates against the athlete's own history.

use serde::Deserialize;
use serde_json::Value;

use super::{check_range, parse_payload, validate_intensity_modifier, SportPlugin};
use crate::error::{Result, SamcError, ValidationError};
use crate::exercise::{ExerciseIdentity, ExerciseTags, StressProfileMapper};
use crate::models::{LoadVector, StressVector};

/// A single exercise within a weight-lifting session
#[derive(Debug, Clone, Deserialize)]
pub struct WeightLiftingExercise {
    /// Catalog id; mutually exclusive with `exercise_name`
    #[serde(default)]
    pub exercise_id: Option<String>,

    /// Custom exercise name; requires all five tags
    #[serde(default)]
    pub exercise_name: Option<String>,

    #[serde(default)]
    pub movement_type: Option<String>,
    #[serde(default)]
    pub eccentric_load: Option<String>,
    #[serde(default)]
    pub muscle_mass: Option<String>,
    #[serde(default)]
    pub load_intensity: Option<String>,
    #[serde(default)]
    pub complexity: Option<String>,

    pub sets: i64,
    pub reps: i64,
    pub weight_kg: f64,

    /// Per-exercise rate of perceived exertion (1-10)
    pub rpe: f64,
}

impl WeightLiftingExercise {
    fn validate_bounds(&self) -> std::result::Result<(), ValidationError> {
        check_range("sets", self.sets, 1, 20)?;
        check_range("reps", self.reps, 1, 100)?;
        check_range("weight_kg", self.weight_kg, 0.0, 1000.0)?;
        check_range("rpe", self.rpe, 1.0, 10.0)?;
        Ok(())
    }

    /// Resolve which identification path the caller used
    pub fn identity(&self) -> std::result::Result<ExerciseIdentity<'_>, ValidationError> {
        let id = non_blank(&self.exercise_id);
        let name = non_blank(&self.exercise_name);

        match (id, name) {
            (Some(_), Some(_)) => Err(ValidationError::new(
                "exercise_id",
                "provide either exercise_id (catalog) or exercise_name (custom), not both",
            )),
            (None, None) => Err(ValidationError::new(
                "exercise_id",
                "provide exercise_id (catalog lookup) or exercise_name with all 5 category tags",
            )),
            (Some(id), None) => Ok(ExerciseIdentity::Catalog(id)),
            (None, Some(name)) => {
                let missing: Vec<&str> = [
                    ("movement_type", &self.movement_type),
                    ("eccentric_load", &self.eccentric_load),
                    ("muscle_mass", &self.muscle_mass),
                    ("load_intensity", &self.load_intensity),
                    ("complexity", &self.complexity),
                ]
                .iter()
                .filter(|(_, value)| value.is_none())
                .map(|(field, _)| *field)
                .collect();

                if let Some(first) = missing.first() {
                    return Err(ValidationError::new(
                        *first,
                        format!(
                            "custom exercise requires all 5 category tags, missing: {}",
                            missing.join(", ")
                        ),
                    ));
                }

                let tags = ExerciseTags::parse(
                    self.movement_type.as_deref().unwrap_or_default(),
                    self.eccentric_load.as_deref().unwrap_or_default(),
                    self.muscle_mass.as_deref().unwrap_or_default(),
                    self.load_intensity.as_deref().unwrap_or_default(),
                    self.complexity.as_deref().unwrap_or_default(),
                )?;
                Ok(ExerciseIdentity::Inline { name, tags })
            }
        }
    }

    /// Total mass moved: sets × reps × weight
    pub fn tonnage(&self) -> f64 {
        self.sets as f64 * self.reps as f64 * self.weight_kg
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Sport-specific session data for weight lifting
#[derive(Debug, Clone, Deserialize)]
pub struct WeightLiftingSession {
    pub exercises: Vec<WeightLiftingExercise>,

    /// Overall session RPE; informational only
    #[serde(default)]
    pub session_rpe: Option<f64>,
}

impl WeightLiftingSession {
    fn validate(&self) -> Result<()> {
        if self.exercises.is_empty() {
            return Err(SamcError::validation("exercises", "at least one exercise is required"));
        }
        if let Some(session_rpe) = self.session_rpe {
            check_range("session_rpe", session_rpe, 1.0, 10.0)?;
        }
        for (index, exercise) in self.exercises.iter().enumerate() {
            let path = format!("exercises[{}]", index);
            exercise.validate_bounds().map_err(|e| e.within(&path))?;
            exercise.identity().map_err(|e| e.within(&path))?;
        }
        Ok(())
    }
}

/// Weight lifting sport capability
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightLifting;

impl SportPlugin for WeightLifting {
    fn sport_id(&self) -> &'static str {
        "weight_lifting"
    }

    fn display_name(&self) -> &'static str {
        "Weight Lifting"
    }

    fn default_stress_profile(&self) -> StressVector {
        StressVector::new(0.3, 0.9, 0.8, 0.5, 0.3)
    }

    fn validate_payload(&self, payload: &Value) -> Result<()> {
        let session: WeightLiftingSession = parse_payload(payload)?;
        session.validate()
    }

    fn compute_load(
        &self,
        payload: &Value,
        intensity_modifier: f64,
        mapper: &StressProfileMapper,
    ) -> Result<LoadVector> {
        validate_intensity_modifier(intensity_modifier)?;
        let session: WeightLiftingSession = parse_payload(payload)?;
        session.validate()?;

        let mut session_load = LoadVector::zero();
        for (index, exercise) in session.exercises.iter().enumerate() {
            let path = format!("exercises[{}]", index);
            let identity = exercise.identity().map_err(|e| e.within(&path))?;
            let stress = mapper.profile_for(&identity).map_err(|e| e.within(&path))?;

            let tonnage = exercise.tonnage();
            let rpe_factor = exercise.rpe / 10.0;
            let exercise_load = stress.scaled_unclamped(tonnage * rpe_factor);

            tracing::trace!(
                exercise = index,
                tonnage,
                rpe_factor,
                ?exercise_load,
                "Exercise load"
            );
            session_load = session_load.add(&exercise_load);
        }

        Ok(session_load.scaled(intensity_modifier))
    }

    fn recovery_days_hint(&self) -> u32 {
        2
    }

    fn sessions_per_cycle_default(&self) -> u32 {
        2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Domain;
    use serde_json::json;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6
    }

    fn back_squat_payload() -> Value {
        json!({
            "exercises": [
                { "exercise_id": "back_squat", "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0 }
            ]
        })
    }

    #[test]
    fn test_back_squat_session_load() {
        let mapper = StressProfileMapper::default();
        let load = WeightLifting.compute_load(&back_squat_payload(), 1.0, &mapper).unwrap();
        assert!(approx(load.get(Domain::Metabolic), 900.0));
        assert!(approx(load.get(Domain::Neuromuscular), 1140.0));
        assert!(approx(load.get(Domain::Tendon), 1020.0));
        assert!(approx(load.get(Domain::Autonomic), 960.0));
        assert!(approx(load.get(Domain::Coordination), 360.0));
    }

    #[test]
    fn test_inline_exercise_matches_catalog() {
        let mapper = StressProfileMapper::default();
        let inline = json!({
            "exercises": [{
                "exercise_name": "Back Squat (custom)",
                "movement_type": "compound",
                "eccentric_load": "high",
                "muscle_mass": "large",
                "load_intensity": "heavy",
                "complexity": "medium",
                "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0
            }]
        });
        let a = WeightLifting.compute_load(&inline, 1.0, &mapper).unwrap();
        let b = WeightLifting.compute_load(&back_squat_payload(), 1.0, &mapper).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_exercise_loads_are_summed_and_modified() {
        let mapper = StressProfileMapper::default();
        let payload = json!({
            "exercises": [
                { "exercise_id": "back_squat", "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0 },
                { "exercise_id": "back_squat", "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0 }
            ],
            "session_rpe": 7.0
        });
        let load = WeightLifting.compute_load(&payload, 1.5, &mapper).unwrap();
        assert!(approx(load.get(Domain::Neuromuscular), 1140.0 * 2.0 * 1.5));
    }

    #[test]
    fn test_zero_weight_gives_zero_load() {
        let mapper = StressProfileMapper::default();
        let payload = json!({
            "exercises": [{ "exercise_id": "pull_up", "sets": 3, "reps": 8, "weight_kg": 0.0, "rpe": 7.0 }]
        });
        assert!(WeightLifting.compute_load(&payload, 1.0, &mapper).unwrap().is_zero());
    }

    #[test]
    fn test_bounds_name_the_field() {
        let payload = json!({
            "exercises": [
                { "exercise_id": "back_squat", "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0 },
                { "exercise_id": "deadlift", "sets": 21, "reps": 5, "weight_kg": 100.0, "rpe": 8.0 }
            ]
        });
        let err = WeightLifting.validate_payload(&payload).unwrap_err();
        assert_eq!(err.field(), Some("exercises[1].sets"));
    }

    #[test]
    fn test_both_or_neither_identity_rejected() {
        let both = json!({
            "exercises": [{ "exercise_id": "back_squat", "exercise_name": "x", "sets": 1, "reps": 1, "weight_kg": 1.0, "rpe": 5.0 }]
        });
        assert!(WeightLifting.validate_payload(&both).is_err());

        let neither = json!({
            "exercises": [{ "sets": 1, "reps": 1, "weight_kg": 1.0, "rpe": 5.0 }]
        });
        assert!(WeightLifting.validate_payload(&neither).is_err());
    }

    #[test]
    fn test_invalid_tag_names_field() {
        let payload = json!({
            "exercises": [{
                "exercise_name": "Mystery Lift",
                "movement_type": "compound",
                "eccentric_load": "extreme",
                "muscle_mass": "large",
                "load_intensity": "heavy",
                "complexity": "medium",
                "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0
            }]
        });
        let err = WeightLifting.validate_payload(&payload).unwrap_err();
        assert_eq!(err.field(), Some("exercises[0].eccentric_load"));
    }

    #[test]
    fn test_missing_tag_rejected() {
        let payload = json!({
            "exercises": [{
                "exercise_name": "Mystery Lift",
                "movement_type": "compound",
                "sets": 3, "reps": 5, "weight_kg": 100.0, "rpe": 8.0
            }]
        });
        let err = WeightLifting.validate_payload(&payload).unwrap_err();
        assert_eq!(err.field(), Some("exercises[0].eccentric_load"));
    }

    #[test]
    fn test_unknown_catalog_id() {
        let mapper = StressProfileMapper::default();
        let payload = json!({
            "exercises": [{ "exercise_id": "nordic_curl", "sets": 3, "reps": 5, "weight_kg": 0.0, "rpe": 8.0 }]
        });
        let err = WeightLifting.compute_load(&payload, 1.0, &mapper).unwrap_err();
        assert_eq!(err.field(), Some("exercises[0].exercise_id"));
        assert!(err.to_string().contains("back_squat"));
    }

    #[test]
    fn test_empty_session_and_bad_session_rpe() {
        assert!(WeightLifting.validate_payload(&json!({ "exercises": [] })).is_err());

        let mut payload = back_squat_payload();
        payload["session_rpe"] = json!(11.0);
        let err = WeightLifting.validate_payload(&payload).unwrap_err();
        assert_eq!(err.field(), Some("session_rpe"));
    }
}
