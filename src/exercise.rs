//! Exercise stress profiling
//!
//! Each exercise is described by five categorical tags. A deterministic
//! mapping turns the tags into a [`StressVector`] through a plain additive
//! lookup table: per domain, a base value plus one contribution for each tag
//! value, clamped to [0, 1].
//!
//! | Tag | Drives |
//! |-----|--------|
//! | movement type | neuromuscular recruitment (N), systemic cost (A) |
//! | eccentric load | tendon stress (T), eccentric share of N |
//! | muscle mass | metabolic demand (M), recovery cost (A) |
//! | load intensity | CNS intensity (N), systemic depletion (A) |
//! | complexity | coordination demand (C) |
//!
//! The coefficients are heuristics, not measured constants. They live in a
//! versioned [`ContributionTable`] that can be replaced from a TOML file
//! without touching the code.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SamcError, ValidationError};
use crate::models::{Domain, PerDomain, StressVector};

macro_rules! exercise_tag {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    _ => Err(format!(
                        "unknown value '{}' (expected one of: {})",
                        s,
                        [$($text),+].join(", ")
                    )),
                }
            }
        }
    };
}

exercise_tag!(
    /// Multi-joint (compound) or single-joint (isolation)
    MovementType { Compound => "compound", Isolation => "isolation" }
);

exercise_tag!(
    /// Magnitude of the eccentric (lengthening) component
    EccentricLoad { High => "high", Medium => "medium", Low => "low" }
);

exercise_tag!(
    /// Share of total musculature involved: large >40%, medium 15-40%, small <15%
    MuscleMass { Large => "large", Medium => "medium", Small => "small" }
);

exercise_tag!(
    /// Typical loading intensity; RPE modulates magnitude, not shape
    LoadIntensity { Heavy => "heavy", Moderate => "moderate", Light => "light" }
);

exercise_tag!(
    /// Motor-learning / coordination complexity
    Complexity { High => "high", Medium => "medium", Low => "low" }
);

/// The five categorical tags of an exercise
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExerciseTags {
    pub movement_type: MovementType,
    pub eccentric_load: EccentricLoad,
    pub muscle_mass: MuscleMass,
    pub load_intensity: LoadIntensity,
    pub complexity: Complexity,
}

impl ExerciseTags {
    pub fn new(
        movement_type: MovementType,
        eccentric_load: EccentricLoad,
        muscle_mass: MuscleMass,
        load_intensity: LoadIntensity,
        complexity: Complexity,
    ) -> Self {
        Self {
            movement_type,
            eccentric_load,
            muscle_mass,
            load_intensity,
            complexity,
        }
    }

    /// Parse the five tags from raw strings, naming the first offending tag
    pub fn parse(
        movement_type: &str,
        eccentric_load: &str,
        muscle_mass: &str,
        load_intensity: &str,
        complexity: &str,
    ) -> std::result::Result<Self, ValidationError> {
        Ok(Self {
            movement_type: parse_tag("movement_type", movement_type)?,
            eccentric_load: parse_tag("eccentric_load", eccentric_load)?,
            muscle_mass: parse_tag("muscle_mass", muscle_mass)?,
            load_intensity: parse_tag("load_intensity", load_intensity)?,
            complexity: parse_tag("complexity", complexity)?,
        })
    }

    /// Every legal tag combination (2 × 3 × 3 × 3 × 3 = 162)
    pub fn all_combinations() -> Vec<ExerciseTags> {
        let mut combos = Vec::with_capacity(162);
        for &mt in MovementType::ALL {
            for &el in EccentricLoad::ALL {
                for &mm in MuscleMass::ALL {
                    for &li in LoadIntensity::ALL {
                        for &cx in Complexity::ALL {
                            combos.push(ExerciseTags::new(mt, el, mm, li, cx));
                        }
                    }
                }
            }
        }
        combos
    }
}

fn parse_tag<T: FromStr<Err = String>>(
    field: &str,
    raw: &str,
) -> std::result::Result<T, ValidationError> {
    raw.parse().map_err(|reason| ValidationError::new(field, reason))
}

/// Catalog entry describing a single exercise and its 5 tags
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExerciseProfile {
    /// Unique slug, e.g. `back_squat`
    pub exercise_id: String,

    pub display_name: String,

    #[serde(flatten)]
    pub tags: ExerciseTags,

    /// Informational list of primary muscles targeted
    #[serde(default)]
    pub primary_muscles: Vec<String>,

    /// Movement category, e.g. `lower_body`, `upper_push`
    #[serde(default)]
    pub category: String,
}

/// Additive contributions for one domain
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DomainContributions {
    pub base: f64,
    #[serde(default)]
    pub movement_type: BTreeMap<MovementType, f64>,
    #[serde(default)]
    pub eccentric_load: BTreeMap<EccentricLoad, f64>,
    #[serde(default)]
    pub muscle_mass: BTreeMap<MuscleMass, f64>,
    #[serde(default)]
    pub load_intensity: BTreeMap<LoadIntensity, f64>,
    #[serde(default)]
    pub complexity: BTreeMap<Complexity, f64>,
}

impl DomainContributions {
    /// Base plus contributions, before clamping. Tag values absent from a
    /// table contribute nothing.
    pub fn raw_value(&self, tags: &ExerciseTags) -> f64 {
        self.base
            + self.movement_type.get(&tags.movement_type).copied().unwrap_or(0.0)
            + self.eccentric_load.get(&tags.eccentric_load).copied().unwrap_or(0.0)
            + self.muscle_mass.get(&tags.muscle_mass).copied().unwrap_or(0.0)
            + self.load_intensity.get(&tags.load_intensity).copied().unwrap_or(0.0)
            + self.complexity.get(&tags.complexity).copied().unwrap_or(0.0)
    }

    fn coefficients(&self) -> impl Iterator<Item = f64> + '_ {
        std::iter::once(self.base)
            .chain(self.movement_type.values().copied())
            .chain(self.eccentric_load.values().copied())
            .chain(self.muscle_mass.values().copied())
            .chain(self.load_intensity.values().copied())
            .chain(self.complexity.values().copied())
    }
}

/// Versioned tag → domain contribution table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContributionTable {
    /// Identifies the coefficient set, recorded next to computed loads
    pub version: String,

    pub domains: PerDomain<DomainContributions>,
}

/// Version identifier of the built-in coefficients
pub const DEFAULT_TABLE_VERSION: &str = "samc-v1";

impl Default for ContributionTable {
    fn default() -> Self {
        use Complexity as Cx;
        use EccentricLoad as El;
        use LoadIntensity as Li;
        use MovementType as Mt;
        use MuscleMass as Mm;

        let metabolic = DomainContributions {
            base: 0.10,
            muscle_mass: BTreeMap::from([(Mm::Large, 0.50), (Mm::Medium, 0.25), (Mm::Small, 0.05)]),
            movement_type: BTreeMap::from([(Mt::Compound, 0.10), (Mt::Isolation, 0.0)]),
            load_intensity: BTreeMap::from([(Li::Heavy, 0.05), (Li::Moderate, 0.10), (Li::Light, 0.05)]),
            ..Default::default()
        };
        let neuromuscular = DomainContributions {
            base: 0.20,
            movement_type: BTreeMap::from([(Mt::Compound, 0.25), (Mt::Isolation, 0.05)]),
            load_intensity: BTreeMap::from([(Li::Heavy, 0.35), (Li::Moderate, 0.15), (Li::Light, 0.05)]),
            eccentric_load: BTreeMap::from([(El::High, 0.15), (El::Medium, 0.05), (El::Low, 0.0)]),
            ..Default::default()
        };
        let tendon = DomainContributions {
            base: 0.15,
            eccentric_load: BTreeMap::from([(El::High, 0.40), (El::Medium, 0.15), (El::Low, 0.05)]),
            load_intensity: BTreeMap::from([(Li::Heavy, 0.25), (Li::Moderate, 0.10), (Li::Light, 0.0)]),
            movement_type: BTreeMap::from([(Mt::Compound, 0.05), (Mt::Isolation, 0.0)]),
            ..Default::default()
        };
        let autonomic = DomainContributions {
            base: 0.10,
            movement_type: BTreeMap::from([(Mt::Compound, 0.20), (Mt::Isolation, 0.05)]),
            muscle_mass: BTreeMap::from([(Mm::Large, 0.30), (Mm::Medium, 0.15), (Mm::Small, 0.05)]),
            load_intensity: BTreeMap::from([(Li::Heavy, 0.20), (Li::Moderate, 0.10), (Li::Light, 0.05)]),
            ..Default::default()
        };
        let coordination = DomainContributions {
            base: 0.05,
            complexity: BTreeMap::from([(Cx::High, 0.70), (Cx::Medium, 0.25), (Cx::Low, 0.05)]),
            ..Default::default()
        };

        ContributionTable {
            version: DEFAULT_TABLE_VERSION.to_string(),
            domains: PerDomain::new(metabolic, neuromuscular, tendon, autonomic, coordination),
        }
    }
}

impl ContributionTable {
    /// Parse a table from its TOML representation and validate it
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let table: ContributionTable = toml::from_str(content)
            .map_err(|e| SamcError::Configuration(format!("invalid contribution table: {}", e)))?;
        table.validate()?;
        Ok(table)
    }

    pub fn validate(&self) -> Result<()> {
        if self.version.trim().is_empty() {
            return Err(SamcError::Configuration(
                "contribution table version must not be empty".to_string(),
            ));
        }
        for (domain, contributions) in self.domains.iter() {
            if contributions.coefficients().any(|c| !c.is_finite()) {
                return Err(SamcError::Configuration(format!(
                    "contribution table '{}' has a non-finite coefficient for {}",
                    self.version, domain
                )));
            }
        }
        Ok(())
    }

    /// Map five tags to a clamped stress vector. Pure and total.
    pub fn map(&self, tags: &ExerciseTags) -> StressVector {
        StressVector::from_fn(|domain| self.domains[domain].raw_value(tags))
    }
}

/// Read access to exercise definitions keyed by catalog id
pub trait ExerciseCatalog: Send + Sync {
    fn lookup(&self, exercise_id: &str) -> Option<&ExerciseProfile>;

    /// Sorted catalog ids, used in error messages
    fn ids(&self) -> Vec<&str>;
}

/// The exercises shipped with SAMC
#[derive(Debug, Clone)]
pub struct BuiltinCatalog {
    exercises: BTreeMap<String, ExerciseProfile>,
}

impl BuiltinCatalog {
    pub fn new() -> Self {
        use Complexity as Cx;
        use EccentricLoad as El;
        use LoadIntensity as Li;
        use MovementType::{Compound as C, Isolation as I};
        use MuscleMass as Mm;

        #[rustfmt::skip]
        let entries: &[(&str, &str, MovementType, EccentricLoad, MuscleMass, LoadIntensity, Complexity, &[&str], &str)] = &[
            ("back_squat", "Back Squat", C, El::High, Mm::Large, Li::Heavy, Cx::Medium, &["quadriceps", "glutes", "hamstrings", "core"], "lower_body"),
            ("front_squat", "Front Squat", C, El::High, Mm::Large, Li::Heavy, Cx::High, &["quadriceps", "glutes", "core", "upper_back"], "lower_body"),
            ("deadlift", "Deadlift", C, El::Medium, Mm::Large, Li::Heavy, Cx::Medium, &["hamstrings", "glutes", "erectors", "traps"], "lower_body"),
            ("romanian_deadlift", "Romanian Deadlift", C, El::High, Mm::Large, Li::Moderate, Cx::Medium, &["hamstrings", "glutes", "erectors"], "lower_body"),
            ("leg_press", "Leg Press", C, El::Medium, Mm::Large, Li::Heavy, Cx::Low, &["quadriceps", "glutes"], "lower_body"),
            ("bulgarian_split_squat", "Bulgarian Split Squat", C, El::High, Mm::Medium, Li::Moderate, Cx::Medium, &["quadriceps", "glutes", "hip_stabilisers"], "lower_body"),
            ("leg_extension", "Leg Extension", I, El::Medium, Mm::Medium, Li::Moderate, Cx::Low, &["quadriceps"], "lower_body"),
            ("leg_curl", "Leg Curl", I, El::High, Mm::Medium, Li::Moderate, Cx::Low, &["hamstrings"], "lower_body"),
            ("hip_thrust", "Hip Thrust", C, El::Low, Mm::Large, Li::Moderate, Cx::Low, &["glutes", "hamstrings"], "lower_body"),
            ("zercher_squat", "Barbell Zercher Squat", C, El::High, Mm::Large, Li::Heavy, Cx::High, &["quadriceps", "glutes", "core", "biceps"], "lower_body"),
            ("bench_press", "Bench Press", C, El::Medium, Mm::Medium, Li::Heavy, Cx::Low, &["pectorals", "anterior_deltoids", "triceps"], "upper_push"),
            ("overhead_press", "Overhead Press", C, El::Medium, Mm::Medium, Li::Heavy, Cx::Medium, &["deltoids", "triceps", "core"], "upper_push"),
            ("incline_db_press", "Incline Dumbbell Press", C, El::Medium, Mm::Medium, Li::Moderate, Cx::Low, &["upper_pectorals", "anterior_deltoids", "triceps"], "upper_push"),
            ("dip", "Dip", C, El::Medium, Mm::Medium, Li::Moderate, Cx::Low, &["pectorals", "triceps", "anterior_deltoids"], "upper_push"),
            ("lateral_raise", "Lateral Raise", I, El::Low, Mm::Small, Li::Light, Cx::Low, &["lateral_deltoids"], "upper_push"),
            ("tricep_pushdown", "Tricep Pushdown", I, El::Low, Mm::Small, Li::Moderate, Cx::Low, &["triceps"], "upper_push"),
            ("barbell_row", "Barbell Row", C, El::Medium, Mm::Medium, Li::Heavy, Cx::Medium, &["lats", "rhomboids", "rear_deltoids", "biceps"], "upper_pull"),
            ("pull_up", "Pull-Up", C, El::Medium, Mm::Medium, Li::Moderate, Cx::Medium, &["lats", "biceps", "rear_deltoids"], "upper_pull"),
            ("lat_pulldown", "Lat Pulldown", C, El::Low, Mm::Medium, Li::Moderate, Cx::Low, &["lats", "biceps"], "upper_pull"),
            ("bicep_curl", "Bicep Curl", I, El::Medium, Mm::Small, Li::Moderate, Cx::Low, &["biceps", "brachialis"], "upper_pull"),
            ("face_pull", "Face Pull", I, El::Low, Mm::Small, Li::Light, Cx::Low, &["rear_deltoids", "rotator_cuff"], "upper_pull"),
            ("weighted_chin_up", "Weighted Chin-Up", C, El::Medium, Mm::Medium, Li::Moderate, Cx::Medium, &["biceps", "lats", "brachialis"], "upper_pull"),
            ("plate_loaded_row_machine", "Plate Loaded Row Machine", C, El::Low, Mm::Medium, Li::Moderate, Cx::Low, &["lats", "rhomboids", "biceps"], "upper_pull"),
            ("cable_pallof_press", "Cable Pallof Press Hold", I, El::Low, Mm::Small, Li::Light, Cx::Low, &["obliques", "transverse_abdominis"], "core"),
            ("weighted_dead_bug", "Weighted Dead Bug", I, El::Low, Mm::Small, Li::Light, Cx::Medium, &["rectus_abdominis", "transverse_abdominis"], "core"),
            ("farmers_carry", "Farmer's Carry", C, El::Low, Mm::Large, Li::Moderate, Cx::Low, &["forearms", "traps", "core", "glutes"], "carry"),
            ("power_clean", "Power Clean", C, El::Low, Mm::Large, Li::Heavy, Cx::High, &["hamstrings", "glutes", "traps", "quadriceps"], "olympic"),
            ("clean_and_jerk", "Clean & Jerk", C, El::Low, Mm::Large, Li::Heavy, Cx::High, &["full_body"], "olympic"),
        ];

        let exercises = entries
            .iter()
            .map(|&(id, name, mt, el, mm, li, cx, muscles, category)| {
                let profile = ExerciseProfile {
                    exercise_id: id.to_string(),
                    display_name: name.to_string(),
                    tags: ExerciseTags::new(mt, el, mm, li, cx),
                    primary_muscles: muscles.iter().map(|m| m.to_string()).collect(),
                    category: category.to_string(),
                };
                (id.to_string(), profile)
            })
            .collect();

        BuiltinCatalog { exercises }
    }

    pub fn len(&self) -> usize {
        self.exercises.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exercises.is_empty()
    }
}

impl Default for BuiltinCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl ExerciseCatalog for BuiltinCatalog {
    fn lookup(&self, exercise_id: &str) -> Option<&ExerciseProfile> {
        self.exercises.get(exercise_id)
    }

    fn ids(&self) -> Vec<&str> {
        self.exercises.keys().map(String::as_str).collect()
    }
}

/// How the caller identified an exercise in a session payload
#[derive(Debug, Clone, PartialEq)]
pub enum ExerciseIdentity<'a> {
    /// Catalog id; tags come from the catalog
    Catalog(&'a str),
    /// Unlisted exercise with all five tags supplied inline
    Inline { name: &'a str, tags: ExerciseTags },
}

/// Contribution table plus catalog: everything needed to turn an exercise
/// reference into a stress profile
pub struct StressProfileMapper {
    table: ContributionTable,
    catalog: Box<dyn ExerciseCatalog>,
}

impl StressProfileMapper {
    pub fn new(table: ContributionTable, catalog: Box<dyn ExerciseCatalog>) -> Self {
        Self { table, catalog }
    }

    pub fn table(&self) -> &ContributionTable {
        &self.table
    }

    pub fn catalog(&self) -> &dyn ExerciseCatalog {
        self.catalog.as_ref()
    }

    pub fn map(&self, tags: &ExerciseTags) -> StressVector {
        self.table.map(tags)
    }

    /// Resolve an exercise reference to its canonical tags
    pub fn resolve(&self, identity: &ExerciseIdentity<'_>) -> std::result::Result<ExerciseTags, ValidationError> {
        match identity {
            ExerciseIdentity::Catalog(id) => self
                .catalog
                .lookup(id)
                .map(|profile| profile.tags)
                .ok_or_else(|| {
                    ValidationError::new(
                        "exercise_id",
                        format!(
                            "unknown exercise '{}' (available: {})",
                            id,
                            self.catalog.ids().join(", ")
                        ),
                    )
                }),
            ExerciseIdentity::Inline { tags, .. } => Ok(*tags),
        }
    }

    /// Stress profile for a catalog or inline exercise
    pub fn profile_for(&self, identity: &ExerciseIdentity<'_>) -> std::result::Result<StressVector, ValidationError> {
        let tags = self.resolve(identity)?;
        let stress = self.map(&tags);
        tracing::trace!(
            table = %self.table.version,
            ?tags,
            ?stress,
            "Resolved exercise stress profile"
        );
        Ok(stress)
    }
}

impl Default for StressProfileMapper {
    fn default() -> Self {
        Self::new(ContributionTable::default(), Box::new(BuiltinCatalog::new()))
    }
}

impl fmt::Debug for StressProfileMapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StressProfileMapper")
            .field("table_version", &self.table.version)
            .field("catalog_size", &self.catalog.ids().len())
            .finish()
    }
}

/// Map five tags with the built-in coefficient table
pub fn map_stress_profile(tags: &ExerciseTags) -> StressVector {
    ContributionTable::default().map(tags)
}
