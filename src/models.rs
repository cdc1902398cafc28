use chrono::{DateTime, NaiveDate, Utc};
use serde::{ser::SerializeMap, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::ops::{Index, IndexMut};
use std::str::FromStr;

/// Number of physiological domains tracked by SAMC
pub const DOMAIN_COUNT: usize = 5;

/// Physiological domains a training session can stress
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    /// Cardiovascular / energy system stress (M)
    Metabolic,
    /// CNS / motor unit recruitment stress (N)
    Neuromuscular,
    /// Tendon and connective tissue stress (T)
    Tendon,
    /// Autonomic nervous system stress / recovery cost (A)
    Autonomic,
    /// Motor learning / skill coordination stress (C)
    Coordination,
}

/// How much abuse a domain tolerates before it needs protection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToleranceClass {
    High,
    LowStructural,
    MediumModulator,
}

impl Domain {
    /// Canonical domain order, shared by every per-domain container
    pub const ALL: [Domain; DOMAIN_COUNT] = [
        Domain::Metabolic,
        Domain::Neuromuscular,
        Domain::Tendon,
        Domain::Autonomic,
        Domain::Coordination,
    ];

    /// The two low-tolerance domains that can veto the aggregate status
    pub const STRUCTURAL: [Domain; 2] = [Domain::Neuromuscular, Domain::Tendon];

    /// The high-tolerance and modulator domains
    pub const NON_STRUCTURAL: [Domain; 3] =
        [Domain::Metabolic, Domain::Autonomic, Domain::Coordination];

    pub fn index(self) -> usize {
        match self {
            Domain::Metabolic => 0,
            Domain::Neuromuscular => 1,
            Domain::Tendon => 2,
            Domain::Autonomic => 3,
            Domain::Coordination => 4,
        }
    }

    pub fn tolerance(self) -> ToleranceClass {
        match self {
            Domain::Metabolic | Domain::Coordination => ToleranceClass::High,
            Domain::Neuromuscular | Domain::Tendon => ToleranceClass::LowStructural,
            Domain::Autonomic => ToleranceClass::MediumModulator,
        }
    }

    pub fn is_structural(self) -> bool {
        self.tolerance() == ToleranceClass::LowStructural
    }

    /// Single-letter code (M, N, T, A, C)
    pub fn code(self) -> char {
        match self {
            Domain::Metabolic => 'M',
            Domain::Neuromuscular => 'N',
            Domain::Tendon => 'T',
            Domain::Autonomic => 'A',
            Domain::Coordination => 'C',
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Domain::Metabolic => "metabolic",
            Domain::Neuromuscular => "neuromuscular",
            Domain::Tendon => "tendon",
            Domain::Autonomic => "autonomic",
            Domain::Coordination => "coordination",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "metabolic" | "m" => Ok(Domain::Metabolic),
            "neuromuscular" | "n" => Ok(Domain::Neuromuscular),
            "tendon" | "t" => Ok(Domain::Tendon),
            "autonomic" | "a" => Ok(Domain::Autonomic),
            "coordination" | "c" => Ok(Domain::Coordination),
            _ => Err(format!("Invalid domain: {}", s)),
        }
    }
}

/// Fixed-size container holding one value per domain
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PerDomain<T>([T; DOMAIN_COUNT]);

impl<T> PerDomain<T> {
    pub fn new(
        metabolic: T,
        neuromuscular: T,
        tendon: T,
        autonomic: T,
        coordination: T,
    ) -> Self {
        PerDomain([metabolic, neuromuscular, tendon, autonomic, coordination])
    }

    /// Build by evaluating `f` once per domain, in canonical order
    pub fn from_fn(mut f: impl FnMut(Domain) -> T) -> Self {
        PerDomain(Domain::ALL.map(&mut f))
    }

    /// Apply `f` to every value, keeping the domain association
    pub fn map<U>(&self, mut f: impl FnMut(Domain, &T) -> U) -> PerDomain<U> {
        PerDomain::from_fn(|domain| f(domain, &self.0[domain.index()]))
    }

    /// Iterate `(domain, value)` pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (Domain, &T)> {
        Domain::ALL.into_iter().zip(self.0.iter())
    }

    pub fn values(&self) -> &[T; DOMAIN_COUNT] {
        &self.0
    }
}

impl<T> Index<Domain> for PerDomain<T> {
    type Output = T;

    fn index(&self, domain: Domain) -> &T {
        &self.0[domain.index()]
    }
}

impl<T> IndexMut<Domain> for PerDomain<T> {
    fn index_mut(&mut self, domain: Domain) -> &mut T {
        &mut self.0[domain.index()]
    }
}

impl<T: Serialize> Serialize for PerDomain<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(DOMAIN_COUNT))?;
        for (domain, value) in self.iter() {
            map.serialize_entry(domain.name(), value)?;
        }
        map.end()
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct NamedDomains<T> {
    metabolic: T,
    neuromuscular: T,
    tendon: T,
    autonomic: T,
    coordination: T,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for PerDomain<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let named = NamedDomains::<T>::deserialize(deserializer)?;
        Ok(PerDomain::new(
            named.metabolic,
            named.neuromuscular,
            named.tendon,
            named.autonomic,
            named.coordination,
        ))
    }
}

fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

/// Ratios and readiness are reported and bucketed at three decimals
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}

/// Relative shape of the physiological demand of an activity.
///
/// Every component is clamped to [0, 1] on construction, so the invariant
/// holds no matter what the caller passes in.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct StressVector(PerDomain<f64>);

impl StressVector {
    pub fn new(metabolic: f64, neuromuscular: f64, tendon: f64, autonomic: f64, coordination: f64) -> Self {
        Self::from_fn(|domain| {
            [metabolic, neuromuscular, tendon, autonomic, coordination][domain.index()]
        })
    }

    pub fn from_fn(mut f: impl FnMut(Domain) -> f64) -> Self {
        StressVector(PerDomain::from_fn(|domain| clamp_unit(f(domain))))
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: Domain) -> f64 {
        self.0[domain]
    }

    /// Elementwise scale into an absolute load; the result may exceed 1.0
    pub fn scaled_unclamped(&self, factor: f64) -> LoadVector {
        LoadVector::from_fn(|domain| self.0[domain] * factor)
    }

    /// Domain with the highest demand (first in canonical order on ties)
    pub fn max_component(&self) -> (Domain, f64) {
        self.0
            .iter()
            .fold((Domain::Metabolic, f64::MIN), |best, (domain, &value)| {
                if value > best.1 {
                    (domain, value)
                } else {
                    best
                }
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, f64)> + '_ {
        self.0.iter().map(|(domain, value)| (domain, *value))
    }
}

impl<'de> Deserialize<'de> for StressVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = PerDomain::<f64>::deserialize(deserializer)?;
        Ok(StressVector::from_fn(|domain| values[domain]))
    }
}

/// Absolute physiological load accumulated by one session (or a window).
///
/// Components are never negative. Values are only comparable over time within
/// the same domain; they are never summed across domains.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct LoadVector(PerDomain<f64>);

impl LoadVector {
    pub fn new(metabolic: f64, neuromuscular: f64, tendon: f64, autonomic: f64, coordination: f64) -> Self {
        Self::from_fn(|domain| {
            [metabolic, neuromuscular, tendon, autonomic, coordination][domain.index()]
        })
    }

    pub fn from_fn(mut f: impl FnMut(Domain) -> f64) -> Self {
        LoadVector(PerDomain::from_fn(|domain| non_negative(f(domain))))
    }

    pub fn zero() -> Self {
        Self::default()
    }

    pub fn get(&self, domain: Domain) -> f64 {
        self.0[domain]
    }

    /// Element-wise addition (for daily/window accumulation)
    pub fn add(&self, other: &LoadVector) -> LoadVector {
        LoadVector::from_fn(|domain| self.0[domain] + other.0[domain])
    }

    pub fn scaled(&self, factor: f64) -> LoadVector {
        LoadVector::from_fn(|domain| self.0[domain] * factor)
    }

    pub fn is_zero(&self) -> bool {
        self.0.values().iter().all(|&value| value == 0.0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (Domain, f64)> + '_ {
        self.0.iter().map(|(domain, value)| (domain, *value))
    }
}

impl std::iter::Sum for LoadVector {
    fn sum<I: Iterator<Item = LoadVector>>(iter: I) -> Self {
        iter.fold(LoadVector::zero(), |acc, load| acc.add(&load))
    }
}

impl<'de> Deserialize<'de> for LoadVector {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = PerDomain::<f64>::deserialize(deserializer)?;
        Ok(LoadVector::from_fn(|domain| values[domain]))
    }
}

/// A logged session as read back from the persistence layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSession {
    /// When the session took place
    pub timestamp: DateTime<Utc>,

    /// Registered sport identifier, e.g. `weight_lifting`
    pub sport_id: String,

    /// Load computed once at logging time
    pub load: LoadVector,
}

impl TrainingSession {
    pub fn new(timestamp: DateTime<Utc>, sport_id: impl Into<String>, load: LoadVector) -> Self {
        Self {
            timestamp,
            sport_id: sport_id.into(),
            load,
        }
    }

    pub fn date(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }
}

/// Per-user sport selection driving micro-cycle sizing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SportConfig {
    pub sport_id: String,

    /// Background sports contribute load but never occupy cycle slots
    #[serde(default)]
    pub is_background: bool,

    pub sessions_per_cycle: u32,

    #[serde(default)]
    pub recovery_days_hint: u32,

    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_order_is_fixed() {
        let codes: String = Domain::ALL.iter().map(|d| d.code()).collect();
        assert_eq!(codes, "MNTAC");
        for (i, domain) in Domain::ALL.iter().enumerate() {
            assert_eq!(domain.index(), i);
        }
    }

    #[test]
    fn test_tolerance_classes() {
        assert_eq!(Domain::Neuromuscular.tolerance(), ToleranceClass::LowStructural);
        assert_eq!(Domain::Tendon.tolerance(), ToleranceClass::LowStructural);
        assert_eq!(Domain::Autonomic.tolerance(), ToleranceClass::MediumModulator);
        assert_eq!(Domain::Metabolic.tolerance(), ToleranceClass::High);
        assert_eq!(Domain::Coordination.tolerance(), ToleranceClass::High);
        assert!(Domain::STRUCTURAL.iter().all(|d| d.is_structural()));
        assert!(Domain::NON_STRUCTURAL.iter().all(|d| !d.is_structural()));
    }

    #[test]
    fn test_stress_vector_clamps() {
        let sv = StressVector::new(1.4, -0.2, 0.5, f64::NAN, 1.0);
        assert_eq!(sv.get(Domain::Metabolic), 1.0);
        assert_eq!(sv.get(Domain::Neuromuscular), 0.0);
        assert_eq!(sv.get(Domain::Tendon), 0.5);
        assert_eq!(sv.get(Domain::Autonomic), 0.0);
        assert_eq!(sv.get(Domain::Coordination), 1.0);
    }

    #[test]
    fn test_scaled_unclamped_exceeds_one() {
        let sv = StressVector::new(0.7, 0.2, 0.3, 0.4, 0.1);
        let load = sv.scaled_unclamped(10.0);
        assert!((load.get(Domain::Metabolic) - 7.0).abs() < 1e-12);
        assert!((load.get(Domain::Coordination) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_load_vector_never_negative() {
        let load = LoadVector::new(-5.0, 3.0, f64::NAN, 0.0, 2.0);
        assert_eq!(load.get(Domain::Metabolic), 0.0);
        assert_eq!(load.get(Domain::Tendon), 0.0);
        assert_eq!(load.scaled(-1.0), LoadVector::zero());
    }

    #[test]
    fn test_load_vector_sum() {
        let total: LoadVector = vec![
            LoadVector::new(1.0, 2.0, 3.0, 4.0, 5.0),
            LoadVector::new(1.0, 1.0, 1.0, 1.0, 1.0),
        ]
        .into_iter()
        .sum();
        assert_eq!(total, LoadVector::new(2.0, 3.0, 4.0, 5.0, 6.0));
    }

    #[test]
    fn test_max_component() {
        let sv = StressVector::new(0.7, 0.2, 0.3, 0.4, 0.1);
        assert_eq!(sv.max_component(), (Domain::Metabolic, 0.7));
    }

    #[test]
    fn test_vectors_serialize_with_domain_names() {
        let load = LoadVector::new(1.0, 2.0, 3.0, 4.0, 5.0);
        let json = serde_json::to_value(load).unwrap();
        assert_eq!(json["tendon"], 3.0);

        let parsed: StressVector = serde_json::from_str(
            r#"{"metabolic":2.0,"neuromuscular":0.5,"tendon":0.1,"autonomic":0.0,"coordination":0.3}"#,
        )
        .unwrap();
        assert_eq!(parsed.get(Domain::Metabolic), 1.0);
    }

    #[test]
    fn test_per_domain_rejects_missing_domain() {
        let parsed: Result<PerDomain<f64>, _> =
            serde_json::from_str(r#"{"metabolic":1.0,"neuromuscular":1.0}"#);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_sport_config_defaults() {
        let config: SportConfig =
            serde_json::from_str(r#"{"sport_id":"weight_lifting","sessions_per_cycle":2}"#).unwrap();
        assert!(config.is_active);
        assert!(!config.is_background);
        assert_eq!(config.recovery_days_hint, 0);
    }
}
