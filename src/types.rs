use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Inclusive year range accepted by the request surface.
pub const YEAR_MIN: i64 = 2000;
pub const YEAR_MAX: i64 = 2100;

/// Output positions of the trained model, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    O2,
    NO3,
    NO2,
    SO4,
    PO4,
    CL,
}

impl Pollutant {
    pub const ALL: [Pollutant; 6] = [
        Pollutant::O2,
        Pollutant::NO3,
        Pollutant::NO2,
        Pollutant::SO4,
        Pollutant::PO4,
        Pollutant::CL,
    ];

    pub const COUNT: usize = Self::ALL.len();

    pub fn as_str(&self) -> &'static str {
        match self {
            Pollutant::O2 => "O2",
            Pollutant::NO3 => "NO3",
            Pollutant::NO2 => "NO2",
            Pollutant::SO4 => "SO4",
            Pollutant::PO4 => "PO4",
            Pollutant::CL => "CL",
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One prediction request as typed by the user.
#[derive(Debug, Clone, Deserialize)]
pub struct InputRecord {
    pub year: i64,
    pub station_id: String,
}

impl InputRecord {
    pub fn new(year: i64, station_id: impl Into<String>) -> Self {
        Self {
            year,
            station_id: station_id.into(),
        }
    }
}

/// Column name -> value, before alignment with the training schema.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawFeatureVector(pub HashMap<String, f32>);

impl RawFeatureVector {
    pub fn get(&self, column: &str) -> Option<f32> {
        self.0.get(column).copied()
    }

    pub fn insert(&mut self, column: impl Into<String>, value: f32) {
        self.0.insert(column.into(), value);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Values in exactly the trained column order.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciledFeatureVector(pub Vec<f32>);

impl ReconciledFeatureVector {
    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Raw model output row; positions follow [`Pollutant::ALL`].
#[derive(Debug, Clone, PartialEq)]
pub struct PollutantVector(pub Vec<f64>);

impl PollutantVector {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Predicted concentration per pollutant. Iterates in the fixed pollutant order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LabeledPollutants(pub BTreeMap<Pollutant, f64>);

impl LabeledPollutants {
    pub fn get(&self, pollutant: Pollutant) -> Option<f64> {
        self.0.get(&pollutant).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Pollutant, f64)> + '_ {
        self.0.iter().map(|(p, v)| (*p, *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Round to two decimals, the precision shown and exported.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
