//! Synthetic "real-time" readings shown next to a prediction.
//!
//! Drawn once at startup. Nothing downstream depends on the values.

use rand::Rng;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{round2, LabeledPollutants, Pollutant};

/// Half-open sampling range per pollutant.
pub fn bounds(p: Pollutant) -> (f64, f64) {
    match p {
        Pollutant::O2 => (2.0, 10.0),
        Pollutant::NO3 => (0.0, 3.0),
        Pollutant::NO2 => (0.0, 2.0),
        Pollutant::SO4 => (5.0, 25.0),
        Pollutant::PO4 => (0.0, 1.5),
        Pollutant::CL => (10.0, 50.0),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct BaselineSample(BTreeMap<Pollutant, f64>);

impl BaselineSample {
    pub fn generate<R: Rng>(rng: &mut R) -> Self {
        let values = Pollutant::ALL
            .iter()
            .map(|&p| {
                let (lo, hi) = bounds(p);
                (p, rng.gen_range(lo..hi))
            })
            .collect();
        Self(values)
    }

    /// Fixed values in pollutant order.
    pub fn from_values(values: [f64; Pollutant::COUNT]) -> Self {
        Self(Pollutant::ALL.into_iter().zip(values).collect())
    }

    pub fn value(&self, p: Pollutant) -> f64 {
        self.0.get(&p).copied().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonRow {
    pub pollutant: Pollutant,
    pub predicted: f64,
    pub real_time: f64,
}

/// Predicted vs baseline, both rounded, in fixed pollutant order.
pub fn compare(predicted: &LabeledPollutants, baseline: &BaselineSample) -> Vec<ComparisonRow> {
    Pollutant::ALL
        .iter()
        .map(|&p| ComparisonRow {
            pollutant: p,
            predicted: round2(predicted.get(p).unwrap_or_default()),
            real_time: round2(baseline.value(p)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn samples_stay_in_bounds() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let b = BaselineSample::generate(&mut rng);
            for p in Pollutant::ALL {
                let (lo, hi) = bounds(p);
                let v = b.value(p);
                assert!(v >= lo && v < hi, "{p} = {v} outside [{lo}, {hi})");
            }
        }
    }
}
