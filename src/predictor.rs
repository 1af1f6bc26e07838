use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{PredictorError, Result};
use crate::model::Regressor;
use crate::types::{LabeledPollutants, Pollutant, PollutantVector, ReconciledFeatureVector};

/// Wraps the loaded model's inference call.
#[derive(Clone)]
pub struct Predictor {
    model: Arc<dyn Regressor>,
}

impl Predictor {
    pub fn new(model: Arc<dyn Regressor>) -> Self {
        Self { model }
    }

    pub fn model(&self) -> &dyn Regressor {
        self.model.as_ref()
    }

    /// One-row batch through the model; returns the first output row.
    pub fn predict(&self, vector: &ReconciledFeatureVector) -> Result<PollutantVector> {
        let expected = self.model.in_dim();
        if vector.len() != expected {
            return Err(PredictorError::Inference(format!(
                "feature length mismatch: got {}, expected {}",
                vector.len(),
                expected
            )));
        }

        let out = self
            .model
            .predict_batch(&[vector.0.clone()])
            .map_err(|e| PredictorError::Inference(format!("{e:#}")))?;
        let row = out
            .into_iter()
            .next()
            .ok_or_else(|| PredictorError::Inference("model returned an empty batch".to_string()))?;

        if let Some(bad) = row.iter().position(|v| !v.is_finite()) {
            return Err(PredictorError::Inference(format!(
                "non-finite output at position {bad}"
            )));
        }
        Ok(PollutantVector(row))
    }
}

/// Attach pollutant names to a model output row by position.
pub fn label(vector: &PollutantVector) -> Result<LabeledPollutants> {
    if vector.len() != Pollutant::COUNT {
        return Err(PredictorError::ShapeMismatch {
            expected: Pollutant::COUNT,
            got: vector.len(),
        });
    }
    let map: BTreeMap<Pollutant, f64> = Pollutant::ALL
        .iter()
        .copied()
        .zip(vector.0.iter().copied())
        .collect();
    Ok(LabeledPollutants(map))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Vec<f64>);

    impl Regressor for Fixed {
        fn in_dim(&self) -> usize {
            2
        }
        fn out_dim(&self) -> usize {
            self.0.len()
        }
        fn predict_batch(&self, rows: &[Vec<f32>]) -> anyhow::Result<Vec<Vec<f64>>> {
            Ok(rows.iter().map(|_| self.0.clone()).collect())
        }
        fn backend(&self) -> &'static str {
            "fixed"
        }
    }

    #[test]
    fn wrong_width_is_an_inference_error() {
        let p = Predictor::new(Arc::new(Fixed(vec![1.0; 6])));
        let err = p.predict(&ReconciledFeatureVector(vec![1.0, 0.0, 0.0])).unwrap_err();
        assert!(matches!(err, PredictorError::Inference(_)));
    }

    #[test]
    fn nan_output_is_rejected() {
        let p = Predictor::new(Arc::new(Fixed(vec![1.0, f64::NAN, 0.0, 0.0, 0.0, 0.0])));
        let err = p.predict(&ReconciledFeatureVector(vec![2022.0, 1.0])).unwrap_err();
        assert!(err.to_string().contains("non-finite"));
    }
}
