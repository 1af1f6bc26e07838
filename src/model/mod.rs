//! Black-box regressors: N ordered inputs in, one row of pollutant values out.

use anyhow::Result;
use std::path::Path;

use crate::error::PredictorError;

pub mod forest;
#[cfg(feature = "torch")]
pub mod torch;

pub use forest::ForestRegressor;
#[cfg(feature = "torch")]
pub use torch::TorchRegressor;

/// A loaded, read-only model. Shared by reference across requests.
pub trait Regressor: Send + Sync {
    /// Width of one input row.
    fn in_dim(&self) -> usize;

    /// Width of one output row.
    fn out_dim(&self) -> usize;

    /// Run a batch of rows; returns one output row per input row.
    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f64>>>;

    fn backend(&self) -> &'static str;
}

/// Load a model artifact, choosing the backend from the file extension.
///
/// `in_dim` is the training schema width; backends that cannot describe
/// their own input use it to probe the artifact.
pub fn load_regressor(path: impl AsRef<Path>, in_dim: usize) -> crate::error::Result<Box<dyn Regressor>> {
    let path = path.as_ref();
    let shown = path.display().to_string();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "json" => {
            let m = ForestRegressor::load(path).map_err(|e| PredictorError::model_load(&shown, format!("{e:#}")))?;
            Ok(Box::new(m))
        }
        #[cfg(feature = "torch")]
        "pt" | "ts" => {
            let m = TorchRegressor::load(path, in_dim).map_err(|e| PredictorError::model_load(&shown, format!("{e:#}")))?;
            Ok(Box::new(m))
        }
        #[cfg(not(feature = "torch"))]
        "pt" | "ts" => {
            let _ = in_dim;
            Err(PredictorError::model_load(
                &shown,
                "TorchScript artifacts need the `torch` feature",
            ))
        }
        other => Err(PredictorError::model_load(
            &shown,
            format!("unsupported model artifact extension '{other}'"),
        )),
    }
}
