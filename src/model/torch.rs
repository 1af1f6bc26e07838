use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use super::Regressor;
use crate::types::Pollutant;

/// TorchScript regressor: `[B, in_dim]` floats in, `[B, 6]` out.
pub struct TorchRegressor {
    model: CModule,
    device: Device,
    in_dim: usize,
    out_dim: usize,
}

impl TorchRegressor {
    /// Load on CPU. `in_dim` comes from the training schema, the module
    /// itself does not carry it.
    pub fn load(model_path: &Path, in_dim: usize) -> Result<Self> {
        let device = Device::Cpu;
        let model = CModule::load_on_device(model_path, device)
            .with_context(|| format!("failed to load TorchScript {}", model_path.display()))?;
        Self::from_module(model, device, in_dim)
    }

    /// Wrap an already loaded module whose input width is known.
    pub fn from_module(model: CModule, device: Device, in_dim: usize) -> Result<Self> {
        // Probe output shape with a dummy forward; expect [B=1, 6]
        let dummy = Tensor::zeros([1, in_dim as i64], (Kind::Float, device));
        let t = model.forward_ts(&[dummy])?;
        let sz = t.size();
        if sz.len() != 2 || sz[0] != 1 {
            bail!("unexpected model output size: {:?}", sz);
        }
        let out_dim = sz[1] as usize;
        if out_dim != Pollutant::COUNT {
            bail!("model emits {} outputs, expected {}", out_dim, Pollutant::COUNT);
        }
        Ok(Self {
            model,
            device,
            in_dim,
            out_dim,
        })
    }
}

impl Regressor for TorchRegressor {
    fn in_dim(&self) -> usize {
        self.in_dim
    }

    fn out_dim(&self) -> usize {
        self.out_dim
    }

    fn predict_batch(&self, rows: &[Vec<f32>]) -> Result<Vec<Vec<f64>>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }
        let mut flat = Vec::with_capacity(rows.len() * self.in_dim);
        for (i, r) in rows.iter().enumerate() {
            if r.len() != self.in_dim {
                bail!(
                    "row {} feature length mismatch: got {}, expected {}",
                    i,
                    r.len(),
                    self.in_dim
                );
            }
            flat.extend_from_slice(r);
        }

        let input = Tensor::from_slice(&flat)
            .reshape([rows.len() as i64, self.in_dim as i64])
            .to_device(self.device);

        // Forward: [B, 6]
        let out = self.model.forward_ts(&[input])?.to_kind(Kind::Double);
        let sz = out.size();
        if sz.len() != 2 || sz[0] != rows.len() as i64 || sz[1] != self.out_dim as i64 {
            bail!("unexpected forward output shape: {:?}", sz);
        }
        let values = Vec::<f64>::try_from(out.flatten(0, -1))?;
        Ok(values.chunks(self.out_dim).map(|c| c.to_vec()).collect())
    }

    fn backend(&self) -> &'static str {
        "torchscript"
    }
}
