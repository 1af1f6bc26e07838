//! One-time initialisation and the per-request encode -> reconcile -> predict -> label path.

use std::sync::Arc;

use crate::baseline::BaselineSample;
use crate::config::ServiceConfig;
use crate::error::{PredictorError, Result};
use crate::features::{dropped_columns, encode, reconcile};
use crate::model::{load_regressor, Regressor};
use crate::predictor::{label, Predictor};
use crate::schema::TrainingSchema;
use crate::stations::StationTable;
use crate::types::{InputRecord, LabeledPollutants, Pollutant, ReconciledFeatureVector};

/// Immutable handles built before serving. Cheap to clone; safe to share.
#[derive(Clone)]
pub struct Pipeline {
    schema: Arc<TrainingSchema>,
    predictor: Predictor,
    stations: Arc<StationTable>,
    baseline: Arc<BaselineSample>,
    log_pred: bool,
}

impl Pipeline {
    /// Load every artifact named by `cfg`. Any failure here is fatal.
    pub fn init(cfg: &ServiceConfig) -> Result<Self> {
        let schema = TrainingSchema::load(&cfg.schema_path)?;
        tracing::info!(
            "loaded schema; feat_list[{}]: {:?}",
            schema.len(),
            schema.columns()
        );

        let model = load_regressor(&cfg.model_path, schema.len())?;
        tracing::info!(
            "loaded {} model from {} (in_dim={}, out_dim={})",
            model.backend(),
            cfg.model_path.display(),
            model.in_dim(),
            model.out_dim()
        );

        let stations = match &cfg.stations_path {
            Some(p) => StationTable::load(p)?,
            None => {
                tracing::warn!("no station table configured; station lookups will miss");
                StationTable::empty()
            }
        };
        tracing::info!("loaded {} stations", stations.len());

        let baseline = BaselineSample::generate(&mut rand::thread_rng());

        let pipeline = Self::from_parts(schema, Arc::from(model), stations, baseline)?
            .with_log_pred(cfg.log_pred);
        pipeline.warmup()?;
        Ok(pipeline)
    }

    /// Assemble from already loaded parts, checking the model fits the schema.
    pub fn from_parts(
        schema: TrainingSchema,
        model: Arc<dyn Regressor>,
        stations: StationTable,
        baseline: BaselineSample,
    ) -> Result<Self> {
        if model.in_dim() != schema.len() {
            return Err(PredictorError::model_load(
                model.backend(),
                format!(
                    "model in_dim ({}) != schema length ({})",
                    model.in_dim(),
                    schema.len()
                ),
            ));
        }
        if model.out_dim() != Pollutant::COUNT {
            return Err(PredictorError::model_load(
                model.backend(),
                format!(
                    "model out_dim ({}) != {} pollutants",
                    model.out_dim(),
                    Pollutant::COUNT
                ),
            ));
        }
        Ok(Self {
            schema: Arc::new(schema),
            predictor: Predictor::new(model),
            stations: Arc::new(stations),
            baseline: Arc::new(baseline),
            log_pred: false,
        })
    }

    pub fn with_log_pred(mut self, on: bool) -> Self {
        self.log_pred = on;
        self
    }

    /// Zero-vector forward so a broken artifact fails at startup, not on the first request.
    fn warmup(&self) -> Result<()> {
        let zeros = ReconciledFeatureVector(vec![0.0; self.schema.len()]);
        self.predictor
            .predict(&zeros)
            .and_then(|v| label(&v))
            .map_err(|e| PredictorError::model_load(self.predictor.model().backend(), e))?;
        tracing::info!("warmup forward ok");
        Ok(())
    }

    pub fn schema(&self) -> &TrainingSchema {
        &self.schema
    }

    pub fn stations(&self) -> &StationTable {
        &self.stations
    }

    pub fn baseline(&self) -> &BaselineSample {
        &self.baseline
    }

    /// Build the model input for a request without running the model.
    pub fn features(&self, record: &InputRecord) -> Result<ReconciledFeatureVector> {
        let raw = encode(record, self.schema.prefix())?;
        let vec = reconcile(&raw, &self.schema);
        if self.log_pred {
            self.log_features(record, &vec, &dropped_columns(&raw, &self.schema));
        }
        Ok(vec)
    }

    pub fn predict(&self, year: i64, station_id: &str) -> Result<LabeledPollutants> {
        self.predict_record(&InputRecord::new(year, station_id))
    }

    pub fn predict_record(&self, record: &InputRecord) -> Result<LabeledPollutants> {
        let vec = self.features(record)?;
        let out = self.predictor.predict(&vec)?;
        label(&out)
    }

    fn log_features(&self, record: &InputRecord, vec: &ReconciledFeatureVector, dropped: &[&str]) {
        tracing::info!("{}", self.feature_summary(record, vec, dropped));
    }

    /// One-line description of a reconciled request for `LOG_PRED` output.
    fn feature_summary(&self, record: &InputRecord, vec: &ReconciledFeatureVector, dropped: &[&str]) -> String {
        let nz = vec.as_slice().iter().filter(|x| **x != 0.0).count();
        let mut sample = vec![];
        for (i, name) in self.schema.columns().iter().take(6).enumerate() {
            sample.push(format!("{}={:.3}", name, vec.as_slice()[i]));
        }
        format!(
            "recv station={} year={} in_dim={} nonzero={} dropped={:?} sample=[{}]",
            record.station_id.trim(),
            record.year,
            vec.len(),
            nz,
            dropped,
            sample.join(", ")
        )
    }
}
