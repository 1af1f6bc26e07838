//! Turn a request into the exact ordered vector the model was trained on.

use crate::error::{PredictorError, Result};
use crate::schema::{indicator_name, TrainingSchema, YEAR_COLUMN};
use crate::types::{InputRecord, RawFeatureVector, ReconciledFeatureVector, YEAR_MAX, YEAR_MIN};

/// Check a request before any encoding happens.
pub fn validate(record: &InputRecord) -> Result<()> {
    if record.station_id.trim().is_empty() {
        return Err(PredictorError::InvalidInput(
            "station id must not be empty".to_string(),
        ));
    }
    if !(YEAR_MIN..=YEAR_MAX).contains(&record.year) {
        return Err(PredictorError::InvalidInput(format!(
            "year {} outside [{YEAR_MIN}, {YEAR_MAX}]",
            record.year
        )));
    }
    Ok(())
}

/// One-hot encode a record: `year` plus a single `<prefix>_<station>` indicator.
///
/// The indicator is emitted whether or not the schema knows it; `reconcile`
/// drops it for unseen stations.
pub fn encode(record: &InputRecord, prefix: &str) -> Result<RawFeatureVector> {
    validate(record)?;
    let mut raw = RawFeatureVector::default();
    raw.insert(YEAR_COLUMN, record.year as f32);
    raw.insert(indicator_name(prefix, record.station_id.trim()), 1.0);
    Ok(raw)
}

/// Align a raw vector to the schema: schema order, zero for absent columns,
/// unknown columns dropped. Never fails.
pub fn reconcile(raw: &RawFeatureVector, schema: &TrainingSchema) -> ReconciledFeatureVector {
    let mut v = Vec::with_capacity(schema.len());
    for k in schema.columns() {
        v.push(raw.get(k).unwrap_or(0.0));
    }
    ReconciledFeatureVector(v)
}

/// Columns of `raw` that `reconcile` will discard.
pub fn dropped_columns<'a>(raw: &'a RawFeatureVector, schema: &TrainingSchema) -> Vec<&'a str> {
    let mut out: Vec<&str> = raw
        .0
        .keys()
        .filter(|k| !schema.contains(k))
        .map(String::as_str)
        .collect();
    out.sort_unstable();
    out
}
