//! Training-time feature schema: the exact column set and order the model consumes.

use serde::Deserialize;
use std::{collections::HashMap, fs, path::Path};

use crate::error::{PredictorError, Result};

/// Name of the only numeric (non-indicator) column.
pub const YEAR_COLUMN: &str = "year";
/// Prefix the training-time dummy encoder put in front of station ids.
pub const DEFAULT_CATEGORICAL_PREFIX: &str = "id";

#[derive(Deserialize)]
#[serde(untagged)]
enum SchemaJson {
    Bare(Vec<String>),
    Meta {
        feat_list: Vec<String>,
        in_dim: Option<usize>,
        categorical_prefix: Option<String>,
    },
}

/// Ordered, unique model input columns. Immutable once built.
#[derive(Debug, Clone)]
pub struct TrainingSchema {
    columns: Vec<String>,
    prefix: String,
    index: HashMap<String, usize>,
}

impl TrainingSchema {
    /// Validate and build a schema from column names in trained order.
    pub fn new(columns: Vec<String>, prefix: impl Into<String>) -> Result<Self> {
        let prefix = prefix.into();
        if columns.is_empty() {
            return Err(PredictorError::schema_load("<memory>", "schema has no columns"));
        }
        let indicator_head = format!("{prefix}_");
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if col != YEAR_COLUMN && !col.starts_with(&indicator_head) {
                return Err(PredictorError::schema_load(
                    "<memory>",
                    format!("column '{col}' is neither '{YEAR_COLUMN}' nor a '{indicator_head}*' indicator"),
                ));
            }
            if index.insert(col.clone(), i).is_some() {
                return Err(PredictorError::schema_load(
                    "<memory>",
                    format!("duplicate column '{col}'"),
                ));
            }
        }
        if !index.contains_key(YEAR_COLUMN) {
            return Err(PredictorError::schema_load(
                "<memory>",
                format!("missing '{YEAR_COLUMN}' column"),
            ));
        }
        Ok(Self {
            columns,
            prefix,
            index,
        })
    }

    /// Read the persisted schema. Call once at startup and share the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let txt = fs::read_to_string(path).map_err(|e| PredictorError::schema_load(&shown, e))?;
        let parsed: SchemaJson =
            serde_json::from_str(&txt).map_err(|e| PredictorError::schema_load(&shown, e))?;

        let (columns, in_dim, prefix) = match parsed {
            SchemaJson::Meta {
                feat_list,
                in_dim,
                categorical_prefix,
            } => (feat_list, in_dim, categorical_prefix),
            SchemaJson::Bare(cols) => (cols, None, None),
        };
        if let Some(n) = in_dim {
            if n != columns.len() {
                return Err(PredictorError::schema_load(
                    &shown,
                    format!("in_dim ({n}) != feat_list.len() ({})", columns.len()),
                ));
            }
        }

        let prefix = prefix.unwrap_or_else(|| DEFAULT_CATEGORICAL_PREFIX.to_string());
        Self::new(columns, prefix).map_err(|e| match e {
            PredictorError::SchemaLoad { reason, .. } => PredictorError::schema_load(&shown, reason),
            other => other,
        })
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn position(&self, column: &str) -> Option<usize> {
        self.index.get(column).copied()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.index.contains_key(column)
    }

    /// Indicator column name for a station, as the training encoder spelled it.
    pub fn indicator_column(&self, station_id: &str) -> String {
        indicator_name(&self.prefix, station_id)
    }

    /// Whether the model saw this station during training.
    pub fn has_station(&self, station_id: &str) -> bool {
        self.contains(&self.indicator_column(station_id.trim()))
    }

    /// Station ids that have a trained indicator column, in schema order.
    pub fn stations(&self) -> impl Iterator<Item = &str> + '_ {
        let head_len = self.prefix.len() + 1;
        self.columns
            .iter()
            .filter(|c| c.as_str() != YEAR_COLUMN)
            .map(move |c| &c[head_len..])
    }
}

/// `<prefix>_<value>`, the dummy-column spelling used at training time.
pub fn indicator_name(prefix: &str, value: &str) -> String {
    format!("{prefix}_{value}")
}
