use serde::Deserialize;
use std::{fs, net::SocketAddr, path::PathBuf};

use crate::error::{PredictorError, Result};

/// Startup settings for the prediction service.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub schema_path: PathBuf,
    /// Station locations; `None` serves without map data.
    pub stations_path: Option<PathBuf>,
    pub bind_addr: SocketAddr,
    /// Log per-request feature diagnostics.
    pub log_pred: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("pollution_model.json"),
            schema_path: PathBuf::from("model_columns.json"),
            stations_path: Some(PathBuf::from("stations.csv")),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            log_pred: false,
        }
    }
}

impl ServiceConfig {
    /// Read a JSON config file; missing keys fall back to defaults.
    pub fn load(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)
            .map_err(|e| PredictorError::Config(format!("config file {path}: {e}")))?;
        serde_json::from_str(&data)
            .map_err(|e| PredictorError::Config(format!("invalid config JSON in {path}: {e}")))
    }

    /// `PREDICTOR_CONFIG` file if set, then environment overrides.
    pub fn from_env() -> Result<Self> {
        let base = match std::env::var("PREDICTOR_CONFIG") {
            Ok(p) => Self::load(&p)?,
            Err(_) => Self::default(),
        };
        base.with_overrides(|k| std::env::var(k).ok())
    }

    /// Apply `MODEL_PATH`, `SCHEMA_PATH`/`META_PATH`, `STATIONS_PATH`,
    /// `BIND_ADDR`, `PORT` and `LOG_PRED` from `lookup`.
    pub fn with_overrides<F>(mut self, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(p) = lookup("MODEL_PATH") {
            self.model_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("SCHEMA_PATH").or_else(|| lookup("META_PATH")) {
            self.schema_path = PathBuf::from(p);
        }
        if let Some(p) = lookup("STATIONS_PATH") {
            self.stations_path = if p.trim().is_empty() {
                None
            } else {
                Some(PathBuf::from(p))
            };
        }
        if let Some(a) = lookup("BIND_ADDR") {
            self.bind_addr = a
                .parse()
                .map_err(|e| PredictorError::Config(format!("BIND_ADDR '{a}': {e}")))?;
        }
        if let Some(p) = lookup("PORT") {
            let port: u16 = p
                .parse()
                .map_err(|e| PredictorError::Config(format!("PORT '{p}': {e}")))?;
            self.bind_addr.set_port(port);
        }
        if let Some(v) = lookup("LOG_PRED") {
            self.log_pred = v == "1" || v.eq_ignore_ascii_case("true");
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn env_overrides_apply_on_top_of_defaults() {
        let env: HashMap<&str, &str> = [
            ("META_PATH", "meta.json"),
            ("PORT", "9000"),
            ("STATIONS_PATH", ""),
            ("LOG_PRED", "1"),
        ]
        .into_iter()
        .collect();
        let cfg = ServiceConfig::default()
            .with_overrides(|k| env.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(cfg.schema_path, PathBuf::from("meta.json"));
        assert_eq!(cfg.bind_addr.port(), 9000);
        assert_eq!(cfg.stations_path, None);
        assert!(cfg.log_pred);
    }

    #[test]
    fn bad_port_is_a_config_error() {
        let err = ServiceConfig::default()
            .with_overrides(|k| (k == "PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert!(matches!(err, PredictorError::Config(_)));
    }
}
