use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fs::File, path::Path};

use crate::error::{PredictorError, Result};

/// Location of a monitoring station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationGeo {
    pub id: String,
    pub lat: f64,
    pub lon: f64,
}

/// Station id -> location, read once from `stations.csv`.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    by_id: HashMap<String, StationGeo>,
}

impl StationTable {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Expects a header with at least `id,lat,lon`; other columns are ignored.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let file = File::open(path).map_err(|e| PredictorError::station_load(&shown, e))?;
        Self::from_reader(file).map_err(|e| match e {
            PredictorError::StationLoad { reason, .. } => PredictorError::station_load(&shown, reason),
            other => other,
        })
    }

    pub fn from_reader<R: std::io::Read>(rdr: R) -> Result<Self> {
        let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
        let mut by_id = HashMap::new();
        for result in rdr.deserialize() {
            let geo: StationGeo = result.map_err(|e| PredictorError::station_load("<reader>", e))?;
            by_id.insert(geo.id.clone(), geo);
        }
        Ok(Self { by_id })
    }

    pub fn from_stations(stations: impl IntoIterator<Item = StationGeo>) -> Self {
        Self {
            by_id: stations.into_iter().map(|s| (s.id.clone(), s)).collect(),
        }
    }

    pub fn get(&self, id: &str) -> Option<&StationGeo> {
        self.by_id.get(id.trim())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }
}
