use anyhow::{Context, Result};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{round2, LabeledPollutants, Pollutant};

/// Pollutant name -> value rounded to 2 decimals, fixed order.
pub fn to_flat_record(labeled: &LabeledPollutants) -> BTreeMap<Pollutant, f64> {
    labeled.iter().map(|(p, v)| (p, round2(v))).collect()
}

#[derive(Serialize)]
#[serde(rename_all = "UPPERCASE")]
struct CsvRow {
    o2: f64,
    no3: f64,
    no2: f64,
    so4: f64,
    po4: f64,
    cl: f64,
}

/// One header line of pollutant names and one row of rounded values.
pub fn to_csv(labeled: &LabeledPollutants) -> Result<String> {
    let v = |p| round2(labeled.get(p).unwrap_or_default());
    let row = CsvRow {
        o2: v(Pollutant::O2),
        no3: v(Pollutant::NO3),
        no2: v(Pollutant::NO2),
        so4: v(Pollutant::SO4),
        po4: v(Pollutant::PO4),
        cl: v(Pollutant::CL),
    };
    let mut wtr = csv::Writer::from_writer(Vec::new());
    wtr.serialize(row).context("failed to write csv row")?;
    let bytes = wtr.into_inner().context("failed to flush csv writer")?;
    String::from_utf8(bytes).context("csv output is not utf-8")
}

/// Download name offered for a prediction export.
pub fn export_file_name(station_id: &str, year: i64) -> String {
    let station: String = station_id
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("pollutants_{station}_{year}.csv")
}
