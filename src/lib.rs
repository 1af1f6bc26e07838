//! Pollutant concentration predictor.
//!
//! Aligns a `(year, station)` request with the column layout a regression
//! model was trained on, runs the model and labels its six outputs.

pub mod baseline;
pub mod config;
pub mod error;
pub mod export;
pub mod features;
pub mod model;
pub mod pipeline;
pub mod predictor;
pub mod schema;
pub mod service;
pub mod stations;
pub mod types;

pub use error::{PredictorError, Result};
pub use pipeline::Pipeline;
pub use types::{InputRecord, LabeledPollutants, Pollutant};
