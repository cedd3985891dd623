//! Client for the external manipulation-score predictor.
//!
//! The predictor is a small Python HTTP service: it takes the path of the
//! source image and a desired heatmap output path, and answers with a
//! numeric manipulation score plus value bounds. When the service cannot
//! write the heatmap itself it inlines the raster as base64 and this client
//! decodes and materializes the PNG.

mod client;
mod error;

pub use client::{Prediction, PredictorClient, PredictRequest, PredictResponse};
pub use error::{MlError, MlResult};
