//! attrisk: Employee Attrition Risk Library
//!
//! Cleans tabular HR data, engineers attrition features, assembles a
//! column-group preprocessor and a class-weighted logistic regression, and
//! serves leaver probabilities for single-employee payloads.

pub mod cli;
pub mod error;
pub mod model;
pub mod pipeline;
pub mod report;
pub mod serving;
pub mod utils;

pub use error::{AttritionError, Result};
pub use serving::{check_payload, decide, predict_proba, reset_cache};
