//! loanrisk-core: feature engineering and scoring for loan applications.
//!
//! PIPELINE ORDER (fixed):
//!   1. Date, ratio and address features   (row-wise, independent)
//!   2. Transaction aggregation            (needs applications + history)
//!   3. Assembly and schema reconciliation
//!   4. Column transform and fraud classifier
//!   5. Creditworthiness score, for applications not flagged

pub mod address;
pub mod aggregation;
pub mod assembly;
pub mod config;
pub mod credit;
pub mod date_features;
pub mod error;
pub mod loader;
pub mod model;
pub mod preprocess;
pub mod ratio_features;
pub mod record;
pub mod rng;
pub mod schema;
pub mod scoring;
pub mod store;
pub mod synth;
pub mod table;
pub mod types;
