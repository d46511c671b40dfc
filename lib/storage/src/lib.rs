//! # furnrec Storage
//!
//! Dataset ingestion and model bundle persistence.
//!
//! - [`load_csv`] / [`read_csv`] - Read and clean the rentals dataset
//! - [`ModelBundle`] - Encoder state, features, similarity matrix and records as one value
//! - [`BundleStore`] - Atomic bincode save and validated load

pub mod bundle;
pub mod dataset;
pub mod persistence;

pub use bundle::{fingerprint, ModelBundle, TrainingSummary, SCHEMA_VERSION};
pub use dataset::{load_csv, read_csv, Dataset};
pub use persistence::BundleStore;
