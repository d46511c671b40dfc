//! # furnrec
//!
//! A content-based furniture recommender for renters.
//!
//! furnrec turns categorical rental records (apartment type, location, renter
//! type, budget range, preferred style, recommended furniture) into TF-IDF
//! vectors, precomputes a cosine similarity matrix, and answers
//! "what else fits?" queries against that matrix.
//!
//! ## Quick Start
//!
//! ### From the command line
//!
//! ```bash
//! furnrec train --input rentals_furniture_100.csv --output model.bin
//! furnrec recommend --model model.bin --apartment-type Studio --search sofa
//! furnrec serve --model model.bin --http-port 8080
//! ```
//!
//! ### As a Library
//!
//! ```rust,no_run
//! use furnrec::prelude::*;
//!
//! let dataset = load_csv("rentals_furniture_100.csv").unwrap();
//! let bundle = ModelBundle::train(dataset.records, &EncoderConfig::default()).unwrap();
//! BundleStore::new("model.bin").save(&bundle).unwrap();
//!
//! let recommender = bundle.recommender().unwrap();
//! let filter = RecordFilter::new().apartment_type("Studio");
//! let result = recommender.recommend_filtered(&filter, 5, Some(Field::RecommendedFurniture));
//! ```
//!
//! ## Crate Structure
//!
//! - `furnrec-core` - Records, sparse vectors, filters, errors
//! - `furnrec-similarity` - TF-IDF encoder, similarity matrix, recommender
//! - `furnrec-storage` - CSV ingestion and the model bundle
//! - `furnrec-api` - REST query interface

pub mod export;

// Re-export core types
pub use furnrec_core::{
    Error, Field, Filter, Listing, Record, RecordFilter, RecordTable, Result, SparseVector,
};

// Re-export the model
pub use furnrec_similarity::{
    encode, EncoderConfig, FilteredRecommendations, Recommendation, Recommender,
    SimilarityMatrix, TfidfVectorizer, DEFAULT_TOP_N,
};

// Re-export storage
pub use furnrec_storage::{load_csv, BundleStore, Dataset, ModelBundle, SCHEMA_VERSION};

// Re-export API
pub use furnrec_api::RestApi;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::{
        load_csv, BundleStore, EncoderConfig, Error, Field, Filter, FilteredRecommendations,
        Listing, ModelBundle, Record, RecordFilter, RecordTable, Recommendation, Recommender,
        Result, DEFAULT_TOP_N,
    };
}
