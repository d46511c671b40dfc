//! # furnrec Core
//!
//! Core data model for the furnrec furniture recommender.
//!
//! - [`Record`] - One row of the rentals dataset
//! - [`RecordTable`] - The immutable, row-ordered dataset
//! - [`SparseVector`] - TF-IDF feature vector with cosine similarity
//! - [`RecordFilter`] - Filter used to choose an anchor record
//!
//! ## Example
//!
//! ```rust
//! use furnrec_core::{Field, Record, RecordFilter, RecordTable};
//!
//! let table = RecordTable::new(vec![Record {
//!     rental_id: "R1".to_string(),
//!     apartment_type: "Studio".to_string(),
//!     location: "Downtown".to_string(),
//!     renter_type: "Student".to_string(),
//!     budget_range: "Low".to_string(),
//!     preferred_style: "Minimalist".to_string(),
//!     recommended_furniture: "Sofa bed".to_string(),
//! }]);
//!
//! let filter = RecordFilter::new().apartment_type("Studio").search("sofa");
//! assert_eq!(table.first_match(&filter), Some(0));
//! assert_eq!(table.distinct(Field::Location), vec!["Downtown"]);
//! ```

pub mod error;
pub mod filter;
pub mod record;
pub mod vector;

pub use error::{Error, Result};
pub use filter::{Filter, RecordFilter, ANY};
pub use record::{Field, Listing, Record, RecordTable};
pub use vector::SparseVector;
