//! # furnrec Similarity
//!
//! Content-based similarity model over rental records.
//!
//! ## Features
//!
//! - **Feature Encoder**: TF-IDF over each record's combined text, with English stop words removed
//! - **Similarity Engine**: Dense, exactly symmetric cosine similarity matrix
//! - **Recommendation Selector**: Top-N rows for an anchor picked by identity or by filter
//!
//! ## Example
//!
//! ```rust
//! use furnrec_core::{Field, Record, RecordTable};
//! use furnrec_similarity::{encode, EncoderConfig, Recommender, SimilarityMatrix};
//!
//! let row = |id: &str, furniture: &str| Record {
//!     rental_id: id.to_string(),
//!     apartment_type: "Studio".to_string(),
//!     location: "Downtown".to_string(),
//!     renter_type: "Student".to_string(),
//!     budget_range: "Low".to_string(),
//!     preferred_style: "Minimalist".to_string(),
//!     recommended_furniture: furniture.to_string(),
//! };
//! let records =
//!     RecordTable::new(vec![row("R1", "Sofa bed"), row("R2", "Desk"), row("R3", "Sofa")]);
//!
//! let encoded = encode(&records, &EncoderConfig::default()).unwrap();
//! let matrix = SimilarityMatrix::build(&encoded.features);
//!
//! let recommender = Recommender::new(&records, &matrix).unwrap();
//! let recs = recommender
//!     .recommend_for(Field::RecommendedFurniture, "Sofa bed", 5, None)
//!     .unwrap();
//! assert_eq!(recs[0].listing.recommended_furniture, "Sofa");
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │   Records   │────>│   TF-IDF    │────>│   Cosine    │
//! │   (table)   │     │  (encoder)  │     │  (matrix)   │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!       │                                        │
//!       │              ┌─────────────┐           │
//!       └─────────────>│ Recommender │<──────────┘
//!                      │  (anchor)   │
//!                      └─────────────┘
//! ```

pub mod stop_words;
pub mod tfidf;
pub mod matrix;
pub mod recommend;

pub use tfidf::{encode, tokenize, Encoded, EncoderConfig, TfidfVectorizer};
pub use matrix::{similarity, SimilarityMatrix};
pub use recommend::{
    dedupe_by_key, FilteredRecommendations, Ranked, Recommendation, Recommender, DEFAULT_TOP_N,
};
