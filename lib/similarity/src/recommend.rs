//! Recommendation selector
//!
//! Ranks the rows of the record table against an anchor row using the
//! precomputed similarity matrix. The anchor is always passed in
//! explicitly, either as a row index, an identity lookup or a filter.

use ahash::AHashSet;
use furnrec_core::{Error, Field, Filter, Listing, RecordTable, Result, SparseVector};
use serde::{Deserialize, Serialize};
use std::hash::Hash;
use tracing::debug;

use crate::matrix::SimilarityMatrix;
use crate::tfidf::TfidfVectorizer;

pub const DEFAULT_TOP_N: usize = 5;

/// A ranked row of the record table
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ranked {
    pub index: usize,
    pub score: f32,
}

/// A recommended listing with its similarity to the anchor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    #[serde(flatten)]
    pub listing: Listing,
    pub score: f32,
}

/// Outcome of a filter-driven query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilteredRecommendations {
    /// The anchor row, shown as the top pick; `None` when the filter matched nothing
    pub top_pick: Option<Listing>,
    pub recommendations: Vec<Recommendation>,
}

impl FilteredRecommendations {
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.top_pick.is_none() && self.recommendations.is_empty()
    }
}

/// Keep the first item for each key, preserving order
pub fn dedupe_by_key<T, K, F>(items: Vec<T>, mut key: F) -> Vec<T>
where
    K: Eq + Hash,
    F: FnMut(&T) -> K,
{
    let mut seen = AHashSet::new();
    items.into_iter().filter(|item| seen.insert(key(item))).collect()
}

/// Read-only query interface over a record table and its similarity matrix
#[derive(Debug, Clone, Copy)]
pub struct Recommender<'a> {
    records: &'a RecordTable,
    matrix: &'a SimilarityMatrix,
    encoder: Option<(&'a TfidfVectorizer, &'a [SparseVector])>,
}

impl<'a> Recommender<'a> {
    /// Both inputs must come from the same training run
    pub fn new(records: &'a RecordTable, matrix: &'a SimilarityMatrix) -> Result<Self> {
        if records.len() != matrix.dim() {
            return Err(Error::BundleIntegrity(format!(
                "{} records but similarity matrix is {}x{}",
                records.len(),
                matrix.dim(),
                matrix.dim()
            )));
        }
        Ok(Self { records, matrix, encoder: None })
    }

    /// Enable free-text queries
    pub fn with_encoder(
        mut self,
        vectorizer: &'a TfidfVectorizer,
        features: &'a [SparseVector],
    ) -> Result<Self> {
        if features.len() != self.records.len() {
            return Err(Error::BundleIntegrity(format!(
                "{} records but {} feature vectors",
                self.records.len(),
                features.len()
            )));
        }
        self.encoder = Some((vectorizer, features));
        Ok(self)
    }

    #[inline]
    pub fn records(&self) -> &'a RecordTable {
        self.records
    }

    /// First row, in table order, whose `field` equals `value`
    pub fn anchor_by_identity(&self, field: Field, value: &str) -> Result<usize> {
        self.records
            .position(field, value)
            .ok_or_else(|| Error::anchor_not_found(field, value))
    }

    /// First row, in table order, accepted by `filter`
    pub fn anchor_by_filter<F: Filter + ?Sized>(&self, filter: &F) -> Option<usize> {
        self.records.first_match(filter)
    }

    /// Rows most similar to `anchor`, best first.
    ///
    /// Ties keep table order. The anchor is excluded by position, so a
    /// duplicate row scoring 1.0 is still returned. Deduplication runs after
    /// truncation and may leave fewer than `top_n` rows.
    pub fn rank(
        &self,
        anchor: usize,
        top_n: usize,
        dedupe_by: Option<Field>,
    ) -> Result<Vec<Ranked>> {
        let row = self
            .matrix
            .row(anchor)
            .ok_or_else(|| Error::anchor_not_found("row", anchor.to_string()))?;

        let mut ranked: Vec<Ranked> = row
            .iter()
            .enumerate()
            .filter(|&(index, _)| index != anchor)
            .map(|(index, &score)| Ranked { index, score })
            .collect();
        // sort_by is stable
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);

        Ok(self.dedupe(ranked, dedupe_by))
    }

    /// [`Recommender::rank`] projected onto listings
    pub fn recommend(
        &self,
        anchor: usize,
        top_n: usize,
        dedupe_by: Option<Field>,
    ) -> Result<Vec<Recommendation>> {
        Ok(self.project(self.rank(anchor, top_n, dedupe_by)?))
    }

    /// Recommendations for the first record whose `field` equals `value`
    pub fn recommend_for(
        &self,
        field: Field,
        value: &str,
        top_n: usize,
        dedupe_by: Option<Field>,
    ) -> Result<Vec<Recommendation>> {
        let anchor = self.anchor_by_identity(field, value)?;
        debug!(%field, value, anchor, "anchor resolved by identity");
        self.recommend(anchor, top_n, dedupe_by)
    }

    /// Recommendations for the first record accepted by `filter`.
    /// An empty match yields an empty result, not an error.
    pub fn recommend_filtered<F: Filter + ?Sized>(
        &self,
        filter: &F,
        top_n: usize,
        dedupe_by: Option<Field>,
    ) -> FilteredRecommendations {
        let Some(anchor) = self.anchor_by_filter(filter) else {
            debug!("filter matched no records");
            return FilteredRecommendations::default();
        };

        let ranked = self.rank(anchor, top_n, dedupe_by).unwrap_or_default();
        FilteredRecommendations {
            top_pick: self.records.get(anchor).map(|r| r.listing()),
            recommendations: self.project(ranked),
        }
    }

    /// Rank every record against a free-text description
    pub fn query(
        &self,
        text: &str,
        top_n: usize,
        dedupe_by: Option<Field>,
    ) -> Result<Vec<Recommendation>> {
        let (vectorizer, features) = self.encoder.ok_or_else(|| {
            Error::InvalidConfig("recommender has no encoder for text queries".to_string())
        })?;

        let query = vectorizer.transform(text);
        if query.is_zero() {
            debug!(text, "query has no known terms");
            return Ok(Vec::new());
        }

        let mut ranked: Vec<Ranked> = features
            .iter()
            .enumerate()
            .map(|(index, v)| Ranked {
                index,
                score: query.cosine_similarity(v).clamp(0.0, 1.0),
            })
            .filter(|r| r.score > 0.0)
            .collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));
        ranked.truncate(top_n);

        Ok(self.project(self.dedupe(ranked, dedupe_by)))
    }

    fn dedupe(&self, ranked: Vec<Ranked>, dedupe_by: Option<Field>) -> Vec<Ranked> {
        match dedupe_by {
            Some(field) => dedupe_by_key(ranked, |r| {
                self.records.get(r.index).map(|rec| rec.get(field))
            }),
            None => ranked,
        }
    }

    fn project(&self, ranked: Vec<Ranked>) -> Vec<Recommendation> {
        ranked
            .into_iter()
            .filter_map(|r| {
                self.records.get(r.index).map(|rec| Recommendation {
                    listing: rec.listing(),
                    score: r.score,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tfidf::{encode, EncoderConfig};
    use furnrec_core::{Record, RecordFilter};

    fn rec(id: &str, apt: &str, loc: &str, budget: &str, style: &str, furniture: &str) -> Record {
        Record {
            rental_id: id.to_string(),
            apartment_type: apt.to_string(),
            location: loc.to_string(),
            renter_type: "Professional".to_string(),
            budget_range: budget.to_string(),
            preferred_style: style.to_string(),
            recommended_furniture: furniture.to_string(),
        }
    }

    /// Rows 2 and 3 share their combined text; 0, 1 and 4 are distinct
    fn table() -> RecordTable {
        RecordTable::new(vec![
            rec("R0", "Studio", "Downtown", "Low", "Minimalist", "Sofa bed"),
            rec("R1", "3BHK", "Suburbs", "High", "Rustic", "Oak dining table"),
            rec("R2", "Studio", "Downtown", "Medium", "Minimalist", "Futon"),
            rec("R3", "Studio", "Downtown", "Medium", "Minimalist", "Futon"),
            rec("R4", "Villa", "Beachfront", "Luxury", "Coastal", "Wicker lounger"),
        ])
    }

    fn model(records: &RecordTable) -> (crate::tfidf::Encoded, SimilarityMatrix) {
        let encoded = encode(records, &EncoderConfig::default()).unwrap();
        let matrix = SimilarityMatrix::build(&encoded.features);
        (encoded, matrix)
    }

    #[test]
    fn test_duplicates_rank_first_in_table_order() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        let ranked = rec.rank(0, 3, None).unwrap();
        let indices: Vec<usize> = ranked.iter().map(|r| r.index).collect();
        assert_eq!(&indices[..2], &[2, 3]);
        assert_eq!(ranked[0].score.to_bits(), ranked[1].score.to_bits());
        assert!(ranked[1].score > ranked[2].score);
        assert!(!indices.contains(&0));
    }

    #[test]
    fn test_anchor_excluded_by_position_not_score() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        let ranked = rec.rank(2, 4, None).unwrap();
        assert_eq!(ranked[0].index, 3);
        assert_eq!(ranked[0].score, 1.0);
        assert!(ranked.iter().all(|r| r.index != 2));
    }

    #[test]
    fn test_top_n_bound() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        for anchor in 0..records.len() {
            assert_eq!(rec.rank(anchor, 3, None).unwrap().len(), 3);
            assert_eq!(rec.rank(anchor, 10, None).unwrap().len(), 4);
            assert!(rec.rank(anchor, 0, None).unwrap().is_empty());
        }
    }

    #[test]
    fn test_dedupe_keeps_highest_ranked() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        let recs = rec.recommend(0, 4, Some(Field::RecommendedFurniture)).unwrap();
        let names: Vec<&str> = recs
            .iter()
            .map(|r| r.listing.recommended_furniture.as_str())
            .collect();
        assert_eq!(names.len(), 3);
        assert_eq!(names[0], "Futon");
        assert_eq!(names.iter().filter(|n| **n == "Futon").count(), 1);
    }

    #[test]
    fn test_dedupe_idempotent() {
        let items = vec![("a", 1), ("b", 2), ("a", 3), ("c", 4), ("b", 5)];
        let once = dedupe_by_key(items, |x| x.0);
        let twice = dedupe_by_key(once.clone(), |x| x.0);
        assert_eq!(once, vec![("a", 1), ("b", 2), ("c", 4)]);
        assert_eq!(once, twice);

        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();
        for anchor in 0..records.len() {
            let deduped = rec.recommend(anchor, 4, Some(Field::RecommendedFurniture)).unwrap();
            let again =
                dedupe_by_key(deduped.clone(), |r| r.listing.recommended_furniture.clone());
            assert_eq!(deduped, again);
        }
    }

    #[test]
    fn test_anchor_by_identity() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        assert_eq!(rec.anchor_by_identity(Field::RecommendedFurniture, "Futon").unwrap(), 2);
        let err = rec
            .recommend_for(Field::RecommendedFurniture, "Hammock", 5, None)
            .unwrap_err();
        assert!(matches!(err, Error::AnchorNotFound { .. }));
    }

    #[test]
    fn test_out_of_range_anchor() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();
        assert!(matches!(rec.rank(99, 5, None), Err(Error::AnchorNotFound { .. })));
    }

    #[test]
    fn test_filtered_uses_first_match_as_anchor() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        let filter = RecordFilter::new().location("Downtown").search("futon");
        let result = rec.recommend_filtered(&filter, DEFAULT_TOP_N, None);
        assert_eq!(result.top_pick.unwrap().recommended_furniture, "Futon");
        assert_eq!(result.recommendations.len(), 4);
        assert_eq!(result.recommendations[0].score, 1.0);
    }

    #[test]
    fn test_filtered_empty_match_is_empty() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();

        let filter = RecordFilter::new().apartment_type("Castle");
        let result = rec.recommend_filtered(&filter, DEFAULT_TOP_N, None);
        assert!(result.is_empty());
    }

    #[test]
    fn test_text_query() {
        let records = table();
        let (encoded, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix)
            .unwrap()
            .with_encoder(&encoded.vectorizer, &encoded.features)
            .unwrap();

        let recs = rec.query("coastal wicker", 2, None).unwrap();
        assert_eq!(recs[0].listing.apartment_type, "Villa");
        assert!(rec.query("the and of", 5, None).unwrap().is_empty());
    }

    #[test]
    fn test_text_query_requires_encoder() {
        let records = table();
        let (_, matrix) = model(&records);
        let rec = Recommender::new(&records, &matrix).unwrap();
        assert!(matches!(rec.query("sofa", 5, None), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_misaligned_inputs_rejected() {
        let records = table();
        let matrix = SimilarityMatrix::build(&[]);
        assert!(matches!(
            Recommender::new(&records, &matrix),
            Err(Error::BundleIntegrity(_))
        ));
    }
}
