//! TF-IDF feature encoder
//!
//! Turns each record's combined text into an L2-normalized sparse vector.
//! The vocabulary is sorted lexicographically so that fitting the same
//! table twice yields identical artifacts.

use ahash::{AHashMap, AHashSet};
use furnrec_core::{Error, Field, RecordTable, Result, SparseVector};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::stop_words::is_stop_word;

/// Which columns make up the combined text, and in what order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncoderConfig {
    pub fields: Vec<Field>,
}

impl Default for EncoderConfig {
    fn default() -> Self {
        Self {
            fields: Field::COMBINED_TEXT.to_vec(),
        }
    }
}

impl EncoderConfig {
    pub fn new(fields: Vec<Field>) -> Result<Self> {
        if fields.is_empty() {
            return Err(Error::InvalidConfig("encoder needs at least one field".to_string()));
        }
        Ok(Self { fields })
    }
}

/// Lowercase, split on anything that is not alphanumeric or `_`,
/// keep tokens of two or more characters
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '_'))
        .filter(|s| s.chars().count() > 1)
        .map(str::to_string)
        .collect()
}

/// Tokens that survive stop-word removal
fn analyze(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !is_stop_word(t))
        .collect()
}

/// Fitted TF-IDF state: sorted vocabulary and smoothed idf per term
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    config: EncoderConfig,
    /// Column `i` of every feature vector is the term `vocabulary[i]`
    vocabulary: Vec<String>,
    idf: Vec<f32>,
}

impl TfidfVectorizer {
    /// Learn vocabulary and idf weights from a corpus.
    ///
    /// idf(t) = ln((1 + n) / (1 + df(t))) + 1
    pub fn fit<S: AsRef<str>>(documents: &[S], config: EncoderConfig) -> Result<Self> {
        let mut doc_freq: AHashMap<String, u32> = AHashMap::new();
        for doc in documents {
            let unique: AHashSet<String> = analyze(doc.as_ref()).into_iter().collect();
            for term in unique {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }

        if doc_freq.is_empty() {
            return Err(Error::EmptyCorpus);
        }

        let mut terms: Vec<(String, u32)> = doc_freq.into_iter().collect();
        terms.sort_by(|a, b| a.0.cmp(&b.0));

        let n = documents.len() as f64;
        let (vocabulary, idf) = terms
            .into_iter()
            .map(|(term, df)| {
                let idf = ((1.0 + n) / (1.0 + f64::from(df))).ln() + 1.0;
                (term, idf as f32)
            })
            .unzip();

        Ok(Self { config, vocabulary, idf })
    }

    /// Rebuild from persisted parts, checking they line up
    pub fn from_parts(
        config: EncoderConfig,
        vocabulary: Vec<String>,
        idf: Vec<f32>,
    ) -> Result<Self> {
        if vocabulary.len() != idf.len() {
            return Err(Error::BundleIntegrity(format!(
                "vocabulary has {} terms but idf has {} weights",
                vocabulary.len(),
                idf.len()
            )));
        }
        if !vocabulary.windows(2).all(|w| w[0] < w[1]) {
            return Err(Error::BundleIntegrity("vocabulary is not sorted".to_string()));
        }
        Ok(Self { config, vocabulary, idf })
    }

    #[inline]
    pub fn config(&self) -> &EncoderConfig {
        &self.config
    }

    #[inline]
    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    #[inline]
    pub fn idf(&self) -> &[f32] {
        &self.idf
    }

    #[inline]
    #[must_use]
    pub fn vocabulary_size(&self) -> usize {
        self.vocabulary.len()
    }

    /// Column index of a term
    pub fn index_of(&self, term: &str) -> Option<usize> {
        self.vocabulary
            .binary_search_by(|t| t.as_str().cmp(term))
            .ok()
    }

    /// Encode text into the fitted space. Unknown terms are ignored, so the
    /// result may be the zero vector.
    pub fn transform(&self, text: &str) -> SparseVector {
        let mut counts: AHashMap<u32, u32> = AHashMap::new();
        for token in analyze(text) {
            if let Some(i) = self.index_of(&token) {
                *counts.entry(i as u32).or_insert(0) += 1;
            }
        }

        let pairs = counts
            .into_iter()
            .map(|(i, tf)| (i, (f64::from(tf) * f64::from(self.idf[i as usize])) as f32))
            .collect();
        SparseVector::from_pairs(pairs).normalized()
    }

    /// Encode every record using this vectorizer's field list
    pub fn transform_all(&self, records: &RecordTable) -> Vec<SparseVector> {
        records
            .combined_texts(&self.config.fields)
            .iter()
            .map(|text| self.transform(text))
            .collect()
    }
}

/// Result of encoding a record table
#[derive(Debug, Clone)]
pub struct Encoded {
    pub vectorizer: TfidfVectorizer,
    /// One vector per record, in table order
    pub features: Vec<SparseVector>,
}

/// Fit a vectorizer on the combined text of `records` and encode every row
pub fn encode(records: &RecordTable, config: &EncoderConfig) -> Result<Encoded> {
    let texts = records.combined_texts(&config.fields);
    let vectorizer = TfidfVectorizer::fit(&texts, config.clone())?;
    let features: Vec<SparseVector> = texts.iter().map(|t| vectorizer.transform(t)).collect();

    debug!(
        records = records.len(),
        vocabulary = vectorizer.vocabulary_size(),
        zero_vectors = features.iter().filter(|v| v.is_zero()).count(),
        "encoded record table"
    );

    Ok(Encoded { vectorizer, features })
}
