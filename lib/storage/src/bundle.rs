//! Model bundle
//!
//! The single unit produced by a training run: encoder state, feature
//! vectors, similarity matrix and the cleaned record table. The parts are
//! only ever created, saved and loaded together.

use chrono::{DateTime, Utc};
use furnrec_core::{Error, RecordTable, Result, SparseVector};
use furnrec_similarity::{encode, EncoderConfig, Recommender, SimilarityMatrix, TfidfVectorizer};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::info;

/// Bumped whenever the persisted layout changes
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelBundle {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    vectorizer: TfidfVectorizer,
    features: Vec<SparseVector>,
    similarity: SimilarityMatrix,
    records: RecordTable,
    /// SHA-256 over all of the above, ties every part to the same training run
    fingerprint: String,
}

/// Summary of a training run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrainingSummary {
    pub records: usize,
    pub vocabulary: usize,
    pub zero_vectors: usize,
    pub fingerprint: String,
}

/// SHA-256 hex digest over the JSON form of every trained part. Reordering
/// any one part against the others changes the digest.
pub fn fingerprint(
    vectorizer: &TfidfVectorizer,
    features: &[SparseVector],
    similarity: &SimilarityMatrix,
    records: &RecordTable,
) -> Result<String> {
    let mut hasher = Sha256::new();
    hash_part(&mut hasher, vectorizer)?;
    hash_part(&mut hasher, features)?;
    hash_part(&mut hasher, similarity)?;
    hash_part(&mut hasher, records)?;
    Ok(format!("{:x}", hasher.finalize()))
}

// Length-prefixed so part boundaries cannot shift
fn hash_part<T: Serialize + ?Sized>(hasher: &mut Sha256, part: &T) -> Result<()> {
    let json = serde_json::to_vec(part).map_err(|e| Error::Serialization(e.to_string()))?;
    hasher.update((json.len() as u64).to_le_bytes());
    hasher.update(&json);
    Ok(())
}

impl ModelBundle {
    /// Encode, compute similarities and seal the result.
    ///
    /// Fails with [`Error::EmptyCorpus`] before anything is built when the
    /// table yields no vocabulary.
    pub fn train(records: RecordTable, config: &EncoderConfig) -> Result<Self> {
        info!("Training recommendation model on {} records", records.len());
        let encoded = encode(&records, config)?;
        let similarity = SimilarityMatrix::build(&encoded.features);
        let fingerprint =
            fingerprint(&encoded.vectorizer, &encoded.features, &similarity, &records)?;

        let bundle = Self {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
            vectorizer: encoded.vectorizer,
            features: encoded.features,
            similarity,
            records,
            fingerprint,
        };
        bundle.validate()?;

        info!(
            "Model trained: {} terms, {}x{} similarity matrix",
            bundle.vectorizer.vocabulary_size(),
            bundle.similarity.dim(),
            bundle.similarity.dim()
        );
        Ok(bundle)
    }

    /// Check that every part belongs to the same training run
    pub fn validate(&self) -> Result<()> {
        if self.schema_version != SCHEMA_VERSION {
            return Err(Error::BundleIntegrity(format!(
                "unsupported schema version {} (expected {})",
                self.schema_version, SCHEMA_VERSION
            )));
        }

        let n = self.records.len();
        if self.features.len() != n || self.similarity.dim() != n {
            return Err(Error::BundleIntegrity(format!(
                "{} records, {} feature vectors, {}x{} similarity matrix",
                n,
                self.features.len(),
                self.similarity.dim(),
                self.similarity.dim()
            )));
        }

        TfidfVectorizer::from_parts(
            self.vectorizer.config().clone(),
            self.vectorizer.vocabulary().to_vec(),
            self.vectorizer.idf().to_vec(),
        )?;
        let vocab = self.vectorizer.vocabulary_size();
        if let Some(row) = self.features.iter().position(|v| v.min_dim() > vocab) {
            return Err(Error::BundleIntegrity(format!(
                "feature vector {} references a term outside the {}-term vocabulary",
                row, vocab
            )));
        }

        self.similarity.validate()?;

        let reencoded = self.vectorizer.transform_all(&self.records);
        if let Some(row) = (0..n).find(|&i| reencoded[i] != self.features[i]) {
            return Err(Error::BundleIntegrity(format!(
                "feature vector {} does not encode record {}",
                row, row
            )));
        }
        if SimilarityMatrix::build(&self.features) != self.similarity {
            return Err(Error::BundleIntegrity(
                "similarity matrix does not match the feature vectors".to_string(),
            ));
        }

        let expected =
            fingerprint(&self.vectorizer, &self.features, &self.similarity, &self.records)?;
        if expected != self.fingerprint {
            return Err(Error::BundleIntegrity(
                "bundle parts do not match the fingerprint they were trained with".to_string(),
            ));
        }
        Ok(())
    }

    /// Query interface over this bundle, free-text queries included
    pub fn recommender(&self) -> Result<Recommender<'_>> {
        Recommender::new(&self.records, &self.similarity)?
            .with_encoder(&self.vectorizer, &self.features)
    }

    #[inline]
    pub fn records(&self) -> &RecordTable {
        &self.records
    }

    #[inline]
    pub fn similarity(&self) -> &SimilarityMatrix {
        &self.similarity
    }

    #[inline]
    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    #[inline]
    pub fn features(&self) -> &[SparseVector] {
        &self.features
    }

    #[inline]
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    pub fn summary(&self) -> TrainingSummary {
        TrainingSummary {
            records: self.records.len(),
            vocabulary: self.vectorizer.vocabulary_size(),
            zero_vectors: self.features.iter().filter(|v| v.is_zero()).count(),
            fingerprint: self.fingerprint.clone(),
        }
    }
}
