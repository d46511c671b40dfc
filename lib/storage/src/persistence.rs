use atomicwrites::{AtomicFile, OverwriteBehavior};
use furnrec_core::{Error, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::bundle::ModelBundle;

/// Reads and writes a model bundle at a fixed path
#[derive(Debug, Clone)]
pub struct BundleStore {
    path: PathBuf,
}

impl BundleStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Validate, then replace the file atomically.
    /// A reader never observes a partially written bundle.
    pub fn save(&self, bundle: &ModelBundle) -> Result<()> {
        bundle.validate()?;

        let data = bincode::serialize(bundle).map_err(|e| Error::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        AtomicFile::new(&self.path, OverwriteBehavior::AllowOverwrite)
            .write(|f| f.write_all(&data))
            .map_err(|e| match e {
                atomicwrites::Error::Internal(e) | atomicwrites::Error::User(e) => Error::Io(e),
            })?;

        info!("Model bundle saved to {:?} ({} bytes)", self.path, data.len());
        Ok(())
    }

    /// Decode and validate. Refuses to return a bundle whose parts disagree.
    pub fn load(&self) -> Result<ModelBundle> {
        let data = std::fs::read(&self.path)?;
        let bundle: ModelBundle =
            bincode::deserialize(&data).map_err(|e| Error::Serialization(e.to_string()))?;
        bundle.validate()?;

        info!(
            "Model bundle loaded from {:?}: {} records, trained {}",
            self.path,
            bundle.records().len(),
            bundle.created_at
        );
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bundle::tests::records;
    use furnrec_similarity::EncoderConfig;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = BundleStore::new(dir.path().join("models").join("model.bin"));
        let bundle = ModelBundle::train(records(), &EncoderConfig::default()).unwrap();

        store.save(&bundle).unwrap();
        assert!(store.exists());

        let loaded = store.load().unwrap();
        assert_eq!(loaded.records(), bundle.records());
        assert_eq!(loaded.similarity(), bundle.similarity());
        assert_eq!(loaded.vectorizer(), bundle.vectorizer());
        assert_eq!(loaded.fingerprint(), bundle.fingerprint());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempdir().unwrap();
        let store = BundleStore::new(dir.path().join("absent.bin"));
        assert!(matches!(store.load(), Err(Error::Io(_))));
    }

    #[test]
    fn test_load_garbage() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("model.bin");
        std::fs::write(&path, b"not a bundle").unwrap();
        assert!(matches!(BundleStore::new(&path).load(), Err(Error::Serialization(_))));
    }
}
