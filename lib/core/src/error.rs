use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Empty corpus: no usable vocabulary after stop-word removal")]
    EmptyCorpus,

    #[error("Anchor not found: no record with {field} = {value:?}")]
    AnchorNotFound { field: String, value: String },

    #[error("Bundle integrity error: {0}")]
    BundleIntegrity(String),

    #[error("Missing required column: {0}")]
    MissingColumn(String),

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl Error {
    pub fn anchor_not_found(field: impl ToString, value: impl Into<String>) -> Self {
        Error::AnchorNotFound {
            field: field.to_string(),
            value: value.into(),
        }
    }
}
