//! Error types for wordvectors.

use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while ingesting, training or querying.
#[derive(Debug, Error)]
pub enum Error {
    /// The corpus root or one of its files does not exist.
    #[error("path not found: {}", path.display())]
    NotFound { path: PathBuf },

    /// Any other I/O failure, tagged with the path being touched.
    #[error("io error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// File content is not valid under the configured encoding.
    #[error("{} is not valid {encoding}", path.display())]
    Decode {
        path: PathBuf,
        encoding: &'static str,
    },

    /// The configured encoding label is not one encoding_rs knows.
    #[error("unknown text encoding: {0:?}")]
    UnknownEncoding(String),

    /// No file under the root matched the extension filter.
    #[error("no files ending in {extension:?} under {}", root.display())]
    EmptyCorpus { root: PathBuf, extension: String },

    /// No word survived the `min_count` cut.
    #[error("vocabulary is empty (min_count = {min_count})")]
    EmptyVocabulary { min_count: usize },

    #[error("word {0:?} not in vocabulary")]
    WordNotInVocabulary(String),

    /// A query was made without any usable input word.
    #[error("cannot compute similarity with no input words")]
    EmptyQuery,

    /// The model carries no output layer (it was loaded from a vector file).
    #[error("model has no output weights; it must be trained in this process")]
    MissingOutputWeights,

    #[error("invalid vector file {} at line {line}: {reason}", path.display())]
    VectorFormat {
        path: PathBuf,
        line: usize,
        reason: String,
    },

    /// A line of a word-pair or analogy file could not be parsed.
    #[error("malformed line {line} in {}: {content:?}", path.display())]
    Malformed {
        path: PathBuf,
        line: usize,
        content: String,
    },

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("configuration error: {0}")]
    Config(#[from] toml::de::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Wrap an `io::Error`, promoting `NotFound` to its own variant.
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        if source.kind() == std::io::ErrorKind::NotFound {
            Error::NotFound { path }
        } else {
            Error::Io { path, source }
        }
    }
}

/// Result type for wordvectors operations.
pub type Result<T> = std::result::Result<T, Error>;
