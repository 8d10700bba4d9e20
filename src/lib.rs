//! Train, query and evaluate Word2Vec embeddings over a directory of plain
//! text documents.
//!
//! The pipeline is: [`corpus::ingest`] a directory into cleaned token
//! sequences, [`algo::train`] a [`Word2VecModel`] on them, then query it
//! directly, score it with [`evaluation`], or explore it with [`analysis`].

pub mod algo;
pub mod analysis;
pub mod config;
pub mod corpus;
pub mod error;
pub mod evaluation;
pub mod export;
pub mod model;
pub mod vocab;

pub use algo::{train, Architecture, TrainingParams, TrainingReport};
pub use config::Config;
pub use corpus::{clean_corpus, clean_text, enumerate_files, ingest, read_all, TokenizedCorpus};
pub use error::{Error, Result};
pub use model::Word2VecModel;
pub use vocab::{Vocabulary, WordFrequencies};
