use serde::Deserialize;
use std::path::Path;

use crate::{
    algo::TrainingParams,
    corpus::{DEFAULT_ENCODING, DEFAULT_EXTENSION},
    error::{Error, Result},
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct Config {
    pub corpus: CorpusConfig,
    pub training: TrainingParams,
    pub clustering: ClusteringConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct CorpusConfig {
    /// Suffix a file name must end with to be read.
    pub extension: String,
    /// encoding_rs label of the corpus files.
    pub encoding: String,
    pub remove_stop_words: bool,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            extension: DEFAULT_EXTENSION.to_string(),
            encoding: DEFAULT_ENCODING.to_string(),
            remove_stop_words: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct ClusteringConfig {
    pub clusters: usize,
    pub max_iter: usize,
    /// Words listed per cluster.
    pub representatives: usize,
    pub seed: Option<u64>,
}

impl Default for ClusteringConfig {
    fn default() -> Self {
        Self {
            clusters: 3,
            max_iter: 40,
            representatives: 15,
            seed: None,
        }
    }
}

impl Config {
    pub fn load_str(user_config_str: &str) -> Result<Config> {
        let user_config: Config = toml::from_str(user_config_str)?;
        Ok(user_config)
    }

    /// Read the TOML file at `path`, or fall back to the defaults.
    pub fn load(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
                tracing::debug!(path = %path.display(), "loaded configuration");
                Self::load_str(&text)
            }
            None => Ok(Config::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::Architecture;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = Config::load_str("").unwrap();
        assert_eq!(config.corpus.extension, ".txt");
        assert_eq!(config.corpus.encoding, "utf-8");
        assert!(!config.corpus.remove_stop_words);
        assert_eq!(config.training.vector_size(), 100);
        assert_eq!(config.training.min_count(), 3);
        assert_eq!(config.clustering.clusters, 3);
    }

    #[test]
    fn test_partial_config() {
        let config = Config::load_str(
            r#"
[corpus]
extension = ".md"
remove-stop-words = true

[training]
vector-size = 25
architecture = "skip-gram"
seed = 9

[clustering]
max-iter = 5
"#,
        )
        .unwrap();
        assert_eq!(config.corpus.extension, ".md");
        assert_eq!(config.corpus.encoding, "utf-8");
        assert!(config.corpus.remove_stop_words);
        assert_eq!(config.training.vector_size(), 25);
        assert_eq!(config.training.window(), 5);
        assert_eq!(config.training.architecture(), Architecture::SkipGram);
        assert_eq!(config.clustering.max_iter, 5);
        assert_eq!(config.clustering.clusters, 3);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        assert!(matches!(
            Config::load_str("[training]\nwindw = 3\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_missing_config_file() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        assert!(Config::load(None).is_ok());
    }
}
