use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use wordvectors::{config::ClusteringConfig, Architecture, TrainingParams};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// TOML configuration file; every key is optional.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Increase verbosity. Can be used multiple times (e.g., -v, -vv, -vvv).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

#[derive(Args, Debug)]
pub struct CorpusArgs {
    /// Directory searched recursively for documents
    pub root: PathBuf,

    /// File name suffix to read, e.g. ".txt"
    #[arg(long)]
    pub extension: Option<String>,

    /// Text encoding of the documents, e.g. "utf-8" or "windows-1252"
    #[arg(long)]
    pub encoding: Option<String>,

    /// Drop English stop words after cleaning
    #[arg(long)]
    pub remove_stop_words: bool,
}

#[derive(Args, Debug)]
pub struct TrainArgs {
    #[arg(long)]
    pub vector_size: Option<usize>,

    #[arg(long)]
    pub window: Option<usize>,

    #[arg(long)]
    pub min_count: Option<usize>,

    #[arg(long)]
    pub epochs: Option<usize>,

    #[arg(long, value_enum)]
    pub architecture: Option<ArchitectureArg>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl TrainArgs {
    /// Flags given on the command line replace the configured values.
    pub fn apply(&self, mut params: TrainingParams) -> TrainingParams {
        if let Some(vector_size) = self.vector_size {
            params = params.set_vector_size(vector_size);
        }
        if let Some(window) = self.window {
            params = params.set_window(window);
        }
        if let Some(min_count) = self.min_count {
            params = params.set_min_count(min_count);
        }
        if let Some(epochs) = self.epochs {
            params = params.set_epochs(epochs);
        }
        if let Some(architecture) = self.architecture {
            params = params.set_architecture(architecture.into());
        }
        if let Some(seed) = self.seed {
            params = params.set_seed(seed);
        }
        params
    }
}

#[derive(Args, Debug)]
pub struct ClusterArgs {
    #[arg(short = 'k', long)]
    pub clusters: Option<usize>,

    #[arg(long)]
    pub max_iter: Option<usize>,

    /// Words listed per cluster
    #[arg(long)]
    pub representatives: Option<usize>,

    #[arg(long)]
    pub seed: Option<u64>,
}

impl ClusterArgs {
    pub fn apply(&self, config: &ClusteringConfig) -> ClusteringConfig {
        ClusteringConfig {
            clusters: self.clusters.unwrap_or(config.clusters),
            max_iter: self.max_iter.unwrap_or(config.max_iter),
            representatives: self.representatives.unwrap_or(config.representatives),
            seed: self.seed.or(config.seed),
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum ArchitectureArg {
    Cbow,
    SkipGram,
}

impl From<ArchitectureArg> for Architecture {
    fn from(value: ArchitectureArg) -> Self {
        match value {
            ArchitectureArg::Cbow => Architecture::Cbow,
            ArchitectureArg::SkipGram => Architecture::SkipGram,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Read and clean a corpus, then report what was found
    Clean {
        #[command(flatten)]
        corpus: CorpusArgs,
    },
    /// Most and least common words of a corpus
    Frequencies {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[arg(long, default_value_t = 30)]
        top: usize,

        /// Also write both lists as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Train a model on a corpus
    Train {
        #[command(flatten)]
        corpus: CorpusArgs,

        #[command(flatten)]
        params: TrainArgs,

        /// Write the vectors here in word2vec text format
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Context words to predict a centre word from once training is done
        #[arg(long, value_delimiter = ',')]
        predict: Vec<String>,

        #[arg(long, default_value_t = 10)]
        topn: usize,
    },
    /// Nearest words to a combination of words
    Similar {
        /// Vector file in word2vec text format
        #[arg(long)]
        vectors: PathBuf,

        /// Words added to the query
        #[arg(required = true)]
        positive: Vec<String>,

        /// Words subtracted from the query
        #[arg(short, long)]
        negative: Vec<String>,

        #[arg(long, default_value_t = 10)]
        topn: usize,
    },
    /// Cosine similarity of two words
    Similarity {
        #[arg(long)]
        vectors: PathBuf,

        first: String,

        second: String,
    },
    /// Compare word-pair similarities across models
    Evaluate {
        /// Vector files to compare; repeat the flag for each model
        #[arg(long = "vectors", required = true)]
        vectors: Vec<PathBuf>,

        /// Word pairs, one per line; the built-in list when omitted
        #[arg(long)]
        pairs: Option<PathBuf>,

        /// Also write the table as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Score a model on an analogy file
    Analogies {
        #[arg(long)]
        vectors: PathBuf,

        /// Lines of "root expected[/alternative]", grouped by ": section" headers
        analogies: PathBuf,

        #[arg(long, default_value_t = wordvectors::evaluation::ANALOGY_TOP_N)]
        topn: usize,
    },
    /// Group the vocabulary with k-means and show words near each centroid
    Cluster {
        #[arg(long)]
        vectors: PathBuf,

        #[command(flatten)]
        settings: ClusterArgs,

        /// Also write the representative words as CSV
        #[arg(long)]
        csv: Option<PathBuf>,
    },
    /// Project word vectors onto their principal components
    Project {
        #[arg(long)]
        vectors: PathBuf,

        #[arg(long, default_value_t = 3)]
        components: usize,

        /// Only print the first N words (most frequent first)
        #[arg(long)]
        limit: Option<usize>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use wordvectors::Config;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_train_flags_override_config() {
        let config = Config::load_str(
            "[training]\nvector-size = 30\nwindow = 7\nepochs = 9\nseed = 4\n",
        )
        .unwrap();
        let cli = Cli::try_parse_from([
            "wordvectors",
            "train",
            "corpus",
            "--window",
            "2",
            "--architecture",
            "skip-gram",
        ])
        .unwrap();
        let Some(Commands::Train { params, .. }) = cli.command else {
            panic!("expected the train subcommand");
        };

        let merged = params.apply(config.training);
        assert_eq!(merged.window(), 2);
        assert_eq!(merged.architecture(), Architecture::SkipGram);
        assert_eq!(merged.vector_size(), 30);
        assert_eq!(merged.epochs(), 9);
        assert_eq!(merged.min_count(), 3);
    }

    #[test]
    fn test_cluster_flags_override_config() {
        let config = Config::load_str("[clustering]\nclusters = 5\nmax-iter = 10\nseed = 1\n").unwrap();
        let cli = Cli::try_parse_from([
            "wordvectors",
            "cluster",
            "--vectors",
            "v.txt",
            "-k",
            "2",
            "--csv",
            "out.csv",
        ])
        .unwrap();
        let Some(Commands::Cluster { settings, csv, .. }) = cli.command else {
            panic!("expected the cluster subcommand");
        };

        let merged = settings.apply(&config.clustering);
        assert_eq!(merged.clusters, 2);
        assert_eq!(merged.max_iter, 10);
        assert_eq!(merged.representatives, 15);
        assert_eq!(merged.seed, Some(1));
        assert_eq!(csv, Some(PathBuf::from("out.csv")));
    }
}
