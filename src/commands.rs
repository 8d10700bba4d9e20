use color_eyre::eyre::{Result, WrapErr};
use std::{
    fs::File,
    path::{Path, PathBuf},
};

use wordvectors::{
    analysis,
    config::Config,
    corpus::{self, TokenizedCorpus},
    evaluation, export, train, vocab, Word2VecModel, WordFrequencies,
};

use crate::cli::{ClusterArgs, CorpusArgs, TrainArgs};

fn load_corpus(cfg: &Config, args: &CorpusArgs) -> Result<TokenizedCorpus> {
    let extension = args.extension.as_deref().unwrap_or(&cfg.corpus.extension);
    let encoding = corpus::resolve_encoding(
        args.encoding.as_deref().unwrap_or(&cfg.corpus.encoding),
    )?;

    let mut tokenized = corpus::ingest(&args.root, extension, encoding)
        .wrap_err_with(|| format!("Reading corpus under {}", args.root.display()))?;
    if args.remove_stop_words || cfg.corpus.remove_stop_words {
        vocab::strip_stop_words(&mut tokenized.documents);
    }
    Ok(tokenized)
}

fn load_model(path: &Path) -> Result<Word2VecModel> {
    Word2VecModel::load_text(path)
        .wrap_err_with(|| format!("Loading vectors from {}", path.display()))
}

fn print_ranked(results: &[(String, f32)]) {
    for (word, score) in results {
        println!("{word:<20} {score:.4}");
    }
}

pub fn clean(cfg: &Config, args: &CorpusArgs) -> Result<()> {
    let tokenized = load_corpus(cfg, args)?;
    for (path, tokens) in tokenized.paths.iter().zip(&tokenized.documents) {
        println!("{}: {} tokens", path.display(), tokens.len());
    }
    println!(
        "{} documents, {} tokens",
        tokenized.len(),
        tokenized.token_count()
    );
    Ok(())
}

pub fn frequencies(cfg: &Config, args: &CorpusArgs, top: usize, csv: Option<&Path>) -> Result<()> {
    let tokenized = load_corpus(cfg, args)?;
    let frequencies = WordFrequencies::from_sequences(&tokenized.documents);
    println!(
        "{} distinct words, {} tokens",
        frequencies.distinct(),
        frequencies.total()
    );

    println!("\nmost common:");
    for (word, count) in frequencies.most_common(top) {
        println!("{word:<20} {count}");
    }
    println!("\nleast common:");
    for (word, count) in frequencies.least_common(top) {
        println!("{word:<20} {count}");
    }

    if let Some(csv) = csv {
        export::write_csv_file(csv, &frequencies.report(top))
            .wrap_err_with(|| format!("Writing {}", csv.display()))?;
        println!("frequencies written to {}", csv.display());
    }
    Ok(())
}

pub fn train_model(
    cfg: &Config,
    args: &CorpusArgs,
    overrides: &TrainArgs,
    output: Option<&Path>,
    predict: &[String],
    topn: usize,
) -> Result<()> {
    let tokenized = load_corpus(cfg, args)?;

    let params = overrides.apply(cfg.training.clone());

    let (model, report) = train(&tokenized.documents, &params).wrap_err("Training failed")?;
    println!(
        "trained {} words on {} pairs",
        report.vocab_size, report.pairs
    );
    for (epoch, loss) in report.epoch_losses.iter().enumerate() {
        println!("epoch {:>3}: loss {loss:.4}", epoch + 1);
    }

    if !predict.is_empty() {
        let context: Vec<&str> = predict.iter().map(String::as_str).collect();
        println!("\npredicted for {}:", predict.join(" "));
        print_ranked(&model.predict_output_word(&context, topn)?);
    }

    if let Some(output) = output {
        model
            .save_text(output)
            .wrap_err_with(|| format!("Saving vectors to {}", output.display()))?;
        println!("vectors written to {}", output.display());
    }
    Ok(())
}

pub fn similar(vectors: &Path, positive: &[String], negative: &[String], topn: usize) -> Result<()> {
    let model = load_model(vectors)?;
    let positive: Vec<&str> = positive.iter().map(String::as_str).collect();
    let negative: Vec<&str> = negative.iter().map(String::as_str).collect();
    print_ranked(&model.most_similar(&positive, &negative, topn)?);
    Ok(())
}

pub fn similarity(vectors: &Path, first: &str, second: &str) -> Result<()> {
    let model = load_model(vectors)?;
    println!("{:.4}", model.similarity(first, second)?);
    Ok(())
}

pub fn evaluate(vectors: &[PathBuf], pairs: Option<&Path>, csv: Option<&Path>) -> Result<()> {
    let pairs = match pairs {
        Some(path) => evaluation::load_pairs(path)?,
        None => evaluation::default_pairs(),
    };

    let mut names = Vec::with_capacity(vectors.len());
    let mut models = Vec::with_capacity(vectors.len());
    for path in vectors {
        names.push(path.display().to_string());
        models.push(load_model(path)?);
    }
    let named: Vec<(&str, &Word2VecModel)> =
        names.iter().map(String::as_str).zip(&models).collect();

    let scores = evaluation::evaluate_pairs(&named, &pairs);
    for score in &scores {
        let similarity = match score.similarity {
            Some(value) => format!("{value:.4}"),
            None => "-".to_string(),
        };
        println!(
            "{:<30} {:<15} {:<15} {similarity}",
            score.model, score.first, score.second
        );
    }

    if let Some(csv) = csv {
        let file = File::create(csv).wrap_err_with(|| format!("Creating {}", csv.display()))?;
        evaluation::write_pair_scores_csv(file, &scores)?;
        println!("scores written to {}", csv.display());
    }
    Ok(())
}

pub fn analogies(vectors: &Path, file: &Path, topn: usize) -> Result<()> {
    let model = load_model(vectors)?;
    let sections = evaluation::load_analogies(file)?;
    let report = evaluation::evaluate_analogies(&model, &sections, topn)?;

    for section in &report.sections {
        println!(
            "{:<30} {:>4}/{:<4} {:.3}",
            section.name,
            section.correct.len(),
            section.total(),
            section.score()
        );
    }
    println!(
        "\ntotal {:.3} over {} questions, {:.1}% out of vocabulary",
        report.total_score(),
        report.questions,
        report.oov_ratio() * 100.0
    );
    Ok(())
}

pub fn cluster(cfg: &Config, vectors: &Path, args: &ClusterArgs, csv: Option<&Path>) -> Result<()> {
    let settings = args.apply(&cfg.clustering);
    let model = load_model(vectors)?;
    let data = model.vectors();
    let clustering = analysis::kmeans(
        data.view(),
        settings.clusters,
        settings.max_iter,
        settings.seed,
    )?;
    println!(
        "{} iterations, inertia {:.4}",
        clustering.iterations, clustering.inertia
    );

    let summaries =
        analysis::cluster_representatives(&model, &clustering, settings.representatives)?;
    for summary in &summaries {
        let words: Vec<&str> = summary
            .representatives
            .iter()
            .map(|(word, _)| word.as_str())
            .collect();
        println!(
            "cluster {} ({} words): {}",
            summary.cluster,
            summary.size,
            words.join(", ")
        );
    }

    if let Some(csv) = csv {
        export::write_csv_file(csv, &analysis::cluster_rows(&summaries))
            .wrap_err_with(|| format!("Writing {}", csv.display()))?;
        println!("clusters written to {}", csv.display());
    }
    Ok(())
}

pub fn project(vectors: &Path, components: usize, limit: Option<usize>) -> Result<()> {
    let model = load_model(vectors)?;
    let data = model.vectors();
    let data = analysis::head(data.view(), limit);
    let projection = analysis::pca(data, components)?;

    let explained: Vec<String> = projection
        .explained_variance
        .iter()
        .map(|v| format!("{v:.4}"))
        .collect();
    println!("explained variance: {}", explained.join(" "));

    for (word, row) in model.vocab().words().iter().zip(projection.coordinates.rows()) {
        let coordinates: Vec<String> = row.iter().map(|v| format!("{v:>9.4}")).collect();
        println!("{word:<20} {}", coordinates.join(" "));
    }
    Ok(())
}
