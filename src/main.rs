mod cli;
mod commands;

use clap::{CommandFactory, Parser};
use color_eyre::eyre::{Result, WrapErr};
use tracing::Level;

use wordvectors::Config;

fn main() -> Result<()> {
    color_eyre::install()?;
    let command_line = cli::Cli::parse();

    let level = match command_line.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let cfg = Config::load(command_line.config.as_deref()).wrap_err("Load configuration error")?;

    let Some(command) = command_line.command else {
        cli::Cli::command().print_help()?;
        return Ok(());
    };

    match command {
        cli::Commands::Clean { corpus } => commands::clean(&cfg, &corpus),
        cli::Commands::Frequencies { corpus, top, csv } => {
            commands::frequencies(&cfg, &corpus, top, csv.as_deref())
        }
        cli::Commands::Train {
            corpus,
            params,
            output,
            predict,
            topn,
        } => commands::train_model(&cfg, &corpus, &params, output.as_deref(), &predict, topn),
        cli::Commands::Similar {
            vectors,
            positive,
            negative,
            topn,
        } => commands::similar(&vectors, &positive, &negative, topn),
        cli::Commands::Similarity {
            vectors,
            first,
            second,
        } => commands::similarity(&vectors, &first, &second),
        cli::Commands::Evaluate {
            vectors,
            pairs,
            csv,
        } => commands::evaluate(&vectors, pairs.as_deref(), csv.as_deref()),
        cli::Commands::Analogies {
            vectors,
            analogies,
            topn,
        } => commands::analogies(&vectors, &analogies, topn),
        cli::Commands::Cluster {
            vectors,
            settings,
            csv,
        } => commands::cluster(&cfg, &vectors, &settings, csv.as_deref()),
        cli::Commands::Project {
            vectors,
            components,
            limit,
        } => commands::project(&vectors, components, limit),
    }
}
