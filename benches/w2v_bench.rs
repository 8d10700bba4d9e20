use criterion::{
    black_box, criterion_group, criterion_main, measurement::WallTime, BenchmarkGroup, BenchmarkId,
    Criterion,
};
use pprof::criterion::{Output, PProfProfiler};
use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};
use std::time::Duration;
use wordvectors::{clean_corpus, train, Architecture, TrainingParams};

const WORDS: &[&str] = &[
    "data", "science", "statistics", "machine", "learning", "model", "vector", "word", "corpus",
    "the", "of", "and", "a", "to", "in", "is", "with", "for", "on", "that",
];

fn set_default_benchmark_configs(benchmark: &mut BenchmarkGroup<WallTime>) {
    benchmark
        .sample_size(20)
        .measurement_time(Duration::new(10, 0))
        .confidence_level(0.97)
        .warm_up_time(Duration::new(3, 0))
        .noise_threshold(0.05);
}

/// Documents of random words with punctuation and capitals mixed in.
fn synthetic_documents(documents: usize, words_per_document: usize) -> Vec<String> {
    let mut rng = StdRng::seed_from_u64(42);
    (0..documents)
        .map(|_| {
            (0..words_per_document)
                .map(|i| {
                    let word = WORDS.choose(&mut rng).copied().unwrap_or("word");
                    match i % 7 {
                        0 => word.to_uppercase(),
                        3 => format!("{word},"),
                        6 => format!("{word}."),
                        _ => word.to_string(),
                    }
                })
                .collect::<Vec<_>>()
                .join(" ")
        })
        .collect()
}

fn bench(c: &mut Criterion) {
    let mut benchmark = c.benchmark_group("w2v");
    set_default_benchmark_configs(&mut benchmark);

    let raw = synthetic_documents(200, 500);
    let cleaned = clean_corpus(&raw);

    benchmark.bench_function(BenchmarkId::new("Bench text processing", "synthetic"), |bencher| {
        bencher.iter(|| clean_corpus(black_box(&raw)));
    });

    for (name, architecture) in [("cbow", Architecture::Cbow), ("skip-gram", Architecture::SkipGram)] {
        let params = TrainingParams::default()
            .set_vector_size(50)
            .set_epochs(1)
            .set_min_count(1)
            .set_seed(1)
            .set_architecture(architecture);
        benchmark.bench_function(BenchmarkId::new("Bench training", name), |bencher| {
            bencher.iter(|| train(black_box(&cleaned), &params));
        });
    }
}

criterion_group! {
    name = benches;
    config = Criterion::default().with_profiler(PProfProfiler::new(500, Output::Flamegraph(None)));
    targets = bench
}

criterion_main!(benches);
