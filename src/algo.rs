use rand::{
    distributions::{Distribution, WeightedIndex},
    rngs::StdRng,
    Rng, SeedableRng,
};
use rand_distr::Normal;
use serde::Deserialize;
use std::ops::Neg;

use crate::{
    error::{Error, Result},
    model::Word2VecModel,
    vocab::Vocabulary,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Architecture {
    /// Predict the centre word from the mean of its context.
    #[default]
    Cbow,
    /// Predict the centre word from each context word on its own.
    SkipGram,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case", default, deny_unknown_fields)]
pub struct TrainingParams {
    vector_size: usize, // 25 to 1000, larger corpora want more
    window: usize,
    min_count: usize,
    epochs: usize,
    negative: usize,
    learning_rate: f32,
    min_learning_rate: f32,
    architecture: Architecture,
    mean: f32,
    std_dev: f32,
    seed: Option<u64>,
}

impl Default for TrainingParams {
    fn default() -> Self {
        Self {
            vector_size: 100,
            window: 5,
            min_count: 3,
            epochs: 5,
            negative: 5,
            learning_rate: 0.025,
            min_learning_rate: 0.0001,
            architecture: Architecture::Cbow,
            mean: 0.0,
            std_dev: 0.01,
            seed: None,
        }
    }
}

impl TrainingParams {
    pub fn set_vector_size(mut self, vector_size: usize) -> Self {
        self.vector_size = vector_size;
        self
    }
    pub fn vector_size(&self) -> usize {
        self.vector_size
    }
    pub fn set_window(mut self, window: usize) -> Self {
        self.window = window;
        self
    }
    pub fn window(&self) -> usize {
        self.window
    }
    pub fn set_min_count(mut self, min_count: usize) -> Self {
        self.min_count = min_count;
        self
    }
    pub fn min_count(&self) -> usize {
        self.min_count
    }
    pub fn set_epochs(mut self, epochs: usize) -> Self {
        self.epochs = epochs;
        self
    }
    pub fn epochs(&self) -> usize {
        self.epochs
    }
    pub fn set_negative(mut self, negative: usize) -> Self {
        self.negative = negative;
        self
    }
    pub fn set_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }
    pub fn set_min_learning_rate(mut self, min_learning_rate: f32) -> Self {
        self.min_learning_rate = min_learning_rate;
        self
    }
    pub fn set_architecture(mut self, architecture: Architecture) -> Self {
        self.architecture = architecture;
        self
    }
    pub fn architecture(&self) -> Architecture {
        self.architecture
    }
    pub fn set_mean(mut self, mean: f32) -> Self {
        self.mean = mean;
        self
    }
    pub fn set_std_dev(mut self, std_dev: f32) -> Self {
        self.std_dev = std_dev;
        self
    }
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.vector_size == 0 {
            return Err(Error::InvalidParameter("vector-size must be positive".into()));
        }
        if self.window == 0 {
            return Err(Error::InvalidParameter("window must be positive".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(Error::InvalidParameter(format!(
                "learning-rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if !(self.min_learning_rate.is_finite() && self.min_learning_rate >= 0.0) {
            return Err(Error::InvalidParameter(format!(
                "min-learning-rate must not be negative, got {}",
                self.min_learning_rate
            )));
        }
        Ok(())
    }

    /// Learning rate for `epoch`, decaying linearly towards `min_learning_rate`.
    pub fn learning_rate_at(&self, epoch: usize) -> f32 {
        if self.epochs == 0 {
            return self.learning_rate;
        }
        let progress = epoch as f32 / self.epochs as f32;
        let rate = self.learning_rate - (self.learning_rate - self.min_learning_rate) * progress;
        rate.max(self.min_learning_rate)
    }

    fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }

    /// Input weights drawn from N(mean, std_dev), output weights at zero.
    pub fn create_matrices<R: Rng>(
        &self,
        vocab_size: usize,
        rng: &mut R,
    ) -> Result<(Vec<f32>, Vec<f32>)> {
        let normal = Normal::new(self.mean, self.std_dev).map_err(|e| {
            Error::InvalidParameter(format!("initial weight distribution: {e}"))
        })?;
        let input_matrix: Vec<f32> = (0..vocab_size * self.vector_size)
            .map(|_| normal.sample(&mut *rng))
            .collect();
        let output_matrix = vec![0.0; vocab_size * self.vector_size];

        Ok((input_matrix, output_matrix))
    }

    /// One `(context, target)` pair per position of `document`. The context is
    /// up to `window` neighbours on each side; it never leaves the document.
    pub fn generate_pairs(&self, document: &[usize]) -> Vec<(Vec<usize>, usize)> {
        (0..document.len())
            .filter_map(|position| {
                let start = position.saturating_sub(self.window);
                let end = (position + self.window + 1).min(document.len());
                let context: Vec<usize> = document[start..position]
                    .iter()
                    .chain(&document[position + 1..end])
                    .copied()
                    .collect();
                (!context.is_empty()).then_some((context, document[position]))
            })
            .collect()
    }
}

/// Per-epoch losses and sizes, for reporting.
#[derive(Debug, Clone, Default)]
pub struct TrainingReport {
    pub vocab_size: usize,
    pub pairs: usize,
    pub epoch_losses: Vec<f32>,
}

/// Draws negatives from the unigram distribution raised to 3/4.
struct NegativeSampler {
    table: WeightedIndex<f64>,
}

impl NegativeSampler {
    fn new(counts: &[usize]) -> Result<Self> {
        let table = WeightedIndex::new(counts.iter().map(|&c| (c as f64).powf(0.75)))
            .map_err(|e| Error::InvalidParameter(format!("negative sampling table: {e}")))?;
        Ok(Self { table })
    }

    fn draw<R: Rng>(&self, target: usize, n: usize, rng: &mut R, out: &mut Vec<usize>) {
        out.clear();
        out.extend(
            (0..n)
                .map(|_| self.table.sample(&mut *rng))
                .filter(|&word| word != target),
        );
    }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + x.neg().exp())
}

/// Score `neu1` against the target and each negative, update their output
/// rows, and leave the gradient for the input side in `neu1e`.
fn negative_sampling(
    neu1: &[f32],
    target: usize,
    negatives: &[usize],
    learning_rate: f32,
    output_layer: &mut [f32],
    neu1e: &mut [f32],
) -> f32 {
    let dim = neu1.len();
    let mut loss = 0.0;

    // positive sampling
    let target_l2 = target * dim;
    let f = neu1
        .iter()
        .enumerate()
        .map(|(i, v)| v * output_layer[i + target_l2])
        .sum::<f32>();

    let sig = sigmoid(f);
    loss += -sig.ln();
    let g = (1.0 - sig) * learning_rate;

    for c in 0..dim {
        neu1e[c] = g * output_layer[c + target_l2];
        output_layer[c + target_l2] += g * neu1[c];
    }

    for &negative_target in negatives {
        let l2 = negative_target * dim;
        let f: f32 = neu1
            .iter()
            .enumerate()
            .map(|(i, v)| v * output_layer[i + l2])
            .sum();

        let sig = sigmoid(f);
        loss += -(1.0 - sig).ln();
        let g = (0.0 - sig) * learning_rate;

        for c in 0..dim {
            neu1e[c] += g * output_layer[c + l2];
            output_layer[c + l2] += g * neu1[c];
        }
    }

    loss
}

#[allow(clippy::too_many_arguments)]
fn cbow_pass(
    context: &[usize],
    target: usize,
    negatives: &[usize],
    learning_rate: f32,
    input_layer: &mut [f32],
    output_layer: &mut [f32],
    neu1: &mut [f32],
    neu1e: &mut [f32],
) -> f32 {
    let dim = neu1.len();

    // pass the input layer to the hidden layer
    for position in 0..dim {
        let mut f = 0.0;
        for context_index in context {
            f += &input_layer[position + *context_index * dim];
        }
        neu1[position] = f / context.len() as f32;
    }

    let loss = negative_sampling(neu1, target, negatives, learning_rate, output_layer, neu1e);

    // backpropagation, pass the hidden layer to the input layer
    context.iter().for_each(|context_index| {
        neu1e.iter().enumerate().for_each(|(k, v)| {
            input_layer[k + context_index * dim] += v;
        })
    });

    loss
}

#[allow(clippy::too_many_arguments)]
fn skip_gram_pass(
    context: &[usize],
    target: usize,
    negatives: &[usize],
    learning_rate: f32,
    input_layer: &mut [f32],
    output_layer: &mut [f32],
    neu1: &mut [f32],
    neu1e: &mut [f32],
) -> f32 {
    let dim = neu1.len();
    let mut loss = 0.0;

    for &context_index in context {
        let row = context_index * dim;
        neu1.copy_from_slice(&input_layer[row..row + dim]);
        loss += negative_sampling(neu1, target, negatives, learning_rate, output_layer, neu1e);
        for (k, v) in neu1e.iter().enumerate() {
            input_layer[row + k] += v;
        }
    }

    loss
}

/// Build a vocabulary over `sequences` and train a model on it.
pub fn train(
    sequences: &[Vec<String>],
    params: &TrainingParams,
) -> Result<(Word2VecModel, TrainingReport)> {
    params.validate()?;

    let vocab = Vocabulary::build(sequences, params.min_count);
    if vocab.is_empty() {
        return Err(Error::EmptyVocabulary {
            min_count: params.min_count,
        });
    }

    let dim = params.vector_size;
    let mut rng = params.rng();
    let (mut input_layer, mut output_layer) = params.create_matrices(vocab.len(), &mut rng)?;
    let sampler = NegativeSampler::new(vocab.counts())?;

    let pairs: Vec<(Vec<usize>, usize)> = sequences
        .iter()
        .flat_map(|sequence| params.generate_pairs(&vocab.encode(sequence)))
        .collect();

    tracing::info!(
        vocab_size = vocab.len(),
        pairs = pairs.len(),
        architecture = ?params.architecture,
        "Starting training"
    );

    let mut neu1 = vec![0.0; dim];
    let mut neu1e = vec![0.0; dim];
    let mut negatives = Vec::with_capacity(params.negative);
    let mut report = TrainingReport {
        vocab_size: vocab.len(),
        pairs: pairs.len(),
        epoch_losses: Vec::with_capacity(params.epochs),
    };

    for epoch in 0..params.epochs {
        let learning_rate = params.learning_rate_at(epoch);
        let mut epoch_loss = 0.0;
        for (context, target) in &pairs {
            sampler.draw(*target, params.negative, &mut rng, &mut negatives);
            let pass = match params.architecture {
                Architecture::Cbow => cbow_pass,
                Architecture::SkipGram => skip_gram_pass,
            };
            epoch_loss += pass(
                context,
                *target,
                &negatives,
                learning_rate,
                &mut input_layer,
                &mut output_layer,
                &mut neu1,
                &mut neu1e,
            );
        }
        tracing::info!(epoch = epoch, epoch_loss = epoch_loss, learning_rate, "Training epoch");
        report.epoch_losses.push(epoch_loss);
    }

    let model = Word2VecModel::new(vocab, input_layer, Some(output_layer), dim);
    Ok((model, report))
}
