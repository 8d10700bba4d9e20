use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Remove English stop words from every sequence, in place.
pub fn strip_stop_words(sequences: &mut [Vec<String>]) {
    let stop_words: HashSet<String> = stop_words::get(stop_words::LANGUAGE::English)
        .iter()
        .map(|s| s.to_string())
        .collect();
    for sequence in sequences.iter_mut() {
        sequence.retain(|word| !stop_words.contains(word));
    }
}

/// Word counts over a whole corpus.
#[derive(Debug, Clone, Default)]
pub struct WordFrequencies {
    counts: HashMap<String, usize>,
}

impl WordFrequencies {
    pub fn from_sequences(sequences: &[Vec<String>]) -> Self {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for word in sequences.iter().flatten() {
            *counts.entry(word.clone()).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn get(&self, word: &str) -> usize {
        self.counts.get(word).copied().unwrap_or(0)
    }

    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Every word, most frequent first, ties in alphabetical order.
    pub fn ranked(&self) -> Vec<(String, usize)> {
        let mut ranked: Vec<(String, usize)> = self
            .counts
            .iter()
            .map(|(word, &count)| (word.clone(), count))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        ranked
    }

    pub fn most_common(&self, n: usize) -> Vec<(String, usize)> {
        let mut ranked = self.ranked();
        ranked.truncate(n);
        ranked
    }

    /// The `n` rarest words, rarest first.
    pub fn least_common(&self, n: usize) -> Vec<(String, usize)> {
        self.ranked().into_iter().rev().take(n).collect()
    }

    /// The `n` most common words followed by the `n` least common ones.
    pub fn report(&self, n: usize) -> Vec<FrequencyRow> {
        let lists = [
            ("most-common", self.most_common(n)),
            ("least-common", self.least_common(n)),
        ];
        lists
            .into_iter()
            .flat_map(|(list, words)| {
                words
                    .into_iter()
                    .enumerate()
                    .map(move |(i, (word, count))| FrequencyRow {
                        list,
                        rank: i + 1,
                        word,
                        count,
                    })
            })
            .collect()
    }
}

/// One line of the frequency report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FrequencyRow {
    /// `most-common` or `least-common`.
    pub list: &'static str,
    pub rank: usize,
    pub word: String,
    pub count: usize,
}

/// The words a model knows, indexed by descending frequency.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Vocabulary {
    words_map: HashMap<String, usize>,
    words: Vec<String>,
    counts: Vec<usize>,
}

impl Vocabulary {
    /// Keep every word seen at least `min_count` times.
    pub fn build(sequences: &[Vec<String>], min_count: usize) -> Self {
        let kept = WordFrequencies::from_sequences(sequences)
            .ranked()
            .into_iter()
            .filter(|(_, count)| *count >= min_count);
        Self::from_ranked(kept)
    }

    /// Vocabulary from words in index order, with their counts.
    pub fn from_ranked(words: impl IntoIterator<Item = (String, usize)>) -> Self {
        let mut vocab = Self::default();
        for (word, count) in words {
            if vocab.words_map.contains_key(&word) {
                continue;
            }
            vocab.words_map.insert(word.clone(), vocab.words.len());
            vocab.words.push(word);
            vocab.counts.push(count);
        }
        vocab
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.words_map.contains_key(word)
    }

    pub fn index_of(&self, word: &str) -> Option<usize> {
        self.words_map.get(word).copied()
    }

    pub fn word(&self, index: usize) -> Option<&str> {
        self.words.get(index).map(String::as_str)
    }

    pub fn count(&self, index: usize) -> Option<usize> {
        self.counts.get(index).copied()
    }

    pub fn words(&self) -> &[String] {
        &self.words
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }

    /// Map tokens to indices, skipping words outside the vocabulary.
    pub fn encode(&self, tokens: &[String]) -> Vec<usize> {
        tokens.iter().filter_map(|t| self.index_of(t)).collect()
    }
}
