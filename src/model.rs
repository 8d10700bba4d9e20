use ndarray::Array2;
use std::{
    collections::HashSet,
    fs::File,
    io::{BufRead, BufReader, BufWriter, Write},
    path::Path,
};

use crate::{
    error::{Error, Result},
    vocab::Vocabulary,
};

/// A trained set of word vectors, plus the output layer when the model was
/// trained in this process.
#[derive(Debug, Clone)]
pub struct Word2VecModel {
    vocab: Vocabulary,
    embeddings: Vec<f32>,
    output_weights: Option<Vec<f32>>,
    embedding_dim: usize,
}

impl Word2VecModel {
    pub fn new(
        vocab: Vocabulary,
        embeddings: Vec<f32>,
        output_weights: Option<Vec<f32>>,
        embedding_dim: usize,
    ) -> Self {
        debug_assert_eq!(embeddings.len(), vocab.len() * embedding_dim);
        Self {
            vocab,
            embeddings,
            output_weights,
            embedding_dim,
        }
    }

    /// Load vectors in the word2vec text format: a `<count> <dim>` header, then
    /// one `word v1 .. vdim` line per word.
    pub fn load_text<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| Error::io(path, e))?;
        let reader = BufReader::new(file);
        let malformed = |line: usize, reason: String| Error::VectorFormat {
            path: path.to_path_buf(),
            line,
            reason,
        };

        let mut lines = reader.lines();
        let header = match lines.next() {
            Some(line) => line.map_err(|e| Error::io(path, e))?,
            None => return Err(malformed(1, "missing header".into())),
        };
        let mut fields = header.split_whitespace().map(str::parse::<usize>);
        let (vocab_size, embedding_dim) = match (fields.next(), fields.next()) {
            (Some(Ok(count)), Some(Ok(dim))) if dim > 0 => (count, dim),
            _ => return Err(malformed(1, format!("bad header {header:?}"))),
        };
        if vocab_size.checked_mul(embedding_dim).is_none() {
            return Err(malformed(1, format!("header sizes overflow: {header:?}")));
        }

        // The header is not trusted for allocation; buffers grow with the file.
        let mut words = Vec::new();
        let mut embeddings = Vec::new();

        for (idx, line) in lines.enumerate() {
            let line_no = idx + 2;
            let line = line.map_err(|e| Error::io(path, e))?;
            let mut parts = line.split_whitespace();
            let Some(word) = parts.next() else {
                continue;
            };

            let before = embeddings.len();
            for val in parts {
                let val = val
                    .parse::<f32>()
                    .map_err(|e| malformed(line_no, format!("{val:?}: {e}")))?;
                embeddings.push(val);
            }
            if embeddings.len() - before != embedding_dim {
                return Err(malformed(
                    line_no,
                    format!(
                        "expected {embedding_dim} values for {word:?}, found {}",
                        embeddings.len() - before
                    ),
                ));
            }
            words.push((word.to_string(), 0));
        }

        if words.len() != vocab_size {
            return Err(malformed(
                1,
                format!("header announces {vocab_size} words, file has {}", words.len()),
            ));
        }

        let vocab = Vocabulary::from_ranked(words);
        if vocab.len() != vocab_size {
            return Err(malformed(1, "duplicate words".into()));
        }
        tracing::debug!(path = %path.display(), vocab_size, embedding_dim, "loaded vectors");
        Ok(Self::new(vocab, embeddings, None, embedding_dim))
    }

    /// Write the vectors in the word2vec text format.
    pub fn save_text<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| Error::io(path, e))?;
        let mut writer = BufWriter::new(file);
        self.write_text(&mut writer)
            .and_then(|_| writer.flush())
            .map_err(|e| Error::io(path, e))
    }

    fn write_text<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "{} {}", self.vocab_size(), self.embedding_dim)?;
        for (index, word) in self.vocab.words().iter().enumerate() {
            write!(writer, "{word}")?;
            for value in self.row(index) {
                write!(writer, " {value}")?;
            }
            writeln!(writer)?;
        }
        Ok(())
    }

    pub fn vocab(&self) -> &Vocabulary {
        &self.vocab
    }

    pub fn vocab_size(&self) -> usize {
        self.vocab.len()
    }

    pub fn embedding_dim(&self) -> usize {
        self.embedding_dim
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.vocab.contains(word)
    }

    pub fn has_output_weights(&self) -> bool {
        self.output_weights.is_some()
    }

    fn row(&self, index: usize) -> &[f32] {
        let start = index * self.embedding_dim;
        &self.embeddings[start..start + self.embedding_dim]
    }

    pub fn get_embedding(&self, word: &str) -> Option<&[f32]> {
        self.vocab.index_of(word).map(|index| self.row(index))
    }

    fn embedding(&self, word: &str) -> Result<&[f32]> {
        self.get_embedding(word)
            .ok_or_else(|| Error::WordNotInVocabulary(word.to_string()))
    }

    /// All vectors as a `vocab_size x embedding_dim` matrix, rows in vocabulary order.
    pub fn vectors(&self) -> Array2<f32> {
        let dim = self.embedding_dim;
        Array2::from_shape_fn((self.vocab_size(), dim), |(i, j)| self.embeddings[i * dim + j])
    }

    pub fn similarity(&self, word1: &str, word2: &str) -> Result<f32> {
        let embedding1 = self.embedding(word1)?;
        let embedding2 = self.embedding(word2)?;

        Ok(cosine_similarity(embedding1, embedding2))
    }

    /// Words closest to the mean of the unit-normalized `positive` vectors
    /// minus the `negative` ones. Query words never appear in the result.
    pub fn most_similar(
        &self,
        positive: &[&str],
        negative: &[&str],
        top_k: usize,
    ) -> Result<Vec<(String, f32)>> {
        if positive.is_empty() && negative.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let mut mean = vec![0.0; self.embedding_dim];
        let weighted = positive
            .iter()
            .map(|w| (w, 1.0))
            .chain(negative.iter().map(|w| (w, -1.0)));
        for (word, weight) in weighted {
            let embedding = self.embedding(word)?;
            let norm = l2_norm(embedding);
            if norm == 0.0 {
                continue;
            }
            for (m, v) in mean.iter_mut().zip(embedding) {
                *m += weight * v / norm;
            }
        }
        let count = (positive.len() + negative.len()) as f32;
        mean.iter_mut().for_each(|m| *m /= count);

        let exclude: HashSet<&str> = positive.iter().chain(negative).copied().collect();
        Ok(self.rank(&mean, &exclude, top_k))
    }

    /// Words closest to an arbitrary vector, such as a cluster centroid.
    pub fn similar_by_vector(&self, vector: &[f32], top_k: usize) -> Result<Vec<(String, f32)>> {
        if vector.len() != self.embedding_dim {
            return Err(Error::InvalidParameter(format!(
                "vector has {} dimensions, model has {}",
                vector.len(),
                self.embedding_dim
            )));
        }
        Ok(self.rank(vector, &HashSet::new(), top_k))
    }

    fn rank(&self, query: &[f32], exclude: &HashSet<&str>, top_k: usize) -> Vec<(String, f32)> {
        let mut similarities: Vec<(String, f32)> = self
            .vocab
            .words()
            .iter()
            .enumerate()
            .filter(|(_, w)| !exclude.contains(w.as_str()))
            .map(|(index, w)| (w.clone(), cosine_similarity(query, self.row(index))))
            .collect();

        similarities.sort_by(|a, b| b.1.total_cmp(&a.1));
        similarities.truncate(top_k);
        similarities
    }

    /// Most probable centre words for a bag of context words, from a softmax
    /// over the output layer. Unknown context words are ignored.
    pub fn predict_output_word(&self, context: &[&str], top_k: usize) -> Result<Vec<(String, f32)>> {
        let output = self
            .output_weights
            .as_ref()
            .ok_or(Error::MissingOutputWeights)?;

        let known: Vec<usize> = context
            .iter()
            .filter_map(|w| self.vocab.index_of(w))
            .collect();
        if known.is_empty() {
            return Err(Error::EmptyQuery);
        }

        let dim = self.embedding_dim;
        let mut l1 = vec![0.0; dim];
        for &index in &known {
            for (acc, v) in l1.iter_mut().zip(self.row(index)) {
                *acc += v;
            }
        }
        l1.iter_mut().for_each(|v| *v /= known.len() as f32);

        let scores: Vec<f32> = output
            .chunks_exact(dim)
            .map(|row| row.iter().zip(&l1).map(|(a, b)| a * b).sum())
            .collect();
        let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let exps: Vec<f32> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f32 = exps.iter().sum();

        let mut predictions: Vec<(String, f32)> = self
            .vocab
            .words()
            .iter()
            .zip(exps)
            .map(|(w, e)| (w.clone(), e / total))
            .collect();
        predictions.sort_by(|a, b| b.1.total_cmp(&a.1));
        predictions.truncate(top_k);
        Ok(predictions)
    }
}

fn l2_norm(a: &[f32]) -> f32 {
    a.iter().map(|x| x * x).sum::<f32>().sqrt()
}

pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());

    let dot_product: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = l2_norm(a);
    let norm_b = l2_norm(b);

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot_product / (norm_a * norm_b)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use tempfile::TempDir;

    /// Axes: royal, male, female, fruit.
    pub(crate) fn toy_model() -> Word2VecModel {
        let words = ["king", "queen", "man", "woman", "apple"];
        let embeddings = vec![
            1.0, 1.0, 0.0, 0.0, // king
            1.0, 0.0, 1.0, 0.0, // queen
            0.0, 1.0, 0.0, 0.0, // man
            0.0, 0.0, 1.0, 0.0, // woman
            0.0, 0.0, 0.0, 1.0, // apple
        ];
        let output = vec![
            0.5, 0.5, 0.0, 0.0, // king
            0.0, 0.0, 0.5, 0.0, // queen
            0.0, 2.0, 0.0, 0.0, // man
            0.0, 0.0, 1.0, 0.0, // woman
            0.0, 0.0, 0.0, 1.0, // apple
        ];
        let vocab = Vocabulary::from_ranked(words.iter().map(|w| (w.to_string(), 1)));
        Word2VecModel::new(vocab, embeddings, Some(output), 4)
    }

    #[test]
    fn test_get_embedding() {
        let model = toy_model();
        assert_eq!(model.get_embedding("man"), Some(&[0.0, 1.0, 0.0, 0.0][..]));
        assert_eq!(model.get_embedding("pear"), None);
        assert!(model.contains_word("apple"));
        assert_eq!(model.vocab_size(), 5);
    }

    #[test]
    fn test_similarity() {
        let model = toy_model();
        assert!((model.similarity("king", "man").unwrap() - 0.70710677).abs() < 1e-6);
        assert_eq!(model.similarity("man", "woman").unwrap(), 0.0);
        assert!(matches!(
            model.similarity("man", "pear"),
            Err(Error::WordNotInVocabulary(w)) if w == "pear"
        ));
    }

    #[test]
    fn test_most_similar_single_word() {
        let model = toy_model();
        let result = model.most_similar(&["king"], &[], 2).unwrap();
        let words: Vec<&str> = result.iter().map(|(w, _)| w.as_str()).collect();
        assert_eq!(words, vec!["man", "queen"]);
        assert!(result[0].1 > result[1].1);
    }

    #[test]
    fn test_most_similar_analogy() {
        let model = toy_model();
        let result = model.most_similar(&["king", "woman"], &["man"], 3).unwrap();
        assert_eq!(result[0].0, "queen");
        assert!(result.iter().all(|(w, _)| !["king", "woman", "man"].contains(&w.as_str())));
    }

    #[test]
    fn test_most_similar_errors() {
        let model = toy_model();
        assert!(matches!(model.most_similar(&[], &[], 5), Err(Error::EmptyQuery)));
        assert!(matches!(
            model.most_similar(&["pear"], &[], 5),
            Err(Error::WordNotInVocabulary(_))
        ));
    }

    #[test]
    fn test_similar_by_vector() {
        let model = toy_model();
        let result = model.similar_by_vector(&[0.0, 0.0, 0.0, 3.0], 1).unwrap();
        assert_eq!(result[0].0, "apple");
        assert!((result[0].1 - 1.0).abs() < 1e-6);
        assert!(model.similar_by_vector(&[1.0], 1).is_err());
    }

    #[test]
    fn test_predict_output_word() {
        let model = toy_model();
        let predictions = model.predict_output_word(&["man", "nonsense"], 5).unwrap();
        assert_eq!(predictions.len(), 5);
        assert_eq!(predictions[0].0, "man");
        let total: f32 = predictions.iter().map(|(_, p)| p).sum();
        assert!((total - 1.0).abs() < 1e-5);

        assert!(matches!(
            model.predict_output_word(&["nonsense"], 5),
            Err(Error::EmptyQuery)
        ));
    }

    #[test]
    fn test_text_format_keeps_vectors() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vectors.txt");
        let model = toy_model();
        model.save_text(&path).unwrap();

        let loaded = Word2VecModel::load_text(&path).unwrap();
        assert_eq!(loaded.vocab().words(), model.vocab().words());
        assert_eq!(loaded.vectors(), model.vectors());
        assert!(!loaded.has_output_weights());
        assert!(matches!(
            loaded.predict_output_word(&["man"], 1),
            Err(Error::MissingOutputWeights)
        ));
    }

    #[test]
    fn test_load_text_rejects_short_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("broken.txt");
        std::fs::write(&path, "2 3\nmilk 0.1 0.2 0.3\ncream 0.1 0.2\n").unwrap();
        assert!(matches!(
            Word2VecModel::load_text(&path),
            Err(Error::VectorFormat { line: 3, .. })
        ));
    }

    #[test]
    fn test_load_text_rejects_oversized_header() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("huge.txt");
        for header in ["18446744073709551615 2", "1000000000000 1000", "1e12 1000"] {
            std::fs::write(&path, format!("{header}\nmilk 0.1 0.2\n")).unwrap();
            assert!(
                matches!(
                    Word2VecModel::load_text(&path),
                    Err(Error::VectorFormat { line: 1, .. })
                ),
                "{header}"
            );
        }
    }

    #[test]
    fn test_load_text_missing_file() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Word2VecModel::load_text(dir.path().join("absent.txt")),
            Err(Error::NotFound { .. })
        ));
    }
}
