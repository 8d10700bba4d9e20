//! Intrinsic evaluation of trained vectors: cosine similarity of hand-picked
//! word pairs across several models, and analogy tests read from a file.

use serde::Serialize;
use std::{collections::HashMap, fs, io::Write, path::Path};

use crate::{
    error::{Error, Result},
    export,
    model::Word2VecModel,
};

/// Pairs of near-synonyms from the recipe corpus walkthrough.
pub const DEFAULT_TEST_PAIRS: &[(&str, &str)] = &[
    ("stir", "whisk"),
    ("cream", "milk"),
    ("cake", "muffin"),
    ("jam", "jelly"),
    ("reserve", "save"),
    ("bake", "cook"),
];

/// Neighbours inspected per analogy question.
pub const ANALOGY_TOP_N: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WordPair {
    pub first: String,
    pub second: String,
}

impl WordPair {
    pub fn new(first: impl Into<String>, second: impl Into<String>) -> Self {
        Self {
            first: first.into(),
            second: second.into(),
        }
    }
}

pub fn default_pairs() -> Vec<WordPair> {
    DEFAULT_TEST_PAIRS
        .iter()
        .map(|(a, b)| WordPair::new(*a, *b))
        .collect()
}

/// Read word pairs, one per line. Cells are separated by commas or tabs,
/// or by whitespace when the line has neither. Extra columns are ignored and
/// `#` starts a comment line. A first line whose leading two cells are not
/// both single words is a header and is skipped.
pub fn load_pairs<P: AsRef<Path>>(path: P) -> Result<Vec<WordPair>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;

    let mut pairs = Vec::new();
    let mut first_line = true;
    for (idx, line) in text.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let cells = split_cells(line);
        let is_pair = cells.len() >= 2 && cells[..2].iter().copied().all(is_word);
        if std::mem::take(&mut first_line) && !is_pair {
            tracing::debug!(path = %path.display(), header = line, "skipping header");
            continue;
        }
        match cells[..] {
            [first, second, ..] => {
                pairs.push(WordPair::new(first.to_lowercase(), second.to_lowercase()))
            }
            _ => {
                return Err(Error::Malformed {
                    path: path.to_path_buf(),
                    line: idx + 1,
                    content: line.to_string(),
                })
            }
        }
    }
    Ok(pairs)
}

fn split_cells(line: &str) -> Vec<&str> {
    if line.contains([',', '\t']) {
        line.split([',', '\t'])
            .map(str::trim)
            .filter(|cell| !cell.is_empty())
            .collect()
    } else {
        line.split_whitespace().collect()
    }
}

fn is_word(cell: &str) -> bool {
    !cell.is_empty() && cell.chars().all(char::is_alphabetic)
}

/// One row of the pair evaluation table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairScore {
    pub model: String,
    pub first: String,
    pub second: String,
    /// `None` when either word is outside the model vocabulary.
    #[serde(rename = "cosine_similarity")]
    pub similarity: Option<f32>,
}

/// Score every pair against every named model.
pub fn evaluate_pairs(models: &[(&str, &Word2VecModel)], pairs: &[WordPair]) -> Vec<PairScore> {
    models
        .iter()
        .flat_map(|(name, model)| {
            pairs.iter().map(move |pair| PairScore {
                model: name.to_string(),
                first: pair.first.clone(),
                second: pair.second.clone(),
                similarity: model.similarity(&pair.first, &pair.second).ok(),
            })
        })
        .collect()
}

/// Write the table as CSV. Unknown pairs leave the similarity cell empty.
pub fn write_pair_scores_csv<W: Write>(writer: W, scores: &[PairScore]) -> Result<()> {
    export::write_csv(writer, scores)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogyQuestion {
    pub root: String,
    /// Accepted answers, any of which counts as correct.
    pub expected: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalogySection {
    pub name: String,
    pub questions: Vec<AnalogyQuestion>,
}

/// Parse an analogy file: `: name` opens a section, every other non-empty
/// line is `root expected[/alternative...]`. Questions before the first
/// header land in a section named `default`.
pub fn parse_analogies(text: &str, path: &Path) -> Result<Vec<AnalogySection>> {
    let mut sections: Vec<AnalogySection> = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(name) = line.strip_prefix(':') {
            sections.push(AnalogySection {
                name: name.trim().to_string(),
                questions: Vec::new(),
            });
            continue;
        }

        let fields: Vec<&str> = line.split_whitespace().collect();
        let [root, expected] = fields[..] else {
            return Err(Error::Malformed {
                path: path.to_path_buf(),
                line: idx + 1,
                content: line.to_string(),
            });
        };
        let question = AnalogyQuestion {
            root: root.to_lowercase(),
            expected: expected.split('/').map(str::to_lowercase).collect(),
        };

        if sections.is_empty() {
            sections.push(AnalogySection {
                name: "default".to_string(),
                questions: Vec::new(),
            });
        }
        if let Some(section) = sections.last_mut() {
            section.questions.push(question);
        }
    }

    Ok(sections)
}

pub fn load_analogies<P: AsRef<Path>>(path: P) -> Result<Vec<AnalogySection>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    parse_analogies(&text, path)
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionScore {
    pub name: String,
    pub correct: Vec<(String, String)>,
    pub incorrect: Vec<(String, String)>,
}

impl SectionScore {
    pub fn total(&self) -> usize {
        self.correct.len() + self.incorrect.len()
    }

    pub fn score(&self) -> f32 {
        ratio(self.correct.len(), self.total())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnalogyReport {
    pub sections: Vec<SectionScore>,
    pub questions: usize,
    /// Questions where every root/answer combination was out of vocabulary.
    pub out_of_vocabulary: usize,
}

impl AnalogyReport {
    pub fn oov_ratio(&self) -> f32 {
        ratio(self.out_of_vocabulary, self.questions)
    }

    pub fn total_score(&self) -> f32 {
        let correct = self.sections.iter().map(|s| s.correct.len()).sum();
        let total = self.sections.iter().map(SectionScore::total).sum();
        ratio(correct, total)
    }
}

fn ratio(part: usize, whole: usize) -> f32 {
    if whole == 0 {
        0.0
    } else {
        part as f32 / whole as f32
    }
}

/// A question is answered when any accepted answer is among the root's
/// `top_n` nearest neighbours. Words are matched against the vocabulary
/// without regard to case. Out-of-vocabulary questions count as incorrect.
pub fn evaluate_analogies(
    model: &Word2VecModel,
    sections: &[AnalogySection],
    top_n: usize,
) -> Result<AnalogyReport> {
    let mut report = AnalogyReport::default();

    // Lowercased form -> vocabulary key; the more frequent spelling wins.
    let mut lookup: HashMap<String, &str> = HashMap::new();
    for word in model.vocab().words() {
        lookup.entry(word.to_lowercase()).or_insert(word);
    }

    for section in sections {
        let mut score = SectionScore {
            name: section.name.clone(),
            ..Default::default()
        };

        for question in &section.questions {
            report.questions += 1;
            let mut out_of_vocabulary = 0;
            let mut answer = None;

            for expected in &question.expected {
                if question.root.is_empty() || expected.is_empty() {
                    continue;
                }
                let (Some(&root), true) =
                    (lookup.get(&question.root), lookup.contains_key(expected))
                else {
                    out_of_vocabulary += 1;
                    continue;
                };
                let neighbours = model.most_similar(&[root], &[], top_n)?;
                if neighbours
                    .iter()
                    .any(|(word, _)| word.to_lowercase() == *expected)
                {
                    answer = Some(expected.clone());
                    break;
                }
            }

            if out_of_vocabulary == question.expected.len() {
                report.out_of_vocabulary += 1;
            }
            match answer {
                Some(expected) => score.correct.push((question.root.clone(), expected)),
                None => score
                    .incorrect
                    .push((question.root.clone(), question.expected.join("/"))),
            }
        }

        tracing::info!(
            section = %score.name,
            correct = score.correct.len(),
            total = score.total(),
            score = score.score(),
            "analogy section evaluated"
        );
        report.sections.push(score);
    }

    Ok(report)
}
