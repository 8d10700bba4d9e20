//! Corpus ingestion: find the plain-text files under a directory, read them,
//! and turn every document into a normalized token sequence.
//!
//! Normalization splits on whitespace, lowercases, strips ASCII punctuation and
//! keeps only tokens made entirely of Unicode alphabetic characters, so
//! accented words such as `café` are kept while `9` or `--` are dropped.

use std::{
    borrow::Cow,
    fs,
    path::{Path, PathBuf},
    sync::LazyLock,
};

use encoding_rs::{Encoding, UTF_8};
use regex::Regex;
use walkdir::WalkDir;

use crate::error::{Error, Result};

pub const DEFAULT_EXTENSION: &str = ".txt";
pub const DEFAULT_ENCODING: &str = "utf-8";

static PUNCTUATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[[:punct:]]").expect("static punctuation pattern"));

/// The cleaned documents of a directory, parallel to the files they came from.
#[derive(Debug, Clone, Default)]
pub struct TokenizedCorpus {
    pub paths: Vec<PathBuf>,
    pub documents: Vec<Vec<String>>,
}

impl TokenizedCorpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// Total number of tokens over every document.
    pub fn token_count(&self) -> usize {
        self.documents.iter().map(Vec::len).sum()
    }
}

/// Resolve an encoding label such as `utf-8` or `windows-1252`.
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| Error::UnknownEncoding(label.to_string()))
}

/// Every file under `root` whose name ends with `extension`.
///
/// Each directory level is visited in file-name order, so two runs over the
/// same tree return the same sequence.
pub fn enumerate_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    if !root.exists() {
        return Err(Error::NotFound {
            path: root.to_path_buf(),
        });
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().unwrap_or(root).to_path_buf();
            match e.into_io_error() {
                Some(source) => Error::io(path, source),
                None => Error::InvalidParameter(format!(
                    "filesystem loop detected at {}",
                    path.display()
                )),
            }
        })?;
        if entry.file_type().is_file() && entry.file_name().to_string_lossy().ends_with(extension)
        {
            paths.push(entry.into_path());
        }
    }

    tracing::debug!(root = %root.display(), files = paths.len(), "enumerated corpus files");
    Ok(paths)
}

/// Read one file and decode it. The handle is closed before returning.
pub fn read_document(path: &Path, encoding: &'static Encoding) -> Result<String> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;

    let decoded = if encoding == UTF_8 {
        String::from_utf8(bytes).ok()
    } else {
        encoding
            .decode_without_bom_handling_and_without_replacement(&bytes)
            .map(Cow::into_owned)
    };

    match decoded {
        Some(text) => Ok(match text.strip_prefix('\u{feff}') {
            Some(stripped) => stripped.to_string(),
            None => text,
        }),
        None => Err(Error::Decode {
            path: path.to_path_buf(),
            encoding: encoding.name(),
        }),
    }
}

/// Read every path in order. The first failure aborts the whole batch.
pub fn read_all(paths: &[PathBuf], encoding: &'static Encoding) -> Result<Vec<String>> {
    paths
        .iter()
        .map(|path| {
            tracing::debug!(path = %path.display(), "reading document");
            read_document(path, encoding).inspect_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to read document");
            })
        })
        .collect()
}

/// Split, lowercase, strip punctuation and keep alphabetic tokens only.
pub fn clean_text(document: &str) -> Vec<String> {
    document
        .split_whitespace()
        .map(|token| PUNCTUATION.replace_all(&token.to_lowercase(), "").into_owned())
        // Alphabetic admits combining vowel signs (Devanagari U+093F), unlike letter categories.
        .filter(|token| !token.is_empty() && token.chars().all(char::is_alphabetic))
        .collect()
}

pub fn clean_corpus<S: AsRef<str>>(documents: &[S]) -> Vec<Vec<String>> {
    documents
        .iter()
        .map(|document| clean_text(document.as_ref()))
        .collect()
}

/// Enumerate, read and clean every matching file under `root`.
pub fn ingest(root: &Path, extension: &str, encoding: &'static Encoding) -> Result<TokenizedCorpus> {
    let paths = enumerate_files(root, extension)?;
    if paths.is_empty() {
        return Err(Error::EmptyCorpus {
            root: root.to_path_buf(),
            extension: extension.to_string(),
        });
    }

    let raw = read_all(&paths, encoding)?;
    let documents = clean_corpus(&raw);

    let corpus = TokenizedCorpus { paths, documents };
    tracing::info!(
        documents = corpus.len(),
        tokens = corpus.token_count(),
        "corpus ingested"
    );
    Ok(corpus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, content: impl AsRef<[u8]>) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_clean_text_walkthrough() {
        let tokens = clean_text("The Cat's 9 Lives! -- a tale.");
        assert_eq!(tokens, vec!["the", "cats", "lives", "a", "tale"]);
    }

    #[rstest]
    #[case("", &[])]
    #[case("   \n\t  ", &[])]
    #[case("-- ... !!!", &[])]
    #[case("abc123 1984 r2d2 ok", &["ok"])]
    #[case("Café NAÏVE déjà-vu", &["café", "naïve", "déjàvu"])]
    #[case("one\ntwo\tthree  four", &["one", "two", "three", "four"])]
    #[case("“quoted” words", &["words"])]
    #[case("हिंदी text", &["हिंदी", "text"])]
    fn test_clean_text_cases(#[case] input: &str, #[case] expected: &[&str]) {
        assert_eq!(clean_text(input), expected);
    }

    #[test]
    fn test_clean_text_never_adds_tokens() {
        let text = "Cup cake is about as good as pound cake, and is cheaper. 3 cups!";
        assert!(clean_text(text).len() <= text.split_whitespace().count());
    }

    #[test]
    fn test_clean_text_is_idempotent() {
        let text = "One cup of butter, two cups of sugar, THREE cups of flour, 4 eggs -- well beat.";
        let once = clean_text(text);
        let twice = clean_text(&once.join(" "));
        assert_eq!(once, twice);
    }

    #[test]
    fn test_clean_text_output_is_lowercase_and_alphabetic() {
        let text = "Bake TWENTY minutes, and no more! (C) 2022 <b>Done</b> x_y";
        for token in clean_text(text) {
            assert!(token.chars().all(|c| c.is_alphabetic() && !c.is_uppercase()));
            assert!(!token.chars().any(|c| c.is_ascii_punctuation() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_clean_corpus_preserves_order_and_count() {
        let docs = ["First doc.", "", "Third, doc!"];
        let cleaned = clean_corpus(&docs);
        assert_eq!(cleaned.len(), docs.len());
        assert_eq!(cleaned[0], vec!["first", "doc"]);
        assert!(cleaned[1].is_empty());
        assert_eq!(cleaned[2], vec!["third", "doc"]);
    }

    #[test]
    fn test_enumerate_files_walks_nested_directories() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "b.txt", "b");
        write(dir.path(), "a.txt", "a");
        write(dir.path(), "notes.md", "skip");
        write(dir.path(), "nested/deeper/c.txt", "c");
        fs::create_dir_all(dir.path().join("folder.txt")).unwrap();

        let files = enumerate_files(dir.path(), ".txt").unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.strip_prefix(dir.path()).unwrap().to_path_buf())
            .collect();
        assert_eq!(
            names,
            vec![
                PathBuf::from("a.txt"),
                PathBuf::from("b.txt"),
                PathBuf::from("nested/deeper/c.txt"),
            ]
        );
    }

    #[test]
    fn test_enumerate_files_missing_root() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        let err = enumerate_files(&missing, ".txt").unwrap_err();
        assert!(matches!(err, Error::NotFound { path } if path == missing));
    }

    #[test]
    fn test_enumerate_files_without_matches_is_empty() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "data.csv", "a,b");
        assert!(enumerate_files(dir.path(), ".txt").unwrap().is_empty());
    }

    #[test]
    fn test_ingest_without_matches_is_an_error() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "data.csv", "a,b");
        let err = ingest(dir.path(), ".txt", UTF_8).unwrap_err();
        assert!(matches!(err, Error::EmptyCorpus { extension, .. } if extension == ".txt"));
    }

    #[test]
    fn test_ingest_reads_and_cleans_every_file() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "1.txt", "Milk and cream.");
        write(dir.path(), "2.txt", "");
        write(dir.path(), "sub/3.txt", "\u{feff}Whisk the eggs, 2 minutes!");

        let corpus = ingest(dir.path(), ".txt", UTF_8).unwrap();
        assert_eq!(corpus.len(), 3);
        assert_eq!(corpus.paths.len(), corpus.documents.len());
        assert_eq!(corpus.documents[0], vec!["milk", "and", "cream"]);
        assert!(corpus.documents[1].is_empty());
        assert_eq!(corpus.documents[2], vec!["whisk", "the", "eggs", "minutes"]);
        assert_eq!(corpus.token_count(), 7);
    }

    #[test]
    fn test_ingest_aborts_on_invalid_utf8() {
        let dir = TempDir::new().unwrap();
        write(dir.path(), "good.txt", "fine text");
        let bad = write(dir.path(), "zbad.txt", [0x66, 0x6f, 0xff, 0xfe, 0x6f]);

        let err = ingest(dir.path(), ".txt", UTF_8).unwrap_err();
        assert!(matches!(err, Error::Decode { path, .. } if path == bad));
    }

    #[test]
    fn test_read_document_with_legacy_encoding() {
        let dir = TempDir::new().unwrap();
        // "café" in windows-1252
        let path = write(dir.path(), "legacy.txt", [0x63, 0x61, 0x66, 0xe9]);
        let encoding = resolve_encoding("windows-1252").unwrap();
        assert_eq!(read_document(&path, encoding).unwrap(), "café");
    }

    #[test]
    fn test_resolve_encoding() {
        assert_eq!(resolve_encoding("UTF-8").unwrap(), UTF_8);
        assert!(matches!(
            resolve_encoding("not-an-encoding"),
            Err(Error::UnknownEncoding(_))
        ));
    }
}
