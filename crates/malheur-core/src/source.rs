//! Report reading and tokenization
//!
//! A directory holds one report per regular file, visited in file-name
//! order. A plain file holds one report per non-empty line. Either way the
//! source yields reports lazily and exactly once, in a stable order.

use std::fs::{self, File};
use std::io::{BufRead, BufReader, Lines};
use std::path::{Path, PathBuf};

use crate::config::InputConfig;
use crate::error::{MalheurError, Result};

/// One tokenized report as produced by a [`ReportSource`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawReport {
    /// External identity (file name, or `file:line`)
    pub label: String,
    /// Token multiset in document order
    pub tokens: Vec<String>,
}

/// Splits report text into word n-grams
#[derive(Debug, Clone)]
pub struct Tokenizer {
    delimiters: Vec<char>,
    ngram_len: usize,
}

impl Tokenizer {
    /// Create a tokenizer splitting on any of `delimiters`
    pub fn new(delimiters: &str, ngram_len: usize) -> Self {
        Self {
            delimiters: delimiters.chars().collect(),
            ngram_len: ngram_len.max(1),
        }
    }

    /// Create a tokenizer from the `[input]` configuration section
    pub fn from_config(config: &InputConfig) -> Self {
        Self::new(&config.delimiters, config.ngram_len)
    }

    /// Tokenize `text` into n-grams of words joined by a single space.
    ///
    /// A text shorter than the n-gram length yields one token made of all
    /// its words; an empty text yields no token.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let words: Vec<&str> = text
            .split(|c: char| self.delimiters.contains(&c))
            .filter(|w| !w.is_empty())
            .collect();

        if words.is_empty() {
            return Vec::new();
        }
        if words.len() <= self.ngram_len {
            return vec![words.join(" ")];
        }
        words
            .windows(self.ngram_len)
            .map(|gram| gram.join(" "))
            .collect()
    }
}

enum Entries {
    Files(std::vec::IntoIter<PathBuf>),
    Lines {
        name: String,
        lines: Lines<BufReader<File>>,
        line_no: usize,
    },
}

/// Lazy, order-preserving sequence of tokenized reports
pub struct ReportSource {
    entries: Entries,
    tokenizer: Tokenizer,
}

impl ReportSource {
    /// Open `path` as a report directory or a line-per-report file
    ///
    /// # Errors
    ///
    /// Returns an input error if the path cannot be accessed.
    pub fn open(path: impl AsRef<Path>, tokenizer: Tokenizer) -> Result<Self> {
        let path = path.as_ref();
        let metadata = fs::metadata(path)
            .map_err(|e| MalheurError::input(path.display().to_string(), e.to_string()))?;

        let entries = if metadata.is_dir() {
            let mut files = Vec::new();
            let dir = fs::read_dir(path)
                .map_err(|e| MalheurError::input(path.display().to_string(), e.to_string()))?;
            for entry in dir {
                let entry = entry
                    .map_err(|e| MalheurError::input(path.display().to_string(), e.to_string()))?;
                let entry_path = entry.path();
                if entry_path.is_file() {
                    files.push(entry_path);
                }
            }
            files.sort();
            Entries::Files(files.into_iter())
        } else {
            let file = File::open(path)
                .map_err(|e| MalheurError::input(path.display().to_string(), e.to_string()))?;
            Entries::Lines {
                name: file_name(path),
                lines: BufReader::new(file).lines(),
                line_no: 0,
            }
        };

        Ok(Self { entries, tokenizer })
    }
}

impl Iterator for ReportSource {
    type Item = Result<RawReport>;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.entries {
            Entries::Files(files) => {
                let path = files.next()?;
                let label = file_name(&path);
                Some(
                    fs::read_to_string(&path)
                        .map(|text| RawReport {
                            tokens: self.tokenizer.tokenize(&text),
                            label: label.clone(),
                        })
                        .map_err(|e| MalheurError::input(label, e.to_string())),
                )
            }
            Entries::Lines {
                name,
                lines,
                line_no,
            } => loop {
                let line = lines.next()?;
                *line_no += 1;
                let label = format!("{}:{}", name, line_no);
                match line {
                    Ok(text) if text.trim().is_empty() => continue,
                    Ok(text) => {
                        return Some(Ok(RawReport {
                            tokens: self.tokenizer.tokenize(&text),
                            label,
                        }))
                    }
                    Err(e) => return Some(Err(MalheurError::input(label, e.to_string()))),
                }
            },
        }
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
