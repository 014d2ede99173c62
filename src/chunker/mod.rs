//! Recursive character text splitting.
//!
//! Splits text on the most structural separator available (paragraph break),
//! re-splitting any oversized piece with the next separator in priority
//! order, down to a hard character cut. Adjacent chunks carry a bounded
//! overlap so context survives chunk boundaries.
//!
//! Splitting is a pure function of the input and parameters; no I/O.

use crate::core::config::ChunkerConfig;
use crate::core::errors::ApiError;

/// Separator priority: paragraph break, line break, sentence terminator,
/// word boundary, hard character cut.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ".", " ", ""];

#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl TextSplitter {
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Result<Self, ApiError> {
        if chunk_size == 0 {
            return Err(ApiError::InvalidChunking("chunk_size must be > 0".into()));
        }
        if chunk_overlap >= chunk_size {
            return Err(ApiError::InvalidChunking(format!(
                "chunk_overlap ({chunk_overlap}) must be smaller than chunk_size ({chunk_size})"
            )));
        }
        Ok(Self {
            chunk_size,
            chunk_overlap,
        })
    }

    pub fn from_config(config: &ChunkerConfig) -> Result<Self, ApiError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Split `text` into overlapping chunks of at most `chunk_size` chars.
    pub fn split(&self, text: &str) -> Vec<String> {
        if text.trim().is_empty() {
            return Vec::new();
        }
        self.split_recursive(text, &SEPARATORS)
    }

    fn split_recursive(&self, text: &str, separators: &[&str]) -> Vec<String> {
        // First separator actually present in the text wins; the empty
        // separator always matches and ends the recursion.
        let mut separator = "";
        let mut rest: &[&str] = &[];
        for (i, &sep) in separators.iter().enumerate() {
            if sep.is_empty() || text.contains(sep) {
                separator = sep;
                rest = &separators[i + 1..];
                break;
            }
        }

        let splits: Vec<String> = if separator.is_empty() {
            text.chars().map(String::from).collect()
        } else {
            text.split(separator)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        };

        let mut chunks = Vec::new();
        let mut good: Vec<String> = Vec::new();
        for piece in splits {
            if piece.chars().count() <= self.chunk_size {
                good.push(piece);
            } else {
                if !good.is_empty() {
                    chunks.extend(self.merge_splits(&good, separator));
                    good.clear();
                }
                if rest.is_empty() {
                    chunks.push(piece.trim().to_string());
                } else {
                    chunks.extend(self.split_recursive(&piece, rest));
                }
            }
        }
        if !good.is_empty() {
            chunks.extend(self.merge_splits(&good, separator));
        }
        chunks
    }

    /// Greedily merge sub-chunk pieces back up to `chunk_size`, re-joining
    /// with the separator they were split on and carrying a tail window of
    /// at most `chunk_overlap` chars into the next chunk.
    fn merge_splits(&self, splits: &[String], separator: &str) -> Vec<String> {
        let sep_len = separator.chars().count();
        let mut chunks: Vec<String> = Vec::new();
        let mut current: Vec<&str> = Vec::new();
        let mut total = 0usize;

        for piece in splits {
            let len = piece.chars().count();
            if !current.is_empty() && total + len + sep_len > self.chunk_size {
                if let Some(chunk) = join_trimmed(&current, separator) {
                    chunks.push(chunk);
                }
                while total > self.chunk_overlap
                    || (total > 0
                        && total + len + if current.is_empty() { 0 } else { sep_len }
                            > self.chunk_size)
                {
                    let head = current.remove(0);
                    total -= head.chars().count() + if current.is_empty() { 0 } else { sep_len };
                }
            }
            total += len + if current.is_empty() { 0 } else { sep_len };
            current.push(piece);
        }

        if let Some(chunk) = join_trimmed(&current, separator) {
            chunks.push(chunk);
        }
        chunks
    }
}

fn join_trimmed(pieces: &[&str], separator: &str) -> Option<String> {
    let joined = pieces.join(separator);
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
