//! Recursive character chunker.
//!
//! Splits text on a ladder of separators, preferring paragraph breaks, then
//! line breaks, then sentence boundaries, then words, and finally single
//! characters when nothing else fits. Adjacent fragments are merged back
//! into windows of at most `chunk_size` characters, carrying up to
//! `chunk_overlap` characters between consecutive windows.

use async_trait::async_trait;
use mdrag_core::{ChunkConfig, ChunkError, Chunker};
use std::collections::VecDeque;
use tracing::debug;

/// Separator ladder, tried in order. The empty string is the hard
/// character-level fallback and always succeeds.
const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// Chunker that recursively splits on natural boundaries.
pub struct RecursiveCharacterChunker;

impl RecursiveCharacterChunker {
    /// Create a new recursive chunker.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Split a single text into chunks.
    fn split_text(text: &str, config: &ChunkConfig) -> Vec<String> {
        Self::split_recursive(text, &SEPARATORS, config)
    }

    fn split_recursive(text: &str, separators: &[&str], config: &ChunkConfig) -> Vec<String> {
        // Pick the first separator that occurs in the text. The empty
        // fallback always matches.
        let mut sep_index = separators.len() - 1;
        for (i, sep) in separators.iter().enumerate() {
            if sep.is_empty() || text.contains(sep) {
                sep_index = i;
                break;
            }
        }
        let separator = separators[sep_index];
        let remaining = &separators[sep_index + 1..];

        let pieces = split_keeping_separator(text, separator);

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();
        for piece in pieces {
            if char_len(&piece) <= config.chunk_size {
                fitting.push(piece);
            } else {
                // Flush fitting pieces before descending, so chunk order
                // follows text order.
                if !fitting.is_empty() {
                    chunks.extend(merge_pieces(std::mem::take(&mut fitting), config));
                }
                if remaining.is_empty() {
                    chunks.push(piece);
                } else {
                    chunks.extend(Self::split_recursive(&piece, remaining, config));
                }
            }
        }
        if !fitting.is_empty() {
            chunks.extend(merge_pieces(fitting, config));
        }
        chunks
    }
}

impl Default for RecursiveCharacterChunker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Chunker for RecursiveCharacterChunker {
    fn name(&self) -> &str {
        "recursive-character"
    }

    async fn chunk(
        &self,
        texts: &[String],
        config: &ChunkConfig,
    ) -> Result<Vec<String>, ChunkError> {
        config.validate()?;

        let mut chunks = Vec::new();
        for text in texts {
            chunks.extend(Self::split_text(text, config));
        }
        debug!(
            texts = texts.len(),
            chunks = chunks.len(),
            chunk_size = config.chunk_size,
            chunk_overlap = config.chunk_overlap,
            "chunked texts"
        );
        Ok(chunks)
    }
}

/// Split `text` on `sep`, keeping the separator attached to the preceding
/// piece. An empty separator splits into single characters.
fn split_keeping_separator(text: &str, sep: &str) -> Vec<String> {
    if sep.is_empty() {
        return text.chars().map(String::from).collect();
    }

    let mut pieces = Vec::new();
    let mut rest = text;
    while let Some(idx) = rest.find(sep) {
        let end = idx + sep.len();
        pieces.push(rest[..end].to_string());
        rest = &rest[end..];
    }
    if !rest.is_empty() {
        pieces.push(rest.to_string());
    }
    pieces
}

/// Merge consecutive pieces into windows of at most `chunk_size` characters,
/// retaining up to `chunk_overlap` trailing characters between windows.
fn merge_pieces(pieces: Vec<String>, config: &ChunkConfig) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut window: VecDeque<String> = VecDeque::new();
    let mut total = 0usize;

    for piece in pieces {
        let len = char_len(&piece);
        if total + len > config.chunk_size && !window.is_empty() {
            if let Some(chunk) = join_window(&window) {
                chunks.push(chunk);
            }
            // Shrink the window down to the overlap budget, or further if
            // the incoming piece would not fit otherwise.
            while total > config.chunk_overlap
                || (total + len > config.chunk_size && total > 0)
            {
                if let Some(front) = window.pop_front() {
                    total -= char_len(&front);
                } else {
                    break;
                }
            }
        }
        total += len;
        window.push_back(piece);
    }

    if let Some(chunk) = join_window(&window) {
        chunks.push(chunk);
    }
    chunks
}

/// Concatenate the window and trim surrounding whitespace. Returns `None`
/// when nothing but whitespace remains.
fn join_window(window: &VecDeque<String>) -> Option<String> {
    let joined: String = window.iter().flat_map(|s| s.chars()).collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}
