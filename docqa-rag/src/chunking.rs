//! Sentence-aware document chunking.
//!
//! [`SentenceChunker`] splits normalized text into overlapping segments
//! bounded by a target size, preferring to cut at a sentence terminator
//! inside the window. [`chunk_metadata`] builds the positional metadata
//! attached to each chunk before indexing.

use serde_json::Value;
use tracing::info;

use crate::document::Metadata;

/// Sentence terminators, tried in fixed priority order. The first pattern
/// with any match in the window wins, even if a later pattern would match
/// further right.
const SENTENCE_BREAKS: [&str; 6] = [". ", ".\n", "! ", "!\n", "? ", "?\n"];

/// Splits text into overlapping chunks, cutting at the last sentence
/// terminator inside each window when one exists.
///
/// `chunk_overlap` must be strictly less than `chunk_size` for multi-chunk
/// splitting; equal or larger values truncate output to very few chunks.
/// That constraint is enforced by [`Settings::validate`](crate::Settings),
/// not here.
///
/// # Example
///
/// ```rust,ignore
/// use docqa_rag::SentenceChunker;
///
/// let chunker = SentenceChunker::new(1000, 200);
/// let chunks = chunker.chunk(&normalized_text);
/// ```
#[derive(Debug, Clone)]
pub struct SentenceChunker {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl SentenceChunker {
    /// Create a new `SentenceChunker`.
    ///
    /// # Arguments
    ///
    /// * `chunk_size` — target chunk length in bytes
    /// * `chunk_overlap` — overlap between consecutive chunks in bytes
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self { chunk_size, chunk_overlap }
    }

    /// Split `text` into trimmed, overlapping chunks.
    ///
    /// Returns a single-element vector when the text fits in one chunk.
    /// Output length is ≥ 1 for any non-empty input.
    pub fn chunk(&self, text: &str) -> Vec<String> {
        if text.len() <= self.chunk_size {
            return vec![text.trim().to_string()];
        }

        let mut chunks = Vec::new();
        let mut start = 0usize;

        while start < text.len() {
            let mut end = start + self.chunk_size;

            if end < text.len() {
                let window = &text[start..floor_char_boundary(text, end)];
                for pattern in SENTENCE_BREAKS {
                    if let Some(pos) = window.rfind(pattern) {
                        end = start + pos + pattern.len();
                        break;
                    }
                }
            }

            let mut slice_end = floor_char_boundary(text, end.min(text.len()));
            if slice_end <= start {
                slice_end = ceil_char_boundary(text, start + 1);
            }
            chunks.push(text[start..slice_end].trim().to_string());

            let next = end.saturating_sub(self.chunk_overlap);
            if next == 0 {
                // Rewinding to the beginning would never terminate; stop
                // once at least one chunk exists.
                break;
            }
            let mut advanced = floor_char_boundary(text, next);
            if advanced <= start {
                // The chosen cut sits inside the overlap zone; restarting
                // behind the previous start would re-produce the same
                // window forever. Jump past the emitted chunk instead.
                advanced = slice_end;
            }
            start = advanced;
        }

        info!(chunk_count = chunks.len(), "split document into chunks");
        chunks
    }
}

/// Largest byte index ≤ `index` that lies on a char boundary.
fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i -= 1;
    }
    i
}

/// Smallest byte index ≥ `index` that lies on a char boundary.
fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut i = index;
    while !text.is_char_boundary(i) {
        i += 1;
    }
    i
}

/// Build the metadata attached to one chunk.
///
/// Always includes `chunk_index` and `total_chunks`. `doc_id` is included
/// only when present and non-empty. Keys from `extra` are merged last and
/// override the built-in fields on collision.
pub fn chunk_metadata(
    chunk_index: usize,
    total_chunks: usize,
    doc_id: Option<&str>,
    extra: &Metadata,
) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert("chunk_index".to_string(), Value::from(chunk_index));
    metadata.insert("total_chunks".to_string(), Value::from(total_chunks));

    if let Some(id) = doc_id {
        if !id.is_empty() {
            metadata.insert("doc_id".to_string(), Value::from(id));
        }
    }

    for (key, value) in extra {
        metadata.insert(key.clone(), value.clone());
    }

    metadata
}
