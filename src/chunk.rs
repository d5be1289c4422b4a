//! Two-stage text chunker.
//!
//! Stage one splits a document into coarse sections on runs of two or more
//! blank lines. Stage two splits each section into size-bounded sub-chunks by
//! recursively trying a descending list of separators (paragraph break, line
//! break, sentence end, space, hard character cut), merging adjacent pieces up
//! to the size budget and carrying trailing context into the next chunk.
//!
//! Chunking state resets at section boundaries: no sub-chunk spans two
//! sections and overlap only applies within a section. Every produced chunk
//! carries a global index that runs across all sections in traversal order.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::Chunk;

pub const DEFAULT_CHUNK_SIZE: usize = 1000;
pub const DEFAULT_CHUNK_OVERLAP: usize = 300;

/// Separator priority for bounded splitting. The empty string is a hard
/// per-character cut and guarantees the size bound when present.
pub const SEPARATORS: [&str; 5] = ["\n\n", "\n", ". ", " ", ""];

/// A section boundary is at least three newline-delimited breaks, i.e. two or
/// more blank lines, possibly containing other whitespace.
static SECTION_BOUNDARY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n\s*\n\s*\n+").unwrap());

/// Unify line endings so the section boundary pattern only has to deal
/// with `\n`.
pub fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}

/// Split normalized text into trimmed, non-empty sections. Candidates that
/// trim to nothing are dropped and do not consume section indices.
pub fn split_sections(text: &str) -> Vec<&str> {
    SECTION_BOUNDARY
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

/// Split one section into chunks of at most `chunk_size` characters with up
/// to `chunk_overlap` characters of trailing context carried between
/// consecutive chunks.
///
/// The first separator in `separators` that occurs in the text is used;
/// pieces still over budget recurse into the remaining separators. A piece
/// that no remaining separator can subdivide is emitted oversized rather than
/// truncated.
pub fn split_bounded(
    text: &str,
    separators: &[&str],
    chunk_size: usize,
    chunk_overlap: usize,
) -> Vec<String> {
    let mut final_chunks = Vec::new();

    let mut separator = separators.last().copied().unwrap_or("");
    let mut next_separators: &[&str] = &[];
    for (i, s) in separators.iter().enumerate() {
        if s.is_empty() {
            separator = "";
            break;
        }
        if text.contains(s) {
            separator = s;
            next_separators = &separators[i + 1..];
            break;
        }
    }

    let splits = split_keep_separator(text, separator);

    // Pieces within budget accumulate until one is oversized; that piece
    // either recurses into finer separators or goes out as-is.
    let mut within_budget: Vec<&str> = Vec::new();
    for piece in splits {
        if char_len(piece) < chunk_size {
            within_budget.push(piece);
        } else {
            if !within_budget.is_empty() {
                merge_pieces(&within_budget, chunk_size, chunk_overlap, &mut final_chunks);
                within_budget.clear();
            }
            if next_separators.is_empty() {
                final_chunks.push(piece.to_string());
            } else {
                final_chunks.extend(split_bounded(
                    piece,
                    next_separators,
                    chunk_size,
                    chunk_overlap,
                ));
            }
        }
    }
    if !within_budget.is_empty() {
        merge_pieces(&within_budget, chunk_size, chunk_overlap, &mut final_chunks);
    }

    final_chunks
}

/// Run the full two-stage pipeline over raw document text. Returns chunks
/// tagged with (section, sub-chunk, global) indices; the global index is
/// dense and zero-based across the whole document. Empty or whitespace-only
/// input yields no chunks.
pub fn chunk_document(text: &str, chunk_size: usize, chunk_overlap: usize) -> Vec<Chunk> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    let normalized = normalize_newlines(text);

    let mut chunks = Vec::new();
    let mut global_index = 0;
    for (section_index, section) in split_sections(&normalized).into_iter().enumerate() {
        let pieces = split_bounded(section, &SEPARATORS, chunk_size, chunk_overlap);
        for (subchunk_index, piece) in pieces.into_iter().enumerate() {
            chunks.push(Chunk {
                text: piece,
                section_index,
                subchunk_index,
                chunk_index: global_index,
            });
            global_index += 1;
        }
    }
    chunks
}

/// Split on `sep`, keeping each occurrence attached to the front of the
/// following piece so that concatenating the pieces reproduces the input.
/// An empty `sep` splits into single characters.
fn split_keep_separator<'a>(text: &'a str, sep: &str) -> Vec<&'a str> {
    let mut pieces: Vec<&str> = Vec::new();
    if sep.is_empty() {
        pieces.extend(
            text.char_indices()
                .map(|(i, c)| &text[i..i + c.len_utf8()]),
        );
    } else {
        let starts: Vec<usize> = text.match_indices(sep).map(|(i, _)| i).collect();
        if starts.is_empty() {
            pieces.push(text);
        } else {
            if starts[0] > 0 {
                pieces.push(&text[..starts[0]]);
            }
            for (n, &start) in starts.iter().enumerate() {
                let end = starts.get(n + 1).copied().unwrap_or(text.len());
                pieces.push(&text[start..end]);
            }
        }
    }
    pieces.retain(|p| !p.is_empty());
    pieces
}

/// Greedily merge pieces into chunks of at most `chunk_size` characters.
/// When a chunk is emitted, leading pieces are dropped until at most
/// `chunk_overlap` characters remain; those become the start of the next
/// chunk. Every piece here is strictly under `chunk_size`.
fn merge_pieces(pieces: &[&str], chunk_size: usize, chunk_overlap: usize, out: &mut Vec<String>) {
    let mut window: std::collections::VecDeque<&str> = std::collections::VecDeque::new();
    let mut total = 0;

    for &piece in pieces {
        let piece_len = char_len(piece);
        if total + piece_len > chunk_size && !window.is_empty() {
            if let Some(joined) = join_window(&window) {
                out.push(joined);
            }
            while total > chunk_overlap || (total + piece_len > chunk_size && total > 0) {
                if let Some(dropped) = window.pop_front() {
                    total -= char_len(dropped);
                } else {
                    break;
                }
            }
        }
        window.push_back(piece);
        total += piece_len;
    }

    if let Some(joined) = join_window(&window) {
        out.push(joined);
    }
}

/// Concatenate window pieces and trim; a window that trims to nothing
/// produces no chunk.
fn join_window(window: &std::collections::VecDeque<&str>) -> Option<String> {
    let joined: String = window.iter().copied().collect();
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Budget accounting is in characters, not bytes, so multi-byte scripts do
/// not get shortchanged.
fn char_len(s: &str) -> usize {
    s.chars().count()
}
