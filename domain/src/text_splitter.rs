//! Recursive, length-bounded text splitting.
//!
//! Text is cut on the coarsest separator it contains (paragraphs, then lines,
//! then words, then single characters). Separators stay attached to the piece
//! before them, so the pieces of a text always tile it exactly. Small pieces are
//! merged greedily into chunks of at most `chunk_size` characters; pieces that
//! are still too large are split again with the finer separators.
//!
//! Consecutive chunks share a tail of at most `chunk_overlap` characters, and
//! every chunk records its byte span in the source so the original text can be
//! stitched back together with [`stitch`].

use std::collections::VecDeque;
use std::ops::Range;

use crate::models::Chunk;

/// Paragraph, line, word, character.
pub const DEFAULT_SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

pub const DEFAULT_CHUNK_SIZE: usize = 500;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

type Span = Range<usize>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveTextSplitter {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl Default for RecursiveTextSplitter {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE, DEFAULT_CHUNK_OVERLAP)
    }
}

impl RecursiveTextSplitter {
    /// `chunk_size` is raised to at least 1 and `chunk_overlap` is capped below it;
    /// callers validate user-supplied values before getting here.
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        let chunk_size = chunk_size.max(1);
        Self {
            chunk_size,
            chunk_overlap: chunk_overlap.min(chunk_size - 1),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_overlap(&self) -> usize {
        self.chunk_overlap
    }

    /// Split `text` into ordered chunks. Empty input yields no chunks.
    pub fn split(&self, text: &str) -> Vec<Chunk> {
        if text.is_empty() {
            return Vec::new();
        }

        let mut spans = Vec::new();
        self.split_span(text, 0..text.len(), &DEFAULT_SEPARATORS, &mut spans);

        spans
            .into_iter()
            .enumerate()
            .map(|(position, span)| Chunk {
                position,
                text: text[span.clone()].to_string(),
                start: span.start,
                end: span.end,
            })
            .collect()
    }

    fn split_span(&self, text: &str, span: Span, separators: &[&str], out: &mut Vec<Span>) {
        let slice = &text[span.clone()];
        let chosen = separators
            .iter()
            .position(|sep| sep.is_empty() || slice.contains(*sep));

        let (pieces, finer) = match chosen {
            Some(i) if !separators[i].is_empty() => (
                pieces_keeping_separator(slice, span.start, separators[i]),
                &separators[i + 1..],
            ),
            Some(i) => (char_pieces(slice, span.start), &separators[i + 1..]),
            None => (char_pieces(slice, span.start), &separators[separators.len()..]),
        };

        let mut pending: Vec<Span> = Vec::new();
        for piece in pieces {
            if char_len(text, &piece) <= self.chunk_size {
                pending.push(piece);
                continue;
            }
            if !pending.is_empty() {
                self.merge(text, &pending, out);
                pending.clear();
            }
            self.split_span(text, piece, finer, out);
        }
        if !pending.is_empty() {
            self.merge(text, &pending, out);
        }
    }

    /// Greedily pack adjacent pieces into chunks, carrying a short tail forward.
    fn merge(&self, text: &str, pieces: &[Span], out: &mut Vec<Span>) {
        let mut window: VecDeque<(Span, usize)> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let len = char_len(text, piece);
            if total + len > self.chunk_size && !window.is_empty() {
                out.push(window_span(&window));
                while total > self.chunk_overlap || (total > 0 && total + len > self.chunk_size) {
                    match window.pop_front() {
                        Some((_, dropped)) => total -= dropped,
                        None => break,
                    }
                }
            }
            window.push_back((piece.clone(), len));
            total += len;
        }

        if !window.is_empty() {
            out.push(window_span(&window));
        }
    }
}

/// Rebuild the source from its chunks by appending each chunk's non-overlapping part.
pub fn stitch(chunks: &[Chunk]) -> String {
    let mut out = String::new();
    let mut cursor = 0usize;
    for chunk in chunks {
        let skip = cursor.saturating_sub(chunk.start).min(chunk.text.len());
        out.push_str(&chunk.text[skip..]);
        cursor = cursor.max(chunk.end);
    }
    out
}

fn window_span(window: &VecDeque<(Span, usize)>) -> Span {
    match (window.front(), window.back()) {
        (Some((first, _)), Some((last, _))) => first.start..last.end,
        _ => 0..0,
    }
}

fn char_len(text: &str, span: &Span) -> usize {
    text[span.clone()].chars().count()
}

/// Split `slice` after every occurrence of `separator`; spans are absolute.
fn pieces_keeping_separator(slice: &str, offset: usize, separator: &str) -> Vec<Span> {
    let mut pieces = Vec::new();
    let mut start = 0;
    while let Some(pos) = slice[start..].find(separator) {
        let end = start + pos + separator.len();
        pieces.push(offset + start..offset + end);
        start = end;
    }
    if start < slice.len() {
        pieces.push(offset + start..offset + slice.len());
    }
    pieces
}

fn char_pieces(slice: &str, offset: usize) -> Vec<Span> {
    slice
        .char_indices()
        .map(|(i, c)| offset + i..offset + i + c.len_utf8())
        .collect()
}
