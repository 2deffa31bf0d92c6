//! Recursive text chunking with greedy merge and sliding overlap.
//!
//! Documents split along a separator hierarchy (paragraphs, then lines, then
//! sentences, then words) so chunk boundaries land on natural seams whenever
//! possible. Adjacent small pieces merge back together up to the size budget,
//! and each chunk after the first carries a tail of its predecessor so context
//! survives the cut.

/// Separator hierarchy, coarsest first. A hard character cut is the fallback
/// when no separator fits.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", ". ", " "];

/// One chunk of a source document.
///
/// `text` includes the overlap prefix; the first `overlap` characters repeat
/// the tail of the preceding chunk. Stripping that prefix from every chunk and
/// concatenating the remainders reconstructs the original document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub text: String,
    pub source: String,
    pub index: u32,
    /// Overlap prefix length in characters.
    pub overlap: usize,
    /// Hex-encoded blake3 hash of `text`.
    pub content_hash: String,
}

impl Chunk {
    /// The chunk text without the overlap prefix.
    #[must_use]
    pub fn body(&self) -> &str {
        &self.text[byte_at_char(&self.text, self.overlap)..]
    }
}

/// Chunker configuration.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Maximum chunk size in characters, overlap included (default: 500).
    pub max_size: usize,
    /// Characters of the previous chunk repeated at the start of the next
    /// (default: 50). Must be smaller than `max_size`.
    pub overlap: usize,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_size: 500,
            overlap: 50,
        }
    }
}

/// Split a document into overlapping chunks.
///
/// Deterministic: the same text and config always produce the same chunks.
/// An empty document produces no chunks.
#[must_use]
pub fn chunk_document(text: &str, source: &str, config: &ChunkerConfig) -> Vec<Chunk> {
    if text.is_empty() {
        return Vec::new();
    }

    let budget = config.max_size.saturating_sub(config.overlap).max(1);
    let mut pieces = Vec::new();
    split_pieces(text, budget, 0, &mut pieces);
    let pieces = merge_pieces(pieces, budget);

    let mut chunks: Vec<Chunk> = Vec::with_capacity(pieces.len());
    for (i, piece) in pieces.iter().enumerate() {
        let (text, overlap) = match chunks.last() {
            Some(prev) => {
                let tail = char_tail(&prev.text, config.overlap);
                (format!("{tail}{piece}"), char_len(tail))
            }
            None => (piece.clone(), 0),
        };
        let content_hash = blake3::hash(text.as_bytes()).to_hex().to_string();
        chunks.push(Chunk {
            text,
            source: source.to_owned(),
            index: u32::try_from(i).unwrap_or(u32::MAX),
            overlap,
            content_hash,
        });
    }
    chunks
}

/// Recursively split `text` into pieces of at most `budget` characters,
/// preferring coarser separators. Separators stay attached to the piece that
/// precedes them so concatenating all pieces reproduces `text`.
fn split_pieces(text: &str, budget: usize, level: usize, out: &mut Vec<String>) {
    if text.is_empty() {
        return;
    }
    if char_len(text) <= budget {
        out.push(text.to_owned());
        return;
    }
    if level >= SEPARATORS.len() {
        hard_split(text, budget, out);
        return;
    }
    let sep = SEPARATORS[level];
    if !text.contains(sep) {
        split_pieces(text, budget, level + 1, out);
        return;
    }
    for piece in text.split_inclusive(sep) {
        if char_len(piece) > budget {
            split_pieces(piece, budget, level + 1, out);
        } else {
            out.push(piece.to_owned());
        }
    }
}

/// Cut on character boundaries when no separator helps.
fn hard_split(text: &str, budget: usize, out: &mut Vec<String>) {
    let mut rest = text;
    while char_len(rest) > budget {
        let cut = byte_at_char(rest, budget);
        out.push(rest[..cut].to_owned());
        rest = &rest[cut..];
    }
    if !rest.is_empty() {
        out.push(rest.to_owned());
    }
}

/// Greedily merge adjacent pieces while the combination stays within budget.
fn merge_pieces(pieces: Vec<String>, budget: usize) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(pieces.len());
    for piece in pieces {
        if let Some(last) = merged.last_mut()
            && char_len(last) + char_len(&piece) <= budget
        {
            last.push_str(&piece);
        } else {
            merged.push(piece);
        }
    }
    merged
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Byte offset of the `n`-th character, or `s.len()` past the end.
fn byte_at_char(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map_or(s.len(), |(i, _)| i)
}

/// The last `n` characters of `s`.
fn char_tail(s: &str, n: usize) -> &str {
    let len = char_len(s);
    if len <= n {
        s
    } else {
        &s[byte_at_char(s, len - n)..]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(max_size: usize, overlap: usize) -> ChunkerConfig {
        ChunkerConfig { max_size, overlap }
    }

    #[test]
    fn empty_document_produces_no_chunks() {
        let chunks = chunk_document("", "doc.txt", &ChunkerConfig::default());
        assert!(chunks.is_empty());
    }

    #[test]
    fn short_document_is_a_single_chunk() {
        let chunks = chunk_document("La garantía dura dos años.", "doc.txt", &ChunkerConfig::default());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "La garantía dura dos años.");
        assert_eq!(chunks[0].overlap, 0);
        assert_eq!(chunks[0].index, 0);
    }

    #[test]
    fn chunks_never_exceed_max_size() {
        let text = "Una frase sobre productos. ".repeat(100);
        let cfg = config(120, 20);
        let chunks = chunk_document(&text, "doc.txt", &cfg);
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= cfg.max_size);
        }
    }

    #[test]
    fn overlap_prefix_matches_previous_tail() {
        let text = "Una frase sobre productos. ".repeat(100);
        let cfg = config(120, 20);
        let chunks = chunk_document(&text, "doc.txt", &cfg);
        for pair in chunks.windows(2) {
            let tail = char_tail(&pair[0].text, cfg.overlap);
            assert!(pair[1].text.starts_with(tail));
            assert_eq!(pair[1].overlap, tail.chars().count());
        }
    }

    #[test]
    fn stripping_overlap_reconstructs_document() {
        let text = "Primer párrafo con detalles.\n\nSegundo párrafo. ".repeat(40);
        let chunks = chunk_document(&text, "doc.txt", &config(150, 30));
        let rebuilt: String = chunks.iter().map(Chunk::body).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn prefers_paragraph_boundaries() {
        let para_a = "a".repeat(300);
        let para_b = "b".repeat(300);
        let text = format!("{para_a}\n\n{para_b}");
        let chunks = chunk_document(&text, "doc.txt", &config(500, 50));
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].text, format!("{para_a}\n\n"));
        assert!(chunks[1].body().starts_with(&para_b));
    }

    #[test]
    fn unbroken_text_falls_back_to_hard_split() {
        let text = "x".repeat(1000);
        let cfg = config(100, 10);
        let chunks = chunk_document(&text, "doc.txt", &cfg);
        for chunk in &chunks {
            assert!(chunk.text.chars().count() <= cfg.max_size);
        }
        let rebuilt: String = chunks.iter().map(Chunk::body).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let text = "ñ".repeat(1000);
        let chunks = chunk_document(&text, "doc.txt", &config(100, 10));
        let rebuilt: String = chunks.iter().map(Chunk::body).collect();
        assert_eq!(rebuilt, text);
    }

    #[test]
    fn indices_are_sequential() {
        let text = "Una frase. ".repeat(200);
        let chunks = chunk_document(&text, "doc.txt", &config(100, 10));
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(chunk.index as usize, i);
        }
    }

    #[test]
    fn chunking_is_deterministic() {
        let text = "Política de devoluciones. Treinta días. ".repeat(50);
        let a = chunk_document(&text, "doc.txt", &ChunkerConfig::default());
        let b = chunk_document(&text, "doc.txt", &ChunkerConfig::default());
        assert_eq!(a, b);
    }
}
