//! Document text segmentation.
//!
//! Splits raw document text into fixed-size character chunks, then into
//! sentence-level units. Chunk boundaries are purely positional and may fall
//! mid-sentence; the sentence split inside each chunk is heuristic
//! (punctuation- and capitalization-aware) so that abbreviations and decimal
//! numbers do not produce spurious breaks.
//!
//! Both passes are pure functions of their input: segmenting the same text
//! twice yields identical output.

/// Words that end with a period without ending a sentence.
const ABBREVIATIONS: &[&str] = &[
    "mr", "mrs", "ms", "dr", "prof", "sr", "jr", "st", "vs", "etc", "approx", "dept", "fig", "no",
    "vol", "inc", "ltd", "co", "eg", "ie",
];

/// Split text into contiguous chunks of at most `chunk_size` characters.
///
/// No overlap and no re-balancing at sentence boundaries: concatenating the
/// returned slices reconstructs the input exactly.
pub fn split_chunks(text: &str, chunk_size: usize) -> Vec<&str> {
    let chunk_size = chunk_size.max(1);

    let mut chunks = Vec::new();
    let mut start = 0;
    let mut count = 0;

    for (idx, _) in text.char_indices() {
        if count == chunk_size {
            chunks.push(&text[start..idx]);
            start = idx;
            count = 0;
        }
        count += 1;
    }
    if start < text.len() {
        chunks.push(&text[start..]);
    }

    chunks
}

/// Split a chunk into sentence-like units.
///
/// A run of `.`, `!`, or `?` (plus any trailing closing quotes/brackets)
/// ends a sentence when it is followed by whitespace and the next visible
/// character starts a new sentence (uppercase, digit, or opening quote).
/// A period does not end a sentence after a known abbreviation or a single
/// capital initial, or when it sits between digits.
pub fn split_sentences(text: &str) -> Vec<String> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let mut sentences = Vec::new();
    let mut start = 0usize;
    let mut i = 0usize;

    while i < chars.len() {
        let (pos, c) = chars[i];
        if matches!(c, '.' | '!' | '?') {
            // Absorb terminator runs ("..", "?!") and closing punctuation.
            let mut j = i + 1;
            while j < chars.len() && matches!(chars[j].1, '.' | '!' | '?' | '"' | '\'' | ')' | ']')
            {
                j += 1;
            }

            if is_sentence_boundary(text, &chars, pos, c, j) {
                let end = chars.get(j).map(|&(p, _)| p).unwrap_or(text.len());
                sentences.push(text[start..end].to_string());
                start = end;
                i = j;
                continue;
            }
        }
        i += 1;
    }

    if start < text.len() {
        sentences.push(text[start..].to_string());
    }

    sentences
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn is_sentence_boundary(
    text: &str,
    chars: &[(usize, char)],
    pos: usize,
    terminator: char,
    run_end: usize,
) -> bool {
    // End of text always closes the sentence.
    let Some(&(_, next)) = chars.get(run_end) else {
        return true;
    };

    // No whitespace after the run: decimals ("3.14"), versions, file names.
    if !next.is_whitespace() {
        return false;
    }

    // Find the first visible character after the whitespace.
    let follower = chars[run_end..]
        .iter()
        .map(|&(_, ch)| ch)
        .find(|ch| !ch.is_whitespace());

    let continues = match follower {
        Some(ch) => ch.is_uppercase() || ch.is_ascii_digit() || matches!(ch, '"' | '\'' | '(' | '['),
        // Trailing whitespace only.
        None => true,
    };
    if !continues {
        return false;
    }

    // Periods after abbreviations or single-letter initials keep the
    // sentence open; `!` and `?` are unambiguous.
    if terminator == '.' {
        let word: String = text[..pos]
            .chars()
            .rev()
            .take_while(|ch| ch.is_alphanumeric())
            .collect::<String>()
            .chars()
            .rev()
            .collect();

        if ABBREVIATIONS.contains(&word.to_lowercase().as_str()) {
            return false;
        }
        if word.len() == 1 && word.chars().all(|ch| ch.is_uppercase()) {
            return false;
        }
    }

    true
}

/// Split document text into ordered sentence units: `chunk_size`-bounded
/// chunks, each re-split into sentences, trimmed, empties discarded.
///
/// This is the unit of granularity stored as segments.
pub fn segment_text(text: &str, chunk_size: usize) -> Vec<String> {
    split_chunks(text, chunk_size)
        .into_iter()
        .flat_map(split_sentences)
        .collect()
}
