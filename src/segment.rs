//! Sentence segmentation
//!
//! Splits document text into utterances: one per sentence, where a sentence
//! ends at a run of `.`, `!` or `?` followed by whitespace, or at a line
//! break. Empty fragments are dropped.

use regex::Regex;

/// Split raw document text into utterances
pub fn split_sentences(text: &str) -> Vec<String> {
    let cleaned = text.trim();
    if cleaned.is_empty() {
        return Vec::new();
    }

    let newlines = Regex::new(r"\n+").unwrap();
    let boundary = Regex::new(r"[.!?]+\s+").unwrap();

    let mut sentences = Vec::new();
    for line in newlines.split(cleaned) {
        let mut rest_start = 0;
        for m in boundary.find_iter(line) {
            // The sentence keeps its trailing punctuation; the whitespace
            // that follows it is the cut point.
            let end = m.start() + m.as_str().trim_end().len();
            push_fragment(&mut sentences, &line[rest_start..end]);
            rest_start = m.end();
        }
        push_fragment(&mut sentences, &line[rest_start..]);
    }

    sentences
}

fn push_fragment(sentences: &mut Vec<String>, fragment: &str) {
    let trimmed = fragment.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
