//! Heuristic check for vague or hedged LLM output.
//!
//! A pure function over the response text: no configuration, no side
//! effects, no external calls. A flagged response is discarded in favor of
//! the fallback message.

/// Phrases whose mere presence flags the response as vague.
const VAGUE_PHRASES: &[&str] = &[
    "not sure",
    "i'm not sure",
    "i don't know",
    "depends",
    "it depends",
    "maybe",
    "possibly",
    "perhaps",
    "could be",
    "might be",
    "i think",
    "i believe",
    "in my opinion",
    "generally",
    "typically",
    "usually",
    "sometimes",
    "often",
    "frequently",
    "rarely",
    "hard to say",
    "difficult to determine",
    "unclear",
    "ambiguous",
    "vague",
    "complex",
    "complicated",
    "varies",
    "varies depending",
    "context dependent",
];

/// Secondary hedging words; three or more distinct hits flag the response.
const HEDGING_WORDS: &[&str] = &["maybe", "perhaps", "possibly", "might", "could", "would", "should"];

/// Maximum word count before a response counts as rambling.
const MAX_WORD_COUNT: usize = 100;

/// True when the response hedges, rambles, or both:
/// any phrase from the primary list (case-insensitive substring), more than
/// 100 words, or at least 3 distinct secondary hedging words.
pub fn is_vague_response(response: &str) -> bool {
    let response_lower = response.to_lowercase();

    if VAGUE_PHRASES
        .iter()
        .any(|phrase| response_lower.contains(phrase))
    {
        return true;
    }

    if response.split_whitespace().count() > MAX_WORD_COUNT {
        return true;
    }

    let hedging_count = HEDGING_WORDS
        .iter()
        .filter(|word| response_lower.contains(*word))
        .count();
    hedging_count >= 3
}
