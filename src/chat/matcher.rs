//! Lexical FAQ matching: exact equality first, then three partial
//! strategies in fixed priority order.

use crate::models::FaqRecord;

/// Case-insensitive full-string equality between the message and a
/// record's question.
pub fn exact_match<'a>(message: &str, records: &'a [FaqRecord]) -> Option<&'a FaqRecord> {
    let message_lower = message.trim().to_lowercase();
    records
        .iter()
        .find(|record| record.question.to_lowercase() == message_lower)
}

/// Partial matching, first hit wins:
/// 1. the message contains a record's question;
/// 2. a record's question contains the message;
/// 3. for multi-word messages, any single word longer than 2 characters
///    appears inside some question.
///
/// Strategy 3 trades precision for recall on short common words; it is a
/// deliberate tunable of the corpus, kept as-is.
pub fn partial_match<'a>(message: &str, records: &'a [FaqRecord]) -> Option<&'a FaqRecord> {
    let q = message.trim().to_lowercase();

    for record in records {
        if q.contains(&record.question.to_lowercase()) {
            return Some(record);
        }
    }

    for record in records {
        if record.question.to_lowercase().contains(&q) {
            return Some(record);
        }
    }

    let words: Vec<&str> = q.split_whitespace().collect();
    if words.len() > 1 {
        for word in words {
            if word.chars().count() > 2 {
                for record in records {
                    if record.question.to_lowercase().contains(word) {
                        return Some(record);
                    }
                }
            }
        }
    }

    None
}
