//! Answer normalization and matching.

/// Lowercases, trims, and strips every character that is not a letter or a
/// digit.
///
/// Idempotent: `normalize(&normalize(s)) == normalize(s)`.
#[must_use]
pub fn normalize(text: &str) -> String {
    text.trim()
        .chars()
        .flat_map(char::to_lowercase)
        .filter(|c| c.is_alphanumeric())
        .collect()
}

/// Returns `true` if `submission` matches `answer` once both are normalized.
#[must_use]
pub fn answers_match(submission: &str, answer: &str) -> bool {
    normalize(submission) == normalize(answer)
}
