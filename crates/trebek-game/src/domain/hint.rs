//! Progressive hint masks.

use trebek_core::rng::DeterministicRng;

/// Maximum number of hints granted per question.
pub const MAX_HINTS: u32 = 3;

/// Random picks attempted before falling back to the first masked slot.
const REVEAL_ATTEMPTS: usize = 5;

const MASKED: char = '_';

/// A partially revealed rendering of an answer.
///
/// One slot per character of the trimmed answer. Whitespace slots start
/// revealed; every other slot starts masked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintMask {
    answer: Vec<char>,
    revealed: Vec<bool>,
}

impl HintMask {
    /// Builds a fresh mask for `answer`.
    #[must_use]
    pub fn new(answer: &str) -> Self {
        let answer: Vec<char> = answer.trim().chars().collect();
        let revealed = answer.iter().map(|c| c.is_whitespace()).collect();
        Self { answer, revealed }
    }

    /// Reveals one masked slot and returns `true`, or returns `false` when
    /// nothing is left to reveal.
    ///
    /// Tries a few random slots first; if they all land on revealed slots,
    /// reveals the first masked slot so every call makes progress.
    pub fn reveal(&mut self, rng: &mut dyn DeterministicRng) -> bool {
        let len = self.answer.len();
        if len == 0 {
            return false;
        }

        for _ in 0..REVEAL_ATTEMPTS {
            let index = rng.next_index(len);
            if !self.revealed[index] {
                self.revealed[index] = true;
                return true;
            }
        }

        match self.revealed.iter().position(|r| !r) {
            Some(index) => {
                self.revealed[index] = true;
                true
            }
            None => false,
        }
    }

    /// Number of slots still masked.
    #[must_use]
    pub fn masked(&self) -> usize {
        self.revealed.iter().filter(|r| !**r).count()
    }

    /// Renders the mask, `_` standing in for hidden characters.
    #[must_use]
    pub fn render(&self) -> String {
        self.answer
            .iter()
            .zip(&self.revealed)
            .map(|(c, revealed)| if *revealed { *c } else { MASKED })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trebek_test_support::{MockRng, SequenceRng};

    #[test]
    fn test_new_mask_reveals_only_whitespace() {
        let mask = HintMask::new("  New York ");
        assert_eq!(mask.render(), "___ ____");
        assert_eq!(mask.masked(), 7);
    }

    #[test]
    fn test_reveal_uses_random_slot() {
        let mut mask = HintMask::new("Paris");
        let mut rng = SequenceRng::new(vec![3]);

        assert!(mask.reveal(&mut rng));

        assert_eq!(mask.render(), "___i_");
    }

    #[test]
    fn test_reveal_falls_back_to_first_masked_slot() {
        let mut mask = HintMask::new("a b");
        // Slot 1 is whitespace (pre-revealed), so every random pick misses.
        let mut rng = SequenceRng::new(vec![1]);

        assert!(mask.reveal(&mut rng));
        assert_eq!(mask.render(), "a _");

        assert!(mask.reveal(&mut rng));
        assert_eq!(mask.render(), "a b");
    }

    #[test]
    fn test_reveal_reports_exhaustion() {
        let mut mask = HintMask::new("ab");
        let mut rng = MockRng;

        assert!(mask.reveal(&mut rng));
        assert!(mask.reveal(&mut rng));
        assert!(!mask.reveal(&mut rng));
        assert_eq!(mask.render(), "ab");
    }

    #[test]
    fn test_underscore_in_answer_is_still_masked() {
        let mut mask = HintMask::new("a_b");
        assert_eq!(mask.masked(), 3);

        let mut rng = SequenceRng::new(vec![1]);
        assert!(mask.reveal(&mut rng));
        assert_eq!(mask.masked(), 2);
    }

    #[test]
    fn test_empty_answer_has_nothing_to_reveal() {
        let mut mask = HintMask::new("   ");
        assert!(!mask.reveal(&mut MockRng));
        assert_eq!(mask.render(), "");
    }
}
