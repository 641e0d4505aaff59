//! Skip-vote tallying.

use std::collections::HashSet;

use serde::Serialize;

/// Result of casting a skip vote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkipTally {
    /// Distinct voters so far.
    pub votes: usize,
    /// Votes needed to skip.
    pub threshold: usize,
    /// `true` once the tally has reached the threshold with this vote.
    pub skip_now: bool,
}

impl SkipTally {
    /// The tally reported when no question is active.
    pub const IDLE: Self = Self {
        votes: 0,
        threshold: 0,
        skip_now: false,
    };
}

/// The set of players who voted to skip the active question.
#[derive(Debug, Clone, Default)]
pub struct SkipVotes {
    voters: HashSet<String>,
}

impl SkipVotes {
    /// Records `user`'s vote against `threshold`.
    ///
    /// A repeat vote leaves the tally unchanged and never triggers a skip.
    pub fn cast(&mut self, user: &str, threshold: usize) -> SkipTally {
        if !self.voters.insert(user.to_owned()) {
            return SkipTally {
                votes: self.voters.len(),
                threshold,
                skip_now: false,
            };
        }

        let votes = self.voters.len();
        SkipTally {
            votes,
            threshold,
            skip_now: votes >= threshold,
        }
    }

    /// Number of distinct voters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.voters.len()
    }

    /// Returns `true` if nobody has voted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }

    /// Forgets every vote.
    pub fn clear(&mut self) {
        self.voters.clear();
    }
}
