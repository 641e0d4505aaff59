//! The round engine: owns "the current question".

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, info, warn};
use trebek_core::error::DomainError;
use trebek_core::question::Question;
use trebek_core::rng::DeterministicRng;
use uuid::Uuid;

use crate::application::buffer::QuestionBuffer;
use crate::application::timeout::{TimeoutGuard, TimeoutSignal, timeout_pair};
use crate::domain::answer::answers_match;
use crate::domain::hint::{HintMask, MAX_HINTS};
use crate::domain::round::{ActiveRound, HintResponse, RoundSnapshot};
use crate::domain::votes::{SkipTally, SkipVotes};
use crate::error::RoundError;

/// Default number of skip votes needed to force a skip.
pub const DEFAULT_SKIP_VOTE_THRESHOLD: usize = 3;

/// Mutable state of the current round plus the play-mode flag.
///
/// Everything except `playing` belongs to the active round and is reset
/// together by [`RoundState::clear`].
#[derive(Debug, Default)]
struct RoundState {
    active: Option<ActiveRound>,
    hint: Option<HintMask>,
    hints_used: u32,
    skip_votes: SkipVotes,
    timeout: Option<TimeoutGuard>,
    playing: bool,
}

impl RoundState {
    /// Clears the round and cancels its timeout. Returns the cleared round.
    fn clear(&mut self) -> Option<ActiveRound> {
        if let Some(timeout) = self.timeout.take() {
            timeout.cancel();
        }
        self.hint = None;
        self.hints_used = 0;
        self.skip_votes.clear();
        self.active.take()
    }
}

/// Selects questions, checks answers, grants hints and counts skip votes.
///
/// Two locks are involved: the engine's round-state lock and the question
/// buffer's lock. The buffer lock is only ever taken while holding the round
/// lock (in [`start_round`](Self::start_round)), never the reverse.
pub struct RoundEngine {
    state: Mutex<RoundState>,
    buffer: Arc<QuestionBuffer>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    skip_vote_threshold: usize,
}

impl std::fmt::Debug for RoundEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoundEngine")
            .field("buffer", &self.buffer)
            .field("skip_vote_threshold", &self.skip_vote_threshold)
            .finish_non_exhaustive()
    }
}

impl RoundEngine {
    /// Creates an idle engine.
    #[must_use]
    pub fn new(
        buffer: Arc<QuestionBuffer>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        skip_vote_threshold: usize,
    ) -> Self {
        Self {
            state: Mutex::new(RoundState::default()),
            buffer,
            rng,
            skip_vote_threshold,
        }
    }

    fn lock(&self) -> MutexGuard<'_, RoundState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a round with a random buffered question.
    ///
    /// Returns `Ok(None)` when no question is available (the source is
    /// exhausted). May block on a synchronous refill when the buffer is cold.
    ///
    /// # Errors
    ///
    /// Returns `RoundError::AlreadyActive` if a round is in progress; the
    /// active round is left untouched. Returns `RoundError::NoQuestionReady`
    /// if the source failed to deliver but is not exhausted. `Ok(None)` means
    /// the source has run dry.
    pub fn start_round(&self) -> Result<Option<ActiveRound>, RoundError> {
        let mut state = self.lock();
        if let Some(active) = &state.active {
            return Err(RoundError::AlreadyActive {
                round_id: active.id,
            });
        }

        let Some(question) = self.buffer.take_random() else {
            if self.buffer.is_exhausted() {
                info!("question source exhausted, round not started");
                return Ok(None);
            }
            warn!("no question ready, round not started");
            return Err(RoundError::NoQuestionReady);
        };

        let round = ActiveRound {
            id: Uuid::new_v4(),
            question: Arc::new(question),
        };
        state.clear();
        state.active = Some(round.clone());
        info!(round_id = %round.id, category = %round.question.category, "round started");
        Ok(Some(round))
    }

    /// Returns `true` if `submission` matches the active answer. Always
    /// `false` when no question is active.
    #[must_use]
    pub fn check_answer(&self, submission: &str) -> bool {
        let state = self.lock();
        state
            .active
            .as_ref()
            .is_some_and(|round| answers_match(submission, &round.question.answer))
    }

    /// Checks `submission` and, if correct, clears the round in the same
    /// critical section. Only one caller can ever win a given round.
    ///
    /// Returns the answered question on success.
    pub fn resolve_answer(&self, submission: &str) -> Option<Arc<Question>> {
        let mut state = self.lock();
        let correct = state
            .active
            .as_ref()
            .is_some_and(|round| answers_match(submission, &round.question.answer));
        if !correct {
            return None;
        }

        let round = state.clear()?;
        info!(round_id = %round.id, "round answered");
        Some(round.question)
    }

    /// Reveals one more character of the active answer.
    ///
    /// The hint counter only advances when a character is actually revealed.
    /// Charging for the hint is up to the caller.
    pub fn get_hint(&self) -> HintResponse {
        let mut state = self.lock();
        let Some(round) = state.active.clone() else {
            return HintResponse::NoActiveQuestion;
        };
        if state.hints_used >= MAX_HINTS {
            return HintResponse::MaxHintsReached;
        }

        let mask = state
            .hint
            .get_or_insert_with(|| HintMask::new(&round.question.answer));
        let revealed = {
            let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            mask.reveal(&mut *rng)
        };
        if !revealed {
            return HintResponse::NothingToReveal;
        }
        let rendered = mask.render();

        state.hints_used += 1;
        debug!(round_id = %round.id, hints_used = state.hints_used, "hint granted");
        HintResponse::Granted {
            category: round.question.category.clone(),
            mask: rendered,
            hints_used: state.hints_used,
        }
    }

    /// Records a skip vote for the active question.
    ///
    /// Returns [`SkipTally::IDLE`] when no question is active. Reaching the
    /// threshold does not clear the round: the caller announces the answer and
    /// then calls [`clear_round`](Self::clear_round).
    pub fn add_skip_vote(&self, user: &str) -> SkipTally {
        let mut state = self.lock();
        if state.active.is_none() {
            return SkipTally::IDLE;
        }
        let tally = state.skip_votes.cast(user, self.skip_vote_threshold);
        debug!(user, votes = tally.votes, threshold = tally.threshold, "skip vote");
        tally
    }

    /// Clears the active round, if any, cancelling its pending timeout.
    ///
    /// Returns the cleared question so the caller can still announce it.
    pub fn clear_round(&self) -> Option<Arc<Question>> {
        let round = self.lock().clear()?;
        info!(round_id = %round.id, "round cleared");
        Some(round.question)
    }

    /// Clears the round `round_id` because its timeout fired. Does nothing if
    /// a different round (or none) is active.
    pub fn expire_round(&self, round_id: Uuid) -> Option<Arc<Question>> {
        let mut state = self.lock();
        if state.active.as_ref().map(|round| round.id) != Some(round_id) {
            return None;
        }
        let round = state.clear()?;
        info!(round_id = %round.id, "round timed out");
        Some(round.question)
    }

    /// Arms a timeout for the round `round_id`, replacing (and cancelling)
    /// any timeout already armed for it.
    ///
    /// Returns `None` if that round is no longer active.
    pub fn arm_timeout(&self, round_id: Uuid) -> Option<TimeoutSignal> {
        let mut state = self.lock();
        if state.active.as_ref().map(|round| round.id) != Some(round_id) {
            return None;
        }
        let (guard, signal) = timeout_pair();
        if let Some(previous) = state.timeout.replace(guard) {
            previous.cancel();
        }
        Some(signal)
    }

    /// Sets the continuous-play flag.
    pub fn set_playing(&self, playing: bool) {
        self.lock().playing = playing;
    }

    /// Returns the continuous-play flag.
    #[must_use]
    pub fn is_playing(&self) -> bool {
        self.lock().playing
    }

    /// Turns continuous play on. Returns `false` if it was already on.
    pub fn begin_play(&self) -> bool {
        let mut state = self.lock();
        !std::mem::replace(&mut state.playing, true)
    }

    /// Turns continuous play off. Returns `false` if it was already off.
    pub fn end_play(&self) -> bool {
        let mut state = self.lock();
        std::mem::replace(&mut state.playing, false)
    }

    /// Returns the active question, if any.
    #[must_use]
    pub fn active_question(&self) -> Option<Arc<Question>> {
        self.lock()
            .active
            .as_ref()
            .map(|round| Arc::clone(&round.question))
    }

    /// Returns the active round, if any.
    #[must_use]
    pub fn active_round(&self) -> Option<ActiveRound> {
        self.lock().active.clone()
    }

    /// Returns `true` if a question is active while continuous play is on,
    /// read under one lock.
    #[must_use]
    pub fn is_playing_round(&self) -> bool {
        let state = self.lock();
        state.playing && state.active.is_some()
    }

    /// Number of hints granted for the active question.
    #[must_use]
    pub fn hints_used(&self) -> u32 {
        self.lock().hints_used
    }

    /// The configured skip quorum.
    #[must_use]
    pub fn skip_vote_threshold(&self) -> usize {
        self.skip_vote_threshold
    }

    /// A consistent view of the engine for status reporting.
    #[must_use]
    pub fn snapshot(&self) -> RoundSnapshot {
        let state = self.lock();
        let question = state.active.as_ref().map(|round| &round.question);
        RoundSnapshot {
            playing: state.playing,
            active: question.is_some(),
            category: question.map(|q| q.category.clone()),
            prompt: question.map(|q| q.prompt.clone()),
            hints_used: state.hints_used,
            skip_votes: state.skip_votes.len(),
            skip_vote_threshold: self.skip_vote_threshold,
        }
    }

    /// Closes the question source. Rounds can still start from questions
    /// already buffered.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it could not be released cleanly.
    pub fn close_source(&self) -> Result<(), DomainError> {
        self.buffer.close()
    }
}
