//! Prefetch buffer between the question source and the round engine.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::runtime::Handle;
use tracing::{debug, info, warn};
use trebek_core::error::DomainError;
use trebek_core::question::{Question, QuestionSource};
use trebek_core::rng::DeterministicRng;

/// Default low-water mark of the prefetch pool.
pub const DEFAULT_TARGET: usize = 3;

struct BufferState {
    pool: Vec<Question>,
    source: Box<dyn QuestionSource>,
    exhausted: bool,
}

/// A small pool of ready-to-serve questions kept warm ahead of demand.
///
/// All access to the source goes through this buffer's lock, so the source is
/// read by at most one task at a time. The lock may be taken while the round
/// engine's lock is held, never the other way round.
pub struct QuestionBuffer {
    state: Mutex<BufferState>,
    rng: Arc<Mutex<dyn DeterministicRng + Send>>,
    target: usize,
}

impl std::fmt::Debug for QuestionBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuestionBuffer")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl QuestionBuffer {
    /// Creates an empty buffer over `source`. Call [`refill`](Self::refill)
    /// to warm it up.
    #[must_use]
    pub fn new(
        source: Box<dyn QuestionSource>,
        rng: Arc<Mutex<dyn DeterministicRng + Send>>,
        target: usize,
    ) -> Self {
        Self {
            state: Mutex::new(BufferState {
                pool: Vec::with_capacity(target),
                source,
                exhausted: false,
            }),
            rng,
            target,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BufferState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Pulls from the source until the pool reaches its target, the source is
    /// exhausted, or the source fails. Returns the number of questions pulled.
    ///
    /// A source failure ends this attempt without surfacing; the next refill
    /// tries again.
    pub fn refill(&self) -> usize {
        let mut state = self.lock();
        self.refill_locked(&mut state)
    }

    fn refill_locked(&self, state: &mut BufferState) -> usize {
        let mut pulled = 0;
        while !state.exhausted && state.pool.len() < self.target {
            match state.source.next() {
                Ok(Some(question)) => {
                    state.pool.push(question);
                    pulled += 1;
                }
                Ok(None) => {
                    info!(pooled = state.pool.len(), "question source exhausted");
                    state.exhausted = true;
                }
                Err(e) => {
                    warn!(error = %e, "question refill aborted");
                    break;
                }
            }
        }
        if pulled > 0 {
            debug!(pulled, pooled = state.pool.len(), "question buffer refilled");
        }
        pulled
    }

    /// Removes and returns a uniformly random question.
    ///
    /// An empty pool is refilled synchronously first, so a cold start never
    /// reports "no questions" while the source still has data. After a
    /// successful take, a background refill tops the pool back up.
    pub fn take_random(self: &Arc<Self>) -> Option<Question> {
        let (question, needs_refill) = {
            let mut state = self.lock();
            if state.pool.is_empty() {
                self.refill_locked(&mut state);
            }
            if state.pool.is_empty() {
                return None;
            }

            let index = {
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                rng.next_index(state.pool.len())
            };
            let question = state.pool.swap_remove(index);
            (question, !state.exhausted && state.pool.len() < self.target)
        };

        if needs_refill {
            self.spawn_refill();
        }
        Some(question)
    }

    /// Tops up the pool without blocking the caller. Outside a Tokio runtime
    /// the refill runs inline.
    fn spawn_refill(self: &Arc<Self>) {
        let buffer = Arc::clone(self);
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn_blocking(move || {
                    buffer.refill();
                });
            }
            Err(_) => {
                buffer.refill();
            }
        }
    }

    /// Number of pooled questions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().pool.len()
    }

    /// Returns `true` if nothing is pooled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().pool.is_empty()
    }

    /// Returns `true` once the source has reported exhaustion.
    #[must_use]
    pub fn is_exhausted(&self) -> bool {
        self.lock().exhausted
    }

    /// Closes the source. Pooled questions remain servable.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it could not be released cleanly.
    pub fn close(&self) -> Result<(), DomainError> {
        let mut state = self.lock();
        state.exhausted = true;
        state.source.close()
    }
}
