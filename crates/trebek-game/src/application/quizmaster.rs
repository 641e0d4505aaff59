//! The quizmaster: turns engine results into chat announcements, keeps
//! score, runs per-question timeouts and drives continuous play.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};
use trebek_core::chat::ChatSink;
use trebek_core::error::DomainError;
use trebek_core::event::RoundOutcome;
use trebek_core::question::Question;
use trebek_core::scoreboard::ScoreStore;
use uuid::Uuid;

use crate::application::engine::RoundEngine;
use crate::application::scheduler::{AskOutcome, ContinuousPlayScheduler, Pacing, QuestionAsker};
use crate::application::timeout::DEFAULT_QUESTION_TIMEOUT;
use crate::domain::round::{ActiveRound, HintResponse};
use crate::domain::votes::SkipTally;
use crate::error::RoundError;

/// Points deducted for each granted hint.
pub const DEFAULT_HINT_COST: i64 = 50;

/// Points awarded for a correct answer.
pub const DEFAULT_CORRECT_POINTS: i64 = 1;

/// How many rows `!topscores` shows.
pub const TOP_SCORES_SHOWN: usize = 5;

/// Game-level settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameSettings {
    /// Channel where questions and round results are announced.
    pub channel: String,
    /// Time allowed to answer a question.
    pub question_timeout: Duration,
    /// Continuous-play pacing.
    pub pacing: Pacing,
    /// Points deducted per hint.
    pub hint_cost: i64,
    /// Points awarded per correct answer.
    pub correct_points: i64,
}

impl GameSettings {
    /// Default settings announcing to `channel`.
    #[must_use]
    pub fn new(channel: impl Into<String>) -> Self {
        Self {
            channel: channel.into(),
            question_timeout: DEFAULT_QUESTION_TIMEOUT,
            pacing: Pacing::default(),
            hint_cost: DEFAULT_HINT_COST,
            correct_points: DEFAULT_CORRECT_POINTS,
        }
    }
}

/// Runs the game on top of a [`RoundEngine`].
pub struct Quizmaster {
    me: Weak<Self>,
    engine: Arc<RoundEngine>,
    chat: Arc<dyn ChatSink>,
    scores: Arc<dyn ScoreStore>,
    settings: GameSettings,
    scheduler: Mutex<Option<ContinuousPlayScheduler>>,
}

impl std::fmt::Debug for Quizmaster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Quizmaster")
            .field("engine", &self.engine)
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

fn question_text(question: &Question) -> String {
    format!(
        "Category: {} - Question: {}",
        question.category, question.prompt
    )
}

impl Quizmaster {
    /// Creates a quizmaster. Timeouts and the scheduler hold weak or shared
    /// references to it, hence the `Arc`.
    #[must_use]
    pub fn new(
        engine: Arc<RoundEngine>,
        chat: Arc<dyn ChatSink>,
        scores: Arc<dyn ScoreStore>,
        settings: GameSettings,
    ) -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            engine,
            chat,
            scores,
            settings,
            scheduler: Mutex::new(None),
        })
    }

    /// The underlying engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<RoundEngine> {
        &self.engine
    }

    /// The score store.
    #[must_use]
    pub fn scores(&self) -> &Arc<dyn ScoreStore> {
        &self.scores
    }

    /// The game settings.
    #[must_use]
    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    fn scheduler(&self) -> MutexGuard<'_, Option<ContinuousPlayScheduler>> {
        self.scheduler
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Sends `text` to `target`. Delivery failures are logged, never raised.
    pub async fn say(&self, target: &str, text: &str) {
        if let Err(error) = self.chat.send(target, text).await {
            warn!(%error, channel = target, "failed to send chat message");
        }
    }

    async fn announce(&self, text: &str) {
        self.say(&self.settings.channel, text).await;
    }

    /// Starts a round, arms its timeout and announces it to the game channel.
    ///
    /// On exhaustion the channel is told and continuous play is switched off.
    /// A transient source failure is only logged.
    pub async fn ask_question(&self) -> AskOutcome {
        match self.engine.start_round() {
            Ok(Some(round)) => {
                self.arm_timeout(&round);
                self.announce(&question_text(&round.question)).await;
                AskOutcome::Asked
            }
            Ok(None) => {
                self.engine.set_playing(false);
                self.announce("No more questions left! Reset the game or load more questions.")
                    .await;
                AskOutcome::Exhausted
            }
            Err(RoundError::AlreadyActive { round_id }) => {
                debug!(%round_id, "ask skipped, round still active");
                AskOutcome::AlreadyActive
            }
            Err(RoundError::NoQuestionReady) => {
                warn!("no question ready, ask deferred");
                AskOutcome::Unavailable
            }
        }
    }

    fn arm_timeout(&self, round: &ActiveRound) {
        let Some(signal) = self.engine.arm_timeout(round.id) else {
            return;
        };
        let me = self.me.clone();
        let round_id = round.id;
        let after = self.settings.question_timeout;
        tokio::spawn(async move {
            if !signal.expired(after).await {
                return;
            }
            if let Some(quizmaster) = me.upgrade() {
                quizmaster.time_up(round_id).await;
            }
        });
    }

    async fn time_up(&self, round_id: Uuid) {
        let Some(question) = self.engine.expire_round(round_id) else {
            return;
        };
        self.announce(&format!("Time's up! The answer was: {}", question.answer))
            .await;
        self.round_ended(RoundOutcome::TimedOut).await;
    }

    /// Tells the scheduler a round ended. Does nothing outside continuous
    /// play.
    async fn round_ended(&self, outcome: RoundOutcome) {
        if !self.engine.is_playing() {
            return;
        }
        let events = self.scheduler().as_ref().map(ContinuousPlayScheduler::events);
        if let Some(events) = events
            && !events.round_ended(outcome).await
        {
            debug!(outcome = outcome.as_str(), "scheduler gone, round outcome dropped");
        }
    }

    /// Has the scheduler try again after its short delay.
    async fn retry_later(&self) {
        let events = self.scheduler().as_ref().map(ContinuousPlayScheduler::events);
        if let Some(events) = events
            && !events.retry_later().await
        {
            debug!("scheduler gone, retry dropped");
        }
    }

    /// Judges `submission` from `user`. The first correct answer wins the
    /// round and scores.
    pub async fn handle_answer(&self, target: &str, user: &str, submission: &str) {
        let Some(question) = self.engine.resolve_answer(submission) else {
            self.say(target, &format!("Sorry, {user}, that's not correct."))
                .await;
            return;
        };

        let total = self.scores.add(user, self.settings.correct_points);
        info!(user, total, "correct answer");
        self.say(
            target,
            &format!("Correct, {user}! The answer was: {}", question.answer),
        )
        .await;
        self.round_ended(RoundOutcome::Answered).await;
    }

    /// Grants a hint and charges `user` for it.
    pub async fn handle_hint(&self, target: &str, user: &str) {
        match self.engine.get_hint() {
            HintResponse::Granted { category, mask, .. } => {
                self.scores.add(user, -self.settings.hint_cost);
                self.say(target, &format!("Hint for {category}: {mask}"))
                    .await;
            }
            denied => self.say(target, &denied.text()).await,
        }
    }

    /// Records a skip vote from `user`; at quorum the round is cleared and
    /// its answer announced.
    pub async fn handle_skip(&self, target: &str, user: &str) {
        let tally = self.engine.add_skip_vote(user);
        if tally == SkipTally::IDLE {
            self.say(target, "No question is currently active to skip.")
                .await;
            return;
        }
        if !tally.skip_now {
            self.say(
                target,
                &format!(
                    "{user} voted to skip. {}/{} votes to skip.",
                    tally.votes, tally.threshold
                ),
            )
            .await;
            return;
        }

        // Only the caller that clears the round announces it.
        let Some(question) = self.engine.clear_round() else {
            return;
        };
        self.say(
            target,
            &format!("Question skipped! The answer was: {}", question.answer),
        )
        .await;
        self.round_ended(RoundOutcome::Skipped).await;
    }

    /// Asks a single question on demand. Refused during continuous play.
    pub async fn manual_question(&self, target: &str) {
        if self.engine.is_playing() {
            self.say(
                target,
                "Trivia is running continuously. Please use !stop to end continuous play if you want to ask questions manually.",
            )
            .await;
            return;
        }
        if self.ask_question().await == AskOutcome::AlreadyActive
            && let Some(question) = self.engine.active_question()
        {
            self.say(
                target,
                &format!("A question is already active! {}", question_text(&question)),
            )
            .await;
        }
    }

    /// Switches continuous play on and asks the first question right away.
    #[instrument(skip_all, fields(channel = target))]
    pub async fn start_continuous(&self, target: &str) {
        if !self.engine.begin_play() {
            self.say(target, "Trivia is already running!").await;
            return;
        }
        let Some(me) = self.me.upgrade() else {
            return;
        };
        self.say(target, "Starting continuous trivia!").await;

        let scheduler = ContinuousPlayScheduler::start(
            Arc::clone(&self.engine),
            me,
            self.settings.pacing,
        );
        if let Some(mut previous) = self.scheduler().replace(scheduler) {
            previous.stop();
        }
        info!(channel = target, "continuous play started");

        match self.ask_question().await {
            AskOutcome::Exhausted => self.stop_scheduler(),
            AskOutcome::Unavailable => self.retry_later().await,
            AskOutcome::Asked | AskOutcome::AlreadyActive => {}
        }
    }

    /// Switches continuous play off. An active round is cleared and its
    /// answer announced.
    #[instrument(skip_all, fields(channel = target))]
    pub async fn stop_continuous(&self, target: &str) {
        if !self.engine.end_play() {
            self.say(target, "Trivia is not currently running.").await;
            return;
        }
        self.stop_scheduler();
        info!(channel = target, "continuous play stopped");
        self.say(target, "Stopping continuous trivia.").await;

        if let Some(question) = self.engine.clear_round() {
            self.say(target, &format!("The answer was: {}", question.answer))
                .await;
        }
    }

    fn stop_scheduler(&self) {
        if let Some(mut scheduler) = self.scheduler().take() {
            scheduler.stop();
        }
    }

    /// Reports `user`'s score.
    pub async fn show_score(&self, target: &str, user: &str) {
        let score = self.scores.get(user);
        self.say(target, &format!("{user}'s score: {score}")).await;
    }

    /// Reports the leaderboard.
    pub async fn show_top_scores(&self, target: &str) {
        let top = self.scores.top(TOP_SCORES_SHOWN);
        if top.is_empty() {
            self.say(target, "No scores yet!").await;
            return;
        }
        let rows: Vec<String> = top
            .iter()
            .map(|entry| format!("{}: {}", entry.player, entry.score))
            .collect();
        self.say(target, &format!("Top Scores: {}", rows.join(", ")))
            .await;
    }

    /// Clears the scoreboard.
    pub async fn reset_scores(&self, target: &str) {
        self.scores.reset();
        info!(channel = target, "scoreboard reset");
        self.say(target, "Scoreboard has been reset!").await;
    }

    /// Stops play, clears any round and closes the question source.
    ///
    /// # Errors
    ///
    /// Returns the source's error if it could not be closed cleanly.
    pub fn shutdown(&self) -> Result<(), DomainError> {
        self.engine.end_play();
        self.stop_scheduler();
        self.engine.clear_round();
        self.engine.close_source()
    }
}

#[async_trait]
impl QuestionAsker for Quizmaster {
    async fn ask_question(&self) -> AskOutcome {
        Quizmaster::ask_question(self).await
    }
}
