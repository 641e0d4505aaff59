//! End-to-end game flows through the quizmaster with a recording chat sink.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::sleep;
use trebek_core::rng::DeterministicRng;
use trebek_core::scoreboard::ScoreStore;
use trebek_game::application::buffer::{DEFAULT_TARGET, QuestionBuffer};
use trebek_game::application::engine::{DEFAULT_SKIP_VOTE_THRESHOLD, RoundEngine};
use trebek_game::application::quizmaster::{GameSettings, Quizmaster};
use trebek_store::InMemoryScoreboard;
use trebek_test_support::{
    FailingChatSink, MockRng, RecordingChatSink, ScriptedQuestionSource, question, questions,
};

const CHANNEL: &str = "#trivia";

struct Harness {
    quizmaster: Arc<Quizmaster>,
    chat: Arc<RecordingChatSink>,
    scores: Arc<InMemoryScoreboard>,
}

fn engine(source: ScriptedQuestionSource, threshold: usize) -> Arc<RoundEngine> {
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
    let buffer = Arc::new(QuestionBuffer::new(
        Box::new(source),
        Arc::clone(&rng),
        DEFAULT_TARGET,
    ));
    Arc::new(RoundEngine::new(buffer, rng, threshold))
}

fn harness_with(answers: &[&str], threshold: usize) -> Harness {
    harness_over(ScriptedQuestionSource::new(questions(answers)), threshold)
}

fn harness_over(source: ScriptedQuestionSource, threshold: usize) -> Harness {
    let chat = Arc::new(RecordingChatSink::new());
    let scores = Arc::new(InMemoryScoreboard::new());
    let quizmaster = Quizmaster::new(
        engine(source, threshold),
        chat.clone(),
        scores.clone(),
        GameSettings::new(CHANNEL),
    );
    Harness {
        quizmaster,
        chat,
        scores,
    }
}

fn harness(answers: &[&str]) -> Harness {
    harness_with(answers, DEFAULT_SKIP_VOTE_THRESHOLD)
}

fn questions_asked(chat: &RecordingChatSink) -> usize {
    chat.texts()
        .iter()
        .filter(|text| text.starts_with("Category:"))
        .count()
}

fn active_answer(quizmaster: &Quizmaster) -> String {
    quizmaster
        .engine()
        .active_question()
        .expect("a question should be active")
        .answer
        .clone()
}

// --- manual rounds ---

#[tokio::test(start_paused = true)]
async fn test_manual_question_is_announced_to_channel() {
    let h = harness(&["Paris"]);

    h.quizmaster.manual_question("#other").await;

    assert_eq!(
        h.chat.sent(),
        vec![(
            CHANNEL.to_owned(),
            "Category: TEST - Question: clue for Paris".to_owned()
        )]
    );
}

#[tokio::test(start_paused = true)]
async fn test_correct_answer_scores_and_clears_round() {
    let h = harness(&["Paris"]);
    h.quizmaster.manual_question(CHANNEL).await;

    h.quizmaster.handle_answer(CHANNEL, "alice", " pa-ris ").await;

    assert!(h.chat.contains("Correct, alice! The answer was: Paris"));
    assert_eq!(h.scores.get("alice"), 1);
    assert!(h.quizmaster.engine().active_question().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_wrong_answer_keeps_round() {
    let h = harness(&["Paris"]);
    h.quizmaster.manual_question(CHANNEL).await;

    h.quizmaster.handle_answer(CHANNEL, "bob", "London").await;

    assert!(h.chat.contains("Sorry, bob, that's not correct."));
    assert_eq!(h.scores.get("bob"), 0);
    assert!(h.quizmaster.engine().active_question().is_some());
}

#[tokio::test(start_paused = true)]
async fn test_second_manual_question_repeats_active_one() {
    let h = harness(&["Paris", "Rome"]);
    h.quizmaster.manual_question(CHANNEL).await;

    h.quizmaster.manual_question(CHANNEL).await;

    assert_eq!(questions_asked(&h.chat), 1);
    assert!(h.chat.contains("A question is already active! Category: TEST"));
}

#[tokio::test(start_paused = true)]
async fn test_manual_question_on_empty_source() {
    let h = harness(&[]);

    h.quizmaster.manual_question(CHANNEL).await;

    assert!(h.chat.contains("No more questions left!"));
}

// --- hints ---

#[tokio::test(start_paused = true)]
async fn test_hint_is_announced_and_charged() {
    let h = harness(&["Paris"]);
    h.quizmaster.manual_question(CHANNEL).await;

    h.quizmaster.handle_hint(CHANNEL, "carol").await;

    assert!(h.chat.contains("Hint for TEST: P____"));
    assert_eq!(h.scores.get("carol"), -50);
}

#[tokio::test(start_paused = true)]
async fn test_denied_hint_is_free() {
    let h = harness(&["Paris"]);

    h.quizmaster.handle_hint(CHANNEL, "carol").await;

    assert!(h.chat.contains("No question is currently active."));
    assert_eq!(h.scores.get("carol"), 0);
}

#[tokio::test(start_paused = true)]
async fn test_fourth_hint_is_refused() {
    let h = harness(&["Constantinople"]);
    h.quizmaster.manual_question(CHANNEL).await;

    for _ in 0..4 {
        h.quizmaster.handle_hint(CHANNEL, "carol").await;
    }

    assert!(h.chat.contains("Maximum hints (3) reached for this question."));
    assert_eq!(h.scores.get("carol"), -150);
}

// --- skipping ---

#[tokio::test(start_paused = true)]
async fn test_skip_quorum_announces_answer() {
    let h = harness_with(&["Paris"], 2);
    h.quizmaster.manual_question(CHANNEL).await;

    h.quizmaster.handle_skip(CHANNEL, "user1").await;
    h.quizmaster.handle_skip(CHANNEL, "user1").await;
    h.quizmaster.handle_skip(CHANNEL, "user2").await;

    let texts = h.chat.texts();
    assert_eq!(texts[1], "user1 voted to skip. 1/2 votes to skip.");
    assert_eq!(texts[2], "user1 voted to skip. 1/2 votes to skip.");
    assert_eq!(texts[3], "Question skipped! The answer was: Paris");
    assert!(h.quizmaster.engine().active_question().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_skip_without_question() {
    let h = harness(&["Paris"]);

    h.quizmaster.handle_skip(CHANNEL, "user1").await;

    assert!(h.chat.contains("No question is currently active to skip."));
}

// --- timeouts ---

#[tokio::test(start_paused = true)]
async fn test_unanswered_question_times_out() {
    let h = harness(&["Paris"]);
    h.quizmaster.manual_question(CHANNEL).await;

    sleep(Duration::from_secs(29)).await;
    assert!(!h.chat.contains("Time's up!"));

    sleep(Duration::from_secs(2)).await;
    assert!(h.chat.contains("Time's up! The answer was: Paris"));
    assert!(h.quizmaster.engine().active_question().is_none());
}

#[tokio::test(start_paused = true)]
async fn test_answered_question_never_times_out() {
    let h = harness(&["Paris"]);
    h.quizmaster.manual_question(CHANNEL).await;
    h.quizmaster.handle_answer(CHANNEL, "alice", "paris").await;

    sleep(Duration::from_secs(60)).await;

    assert!(!h.chat.contains("Time's up!"));
}

#[tokio::test(start_paused = true)]
async fn test_stale_timeout_does_not_clear_next_round() {
    let h = harness(&["Paris", "Rome"]);
    h.quizmaster.manual_question(CHANNEL).await;
    sleep(Duration::from_secs(20)).await;
    h.quizmaster.handle_answer(CHANNEL, "alice", "paris").await;
    h.quizmaster.manual_question(CHANNEL).await;

    // The first round's deadline passes; the second round is untouched.
    sleep(Duration::from_secs(15)).await;

    assert!(!h.chat.contains("Time's up!"));
    assert!(h.quizmaster.engine().active_question().is_some());
}

// --- continuous play ---

#[tokio::test(start_paused = true)]
async fn test_start_asks_immediately_and_refuses_restart() {
    let h = harness(&["Paris", "Rome"]);

    h.quizmaster.start_continuous(CHANNEL).await;
    h.quizmaster.start_continuous(CHANNEL).await;

    let texts = h.chat.texts();
    assert_eq!(texts[0], "Starting continuous trivia!");
    assert!(texts[1].starts_with("Category: TEST"));
    assert_eq!(texts[2], "Trivia is already running!");
    assert!(h.quizmaster.engine().is_playing());
    h.quizmaster.stop_continuous(CHANNEL).await;
}

#[tokio::test(start_paused = true)]
async fn test_answer_leads_to_next_question_after_pause() {
    let h = harness(&["Paris", "Rome", "Oslo"]);
    h.quizmaster.start_continuous(CHANNEL).await;

    let answer = active_answer(&h.quizmaster);
    h.quizmaster.handle_answer(CHANNEL, "alice", &answer).await;
    sleep(Duration::from_secs(4)).await;
    assert_eq!(questions_asked(&h.chat), 1);

    sleep(Duration::from_secs(2)).await;
    assert_eq!(questions_asked(&h.chat), 2);
    assert!(h.quizmaster.engine().active_question().is_some());
    h.quizmaster.stop_continuous(CHANNEL).await;
}

#[tokio::test(start_paused = true)]
async fn test_timeout_leads_to_next_question() {
    let h = harness(&["Paris", "Rome"]);
    h.quizmaster.start_continuous(CHANNEL).await;

    sleep(Duration::from_secs(31)).await;
    assert!(h.chat.contains("Time's up!"));
    assert_eq!(questions_asked(&h.chat), 1);

    sleep(Duration::from_secs(5)).await;
    assert_eq!(questions_asked(&h.chat), 2);
    h.quizmaster.stop_continuous(CHANNEL).await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_question_refused_while_playing() {
    let h = harness(&["Paris", "Rome"]);
    h.quizmaster.start_continuous(CHANNEL).await;

    h.quizmaster.manual_question(CHANNEL).await;

    assert!(h.chat.contains("Trivia is running continuously."));
    assert_eq!(questions_asked(&h.chat), 1);
    h.quizmaster.stop_continuous(CHANNEL).await;
}

#[tokio::test(start_paused = true)]
async fn test_stop_clears_round_and_halts_play() {
    let h = harness(&["Paris", "Rome"]);
    h.quizmaster.start_continuous(CHANNEL).await;

    h.quizmaster.stop_continuous(CHANNEL).await;
    sleep(Duration::from_secs(120)).await;

    assert!(h.chat.contains("Stopping continuous trivia."));
    assert!(h.chat.contains("The answer was: Paris"));
    assert!(!h.chat.contains("Time's up!"));
    assert_eq!(questions_asked(&h.chat), 1);
    assert!(!h.quizmaster.engine().is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_stop_when_not_running() {
    let h = harness(&["Paris"]);

    h.quizmaster.stop_continuous(CHANNEL).await;

    assert_eq!(h.chat.texts(), vec!["Trivia is not currently running."]);
}

#[tokio::test(start_paused = true)]
async fn test_exhaustion_ends_continuous_play() {
    let h = harness(&["Paris"]);
    h.quizmaster.start_continuous(CHANNEL).await;
    h.quizmaster.handle_answer(CHANNEL, "alice", "paris").await;

    sleep(Duration::from_secs(6)).await;

    assert!(h.chat.contains("No more questions left!"));
    assert!(!h.quizmaster.engine().is_playing());

    h.quizmaster.start_continuous(CHANNEL).await;
    assert!(!h.quizmaster.engine().is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_start_on_empty_source_turns_play_off() {
    let h = harness(&[]);

    h.quizmaster.start_continuous(CHANNEL).await;

    assert!(h.chat.contains("No more questions left!"));
    assert!(!h.quizmaster.engine().is_playing());
}

#[tokio::test(start_paused = true)]
async fn test_source_hiccup_on_start_keeps_play_on_and_retries() {
    let h = harness_over(
        ScriptedQuestionSource::scripted(vec![Err("hiccup".to_owned()), Ok(question("Paris"))]),
        DEFAULT_SKIP_VOTE_THRESHOLD,
    );

    h.quizmaster.start_continuous(CHANNEL).await;

    assert_eq!(h.chat.texts(), vec!["Starting continuous trivia!"]);
    assert!(h.quizmaster.engine().is_playing());

    sleep(Duration::from_secs(6)).await;

    assert!(!h.chat.contains("No more questions left!"));
    assert_eq!(questions_asked(&h.chat), 1);
    assert_eq!(active_answer(&h.quizmaster), "Paris");
    assert!(h.quizmaster.engine().is_playing());
    h.quizmaster.stop_continuous(CHANNEL).await;
}

#[tokio::test(start_paused = true)]
async fn test_source_hiccup_on_manual_question_is_not_announced() {
    let h = harness_over(
        ScriptedQuestionSource::scripted(vec![Err("hiccup".to_owned()), Ok(question("Paris"))]),
        DEFAULT_SKIP_VOTE_THRESHOLD,
    );

    h.quizmaster.manual_question(CHANNEL).await;
    assert!(h.chat.texts().is_empty());

    h.quizmaster.manual_question(CHANNEL).await;
    assert_eq!(questions_asked(&h.chat), 1);
}

// --- scoreboard ---

#[tokio::test]
async fn test_top_scores_lists_leaders() {
    let h = harness(&[]);
    h.scores.add("alice", 3);
    h.scores.add("bob", 5);

    h.quizmaster.show_top_scores(CHANNEL).await;
    h.quizmaster.show_score(CHANNEL, "alice").await;

    assert_eq!(
        h.chat.texts(),
        vec!["Top Scores: bob: 5, alice: 3", "alice's score: 3"]
    );
}

#[tokio::test]
async fn test_top_scores_when_empty() {
    let h = harness(&[]);

    h.quizmaster.show_top_scores(CHANNEL).await;

    assert_eq!(h.chat.texts(), vec!["No scores yet!"]);
}

#[tokio::test]
async fn test_reset_scores() {
    let h = harness(&[]);
    h.scores.add("alice", 3);

    h.quizmaster.reset_scores(CHANNEL).await;

    assert_eq!(h.scores.get("alice"), 0);
    assert!(h.chat.contains("Scoreboard has been reset!"));
}

// --- failures and shutdown ---

#[tokio::test(start_paused = true)]
async fn test_chat_failure_does_not_break_scoring() {
    let scores = Arc::new(InMemoryScoreboard::new());
    let quizmaster = Quizmaster::new(
        engine(ScriptedQuestionSource::new(questions(&["Paris"])), DEFAULT_SKIP_VOTE_THRESHOLD),
        Arc::new(FailingChatSink),
        scores.clone(),
        GameSettings::new(CHANNEL),
    );
    quizmaster.manual_question(CHANNEL).await;

    quizmaster.handle_answer(CHANNEL, "alice", "Paris").await;

    assert_eq!(scores.get("alice"), 1);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_stops_play_and_closes_source() {
    let h = harness(&["Paris", "Rome"]);
    h.quizmaster.start_continuous(CHANNEL).await;

    h.quizmaster.shutdown().unwrap();
    sleep(Duration::from_secs(120)).await;

    assert!(!h.quizmaster.engine().is_playing());
    assert!(h.quizmaster.engine().active_question().is_none());
    assert_eq!(questions_asked(&h.chat), 1);
}
