//! Chat command parsing and dispatch.

use std::sync::Arc;

use tokio::io::AsyncBufRead;
use tracing::{info, instrument, warn};
use trebek_core::chat::ChatMessage;
use trebek_game::application::quizmaster::Quizmaster;

use crate::error::AppError;
use crate::irc::{IrcEvent, IrcReader, IrcSender};

/// Reply to `!help`.
pub const HELP_TEXT: &str = "Commands: !start, !stop, !question, !answer <your answer>, !hint, !score, !topscores, !resetscoreboard, !skip, !help";

/// A recognised chat command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Hello,
    Start,
    Stop,
    Question,
    Answer(String),
    Hint,
    Score,
    TopScores,
    ResetScoreboard,
    Skip,
    Help,
    /// Starts with `!` but matches nothing above.
    Unknown(String),
}

impl Command {
    /// Parses `text`. Returns `None` for plain chatter (no leading `!`).
    ///
    /// Commands match case-insensitively by prefix, so `!STARTING` is
    /// `Start`. `!answer` needs a space and some text after it.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        if !text.starts_with('!') {
            return None;
        }
        let lower = text.to_lowercase();
        let submission = text.get("!answer ".len()..).map(str::trim).unwrap_or_default();
        let command = if lower.starts_with("!hello") {
            Self::Hello
        } else if lower.starts_with("!start") {
            Self::Start
        } else if lower.starts_with("!stop") {
            Self::Stop
        } else if lower.starts_with("!question") {
            Self::Question
        } else if lower.starts_with("!answer ") && !submission.is_empty() {
            Self::Answer(submission.to_owned())
        } else if lower.starts_with("!hint") {
            Self::Hint
        } else if lower.starts_with("!score") {
            Self::Score
        } else if lower.starts_with("!topscores") {
            Self::TopScores
        } else if lower.starts_with("!resetscoreboard") {
            Self::ResetScoreboard
        } else if lower.starts_with("!skip") {
            Self::Skip
        } else if lower.starts_with("!help") {
            Self::Help
        } else {
            Self::Unknown(text.to_owned())
        };
        Some(command)
    }
}

/// Where a reply to `message` goes: the channel it was said in, or the
/// sender for a private message.
#[must_use]
pub fn reply_target(message: &ChatMessage) -> &str {
    if message.target.starts_with(['#', '&']) {
        &message.target
    } else {
        &message.user
    }
}

/// Routes chat messages to the quizmaster.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    quizmaster: Arc<Quizmaster>,
}

impl Dispatcher {
    /// Creates a dispatcher.
    #[must_use]
    pub fn new(quizmaster: Arc<Quizmaster>) -> Self {
        Self { quizmaster }
    }

    /// Handles one inbound message.
    ///
    /// Plain chatter counts as an answer while continuous play has a
    /// question out; otherwise it is ignored.
    #[instrument(skip(self, message), fields(user = %message.user, channel = %message.target))]
    pub async fn handle(&self, message: &ChatMessage) {
        let target = reply_target(message);
        let user = message.user.as_str();
        let qm = &self.quizmaster;

        let Some(command) = Command::parse(&message.text) else {
            if qm.engine().is_playing_round() {
                qm.handle_answer(target, user, &message.text).await;
            }
            return;
        };
        info!(?command, "command received");

        match command {
            Command::Hello => qm.say(target, &format!("Hello, {user}!")).await,
            Command::Start => qm.start_continuous(target).await,
            Command::Stop => qm.stop_continuous(target).await,
            Command::Question => qm.manual_question(target).await,
            Command::Answer(submission) => {
                if qm.engine().active_question().is_none() {
                    qm.say(
                        target,
                        "No question is currently active. Type !question to get one.",
                    )
                    .await;
                } else {
                    qm.handle_answer(target, user, &submission).await;
                }
            }
            Command::Hint => qm.handle_hint(target, user).await,
            Command::Score => qm.show_score(target, user).await,
            Command::TopScores => qm.show_top_scores(target).await,
            Command::ResetScoreboard => qm.reset_scores(target).await,
            Command::Skip => qm.handle_skip(target, user).await,
            Command::Help => qm.say(target, HELP_TEXT).await,
            Command::Unknown(text) => {
                qm.say(
                    target,
                    &format!("Unknown command: {text}. Type !help for commands."),
                )
                .await;
            }
        }
    }
}

/// Reads IRC events until the server hangs up, joining `channel` once
/// registered and handing each message to the dispatcher on its own task.
///
/// # Errors
///
/// Returns `AppError` if reading from the connection fails.
pub async fn listen<R: AsyncBufRead + Unpin>(
    mut reader: IrcReader<R>,
    sender: IrcSender,
    channel: &str,
    dispatcher: Dispatcher,
) -> Result<(), AppError> {
    while let Some(event) = reader.next_event().await? {
        match event {
            IrcEvent::Registered => {
                if let Err(error) = sender.join(channel).await {
                    warn!(%error, channel, "failed to join channel");
                }
            }
            IrcEvent::Message(message) => {
                let dispatcher = dispatcher.clone();
                tokio::spawn(async move { dispatcher.handle(&message).await });
            }
        }
    }
    info!("IRC server closed the connection");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::io::BufReader;
    use tokio::sync::mpsc;
    use trebek_core::rng::DeterministicRng;
    use trebek_game::application::buffer::{DEFAULT_TARGET, QuestionBuffer};
    use trebek_game::application::engine::{DEFAULT_SKIP_VOTE_THRESHOLD, RoundEngine};
    use trebek_game::application::quizmaster::GameSettings;
    use trebek_store::InMemoryScoreboard;
    use trebek_test_support::{MockRng, RecordingChatSink, ScriptedQuestionSource, questions};

    fn message(user: &str, target: &str, text: &str) -> ChatMessage {
        ChatMessage {
            target: target.into(),
            user: user.into(),
            text: text.into(),
        }
    }

    fn dispatcher(answers: &[&str]) -> (Dispatcher, Arc<RecordingChatSink>) {
        let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(MockRng));
        let buffer = Arc::new(QuestionBuffer::new(
            Box::new(ScriptedQuestionSource::new(questions(answers))),
            Arc::clone(&rng),
            DEFAULT_TARGET,
        ));
        let engine = Arc::new(RoundEngine::new(buffer, rng, DEFAULT_SKIP_VOTE_THRESHOLD));
        let chat = Arc::new(RecordingChatSink::new());
        let quizmaster = Quizmaster::new(
            engine,
            chat.clone(),
            Arc::new(InMemoryScoreboard::new()),
            GameSettings::new("#trivia"),
        );
        (Dispatcher::new(quizmaster), chat)
    }

    // --- parsing ---

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(Command::parse("paris"), None);
        assert_eq!(Command::parse(" !start"), None);
    }

    #[test]
    fn test_commands_match_case_insensitive_prefix() {
        assert_eq!(Command::parse("!START"), Some(Command::Start));
        assert_eq!(Command::parse("!stopnow"), Some(Command::Stop));
        assert_eq!(Command::parse("!Hint please"), Some(Command::Hint));
        assert_eq!(Command::parse("!topscores"), Some(Command::TopScores));
        assert_eq!(Command::parse("!score"), Some(Command::Score));
        assert_eq!(
            Command::parse("!resetscoreboard"),
            Some(Command::ResetScoreboard)
        );
    }

    #[test]
    fn test_answer_keeps_original_case() {
        assert_eq!(
            Command::parse("!ANSWER  New York "),
            Some(Command::Answer("New York".into()))
        );
    }

    #[test]
    fn test_answer_without_text_is_unknown() {
        assert_eq!(
            Command::parse("!answer"),
            Some(Command::Unknown("!answer".into()))
        );
        assert_eq!(
            Command::parse("!answer   "),
            Some(Command::Unknown("!answer   ".into()))
        );
    }

    #[test]
    fn test_reply_target_for_private_message_is_sender() {
        assert_eq!(reply_target(&message("alice", "#trivia", "x")), "#trivia");
        assert_eq!(reply_target(&message("alice", "TrebekBot", "x")), "alice");
    }

    // --- dispatch ---

    #[tokio::test(start_paused = true)]
    async fn test_hello_and_help() {
        let (dispatcher, chat) = dispatcher(&[]);

        dispatcher.handle(&message("alice", "#trivia", "!hello")).await;
        dispatcher.handle(&message("alice", "#trivia", "!help")).await;

        assert_eq!(chat.texts(), vec!["Hello, alice!", HELP_TEXT]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_command() {
        let (dispatcher, chat) = dispatcher(&[]);

        dispatcher.handle(&message("alice", "#trivia", "!dance")).await;

        assert_eq!(
            chat.texts(),
            vec!["Unknown command: !dance. Type !help for commands."]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_answer_command_without_question() {
        let (dispatcher, chat) = dispatcher(&["Paris"]);

        dispatcher.handle(&message("alice", "#trivia", "!answer Paris")).await;

        assert!(chat.contains("No question is currently active. Type !question to get one."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_manual_question_then_answer_command() {
        let (dispatcher, chat) = dispatcher(&["Paris"]);

        dispatcher.handle(&message("alice", "#trivia", "!question")).await;
        dispatcher.handle(&message("bob", "#trivia", "paris")).await;
        dispatcher.handle(&message("alice", "#trivia", "!answer paris")).await;

        assert!(!chat.contains("bob"), "chatter outside continuous play is ignored");
        assert!(chat.contains("Correct, alice! The answer was: Paris"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_chatter_answers_during_continuous_play() {
        let (dispatcher, chat) = dispatcher(&["Paris", "Rome"]);

        dispatcher.handle(&message("alice", "#trivia", "!start")).await;
        dispatcher.handle(&message("bob", "#trivia", "PARIS!")).await;
        dispatcher.handle(&message("alice", "#trivia", "!stop")).await;

        assert!(chat.contains("Starting continuous trivia!"));
        assert!(chat.contains("Correct, bob! The answer was: Paris"));
        assert!(chat.contains("Stopping continuous trivia."));
    }

    #[tokio::test(start_paused = true)]
    async fn test_private_score_query_replies_to_sender() {
        let (dispatcher, chat) = dispatcher(&[]);

        dispatcher.handle(&message("alice", "TrebekBot", "!score")).await;

        assert_eq!(
            chat.sent(),
            vec![("alice".to_owned(), "alice's score: 0".to_owned())]
        );
    }

    // --- listen ---

    #[tokio::test]
    async fn test_listen_joins_after_registration() {
        let input: &[u8] = b":srv 001 TrebekBot :Welcome\r\n";
        let (tx, mut rx) = mpsc::channel(4);
        let sender = IrcSender::new(tx);
        let reader = IrcReader::new(BufReader::new(input), sender.clone());
        let (dispatcher, _chat) = dispatcher(&[]);

        listen(reader, sender, "#trivia", dispatcher).await.unwrap();

        assert_eq!(rx.recv().await.unwrap(), "JOIN #trivia");
    }
}
