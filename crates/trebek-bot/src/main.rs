//! Trebek trivia bot entry point.

use std::error::Error;
use std::sync::{Arc, Mutex};

use clap::Parser;
use tracing::{error, info, warn};
use trebek_bot::config::{Cli, Config};
use trebek_bot::dispatcher::{self, Dispatcher};
use trebek_bot::state::AppState;
use trebek_bot::{irc, logging, routes};
use trebek_content::open_question_source;
use trebek_core::clock::{Clock, SystemClock};
use trebek_core::rng::{DeterministicRng, SystemRng};
use trebek_core::scoreboard::ScoreStore;
use trebek_game::application::buffer::{DEFAULT_TARGET, QuestionBuffer};
use trebek_game::application::engine::RoundEngine;
use trebek_game::application::quizmaster::Quizmaster;
use trebek_store::JsonFileScoreboard;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::load(Cli::parse())?;
    let _log_guard = logging::init(&config)?;

    info!(
        bot_name = %config.bot_name,
        channel = %config.irc_channel,
        "Starting Trebek trivia bot"
    );

    // Question pipeline.
    let source = open_question_source(&config.questions_path)?;
    let rng: Arc<Mutex<dyn DeterministicRng + Send>> = Arc::new(Mutex::new(SystemRng::new()));
    let buffer = Arc::new(QuestionBuffer::new(source, Arc::clone(&rng), DEFAULT_TARGET));
    let warmed = buffer.refill();
    info!(warmed, path = %config.questions_path.display(), "question buffer warmed");
    let engine = Arc::new(RoundEngine::new(buffer, rng, config.skip_vote_threshold));

    // Scores.
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scores: Arc<dyn ScoreStore> =
        Arc::new(JsonFileScoreboard::load(config.scoreboard_path.clone(), clock));

    // Optional status server.
    if let Some(addr) = config.http_addr {
        let app = routes::app(AppState::new(Arc::clone(&engine), Arc::clone(&scores)));
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Status server listening on {}", addr);
        tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, app).await {
                error!(error = %err, "status server failed");
            }
        });
    }

    // Chat.
    let connection = irc::connect(&config.irc, &config.bot_name).await?;
    let quizmaster = Quizmaster::new(
        engine,
        Arc::new(connection.sender.clone()),
        scores,
        config.game_settings(),
    );
    let dispatcher = Dispatcher::new(Arc::clone(&quizmaster));

    tokio::select! {
        result = dispatcher::listen(
            connection.reader,
            connection.sender,
            &config.irc_channel,
            dispatcher,
        ) => {
            if let Err(err) = result {
                error!(error = %err, "IRC connection failed");
            }
        }
        () = shutdown_signal() => info!("Shutdown signal received"),
    }

    info!("Shutting down bot");
    if let Err(err) = quizmaster.shutdown() {
        warn!(error = %err, "question source did not close cleanly");
    }
    connection.writer.abort();
    Ok(())
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                warn!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
}
