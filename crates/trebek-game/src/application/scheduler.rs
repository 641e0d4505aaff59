//! Continuous play: keeps asking questions at a fixed pace until stopped.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info};
use trebek_core::event::RoundOutcome;

use crate::application::engine::RoundEngine;

/// Delays used by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacing {
    /// Pause after a round ends before the next question is asked.
    pub between_rounds: Duration,
    /// Time allotted to a question before the scheduler looks again.
    pub round_window: Duration,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            between_rounds: Duration::from_secs(5),
            round_window: Duration::from_secs(45),
        }
    }
}

/// Result of asking a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AskOutcome {
    /// A new round started and was announced.
    Asked,
    /// A round is still in progress; nothing was asked.
    AlreadyActive,
    /// The question source has run dry.
    Exhausted,
    /// The source failed transiently; nothing was asked.
    Unavailable,
}

/// Starts and announces a round on behalf of the scheduler.
#[async_trait]
pub trait QuestionAsker: Send + Sync {
    /// Starts a round and announces it.
    async fn ask_question(&self) -> AskOutcome;
}

/// What the scheduler is told between rounds.
#[derive(Debug, Clone, Copy)]
enum Signal {
    RoundEnded(RoundOutcome),
    Retry,
}

type Envelope = (Signal, oneshot::Sender<()>);

/// Sending side of the scheduler's round-ended channel.
#[derive(Debug, Clone)]
pub struct RoundEvents {
    tx: mpsc::Sender<Envelope>,
}

impl RoundEvents {
    /// Reports that a round ended and waits until the scheduler has taken
    /// the event. Returns `false` if the scheduler is gone.
    ///
    /// The round must already be cleared when this is called.
    pub async fn round_ended(&self, outcome: RoundOutcome) -> bool {
        self.deliver(Signal::RoundEnded(outcome)).await
    }

    /// Asks for another attempt after the short delay, used when an ask
    /// outside the loop found no question ready. Returns `false` if the
    /// scheduler is gone.
    pub async fn retry_later(&self) -> bool {
        self.deliver(Signal::Retry).await
    }

    async fn deliver(&self, signal: Signal) -> bool {
        let (ack, accepted) = oneshot::channel();
        if self.tx.send((signal, ack)).await.is_err() {
            return false;
        }
        accepted.await.is_ok()
    }
}

/// Handle to the scheduler task.
///
/// Dropping the handle stops the task as well.
#[derive(Debug)]
pub struct ContinuousPlayScheduler {
    events: RoundEvents,
    stop: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ContinuousPlayScheduler {
    /// Spawns the scheduler loop. The pacing timer starts disarmed; the
    /// first question is the caller's to ask.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn start(engine: Arc<RoundEngine>, asker: Arc<dyn QuestionAsker>, pacing: Pacing) -> Self {
        let (tx, rx) = mpsc::channel(1);
        let (stop, stopped) = oneshot::channel();
        let task = tokio::spawn(run(engine, asker, pacing, rx, stopped));
        info!(?pacing, "continuous play scheduler started");
        Self {
            events: RoundEvents { tx },
            stop: Some(stop),
            task,
        }
    }

    /// A sender for round-ended events.
    #[must_use]
    pub fn events(&self) -> RoundEvents {
        self.events.clone()
    }

    /// Asks the loop to exit. Safe to call repeatedly; does not interrupt an
    /// ask already in progress.
    pub fn stop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
            info!("continuous play scheduler stopping");
        }
    }

    /// Returns `true` once the loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

async fn run(
    engine: Arc<RoundEngine>,
    asker: Arc<dyn QuestionAsker>,
    pacing: Pacing,
    mut events: mpsc::Receiver<Envelope>,
    mut stop: oneshot::Receiver<()>,
) {
    let timer = tokio::time::sleep(pacing.between_rounds);
    tokio::pin!(timer);
    let mut armed = false;

    loop {
        tokio::select! {
            biased;
            _ = &mut stop => break,
            event = events.recv() => {
                let Some((signal, ack)) = event else { break };
                if engine.is_playing() {
                    match signal {
                        Signal::RoundEnded(outcome) => {
                            debug!(outcome = outcome.as_str(), "round ended, next question scheduled");
                        }
                        Signal::Retry => debug!("retry scheduled"),
                    }
                    timer.as_mut().reset(Instant::now() + pacing.between_rounds);
                    armed = true;
                }
                let _ = ack.send(());
            }
            () = &mut timer, if armed => {
                armed = false;
                if !engine.is_playing() {
                    continue;
                }
                match asker.ask_question().await {
                    AskOutcome::Asked | AskOutcome::AlreadyActive => {
                        timer.as_mut().reset(Instant::now() + pacing.round_window);
                        armed = true;
                    }
                    AskOutcome::Unavailable => {
                        timer.as_mut().reset(Instant::now() + pacing.between_rounds);
                        armed = true;
                    }
                    AskOutcome::Exhausted => {
                        engine.set_playing(false);
                        info!("question source exhausted, continuous play ended");
                        break;
                    }
                }
            }
        }
    }
    debug!("continuous play scheduler exited");
}
