//! Per-session round countdown.
//!
//! An `updateRound` signal for the held game starts (or restarts) a
//! countdown. Each tick lowers the displayed value by one; at zero every
//! session returns to `Idle` and only the host commits the round change.
//!
//! Restarting retires the previous countdown twice over: its
//! `CancellationToken` is cancelled and its generation number no longer
//! matches, so neither a queued tick nor its expiry commit can run.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::api::GameApi;
use super::channel::BroadcastChannel;
use super::store::GameStateStore;
use crate::domain::{GameStatus, Role};
use crate::errors::domain::{DomainError, NotFoundKind};
use crate::ws::protocol::Envelope;

pub const DEFAULT_COUNTDOWN_TICKS: u32 = 60;

/// Countdown length in ticks and the tick period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Countdown {
    pub ticks: u32,
    pub period: Duration,
}

impl Countdown {
    pub fn seconds(ticks: u32) -> Self {
        Self {
            ticks,
            period: Duration::from_secs(1),
        }
    }
}

impl Default for Countdown {
    fn default() -> Self {
        Self::seconds(DEFAULT_COUNTDOWN_TICKS)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorPhase {
    Idle,
    CountingDown { remaining: u32 },
}

#[derive(Default)]
struct Timer {
    generation: u64,
    token: Option<CancellationToken>,
}

struct Shared {
    role: Role,
    countdown: Countdown,
    store: Arc<GameStateStore>,
    api: Arc<dyn GameApi>,
    channel: Arc<dyn BroadcastChannel>,
    timer: Mutex<Timer>,
    phase: watch::Sender<CoordinatorPhase>,
    runtime: Handle,
}

#[derive(Clone)]
pub struct RoundCoordinator {
    shared: Arc<Shared>,
}

impl RoundCoordinator {
    /// Countdown tasks are spawned on the runtime current at construction.
    ///
    /// # Panics
    ///
    /// Panics when called outside a tokio runtime.
    pub fn new(
        role: Role,
        countdown: Countdown,
        store: Arc<GameStateStore>,
        api: Arc<dyn GameApi>,
        channel: Arc<dyn BroadcastChannel>,
    ) -> Self {
        let (phase, _) = watch::channel(CoordinatorPhase::Idle);
        let countdown = Countdown {
            ticks: countdown.ticks.max(1),
            ..countdown
        };
        Self {
            shared: Arc::new(Shared {
                role,
                countdown,
                store,
                api,
                channel,
                timer: Mutex::new(Timer::default()),
                phase,
                runtime: Handle::current(),
            }),
        }
    }

    pub fn role(&self) -> Role {
        self.shared.role
    }

    pub fn phase(&self) -> CoordinatorPhase {
        *self.shared.phase.borrow()
    }

    pub fn watch(&self) -> watch::Receiver<CoordinatorPhase> {
        self.shared.phase.subscribe()
    }

    /// Handle an `updateRound` signal. Returns whether a countdown started.
    ///
    /// Signals for another game, or while no live game is held, are ignored.
    /// A signal during a countdown restarts it from the full length.
    /// Safe to call from any thread, inside a runtime or not.
    pub fn on_round_signal(&self, game_id: &str) -> bool {
        let Some(game) = self.shared.store.game() else {
            debug!(game_id, "round signal before any game is loaded");
            return false;
        };
        if game.id != game_id {
            debug!(game_id, held = %game.id, "round signal for another game");
            return false;
        }
        if game.is_finished() {
            debug!(game_id, "round signal for a finished game");
            return false;
        }

        let token = CancellationToken::new();
        let generation = {
            let mut timer = self.shared.timer.lock();
            if let Some(previous) = timer.token.replace(token.clone()) {
                previous.cancel();
            }
            timer.generation += 1;
            self.shared.phase.send_replace(CoordinatorPhase::CountingDown {
                remaining: self.shared.countdown.ticks,
            });
            timer.generation
        };

        debug!(game_id, generation, ticks = self.shared.countdown.ticks, "countdown started");
        self.shared
            .runtime
            .spawn(run_countdown(Arc::clone(&self.shared), generation, token));
        true
    }

    /// Ask every session, this one included, to start the countdown.
    pub fn request_advance(&self) -> Result<(), DomainError> {
        let game_id = self.shared.store.game_id().ok_or_else(|| {
            DomainError::not_found(NotFoundKind::Game, "no game loaded in this session")
        })?;
        self.shared.channel.publish(Envelope::round_signal(game_id));
        Ok(())
    }

    /// Drop any running countdown without committing. Session teardown only.
    pub fn shutdown(&self) {
        let mut timer = self.shared.timer.lock();
        if let Some(token) = timer.token.take() {
            token.cancel();
        }
        timer.generation += 1;
        self.shared.phase.send_replace(CoordinatorPhase::Idle);
    }
}

impl Shared {
    /// Publish `phase` if `generation` is still the live countdown.
    fn publish_if_current(&self, generation: u64, phase: CoordinatorPhase) -> bool {
        let mut timer = self.timer.lock();
        if timer.generation != generation {
            return false;
        }
        if phase == CoordinatorPhase::Idle {
            timer.token = None;
        }
        self.phase.send_replace(phase);
        true
    }

    /// Host-only expiry action, against the latest stored game.
    async fn commit_expiry(&self) {
        let Some(game) = self.store.game() else {
            return;
        };
        if game.is_finished() {
            debug!(game_id = %game.id, "game already finished, nothing to commit");
            return;
        }

        let next = game.current_round + 1;
        let result = if next >= game.total_rounds {
            info!(game_id = %game.id, round = game.current_round, "final round expired, finishing game");
            self.api.set_game_status(&game.id, GameStatus::Finished).await
        } else {
            info!(game_id = %game.id, round = next, "committing round advance");
            self.api.advance_round(&game.id, next).await
        };

        match result {
            Ok(updated) => {
                self.store.apply_game(updated);
            }
            Err(e) => warn!(game_id = %game.id, error = %e, "round commit rejected"),
        }
    }
}

async fn run_countdown(shared: Arc<Shared>, generation: u64, token: CancellationToken) {
    let period = shared.countdown.period;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut remaining = shared.countdown.ticks;
    while remaining > 0 {
        tokio::select! {
            biased;
            _ = token.cancelled() => return,
            _ = ticker.tick() => {}
        }
        remaining -= 1;

        let phase = if remaining == 0 {
            CoordinatorPhase::Idle
        } else {
            CoordinatorPhase::CountingDown { remaining }
        };
        if !shared.publish_if_current(generation, phase) {
            return;
        }
    }

    if shared.role.is_host() && !token.is_cancelled() {
        shared.commit_expiry().await;
    }
}
