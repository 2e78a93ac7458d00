//! Match controller: the catch-game state machine.
//!
//! `Menu → Playing → GameOver → Playing | Menu`.  All mutation goes through
//! [`MatchController::apply`]; timers live in a [`TimerQueue`] stamped with
//! the match epoch, so callbacks left over from a superseded match are inert.

use std::collections::{HashSet, VecDeque};

use rand::Rng;

use crate::catalog::draw_kind;
use crate::compute::{
    end_fever, fall_duration_ms, fever_due, init_state, menu_state, particle_burst,
    prune_particles, score_catch, spawn_delay_ms, spawn_x, start_fever, CatchOutcome,
};
use crate::config::Tuning;
use crate::entities::{
    FallingItem, ItemId, ItemKind, MatchState, Millis, ParticleId, Phase, Playfield,
};
use crate::reward::{
    evaluate_reward, settle_reward, RewardOutcome, RewardReceipt, RewardSubmitter,
    SubmissionResult,
};
use crate::timers::{Fired, TimerEvent, TimerHandle, TimerQueue};

const COUNTDOWN_MS: Millis = 1000;

/// Everything the host can tell the engine.
#[derive(Clone, Debug, PartialEq)]
pub enum Input {
    /// Menu → Playing.
    Start,
    /// GameOver → Playing.
    PlayAgain,
    /// Leave the mini-game; any running match is abandoned.
    Back,
    /// Player tapped an item.
    Catch(ItemId),
    /// Move the virtual clock forward to `now` and fire everything due.
    Advance { now: Millis },
    /// New playfield geometry from the host.
    Resize(Playfield),
    /// Re-run reward evaluation for the finished match.
    RetryReward,
    /// A background reward submission finished.
    RewardResult(SubmissionResult),
}

/// Transient feedback for the host to show as a toast.
#[derive(Clone, Debug, PartialEq)]
pub enum Notice {
    Points(i32),
    FeverStarted,
    MagnetActivated,
    TimeExtended,
    FatalCaught,
    NewHighScore(u32),
    RewardSubmitting,
    RewardGranted(RewardReceipt),
    RewardFailed(String),
    RewardAlreadyClaimed,
    BelowThreshold { missing: u32 },
}

pub struct MatchController<S, R> {
    tuning: Tuning,
    state: MatchState,
    timers: TimerQueue,
    epoch: u64,
    now: Millis,
    playfield: Option<Playfield>,
    /// Fall duration handed to the next spawned item.
    fall_ms: Millis,
    next_item_id: ItemId,
    next_particle_id: ParticleId,
    recently_caught: HashSet<ItemId>,
    fever_activation: u64,
    magnet_activation: u64,
    magnet_open: bool,
    /// Pending expiries, cancelled when a new activation supersedes them.
    fever_expiry: Option<TimerHandle>,
    magnet_expiry: Option<TimerHandle>,
    /// Ticket of the reward submission still in flight for this match.
    pending_reward: Option<u64>,
    notices: VecDeque<Notice>,
    submitter: S,
    rng: R,
}

impl<S: RewardSubmitter, R: Rng> MatchController<S, R> {
    pub fn new(tuning: Tuning, submitter: S, rng: R) -> Self {
        Self {
            state: menu_state(&tuning, 0),
            fall_ms: tuning.fall_start_ms,
            tuning,
            timers: TimerQueue::new(),
            epoch: 0,
            now: 0,
            playfield: None,
            next_item_id: 1,
            next_particle_id: 1,
            recently_caught: HashSet::new(),
            fever_activation: 0,
            magnet_activation: 0,
            magnet_open: false,
            fever_expiry: None,
            magnet_expiry: None,
            pending_reward: None,
            notices: VecDeque::new(),
            submitter,
            rng,
        }
    }

    pub fn state(&self) -> &MatchState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn now(&self) -> Millis {
        self.now
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn playfield(&self) -> Option<Playfield> {
        self.playfield
    }

    pub fn magnet_active(&self) -> bool {
        self.magnet_open
    }

    pub fn reward_pending(&self) -> bool {
        self.pending_reward.is_some()
    }

    pub fn submitter(&self) -> &S {
        &self.submitter
    }

    pub fn drain_notices(&mut self) -> Vec<Notice> {
        self.notices.drain(..).collect()
    }

    /// The single mutation entry point.
    pub fn apply(&mut self, input: Input) {
        match input {
            Input::Start => match self.state.phase {
                Phase::Menu => self.start_match(),
                phase => log::debug!("start ignored in {phase:?}"),
            },
            Input::PlayAgain => match self.state.phase {
                Phase::GameOver => self.start_match(),
                phase => log::debug!("play again ignored in {phase:?}"),
            },
            Input::Back => self.back_to_menu(),
            Input::Catch(id) => self.catch(id),
            Input::Advance { now } => self.advance(now),
            Input::Resize(pf) => {
                self.playfield = if pf.width > 0.0 && pf.height > 0.0 {
                    Some(pf)
                } else {
                    None
                };
            }
            Input::RetryReward => {
                if self.state.phase == Phase::GameOver {
                    self.evaluate_reward();
                }
            }
            Input::RewardResult(done) => self.settle_reward(done),
        }
    }

    /// Put an item of `kind` on the playfield at `x`.  Only while playing.
    pub fn place_item(&mut self, kind: ItemKind, x: f32) -> Option<ItemId> {
        if self.state.phase != Phase::Playing {
            return None;
        }
        let id = self.next_item_id;
        self.next_item_id += 1;
        let item = FallingItem {
            id,
            kind,
            x,
            spawned_at: self.now,
            fall_ms: self.fall_ms,
        };
        self.timers
            .schedule(item.lands_at(), self.epoch, TimerEvent::ItemLanded(id));
        log::debug!("spawned {kind:?} #{id} at x={x:.1}, falls in {}ms", item.fall_ms);
        self.state.items.push(item);
        Some(id)
    }

    // ── Phase transitions ────────────────────────────────────────────────────

    fn start_match(&mut self) {
        self.epoch += 1;
        self.timers.clear();
        self.fever_expiry = None;
        self.magnet_expiry = None;
        self.pending_reward = None;
        self.state = init_state(&self.tuning, self.state.high_score);
        self.recently_caught.clear();
        self.fall_ms = self.tuning.fall_start_ms;
        self.magnet_open = false;
        log::info!("match started (epoch {})", self.epoch);

        self.timers
            .schedule(self.now + COUNTDOWN_MS, self.epoch, TimerEvent::CountdownTick);
        self.spawn();
    }

    fn leave_playing(&mut self) {
        self.epoch += 1;
        self.timers.clear();
        self.fever_expiry = None;
        self.magnet_expiry = None;
        self.state.items.clear();
        self.state.fever_active = false;
        self.state.power_ups.magnet_charges = 0;
        self.magnet_open = false;
    }

    fn end_match(&mut self) {
        if self.state.phase != Phase::Playing {
            return;
        }
        self.leave_playing();
        self.state.phase = Phase::GameOver;

        let score = self.state.score;
        log::info!(
            "match over: score {score}, high score {}",
            self.state.high_score
        );
        if score > self.state.high_score {
            self.state.high_score = score;
            self.notices.push_back(Notice::NewHighScore(score));
        }
        self.evaluate_reward();
    }

    fn back_to_menu(&mut self) {
        match self.state.phase {
            Phase::Menu => {}
            Phase::Playing => {
                log::info!("match abandoned at score {}", self.state.score);
                self.leave_playing();
                self.state.phase = Phase::Menu;
            }
            Phase::GameOver => {
                self.state.phase = Phase::Menu;
            }
        }
    }

    fn evaluate_reward(&mut self) {
        let notice = match evaluate_reward(
            &mut self.state.reward_claimed,
            self.state.score,
            self.tuning.reward_threshold,
            &mut self.submitter,
        ) {
            RewardOutcome::Granted(receipt) => Notice::RewardGranted(receipt),
            RewardOutcome::Failed(e) => Notice::RewardFailed(e.to_string()),
            RewardOutcome::Pending { ticket } => {
                self.pending_reward = Some(ticket);
                Notice::RewardSubmitting
            }
            RewardOutcome::AlreadyClaimed => Notice::RewardAlreadyClaimed,
            RewardOutcome::BelowThreshold { missing } => Notice::BelowThreshold { missing },
        };
        self.notices.push_back(notice);
    }

    fn settle_reward(&mut self, done: SubmissionResult) {
        if self.pending_reward != Some(done.ticket) {
            log::debug!("reward result #{} belongs to an earlier match", done.ticket);
            return;
        }
        self.pending_reward = None;
        let notice = match settle_reward(&mut self.state.reward_claimed, done.result) {
            RewardOutcome::Granted(receipt) => Notice::RewardGranted(receipt),
            RewardOutcome::Failed(e) => Notice::RewardFailed(e.to_string()),
            other => {
                log::warn!("unexpected settled reward outcome {other:?}");
                return;
            }
        };
        self.notices.push_back(notice);
    }

    // ── Clock ────────────────────────────────────────────────────────────────

    fn advance(&mut self, now: Millis) {
        if now < self.now {
            log::debug!("clock went backwards ({} → {now}), ignoring", self.now);
            return;
        }
        while let Some(fired) = self.timers.pop_due(now) {
            self.now = fired.due.max(self.now);
            self.on_timer(fired);
        }
        self.now = now;
        self.state.particles =
            prune_particles(&self.state.particles, now, self.tuning.particle_ms);
    }

    fn on_timer(&mut self, fired: Fired) {
        if fired.epoch != self.epoch || self.state.phase != Phase::Playing {
            log::trace!("stale timer {:?} from epoch {}", fired.event, fired.epoch);
            return;
        }
        match fired.event {
            TimerEvent::CountdownTick => {
                if self.state.time_remaining <= 1 {
                    self.state.time_remaining = 0;
                    self.end_match();
                } else {
                    self.state.time_remaining -= 1;
                    self.timers.schedule(
                        self.now + COUNTDOWN_MS,
                        self.epoch,
                        TimerEvent::CountdownTick,
                    );
                }
            }
            TimerEvent::Spawn => self.spawn(),
            TimerEvent::ItemLanded(id) => {
                self.state.items.retain(|item| item.id != id);
            }
            TimerEvent::FeverEnded { activation } => {
                if activation == self.fever_activation && self.state.fever_active {
                    self.fever_expiry = None;
                    self.state = end_fever(&self.state);
                    log::debug!("fever over");
                }
            }
            TimerEvent::MagnetEnded { activation } => {
                if activation == self.magnet_activation {
                    self.magnet_expiry = None;
                    self.magnet_open = false;
                    self.state.power_ups.magnet_charges = 0;
                    log::debug!("magnet over");
                }
            }
            TimerEvent::MagnetSweep { activation } => {
                if activation == self.magnet_activation && self.magnet_open {
                    self.sweep_magnet();
                    self.timers.schedule(
                        self.now + self.tuning.magnet_sweep_ms.max(1),
                        self.epoch,
                        TimerEvent::MagnetSweep { activation },
                    );
                }
            }
            TimerEvent::CatchReleased(id) => {
                self.recently_caught.remove(&id);
            }
        }
    }

    // ── Spawning ─────────────────────────────────────────────────────────────

    fn spawn(&mut self) {
        match self.playfield {
            Some(pf) => {
                let kind = draw_kind(&mut self.rng);
                let x = spawn_x(&pf, &self.tuning, &mut self.rng);
                self.place_item(kind, x);
            }
            None => log::debug!("no playfield geometry yet, skipping spawn"),
        }
        let remaining = self.state.time_remaining;
        self.fall_ms = fall_duration_ms(&self.tuning, remaining);
        // A zero delay would re-fire forever within one advance.
        let delay = spawn_delay_ms(&self.tuning, remaining).max(1);
        self.timers
            .schedule(self.now + delay, self.epoch, TimerEvent::Spawn);
    }

    // ── Catching ─────────────────────────────────────────────────────────────

    fn catch(&mut self, id: ItemId) {
        if self.state.phase != Phase::Playing {
            return;
        }
        if !self.recently_caught.insert(id) {
            log::debug!("duplicate catch of #{id} ignored");
            return;
        }
        self.timers.schedule(
            self.now + self.tuning.catch_dedup_ms,
            self.epoch,
            TimerEvent::CatchReleased(id),
        );
        let Some(pos) = self.state.items.iter().position(|item| item.id == id) else {
            log::debug!("catch of #{id} missed, item is gone");
            return;
        };
        let item = self.state.items.remove(pos);
        self.resolve(item, false);
    }

    fn sweep_magnet(&mut self) {
        let (pulled, kept): (Vec<FallingItem>, Vec<FallingItem>) = self
            .state
            .items
            .drain(..)
            .partition(|item| item.kind.is_positive());
        self.state.items = kept;
        for item in pulled {
            self.resolve(item, true);
        }
    }

    fn resolve(&mut self, item: FallingItem, automatic: bool) {
        let (next, outcome) = score_catch(&self.state, item.kind, &self.tuning);
        self.state = next;
        log::debug!("caught {:?} #{} → {outcome:?}", item.kind, item.id);

        if let Some(color) = outcome.color() {
            let height = self.playfield.map(|pf| pf.height).unwrap_or(0.0);
            let x = item.x + self.tuning.item_width / 2.0;
            let y = item.fall_progress(self.now) * height;
            let burst = particle_burst(
                self.next_particle_id,
                x,
                y,
                color,
                self.tuning.particles_per_burst,
                self.now,
            );
            self.next_particle_id += burst.len() as ParticleId;
            self.state.particles.extend(burst);
        }

        match outcome {
            CatchOutcome::MatchEnded => {
                self.notices.push_back(Notice::FatalCaught);
                self.end_match();
                return;
            }
            CatchOutcome::MagnetCharged => {
                self.notices.push_back(Notice::MagnetActivated);
                self.open_magnet();
            }
            CatchOutcome::TimeExtended => self.notices.push_back(Notice::TimeExtended),
            CatchOutcome::Scored { points } => {
                if !automatic {
                    self.notices.push_back(Notice::Points(points));
                }
            }
            CatchOutcome::NoEffect => {}
        }

        if fever_due(&self.state, &self.tuning) {
            self.state = start_fever(&self.state);
            self.fever_activation += 1;
            if let Some(prev) = self.fever_expiry.take() {
                self.timers.cancel(prev);
            }
            self.fever_expiry = Some(self.timers.schedule(
                self.now + self.tuning.fever_ms,
                self.epoch,
                TimerEvent::FeverEnded {
                    activation: self.fever_activation,
                },
            ));
            self.notices.push_back(Notice::FeverStarted);
            log::debug!("fever started");
        }
    }

    fn open_magnet(&mut self) {
        self.magnet_activation += 1;
        self.magnet_open = true;
        let activation = self.magnet_activation;
        if let Some(prev) = self.magnet_expiry.take() {
            self.timers.cancel(prev);
        }
        self.magnet_expiry = Some(self.timers.schedule(
            self.now + self.tuning.magnet_ms,
            self.epoch,
            TimerEvent::MagnetEnded { activation },
        ));
        self.timers.schedule(
            self.now + self.tuning.magnet_sweep_ms.max(1),
            self.epoch,
            TimerEvent::MagnetSweep { activation },
        );
    }
}
