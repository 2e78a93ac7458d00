/// All catch-game entity types — pure data, no logic.

/// Milliseconds on the engine's virtual clock.
pub type Millis = u64;
pub type ItemId = u64;
pub type ParticleId = u64;

// ── Item kinds ────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Happy cat, +5.
    PositiveSmall,
    /// Paw-don't-touch cat, −10.
    Negative,
    /// Star-eyed cat, +20.
    PositiveLarge,
    /// Angry cat. Ends the match on catch.
    Fatal,
    /// Magnet cat. Grants one magnet charge.
    Magnet,
    /// Rocket cat. +5 seconds, once per match.
    TimeBonus,
}

/// What catching an item does.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Points(i32),
    EndMatch,
    MagnetCharge,
    ExtraTime,
}

// ── Live items ────────────────────────────────────────────────────────────────

/// An item travelling from the top of the playfield to the bottom.
/// The fall duration is fixed at spawn and never re-evaluated.
#[derive(Clone, Debug, PartialEq)]
pub struct FallingItem {
    pub id: ItemId,
    pub kind: ItemKind,
    /// Left edge, in playfield units.
    pub x: f32,
    pub spawned_at: Millis,
    pub fall_ms: Millis,
}

impl FallingItem {
    /// Fraction of the fall completed at `now`, in [0, 1].
    pub fn fall_progress(&self, now: Millis) -> f32 {
        if self.fall_ms == 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.spawned_at) as f32;
        (elapsed / self.fall_ms as f32).clamp(0.0, 1.0)
    }

    pub fn lands_at(&self) -> Millis {
        self.spawned_at + self.fall_ms
    }
}

// ── Particles (cosmetic) ──────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorTag {
    Pink,
    Gold,
    Grey,
    Red,
    Violet,
    Amber,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Particle {
    pub id: ParticleId,
    pub x: f32,
    pub y: f32,
    /// Burst direction in degrees.
    pub angle: f32,
    pub color: ColorTag,
    pub born_at: Millis,
}

// ── Match state ───────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Menu,
    Playing,
    GameOver,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PowerUps {
    pub magnet_charges: u32,
    pub time_extend_used: bool,
}

/// Visible playfield dimensions reported by the host.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Playfield {
    pub width: f32,
    pub height: f32,
}

/// State of one match.  Reset entirely on (re)start except `high_score`,
/// which lives for the whole session.
#[derive(Clone, Debug, PartialEq)]
pub struct MatchState {
    pub phase: Phase,
    pub score: u32,
    /// Whole seconds left on the countdown.
    pub time_remaining: u32,
    /// Consecutive positive catches, cosmetic only.
    pub combo: u32,
    pub fever_active: bool,
    pub power_ups: PowerUps,
    /// Streak feeding the fever trigger.  Power-ups count towards it.
    pub consecutive_good_catches: u32,
    pub high_score: u32,
    pub items: Vec<FallingItem>,
    pub particles: Vec<Particle>,
    pub reward_claimed: bool,
}
