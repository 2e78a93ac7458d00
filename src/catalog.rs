/// Static catalog of catchable items and the categorical sampler used to
/// pick a kind for each spawn.

use rand::Rng;
use thiserror::Error;

use crate::entities::{Effect, ItemKind};

/// One catalog row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ItemSpec {
    pub kind: ItemKind,
    /// Sprite name used by graphical hosts.
    pub asset: &'static str,
    /// Single-cell stand-in used by the terminal host.
    pub glyph: char,
    pub effect: Effect,
    pub probability: f64,
}

/// Walk order matters: the sampler accumulates mass in this order.
/// Probabilities must sum to 1.0.
pub const CATALOG: [ItemSpec; 6] = [
    ItemSpec {
        kind: ItemKind::PositiveSmall,
        asset: "cat_happy",
        glyph: '♥',
        effect: Effect::Points(5),
        probability: 0.50,
    },
    ItemSpec {
        kind: ItemKind::Negative,
        asset: "cat_paw_no_touch",
        glyph: '✗',
        effect: Effect::Points(-10),
        probability: 0.20,
    },
    ItemSpec {
        kind: ItemKind::PositiveLarge,
        asset: "cat_stars",
        glyph: '★',
        effect: Effect::Points(20),
        probability: 0.15,
    },
    ItemSpec {
        kind: ItemKind::Fatal,
        asset: "cat_angry",
        glyph: '☠',
        effect: Effect::EndMatch,
        probability: 0.10,
    },
    ItemSpec {
        kind: ItemKind::Magnet,
        asset: "cat_magnet",
        glyph: 'U',
        effect: Effect::MagnetCharge,
        probability: 0.03,
    },
    ItemSpec {
        kind: ItemKind::TimeBonus,
        asset: "cat_rocket",
        glyph: '⏱',
        effect: Effect::ExtraTime,
        probability: 0.02,
    },
];

const PROBABILITY_EPSILON: f64 = 1e-9;

#[derive(Debug, Error, PartialEq)]
pub enum CatalogError {
    #[error("catalog is empty")]
    Empty,
    #[error("negative probability {probability} for {kind:?}")]
    NegativeProbability { kind: ItemKind, probability: f64 },
    #[error("probabilities sum to {0}, expected 1.0")]
    BadTotal(f64),
}

impl ItemKind {
    pub fn spec(&self) -> &'static ItemSpec {
        match self {
            ItemKind::PositiveSmall => &CATALOG[0],
            ItemKind::Negative => &CATALOG[1],
            ItemKind::PositiveLarge => &CATALOG[2],
            ItemKind::Fatal => &CATALOG[3],
            ItemKind::Magnet => &CATALOG[4],
            ItemKind::TimeBonus => &CATALOG[5],
        }
    }

    pub fn effect(&self) -> Effect {
        self.spec().effect
    }

    /// Kinds the magnet pulls in automatically.
    pub fn is_positive(&self) -> bool {
        matches!(self.effect(), Effect::Points(p) if p > 0)
    }
}

// ── Weighted choice ───────────────────────────────────────────────────────────

/// Categorical sampling over `(weight, value)` pairs: walk the entries in
/// order accumulating weight and return the first value whose cumulative
/// weight reaches `draw`.  Returns `None` when the draw lies beyond the total
/// mass, which for a normalised table only happens through rounding.
pub fn weighted_choice<T: Copy>(entries: &[(f64, T)], draw: f64) -> Option<T> {
    let mut accumulated = 0.0;
    for &(weight, value) in entries {
        accumulated += weight;
        if draw <= accumulated {
            return Some(value);
        }
    }
    None
}

/// Pick the kind for the next spawn.  Falls back to `PositiveSmall` if the
/// walk overruns the table.
pub fn draw_kind(rng: &mut impl Rng) -> ItemKind {
    let table: Vec<(f64, ItemKind)> = CATALOG.iter().map(|s| (s.probability, s.kind)).collect();
    let draw: f64 = rng.gen();
    weighted_choice(&table, draw).unwrap_or_else(|| {
        log::warn!("weighted draw {draw} overran catalog, falling back to PositiveSmall");
        ItemKind::PositiveSmall
    })
}

/// Check the authoring contract: non-negative weights summing to 1.0.
pub fn validate(catalog: &[ItemSpec]) -> Result<(), CatalogError> {
    if catalog.is_empty() {
        return Err(CatalogError::Empty);
    }
    if let Some(bad) = catalog.iter().find(|s| s.probability < 0.0) {
        return Err(CatalogError::NegativeProbability {
            kind: bad.kind,
            probability: bad.probability,
        });
    }
    let total: f64 = catalog.iter().map(|s| s.probability).sum();
    if (total - 1.0).abs() > PROBABILITY_EPSILON {
        return Err(CatalogError::BadTotal(total));
    }
    Ok(())
}
