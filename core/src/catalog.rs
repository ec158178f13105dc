//! Map and wave catalog definitions loaded before a game starts.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::{CellCoord, EnemyKind, LaneId, RoundNumber};

/// Round length substituted when a round's delays sum to zero.
pub const DEGENERATE_ROUND_DURATION: f32 = 1000.0;

/// Rule deciding which lane a freshly spawned enemy walks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PathRule {
    /// Enemies are spread across every lane by identifier.
    #[default]
    AllLanes,
    /// Every enemy of a round walks the same lane, rotating per round.
    Alternating,
}

impl PathRule {
    /// Lane assigned to an enemy spawned for `round` with the numeric id `enemy`.
    ///
    /// Returns lane zero when the map has no lanes so callers never divide by zero.
    #[must_use]
    pub fn lane_for(self, enemy: u32, round: RoundNumber, lane_count: usize) -> LaneId {
        if lane_count == 0 {
            return LaneId::new(0);
        }
        let count = lane_count as u64;
        let selector = match self {
            Self::AllLanes => u64::from(enemy),
            Self::Alternating => u64::from(round.get()),
        };
        LaneId::new((selector % count) as u32)
    }
}

/// Ordered waypoints walked by enemies; index zero spawns, the last leaks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lane {
    /// Waypoints in world units.
    pub waypoints: Vec<Vec2>,
}

impl Lane {
    /// Total polyline length of the lane in world units.
    #[must_use]
    pub fn length(&self) -> f32 {
        self.waypoints
            .windows(2)
            .map(|pair| pair[0].distance(pair[1]))
            .sum()
    }
}

/// Static description of a playfield.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MapDefinition {
    /// Number of tile columns.
    pub columns: u32,
    /// Number of tile rows.
    pub rows: u32,
    /// Lanes enemies may walk.
    pub lanes: Vec<Lane>,
    /// Tiles on which towers may not be placed, besides those the lanes cross.
    #[serde(default)]
    pub blocked: Vec<CellCoord>,
    /// Lane assignment rule.
    #[serde(default)]
    pub path_rule: PathRule,
}

/// Single spawn instruction of a round.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnEntry {
    /// Kind of enemy to spawn.
    pub kind: EnemyKind,
    /// Time units to wait after this spawn before the next one.
    pub delay: f32,
}

#[derive(Deserialize)]
struct RoundPlanFile {
    entries: Vec<SpawnEntry>,
}

impl From<RoundPlanFile> for RoundPlan {
    fn from(file: RoundPlanFile) -> Self {
        RoundPlan::new(file.entries)
    }
}

/// Ordered spawn list of a single round with its precomputed duration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(from = "RoundPlanFile")]
pub struct RoundPlan {
    entries: Vec<SpawnEntry>,
    #[serde(skip_serializing)]
    duration: f32,
}

impl RoundPlan {
    /// Builds a round, computing its duration from every delay except the last.
    #[must_use]
    pub fn new(entries: Vec<SpawnEntry>) -> Self {
        let summed: f32 = entries
            .iter()
            .rev()
            .skip(1)
            .map(|entry| entry.delay.max(0.0))
            .sum();
        let duration = if summed > 0.0 {
            summed
        } else {
            DEGENERATE_ROUND_DURATION
        };
        Self { entries, duration }
    }

    /// Spawn entries in order.
    #[must_use]
    pub fn entries(&self) -> &[SpawnEntry] {
        &self.entries
    }

    /// Round length in time units; never zero.
    #[must_use]
    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Reports whether the duration is the degenerate fallback.
    #[must_use]
    pub fn uses_fallback_duration(&self) -> bool {
        self.entries.iter().rev().skip(1).all(|entry| entry.delay <= 0.0)
    }
}

/// Ordered list of every round the game can play.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveCatalog {
    /// Rounds in play order; round `n` plays entry `n - 1`.
    pub rounds: Vec<RoundPlan>,
}

impl WaveCatalog {
    /// Plan played by the provided round, if the catalog reaches that far.
    #[must_use]
    pub fn round(&self, round: RoundNumber) -> Option<&RoundPlan> {
        let index = usize::try_from(round.get()).ok()?.checked_sub(1)?;
        self.rounds.get(index)
    }

    /// Number of rounds in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Reports whether the catalog contains no rounds.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}

/// Money credited when `round` finishes.
///
/// Rounds up to ten pay ten per round number; later rounds pay
/// `floor(100 * log10(round))`.
#[must_use]
pub fn round_completion_bonus(round: RoundNumber) -> u32 {
    let round = round.get();
    if round <= 10 {
        10 * round
    } else {
        (100.0 * f64::from(round).log10()).floor() as u32
    }
}

/// Bonus offered for starting the next round while `time_left` remains of a
/// round lasting `duration`, or `None` while it is too early to offer one.
#[must_use]
pub fn early_start_bonus(time_left: f32, duration: f32) -> Option<u32> {
    if duration <= 0.0 || time_left >= duration / 4.0 {
        return None;
    }
    let fraction = (time_left / duration).max(0.0);
    Some((fraction * 400.0).floor() as u32)
}
