#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure input system that turns player actions into world commands.
//!
//! Pointer positions arrive in world units and are snapped to the tile grid.
//! The builder never validates placements itself; it relies on the world to
//! reject them and only offers previews computed through a caller-supplied
//! check.

use team_defence_core::{
    CellCoord, CellRect, CellRectSize, Command, PlacementError, TowerId, TowerKind, UpgradePath,
    Vec2,
};

/// Discrete action reported by an input source.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InputAction {
    /// Build a tower whose footprint starts at the tile under `point`.
    Place {
        /// Kind of tower to build.
        kind: TowerKind,
        /// Pointer position in world units.
        point: Vec2,
    },
    /// Sell the tower covering the tile under `point`.
    Sell {
        /// Pointer position in world units.
        point: Vec2,
    },
    /// Buy the next tier along a path of a selected tower.
    Upgrade {
        /// Tower to upgrade.
        tower: TowerId,
        /// Path to advance.
        path: UpgradePath,
    },
    /// Switch a selected tower to its next targeting mode.
    CycleTargeting {
        /// Tower to adjust.
        tower: TowerId,
    },
    /// Start the next round.
    StartNextRound,
}

/// Declarative placement preview describing a potential tower construction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PlacementPreview {
    /// Kind of tower proposed for placement.
    pub kind: TowerKind,
    /// Origin cell anchoring the proposed tower footprint.
    pub origin: CellCoord,
    /// Region of cells that would be occupied by the tower if placed.
    pub region: CellRect,
    /// Reason the placement would be refused, if any.
    pub rejection: Option<PlacementError>,
}

impl PlacementPreview {
    /// Reports whether the preview represents a valid placement location.
    #[must_use]
    pub const fn placeable(&self) -> bool {
        self.rejection.is_none()
    }
}

/// Configuration parameters required to construct the builder system.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    tile_length: f32,
}

impl Config {
    /// Creates a configuration for a grid of `tile_length` world units per tile.
    #[must_use]
    pub const fn new(tile_length: f32) -> Self {
        Self { tile_length }
    }
}

/// Input system that translates pointer actions into placement commands.
#[derive(Debug, Clone)]
pub struct Builder {
    tile_length: f32,
}

impl Builder {
    /// Creates a new builder system instance.
    #[must_use]
    pub const fn new(config: Config) -> Self {
        Self {
            tile_length: config.tile_length,
        }
    }

    /// Tile under `point`, if the point lies on the non-negative quadrant.
    #[must_use]
    pub fn snap(&self, point: Vec2) -> Option<CellCoord> {
        CellCoord::containing(point, self.tile_length)
    }

    /// Describes what placing `kind` at `point` would do.
    ///
    /// `check` should mirror the world's `query::placement_check` helper.
    pub fn preview<F>(&self, kind: TowerKind, point: Vec2, check: F) -> Option<PlacementPreview>
    where
        F: FnOnce(TowerKind, CellCoord) -> Result<CellRect, PlacementError>,
    {
        let origin = self.snap(point)?;
        let side = kind.stats().footprint;
        let region = CellRect::from_origin_and_size(origin, CellRectSize::new(side, side));
        Some(PlacementPreview {
            kind,
            origin,
            region,
            rejection: check(kind, origin).err(),
        })
    }

    /// Translates input actions into world commands.
    ///
    /// The `tower_at` closure should mirror the semantics of the world's
    /// `query::tower_at` helper so the system can identify the tower under
    /// the pointer. Pointer actions that miss the grid or a tower are
    /// dropped.
    pub fn handle<F>(&self, actions: &[InputAction], mut tower_at: F, out: &mut Vec<Command>)
    where
        F: FnMut(CellCoord) -> Option<TowerId>,
    {
        for action in actions {
            let command = match *action {
                InputAction::Place { kind, point } => self
                    .snap(point)
                    .map(|origin| Command::PlaceTower { kind, origin }),
                InputAction::Sell { point } => self
                    .snap(point)
                    .and_then(&mut tower_at)
                    .map(|tower| Command::SellTower { tower }),
                InputAction::Upgrade { tower, path } => Some(Command::BuyUpgrade { tower, path }),
                InputAction::CycleTargeting { tower } => Some(Command::CycleTargeting { tower }),
                InputAction::StartNextRound => Some(Command::StartNextRound),
            };
            out.extend(command);
        }
    }
}
