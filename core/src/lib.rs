#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Team Defence simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond exclusively with new command
//! batches.
//!
//! Static per-kind tables live in [`stats`], the loadable map and wave catalog
//! formats in [`catalog`], and renderer-facing snapshots in [`scene`].

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod catalog;
mod config;
pub mod scene;
pub mod stats;

pub use catalog::{
    early_start_bonus, round_completion_bonus, Lane, MapDefinition, PathRule, RoundPlan,
    SpawnEntry, WaveCatalog, DEGENERATE_ROUND_DURATION,
};
pub use config::{time_units, SimulationConfig, TIME_UNITS_PER_SECOND};
pub use glam::Vec2;
pub use stats::{
    ChildSpawn, EnemyKind, EnemyStats, EnemyTier, ProjectileBehaviour, TargetingMode, TowerKind,
    TowerStats, Unlock, UpgradeEffect, UpgradePath, UpgradeTier,
};

/// Speed of every projectile in world units per time unit.
pub const PROJECTILE_SPEED: f32 = 0.1;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock and re-sorts enemies by progress.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Spawns an enemy at the start of its lane on behalf of a round.
    SpawnEnemy {
        /// Kind of enemy to spawn.
        kind: EnemyKind,
        /// Round that owns the enemy.
        round: RoundNumber,
    },
    /// Moves every enemy along its lane, resolving deaths and leaks.
    AdvanceEnemies,
    /// Lets every tower act on the targets selected for it this tick.
    ///
    /// Towers without an entry stop firing.
    EngageTargets {
        /// Target assignments produced by the targeting system.
        targets: Vec<TowerTarget>,
    },
    /// Moves every projectile and resolves collisions.
    AdvanceProjectiles,
    /// Retires a round whose scheduler finished, crediting its bonus.
    CompleteRound {
        /// Round that finished.
        round: RoundNumber,
    },
    /// Publishes whether the next round may be started early and for what bonus.
    OfferEarlyStart {
        /// Bonus credited when the early start is taken, if one is on offer.
        bonus: Option<u32>,
    },
    /// Requests placement of a tower anchored at the provided origin cell.
    PlaceTower {
        /// Type of tower to construct at the origin.
        kind: TowerKind,
        /// Upper-left cell that defines the tower's footprint.
        origin: CellCoord,
    },
    /// Sells a tower for half of the money spent on it.
    SellTower {
        /// Identifier of the tower to sell.
        tower: TowerId,
    },
    /// Buys the next tier along an upgrade path.
    BuyUpgrade {
        /// Identifier of the tower to upgrade.
        tower: TowerId,
        /// Path to advance.
        path: UpgradePath,
    },
    /// Switches a tower to the next targeting mode.
    CycleTargeting {
        /// Identifier of the tower to adjust.
        tower: TowerId,
    },
    /// Starts the next round from the catalog.
    StartNextRound,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Frame duration after clamping.
        dt: Duration,
        /// The same duration expressed in time units.
        units: f32,
    },
    /// Confirms that an enemy entered the playfield.
    EnemySpawned {
        /// Identifier assigned to the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Round that owns the enemy.
        round: RoundNumber,
        /// Lane the enemy walks.
        lane: LaneId,
    },
    /// Reports that a disguised enemy was revealed.
    EnemyUnmasked {
        /// Identifier of the revealed enemy.
        enemy: EnemyId,
    },
    /// Reports that an enemy died and paid out its value.
    EnemyKilled {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Round that owned the enemy.
        round: RoundNumber,
        /// Money credited for the kill.
        reward: u32,
    },
    /// Reports that an enemy reached the end of its lane.
    EnemyLeaked {
        /// Identifier of the enemy.
        enemy: EnemyId,
        /// Kind of the enemy.
        kind: EnemyKind,
        /// Round that owned the enemy.
        round: RoundNumber,
        /// Health lost to the leak.
        damage: u32,
    },
    /// Reports that health dropped to zero or below. Emitted once.
    HealthDepleted,
    /// Confirms that a tower was placed into the world.
    TowerPlaced {
        /// Identifier assigned to the tower by the world.
        tower: TowerId,
        /// Type of tower that was placed.
        kind: TowerKind,
        /// Region of cells occupied by the tower.
        region: CellRect,
    },
    /// Reports that a tower placement request was rejected.
    TowerPlacementRejected {
        /// Type of tower requested for placement.
        kind: TowerKind,
        /// Origin cell provided in the placement request.
        origin: CellCoord,
        /// Specific reason the placement failed.
        reason: PlacementError,
    },
    /// Confirms that a tower was sold.
    TowerSold {
        /// Identifier of the sold tower.
        tower: TowerId,
        /// Region of cells the tower released.
        region: CellRect,
        /// Money credited for the sale.
        refund: u32,
    },
    /// Reports that a sale request was rejected.
    TowerSaleRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the sale failed.
        reason: RemovalError,
    },
    /// Confirms that an upgrade tier was bought.
    UpgradePurchased {
        /// Identifier of the upgraded tower.
        tower: TowerId,
        /// Path that advanced.
        path: UpgradePath,
        /// Tier that was bought.
        tier: UpgradeTier,
        /// Money debited.
        price: u32,
    },
    /// Reports that an upgrade request was rejected.
    UpgradeRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Path provided in the request.
        path: UpgradePath,
        /// Specific reason the upgrade failed.
        reason: UpgradeError,
    },
    /// Confirms that a tower switched targeting mode.
    TargetingChanged {
        /// Identifier of the tower.
        tower: TowerId,
        /// Mode now in effect.
        mode: TargetingMode,
    },
    /// Reports that a targeting change was rejected.
    TargetingChangeRejected {
        /// Identifier provided in the request.
        tower: TowerId,
        /// Specific reason the change failed.
        reason: TargetingError,
    },
    /// Reports that a tower launched a projectile.
    ProjectileFired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
        /// Tower that fired it.
        tower: TowerId,
    },
    /// Reports that a projectile left play.
    ProjectileExpired {
        /// Identifier of the projectile.
        projectile: ProjectileId,
    },
    /// Reports that a beam struck its target.
    BeamFired {
        /// Tower owning the beam.
        tower: TowerId,
        /// Beam that fired.
        beam: BeamSlot,
        /// Enemy that was struck.
        enemy: EnemyId,
        /// Charge, equal to the base damage dealt.
        charge: u32,
    },
    /// Reports that a mine paid out.
    PayoutCredited {
        /// Mine that paid out.
        tower: TowerId,
        /// Round whose schedule triggered the payout.
        round: RoundNumber,
        /// Money credited.
        amount: i64,
    },
    /// Confirms that a round began.
    RoundStarted {
        /// Round that began.
        round: RoundNumber,
        /// Bonus credited for starting early, if any.
        early_bonus: Option<u32>,
    },
    /// Reports that a request to start the next round was rejected.
    RoundStartRejected {
        /// Specific reason the start failed.
        reason: RoundStartError,
    },
    /// Confirms that a round finished and paid its bonus.
    RoundCompleted {
        /// Round that finished.
        round: RoundNumber,
        /// Money credited.
        bonus: u32,
    },
}

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(u32);

        impl $name {
            /// Creates an identifier with the provided numeric value.
            #[must_use]
            pub const fn new(value: u32) -> Self {
                Self(value)
            }

            /// Retrieves the numeric representation of the identifier.
            #[must_use]
            pub const fn get(&self) -> u32 {
                self.0
            }
        }
    };
}

numeric_id!(
    /// Unique identifier assigned to an enemy; never reused within a world.
    EnemyId
);
numeric_id!(
    /// Unique identifier assigned to a tower.
    TowerId
);
numeric_id!(
    /// Unique identifier assigned to a projectile.
    ProjectileId
);
numeric_id!(
    /// One-based round number; zero means no round has started yet.
    RoundNumber
);
numeric_id!(
    /// Index of a lane within the map.
    LaneId
);

impl RoundNumber {
    /// Round number that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl LaneId {
    /// Lane index usable for slice access.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

/// One of the two beams an Inferno tower can run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeamSlot {
    /// Beam driven by the tower's own targeting mode.
    Primary,
    /// Beam unlocked by an upgrade, driven by a different mode.
    Secondary,
}

impl BeamSlot {
    /// Index of the slot within a tower's beam array.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Cell containing the provided world-space point, if it is not negative.
    #[must_use]
    pub fn containing(point: Vec2, tile_length: f32) -> Option<Self> {
        if tile_length <= 0.0 || point.x < 0.0 || point.y < 0.0 {
            return None;
        }
        let column = (point.x / tile_length).floor();
        let row = (point.y / tile_length).floor();
        if column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }
        Some(Self::new(column as u32, row as u32))
    }
}

/// Axis-aligned rectangle expressed in cell coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRect {
    origin: CellCoord,
    size: CellRectSize,
}

impl CellRect {
    /// Constructs a rectangle from an origin cell and size.
    #[must_use]
    pub const fn from_origin_and_size(origin: CellCoord, size: CellRectSize) -> Self {
        Self { origin, size }
    }

    /// Upper-left cell that anchors the rectangle.
    #[must_use]
    pub const fn origin(&self) -> CellCoord {
        self.origin
    }

    /// Dimensions of the rectangle measured in whole cells.
    #[must_use]
    pub const fn size(&self) -> CellRectSize {
        self.size
    }

    /// Reports whether the rectangle covers the provided cell.
    #[must_use]
    pub fn contains(&self, cell: CellCoord) -> bool {
        let column = cell.column();
        let row = cell.row();
        column >= self.origin.column()
            && row >= self.origin.row()
            && u64::from(column) < u64::from(self.origin.column()) + u64::from(self.size.width())
            && u64::from(row) < u64::from(self.origin.row()) + u64::from(self.size.height())
    }

    /// Iterates every covered cell in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = CellCoord> {
        let origin = self.origin;
        let size = self.size;
        (0..size.height()).flat_map(move |dy| {
            (0..size.width()).map(move |dx| {
                CellCoord::new(origin.column() + dx, origin.row() + dy)
            })
        })
    }

    /// Centre of the rectangle in world units.
    #[must_use]
    pub fn center(&self, tile_length: f32) -> Vec2 {
        Vec2::new(
            (self.origin.column() as f32 + self.size.width() as f32 / 2.0) * tile_length,
            (self.origin.row() as f32 + self.size.height() as f32 / 2.0) * tile_length,
        )
    }
}

/// Size of a [`CellRect`] measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CellRectSize {
    width: u32,
    height: u32,
}

impl CellRectSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Width of the rectangle in cells.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Height of the rectangle in cells.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }
}

/// Reports whether two axis-aligned squares centred on the points overlap.
#[must_use]
pub fn squares_overlap(a: Vec2, a_extent: f32, b: Vec2, b_extent: f32) -> bool {
    let reach = (a_extent + b_extent) / 2.0;
    (a.x - b.x).abs() < reach && (a.y - b.y).abs() < reach
}

/// Immutable representation of a single enemy's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySnapshot {
    /// Unique identifier assigned to the enemy.
    pub id: EnemyId,
    /// Kind of the enemy.
    pub kind: EnemyKind,
    /// Tier classifier of the kind.
    pub tier: EnemyTier,
    /// Centre of the enemy in world units.
    pub position: Vec2,
    /// Unit vector the enemy is walking along.
    pub heading: Vec2,
    /// Remaining health.
    pub health: i32,
    /// Targeting priority score.
    pub strength: u32,
    /// Whether the enemy is still disguised.
    pub disguised: bool,
    /// Fraction of the lane travelled.
    pub progress: f32,
    /// Lane the enemy walks.
    pub lane: LaneId,
    /// Round that owns the enemy.
    pub round: RoundNumber,
}

/// Read-only snapshot of every living enemy, most advanced first.
///
/// The order is the population order established at the start of the tick:
/// descending progress, ties kept in their previous relative order.
#[derive(Clone, Debug, Default)]
pub struct EnemyView {
    snapshots: Vec<EnemySnapshot>,
}

impl EnemyView {
    /// Creates a new enemy view, keeping the provided order.
    #[must_use]
    pub fn from_snapshots(snapshots: Vec<EnemySnapshot>) -> Self {
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in population order.
    pub fn iter(&self) -> impl Iterator<Item = &EnemySnapshot> {
        self.snapshots.iter()
    }

    /// Number of captured enemies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether no enemies were captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EnemySnapshot> {
        self.snapshots
    }
}

/// Immutable representation of a single tower's state used for queries.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Kind of tower that was constructed.
    pub kind: TowerKind,
    /// Region of cells occupied by the tower.
    pub region: CellRect,
    /// Centre of the footprint in world units.
    pub center: Vec2,
    /// Targeting radius in world units after upgrades.
    pub radius: f32,
    /// Mode used by the primary beam or projectile launcher.
    pub targeting: TargetingMode,
    /// Whether the tower can target disguised enemies.
    pub sees_disguise: bool,
    /// Whether a second beam is unlocked.
    pub second_beam: bool,
    /// Tiers bought on each path.
    pub upgrades: [u8; 2],
    /// Money spent on the tower and its upgrades.
    pub money_spent: u32,
    /// Base damage dealt so far.
    pub damage_dealt: i64,
}

/// Read-only snapshot describing all towers placed within the playfield.
#[derive(Clone, Debug, Default)]
pub struct TowerView {
    snapshots: Vec<TowerSnapshot>,
}

impl TowerView {
    /// Creates a new tower view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<TowerSnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured tower snapshots in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &TowerSnapshot> {
        self.snapshots.iter()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<TowerSnapshot> {
        self.snapshots
    }
}

/// Target chosen for one beam or launcher of a tower.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerTarget {
    /// Tower acting on the target.
    pub tower: TowerId,
    /// Beam slot the target belongs to; launchers always use the primary slot.
    pub beam: BeamSlot,
    /// Enemy selected.
    pub enemy: EnemyId,
    /// Enemy centre at selection time.
    pub aim: Vec2,
}

/// Money, health and round state exposed after every tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Money available.
    pub money: i64,
    /// Health remaining; the game is lost once this reaches zero.
    pub health: i64,
    /// Most recently started round, zero before the first.
    pub round: RoundNumber,
    /// Rounds whose schedulers have not finished.
    pub active_rounds: u32,
    /// Bonus currently offered for starting the next round early.
    pub early_start: Option<u32>,
}

/// Reasons a tower placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum PlacementError {
    /// The requested footprint extends beyond the playfield.
    #[error("tower footprint leaves the playfield")]
    OutOfBounds,
    /// The requested footprint covers a lane or a blocked tile.
    #[error("tower footprint covers a blocked tile")]
    Blocked,
    /// The requested footprint overlaps another tower.
    #[error("tower footprint overlaps another tower")]
    Occupied,
    /// The ledger cannot cover the tower's price.
    #[error("tower costs {price} but only {available} is available")]
    InsufficientFunds {
        /// Price of the tower.
        price: u32,
        /// Money available at the time of the request.
        available: i64,
    },
}

/// Reasons a tower sale request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RemovalError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
}

/// Reasons an upgrade purchase may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum UpgradeError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The other path already owns a locking tier.
    #[error("upgrade path is locked by the other path")]
    AlreadyLocked,
    /// Every tier on the path has been bought.
    #[error("upgrade path is complete")]
    PathComplete,
    /// The ledger cannot cover the tier's price.
    #[error("upgrade costs {price} but only {available} is available")]
    InsufficientFunds {
        /// Price of the tier.
        price: u32,
        /// Money available at the time of the request.
        available: i64,
    },
}

/// Reasons a targeting change may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum TargetingError {
    /// No tower with the provided identifier exists.
    #[error("no such tower")]
    MissingTower,
    /// The tower never acquires targets.
    #[error("tower does not target enemies")]
    NotTargeting,
}

/// Reasons a request to start the next round may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum RoundStartError {
    /// A round is running and no early start is on offer.
    #[error("a round is in progress")]
    RoundInProgress,
    /// Every round in the catalog has been started.
    #[error("the wave catalog has no round {0}")]
    CatalogExhausted(u32),
}

/// Reasons a map definition may be refused when building a world.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Error, Serialize, Deserialize)]
pub enum MapError {
    /// The playfield has no tiles.
    #[error("playfield must have at least one column and one row")]
    EmptyPlayfield,
    /// The map defines no lanes.
    #[error("map defines no lanes")]
    NoLanes,
    /// A lane has fewer than two waypoints.
    #[error("lane {lane} needs at least two waypoints")]
    LaneTooShort {
        /// Index of the offending lane.
        lane: usize,
    },
    /// A blocked cell lies outside the playfield.
    #[error("blocked cell ({column}, {row}) lies outside the playfield")]
    BlockedCellOutOfBounds {
        /// Column of the cell.
        column: u32,
        /// Row of the cell.
        row: u32,
    },
    /// The configured tile length is not positive.
    #[error("tile length must be positive")]
    InvalidTileLength,
}
