//! Static per-kind tables for enemies and towers.
//!
//! Every enemy and tower kind is a tag; the numbers that describe it live in
//! `const fn` lookups keyed by that tag so the world never dispatches on
//! anything but the enum itself.

use serde::{Deserialize, Serialize};

/// Classification that drives enemy stats and bonus-damage eligibility.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EnemyTier {
    /// Ordinary enemies of increasing toughness.
    Normal,
    /// Quicker enemies with moderate health.
    Fast,
    /// Tough and quick enemies that take bonus damage from some towers.
    StrongAndFast,
    /// Enemies immune to towers lacking disguise vision until unmasked.
    Disguised,
    /// Slow, very tough enemies that split into smaller ones.
    Boss,
}

/// Enemy kinds that can appear in a wave catalog.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EnemyKind {
    /// Weakest normal enemy.
    Scout,
    /// Normal enemy with double the scout's health.
    Soldier,
    /// Toughest normal enemy.
    Veteran,
    /// Fast enemy.
    Runner,
    /// Faster enemy that also appears as a shellback's children.
    Sprinter,
    /// Strong-and-fast enemy that splits into two sprinters.
    Shellback,
    /// Boss that splits into three shellbacks.
    Colossus,
    /// Disguised enemy that speeds up once unmasked.
    Shade,
    /// Disguised tough enemy that splits into two shades.
    ShadeShell,
    /// Strong-and-fast enemy that splits into four shellbacks.
    Juggernaut,
}

/// Children released when an enemy dies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChildSpawn {
    /// Kind of every spawned child.
    pub kind: EnemyKind,
    /// Number of children released.
    pub count: u32,
}

/// Static stats loaded into an enemy when it spawns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemyStats {
    /// Tier classifier.
    pub tier: EnemyTier,
    /// Starting health.
    pub health: i32,
    /// Movement speed in world units per time unit.
    pub speed: f32,
    /// Speed after the disguise is removed, for kinds that have one.
    pub revealed_speed: Option<f32>,
    /// Targeting priority score used by strong targeting.
    pub strength: u32,
    /// Money credited on death and health lost on leak.
    pub value: u32,
    /// Whether the enemy spawns disguised.
    pub disguised: bool,
    /// Children released on death.
    pub children: Option<ChildSpawn>,
    /// Side length of the square hitbox in world units.
    pub extent: f32,
}

const DEFAULT_ENEMY_SPEED: f32 = 0.015;
const ENEMY_EXTENT: f32 = 20.0;
const BOSS_EXTENT: f32 = 40.0;

impl EnemyKind {
    /// Every enemy kind in catalog order.
    pub const ALL: [EnemyKind; 10] = [
        EnemyKind::Scout,
        EnemyKind::Soldier,
        EnemyKind::Veteran,
        EnemyKind::Runner,
        EnemyKind::Sprinter,
        EnemyKind::Shellback,
        EnemyKind::Colossus,
        EnemyKind::Shade,
        EnemyKind::ShadeShell,
        EnemyKind::Juggernaut,
    ];

    /// Static stats for the kind.
    #[must_use]
    pub const fn stats(self) -> EnemyStats {
        let base = EnemyStats {
            tier: EnemyTier::Normal,
            health: 6,
            speed: DEFAULT_ENEMY_SPEED,
            revealed_speed: None,
            strength: 0,
            value: 4,
            disguised: false,
            children: None,
            extent: ENEMY_EXTENT,
        };

        match self {
            Self::Scout => base,
            Self::Soldier => EnemyStats {
                health: 12,
                strength: 1,
                ..base
            },
            Self::Veteran => EnemyStats {
                health: 20,
                strength: 2,
                value: 5,
                ..base
            },
            Self::Runner => EnemyStats {
                tier: EnemyTier::Fast,
                health: 16,
                speed: 0.02,
                strength: 3,
                value: 6,
                ..base
            },
            Self::Sprinter => EnemyStats {
                tier: EnemyTier::Fast,
                health: 20,
                speed: 0.025,
                strength: 4,
                value: 8,
                ..base
            },
            Self::Shellback => EnemyStats {
                tier: EnemyTier::StrongAndFast,
                health: 40,
                speed: 0.035,
                strength: 5,
                children: Some(ChildSpawn {
                    kind: EnemyKind::Sprinter,
                    count: 2,
                }),
                ..base
            },
            Self::Colossus => EnemyStats {
                tier: EnemyTier::Boss,
                health: 250,
                speed: 0.01,
                strength: 10,
                value: 100,
                children: Some(ChildSpawn {
                    kind: EnemyKind::Shellback,
                    count: 3,
                }),
                extent: BOSS_EXTENT,
                ..base
            },
            Self::Shade => EnemyStats {
                tier: EnemyTier::Disguised,
                health: 16,
                speed: 0.02,
                revealed_speed: Some(0.025),
                strength: 4,
                value: 8,
                disguised: true,
                ..base
            },
            Self::ShadeShell => EnemyStats {
                tier: EnemyTier::Disguised,
                health: 35,
                speed: 0.02,
                revealed_speed: Some(0.035),
                strength: 6,
                disguised: true,
                children: Some(ChildSpawn {
                    kind: EnemyKind::Shade,
                    count: 2,
                }),
                ..base
            },
            Self::Juggernaut => EnemyStats {
                tier: EnemyTier::StrongAndFast,
                health: 50,
                speed: 0.03,
                strength: 7,
                children: Some(ChildSpawn {
                    kind: EnemyKind::Shellback,
                    count: 4,
                }),
                ..base
            },
        }
    }

    /// Texture key handed to renderers for the kind.
    #[must_use]
    pub const fn texture_key(self, disguised: bool) -> &'static str {
        match (self, disguised) {
            (Self::Scout, _) => "enemy.scout",
            (Self::Soldier, _) => "enemy.soldier",
            (Self::Veteran, _) => "enemy.veteran",
            (Self::Runner, _) => "enemy.runner",
            (Self::Sprinter, _) => "enemy.sprinter",
            (Self::Shellback, _) => "enemy.shellback",
            (Self::Colossus, _) => "enemy.colossus",
            (Self::Shade, true) => "enemy.shade",
            (Self::Shade, false) => "enemy.shade.revealed",
            (Self::ShadeShell, true) => "enemy.shade_shell",
            (Self::ShadeShell, false) => "enemy.shade_shell.revealed",
            (Self::Juggernaut, _) => "enemy.juggernaut",
        }
    }
}

/// Targeting policies a tower can use to pick among attackable enemies.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TargetingMode {
    /// Most advanced attackable enemy.
    #[default]
    First,
    /// Least advanced attackable enemy.
    Last,
    /// Attackable enemy with the highest strength score.
    Strong,
}

impl TargetingMode {
    /// Modes in cycling order.
    pub const ALL: [TargetingMode; 3] = [Self::First, Self::Last, Self::Strong];

    /// Mode selected after this one when the player cycles targeting.
    #[must_use]
    pub const fn next(self) -> Self {
        match self {
            Self::First => Self::Last,
            Self::Last => Self::Strong,
            Self::Strong => Self::First,
        }
    }

    /// First mode in cycling order that differs from `self`.
    ///
    /// Used by a second beam, which may never share the first beam's mode.
    #[must_use]
    pub const fn alternate(self) -> Self {
        match self {
            Self::First => Self::Last,
            Self::Last | Self::Strong => Self::First,
        }
    }
}

/// Movement and expiry behaviour of a fired projectile.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileBehaviour {
    /// Thrown axe that spins while it flies at constant speed.
    Spinning,
    /// Flame that slows down every few ticks and burns out at zero speed.
    Decaying,
}

impl ProjectileBehaviour {
    /// Side length of the projectile's square hitbox in world units.
    #[must_use]
    pub const fn extent(self) -> f32 {
        match self {
            Self::Spinning => 16.0,
            Self::Decaying => 12.0,
        }
    }

    /// Texture key handed to renderers.
    #[must_use]
    pub const fn texture_key(self) -> &'static str {
        match self {
            Self::Spinning => "projectile.axe",
            Self::Decaying => "projectile.fire",
        }
    }
}

/// Types of towers that can be constructed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerKind {
    /// Axe thrower that sees disguised enemies.
    Dwarf,
    /// Short-range flame projector with high pierce.
    FlameThrower,
    /// Beam tower whose damage charges up on a persistent target.
    Inferno,
    /// Gold mine that pays out on a schedule tied to each round.
    Mine,
}

/// Fire behaviour unlocked by a specific upgrade tier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Unlock {
    /// Throw two projectiles at a fixed angular offset instead of one.
    MultiShot,
    /// Run a second independent beam.
    SecondBeam,
}

/// Static stats loaded into a tower when it is placed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerStats {
    /// Purchase price.
    pub price: u32,
    /// Targeting radius measured in tiles.
    pub radius_tiles: f32,
    /// Side length of the square footprint measured in tiles.
    pub footprint: u32,
    /// Damage per projectile hit.
    pub damage: i32,
    /// Time units between attacks.
    pub attack_interval: f32,
    /// Number of distinct enemies a projectile may damage.
    pub pierce: u32,
    /// Whether the tower can target and unmask disguised enemies.
    pub sees_disguise: bool,
    /// Projectile emitted by the default fire behaviour, if any.
    pub projectile: Option<ProjectileBehaviour>,
    /// Prices of the four tiers on each of the two upgrade paths.
    pub upgrade_prices: [[u32; UpgradeTier::COUNT]; 2],
}

/// Stat deltas applied by a single upgrade tier.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UpgradeEffect {
    /// Added to the targeting radius, in tiles.
    pub radius_tiles: f32,
    /// Added to projectile damage.
    pub damage: i32,
    /// Added to projectile pierce.
    pub pierce: u32,
    /// Added to the attack interval (negative values attack faster).
    pub attack_interval: f32,
    /// Added to the bonus dealt against strong-and-fast enemies.
    pub strong_bonus: i32,
    /// Added to the beam charge rate.
    pub charge_rate: u32,
    /// Added to the money credited per payout.
    pub payout_amount: i64,
    /// Added to the number of payouts per round.
    pub payouts_per_round: u32,
    /// Fire behaviour unlocked by the tier.
    pub unlock: Option<Unlock>,
}

impl UpgradeEffect {
    const NONE: Self = Self {
        radius_tiles: 0.0,
        damage: 0,
        pierce: 0,
        attack_interval: 0.0,
        strong_bonus: 0,
        charge_rate: 0,
        payout_amount: 0,
        payouts_per_round: 0,
        unlock: None,
    };

    const fn faster(by: f32) -> Self {
        Self {
            attack_interval: -by,
            ..Self::NONE
        }
    }

    const fn wider(by: f32) -> Self {
        Self {
            radius_tiles: by,
            ..Self::NONE
        }
    }
}

/// Base money credited per mine payout.
pub const MINE_PAYOUT_AMOUNT: i64 = 10;
/// Base number of mine payouts per round.
pub const MINE_PAYOUTS_PER_ROUND: u32 = 4;
/// Base increment of a beam's charge per consecutive hit on the same target.
pub const BEAM_CHARGE_RATE: u32 = 1;
/// Angular offset in radians of each projectile of a multi-shot volley.
pub const MULTI_SHOT_SPREAD: f32 = 0.261_799;

impl TowerKind {
    /// Every tower kind in menu order.
    pub const ALL: [TowerKind; 4] = [Self::Dwarf, Self::FlameThrower, Self::Inferno, Self::Mine];

    /// Static stats for the kind.
    #[must_use]
    pub const fn stats(self) -> TowerStats {
        match self {
            Self::Dwarf => TowerStats {
                price: 200,
                radius_tiles: 2.5,
                footprint: 1,
                damage: 3,
                attack_interval: 3000.0,
                pierce: 1,
                sees_disguise: true,
                projectile: Some(ProjectileBehaviour::Spinning),
                upgrade_prices: [[80, 120, 650, 2000], [50, 420, 850, 1500]],
            },
            Self::FlameThrower => TowerStats {
                price: 250,
                radius_tiles: 1.5,
                footprint: 1,
                damage: 1,
                attack_interval: 2200.0,
                pierce: 5,
                sees_disguise: false,
                projectile: Some(ProjectileBehaviour::Decaying),
                upgrade_prices: [[380, 330, 420, 1300], [220, 400, 650, 1000]],
            },
            Self::Inferno => TowerStats {
                price: 1000,
                radius_tiles: 2.5,
                footprint: 1,
                damage: 0,
                attack_interval: 1000.0,
                pierce: 1,
                sees_disguise: false,
                projectile: None,
                upgrade_prices: [[350, 550, 650, 1300], [350, 850, 500, 1000]],
            },
            Self::Mine => TowerStats {
                price: 725,
                radius_tiles: 0.0,
                footprint: 2,
                damage: 0,
                attack_interval: 0.0,
                pierce: 1,
                sees_disguise: false,
                projectile: None,
                upgrade_prices: [[300, 500, 700, 2000], [250, 0, 0, 0]],
            },
        }
    }

    /// Reports whether the kind scans for enemies at all.
    #[must_use]
    pub const fn acquires_targets(self) -> bool {
        !matches!(self, Self::Mine)
    }

    /// Price of the provided tier on the provided path.
    #[must_use]
    pub const fn upgrade_price(self, path: UpgradePath, tier: UpgradeTier) -> u32 {
        self.stats().upgrade_prices[path.index()][tier.index()]
    }

    /// Stat deltas applied when the provided tier is bought.
    #[must_use]
    pub const fn upgrade_effect(self, path: UpgradePath, tier: UpgradeTier) -> UpgradeEffect {
        match (self, path, tier.get()) {
            (Self::Dwarf, UpgradePath::Primary, 0 | 1) => UpgradeEffect::faster(600.0),
            (Self::Dwarf, UpgradePath::Primary, 2) => UpgradeEffect::faster(700.0),
            (Self::Dwarf, UpgradePath::Primary, _) => UpgradeEffect {
                pierce: 2,
                ..UpgradeEffect::faster(600.0)
            },
            (Self::Dwarf, UpgradePath::Secondary, 0) => UpgradeEffect::wider(0.5),
            (Self::Dwarf, UpgradePath::Secondary, 1) => UpgradeEffect {
                damage: 3,
                ..UpgradeEffect::wider(0.5)
            },
            (Self::Dwarf, UpgradePath::Secondary, 2) => UpgradeEffect {
                unlock: Some(Unlock::MultiShot),
                ..UpgradeEffect::NONE
            },
            (Self::Dwarf, UpgradePath::Secondary, _) => UpgradeEffect {
                damage: 10,
                strong_bonus: 5,
                ..UpgradeEffect::wider(0.5)
            },
            (Self::FlameThrower, UpgradePath::Primary, 0) => UpgradeEffect {
                damage: 1,
                ..UpgradeEffect::wider(0.5)
            },
            (Self::FlameThrower, UpgradePath::Primary, 1) => UpgradeEffect::wider(0.5),
            (Self::FlameThrower, UpgradePath::Primary, 2) => UpgradeEffect {
                damage: 1,
                strong_bonus: 3,
                pierce: 4,
                ..UpgradeEffect::NONE
            },
            (Self::FlameThrower, UpgradePath::Primary, _) => UpgradeEffect {
                damage: 1,
                strong_bonus: 4,
                ..UpgradeEffect::NONE
            },
            (Self::FlameThrower, UpgradePath::Secondary, 0) => UpgradeEffect::faster(200.0),
            (Self::FlameThrower, UpgradePath::Secondary, 1) => UpgradeEffect {
                pierce: 3,
                ..UpgradeEffect::faster(300.0)
            },
            (Self::FlameThrower, UpgradePath::Secondary, 2) => UpgradeEffect::faster(400.0),
            (Self::FlameThrower, UpgradePath::Secondary, _) => UpgradeEffect::faster(600.0),
            (Self::Inferno, UpgradePath::Primary, 0..=2) => UpgradeEffect::faster(200.0),
            (Self::Inferno, UpgradePath::Primary, _) => UpgradeEffect {
                unlock: Some(Unlock::SecondBeam),
                ..UpgradeEffect::faster(100.0)
            },
            (Self::Inferno, UpgradePath::Secondary, 0 | 2) => UpgradeEffect::wider(0.5),
            (Self::Inferno, UpgradePath::Secondary, 1) => UpgradeEffect {
                charge_rate: 1,
                ..UpgradeEffect::NONE
            },
            (Self::Inferno, UpgradePath::Secondary, _) => UpgradeEffect {
                charge_rate: 1,
                ..UpgradeEffect::wider(0.5)
            },
            (Self::Mine, UpgradePath::Primary, tier) => UpgradeEffect {
                payout_amount: 2 * (tier as i64 + 1),
                ..UpgradeEffect::NONE
            },
            (Self::Mine, UpgradePath::Secondary, 0) => UpgradeEffect {
                payouts_per_round: 1,
                ..UpgradeEffect::NONE
            },
            (Self::Mine, UpgradePath::Secondary, _) => UpgradeEffect::NONE,
        }
    }

    /// Texture key handed to renderers.
    #[must_use]
    pub const fn texture_key(self) -> &'static str {
        match self {
            Self::Dwarf => "tower.dwarf",
            Self::FlameThrower => "tower.flame_thrower",
            Self::Inferno => "tower.inferno",
            Self::Mine => "tower.mine",
        }
    }
}

/// One of the two independent upgrade paths of a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UpgradePath {
    /// Path 0.
    Primary,
    /// Path 1.
    Secondary,
}

impl UpgradePath {
    /// Zero-based index of the path.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Primary => 0,
            Self::Secondary => 1,
        }
    }

    /// The path that is not `self`.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Primary => Self::Secondary,
            Self::Secondary => Self::Primary,
        }
    }
}

/// Zero-based tier index along an upgrade path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UpgradeTier(u8);

impl UpgradeTier {
    /// Number of tiers on each path.
    pub const COUNT: usize = 4;
    /// Tier index from which the other path becomes locked.
    pub const LOCKING: UpgradeTier = UpgradeTier(2);

    /// Creates a tier index, returning `None` past the last tier.
    #[must_use]
    pub const fn new(value: u8) -> Option<Self> {
        if (value as usize) < Self::COUNT {
            Some(Self(value))
        } else {
            None
        }
    }

    /// Retrieves the numeric tier index.
    #[must_use]
    pub const fn get(&self) -> u8 {
        self.0
    }

    const fn index(self) -> usize {
        self.0 as usize
    }
}
