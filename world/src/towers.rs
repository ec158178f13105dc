//! Authoritative tower state management utilities.

use std::collections::BTreeMap;

use team_defence_core::{
    stats::{BEAM_CHARGE_RATE, MINE_PAYOUTS_PER_ROUND, MINE_PAYOUT_AMOUNT},
    CellCoord, CellRect, CellRectSize, EnemyId, RoundNumber, TargetingMode, TowerId, TowerKind,
    TowerSnapshot, Unlock, UpgradeError, UpgradePath, UpgradeTier, Vec2,
};

/// Cooldown and target memory of one launcher or beam.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct AttackSlot {
    pub(crate) cooldown: f32,
    pub(crate) target: Option<EnemyId>,
    pub(crate) aim: Vec2,
    pub(crate) charge: u32,
}

impl AttackSlot {
    /// Forgets the target so a vanished enemy is never acted upon.
    pub(crate) fn clear(&mut self) {
        self.target = None;
        self.charge = 0;
    }
}

/// Payout schedule of a mine for one round.
#[derive(Clone, Copy, Debug)]
pub(crate) struct PayoutTracker {
    pub(crate) round: RoundNumber,
    pub(crate) round_duration: f32,
    pub(crate) countdown: f32,
    pub(crate) paid: u32,
}

/// Tower stored inside the world with its upgraded stats.
#[derive(Clone, Debug)]
pub(crate) struct TowerState {
    pub(crate) id: TowerId,
    pub(crate) kind: TowerKind,
    pub(crate) region: CellRect,
    pub(crate) center: Vec2,
    pub(crate) radius_tiles: f32,
    pub(crate) damage: i32,
    pub(crate) pierce: u32,
    pub(crate) attack_interval: f32,
    pub(crate) strong_bonus: i32,
    pub(crate) sees_disguise: bool,
    pub(crate) multi_shot: bool,
    pub(crate) second_beam: bool,
    pub(crate) charge_rate: u32,
    pub(crate) payout_amount: i64,
    pub(crate) payouts_per_round: u32,
    pub(crate) targeting: TargetingMode,
    pub(crate) slots: [AttackSlot; 2],
    pub(crate) payouts: Vec<PayoutTracker>,
    pub(crate) upgrades: [u8; 2],
    pub(crate) money_spent: u32,
    pub(crate) damage_dealt: i64,
}

impl TowerState {
    fn new(id: TowerId, kind: TowerKind, origin: CellCoord, tile_length: f32) -> Self {
        let stats = kind.stats();
        let region = CellRect::from_origin_and_size(origin, footprint_for(kind));
        Self {
            id,
            kind,
            region,
            center: region.center(tile_length),
            radius_tiles: stats.radius_tiles,
            damage: stats.damage,
            pierce: stats.pierce,
            attack_interval: stats.attack_interval,
            strong_bonus: 0,
            sees_disguise: stats.sees_disguise,
            multi_shot: false,
            second_beam: false,
            charge_rate: BEAM_CHARGE_RATE,
            payout_amount: MINE_PAYOUT_AMOUNT,
            payouts_per_round: MINE_PAYOUTS_PER_ROUND,
            targeting: TargetingMode::default(),
            slots: [AttackSlot::default(); 2],
            payouts: Vec::new(),
            upgrades: [0; 2],
            money_spent: stats.price,
            damage_dealt: 0,
        }
    }

    /// Targeting radius in world units.
    pub(crate) fn radius(&self, tile_length: f32) -> f32 {
        self.radius_tiles * tile_length
    }

    /// Next tier purchasable on `path`, honouring the cross-path lock.
    ///
    /// Once either path owns its third tier, the other path stays capped at
    /// its second.
    pub(crate) fn next_tier(&self, path: UpgradePath) -> Result<UpgradeTier, UpgradeError> {
        let bought = self.upgrades[path.index()];
        let tier = UpgradeTier::new(bought).ok_or(UpgradeError::PathComplete)?;
        let other = self.upgrades[path.other().index()];
        if tier >= UpgradeTier::LOCKING && other > UpgradeTier::LOCKING.get() {
            return Err(UpgradeError::AlreadyLocked);
        }
        Ok(tier)
    }

    /// Applies the stat deltas of a freshly bought tier.
    pub(crate) fn apply_upgrade(&mut self, path: UpgradePath, tier: UpgradeTier, price: u32) {
        let effect = self.kind.upgrade_effect(path, tier);
        self.radius_tiles += effect.radius_tiles;
        self.damage += effect.damage;
        self.pierce += effect.pierce;
        self.attack_interval = (self.attack_interval + effect.attack_interval).max(0.0);
        self.strong_bonus += effect.strong_bonus;
        self.charge_rate += effect.charge_rate;
        self.payout_amount += effect.payout_amount;
        self.payouts_per_round += effect.payouts_per_round;
        match effect.unlock {
            Some(Unlock::MultiShot) => self.multi_shot = true,
            Some(Unlock::SecondBeam) => self.second_beam = true,
            None => {}
        }
        self.upgrades[path.index()] += 1;
        self.money_spent = self.money_spent.saturating_add(price);
    }

    /// Time units between two payouts of a round lasting `round_duration`.
    pub(crate) fn payout_interval(&self, round_duration: f32) -> f32 {
        round_duration / self.payouts_per_round.max(1) as f32
    }

    /// Starts a payout schedule for `round` if the tower is a mine.
    pub(crate) fn schedule_payouts(&mut self, round: RoundNumber, round_duration: f32) {
        if self.kind != TowerKind::Mine || self.payouts.iter().any(|t| t.round == round) {
            return;
        }
        self.payouts.push(PayoutTracker {
            round,
            round_duration,
            countdown: self.payout_interval(round_duration),
            paid: 0,
        });
    }

    /// Money returned when the tower is sold.
    pub(crate) fn refund(&self) -> u32 {
        self.money_spent / 2
    }

    pub(crate) fn snapshot(&self, tile_length: f32) -> TowerSnapshot {
        TowerSnapshot {
            id: self.id,
            kind: self.kind,
            region: self.region,
            center: self.center,
            radius: self.radius(tile_length),
            targeting: self.targeting,
            sees_disguise: self.sees_disguise,
            second_beam: self.second_beam,
            upgrades: self.upgrades,
            money_spent: self.money_spent,
            damage_dealt: self.damage_dealt,
        }
    }
}

/// Registry that stores towers and manages identifier allocation.
#[derive(Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, TowerState>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Identifies the tower whose footprint covers `cell`.
    pub(crate) fn tower_at(&self, cell: CellCoord) -> Option<TowerId> {
        self.entries
            .values()
            .find(|tower| tower.region.contains(cell))
            .map(|tower| tower.id)
    }

    /// Reports whether any tile of `region` is already covered by a tower.
    pub(crate) fn overlaps(&self, region: &CellRect) -> bool {
        region.cells().any(|cell| self.tower_at(cell).is_some())
    }

    /// Stores a new tower built from the kind's static stats.
    pub(crate) fn insert(
        &mut self,
        kind: TowerKind,
        origin: CellCoord,
        tile_length: f32,
    ) -> &mut TowerState {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().wrapping_add(1));
        self.entries
            .entry(id)
            .or_insert_with(|| TowerState::new(id, kind, origin, tile_length))
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<TowerState> {
        self.entries.remove(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut TowerState> {
        self.entries.get_mut(&id)
    }

    /// Towers in identifier order.
    pub(crate) fn iter(&self) -> impl Iterator<Item = &TowerState> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut TowerState> {
        self.entries.values_mut()
    }
}

/// Reports the footprint size associated with a tower kind.
pub(crate) fn footprint_for(kind: TowerKind) -> CellRectSize {
    let side = kind.stats().footprint;
    CellRectSize::new(side, side)
}
