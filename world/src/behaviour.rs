//! Per-kind tower fire behaviour.
//!
//! Each tower kind has one [`TowerBehaviour`] implementation. The world hands
//! it the targets chosen for the tower this tick together with an
//! [`Engagement`] giving mutable access to everything a tower may touch.

use team_defence_core::{
    stats::MULTI_SHOT_SPREAD, BeamSlot, EnemyTier, Event, TowerKind, TowerTarget, Vec2,
};

use crate::{
    enemies::EnemyPopulation,
    ledger::Ledger,
    projectiles::{Launch, ProjectilePopulation},
    towers::{AttackSlot, TowerState},
};

/// Mutable state reachable by a tower while it engages.
pub(crate) struct Engagement<'a> {
    pub(crate) dt: f32,
    pub(crate) muzzle_offset: f32,
    pub(crate) enemies: &'a mut EnemyPopulation,
    pub(crate) projectiles: &'a mut ProjectilePopulation,
    pub(crate) ledger: &'a mut Ledger,
    pub(crate) out_events: &'a mut Vec<Event>,
}

impl Engagement<'_> {
    /// Drops targets that no longer reference a living enemy.
    fn live(&self, target: Option<TowerTarget>) -> Option<TowerTarget> {
        target.filter(|target| {
            self.enemies
                .get(target.enemy)
                .is_some_and(|enemy| enemy.is_alive())
        })
    }
}

/// Fire behaviour of one tower kind.
pub(crate) trait TowerBehaviour {
    /// Acts on the targets selected for each slot, indexed by [`BeamSlot`].
    fn engage(
        &self,
        tower: &mut TowerState,
        targets: [Option<TowerTarget>; 2],
        engagement: &mut Engagement<'_>,
    );
}

/// Resolves the behaviour implementing `kind`.
pub(crate) fn behaviour_for(kind: TowerKind) -> &'static dyn TowerBehaviour {
    match kind {
        TowerKind::Dwarf => &AxeThrower,
        TowerKind::FlameThrower => &FlameProjector,
        TowerKind::Inferno => &InfernoBeams,
        TowerKind::Mine => &GoldMine,
    }
}

/// Attack cooldown rule shared by every launcher and beam.
///
/// A slot attacks once its cooldown went negative while it has a target;
/// otherwise the cooldown keeps running down.
fn ready(slot: &mut AttackSlot, interval: f32, firing: bool, dt: f32) -> bool {
    if slot.cooldown < 0.0 && firing {
        slot.cooldown = interval;
        true
    } else {
        slot.cooldown -= dt;
        false
    }
}

/// Points the primary slot at its target and launches projectiles when ready.
fn launch_volley(
    tower: &mut TowerState,
    target: Option<TowerTarget>,
    engagement: &mut Engagement<'_>,
) {
    let slot = &mut tower.slots[BeamSlot::Primary.index()];
    match target {
        Some(target) => {
            slot.target = Some(target.enemy);
            slot.aim = target.aim;
        }
        None => slot.clear(),
    }
    if !ready(slot, tower.attack_interval, target.is_some(), engagement.dt) {
        return;
    }
    let Some(behaviour) = tower.kind.stats().projectile else {
        return;
    };

    let aim = (slot.aim - tower.center).normalize_or_zero();
    let aim = if aim == Vec2::ZERO { Vec2::X } else { aim };
    let headings = if tower.multi_shot {
        vec![
            Vec2::from_angle(MULTI_SHOT_SPREAD).rotate(aim),
            Vec2::from_angle(-MULTI_SHOT_SPREAD).rotate(aim),
        ]
    } else {
        vec![aim]
    };

    for heading in headings {
        engagement.projectiles.launch(
            Launch {
                owner: tower.id,
                behaviour,
                origin: tower.center + heading * engagement.muzzle_offset,
                heading,
                damage: tower.damage,
                strong_bonus: tower.strong_bonus,
                pierce: tower.pierce,
                sees_disguise: tower.sees_disguise,
            },
            engagement.out_events,
        );
    }
}

/// Dwarf: throws spinning axes, two at a time once multi-shot is owned.
struct AxeThrower;

impl TowerBehaviour for AxeThrower {
    fn engage(
        &self,
        tower: &mut TowerState,
        targets: [Option<TowerTarget>; 2],
        engagement: &mut Engagement<'_>,
    ) {
        let target = engagement.live(targets[BeamSlot::Primary.index()]);
        launch_volley(tower, target, engagement);
    }
}

/// Flame thrower: sprays decaying flames with high pierce.
struct FlameProjector;

impl TowerBehaviour for FlameProjector {
    fn engage(
        &self,
        tower: &mut TowerState,
        targets: [Option<TowerTarget>; 2],
        engagement: &mut Engagement<'_>,
    ) {
        let target = engagement.live(targets[BeamSlot::Primary.index()]);
        launch_volley(tower, target, engagement);
    }
}

/// Inferno: one or two direct-damage beams that charge up on a persistent target.
struct InfernoBeams;

impl InfernoBeams {
    fn fire_beam(
        tower: &mut TowerState,
        beam: BeamSlot,
        target: Option<TowerTarget>,
        engagement: &mut Engagement<'_>,
    ) {
        let interval = tower.attack_interval;
        let charge_rate = tower.charge_rate;
        let slot = &mut tower.slots[beam.index()];

        let Some(target) = target else {
            slot.clear();
            let _ = ready(slot, interval, false, engagement.dt);
            return;
        };
        slot.aim = target.aim;
        if !ready(slot, interval, true, engagement.dt) {
            if slot.target != Some(target.enemy) {
                slot.clear();
            }
            return;
        }

        if slot.target == Some(target.enemy) {
            slot.charge += charge_rate;
        } else {
            slot.target = Some(target.enemy);
            slot.charge = 1;
        }
        let charge = slot.charge;

        let Some(enemy) = engagement.enemies.get_mut(target.enemy) else {
            slot.clear();
            return;
        };
        let charge_damage = i32::try_from(charge).unwrap_or(i32::MAX);
        enemy.health -= charge_damage;
        if enemy.tier == EnemyTier::StrongAndFast {
            enemy.health -= charge_damage / 3;
        }
        tower.damage_dealt += i64::from(charge);
        engagement.out_events.push(Event::BeamFired {
            tower: tower.id,
            beam,
            enemy: target.enemy,
            charge,
        });
    }
}

impl TowerBehaviour for InfernoBeams {
    fn engage(
        &self,
        tower: &mut TowerState,
        targets: [Option<TowerTarget>; 2],
        engagement: &mut Engagement<'_>,
    ) {
        let primary = engagement.live(targets[BeamSlot::Primary.index()]);
        Self::fire_beam(tower, BeamSlot::Primary, primary, engagement);

        let secondary = if tower.second_beam {
            engagement
                .live(targets[BeamSlot::Secondary.index()])
                .filter(|second| primary.map_or(true, |first| first.enemy != second.enemy))
        } else {
            None
        };
        Self::fire_beam(tower, BeamSlot::Secondary, secondary, engagement);
    }
}

/// Mine: pays a fixed amount a fixed number of times per active round.
struct GoldMine;

impl TowerBehaviour for GoldMine {
    fn engage(
        &self,
        tower: &mut TowerState,
        _targets: [Option<TowerTarget>; 2],
        engagement: &mut Engagement<'_>,
    ) {
        let amount = tower.payout_amount;
        let per_round = tower.payouts_per_round;
        let mut trackers = std::mem::take(&mut tower.payouts);
        trackers.retain_mut(|tracker| {
            if tracker.countdown >= 0.0 {
                tracker.countdown -= engagement.dt;
                return true;
            }
            if tracker.paid >= per_round {
                return false;
            }
            tracker.countdown = tracker.round_duration / per_round.max(1) as f32;
            tracker.paid += 1;
            engagement.ledger.credit(amount);
            tower.damage_dealt += amount;
            engagement.out_events.push(Event::PayoutCredited {
                tower: tower.id,
                round: tracker.round,
                amount,
            });
            true
        });
        tower.payouts = trackers;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{map::Playfield, towers::TowerRegistry};
    use team_defence_core::{
        CellCoord, EnemyId, EnemyKind, Lane, MapDefinition, PathRule, RoundNumber,
    };

    struct Rig {
        playfield: Playfield,
        enemies: EnemyPopulation,
        projectiles: ProjectilePopulation,
        ledger: Ledger,
        towers: TowerRegistry,
        events: Vec<Event>,
    }

    impl Rig {
        fn new() -> Self {
            let playfield = Playfield::new(
                MapDefinition {
                    columns: 10,
                    rows: 10,
                    lanes: vec![Lane {
                        waypoints: vec![Vec2::new(0.0, 16.0), Vec2::new(320.0, 16.0)],
                    }],
                    blocked: Vec::new(),
                    path_rule: PathRule::AllLanes,
                },
                32.0,
            )
            .expect("playfield");
            Self {
                playfield,
                enemies: EnemyPopulation::new(),
                projectiles: ProjectilePopulation::new(),
                ledger: Ledger::new(0, 100),
                towers: TowerRegistry::new(),
                events: Vec::new(),
            }
        }

        fn spawn(&mut self, kind: EnemyKind) -> EnemyId {
            let before = self.events.len();
            self.enemies
                .spawn(kind, RoundNumber::new(1), &self.playfield, &mut self.events);
            match &self.events[before..] {
                [Event::EnemySpawned { enemy, .. }] => *enemy,
                other => panic!("unexpected events: {other:?}"),
            }
        }

        fn engage(&mut self, kind: TowerKind, targets: [Option<TowerTarget>; 2], dt: f32) {
            let tower = self
                .towers
                .iter_mut()
                .find(|tower| tower.kind == kind)
                .expect("tower");
            let mut engagement = Engagement {
                dt,
                muzzle_offset: 16.0,
                enemies: &mut self.enemies,
                projectiles: &mut self.projectiles,
                ledger: &mut self.ledger,
                out_events: &mut self.events,
            };
            behaviour_for(tower.kind).engage(tower, targets, &mut engagement);
        }

        fn beams(&self) -> Vec<(BeamSlot, EnemyId, u32)> {
            self.events
                .iter()
                .filter_map(|event| match event {
                    Event::BeamFired {
                        beam,
                        enemy,
                        charge,
                        ..
                    } => Some((*beam, *enemy, *charge)),
                    _ => None,
                })
                .collect()
        }
    }

    fn target(slot: BeamSlot, enemy: EnemyId) -> TowerTarget {
        TowerTarget {
            tower: team_defence_core::TowerId::new(0),
            beam: slot,
            enemy,
            aim: Vec2::new(0.0, 16.0),
        }
    }

    #[test]
    fn beam_charge_grows_on_a_persistent_target_and_resets_on_change() {
        let mut rig = Rig::new();
        let _ = rig
            .towers
            .insert(TowerKind::Inferno, CellCoord::new(1, 2), 32.0);
        let first = rig.spawn(EnemyKind::Colossus);
        let second = rig.spawn(EnemyKind::Colossus);

        for _ in 0..4 {
            rig.engage(
                TowerKind::Inferno,
                [Some(target(BeamSlot::Primary, first)), None],
                1001.0,
            );
        }
        for _ in 0..2 {
            rig.engage(
                TowerKind::Inferno,
                [Some(target(BeamSlot::Primary, second)), None],
                1001.0,
            );
        }

        assert_eq!(
            rig.beams(),
            vec![
                (BeamSlot::Primary, first, 1),
                (BeamSlot::Primary, first, 2),
                (BeamSlot::Primary, second, 1),
            ]
        );
        assert_eq!(rig.enemies.get(first).expect("first").health, 247);
    }

    #[test]
    fn beams_burn_strong_and_fast_enemies_for_a_third_more() {
        let mut rig = Rig::new();
        let tower = rig
            .towers
            .insert(TowerKind::Inferno, CellCoord::new(1, 2), 32.0);
        tower.charge_rate = 3;
        let shellback = rig.spawn(EnemyKind::Shellback);

        for _ in 0..6 {
            rig.engage(
                TowerKind::Inferno,
                [Some(target(BeamSlot::Primary, shellback)), None],
                1001.0,
            );
        }

        let charges: Vec<u32> = rig.beams().iter().map(|&(_, _, charge)| charge).collect();
        assert_eq!(charges, vec![1, 4, 7]);
        // Each hit deals charge + charge / 3: 1 + 5 + 9.
        assert_eq!(rig.enemies.get(shellback).expect("shellback").health, 40 - 15);
        let inferno = rig.towers.iter().next().expect("inferno");
        assert_eq!(inferno.damage_dealt, 12);
    }

    #[test]
    fn second_beam_is_suppressed_on_the_primary_target() {
        let mut rig = Rig::new();
        let tower = rig
            .towers
            .insert(TowerKind::Inferno, CellCoord::new(1, 2), 32.0);
        tower.second_beam = true;
        let enemy = rig.spawn(EnemyKind::Colossus);

        for _ in 0..2 {
            rig.engage(
                TowerKind::Inferno,
                [
                    Some(target(BeamSlot::Primary, enemy)),
                    Some(target(BeamSlot::Secondary, enemy)),
                ],
                10.0,
            );
        }

        assert_eq!(rig.beams(), vec![(BeamSlot::Primary, enemy, 1)]);
    }

    #[test]
    fn multi_shot_launches_two_projectiles() {
        let mut rig = Rig::new();
        let tower = rig.towers.insert(TowerKind::Dwarf, CellCoord::new(1, 2), 32.0);
        tower.multi_shot = true;
        let enemy = rig.spawn(EnemyKind::Scout);

        for _ in 0..2 {
            rig.engage(
                TowerKind::Dwarf,
                [Some(target(BeamSlot::Primary, enemy)), None],
                10.0,
            );
        }

        let fired = rig
            .events
            .iter()
            .filter(|event| matches!(event, Event::ProjectileFired { .. }))
            .count();
        assert_eq!(fired, 2);
        assert_eq!(rig.projectiles.iter().count(), 2);
    }

    #[test]
    fn stale_targets_are_never_fired_upon() {
        let mut rig = Rig::new();
        let _ = rig.towers.insert(TowerKind::Dwarf, CellCoord::new(1, 2), 32.0);
        let enemy = rig.spawn(EnemyKind::Scout);
        rig.enemies.get_mut(enemy).expect("scout").health = 0;

        for _ in 0..3 {
            rig.engage(
                TowerKind::Dwarf,
                [Some(target(BeamSlot::Primary, enemy)), None],
                10.0,
            );
        }
        assert_eq!(rig.projectiles.iter().count(), 0);
    }

    #[test]
    fn mine_pays_out_on_its_round_schedule() {
        let mut rig = Rig::new();
        let mine = rig.towers.insert(TowerKind::Mine, CellCoord::new(4, 4), 32.0);
        mine.schedule_payouts(RoundNumber::new(1), 1000.0);

        for _ in 0..200 {
            rig.engage(TowerKind::Mine, [None, None], 10.0);
        }

        assert_eq!(rig.ledger.money(), 40);
        let mine = rig.towers.iter().next().expect("mine");
        assert!(mine.payouts.is_empty());
        assert_eq!(mine.damage_dealt, 40);
    }
}
