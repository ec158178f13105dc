#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that computes deterministic tower targets from world snapshots.
//!
//! Enemies arrive in population order (most advanced first). A tower may
//! attack an enemy that is strictly inside its radius and either undisguised
//! or visible to the tower. Among those candidates:
//!
//! * `First` picks the earliest in population order,
//! * `Last` picks the latest,
//! * `Strong` picks the highest strength, the earliest winning ties.
//!
//! Towers with a second beam aim it using the first mode in cycling order
//! that differs from their own, and drop it when both beams would share an
//! enemy.

use team_defence_core::{
    BeamSlot, EnemySnapshot, EnemyView, TargetingMode, TowerSnapshot, TowerTarget, TowerView,
};

/// Tower targeting system that reuses scratch buffers to avoid repeated allocations.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    candidates: Vec<EnemySnapshot>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes tower targets for the provided world snapshot.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments. Towers without an attackable enemy receive no entry.
    pub fn handle(&mut self, towers: &TowerView, enemies: &EnemyView, out: &mut Vec<TowerTarget>) {
        out.clear();
        if enemies.is_empty() {
            return;
        }

        for tower in towers.iter() {
            if !tower.kind.acquires_targets() {
                continue;
            }
            self.gather_candidates(tower, enemies);
            if self.candidates.is_empty() {
                continue;
            }

            let primary = select(tower.targeting, &self.candidates);
            if let Some(enemy) = primary {
                out.push(assignment(tower, BeamSlot::Primary, enemy));
            }

            if tower.second_beam {
                let secondary = select(tower.targeting.alternate(), &self.candidates)
                    .filter(|second| primary.map_or(true, |first| first.id != second.id));
                if let Some(enemy) = secondary {
                    out.push(assignment(tower, BeamSlot::Secondary, enemy));
                }
            }
        }
    }

    fn gather_candidates(&mut self, tower: &TowerSnapshot, enemies: &EnemyView) {
        self.candidates.clear();
        self.candidates.extend(
            enemies
                .iter()
                .filter(|enemy| is_attackable(tower, enemy))
                .copied(),
        );
    }
}

/// Reports whether `tower` may attack `enemy` this tick.
#[must_use]
pub fn is_attackable(tower: &TowerSnapshot, enemy: &EnemySnapshot) -> bool {
    enemy.health > 0
        && tower.center.distance(enemy.position) < tower.radius
        && (!enemy.disguised || tower.sees_disguise)
}

/// Picks the enemy `mode` prefers among candidates given in population order.
#[must_use]
pub fn select(mode: TargetingMode, candidates: &[EnemySnapshot]) -> Option<&EnemySnapshot> {
    match mode {
        TargetingMode::First => candidates.first(),
        TargetingMode::Last => candidates.last(),
        TargetingMode::Strong => candidates.iter().fold(None, |best, enemy| match best {
            Some(current) if current.strength >= enemy.strength => Some(current),
            _ => Some(enemy),
        }),
    }
}

fn assignment(tower: &TowerSnapshot, beam: BeamSlot, enemy: &EnemySnapshot) -> TowerTarget {
    TowerTarget {
        tower: tower.id,
        beam,
        enemy: enemy.id,
        aim: enemy.position,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use team_defence_core::{
        CellCoord, CellRect, CellRectSize, EnemyId, EnemyKind, LaneId, RoundNumber, TowerId,
        TowerKind, Vec2,
    };

    fn tower(kind: TowerKind, targeting: TargetingMode) -> TowerSnapshot {
        TowerSnapshot {
            id: TowerId::new(1),
            kind,
            region: CellRect::from_origin_and_size(CellCoord::new(0, 0), CellRectSize::new(1, 1)),
            center: Vec2::new(16.0, 16.0),
            radius: 80.0,
            targeting,
            sees_disguise: false,
            second_beam: false,
            upgrades: [0, 0],
            money_spent: kind.stats().price,
            damage_dealt: 0,
        }
    }

    fn enemy(id: u32, x: f32, strength: u32) -> EnemySnapshot {
        let kind = EnemyKind::Scout;
        EnemySnapshot {
            id: EnemyId::new(id),
            kind,
            tier: kind.stats().tier,
            position: Vec2::new(x, 16.0),
            heading: Vec2::X,
            health: 6,
            strength,
            disguised: false,
            progress: 0.0,
            lane: LaneId::new(0),
            round: RoundNumber::new(1),
        }
    }

    fn run(tower: TowerSnapshot, enemies: Vec<EnemySnapshot>) -> Vec<TowerTarget> {
        let mut targeting = TowerTargeting::new();
        let mut out = Vec::new();
        targeting.handle(
            &TowerView::from_snapshots(vec![tower]),
            &EnemyView::from_snapshots(enemies),
            &mut out,
        );
        out
    }

    fn picked(targets: &[TowerTarget]) -> Vec<(BeamSlot, u32)> {
        targets
            .iter()
            .map(|target| (target.beam, target.enemy.get()))
            .collect()
    }

    #[test]
    fn first_and_last_follow_population_order() {
        let enemies = vec![enemy(7, 40.0, 0), enemy(3, 30.0, 0), enemy(9, 20.0, 0)];
        let first = run(tower(TowerKind::Dwarf, TargetingMode::First), enemies.clone());
        let last = run(tower(TowerKind::Dwarf, TargetingMode::Last), enemies);
        assert_eq!(picked(&first), vec![(BeamSlot::Primary, 7)]);
        assert_eq!(picked(&last), vec![(BeamSlot::Primary, 9)]);
    }

    #[test]
    fn strong_prefers_earliest_among_equals() {
        let enemies = vec![enemy(1, 40.0, 2), enemy(2, 30.0, 5), enemy(3, 20.0, 5)];
        let strong = run(tower(TowerKind::Dwarf, TargetingMode::Strong), enemies);
        assert_eq!(picked(&strong), vec![(BeamSlot::Primary, 2)]);
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let on_edge = run(
            tower(TowerKind::Dwarf, TargetingMode::First),
            vec![enemy(1, 96.0, 0)],
        );
        assert!(on_edge.is_empty());
        let inside = run(
            tower(TowerKind::Dwarf, TargetingMode::First),
            vec![enemy(1, 95.9, 0)],
        );
        assert_eq!(picked(&inside), vec![(BeamSlot::Primary, 1)]);
    }

    #[test]
    fn disguised_enemies_need_vision() {
        let mut shade = enemy(4, 30.0, 4);
        shade.disguised = true;
        let blind = run(tower(TowerKind::Inferno, TargetingMode::First), vec![shade]);
        assert!(blind.is_empty());

        let mut seer = tower(TowerKind::Dwarf, TargetingMode::First);
        seer.sees_disguise = true;
        assert_eq!(picked(&run(seer, vec![shade])), vec![(BeamSlot::Primary, 4)]);
    }

    #[test]
    fn mines_never_acquire_targets() {
        let targets = run(
            tower(TowerKind::Mine, TargetingMode::First),
            vec![enemy(1, 20.0, 0)],
        );
        assert!(targets.is_empty());
    }

    #[test]
    fn second_beam_uses_a_different_mode() {
        let mut inferno = tower(TowerKind::Inferno, TargetingMode::Strong);
        inferno.second_beam = true;
        let enemies = vec![enemy(1, 40.0, 0), enemy(2, 30.0, 9), enemy(3, 20.0, 0)];
        assert_eq!(
            picked(&run(inferno, enemies)),
            vec![(BeamSlot::Primary, 2), (BeamSlot::Secondary, 1)]
        );
    }

    #[test]
    fn second_beam_is_dropped_when_it_would_share_the_target() {
        let mut inferno = tower(TowerKind::Inferno, TargetingMode::First);
        inferno.second_beam = true;
        assert_eq!(
            picked(&run(inferno, vec![enemy(5, 30.0, 0)])),
            vec![(BeamSlot::Primary, 5)]
        );
    }
}
