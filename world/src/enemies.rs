//! Enemy population: spawning, movement along lanes, deaths and leaks.

use team_defence_core::{
    EnemyId, EnemyKind, EnemySnapshot, EnemyTier, Event, Lane, LaneId, RoundNumber, Vec2,
};
use tracing::{debug, info};

use crate::{ledger::Ledger, map::Playfield};

/// Distance on both axes below which an enemy counts as standing on a waypoint.
const ARRIVAL_TOLERANCE: f32 = 1.0;

#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) id: EnemyId,
    pub(crate) kind: EnemyKind,
    pub(crate) tier: EnemyTier,
    pub(crate) health: i32,
    pub(crate) strength: u32,
    pub(crate) value: u32,
    pub(crate) speed: f32,
    pub(crate) disguised: bool,
    pub(crate) extent: f32,
    pub(crate) lane: LaneId,
    pub(crate) round: RoundNumber,
    pub(crate) position: Vec2,
    pub(crate) heading: Vec2,
    path_index: usize,
    travelled: f32,
    pub(crate) progress: f32,
    /// Time units left before the enemy starts walking.
    hold: f32,
    removed: bool,
}

impl Enemy {
    /// Reports whether the enemy can still be targeted or hit.
    pub(crate) fn is_alive(&self) -> bool {
        !self.removed && self.health > 0
    }

    /// Clears the disguise and switches to the revealed speed.
    ///
    /// Returns `true` when the call changed anything.
    pub(crate) fn unmask(&mut self) -> bool {
        if !self.disguised {
            return false;
        }
        self.disguised = false;
        if let Some(speed) = self.kind.stats().revealed_speed {
            self.speed = speed;
        }
        true
    }

    pub(crate) fn snapshot(&self) -> EnemySnapshot {
        EnemySnapshot {
            id: self.id,
            kind: self.kind,
            tier: self.tier,
            position: self.position,
            heading: self.heading,
            health: self.health,
            strength: self.strength,
            disguised: self.disguised,
            progress: self.progress,
            lane: self.lane,
            round: self.round,
        }
    }

    /// Walks `dt` time units along the lane, returning `true` on leaking.
    fn walk(&mut self, lane: &Lane, lane_length: f32, dt: f32) -> bool {
        let mut budget = self.speed * dt;
        let leaked = loop {
            let Some(&target) = lane.waypoints.get(self.path_index) else {
                break true;
            };
            let offset = target - self.position;
            let distance = offset.length();

            if budget < distance {
                self.position += offset / distance * budget;
                self.travelled += budget;
                budget = 0.0;
                let remaining = target - self.position;
                if remaining.x.abs() >= ARRIVAL_TOLERANCE || remaining.y.abs() >= ARRIVAL_TOLERANCE
                {
                    break false;
                }
                self.travelled += remaining.length();
            } else {
                self.travelled += distance;
                budget -= distance;
            }
            self.position = target;

            if self.path_index + 1 >= lane.waypoints.len() {
                break true;
            }
            self.path_index += 1;
            self.heading = (lane.waypoints[self.path_index] - self.position).normalize_or_zero();
            if budget <= 0.0 {
                break false;
            }
        };

        self.progress = if lane_length > 0.0 {
            (self.travelled / lane_length).min(1.0)
        } else {
            1.0
        };
        leaked
    }
}

/// Every enemy on the playfield, kept in descending progress order between ticks.
#[derive(Debug, Default)]
pub(crate) struct EnemyPopulation {
    enemies: Vec<Enemy>,
    next_id: u32,
}

impl EnemyPopulation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&mut self) -> EnemyId {
        let id = EnemyId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        id
    }

    /// Spawns an enemy at the first waypoint of the lane chosen by the map's rule.
    pub(crate) fn spawn(
        &mut self,
        kind: EnemyKind,
        round: RoundNumber,
        playfield: &Playfield,
        out_events: &mut Vec<Event>,
    ) {
        let id = self.allocate_id();
        let lane_id = playfield
            .path_rule()
            .lane_for(id.get(), round, playfield.lane_count());
        let Some(lane) = playfield.lane(lane_id) else {
            return;
        };
        let start = lane.waypoints[0];
        let heading = (lane.waypoints[1] - start).normalize_or_zero();
        let stats = kind.stats();

        self.enemies.push(Enemy {
            id,
            kind,
            tier: stats.tier,
            health: stats.health,
            strength: stats.strength,
            value: stats.value,
            speed: stats.speed,
            disguised: stats.disguised,
            extent: stats.extent,
            lane: lane_id,
            round,
            position: start,
            heading,
            path_index: 1,
            travelled: 0.0,
            progress: 0.0,
            hold: 0.0,
            removed: false,
        });
        out_events.push(Event::EnemySpawned {
            enemy: id,
            kind,
            round,
            lane: lane_id,
        });
    }

    /// Re-establishes descending progress order; ties keep their relative order.
    pub(crate) fn sort_by_progress(&mut self) {
        self.enemies
            .sort_by(|a, b| b.progress.total_cmp(&a.progress));
    }

    /// Moves every enemy that existed when the pass began.
    ///
    /// Enemies at zero health die instead of moving, and children they release
    /// wait for the next pass.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        playfield: &Playfield,
        ledger: &mut Ledger,
        child_stagger: f32,
        out_events: &mut Vec<Event>,
    ) {
        let count = self.enemies.len();
        for index in 0..count {
            let enemy = &mut self.enemies[index];
            if enemy.removed {
                continue;
            }
            if enemy.health <= 0 {
                self.die(index, ledger, child_stagger, out_events);
                continue;
            }
            if enemy.hold > 0.0 {
                enemy.hold -= dt;
                continue;
            }

            let Some(lane) = playfield.lane(enemy.lane) else {
                continue;
            };
            if enemy.walk(lane, playfield.lane_length(enemy.lane), dt) {
                self.leak(index, ledger, out_events);
            }
        }
        self.compact();
    }

    /// Kills every enemy whose health dropped to zero or below.
    pub(crate) fn resolve_deaths(
        &mut self,
        ledger: &mut Ledger,
        child_stagger: f32,
        out_events: &mut Vec<Event>,
    ) {
        let count = self.enemies.len();
        for index in 0..count {
            let enemy = &self.enemies[index];
            if !enemy.removed && enemy.health <= 0 {
                self.die(index, ledger, child_stagger, out_events);
            }
        }
        self.compact();
    }

    fn die(
        &mut self,
        index: usize,
        ledger: &mut Ledger,
        child_stagger: f32,
        out_events: &mut Vec<Event>,
    ) {
        let parent = {
            let enemy = &mut self.enemies[index];
            enemy.removed = true;
            enemy.clone()
        };
        ledger.credit(i64::from(parent.value));
        out_events.push(Event::EnemyKilled {
            enemy: parent.id,
            kind: parent.kind,
            round: parent.round,
            reward: parent.value,
        });

        let Some(children) = parent.kind.stats().children else {
            return;
        };
        debug!(
            parent = parent.id.get(),
            count = children.count,
            kind = ?children.kind,
            "enemy split on death"
        );
        let stats = children.kind.stats();
        for sibling in 0..children.count {
            let id = self.allocate_id();
            self.enemies.push(Enemy {
                id,
                kind: children.kind,
                tier: stats.tier,
                health: stats.health,
                strength: stats.strength,
                value: stats.value,
                speed: stats.speed,
                disguised: stats.disguised,
                extent: stats.extent,
                hold: sibling as f32 * child_stagger,
                removed: false,
                ..parent
            });
            out_events.push(Event::EnemySpawned {
                enemy: id,
                kind: children.kind,
                round: parent.round,
                lane: parent.lane,
            });
        }
    }

    fn leak(&mut self, index: usize, ledger: &mut Ledger, out_events: &mut Vec<Event>) {
        let enemy = &mut self.enemies[index];
        enemy.removed = true;
        info!(enemy = enemy.id.get(), kind = ?enemy.kind, damage = enemy.value, "enemy leaked");
        out_events.push(Event::EnemyLeaked {
            enemy: enemy.id,
            kind: enemy.kind,
            round: enemy.round,
            damage: enemy.value,
        });
        if ledger.take_damage(enemy.value) {
            info!("health depleted");
            out_events.push(Event::HealthDepleted);
        }
    }

    fn compact(&mut self) {
        self.enemies.retain(|enemy| !enemy.removed);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.iter()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Enemy> {
        self.enemies.iter_mut()
    }

    pub(crate) fn get_mut(&mut self, id: EnemyId) -> Option<&mut Enemy> {
        self.enemies.iter_mut().find(|enemy| enemy.id == id)
    }

    pub(crate) fn get(&self, id: EnemyId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.id == id)
    }

    pub(crate) fn len(&self) -> usize {
        self.enemies.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use team_defence_core::{MapDefinition, PathRule};

    fn playfield() -> Playfield {
        Playfield::new(
            MapDefinition {
                columns: 10,
                rows: 4,
                lanes: vec![Lane {
                    waypoints: vec![
                        Vec2::new(0.0, 16.0),
                        Vec2::new(100.0, 16.0),
                        Vec2::new(100.0, 116.0),
                    ],
                }],
                blocked: Vec::new(),
                path_rule: PathRule::AllLanes,
            },
            32.0,
        )
        .expect("playfield")
    }

    fn spawn_one(population: &mut EnemyPopulation, kind: EnemyKind) -> EnemyId {
        let mut events = Vec::new();
        population.spawn(kind, RoundNumber::new(1), &playfield(), &mut events);
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn large_steps_carry_past_waypoints() {
        let playfield = playfield();
        let mut population = EnemyPopulation::new();
        let mut ledger = Ledger::new(0, 10);
        let id = spawn_one(&mut population, EnemyKind::Scout);

        let mut events = Vec::new();
        let dt = 150.0 / EnemyKind::Scout.stats().speed;
        population.advance(dt, &playfield, &mut ledger, 0.0, &mut events);

        let enemy = population.get(id).expect("enemy");
        assert!((enemy.position - Vec2::new(100.0, 66.0)).length() < 1e-2);
        assert!((enemy.progress - 0.75).abs() < 1e-3);
        assert_eq!(enemy.heading, Vec2::new(0.0, 1.0));
    }

    #[test]
    fn reaching_the_last_waypoint_leaks() {
        let playfield = playfield();
        let mut population = EnemyPopulation::new();
        let mut ledger = Ledger::new(0, 10);
        let id = spawn_one(&mut population, EnemyKind::Scout);

        let mut events = Vec::new();
        population.advance(1.0e6, &playfield, &mut ledger, 0.0, &mut events);

        assert_eq!(population.len(), 0);
        assert_eq!(ledger.snapshot().health, 6);
        assert!(events.contains(&Event::EnemyLeaked {
            enemy: id,
            kind: EnemyKind::Scout,
            round: RoundNumber::new(1),
            damage: 4,
        }));
    }

    #[test]
    fn sorting_is_stable_for_equal_progress() {
        let mut population = EnemyPopulation::new();
        let first = spawn_one(&mut population, EnemyKind::Scout);
        let second = spawn_one(&mut population, EnemyKind::Scout);
        let third = spawn_one(&mut population, EnemyKind::Scout);
        population.enemies[2].progress = 0.5;

        population.sort_by_progress();

        let order: Vec<EnemyId> = population.iter().map(|enemy| enemy.id).collect();
        assert_eq!(order, vec![third, first, second]);
    }

    #[test]
    fn unmask_is_idempotent_and_raises_speed() {
        let mut population = EnemyPopulation::new();
        let id = spawn_one(&mut population, EnemyKind::Shade);
        let enemy = population.get_mut(id).expect("shade");
        assert!(enemy.unmask());
        assert!((enemy.speed - 0.025).abs() < f32::EPSILON);
        assert!(!enemy.unmask());

        let scout = spawn_one(&mut population, EnemyKind::Scout);
        assert!(!population.get_mut(scout).expect("scout").unmask());
    }

    #[test]
    fn staggered_children_wait_before_walking() {
        let playfield = playfield();
        let mut population = EnemyPopulation::new();
        let mut ledger = Ledger::new(0, 10);
        let id = spawn_one(&mut population, EnemyKind::Shellback);
        population.get_mut(id).expect("parent").health = 0;

        let mut events = Vec::new();
        population.resolve_deaths(&mut ledger, 400.0, &mut events);
        assert_eq!(ledger.snapshot().money, 4, "only the parent's value is credited");
        assert_eq!(population.len(), 2);
        let start: Vec<Vec2> = population.iter().map(|enemy| enemy.position).collect();
        assert_eq!(start, vec![Vec2::new(0.0, 16.0); 2]);

        population.advance(100.0, &playfield, &mut ledger, 400.0, &mut events);
        let positions: Vec<Vec2> = population.iter().map(|enemy| enemy.position).collect();
        assert!(positions[0].x > 0.0, "first child walks immediately");
        assert_eq!(positions[1], Vec2::new(0.0, 16.0), "second child is held");
    }
}
