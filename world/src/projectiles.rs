//! Projectile population: flight, decay and collision resolution.

use team_defence_core::{
    squares_overlap, EnemyId, EnemyTier, Event, ProjectileBehaviour, ProjectileId, TowerId, Vec2,
    PROJECTILE_SPEED,
};

use crate::{enemies::EnemyPopulation, map::Playfield};

/// Spin applied to spinning projectiles per time unit, in radians.
const SPIN_RATE: f32 = 0.5;
/// Ticks between two speed reductions of a decaying projectile.
const DECAY_PERIOD: u32 = 15;
/// Speed removed by each reduction.
const DECAY_STEP: f32 = 0.001;

/// Everything a tower decides about a projectile when firing it.
///
/// Owner stats are captured at fire time so later upgrades or a sale do not
/// change projectiles already in flight.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Launch {
    pub(crate) owner: TowerId,
    pub(crate) behaviour: ProjectileBehaviour,
    pub(crate) origin: Vec2,
    pub(crate) heading: Vec2,
    pub(crate) damage: i32,
    pub(crate) strong_bonus: i32,
    pub(crate) pierce: u32,
    pub(crate) sees_disguise: bool,
}

#[derive(Clone, Debug)]
pub(crate) struct Projectile {
    pub(crate) id: ProjectileId,
    pub(crate) launch: Launch,
    pub(crate) position: Vec2,
    pub(crate) rotation: f32,
    speed: f32,
    age: u32,
    hit: Vec<EnemyId>,
    expired: bool,
}

impl Projectile {
    fn outside(&self, playfield: &Playfield) -> bool {
        let half = self.launch.behaviour.extent() / 2.0;
        let Vec2 { x, y } = self.position;
        x - half > playfield.width()
            || x + half < 0.0
            || y - half > playfield.height()
            || y + half < 0.0
    }
}

/// Damage a projectile dealt on behalf of its owner, applied after the pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Attribution {
    pub(crate) tower: TowerId,
    pub(crate) damage: i64,
}

#[derive(Debug, Default)]
pub(crate) struct ProjectilePopulation {
    projectiles: Vec<Projectile>,
    next_id: u32,
}

impl ProjectilePopulation {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn launch(&mut self, launch: Launch, out_events: &mut Vec<Event>) {
        let id = ProjectileId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.projectiles.push(Projectile {
            id,
            launch,
            position: launch.origin,
            rotation: 0.0,
            speed: PROJECTILE_SPEED,
            age: 0,
            hit: Vec::with_capacity(launch.pierce as usize),
            expired: false,
        });
        out_events.push(Event::ProjectileFired {
            projectile: id,
            tower: launch.owner,
        });
    }

    /// Ages, moves and collides every projectile once.
    pub(crate) fn advance(
        &mut self,
        dt: f32,
        playfield: &Playfield,
        enemies: &mut EnemyPopulation,
        attributions: &mut Vec<Attribution>,
        out_events: &mut Vec<Event>,
    ) {
        for projectile in &mut self.projectiles {
            projectile.age += 1;
            match projectile.launch.behaviour {
                ProjectileBehaviour::Spinning => projectile.rotation += SPIN_RATE * dt,
                ProjectileBehaviour::Decaying => {
                    if projectile.age % DECAY_PERIOD == 0 {
                        projectile.speed = (projectile.speed - DECAY_STEP).max(0.0);
                    }
                    if projectile.speed <= 0.0 {
                        projectile.expired = true;
                    }
                }
            }
            if !projectile.expired && projectile.outside(playfield) {
                projectile.expired = true;
            }
            if projectile.expired {
                out_events.push(Event::ProjectileExpired {
                    projectile: projectile.id,
                });
                continue;
            }

            projectile.position += projectile.launch.heading * projectile.speed * dt;
            if collide(projectile, enemies, attributions, out_events) {
                projectile.expired = true;
                out_events.push(Event::ProjectileExpired {
                    projectile: projectile.id,
                });
            }
        }
        self.projectiles.retain(|projectile| !projectile.expired);
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }
}

/// Resolves the first overlapping enemy not hit before, returning `true`
/// when the projectile exhausted its pierce.
fn collide(
    projectile: &mut Projectile,
    enemies: &mut EnemyPopulation,
    attributions: &mut Vec<Attribution>,
    out_events: &mut Vec<Event>,
) -> bool {
    let launch = projectile.launch;
    let extent = launch.behaviour.extent();
    let Some(enemy) = enemies.iter_mut().find(|enemy| {
        enemy.is_alive()
            && !projectile.hit.contains(&enemy.id)
            && squares_overlap(projectile.position, extent, enemy.position, enemy.extent)
    }) else {
        return false;
    };

    if enemy.disguised {
        // A disguised enemy absorbs the hit; only vision strips the disguise.
        if launch.sees_disguise && enemy.unmask() {
            out_events.push(Event::EnemyUnmasked { enemy: enemy.id });
        }
        return false;
    }

    enemy.health -= launch.damage;
    if enemy.tier == EnemyTier::StrongAndFast {
        enemy.health -= launch.strong_bonus;
    }
    attributions.push(Attribution {
        tower: launch.owner,
        damage: i64::from(launch.damage),
    });

    if projectile.hit.len() + 1 >= launch.pierce as usize {
        return true;
    }
    projectile.hit.push(enemy.id);
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use team_defence_core::{EnemyKind, Lane, MapDefinition, PathRule, RoundNumber};

    fn playfield() -> Playfield {
        Playfield::new(
            MapDefinition {
                columns: 10,
                rows: 10,
                lanes: vec![Lane {
                    waypoints: vec![Vec2::new(0.0, 160.0), Vec2::new(320.0, 160.0)],
                }],
                blocked: Vec::new(),
                path_rule: PathRule::AllLanes,
            },
            32.0,
        )
        .expect("playfield")
    }

    fn launch(pierce: u32, sees_disguise: bool) -> Launch {
        Launch {
            owner: TowerId::new(3),
            behaviour: ProjectileBehaviour::Spinning,
            origin: Vec2::new(0.0, 160.0),
            heading: Vec2::new(1.0, 0.0),
            damage: 2,
            strong_bonus: 0,
            pierce,
            sees_disguise,
        }
    }

    fn spawn(enemies: &mut EnemyPopulation, playfield: &Playfield, kind: EnemyKind) -> EnemyId {
        let mut events = Vec::new();
        enemies.spawn(kind, RoundNumber::new(1), playfield, &mut events);
        match events.as_slice() {
            [Event::EnemySpawned { enemy, .. }] => *enemy,
            other => panic!("unexpected events: {other:?}"),
        }
    }

    #[test]
    fn pierce_bounds_the_number_of_enemies_damaged() {
        let playfield = playfield();
        let mut enemies = EnemyPopulation::new();
        let ids: Vec<EnemyId> = (0..3)
            .map(|_| spawn(&mut enemies, &playfield, EnemyKind::Veteran))
            .collect();
        let mut projectiles = ProjectilePopulation::new();
        let mut events = Vec::new();
        projectiles.launch(launch(2, false), &mut events);

        let mut attributions = Vec::new();
        for _ in 0..5 {
            projectiles.advance(1.0, &playfield, &mut enemies, &mut attributions, &mut events);
        }

        let damaged = ids
            .iter()
            .filter(|id| enemies.get(**id).expect("enemy").health < 20)
            .count();
        assert_eq!(damaged, 2);
        assert_eq!(attributions.len(), 2);
        assert_eq!(projectiles.iter().count(), 0);
    }

    #[test]
    fn strong_and_fast_enemies_take_the_bonus_unattributed() {
        let playfield = playfield();
        let mut enemies = EnemyPopulation::new();
        let shellback = spawn(&mut enemies, &playfield, EnemyKind::Shellback);
        let mut projectiles = ProjectilePopulation::new();
        let mut events = Vec::new();
        projectiles.launch(
            Launch {
                strong_bonus: 5,
                ..launch(1, false)
            },
            &mut events,
        );

        let mut attributions = Vec::new();
        projectiles.advance(1.0, &playfield, &mut enemies, &mut attributions, &mut events);

        assert_eq!(enemies.get(shellback).expect("shellback").health, 40 - 2 - 5);
        assert_eq!(
            attributions,
            vec![Attribution {
                tower: TowerId::new(3),
                damage: 2,
            }]
        );
    }

    #[test]
    fn disguised_enemy_blocks_projectile_without_vision() {
        let playfield = playfield();
        let mut enemies = EnemyPopulation::new();
        let shade = spawn(&mut enemies, &playfield, EnemyKind::Shade);
        let scout = spawn(&mut enemies, &playfield, EnemyKind::Scout);
        let mut projectiles = ProjectilePopulation::new();
        let mut events = Vec::new();
        projectiles.launch(launch(3, false), &mut events);

        let mut attributions = Vec::new();
        projectiles.advance(1.0, &playfield, &mut enemies, &mut attributions, &mut events);

        let shade = enemies.get(shade).expect("shade");
        assert!(shade.disguised);
        assert_eq!(shade.health, 16);
        assert_eq!(enemies.get(scout).expect("scout").health, 6);
        assert!(attributions.is_empty());
    }

    #[test]
    fn vision_unmasks_without_damage_or_pierce() {
        let playfield = playfield();
        let mut enemies = EnemyPopulation::new();
        let shade = spawn(&mut enemies, &playfield, EnemyKind::Shade);
        let mut projectiles = ProjectilePopulation::new();
        let mut events = Vec::new();
        projectiles.launch(launch(1, true), &mut events);

        let mut attributions = Vec::new();
        projectiles.advance(1.0, &playfield, &mut enemies, &mut attributions, &mut events);
        let revealed = enemies.get(shade).expect("shade");
        assert!(!revealed.disguised);
        assert_eq!(revealed.health, 16);
        assert!(events.contains(&Event::EnemyUnmasked { enemy: shade }));
        assert_eq!(projectiles.iter().count(), 1, "pierce untouched");

        projectiles.advance(1.0, &playfield, &mut enemies, &mut attributions, &mut events);
        assert_eq!(enemies.get(shade).expect("shade").health, 14);
        assert_eq!(projectiles.iter().count(), 0);
    }

    #[test]
    fn decaying_projectiles_burn_out() {
        let playfield = playfield();
        let mut enemies = EnemyPopulation::new();
        let mut projectiles = ProjectilePopulation::new();
        let mut events = Vec::new();
        projectiles.launch(
            Launch {
                behaviour: ProjectileBehaviour::Decaying,
                heading: Vec2::ZERO,
                origin: Vec2::new(160.0, 32.0),
                ..launch(5, false)
            },
            &mut events,
        );

        let mut attributions = Vec::new();
        let mut ticks = 0;
        while projectiles.iter().count() > 0 && ticks < 10_000 {
            projectiles.advance(1.0, &playfield, &mut enemies, &mut attributions, &mut events);
            ticks += 1;
        }
        assert!(ticks <= 100 * DECAY_PERIOD as usize + DECAY_PERIOD as usize);
        assert!(ticks >= 99 * DECAY_PERIOD as usize);
    }

    #[test]
    fn projectiles_leaving_the_playfield_expire() {
        let playfield = playfield();
        let mut enemies = EnemyPopulation::new();
        let mut projectiles = ProjectilePopulation::new();
        let mut events = Vec::new();
        projectiles.launch(
            Launch {
                origin: Vec2::new(330.0, 32.0),
                ..launch(1, false)
            },
            &mut events,
        );
        let mut attributions = Vec::new();
        projectiles.advance(100.0, &playfield, &mut enemies, &mut attributions, &mut events);
        projectiles.advance(100.0, &playfield, &mut enemies, &mut attributions, &mut events);
        assert_eq!(projectiles.iter().count(), 0);
    }
}
