use std::{
    collections::hash_map::DefaultHasher,
    hash::{Hash, Hasher},
    time::Duration,
};

use team_defence_core::{
    BeamSlot, CellCoord, Command, EnemyId, EnemyKind, Event, Lane, MapDefinition, PathRule,
    RoundNumber, SimulationConfig, TargetingMode, TowerId, TowerKind, TowerTarget, Vec2,
    WaveCatalog,
};
use team_defence_system_tower_targeting::TowerTargeting;
use team_defence_world::{self as world, query, World};

const STEP: Duration = Duration::from_millis(200);

#[test]
fn deterministic_replay_tracks_first_then_last_enemy() {
    let script = scripted_commands();
    let script_len = script.len();
    let first = replay(script.clone());
    let second = replay(script);

    assert_eq!(first, second, "replay diverged between runs");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(first.assignments.len(), script_len);

    let spawned: Vec<_> = first
        .events
        .iter()
        .filter_map(|event| match event {
            EventRecord::EnemySpawned { enemy } => Some(*enemy),
            _ => None,
        })
        .collect();
    assert_eq!(spawned, vec![EnemyId::new(0), EnemyId::new(1)]);

    let before_cycle = &first.assignments[script_len - 2];
    assert_eq!(
        before_cycle.targets,
        vec![TargetRecord {
            tower: TowerId::new(0),
            beam: BeamSlot::Primary,
            enemy: EnemyId::new(0),
        }]
    );

    let after_cycle = &first.assignments[script_len - 1];
    assert_eq!(
        after_cycle.targets,
        vec![TargetRecord {
            tower: TowerId::new(0),
            beam: BeamSlot::Primary,
            enemy: EnemyId::new(1),
        }]
    );
    assert!(first.events.contains(&EventRecord::TargetingChanged {
        tower: TowerId::new(0),
        mode: TargetingMode::Last,
    }));
}

#[test]
fn towers_ignore_enemies_before_they_enter_range() {
    let outcome = replay(scripted_commands());
    // Place, spawn and the first two steps happen with the enemy still short
    // of the tower's reach.
    for snapshot in &outcome.assignments[..6] {
        assert!(snapshot.targets.is_empty(), "{snapshot:?}");
    }
}

fn replay(commands: Vec<Command>) -> ReplayOutcome {
    let mut world = new_world();
    let mut targeting = TowerTargeting::new();
    let mut current_targets = Vec::new();
    let mut assignments = Vec::new();
    let mut events = Vec::new();

    for command in commands {
        let mut generated = Vec::new();
        world::apply(&mut world, command, &mut generated);
        events.extend(generated.into_iter().filter_map(EventRecord::from_event));

        let towers = query::tower_view(&world);
        let enemies = query::enemy_view(&world);
        targeting.handle(&towers, &enemies, &mut current_targets);

        assignments.push(TargetSnapshot::from(&current_targets));
    }

    ReplayOutcome {
        events,
        assignments,
    }
}

fn new_world() -> World {
    let map = MapDefinition {
        columns: 10,
        rows: 4,
        lanes: vec![Lane {
            waypoints: vec![Vec2::new(0.0, 48.0), Vec2::new(320.0, 48.0)],
        }],
        blocked: Vec::new(),
        path_rule: PathRule::AllLanes,
    };
    World::new(
        SimulationConfig::default(),
        map,
        WaveCatalog { rounds: Vec::new() },
    )
    .expect("valid map")
}

fn step(script: &mut Vec<Command>, count: usize) {
    for _ in 0..count {
        script.push(Command::Tick { dt: STEP });
        script.push(Command::AdvanceEnemies);
    }
}

fn scripted_commands() -> Vec<Command> {
    let spawn = Command::SpawnEnemy {
        kind: EnemyKind::Scout,
        round: RoundNumber::new(1),
    };

    let mut script = vec![
        Command::PlaceTower {
            kind: TowerKind::Dwarf,
            origin: CellCoord::new(3, 2),
        },
        spawn.clone(),
    ];
    step(&mut script, 6);
    script.push(spawn);
    step(&mut script, 4);
    script.push(Command::CycleTargeting {
        tower: TowerId::new(0),
    });
    script
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct ReplayOutcome {
    events: Vec<EventRecord>,
    assignments: Vec<TargetSnapshot>,
}

impl ReplayOutcome {
    fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TargetSnapshot {
    targets: Vec<TargetRecord>,
}

impl TargetSnapshot {
    fn from(targets: &[TowerTarget]) -> Self {
        Self {
            targets: targets.iter().map(TargetRecord::from).collect(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct TargetRecord {
    tower: TowerId,
    beam: BeamSlot,
    enemy: EnemyId,
}

impl From<&TowerTarget> for TargetRecord {
    fn from(target: &TowerTarget) -> Self {
        Self {
            tower: target.tower,
            beam: target.beam,
            enemy: target.enemy,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum EventRecord {
    TowerPlaced { tower: TowerId },
    EnemySpawned { enemy: EnemyId },
    TargetingChanged { tower: TowerId, mode: TargetingMode },
}

impl EventRecord {
    fn from_event(event: Event) -> Option<Self> {
        match event {
            Event::TowerPlaced { tower, .. } => Some(Self::TowerPlaced { tower }),
            Event::EnemySpawned { enemy, .. } => Some(Self::EnemySpawned { enemy }),
            Event::TargetingChanged { tower, mode } => {
                Some(Self::TargetingChanged { tower, mode })
            }
            Event::TimeAdvanced { .. } => None,
            other => panic!("unexpected event during targeting replay: {other:?}"),
        }
    }
}
