//! Built-in map and wave catalog used when no content files are given.

use glam::vec2;
use team_defence_core::{
    CellCoord, EnemyKind, Lane, MapDefinition, PathRule, RoundPlan, SpawnEntry, WaveCatalog,
};

/// Two crossing lanes on a 20 by 14 tile field; rounds alternate between them.
pub(crate) fn map() -> MapDefinition {
    MapDefinition {
        columns: 20,
        rows: 14,
        lanes: vec![
            Lane {
                waypoints: vec![
                    vec2(0.0, 80.0),
                    vec2(400.0, 80.0),
                    vec2(400.0, 368.0),
                    vec2(640.0, 368.0),
                ],
            },
            Lane {
                waypoints: vec![vec2(240.0, 0.0), vec2(240.0, 240.0), vec2(640.0, 240.0)],
            },
        ],
        blocked: vec![CellCoord::new(0, 13), CellCoord::new(19, 0)],
        path_rule: PathRule::Alternating,
    }
}

fn round(groups: &[(EnemyKind, usize, f32)]) -> RoundPlan {
    RoundPlan::new(
        groups
            .iter()
            .flat_map(|&(kind, count, delay)| {
                std::iter::repeat(SpawnEntry { kind, delay }).take(count)
            })
            .collect(),
    )
}

/// Six rounds climbing from scouts to a colossus.
pub(crate) fn catalog() -> WaveCatalog {
    use EnemyKind::*;

    WaveCatalog {
        rounds: vec![
            round(&[(Scout, 8, 600.0)]),
            round(&[(Soldier, 10, 500.0), (Runner, 3, 400.0)]),
            round(&[(Veteran, 6, 400.0), (Sprinter, 4, 300.0), (Shade, 2, 600.0)]),
            round(&[(Shellback, 3, 900.0), (ShadeShell, 4, 700.0)]),
            round(&[(Sprinter, 8, 250.0), (Juggernaut, 2, 1500.0)]),
            round(&[(Scout, 12, 150.0), (Colossus, 1, 0.0)]),
        ],
    }
}
