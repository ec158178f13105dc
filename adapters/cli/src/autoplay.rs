//! Seeded bot that builds and upgrades towers while the simulation runs.

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use team_defence_core::{CellCoord, TowerKind, UpgradePath};
use team_defence_simulation::Simulation;
use team_defence_world::query;
use tracing::debug;

const BUILD_CHANCE: f64 = 0.02;
const UPGRADE_CHANCE: f64 = 0.01;

/// Random but reproducible player.
#[derive(Debug)]
pub(crate) struct Autoplay {
    rng: ChaCha8Rng,
    columns: u32,
    rows: u32,
}

impl Autoplay {
    pub(crate) fn new(seed: u64, columns: u32, rows: u32) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            columns,
            rows,
        }
    }

    /// Takes early starts when offered and occasionally spends money.
    pub(crate) fn act(&mut self, simulation: &mut Simulation) {
        if simulation.ledger().early_start.is_some() {
            if let Ok(round) = simulation.start_next_round() {
                debug!(round = round.get(), "autoplay took an early start");
            }
        }

        if self.rng.gen_bool(BUILD_CHANCE) {
            self.build(simulation);
        } else if self.rng.gen_bool(UPGRADE_CHANCE) {
            self.upgrade(simulation);
        }
    }

    fn build(&mut self, simulation: &mut Simulation) {
        let money = simulation.ledger().money;
        let affordable: Vec<TowerKind> = TowerKind::ALL
            .into_iter()
            .filter(|kind| i64::from(kind.stats().price) <= money)
            .collect();
        let Some(&kind) = affordable.choose(&mut self.rng) else {
            return;
        };
        let origin = CellCoord::new(
            self.rng.gen_range(0..self.columns),
            self.rng.gen_range(0..self.rows),
        );
        match simulation.place_tower(kind, origin) {
            Ok(tower) => debug!(tower = tower.get(), ?kind, ?origin, "autoplay built a tower"),
            Err(reason) => debug!(?kind, ?origin, %reason, "autoplay placement refused"),
        }
    }

    fn upgrade(&mut self, simulation: &mut Simulation) {
        let towers = query::tower_view(simulation.world()).into_vec();
        let Some(tower) = towers.choose(&mut self.rng) else {
            return;
        };
        let path = if self.rng.gen_bool(0.5) {
            UpgradePath::Primary
        } else {
            UpgradePath::Secondary
        };
        match simulation.buy_upgrade(tower.id, path) {
            Ok(tier) => debug!(tower = tower.id.get(), ?path, tier = tier.get(), "autoplay upgraded"),
            Err(reason) => debug!(tower = tower.id.get(), ?path, %reason, "autoplay upgrade refused"),
        }
    }
}
