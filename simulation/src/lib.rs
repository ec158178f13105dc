#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick driver that composes the world with the Team Defence systems.
//!
//! One call to [`Simulation::step`] runs a full frame in fixed order:
//!
//! 1. advance the clock and re-sort enemies by progress,
//! 2. let the wave schedulers spawn enemies and retire finished rounds,
//! 3. move enemies, resolving leaks, deaths and child spawns,
//! 4. select targets and let every tower act,
//! 5. move projectiles and resolve their hits.
//!
//! Every event the world broadcasts is fed back to the wave schedulers so
//! their live-enemy counts stay exact. The remaining methods are the input
//! surface: they may be called between steps and answer with a `Result`.

use std::time::Duration;

use team_defence_core::{
    scene::SceneSnapshot, CellCoord, Command, Event, LedgerSnapshot, MapDefinition, MapError,
    PlacementError, RemovalError, RoundNumber, RoundStartError, SimulationConfig, TargetingError,
    TargetingMode, TowerId, TowerKind, TowerTarget, UpgradeError, UpgradePath, UpgradeTier, Vec2,
    WaveCatalog,
};
use team_defence_system_builder::{Builder, Config as BuilderConfig, InputAction, PlacementPreview};
use team_defence_system_tower_targeting::TowerTargeting;
use team_defence_system_waves::WaveScheduling;
use team_defence_world::{self as world, query, World};
use tracing::{trace, warn};

/// World plus the pure systems that drive it, stepped one frame at a time.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    waves: WaveScheduling,
    targeting: TowerTargeting,
    builder: Builder,
    journal: Vec<Event>,
    batch: Vec<Event>,
    commands: Vec<Command>,
    targets: Vec<TowerTarget>,
    game_over: bool,
}

impl Simulation {
    /// Builds a simulation for the provided map and catalog.
    pub fn new(
        config: SimulationConfig,
        map: MapDefinition,
        catalog: WaveCatalog,
    ) -> Result<Self, MapError> {
        let builder = Builder::new(BuilderConfig::new(config.tile_length));
        Ok(Self {
            world: World::new(config, map, catalog)?,
            waves: WaveScheduling::new(),
            targeting: TowerTargeting::new(),
            builder,
            journal: Vec::new(),
            batch: Vec::new(),
            commands: Vec::new(),
            targets: Vec::new(),
            game_over: false,
        })
    }

    /// Advances the simulation by `dt` and returns every event of the frame.
    pub fn step(&mut self, dt: Duration) -> &[Event] {
        self.journal.clear();

        world::apply(&mut self.world, Command::Tick { dt }, &mut self.batch);
        self.waves.handle(
            &self.batch,
            query::wave_catalog(&self.world),
            &mut self.commands,
        );
        self.journal.append(&mut self.batch);

        for command in std::mem::take(&mut self.commands) {
            self.phase(command);
        }
        self.phase(Command::AdvanceEnemies);

        let towers = query::tower_view(&self.world);
        let enemies = query::enemy_view(&self.world);
        self.targeting.handle(&towers, &enemies, &mut self.targets);
        let targets = self.targets.clone();
        self.phase(Command::EngageTargets { targets });

        self.phase(Command::AdvanceProjectiles);

        trace!(
            tick = query::tick_index(&self.world),
            events = self.journal.len(),
            "frame complete"
        );
        &self.journal
    }

    /// Builds a tower with its footprint anchored at `origin`.
    pub fn place_tower(
        &mut self,
        kind: TowerKind,
        origin: CellCoord,
    ) -> Result<TowerId, PlacementError> {
        let events = self.execute(Command::PlaceTower { kind, origin });
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerPlaced { tower, .. } => Some(Ok(*tower)),
                Event::TowerPlacementRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(PlacementError::OutOfBounds))
    }

    /// Sells a tower, returning the refund credited to the ledger.
    pub fn sell_tower(&mut self, tower: TowerId) -> Result<u32, RemovalError> {
        let events = self.execute(Command::SellTower { tower });
        events
            .iter()
            .find_map(|event| match event {
                Event::TowerSold { refund, .. } => Some(Ok(*refund)),
                Event::TowerSaleRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(RemovalError::MissingTower))
    }

    /// Buys the next tier along `path`, returning the tier bought.
    pub fn buy_upgrade(
        &mut self,
        tower: TowerId,
        path: UpgradePath,
    ) -> Result<UpgradeTier, UpgradeError> {
        let events = self.execute(Command::BuyUpgrade { tower, path });
        events
            .iter()
            .find_map(|event| match event {
                Event::UpgradePurchased { tier, .. } => Some(Ok(*tier)),
                Event::UpgradeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(UpgradeError::MissingTower))
    }

    /// Cycles a tower's targeting mode, returning the new mode.
    pub fn switch_targeting(&mut self, tower: TowerId) -> Result<TargetingMode, TargetingError> {
        let events = self.execute(Command::CycleTargeting { tower });
        events
            .iter()
            .find_map(|event| match event {
                Event::TargetingChanged { mode, .. } => Some(Ok(*mode)),
                Event::TargetingChangeRejected { reason, .. } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(TargetingError::MissingTower))
    }

    /// Starts the next round, returning its number.
    pub fn start_next_round(&mut self) -> Result<RoundNumber, RoundStartError> {
        let events = self.execute(Command::StartNextRound);
        events
            .iter()
            .find_map(|event| match event {
                Event::RoundStarted { round, .. } => Some(Ok(*round)),
                Event::RoundStartRejected { reason } => Some(Err(*reason)),
                _ => None,
            })
            .unwrap_or(Err(RoundStartError::RoundInProgress))
    }

    /// Translates pointer and menu actions into commands and executes them.
    ///
    /// Returns the events produced; rejections are reported as events.
    pub fn handle_input(&mut self, actions: &[InputAction]) -> Vec<Event> {
        let mut commands = Vec::new();
        let world = &self.world;
        self.builder
            .handle(actions, |cell| query::tower_at(world, cell), &mut commands);

        let mut events = Vec::new();
        for command in commands {
            events.extend(self.execute(command));
        }
        events
    }

    /// Describes what placing `kind` under the pointer at `point` would do.
    #[must_use]
    pub fn preview(&self, kind: TowerKind, point: Vec2) -> Option<PlacementPreview> {
        self.builder.preview(kind, point, |kind, origin| {
            query::placement_check(&self.world, kind, origin)
        })
    }

    /// Everything a renderer needs to draw the current frame.
    #[must_use]
    pub fn scene(&self) -> SceneSnapshot {
        query::scene(&self.world)
    }

    /// Money, health and round state.
    #[must_use]
    pub fn ledger(&self) -> LedgerSnapshot {
        query::ledger(&self.world)
    }

    /// Reports whether health ran out at some point.
    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Read access to the underlying world for queries.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Read access to the active wave schedulers.
    #[must_use]
    pub fn waves(&self) -> &WaveScheduling {
        &self.waves
    }

    /// Applies a command outside the frame loop and books its events.
    fn execute(&mut self, command: Command) -> Vec<Event> {
        world::apply(&mut self.world, command, &mut self.batch);
        self.book();
        std::mem::take(&mut self.batch)
    }

    /// Runs one frame phase and files its events in the journal.
    fn phase(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.batch);
        self.book();
        self.journal.append(&mut self.batch);
    }

    /// Feeds the pending batch to the wave schedulers.
    fn book(&mut self) {
        self.waves.handle(
            &self.batch,
            query::wave_catalog(&self.world),
            &mut self.commands,
        );
        if !self.commands.is_empty() {
            warn!(
                count = self.commands.len(),
                "wave scheduling emitted commands outside the clock phase"
            );
            self.commands.clear();
        }
        if !self.game_over && self.batch.contains(&Event::HealthDepleted) {
            warn!("health depleted, game over");
            self.game_over = true;
        }
    }
}
