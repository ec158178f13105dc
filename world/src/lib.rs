#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Team Defence.
//!
//! The world owns the ledger, the playfield and the enemy, tower and
//! projectile populations. It only changes through [`apply`], which executes
//! one [`Command`] and reports what happened as [`Event`]s. Read access goes
//! through the [`query`] module.

mod behaviour;
mod enemies;
mod ledger;
mod map;
mod projectiles;
mod towers;

use std::collections::BTreeMap;

use team_defence_core::{
    round_completion_bonus, time_units, CellCoord, CellRect, Command, Event, MapDefinition,
    MapError, PlacementError, RemovalError, RoundNumber, RoundStartError, SimulationConfig,
    TargetingError, TowerId, TowerKind, TowerTarget, UpgradeError, UpgradePath, UpgradeTier,
    WaveCatalog,
};
use tracing::{debug, info, warn};

use crate::{
    behaviour::{behaviour_for, Engagement},
    enemies::EnemyPopulation,
    ledger::Ledger,
    map::Playfield,
    projectiles::ProjectilePopulation,
    towers::{footprint_for, TowerRegistry},
};

/// Represents the authoritative Team Defence world state.
#[derive(Debug)]
pub struct World {
    config: SimulationConfig,
    catalog: WaveCatalog,
    playfield: Playfield,
    ledger: Ledger,
    enemies: EnemyPopulation,
    towers: TowerRegistry,
    projectiles: ProjectilePopulation,
    frame_units: f32,
    tick_index: u64,
}

impl World {
    /// Creates a world for the provided map and wave catalog.
    ///
    /// Fails when the map cannot be played: no lanes, a lane with fewer than
    /// two waypoints, an empty playfield or blocked cells off the grid.
    pub fn new(
        config: SimulationConfig,
        map: MapDefinition,
        catalog: WaveCatalog,
    ) -> Result<Self, MapError> {
        let playfield = Playfield::new(map, config.tile_length)?;
        for (index, plan) in catalog.rounds.iter().enumerate() {
            if plan.uses_fallback_duration() {
                debug!(
                    round = index + 1,
                    duration = plan.duration(),
                    "round has no spacing between spawns, using fallback duration"
                );
            }
        }

        Ok(Self {
            ledger: Ledger::new(config.starting_money, config.starting_health),
            config,
            catalog,
            playfield,
            enemies: EnemyPopulation::new(),
            towers: TowerRegistry::new(),
            projectiles: ProjectilePopulation::new(),
            frame_units: 0.0,
            tick_index: 0,
        })
    }

    fn place_tower(
        &mut self,
        kind: TowerKind,
        origin: CellCoord,
    ) -> Result<(TowerId, CellRect), PlacementError> {
        let region = self.check_placement(kind, origin)?;
        let price = kind.stats().price;
        self.ledger
            .spend(price)
            .map_err(|shortfall| PlacementError::InsufficientFunds {
                price,
                available: shortfall.available,
            })?;

        let current = self.ledger.round();
        let round_active = self.ledger.active_rounds().any(|round| round == current);
        let duration = self.catalog.round(current).map(|plan| plan.duration());
        let tower = self.towers.insert(kind, origin, self.playfield.tile_length());
        if let (true, Some(duration)) = (round_active, duration) {
            tower.schedule_payouts(current, duration);
        }
        Ok((tower.id, region))
    }

    fn check_placement(
        &self,
        kind: TowerKind,
        origin: CellCoord,
    ) -> Result<CellRect, PlacementError> {
        let region = CellRect::from_origin_and_size(origin, footprint_for(kind));
        self.playfield.check_buildable(&region)?;
        if self.towers.overlaps(&region) {
            return Err(PlacementError::Occupied);
        }
        Ok(region)
    }

    fn buy_upgrade(
        &mut self,
        tower: TowerId,
        path: UpgradePath,
    ) -> Result<(UpgradeTier, u32), UpgradeError> {
        let state = self
            .towers
            .get_mut(tower)
            .ok_or(UpgradeError::MissingTower)?;
        let tier = state.next_tier(path)?;
        let price = state.kind.upgrade_price(path, tier);
        self.ledger
            .spend(price)
            .map_err(|shortfall| UpgradeError::InsufficientFunds {
                price,
                available: shortfall.available,
            })?;
        state.apply_upgrade(path, tier, price);
        Ok((tier, price))
    }

    fn start_next_round(&mut self) -> Result<(RoundNumber, Option<u32>), RoundStartError> {
        let early_bonus = if self.ledger.has_active_rounds() {
            Some(
                self.ledger
                    .early_start()
                    .ok_or(RoundStartError::RoundInProgress)?,
            )
        } else {
            None
        };

        let round = self.ledger.round().next();
        let duration = self
            .catalog
            .round(round)
            .map(|plan| plan.duration())
            .ok_or(RoundStartError::CatalogExhausted(round.get()))?;

        if let Some(bonus) = early_bonus {
            self.ledger.credit(i64::from(bonus));
        }
        self.ledger.begin_round(round);
        for tower in self.towers.iter_mut() {
            tower.schedule_payouts(round, duration);
        }
        Ok((round, early_bonus))
    }

    fn engage(&mut self, targets: Vec<TowerTarget>, out_events: &mut Vec<Event>) {
        let mut assigned: BTreeMap<TowerId, [Option<TowerTarget>; 2]> = BTreeMap::new();
        for target in targets {
            assigned.entry(target.tower).or_default()[target.beam.index()] = Some(target);
        }

        let mut engagement = Engagement {
            dt: self.frame_units,
            muzzle_offset: self.config.muzzle_offset_tiles * self.playfield.tile_length(),
            enemies: &mut self.enemies,
            projectiles: &mut self.projectiles,
            ledger: &mut self.ledger,
            out_events: &mut *out_events,
        };
        for tower in self.towers.iter_mut() {
            let targets = assigned.get(&tower.id).copied().unwrap_or_default();
            behaviour_for(tower.kind).engage(tower, targets, &mut engagement);
        }

        self.enemies
            .resolve_deaths(&mut self.ledger, self.config.child_stagger, out_events);
    }

    fn advance_projectiles(&mut self, out_events: &mut Vec<Event>) {
        let mut attributions = Vec::new();
        self.projectiles.advance(
            self.frame_units,
            &self.playfield,
            &mut self.enemies,
            &mut attributions,
            out_events,
        );
        for attribution in attributions {
            if let Some(tower) = self.towers.get_mut(attribution.tower) {
                tower.damage_dealt += attribution.damage;
            }
        }
        self.enemies
            .resolve_deaths(&mut self.ledger, self.config.child_stagger, out_events);
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            let clamped = dt.min(world.config.max_frame_dt());
            world.frame_units = time_units(clamped);
            world.tick_index = world.tick_index.saturating_add(1);
            world.enemies.sort_by_progress();
            out_events.push(Event::TimeAdvanced {
                dt: clamped,
                units: world.frame_units,
            });
        }
        Command::SpawnEnemy { kind, round } => {
            world
                .enemies
                .spawn(kind, round, &world.playfield, out_events);
        }
        Command::AdvanceEnemies => {
            world.enemies.advance(
                world.frame_units,
                &world.playfield,
                &mut world.ledger,
                world.config.child_stagger,
                out_events,
            );
        }
        Command::EngageTargets { targets } => world.engage(targets, out_events),
        Command::AdvanceProjectiles => world.advance_projectiles(out_events),
        Command::CompleteRound { round } => {
            if !world.ledger.finish_round(round) {
                warn!(round = round.get(), "completion reported for inactive round");
                return;
            }
            let bonus = round_completion_bonus(round);
            world.ledger.credit(i64::from(bonus));
            info!(round = round.get(), bonus, "round completed");
            out_events.push(Event::RoundCompleted { round, bonus });
        }
        Command::OfferEarlyStart { bonus } => {
            let bonus = bonus.filter(|_| world.ledger.has_active_rounds());
            world.ledger.set_early_start(bonus);
        }
        Command::PlaceTower { kind, origin } => match world.place_tower(kind, origin) {
            Ok((tower, region)) => {
                debug!(tower = tower.get(), ?kind, "tower placed");
                out_events.push(Event::TowerPlaced {
                    tower,
                    kind,
                    region,
                });
            }
            Err(reason) => {
                debug!(?kind, %reason, "tower placement rejected");
                out_events.push(Event::TowerPlacementRejected {
                    kind,
                    origin,
                    reason,
                });
            }
        },
        Command::SellTower { tower } => match world.towers.remove(tower) {
            Some(state) => {
                let refund = state.refund();
                world.ledger.credit(i64::from(refund));
                debug!(tower = tower.get(), refund, "tower sold");
                out_events.push(Event::TowerSold {
                    tower,
                    region: state.region,
                    refund,
                });
            }
            None => out_events.push(Event::TowerSaleRejected {
                tower,
                reason: RemovalError::MissingTower,
            }),
        },
        Command::BuyUpgrade { tower, path } => match world.buy_upgrade(tower, path) {
            Ok((tier, price)) => {
                debug!(tower = tower.get(), ?path, tier = tier.get(), price, "upgrade bought");
                out_events.push(Event::UpgradePurchased {
                    tower,
                    path,
                    tier,
                    price,
                });
            }
            Err(reason) => {
                debug!(tower = tower.get(), ?path, %reason, "upgrade rejected");
                out_events.push(Event::UpgradeRejected {
                    tower,
                    path,
                    reason,
                });
            }
        },
        Command::CycleTargeting { tower } => {
            let outcome = match world.towers.get_mut(tower) {
                None => Err(TargetingError::MissingTower),
                Some(state) if !state.kind.acquires_targets() => Err(TargetingError::NotTargeting),
                Some(state) => {
                    state.targeting = state.targeting.next();
                    Ok(state.targeting)
                }
            };
            out_events.push(match outcome {
                Ok(mode) => Event::TargetingChanged { tower, mode },
                Err(reason) => Event::TargetingChangeRejected { tower, reason },
            });
        }
        Command::StartNextRound => match world.start_next_round() {
            Ok((round, early_bonus)) => {
                info!(
                    round = round.get(),
                    ?early_bonus,
                    money = world.ledger.money(),
                    "round started"
                );
                out_events.push(Event::RoundStarted { round, early_bonus });
            }
            Err(reason) => {
                debug!(%reason, "round start rejected");
                out_events.push(Event::RoundStartRejected { reason });
            }
        },
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use team_defence_core::{
        scene::{heading_angle, Overlay, SceneSnapshot, Sprite},
        BeamSlot, CellCoord, CellRect, EnemyView, LedgerSnapshot, PlacementError,
        ProjectileBehaviour, SimulationConfig, TowerId, TowerKind, TowerView, WaveCatalog,
    };

    use super::World;

    /// Captures a read-only view of living enemies, most advanced first.
    #[must_use]
    pub fn enemy_view(world: &World) -> EnemyView {
        EnemyView::from_snapshots(
            world
                .enemies
                .iter()
                .filter(|enemy| enemy.is_alive())
                .map(|enemy| enemy.snapshot())
                .collect(),
        )
    }

    /// Number of enemies on the playfield.
    #[must_use]
    pub fn enemy_count(world: &World) -> usize {
        world.enemies.len()
    }

    /// Captures a read-only view of all towers in identifier order.
    #[must_use]
    pub fn tower_view(world: &World) -> TowerView {
        let tile_length = world.playfield.tile_length();
        TowerView::from_snapshots(
            world
                .towers
                .iter()
                .map(|tower| tower.snapshot(tile_length))
                .collect(),
        )
    }

    /// Identifies the tower occupying the provided cell, if any.
    #[must_use]
    pub fn tower_at(world: &World, cell: CellCoord) -> Option<TowerId> {
        world.towers.tower_at(cell)
    }

    /// Checks whether a tower of `kind` could be built at `origin`, funds aside.
    pub fn placement_check(
        world: &World,
        kind: TowerKind,
        origin: CellCoord,
    ) -> Result<CellRect, PlacementError> {
        world.check_placement(kind, origin)
    }

    /// Money, health and round state.
    #[must_use]
    pub fn ledger(world: &World) -> LedgerSnapshot {
        world.ledger.snapshot()
    }

    /// Wave catalog the world was created with.
    #[must_use]
    pub fn wave_catalog(world: &World) -> &WaveCatalog {
        &world.catalog
    }

    /// Configuration the world was created with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Captures everything a renderer needs to draw the current frame.
    #[must_use]
    pub fn scene(world: &World) -> SceneSnapshot {
        let tile_length = world.playfield.tile_length();
        let towers = world
            .towers
            .iter()
            .map(|tower| {
                let primary = tower.slots[BeamSlot::Primary.index()];
                let heading = if primary.target.is_some() {
                    heading_angle(primary.aim - tower.center)
                } else {
                    0.0
                };
                let mut overlays = Vec::new();
                if tower.kind.acquires_targets() {
                    overlays.push(Overlay::TargetingRadius {
                        radius: tower.radius(tile_length),
                    });
                }
                if tower.kind == TowerKind::Inferno {
                    overlays.extend(
                        tower
                            .slots
                            .iter()
                            .filter(|slot| slot.target.is_some())
                            .map(|slot| Overlay::Beam {
                                target: slot.aim,
                                charge: slot.charge,
                            }),
                    );
                }
                Sprite {
                    position: tower.center,
                    heading,
                    texture: tower.kind.texture_key(),
                    overlays,
                }
            })
            .collect();

        let enemies = world
            .enemies
            .iter()
            .filter(|enemy| enemy.is_alive())
            .map(|enemy| Sprite {
                position: enemy.position,
                heading: heading_angle(enemy.heading),
                texture: enemy.kind.texture_key(enemy.disguised),
                overlays: Vec::new(),
            })
            .collect();

        let projectiles = world
            .projectiles
            .iter()
            .map(|projectile| {
                let behaviour = projectile.launch.behaviour;
                let heading = match behaviour {
                    ProjectileBehaviour::Spinning => projectile.rotation,
                    ProjectileBehaviour::Decaying => heading_angle(projectile.launch.heading),
                };
                Sprite {
                    position: projectile.position,
                    heading,
                    texture: behaviour.texture_key(),
                    overlays: Vec::new(),
                }
            })
            .collect();

        SceneSnapshot {
            width: world.playfield.width(),
            height: world.playfield.height(),
            towers,
            enemies,
            projectiles,
            ledger: world.ledger.snapshot(),
        }
    }
}
