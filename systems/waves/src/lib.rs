#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave scheduling system responsible for emitting spawn commands.
//!
//! Every started round gets its own scheduler that walks the round's spawn
//! list. Schedulers move through `Spawning`, `SpawningComplete` and
//! `Finished`; finished rounds are handed back to the world through
//! [`Command::CompleteRound`]. After each tick the newest round, the one with
//! the most time remaining, decides whether an early start is on offer.

use team_defence_core::{
    early_start_bonus, Command, Event, RoundNumber, RoundPlan, WaveCatalog,
};
use tracing::{debug, warn};

/// Lifecycle phase of a single round's scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchedulerPhase {
    /// Entries of the spawn list remain to be emitted.
    Spawning,
    /// Every entry was emitted; waiting for the round's enemies to vanish.
    SpawningComplete,
    /// The round is over and awaits removal.
    Finished,
}

/// Read-only summary of an active scheduler.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerStatus {
    /// Round driven by the scheduler.
    pub round: RoundNumber,
    /// Current lifecycle phase.
    pub phase: SchedulerPhase,
    /// Time units elapsed since the round started.
    pub elapsed: f32,
    /// Total duration of the round in time units.
    pub duration: f32,
    /// Enemies of the round still on the playfield.
    pub alive: u32,
}

impl SchedulerStatus {
    /// Time units left before the round's nominal end; negative once overdue.
    #[must_use]
    pub fn time_left(&self) -> f32 {
        self.duration - self.elapsed
    }
}

#[derive(Clone, Debug)]
struct WaveScheduler {
    round: RoundNumber,
    duration: f32,
    elapsed: f32,
    alive: u32,
    cursor: usize,
    countdown: f32,
    phase: SchedulerPhase,
}

impl WaveScheduler {
    fn new(round: RoundNumber, plan: &RoundPlan) -> Self {
        let phase = if plan.entries().is_empty() {
            SchedulerPhase::SpawningComplete
        } else {
            SchedulerPhase::Spawning
        };
        Self {
            round,
            duration: plan.duration(),
            elapsed: 0.0,
            alive: 0,
            cursor: 0,
            countdown: 0.0,
            phase,
        }
    }

    fn time_left(&self) -> f32 {
        self.duration - self.elapsed
    }

    fn step(&mut self, dt: f32, plan: &RoundPlan, out: &mut Vec<Command>) {
        match self.phase {
            SchedulerPhase::Spawning => {
                self.elapsed += dt;
                if self.countdown > 0.0 {
                    self.countdown -= dt;
                    return;
                }
                if let Some(entry) = plan.entries().get(self.cursor) {
                    out.push(Command::SpawnEnemy {
                        kind: entry.kind,
                        round: self.round,
                    });
                    self.countdown = entry.delay;
                    self.cursor += 1;
                }
                if self.cursor >= plan.entries().len() {
                    debug!(round = self.round.get(), "round spawning complete");
                    self.phase = SchedulerPhase::SpawningComplete;
                }
            }
            SchedulerPhase::SpawningComplete => {
                self.elapsed += dt;
                if self.alive == 0 {
                    self.phase = SchedulerPhase::Finished;
                }
            }
            SchedulerPhase::Finished => {}
        }
    }

    fn status(&self) -> SchedulerStatus {
        SchedulerStatus {
            round: self.round,
            phase: self.phase,
            elapsed: self.elapsed,
            duration: self.duration,
            alive: self.alive,
        }
    }
}

/// Pure system that turns elapsed time into spawn and round commands.
#[derive(Debug, Default)]
pub struct WaveScheduling {
    schedulers: Vec<WaveScheduler>,
}

impl WaveScheduling {
    /// Creates a wave scheduling system without active rounds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Consumes world events and emits the commands they call for.
    ///
    /// Round starts, spawns, kills and leaks are always booked. Schedulers
    /// only advance when the batch contains [`Event::TimeAdvanced`]; in that
    /// case an [`Command::OfferEarlyStart`] closes the emitted batch.
    pub fn handle(&mut self, events: &[Event], catalog: &WaveCatalog, out: &mut Vec<Command>) {
        let mut elapsed: Option<f32> = None;
        for event in events {
            match event {
                Event::TimeAdvanced { units, .. } => {
                    elapsed = Some(elapsed.unwrap_or(0.0) + units);
                }
                Event::RoundStarted { round, .. } => self.begin(*round, catalog),
                Event::EnemySpawned { round, .. } => {
                    if let Some(scheduler) = self.scheduler_mut(*round) {
                        scheduler.alive += 1;
                    }
                }
                Event::EnemyKilled { round, .. } | Event::EnemyLeaked { round, .. } => {
                    if let Some(scheduler) = self.scheduler_mut(*round) {
                        scheduler.alive = scheduler.alive.saturating_sub(1);
                    }
                }
                _ => {}
            }
        }

        let Some(dt) = elapsed else {
            return;
        };

        self.schedulers
            .sort_by(|left, right| left.time_left().total_cmp(&right.time_left()));
        for scheduler in &mut self.schedulers {
            match catalog.round(scheduler.round) {
                Some(plan) => scheduler.step(dt, plan, out),
                None => scheduler.phase = SchedulerPhase::Finished,
            }
        }

        self.schedulers.retain(|scheduler| {
            if scheduler.phase != SchedulerPhase::Finished {
                return true;
            }
            debug!(round = scheduler.round.get(), "round finished");
            out.push(Command::CompleteRound {
                round: scheduler.round,
            });
            false
        });

        let bonus = self
            .schedulers
            .iter()
            .max_by(|left, right| left.time_left().total_cmp(&right.time_left()))
            .and_then(|newest| early_start_bonus(newest.time_left(), newest.duration));
        out.push(Command::OfferEarlyStart { bonus });
    }

    /// Active schedulers, least time remaining first as of the last tick.
    pub fn schedulers(&self) -> impl Iterator<Item = SchedulerStatus> + '_ {
        self.schedulers.iter().map(WaveScheduler::status)
    }

    /// Round of the first-sorted scheduler, if any round is active.
    #[must_use]
    pub fn current_round(&self) -> Option<RoundNumber> {
        self.schedulers.first().map(|scheduler| scheduler.round)
    }

    /// Reports whether no round is being scheduled.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.schedulers.is_empty()
    }

    fn begin(&mut self, round: RoundNumber, catalog: &WaveCatalog) {
        let Some(plan) = catalog.round(round) else {
            warn!(round = round.get(), "started round is missing from the catalog");
            return;
        };
        if self.scheduler_mut(round).is_some() {
            return;
        }
        debug!(
            round = round.get(),
            entries = plan.entries().len(),
            duration = plan.duration(),
            "scheduling round"
        );
        self.schedulers.push(WaveScheduler::new(round, plan));
    }

    fn scheduler_mut(&mut self, round: RoundNumber) -> Option<&mut WaveScheduler> {
        self.schedulers
            .iter_mut()
            .find(|scheduler| scheduler.round == round)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use team_defence_core::{EnemyId, EnemyKind, LaneId, SpawnEntry};

    fn catalog(rounds: Vec<Vec<(EnemyKind, f32)>>) -> WaveCatalog {
        WaveCatalog {
            rounds: rounds
                .into_iter()
                .map(|entries| {
                    RoundPlan::new(
                        entries
                            .into_iter()
                            .map(|(kind, delay)| SpawnEntry { kind, delay })
                            .collect(),
                    )
                })
                .collect(),
        }
    }

    fn tick(units: f32) -> Event {
        Event::TimeAdvanced {
            dt: Duration::from_secs_f32(units / 5000.0),
            units,
        }
    }

    fn started(round: u32) -> Event {
        Event::RoundStarted {
            round: RoundNumber::new(round),
            early_bonus: None,
        }
    }

    fn spawned(enemy: u32, round: u32) -> Event {
        Event::EnemySpawned {
            enemy: EnemyId::new(enemy),
            kind: EnemyKind::Scout,
            round: RoundNumber::new(round),
            lane: LaneId::new(0),
        }
    }

    fn killed(enemy: u32, round: u32) -> Event {
        Event::EnemyKilled {
            enemy: EnemyId::new(enemy),
            kind: EnemyKind::Scout,
            round: RoundNumber::new(round),
            reward: 4,
        }
    }

    fn spawn_count(commands: &[Command]) -> usize {
        commands
            .iter()
            .filter(|command| matches!(command, Command::SpawnEnemy { .. }))
            .count()
    }

    #[test]
    fn lone_entry_completes_spawning_on_first_tick() {
        let catalog = catalog(vec![vec![(EnemyKind::Scout, 0.0)]]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();

        waves.handle(&[started(1)], &catalog, &mut out);
        assert!(out.is_empty(), "booking alone emits nothing");

        waves.handle(&[tick(100.0)], &catalog, &mut out);
        assert_eq!(spawn_count(&out), 1);
        let status = waves.schedulers().next().expect("scheduler");
        assert_eq!(status.phase, SchedulerPhase::SpawningComplete);

        out.clear();
        waves.handle(&[spawned(0, 1)], &catalog, &mut out);
        waves.handle(&[tick(100.0)], &catalog, &mut out);
        assert!(!out
            .iter()
            .any(|command| matches!(command, Command::CompleteRound { .. })));

        out.clear();
        waves.handle(&[killed(0, 1), tick(100.0)], &catalog, &mut out);
        assert_eq!(
            out.first(),
            Some(&Command::CompleteRound {
                round: RoundNumber::new(1)
            })
        );
        assert!(waves.is_idle());
    }

    #[test]
    fn delays_space_out_spawns() {
        let catalog = catalog(vec![vec![
            (EnemyKind::Scout, 300.0),
            (EnemyKind::Soldier, 0.0),
        ]]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();
        waves.handle(&[started(1)], &catalog, &mut out);

        let mut per_tick = Vec::new();
        for _ in 0..5 {
            out.clear();
            waves.handle(&[tick(100.0)], &catalog, &mut out);
            per_tick.push(spawn_count(&out));
        }
        // The 300 unit countdown drains by 100 per tick and hits zero on the fourth.
        assert_eq!(per_tick, vec![1, 0, 0, 0, 1]);
    }

    #[test]
    fn empty_round_finishes_on_first_tick() {
        let catalog = catalog(vec![Vec::new()]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();
        waves.handle(&[started(1), tick(10.0)], &catalog, &mut out);
        assert_eq!(
            out,
            vec![
                Command::CompleteRound {
                    round: RoundNumber::new(1)
                },
                Command::OfferEarlyStart { bonus: None },
            ]
        );
    }

    #[test]
    fn overlapping_rounds_reorder_by_time_left() {
        let catalog = catalog(vec![
            vec![(EnemyKind::Scout, 10_000.0), (EnemyKind::Scout, 0.0)],
            vec![(EnemyKind::Scout, 3_000.0), (EnemyKind::Scout, 0.0)],
        ]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();
        waves.handle(&[started(1)], &catalog, &mut out);
        waves.handle(&[tick(1_000.0)], &catalog, &mut out);
        waves.handle(&[tick(1_000.0)], &catalog, &mut out);

        waves.handle(&[started(2)], &catalog, &mut out);
        let order: Vec<_> = waves.schedulers().map(|s| s.round.get()).collect();
        assert_eq!(order, vec![1, 2]);
        assert_eq!(waves.current_round(), Some(RoundNumber::new(1)));

        waves.handle(&[tick(1_000.0)], &catalog, &mut out);
        let statuses: Vec<_> = waves.schedulers().collect();
        assert_eq!(statuses[0].round, RoundNumber::new(2));
        assert!((statuses[0].time_left() - 2_000.0).abs() < 1e-3);
        assert!((statuses[1].time_left() - 7_000.0).abs() < 1e-3);
        assert_eq!(waves.current_round(), Some(RoundNumber::new(2)));
    }

    #[test]
    fn early_start_is_offered_in_the_final_quarter() {
        let catalog = catalog(vec![vec![(EnemyKind::Scout, 1_000.0), (EnemyKind::Scout, 0.0)]]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();
        waves.handle(&[started(1), spawned(0, 1)], &catalog, &mut out);

        let mut offers = Vec::new();
        for _ in 0..9 {
            out.clear();
            waves.handle(&[tick(100.0)], &catalog, &mut out);
            offers.push(out.iter().find_map(|command| match command {
                Command::OfferEarlyStart { bonus } => Some(*bonus),
                _ => None,
            }));
        }
        let offers: Vec<_> = offers.into_iter().flatten().collect();
        assert_eq!(offers[6], None, "time left 300 of 1000");
        assert_eq!(offers[7], Some(80), "time left 200 of 1000");
        assert_eq!(offers[8], Some(40));
    }

    #[test]
    fn offer_follows_the_round_with_most_time_left() {
        let plan = vec![(EnemyKind::Scout, 1_000.0), (EnemyKind::Scout, 0.0)];
        let catalog = catalog(vec![plan.clone(), plan]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();
        waves.handle(&[started(1)], &catalog, &mut out);
        for _ in 0..8 {
            out.clear();
            waves.handle(&[tick(100.0)], &catalog, &mut out);
        }
        assert_eq!(out.last(), Some(&Command::OfferEarlyStart { bonus: Some(80) }));

        out.clear();
        waves.handle(&[started(2), tick(100.0)], &catalog, &mut out);
        assert_eq!(out.last(), Some(&Command::OfferEarlyStart { bonus: None }));
        assert_eq!(waves.current_round(), Some(RoundNumber::new(1)));
    }

    #[test]
    fn events_of_unknown_rounds_are_ignored() {
        let catalog = catalog(vec![vec![(EnemyKind::Scout, 0.0)]]);
        let mut waves = WaveScheduling::new();
        let mut out = Vec::new();
        waves.handle(&[started(4), spawned(0, 2), killed(0, 2)], &catalog, &mut out);
        assert!(waves.is_idle());
        assert!(out.is_empty());
    }
}
