use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Simulation time units elapsed per real second.
pub const TIME_UNITS_PER_SECOND: f32 = 5000.0;

/// Converts a frame duration into simulation time units.
#[must_use]
pub fn time_units(dt: Duration) -> f32 {
    dt.as_secs_f32() * TIME_UNITS_PER_SECOND
}

/// Tunables applied when a world is created.
///
/// Every field has a default so partial configuration files stay valid.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Side length of a tile in world units.
    pub tile_length: f32,
    /// Money available before the first purchase.
    pub starting_money: i64,
    /// Health available before the first leak.
    pub starting_health: i64,
    /// Largest frame delta accepted by a single tick, in milliseconds.
    pub max_frame_ms: u64,
    /// Time units child `i` of a dying parent waits, multiplied by `i`, before moving.
    pub child_stagger: f32,
    /// Distance ahead of a tower's centre at which projectiles appear, in tiles.
    pub muzzle_offset_tiles: f32,
}

impl SimulationConfig {
    /// Largest frame delta accepted by a single tick.
    #[must_use]
    pub fn max_frame_dt(&self) -> Duration {
        Duration::from_millis(self.max_frame_ms)
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tile_length: 32.0,
            starting_money: 240,
            starting_health: 100,
            max_frame_ms: 250,
            child_stagger: 500.0,
            muzzle_offset_tiles: 0.5,
        }
    }
}
