//! Renderer-facing snapshots.
//!
//! A renderer only needs where each entity is, which way it faces, which
//! texture to draw and a handful of overlays. Everything else stays inside the
//! world.

use glam::Vec2;

use crate::LedgerSnapshot;

/// Decoration drawn on top of an entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Overlay {
    /// Circle showing how far a tower reaches.
    TargetingRadius {
        /// Radius in world units.
        radius: f32,
    },
    /// Beam from the entity to a target.
    Beam {
        /// Point the beam ends at.
        target: Vec2,
        /// Current beam charge.
        charge: u32,
    },
}

/// Drawable state of one entity.
#[derive(Clone, Debug, PartialEq)]
pub struct Sprite {
    /// Centre in world units.
    pub position: Vec2,
    /// Facing angle in radians.
    pub heading: f32,
    /// Texture key understood by the renderer.
    pub texture: &'static str,
    /// Overlays to draw above the sprite.
    pub overlays: Vec<Overlay>,
}

/// Complete drawable state captured after a tick.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneSnapshot {
    /// Playfield width in world units.
    pub width: f32,
    /// Playfield height in world units.
    pub height: f32,
    /// Towers in identifier order.
    pub towers: Vec<Sprite>,
    /// Enemies in population order.
    pub enemies: Vec<Sprite>,
    /// Projectiles in firing order.
    pub projectiles: Vec<Sprite>,
    /// Economy state.
    pub ledger: LedgerSnapshot,
}

impl SceneSnapshot {
    /// Total number of sprites in the scene.
    #[must_use]
    pub fn sprite_count(&self) -> usize {
        self.towers.len() + self.enemies.len() + self.projectiles.len()
    }
}

/// Facing angle in radians of a heading vector.
#[must_use]
pub fn heading_angle(heading: Vec2) -> f32 {
    heading.y.atan2(heading.x)
}
