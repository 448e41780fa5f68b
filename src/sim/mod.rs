//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Seeded RNG only
//! - Time comes in as an argument, never read from the host
//! - Stable iteration order (bot list order)
//! - No rendering or platform dependencies

pub mod ai;
pub mod camera;
pub mod collision;
pub mod geometry;
pub mod movement;
pub mod state;
pub mod tick;

pub use camera::Camera;
pub use collision::resolve_collisions;
pub use geometry::{Clamped, clamp_to_world_bounds, overlaps};
pub use state::{Bot, BotClass, Eater, Food, GameEvent, GamePhase, GameState, Player, Tint};
pub use tick::{TickInput, tick};
