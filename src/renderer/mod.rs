//! 2D raster render pass
//!
//! Draws one frame of a [`GameState`] onto any [`Surface`]: background,
//! scrolling grid, food, bots, then the player on top. Everything off
//! screen is culled. The pass only reads the state.

pub mod color;
pub mod recording;

#[cfg(target_arch = "wasm32")]
pub mod canvas;

use glam::Vec2;

use crate::consts::GRID_SIZE;
use crate::sim::GameState;

pub use color::css;
pub use recording::{DrawCall, RecordingSurface};

#[cfg(target_arch = "wasm32")]
pub use canvas::CanvasSurface;

pub const BACKGROUND: &str = "black";
pub const GRID_LINE: &str = "rgba(255, 255, 255, 0.1)";
pub const PLAYER_BORDER: &str = "#FFFFFF";
pub const PLAYER_OUTLINE: &str = "#0066ff";

/// A 2D drawing target sized to the viewport, in screen pixels
pub trait Surface {
    /// Current drawable size
    fn size(&self) -> Vec2;
    fn clear(&mut self, color: &str);
    fn line(&mut self, from: Vec2, to: Vec2, color: &str, width: f32);
    fn fill_circle(&mut self, center: Vec2, radius: f32, color: &str);
    fn stroke_circle(&mut self, center: Vec2, radius: f32, color: &str, width: f32);
}

/// Per-frame draw options
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_grid: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self { show_grid: true }
    }
}

/// Draw the current frame
pub fn render_frame(state: &GameState, surface: &mut impl Surface, options: RenderOptions) {
    let camera = &state.camera;
    let size = surface.size();

    surface.clear(BACKGROUND);
    if options.show_grid {
        draw_grid(surface, camera.focus, size);
    }

    for food in &state.foods {
        if camera.is_visible(food.pos, food.radius) {
            let color = css(food.tint);
            surface.fill_circle(camera.world_to_screen(food.pos), food.radius, &color);
        }
    }

    for bot in &state.bots {
        if camera.is_visible(bot.pos, bot.radius) {
            let color = css(bot.tint);
            surface.fill_circle(camera.world_to_screen(bot.pos), bot.radius, &color);
        }
    }

    let player = &state.player;
    let at = camera.world_to_screen(player.pos);
    surface.fill_circle(at, player.radius, &css(player.tint));
    surface.stroke_circle(at, player.radius, PLAYER_BORDER, 2.0);
    surface.stroke_circle(at, player.radius, PLAYER_OUTLINE, 3.0);
}

/// Grid lines scroll with the camera focus so the world appears to move
fn draw_grid(surface: &mut impl Surface, focus: Vec2, size: Vec2) {
    let shift = Vec2::new(focus.x.rem_euclid(GRID_SIZE), focus.y.rem_euclid(GRID_SIZE));

    let mut x = 0.0;
    while x < size.x {
        let sx = x - shift.x;
        surface.line(Vec2::new(sx, 0.0), Vec2::new(sx, size.y), GRID_LINE, 1.0);
        x += GRID_SIZE;
    }

    let mut y = 0.0;
    while y < size.y {
        let sy = y - shift.y;
        surface.line(Vec2::new(0.0, sy), Vec2::new(size.x, sy), GRID_LINE, 1.0);
        y += GRID_SIZE;
    }
}
