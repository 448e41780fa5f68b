//! One simulation frame
//!
//! The host calls [`tick`] once per display frame with the sampled input and
//! the current clock reading. Movement is per frame; only the boost, decay
//! and AI timers look at `now`.

use glam::Vec2;

use super::ai::update_bot_decisions;
use super::collision::resolve_collisions;
use super::movement::{expire_boost, move_bot, move_player};
use super::state::{GameEvent, GameState};

/// Input sampled for a single frame
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Latest pointer position in screen space, if one has been seen
    pub pointer: Option<Vec2>,
    /// Boost key was pressed since the last frame
    pub boost: bool,
}

/// Advance an active session by one frame. No-op in any other phase.
pub fn tick(state: &mut GameState, input: &TickInput, now: f64) {
    if !state.is_active() {
        return;
    }
    state.events.clear();
    state.frame += 1;

    if expire_boost(&mut state.player, now) {
        state.events.push(GameEvent::BoostExpired);
    }
    if input.boost && state.player.activate_boost(now, &state.rules) {
        log::debug!("Boost activated (r={:.1})", state.player.radius);
        state.events.push(GameEvent::BoostActivated);
    }

    move_player(state, input.pointer, now);

    update_bot_decisions(state, now);
    let rules = &state.rules;
    for bot in state.bots.iter_mut() {
        move_bot(bot, rules);
    }

    if resolve_collisions(state) {
        return;
    }

    state
        .camera
        .follow(state.player.pos, state.rules.camera_smoothing);
}
