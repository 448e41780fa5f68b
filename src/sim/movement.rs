//! Per-frame position integration
//!
//! Speeds are in world units per frame. Timed effects (boost, decay) compare
//! against the wall-clock `now` passed in, so dropped frames don't stretch them.

use glam::Vec2;

use super::geometry::{clamp_to_world_bounds, direction};
use super::state::{Bot, GameState, Player};
use crate::tuning::RuleTable;

/// Speed multiplier from size: small blobs are quick, big ones sluggish
#[inline]
pub fn player_size_multiplier(radius: f32, rules: &RuleTable) -> f32 {
    (2.0 - (radius / rules.starting_radius) * 0.5).max(0.5)
}

/// Current per-frame player speed
pub fn player_speed(player: &Player, rules: &RuleTable) -> f32 {
    let boost = if player.is_boosted() {
        rules.boost_multiplier
    } else {
        1.0
    };
    player.base_speed * player_size_multiplier(player.radius, rules) * boost
}

/// Clear the boost once its window has passed
pub fn expire_boost(player: &mut Player, now: f64) -> bool {
    match player.boost_expires_at {
        Some(expires_at) if now > expires_at => {
            player.boost_expires_at = None;
            true
        }
        _ => false,
    }
}

/// Apply every decay interval that has elapsed by `now`
pub fn apply_decay(player: &mut Player, rules: &RuleTable, now: f64) {
    if now < player.next_decay_at {
        return;
    }
    let elapsed = ((now - player.next_decay_at) / rules.decay_interval_ms).floor() as i32 + 1;
    player.next_decay_at += elapsed as f64 * rules.decay_interval_ms;

    if player.radius > rules.min_decay_size {
        let decayed = player.radius * rules.mass_decay_rate.powi(elapsed);
        player.radius = decayed.max(rules.min_decay_size);
    }
}

/// Steer the player toward the pointer (screen space), then apply decay
pub fn move_player(state: &mut GameState, pointer: Option<Vec2>, now: f64) {
    let rules = &state.rules;
    let player = &mut state.player;

    if let Some(pointer) = pointer {
        let offset = pointer - state.camera.center();
        if offset.length() > rules.pointer_dead_zone {
            let speed = player_speed(player, rules);
            let next = player.pos + offset.normalize() * speed;
            player.pos = clamp_to_world_bounds(next, player.radius, rules.world_width, rules.world_height).pos;
        }
    }

    apply_decay(player, rules, now);
}

/// Per-frame bot speed; bigger bots are deliberately slower
#[inline]
pub fn bot_speed(bot: &Bot, rules: &RuleTable) -> f32 {
    let slowdown = (bot.radius / rules.max_radius) * rules.bot.size_slowdown;
    (bot.speed * (1.0 - slowdown)).max(0.0)
}

/// Smooth the bot's velocity toward its target and integrate one frame
pub fn move_bot(bot: &mut Bot, rules: &RuleTable) {
    let to_target = direction(bot.pos, bot.target);
    if to_target != Vec2::ZERO {
        let desired = to_target * bot_speed(bot, rules);
        bot.vel += (desired - bot.vel) * rules.bot.smoothing;
        bot.pos += bot.vel;
    }

    let clamped = clamp_to_world_bounds(bot.pos, bot.radius, rules.world_width, rules.world_height);
    bot.pos = clamped.pos;
    if clamped.hit_wall {
        bot.vel *= rules.bot.wall_damping;
    }
}
