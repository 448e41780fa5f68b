//! Bot decision making
//!
//! Each bot re-plans at most once per decision interval. A plan is just a
//! target point and a speed; `movement::move_bot` does the steering.
//! Priority: flee the nearest threat, else (sometimes) idle-wander, else go
//! for the most attractive food or prey in view, else wander.

use std::f32::consts::{FRAC_PI_2, TAU};

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use super::geometry::{clamp_to_world_bounds, direction};
use super::state::{Bot, Food, GameState};
use crate::tuning::RuleTable;

/// Another agent as seen by a deciding bot
#[derive(Debug, Clone, Copy)]
struct Sighting {
    /// `None` for the player
    bot_id: Option<u32>,
    pos: Vec2,
    radius: f32,
}

/// Outcome of one decision
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Plan {
    Flee { target: Vec2 },
    Chase { target: Vec2, speed: f32 },
    Wander { target: Vec2 },
}

impl Plan {
    pub fn target(&self) -> Vec2 {
        match *self {
            Plan::Flee { target } | Plan::Chase { target, .. } | Plan::Wander { target } => target,
        }
    }
}

/// Re-plan every bot whose decision timer has elapsed
pub fn update_bot_decisions(state: &mut GameState, now: f64) {
    let mut sightings: Vec<Sighting> = Vec::with_capacity(state.bots.len() + 1);
    sightings.push(Sighting {
        bot_id: None,
        pos: state.player.pos,
        radius: state.player.radius,
    });
    sightings.extend(state.bots.iter().map(|b| Sighting {
        bot_id: Some(b.id),
        pos: b.pos,
        radius: b.radius,
    }));

    let rules = &state.rules;
    for bot in state.bots.iter_mut() {
        if now < bot.next_decision_at {
            continue;
        }
        bot.next_decision_at = now + rules.bot.decision_interval_ms;

        let plan = decide(bot, &sightings, &state.foods, rules, &mut state.rng);
        bot.speed = match plan {
            Plan::Flee { .. } => rules.bot.flee_speed,
            Plan::Chase { speed, .. } => speed,
            Plan::Wander { .. } => bot.base_speed,
        };
        bot.target = plan.target();
        log::trace!("bot {} -> {:?}", bot.id, plan);
    }
}

fn decide(bot: &Bot, others: &[Sighting], foods: &[Food], rules: &RuleTable, rng: &mut Pcg32) -> Plan {
    let tuning = &rules.bot;
    let threat_range = tuning.view_range * tuning.threat_range_factor;

    let threat = others
        .iter()
        .filter(|o| o.bot_id != Some(bot.id))
        .filter(|o| o.radius > bot.radius * tuning.safety_margin)
        .map(|o| (o, bot.pos.distance(o.pos)))
        .filter(|(_, d)| *d < threat_range)
        .min_by(|a, b| a.1.total_cmp(&b.1));

    if let Some((threat, _)) = threat {
        let mut away = direction(threat.pos, bot.pos);
        if away == Vec2::ZERO {
            away = Vec2::from_angle(rng.random_range(0.0..TAU));
        }
        let target = bot.pos + away * tuning.view_range * tuning.flee_extension;
        return Plan::Flee {
            target: clamp_target(target, bot.radius, rules),
        };
    }

    let idle_chance = (1.0 - bot.personality) * tuning.idle_chance;
    if rng.random::<f32>() < idle_chance {
        return wander(bot, rules, rng);
    }

    // (effective distance, position, is prey)
    let mut best: Option<(f32, Vec2, bool)> = None;
    for food in foods {
        let d = bot.pos.distance(food.pos);
        if d < tuning.view_range && best.is_none_or(|(e, _, _)| d < e) {
            best = Some((d, food.pos, false));
        }
    }
    for other in others {
        if other.bot_id == Some(bot.id) || bot.radius <= other.radius * tuning.safety_margin {
            continue;
        }
        let d = bot.pos.distance(other.pos);
        if d >= tuning.view_range {
            continue;
        }
        let effective = d / (1.0 + bot.personality);
        if best.is_none_or(|(e, _, _)| effective < e) {
            best = Some((effective, other.pos, true));
        }
    }

    match best {
        Some((_, pos, is_prey)) => {
            let jitter = Vec2::new(
                rng.random_range(-tuning.jitter..=tuning.jitter),
                rng.random_range(-tuning.jitter..=tuning.jitter),
            );
            let speed = if is_prey {
                bot.base_speed * (1.0 + tuning.prey_speed_bonus * bot.personality)
            } else {
                bot.base_speed
            };
            Plan::Chase {
                target: clamp_target(pos + jitter, bot.radius, rules),
                speed,
            }
        }
        None => wander(bot, rules, rng),
    }
}

/// Random point in an annulus around the bot, biased along its heading
fn wander(bot: &Bot, rules: &RuleTable, rng: &mut Pcg32) -> Plan {
    let view = rules.bot.view_range;
    let angle = if bot.vel.length_squared() > 1e-6 {
        bot.vel.to_angle() + rng.random_range(-FRAC_PI_2..=FRAC_PI_2)
    } else {
        rng.random_range(0.0..TAU)
    };
    let distance = rng.random_range(0.25..=0.5) * view;
    let target = bot.pos + Vec2::from_angle(angle) * distance;
    Plan::Wander {
        target: clamp_target(target, bot.radius, rules),
    }
}

#[inline]
fn clamp_target(target: Vec2, radius: f32, rules: &RuleTable) -> Vec2 {
    clamp_to_world_bounds(target, radius, rules.world_width, rules.world_height).pos
}
