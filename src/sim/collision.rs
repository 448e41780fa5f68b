//! Collision and growth resolution
//!
//! Runs once per frame after movement, in a fixed order:
//! 1. player vs food
//! 2. bots vs food
//! 3. bots vs player (may end the session)
//! 4. bots vs bots
//!
//! Food is topped up after each food pass and eaten bots are replaced once
//! all agent passes are done, so both populations are constant frame to frame.

use super::geometry::{clamp_to_world_bounds, overlaps};
use super::state::{Eater, GameEvent, GamePhase, GameState};

/// Grow an agent by eating food, never past `max_radius`
#[inline]
fn grow_from_food(radius: f32, growth: f32, max_radius: f32) -> f32 {
    if radius >= max_radius {
        radius
    } else {
        (radius + growth).min(max_radius)
    }
}

/// Resolve every collision for this frame.
///
/// Returns `true` if the player was eaten; the state is then in `GameOver`
/// and no contact after the fatal one is applied. Bots the player ate
/// earlier in the same pass are still removed and replaced.
pub fn resolve_collisions(state: &mut GameState) -> bool {
    player_eats_food(state);
    state.replenish_food();

    bots_eat_food(state);
    state.replenish_food();

    let mut eaten = Vec::new();
    let died = bots_meet_player(state, &mut eaten);
    if !died {
        bots_meet_bots(state, &mut eaten);
    }

    replace_eaten_bots(state, &eaten);
    clamp_agents(state);
    died
}

/// Drop every eaten bot and spawn one fresh bot per loss
fn replace_eaten_bots(state: &mut GameState, eaten: &[u32]) {
    if eaten.is_empty() {
        return;
    }
    state.bots.retain(|b| !eaten.contains(&b.id));
    for _ in 0..eaten.len() {
        state.spawn_replacement_bot();
    }
}

/// Pass 1: the player swallows every pellet it overlaps
fn player_eats_food(state: &mut GameState) {
    let rules = &state.rules;
    let player = &mut state.player;
    let mut eaten = 0u64;

    state.foods.retain(|food| {
        if overlaps(player.pos, player.radius, food.pos, food.radius) {
            let growth = rules.food_growth(player.radius);
            player.radius = grow_from_food(player.radius, growth, rules.max_radius);
            eaten += 1;
            false
        } else {
            true
        }
    });

    if eaten > 0 {
        state.score += eaten * rules.food_score;
        state
            .events
            .extend((0..eaten).map(|_| GameEvent::FoodEaten { by: Eater::Player }));
    }
}

/// Pass 2: each bot in turn swallows the pellets it overlaps
fn bots_eat_food(state: &mut GameState) {
    let rules = &state.rules;
    for bot in state.bots.iter_mut() {
        let before = state.foods.len();
        state.foods.retain(|food| {
            if overlaps(bot.pos, bot.radius, food.pos, food.radius) {
                let growth = rules.food_growth(bot.radius);
                bot.radius = grow_from_food(bot.radius, growth, rules.max_radius);
                false
            } else {
                true
            }
        });
        for _ in state.foods.len()..before {
            state.events.push(GameEvent::FoodEaten { by: Eater::Bot(bot.id) });
        }
    }
}

/// Pass 3: bots against the player. Returns `true` if the player died.
fn bots_meet_player(state: &mut GameState, eaten: &mut Vec<u32>) -> bool {
    let rules = &state.rules;
    let policy = rules.eat_policy;

    for bot in &state.bots {
        let player = &mut state.player;
        if !overlaps(bot.pos, bot.radius, player.pos, player.radius) {
            continue;
        }

        if policy.allows(bot.radius, player.radius, state.score) {
            state.events.push(GameEvent::PlayerEaten { bot_id: bot.id });
            state.phase = GamePhase::GameOver;
            log::info!(
                "Player (r={:.1}) eaten by bot {} (r={:.1}); final score {}",
                player.radius,
                bot.id,
                bot.radius,
                state.score
            );
            return true;
        }

        if policy.allows(player.radius, bot.radius, state.score) {
            player.radius = (player.radius + bot.radius * rules.bot_growth_rate).min(rules.max_agent_radius);
            state.score += rules.eat_score(bot.radius);
            eaten.push(bot.id);
            state.events.push(GameEvent::BotEaten {
                bot_id: bot.id,
                by: Eater::Player,
                radius: bot.radius,
            });
            log::debug!("Player ate bot {} (r={:.1})", bot.id, bot.radius);
        }
    }
    false
}

/// Pass 4: every unordered pair of surviving bots, in list order
fn bots_meet_bots(state: &mut GameState, eaten: &mut Vec<u32>) {
    let rules = &state.rules;
    let policy = rules.eat_policy;
    let score = state.score;
    let n = state.bots.len();

    for i in 0..n {
        for j in (i + 1)..n {
            if eaten.contains(&state.bots[i].id) {
                break;
            }
            if eaten.contains(&state.bots[j].id) {
                continue;
            }

            let (a, b) = (&state.bots[i], &state.bots[j]);
            if !overlaps(a.pos, a.radius, b.pos, b.radius) {
                continue;
            }

            let (eater, victim) = if policy.allows(a.radius, b.radius, score) {
                (i, j)
            } else if policy.allows(b.radius, a.radius, score) {
                (j, i)
            } else {
                // Too close in size: they just pass through each other
                continue;
            };

            let victim_id = state.bots[victim].id;
            let victim_radius = state.bots[victim].radius;
            let winner = &mut state.bots[eater];
            winner.radius = (winner.radius + victim_radius * rules.bot_growth_rate).min(rules.max_agent_radius);
            eaten.push(victim_id);
            state.events.push(GameEvent::BotEaten {
                bot_id: victim_id,
                by: Eater::Bot(winner.id),
                radius: victim_radius,
            });
        }
    }
}

/// Growth can push an agent past a wall; pull everyone back in
fn clamp_agents(state: &mut GameState) {
    let (w, h) = (state.rules.world_width, state.rules.world_height);
    let player = &mut state.player;
    player.pos = clamp_to_world_bounds(player.pos, player.radius, w, h).pos;
    for bot in state.bots.iter_mut() {
        bot.pos = clamp_to_world_bounds(bot.pos, bot.radius, w, h).pos;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::{Bot, BotClass, Food, Tint};
    use crate::tuning::RuleTable;
    use glam::Vec2;

    /// A started session emptied out so each test places exactly the
    /// entities it cares about. One pellet is parked in a corner so the
    /// pool stays full and no random food lands mid-test.
    fn arena(mut rules: RuleTable) -> GameState {
        rules.food_count = 1;
        let mut state = GameState::new(99, rules);
        state.init(0.0, Vec2::new(800.0, 600.0));
        state.bots.clear();
        state.foods = vec![pellet(Vec2::new(3.0, 3.0))];
        state.events.clear();
        state.player.pos = Vec2::new(1000.0, 1000.0);
        state
    }

    fn bot(state: &mut GameState, pos: Vec2, radius: f32) -> u32 {
        let id = state.next_entity_id();
        state.bots.push(Bot {
            id,
            pos,
            radius,
            base_speed: 2.0,
            speed: 2.0,
            target: pos,
            next_decision_at: 0.0,
            personality: 0.5,
            vel: Vec2::ZERO,
            class: BotClass::Regular,
            tint: Tint::WHITE,
        });
        id
    }

    fn pellet(pos: Vec2) -> Food {
        Food {
            pos,
            radius: 3.0,
            value: 5.0,
            tint: Tint::WHITE,
        }
    }

    #[test]
    fn test_player_eats_food_and_pool_refills() {
        let mut state = arena(RuleTable::default());
        state.player.pos = Vec2::new(97.0, 100.0);
        state.foods = vec![pellet(Vec2::new(100.0, 100.0))];

        let died = resolve_collisions(&mut state);

        assert!(!died);
        assert_eq!(state.foods.len(), state.rules.food_count);
        assert!(state.foods.iter().all(|f| f.pos != Vec2::new(100.0, 100.0)));
        // max(0.05, 0.1 * (1 - 20/100)) = 0.08
        assert!((state.player.radius - 20.08).abs() < 1e-5);
        assert_eq!(state.score, 10);
        assert_eq!(state.events, vec![GameEvent::FoodEaten { by: Eater::Player }]);
    }

    #[test]
    fn test_several_pellets_in_one_frame() {
        let mut state = arena(RuleTable::default());
        for dx in [-5.0, 0.0, 5.0] {
            state.foods.push(pellet(Vec2::new(1000.0 + dx, 1000.0)));
        }
        resolve_collisions(&mut state);
        assert_eq!(state.score, 30);
        assert_eq!(state.foods.len(), state.rules.food_count);
    }

    #[test]
    fn test_food_growth_capped_at_max_radius() {
        let mut state = arena(RuleTable::default());
        state.player.radius = 99.98;
        state.foods.push(pellet(Vec2::new(1000.0, 1000.0)));
        resolve_collisions(&mut state);
        assert_eq!(state.player.radius, 100.0);
    }

    #[test]
    fn test_bot_eats_food() {
        let mut state = arena(RuleTable::default());
        let id = bot(&mut state, Vec2::new(300.0, 300.0), 20.0);
        state.foods = vec![pellet(Vec2::new(305.0, 300.0))];
        resolve_collisions(&mut state);
        assert!((state.bots[0].radius - 20.08).abs() < 1e-5);
        assert_eq!(state.score, 0);
        assert!(state.events.contains(&GameEvent::FoodEaten { by: Eater::Bot(id) }));
    }

    #[test]
    fn test_large_bot_eats_player_under_strict_rules() {
        let mut state = arena(RuleTable::strict());
        state.score = 420;
        let id = bot(&mut state, Vec2::new(1030.0, 1000.0), 50.0);

        assert!(resolve_collisions(&mut state));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.score, 420);
        assert_eq!(state.events.last(), Some(&GameEvent::PlayerEaten { bot_id: id }));
    }

    #[test]
    fn test_resolution_stops_at_player_death() {
        let mut state = arena(RuleTable::default());
        bot(&mut state, Vec2::new(1030.0, 1000.0), 50.0);
        // Would be eaten by the player afterwards if resolution continued
        bot(&mut state, Vec2::new(990.0, 1000.0), 10.0);
        resolve_collisions(&mut state);
        assert_eq!(state.score, 0);
        assert_eq!(state.bots.len(), 2);
    }

    #[test]
    fn test_bot_eaten_before_death_is_still_replaced() {
        let mut state = arena(RuleTable::default());
        let small = bot(&mut state, Vec2::new(990.0, 1000.0), 10.0);
        let big = bot(&mut state, Vec2::new(1030.0, 1000.0), 50.0);

        assert!(resolve_collisions(&mut state));
        assert_eq!(state.phase, GamePhase::GameOver);
        // 100 + 10 * 10, earned before the fatal contact
        assert_eq!(state.score, 200);
        assert!(state.events.contains(&GameEvent::BotEaten {
            bot_id: small,
            by: Eater::Player,
            radius: 10.0,
        }));
        assert_eq!(state.events.last(), Some(&GameEvent::PlayerEaten { bot_id: big }));

        assert!(state.bots.iter().all(|b| b.id != small));
        assert!(state.bots.iter().any(|b| b.id == big));
        assert_eq!(state.bots.len(), 2);
    }

    #[test]
    fn test_player_eats_smaller_bot() {
        let mut state = arena(RuleTable::default());
        state.player.radius = 30.0;
        let id = bot(&mut state, Vec2::new(1010.0, 1000.0), 15.5);

        assert!(!resolve_collisions(&mut state));
        assert!((state.player.radius - (30.0 + 15.5 * 0.25)).abs() < 1e-5);
        assert_eq!(state.score, 255);
        // Replaced by a fresh bot with a new id
        assert_eq!(state.bots.len(), 1);
        assert_ne!(state.bots[0].id, id);
    }

    #[test]
    fn test_ratio_band_is_a_stalemate() {
        let mut state = arena(RuleTable::strict());
        // 22 vs 20: neither exceeds the other by 20%
        bot(&mut state, Vec2::new(1010.0, 1000.0), 22.0);
        assert!(!resolve_collisions(&mut state));
        assert_eq!(state.player.radius, 20.0);
        assert_eq!(state.bots[0].radius, 22.0);
        assert_eq!(state.phase, GamePhase::Active);
    }

    #[test]
    fn test_equal_bots_pass_through() {
        let mut state = arena(RuleTable::default());
        let a = bot(&mut state, Vec2::new(400.0, 400.0), 30.0);
        let b = bot(&mut state, Vec2::new(420.0, 400.0), 30.0);
        resolve_collisions(&mut state);
        assert_eq!(state.bots.len(), 2);
        assert_eq!(state.bots[0].id, a);
        assert_eq!(state.bots[1].id, b);
        assert_eq!(state.bots[0].radius, 30.0);
        assert_eq!(state.bots[1].radius, 30.0);
    }

    #[test]
    fn test_bigger_bot_eats_smaller_bot() {
        let mut state = arena(RuleTable::default());
        let small = bot(&mut state, Vec2::new(400.0, 400.0), 20.0);
        let big = bot(&mut state, Vec2::new(420.0, 400.0), 40.0);
        resolve_collisions(&mut state);

        assert_eq!(state.bots.len(), 2);
        let winner = state.bots.iter().find(|b| b.id == big).unwrap();
        assert!((winner.radius - 45.0).abs() < 1e-5);
        assert!(state.bots.iter().all(|b| b.id != small));
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_eaten_bot_cannot_eat_again() {
        let mut state = arena(RuleTable::default());
        let huge = bot(&mut state, Vec2::new(400.0, 400.0), 60.0);
        let mid = bot(&mut state, Vec2::new(430.0, 400.0), 30.0);
        let tiny = bot(&mut state, Vec2::new(450.0, 400.0), 10.0);
        resolve_collisions(&mut state);

        let eaten: Vec<u32> = state
            .events
            .iter()
            .filter_map(|e| match e {
                GameEvent::BotEaten { bot_id, by: Eater::Bot(by), .. } => Some((*bot_id, *by)),
                _ => None,
            })
            .map(|(victim, by)| {
                assert_eq!(by, huge);
                victim
            })
            .collect();
        assert_eq!(eaten, vec![mid, tiny]);
    }

    #[test]
    fn test_agent_growth_is_capped() {
        let mut state = arena(RuleTable::default());
        state.player.radius = 199.0;
        bot(&mut state, Vec2::new(1000.0, 1000.0), 40.0);
        resolve_collisions(&mut state);
        assert_eq!(state.player.radius, state.rules.max_agent_radius);
    }

    #[test]
    fn test_growth_near_wall_is_clamped() {
        let mut state = arena(RuleTable::default());
        state.player.pos = Vec2::new(30.0, 1000.0);
        state.player.radius = 30.0;
        bot(&mut state, Vec2::new(35.0, 1000.0), 28.0);
        resolve_collisions(&mut state);
        assert_eq!(state.player.pos.x, state.player.radius);
    }
}
