//! Game state and core simulation types
//!
//! Everything one session owns lives in [`GameState`]; nothing here outlives
//! a restart except the RNG stream and the rule table.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::camera::Camera;
use super::geometry::clamp_to_world_bounds;
use crate::tuning::RuleTable;

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GamePhase {
    /// Created, but `init` has not run yet
    Uninitialized,
    /// Frames are being simulated
    Active,
    /// Run ended; score is frozen
    GameOver,
}

/// Colour as hue (degrees), saturation and lightness (percent)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tint {
    pub hue: f32,
    pub saturation: f32,
    pub lightness: f32,
}

impl Tint {
    pub const WHITE: Tint = Tint::hsl(0.0, 0.0, 100.0);

    pub const fn hsl(hue: f32, saturation: f32, lightness: f32) -> Self {
        Self {
            hue,
            saturation,
            lightness,
        }
    }

    fn random(rng: &mut Pcg32, saturation: f32, lightness: f32) -> Self {
        Self::hsl(rng.random_range(0.0..360.0), saturation, lightness)
    }
}

/// The player's blob
#[derive(Debug, Clone)]
pub struct Player {
    pub pos: Vec2,
    pub radius: f32,
    pub base_speed: f32,
    /// Boost is active while this is set
    pub boost_expires_at: Option<f64>,
    /// Next wall-clock time passive decay is applied
    pub next_decay_at: f64,
    pub tint: Tint,
}

impl Player {
    pub fn new(pos: Vec2, rules: &RuleTable, now: f64) -> Self {
        Self {
            pos,
            radius: rules.starting_radius,
            base_speed: rules.player_base_speed,
            boost_expires_at: None,
            next_decay_at: now + rules.decay_interval_ms,
            tint: Tint::WHITE,
        }
    }

    #[inline]
    pub fn is_boosted(&self) -> bool {
        self.boost_expires_at.is_some()
    }

    /// Start a speed boost, paying for it with radius.
    /// Refused while already boosted or at starting size.
    pub fn activate_boost(&mut self, now: f64, rules: &RuleTable) -> bool {
        if self.is_boosted() || self.radius <= rules.starting_radius {
            return false;
        }
        self.radius -= rules.boost_cost;
        self.boost_expires_at = Some(now + rules.boost_duration_ms);
        true
    }
}

/// A food pellet. Fungible: no identity survives respawn.
#[derive(Debug, Clone)]
pub struct Food {
    pub pos: Vec2,
    pub radius: f32,
    pub value: f32,
    pub tint: Tint,
}

/// Bot size class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotClass {
    Large,
    Regular,
}

/// An AI-controlled blob
#[derive(Debug, Clone)]
pub struct Bot {
    pub id: u32,
    pub pos: Vec2,
    pub radius: f32,
    /// Cruising speed for the bot's class
    pub base_speed: f32,
    /// Speed chosen by the last decision (flee / chase / cruise)
    pub speed: f32,
    /// Point the bot steers toward between decisions
    pub target: Vec2,
    /// Earliest wall-clock time of the next AI decision
    pub next_decision_at: f64,
    /// 0 = cautious, 1 = aggressive
    pub personality: f32,
    /// Smoothed per-frame velocity
    pub vel: Vec2,
    pub class: BotClass,
    pub tint: Tint,
}

/// Who ate something
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Eater {
    Player,
    Bot(u32),
}

/// Things that happened during the last frame
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    FoodEaten { by: Eater },
    BotEaten { bot_id: u32, by: Eater, radius: f32 },
    PlayerEaten { bot_id: u32 },
    BoostActivated,
    BoostExpired,
}

/// Complete game state for one session
#[derive(Debug, Clone)]
pub struct GameState {
    /// Seed the RNG stream started from
    pub seed: u64,
    pub rng: Pcg32,
    pub rules: RuleTable,
    pub phase: GamePhase,
    pub score: u64,
    /// Frames simulated since the last init
    pub frame: u64,
    pub player: Player,
    pub foods: Vec<Food>,
    pub bots: Vec<Bot>,
    pub camera: Camera,
    /// Events from the most recent frame
    pub events: Vec<GameEvent>,
    next_id: u32,
}

impl GameState {
    /// Create an uninitialized state; call [`GameState::init`] to start a session
    pub fn new(seed: u64, rules: RuleTable) -> Self {
        let center = world_center(&rules);
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
            player: Player::new(center, &rules, 0.0),
            camera: Camera::new(center, Vec2::ZERO),
            rules,
            phase: GamePhase::Uninitialized,
            score: 0,
            frame: 0,
            foods: Vec::new(),
            bots: Vec::new(),
            events: Vec::new(),
            next_id: 1,
        }
    }

    /// Reset entities, player and score, and enter `Active`.
    /// Used for the first start and for every restart.
    pub fn init(&mut self, now: f64, viewport: Vec2) {
        let center = world_center(&self.rules);
        self.player = Player::new(center, &self.rules, now);
        self.camera = Camera::new(center, viewport);
        self.score = 0;
        self.frame = 0;
        self.events.clear();
        self.next_id = 1;

        self.foods.clear();
        self.replenish_food();

        self.bots.clear();
        self.spawn_initial_bots();

        self.phase = GamePhase::Active;
        log::info!(
            "Session started: {} food, {} bots",
            self.foods.len(),
            self.bots.len()
        );
    }

    /// End the session from outside the simulation (the "end game" action).
    /// Returns the frozen score, or `None` if no session was running.
    pub fn end(&mut self) -> Option<u64> {
        if self.phase != GamePhase::Active {
            return None;
        }
        self.phase = GamePhase::GameOver;
        log::info!("Session ended with score {}", self.score);
        Some(self.score)
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.phase == GamePhase::Active
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// A fresh food pellet at a random in-bounds position
    pub fn spawn_food(&mut self) -> Food {
        let r = self.rules.food_radius;
        let pos = Vec2::new(
            self.rng.random_range(r..=self.rules.world_width - r),
            self.rng.random_range(r..=self.rules.world_height - r),
        );
        let value = self
            .rng
            .random_range(self.rules.food_value_min..=self.rules.food_value_max);
        let lightness = self.pellet_lightness(value);
        Food {
            pos,
            radius: r,
            value,
            tint: Tint::random(&mut self.rng, 70.0, lightness),
        }
    }

    /// Richer pellets are drawn brighter: 35% lightness at the bottom of the
    /// value range up to 65% at the top
    fn pellet_lightness(&self, value: f32) -> f32 {
        let (lo, hi) = (self.rules.food_value_min, self.rules.food_value_max);
        let t = if hi > lo { ((value - lo) / (hi - lo)).clamp(0.0, 1.0) } else { 0.5 };
        35.0 + 30.0 * t
    }

    /// Top the food pool back up to its target size
    pub fn replenish_food(&mut self) {
        while self.foods.len() < self.rules.food_count {
            let food = self.spawn_food();
            self.foods.push(food);
        }
    }

    /// Large bots first, then regular ones, in the corner spawn regions
    fn spawn_initial_bots(&mut self) {
        for _ in 0..self.rules.large_bot_count {
            let pos = self.quadrant_position(0.1);
            let radius = self.rng.random_range(35.0..45.0);
            let personality = self.rng.random_range(0.7..1.0);
            let tint = Tint::random(&mut self.rng, 80.0, 45.0);
            let speed = self.rules.bot.large_speed;
            self.push_bot(pos, radius, speed, personality, BotClass::Large, tint);
        }
        for _ in 0..self.rules.regular_bot_count {
            let pos = self.quadrant_position(0.1);
            let radius = self.rules.starting_radius * self.rng.random_range(0.8..0.9);
            let personality = self.rng.random_range(0.0..1.0);
            let tint = Tint::random(&mut self.rng, 70.0, 50.0);
            let speed = self.rules.bot.cruise_speed;
            self.push_bot(pos, radius, speed, personality, BotClass::Regular, tint);
        }
    }

    /// Replace an eaten bot with a fresh regular one
    pub fn spawn_replacement_bot(&mut self) {
        let pos = self.quadrant_position(0.4);
        let radius = self.rules.starting_radius * self.rng.random_range(0.8..1.2);
        let personality = self.rng.random_range(0.0..1.0);
        let tint = Tint::random(&mut self.rng, 70.0, 50.0);
        let speed = self.rules.bot.cruise_speed;
        self.push_bot(pos, radius, speed, personality, BotClass::Regular, tint);
    }

    fn push_bot(
        &mut self,
        pos: Vec2,
        radius: f32,
        speed: f32,
        personality: f32,
        class: BotClass,
        tint: Tint,
    ) {
        let pos = clamp_to_world_bounds(pos, radius, self.rules.world_width, self.rules.world_height).pos;
        let id = self.next_entity_id();
        self.bots.push(Bot {
            id,
            pos,
            radius,
            base_speed: speed,
            speed,
            target: pos,
            next_decision_at: 0.0,
            personality,
            vel: Vec2::ZERO,
            class,
            tint,
        });
    }

    /// Random point in one of four corner regions. Each region covers
    /// `span` of the world per axis, offset 0 or 60% along it.
    fn quadrant_position(&mut self, span: f32) -> Vec2 {
        let w = self.rules.world_width;
        let h = self.rules.world_height;
        let quadrant = self.rng.random_range(0..4u32);
        let (ox, oy) = match quadrant {
            0 => (0.0, 0.0),
            1 => (0.6, 0.0),
            2 => (0.0, 0.6),
            _ => (0.6, 0.6),
        };
        Vec2::new(
            w * ox + self.rng.random_range(0.0..1.0) * w * span,
            h * oy + self.rng.random_range(0.0..1.0) * h * span,
        )
    }
}

fn world_center(rules: &RuleTable) -> Vec2 {
    Vec2::new(rules.world_width / 2.0, rules.world_height / 2.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_is_uninitialized() {
        let state = GameState::new(7, RuleTable::default());
        assert_eq!(state.phase, GamePhase::Uninitialized);
        assert!(state.foods.is_empty());
        assert!(state.bots.is_empty());
    }

    #[test]
    fn test_init_populates_world() {
        let mut state = GameState::new(7, RuleTable::default());
        state.init(0.0, Vec2::new(800.0, 600.0));

        assert_eq!(state.phase, GamePhase::Active);
        assert_eq!(state.foods.len(), state.rules.food_count);
        assert_eq!(state.bots.len(), state.rules.bot_count());
        assert_eq!(
            state.bots.iter().filter(|b| b.class == BotClass::Large).count(),
            state.rules.large_bot_count
        );
        assert_eq!(state.player.radius, state.rules.starting_radius);
        assert_eq!(state.score, 0);
    }

    #[test]
    fn test_spawns_are_in_bounds() {
        let mut state = GameState::new(42, RuleTable::default());
        state.init(0.0, Vec2::new(800.0, 600.0));
        for _ in 0..20 {
            state.spawn_replacement_bot();
        }
        let (w, h) = (state.rules.world_width, state.rules.world_height);
        for bot in &state.bots {
            assert!(bot.pos.x >= bot.radius && bot.pos.x <= w - bot.radius);
            assert!(bot.pos.y >= bot.radius && bot.pos.y <= h - bot.radius);
        }
        for food in &state.foods {
            assert!(food.pos.x >= food.radius && food.pos.x <= w - food.radius);
            assert!((5.0..=10.0).contains(&food.value));
        }
    }

    #[test]
    fn test_pellet_shade_follows_value() {
        let mut state = GameState::new(3, RuleTable::default());
        state.init(0.0, Vec2::new(800.0, 600.0));
        for food in &state.foods {
            let expected = 35.0 + 30.0 * (food.value - 5.0) / 5.0;
            assert!((food.tint.lightness - expected).abs() < 1e-3);
        }
        assert_eq!(state.pellet_lightness(5.0), 35.0);
        assert_eq!(state.pellet_lightness(10.0), 65.0);

        // A single-valued range sits in the middle
        state.rules.food_value_min = 7.0;
        state.rules.food_value_max = 7.0;
        assert_eq!(state.pellet_lightness(7.0), 50.0);
    }

    #[test]
    fn test_boost_costs_radius() {
        let rules = RuleTable::default();
        let mut player = Player::new(Vec2::new(100.0, 100.0), &rules, 0.0);

        // At starting size the boost is refused
        assert!(!player.activate_boost(0.0, &rules));

        player.radius = 30.0;
        assert!(player.activate_boost(1000.0, &rules));
        assert_eq!(player.radius, 29.0);
        assert_eq!(player.boost_expires_at, Some(3500.0));

        // No stacking
        assert!(!player.activate_boost(1100.0, &rules));
        assert_eq!(player.radius, 29.0);
    }

    #[test]
    fn test_end_freezes_once() {
        let mut state = GameState::new(1, RuleTable::default());
        assert_eq!(state.end(), None);
        state.init(0.0, Vec2::new(800.0, 600.0));
        state.score = 120;
        assert_eq!(state.end(), Some(120));
        assert_eq!(state.phase, GamePhase::GameOver);
        assert_eq!(state.end(), None);
    }
}
