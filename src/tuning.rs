//! Data-driven game balance
//!
//! Every number the simulation uses lives in a [`RuleTable`]. Variants of the
//! game are different tables, never different code paths.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::error::TuningError;

/// When one agent is allowed to eat another.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EatPolicy {
    /// Eater radius must exceed `victim * ratio`
    Ratio { ratio: f32 },
    /// Below `milestone` score any strictly larger eater wins;
    /// from `milestone` on the ratio rule applies
    Milestone { milestone: u64, ratio: f32 },
}

impl Default for EatPolicy {
    fn default() -> Self {
        EatPolicy::Ratio { ratio: 1.0 }
    }
}

impl EatPolicy {
    /// Ratio in force for the given session score
    pub fn ratio_at(&self, score: u64) -> f32 {
        match *self {
            EatPolicy::Ratio { ratio } => ratio,
            EatPolicy::Milestone { milestone, ratio } => {
                if score < milestone {
                    1.0
                } else {
                    ratio
                }
            }
        }
    }

    /// Whether `eater_radius` may consume `victim_radius`. Equal radii never eat.
    pub fn allows(&self, eater_radius: f32, victim_radius: f32, score: u64) -> bool {
        eater_radius > victim_radius * self.ratio_at(score)
    }
}

/// Bot AI knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotTuning {
    /// Radius in which food and prey are noticed
    pub view_range: f32,
    /// Threats are noticed out to `view_range * threat_range_factor`
    pub threat_range_factor: f32,
    /// Radius ratio separating threat / prey from peers
    pub safety_margin: f32,
    pub decision_interval_ms: f64,
    /// Exponential velocity smoothing per frame
    pub smoothing: f32,
    pub wall_damping: f32,
    pub cruise_speed: f32,
    pub large_speed: f32,
    pub flee_speed: f32,
    /// Flee target distance as a multiple of `view_range`
    pub flee_extension: f32,
    /// Chance scale of skipping food/prey to wander (times `1 - personality`)
    pub idle_chance: f32,
    /// Pursuit target jitter (world units)
    pub jitter: f32,
    /// Extra chase speed for prey, times personality
    pub prey_speed_bonus: f32,
    /// Fraction of speed lost at `max_radius`
    pub size_slowdown: f32,
}

impl Default for BotTuning {
    fn default() -> Self {
        Self {
            view_range: BOT_VIEW_RANGE,
            threat_range_factor: 1.5,
            safety_margin: BOT_SAFETY_MARGIN,
            decision_interval_ms: BOT_DECISION_INTERVAL_MS,
            smoothing: BOT_MOVEMENT_SMOOTHING,
            wall_damping: BOT_WALL_DAMPING,
            cruise_speed: 2.0,
            large_speed: 1.8,
            flee_speed: BOT_FLEE_SPEED,
            flee_extension: 1.5,
            idle_chance: 0.3,
            jitter: 8.0,
            prey_speed_bonus: 0.25,
            size_slowdown: 0.5,
        }
    }
}

/// Complete balance table for one game variant
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleTable {
    // === World ===
    pub world_width: f32,
    pub world_height: f32,

    // === Player ===
    pub starting_radius: f32,
    pub player_base_speed: f32,
    pub pointer_dead_zone: f32,
    pub boost_multiplier: f32,
    pub boost_duration_ms: f64,
    pub boost_cost: f32,

    // === Growth ===
    /// Food growth stops at this radius
    pub max_radius: f32,
    /// Agent-vs-agent growth stops at this radius
    pub max_agent_radius: f32,
    pub food_growth_rate: f32,
    pub food_min_growth: f32,
    pub bot_growth_rate: f32,
    pub eat_policy: EatPolicy,

    // === Scoring ===
    pub food_score: u64,
    pub eat_score_flat: f32,
    pub eat_score_per_radius: f32,

    // === Decay ===
    pub mass_decay_rate: f32,
    pub min_decay_size: f32,
    pub decay_interval_ms: f64,

    // === Food ===
    pub food_count: usize,
    pub food_radius: f32,
    pub food_value_min: f32,
    pub food_value_max: f32,

    // === Bots ===
    pub large_bot_count: usize,
    pub regular_bot_count: usize,
    pub bot: BotTuning,

    // === Camera ===
    pub camera_smoothing: f32,
}

impl Default for RuleTable {
    fn default() -> Self {
        Self {
            world_width: WORLD_WIDTH,
            world_height: WORLD_HEIGHT,

            starting_radius: STARTING_RADIUS,
            player_base_speed: PLAYER_BASE_SPEED,
            pointer_dead_zone: POINTER_DEAD_ZONE,
            boost_multiplier: BOOST_MULTIPLIER,
            boost_duration_ms: BOOST_DURATION_MS,
            boost_cost: BOOST_COST,

            max_radius: MAX_RADIUS,
            max_agent_radius: MAX_AGENT_RADIUS,
            food_growth_rate: FOOD_GROWTH_RATE,
            food_min_growth: FOOD_MIN_GROWTH,
            bot_growth_rate: BOT_GROWTH_RATE,
            eat_policy: EatPolicy::default(),

            food_score: FOOD_SCORE,
            eat_score_flat: EAT_SCORE_FLAT,
            eat_score_per_radius: EAT_SCORE_PER_RADIUS,

            mass_decay_rate: MASS_DECAY_RATE,
            min_decay_size: MIN_DECAY_SIZE,
            decay_interval_ms: DECAY_INTERVAL_MS,

            food_count: FOOD_COUNT,
            food_radius: FOOD_RADIUS,
            food_value_min: 5.0,
            food_value_max: 10.0,

            large_bot_count: LARGE_BOT_COUNT,
            regular_bot_count: REGULAR_BOT_COUNT,
            bot: BotTuning::default(),

            camera_smoothing: CAMERA_SMOOTHING,
        }
    }
}

impl RuleTable {
    /// Classic rules: any strictly larger agent eats
    pub fn classic() -> Self {
        Self::default()
    }

    /// Eating needs a 20% radius margin
    pub fn strict() -> Self {
        Self {
            eat_policy: EatPolicy::Ratio { ratio: 1.2 },
            ..Self::default()
        }
    }

    /// Classic rules until the score milestone, then the 20% margin
    pub fn milestone() -> Self {
        Self {
            eat_policy: EatPolicy::Milestone {
                milestone: 500,
                ratio: 1.2,
            },
            ..Self::default()
        }
    }

    /// Parse and validate a JSON rule table (missing fields take defaults)
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let table: RuleTable = serde_json::from_str(json)?;
        table.validate()?;
        Ok(table)
    }

    /// Total bot population held constant during a session
    pub fn bot_count(&self) -> usize {
        self.large_bot_count + self.regular_bot_count
    }

    /// Food growth for a consumer of the given radius
    pub fn food_growth(&self, radius: f32) -> f32 {
        let size_ratio = radius / self.max_radius;
        (self.food_growth_rate * (1.0 - size_ratio)).max(self.food_min_growth)
    }

    /// Score awarded for eating an agent of the given radius
    pub fn eat_score(&self, eaten_radius: f32) -> u64 {
        (self.eat_score_flat + self.eat_score_per_radius * eaten_radius)
            .floor()
            .max(0.0) as u64
    }

    /// Reject tables that would break the simulation invariants
    pub fn validate(&self) -> Result<(), TuningError> {
        positive("world_width", self.world_width as f64)?;
        positive("world_height", self.world_height as f64)?;
        positive("starting_radius", self.starting_radius as f64)?;
        positive("player_base_speed", self.player_base_speed as f64)?;
        positive("max_radius", self.max_radius as f64)?;
        positive("max_agent_radius", self.max_agent_radius as f64)?;
        positive("food_radius", self.food_radius as f64)?;
        positive("decay_interval_ms", self.decay_interval_ms)?;
        positive("boost_duration_ms", self.boost_duration_ms)?;
        positive("bot.view_range", self.bot.view_range as f64)?;
        positive("bot.decision_interval_ms", self.bot.decision_interval_ms)?;
        positive("bot.threat_range_factor", self.bot.threat_range_factor as f64)?;
        positive("bot.cruise_speed", self.bot.cruise_speed as f64)?;
        positive("bot.large_speed", self.bot.large_speed as f64)?;
        positive("bot.flee_speed", self.bot.flee_speed as f64)?;
        positive("bot.flee_extension", self.bot.flee_extension as f64)?;

        non_negative("pointer_dead_zone", self.pointer_dead_zone)?;
        non_negative("boost_cost", self.boost_cost)?;
        non_negative("food_growth_rate", self.food_growth_rate)?;
        non_negative("food_min_growth", self.food_min_growth)?;
        non_negative("bot_growth_rate", self.bot_growth_rate)?;
        non_negative("min_decay_size", self.min_decay_size)?;
        non_negative("food_value_min", self.food_value_min)?;
        non_negative("food_value_max", self.food_value_max)?;
        non_negative("bot.jitter", self.bot.jitter)?;
        non_negative("bot.prey_speed_bonus", self.bot.prey_speed_bonus)?;

        at_least_one("boost_multiplier", self.boost_multiplier)?;
        at_least_one("bot.safety_margin", self.bot.safety_margin)?;
        at_least_one("eat_policy.ratio", self.eat_policy.ratio_at(u64::MAX))?;

        unit("mass_decay_rate", self.mass_decay_rate)?;
        unit("camera_smoothing", self.camera_smoothing)?;
        unit("bot.smoothing", self.bot.smoothing)?;
        unit("bot.wall_damping", self.bot.wall_damping)?;
        unit("bot.idle_chance", self.bot.idle_chance)?;
        unit("bot.size_slowdown", self.bot.size_slowdown)?;

        if self.food_count == 0 {
            return Err(TuningError::ZeroCount { field: "food_count" });
        }
        if self.bot_count() == 0 {
            return Err(TuningError::ZeroCount { field: "bot_count" });
        }
        if self.food_value_max < self.food_value_min {
            return Err(TuningError::NotPositive {
                field: "food_value_max - food_value_min",
                value: (self.food_value_max - self.food_value_min) as f64,
            });
        }

        // Anything spawned or grown must leave room for a centre inside the walls
        let largest = self
            .max_agent_radius
            .max(self.max_radius)
            .max(self.food_radius)
            .max(self.starting_radius);
        if largest * 2.0 > self.world_width.min(self.world_height) {
            return Err(TuningError::DoesNotFit {
                radius: largest,
                width: self.world_width,
                height: self.world_height,
            });
        }
        Ok(())
    }
}

fn positive(field: &'static str, value: f64) -> Result<(), TuningError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::Negative {
            field,
            value: value as f64,
        })
    }
}

fn at_least_one(field: &'static str, value: f32) -> Result<(), TuningError> {
    if value >= 1.0 && value.is_finite() {
        Ok(())
    } else {
        Err(TuningError::RatioBelowOne {
            field,
            value: value as f64,
        })
    }
}

fn unit(field: &'static str, value: f32) -> Result<(), TuningError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(TuningError::OutOfUnitRange {
            field,
            value: value as f64,
        })
    }
}
