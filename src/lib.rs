//! Feast or Famine - a blob arena arcade game
//!
//! Core modules:
//! - `sim`: Deterministic simulation (movement, bot AI, collisions, game state)
//! - `renderer`: 2D canvas render pass
//! - `driver`: Frame loop lifecycle (start, game over, restart)
//! - `platform`: Clock, input and frame scheduling abstractions
//! - `ledger`: Wallet, score submission and leaderboard collaborators
//! - `tuning`: Data-driven game balance
//! - `bests`, `settings`: What the device remembers between visits

pub mod bests;
pub mod driver;
pub mod error;
pub mod ledger;
pub mod platform;
pub mod renderer;
pub mod settings;
pub mod sim;
pub mod storage;
pub mod tuning;

pub use driver::{FrameOutcome, GameLoop};
pub use error::{LedgerError, TuningError, WalletError};
pub use bests::PersonalBests;
pub use settings::{RulesPreset, Settings};
pub use tuning::{EatPolicy, RuleTable};

/// Identifier the ledger uses for this game
pub const GAME_ID: &str = "BLOB";

/// Classic game constants (the defaults behind `RuleTable::default`)
pub mod consts {
    /// World dimensions (world units)
    pub const WORLD_WIDTH: f32 = 2000.0;
    pub const WORLD_HEIGHT: f32 = 2000.0;

    /// Player defaults
    pub const STARTING_RADIUS: f32 = 20.0;
    pub const PLAYER_BASE_SPEED: f32 = 2.0;
    /// Pointer offsets inside this many pixels don't move the player
    pub const POINTER_DEAD_ZONE: f32 = 5.0;

    /// Food growth is capped at this radius
    pub const MAX_RADIUS: f32 = 100.0;
    /// Hard cap for agent-vs-agent growth (10% of world width)
    pub const MAX_AGENT_RADIUS: f32 = WORLD_WIDTH * 0.1;

    /// Food pool
    pub const FOOD_COUNT: usize = 30;
    pub const FOOD_RADIUS: f32 = 3.0;
    pub const FOOD_GROWTH_RATE: f32 = 0.1;
    pub const FOOD_MIN_GROWTH: f32 = 0.05;
    pub const FOOD_SCORE: u64 = 10;

    /// Agent-vs-agent growth and scoring
    pub const BOT_GROWTH_RATE: f32 = 0.25;
    pub const EAT_SCORE_FLAT: f32 = 100.0;
    pub const EAT_SCORE_PER_RADIUS: f32 = 10.0;

    /// Passive mass decay
    pub const MASS_DECAY_RATE: f32 = 0.9999;
    pub const MIN_DECAY_SIZE: f32 = 35.0;
    pub const DECAY_INTERVAL_MS: f64 = 1000.0;

    /// Speed boost
    pub const BOOST_MULTIPLIER: f32 = 2.0;
    pub const BOOST_DURATION_MS: f64 = 2500.0;
    pub const BOOST_COST: f32 = 1.0;

    /// Bot population
    pub const LARGE_BOT_COUNT: usize = 8;
    pub const REGULAR_BOT_COUNT: usize = 12;

    /// Bot AI
    pub const BOT_VIEW_RANGE: f32 = 300.0;
    pub const BOT_DECISION_INTERVAL_MS: f64 = 1000.0;
    pub const BOT_MOVEMENT_SMOOTHING: f32 = 0.08;
    pub const BOT_WALL_DAMPING: f32 = 0.8;
    pub const BOT_FLEE_SPEED: f32 = 3.0;
    pub const BOT_SAFETY_MARGIN: f32 = 1.2;

    /// Camera follow factor per frame
    pub const CAMERA_SMOOTHING: f32 = 0.03;

    /// Background grid spacing (pixels)
    pub const GRID_SIZE: f32 = 50.0;
}
