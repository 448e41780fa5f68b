//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (wall-clock milliseconds)
//! - Input events (latest pointer, one-shot key actions)
//! - Frame scheduling (requestAnimationFrame on web)

pub mod frame;
pub mod input;
pub mod time;

pub use frame::{FrameScheduler, FrameToken, ManualScheduler};
pub use input::{InputState, KeyAction};
pub use time::{Clock, ManualClock, SystemClock};
