//! Input sampling
//!
//! Browser events arrive whenever they like; the loop reads them once per
//! frame. Pointer moves overwrite each other and a boost press latches
//! until the next sample.

use glam::Vec2;

use crate::sim::TickInput;

/// Discrete key actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Boost,
    Restart,
    EndGame,
}

impl KeyAction {
    /// Map a `KeyboardEvent.key` value
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            " " | "Spacebar" => Some(KeyAction::Boost),
            "r" | "R" | "Enter" => Some(KeyAction::Restart),
            "Escape" => Some(KeyAction::EndGame),
            _ => None,
        }
    }
}

/// Latest known input, shared between event handlers and the frame loop
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pointer: Option<Vec2>,
    boost: bool,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pointer position in screen pixels
    pub fn pointer_moved(&mut self, pos: Vec2) {
        self.pointer = Some(pos);
    }

    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Latch a boost request for the next frame
    pub fn press_boost(&mut self) {
        self.boost = true;
    }

    /// Frame input for the simulation; clears the boost latch
    pub fn take_tick_input(&mut self) -> TickInput {
        TickInput {
            pointer: self.pointer,
            boost: std::mem::take(&mut self.boost),
        }
    }

    /// Drop latched actions (on restart), keeping the pointer
    pub fn clear_actions(&mut self) {
        self.boost = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_mapping() {
        assert_eq!(KeyAction::from_key(" "), Some(KeyAction::Boost));
        assert_eq!(KeyAction::from_key("R"), Some(KeyAction::Restart));
        assert_eq!(KeyAction::from_key("Enter"), Some(KeyAction::Restart));
        assert_eq!(KeyAction::from_key("Escape"), Some(KeyAction::EndGame));
        assert_eq!(KeyAction::from_key("x"), None);
    }

    #[test]
    fn test_latest_pointer_wins_and_boost_is_one_shot() {
        let mut input = InputState::new();
        input.pointer_moved(Vec2::new(1.0, 2.0));
        input.pointer_moved(Vec2::new(3.0, 4.0));
        input.press_boost();

        let first = input.take_tick_input();
        assert_eq!(first.pointer, Some(Vec2::new(3.0, 4.0)));
        assert!(first.boost);

        let second = input.take_tick_input();
        assert_eq!(second.pointer, Some(Vec2::new(3.0, 4.0)));
        assert!(!second.boost);
    }

    #[test]
    fn test_clear_keeps_pointer() {
        let mut input = InputState::new();
        input.pointer_moved(Vec2::new(5.0, 5.0));
        input.press_boost();
        input.clear_actions();
        let sampled = input.take_tick_input();
        assert!(!sampled.boost);
        assert_eq!(sampled.pointer, Some(Vec2::new(5.0, 5.0)));
    }
}
