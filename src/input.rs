use std::collections::HashSet;

use crate::types::Direction;

/// Maps a host key name onto a logical direction.
pub fn direction_for_key(key: &str) -> Option<Direction> {
    match key {
        "ArrowUp" | "w" | "W" => Some(Direction::Up),
        "ArrowDown" | "s" | "S" => Some(Direction::Down),
        "ArrowLeft" | "a" | "A" => Some(Direction::Left),
        "ArrowRight" | "d" | "D" => Some(Direction::Right),
        _ => None,
    }
}

/// Last-press-wins keyboard state. Releasing every movement key clears the
/// direction; it never falls back to a key that is still held from earlier.
#[derive(Clone, Debug, Default)]
pub struct InputMapper {
    pressed: HashSet<String>,
    current: Option<Direction>,
    detached: bool,
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the key is a movement key, so the host can swallow
    /// its default action.
    pub fn key_down(&mut self, key: &str) -> bool {
        if self.detached {
            return false;
        }
        self.pressed.insert(key.to_string());
        match direction_for_key(key) {
            Some(dir) => {
                self.current = Some(dir);
                true
            }
            None => false,
        }
    }

    pub fn key_up(&mut self, key: &str) {
        if self.detached {
            return;
        }
        self.pressed.remove(key);
        let any_movement_held = self
            .pressed
            .iter()
            .any(|held| direction_for_key(held).is_some());
        if !any_movement_held {
            self.current = None;
        }
    }

    pub fn direction(&self) -> Direction {
        self.current.unwrap_or(Direction::None)
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    /// Drops all held keys and ignores later events.
    pub fn detach(&mut self) {
        self.pressed.clear();
        self.current = None;
        self.detached = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_map_to_same_direction() {
        for key in ["ArrowLeft", "a", "A"] {
            assert_eq!(direction_for_key(key), Some(Direction::Left));
        }
        assert_eq!(direction_for_key("Enter"), None);
    }

    #[test]
    fn most_recent_press_wins() {
        let mut input = InputMapper::new();
        assert!(input.key_down("ArrowUp"));
        assert!(input.key_down("d"));
        assert_eq!(input.direction(), Direction::Right);
    }

    #[test]
    fn release_does_not_fall_back_to_held_key() {
        let mut input = InputMapper::new();
        input.key_down("ArrowUp");
        input.key_down("ArrowLeft");
        input.key_up("ArrowLeft");
        // Up is still held, so the direction stays where it was.
        assert_eq!(input.direction(), Direction::Left);
        input.key_up("ArrowUp");
        assert_eq!(input.direction(), Direction::None);
    }

    #[test]
    fn non_movement_keys_do_not_keep_direction_alive() {
        let mut input = InputMapper::new();
        assert!(!input.key_down("Shift"));
        input.key_down("s");
        input.key_up("s");
        assert_eq!(input.direction(), Direction::None);
    }

    #[test]
    fn detach_clears_and_ignores_events() {
        let mut input = InputMapper::new();
        input.key_down("ArrowUp");
        input.detach();
        assert_eq!(input.direction(), Direction::None);
        assert!(!input.key_down("ArrowDown"));
        assert_eq!(input.direction(), Direction::None);
        input.detach();
        assert!(input.is_detached());
    }
}
