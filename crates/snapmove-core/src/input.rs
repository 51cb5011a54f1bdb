//! Raw pointer/keyboard input and its mapping to session events.

use crate::geometry::Axis;
use crate::session::SnapEvent;
use kurbo::{Point, Vec2};
use serde::{Deserialize, Serialize};

/// Mouse button identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Modifier keys state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer event type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PointerEvent {
    Down { position: Point, button: MouseButton },
    Up { position: Point, button: MouseButton },
    Move { position: Point },
    Scroll { position: Point, delta: Vec2 },
}

/// Keyboard event type. Keys use their logical names ("Escape", "Enter",
/// "NumpadEnter", "Shift", "x", ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum KeyEvent {
    Pressed(String),
    Released(String),
}

/// Any raw input event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum InputEvent {
    Pointer(PointerEvent),
    Key(KeyEvent),
}

/// What to do with a raw event while a session runs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// Forward to the session.
    Session(SnapEvent),
    /// Leave to the host (viewport navigation).
    PassThrough,
    /// Swallow without effect.
    Consumed,
}

/// Maps raw input to [`Dispatch`] decisions, tracking modifier keys.
#[derive(Debug, Clone, Default)]
pub struct InputTranslator {
    pub modifiers: Modifiers,
}

impl InputTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(&mut self, event: &InputEvent) -> Dispatch {
        match event {
            InputEvent::Pointer(pointer) => self.translate_pointer(pointer),
            InputEvent::Key(key) => self.translate_key(key),
        }
    }

    pub fn translate_pointer(&mut self, event: &PointerEvent) -> Dispatch {
        match *event {
            PointerEvent::Move { position } => Dispatch::Session(SnapEvent::PointerMoved(position)),
            PointerEvent::Down { button: MouseButton::Left, .. } => Dispatch::Session(SnapEvent::Confirm),
            PointerEvent::Down { button: MouseButton::Right, .. } => {
                Dispatch::Session(SnapEvent::HardSnap(true))
            }
            PointerEvent::Up { button: MouseButton::Right, .. } => {
                Dispatch::Session(SnapEvent::HardSnap(false))
            }
            PointerEvent::Down { button: MouseButton::Middle, .. }
            | PointerEvent::Up { button: MouseButton::Middle, .. }
            | PointerEvent::Scroll { .. } => Dispatch::PassThrough,
            PointerEvent::Up { button: MouseButton::Left, .. } => Dispatch::Consumed,
        }
    }

    pub fn translate_key(&mut self, event: &KeyEvent) -> Dispatch {
        match event {
            KeyEvent::Pressed(key) => {
                if self.set_modifier(key, true) {
                    return Dispatch::Consumed;
                }
                match key.as_str() {
                    "Escape" => Dispatch::Session(SnapEvent::Cancel),
                    "Enter" | "NumpadEnter" => Dispatch::Session(SnapEvent::Confirm),
                    other => match Axis::from_key(other) {
                        Some(axis) => Dispatch::Session(SnapEvent::ToggleConstraint {
                            axis,
                            plane: self.modifiers.shift,
                        }),
                        None => Dispatch::Consumed,
                    },
                }
            }
            KeyEvent::Released(key) => {
                self.set_modifier(key, false);
                Dispatch::Consumed
            }
        }
    }

    /// Update modifier state; returns whether `key` is a modifier.
    fn set_modifier(&mut self, key: &str, down: bool) -> bool {
        match key {
            "Shift" => self.modifiers.shift = down,
            "Control" => self.modifiers.ctrl = down,
            "Alt" => self.modifiers.alt = down,
            "Meta" => self.modifiers.meta = down,
            _ => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed(key: &str) -> InputEvent {
        InputEvent::Key(KeyEvent::Pressed(key.to_string()))
    }

    fn released(key: &str) -> InputEvent {
        InputEvent::Key(KeyEvent::Released(key.to_string()))
    }

    #[test]
    fn test_confirm_and_cancel() {
        let mut t = InputTranslator::new();
        assert_eq!(t.translate(&pressed("Escape")), Dispatch::Session(SnapEvent::Cancel));
        assert_eq!(t.translate(&pressed("Enter")), Dispatch::Session(SnapEvent::Confirm));
        assert_eq!(t.translate(&pressed("NumpadEnter")), Dispatch::Session(SnapEvent::Confirm));
        let click = InputEvent::Pointer(PointerEvent::Down {
            position: Point::new(10.0, 10.0),
            button: MouseButton::Left,
        });
        assert_eq!(t.translate(&click), Dispatch::Session(SnapEvent::Confirm));
    }

    #[test]
    fn test_right_button_hard_snap() {
        let mut t = InputTranslator::new();
        let down = PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Right,
        };
        let up = PointerEvent::Up {
            position: Point::ZERO,
            button: MouseButton::Right,
        };
        assert_eq!(t.translate_pointer(&down), Dispatch::Session(SnapEvent::HardSnap(true)));
        assert_eq!(t.translate_pointer(&up), Dispatch::Session(SnapEvent::HardSnap(false)));
    }

    #[test]
    fn test_axis_and_plane_keys() {
        let mut t = InputTranslator::new();
        assert_eq!(
            t.translate(&pressed("x")),
            Dispatch::Session(SnapEvent::ToggleConstraint { axis: Axis::X, plane: false })
        );
        assert_eq!(t.translate(&pressed("Shift")), Dispatch::Consumed);
        assert_eq!(
            t.translate(&pressed("Z")),
            Dispatch::Session(SnapEvent::ToggleConstraint { axis: Axis::Z, plane: true })
        );
        t.translate(&released("Shift"));
        assert_eq!(
            t.translate(&pressed("y")),
            Dispatch::Session(SnapEvent::ToggleConstraint { axis: Axis::Y, plane: false })
        );
    }

    #[test]
    fn test_navigation_passes_through() {
        let mut t = InputTranslator::new();
        let scroll = PointerEvent::Scroll {
            position: Point::ZERO,
            delta: Vec2::new(0.0, 3.0),
        };
        let middle = PointerEvent::Down {
            position: Point::ZERO,
            button: MouseButton::Middle,
        };
        assert_eq!(t.translate_pointer(&scroll), Dispatch::PassThrough);
        assert_eq!(t.translate_pointer(&middle), Dispatch::PassThrough);
    }

    #[test]
    fn test_other_input_consumed() {
        let mut t = InputTranslator::new();
        assert_eq!(t.translate(&pressed("Control")), Dispatch::Consumed);
        assert!(t.modifiers.ctrl);
        // Ctrl+S must not reach the host.
        assert_eq!(t.translate(&pressed("s")), Dispatch::Consumed);
        assert_eq!(t.translate(&released("Control")), Dispatch::Consumed);
        assert!(!t.modifiers.ctrl);
        let left_up = PointerEvent::Up {
            position: Point::ZERO,
            button: MouseButton::Left,
        };
        assert_eq!(t.translate_pointer(&left_up), Dispatch::Consumed);
    }

    #[test]
    fn test_pointer_move() {
        let mut t = InputTranslator::new();
        let p = Point::new(12.0, 34.0);
        assert_eq!(
            t.translate_pointer(&PointerEvent::Move { position: p }),
            Dispatch::Session(SnapEvent::PointerMoved(p))
        );
    }
}
