//! Turns physical keys into game intents.
use iced::keyboard::{key::Named, Key};

use crate::models::snake::snake_game::Direction;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnakeInput {
    Start,
    Turn(Direction),
}

/// Arrow keys and WASD steer, space starts. Everything else is ignored.
#[must_use]
pub fn input_for_key(key: &Key) -> Option<SnakeInput> {
    match key {
        Key::Named(code) => match code {
            Named::Space => Some(SnakeInput::Start),
            Named::ArrowUp => Some(SnakeInput::Turn(Direction::Up)),
            Named::ArrowDown => Some(SnakeInput::Turn(Direction::Down)),
            Named::ArrowLeft => Some(SnakeInput::Turn(Direction::Left)),
            Named::ArrowRight => Some(SnakeInput::Turn(Direction::Right)),
            _ => None,
        },
        Key::Character(c) => match c.as_str() {
            " " => Some(SnakeInput::Start),
            "w" | "W" => Some(SnakeInput::Turn(Direction::Up)),
            "s" | "S" => Some(SnakeInput::Turn(Direction::Down)),
            "a" | "A" => Some(SnakeInput::Turn(Direction::Left)),
            "d" | "D" => Some(SnakeInput::Turn(Direction::Right)),
            _ => None,
        },
        Key::Unidentified => None,
    }
}
