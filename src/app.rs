use iced::{Element, Subscription};
use log::debug;
use tokio::runtime::Handle;

use crate::{
    view::View,
    view_models::snake::snake_view_model::SnakeViewModel,
    views::snake::snake_game_screen::{SnakeGameScreen, SnakeMessage},
};

/// Subscription id of the game's tick stream.
const TICK_SUBSCRIPTION_KEY: u64 = 0;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures that stop the application from running.
#[derive(Debug)]
pub enum AppError {
    Runtime(std::io::Error),
    Window(iced::Error),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppError::Runtime(e) => write!(f, "could not start the async runtime: {e}"),
            AppError::Window(e) => write!(f, "could not run the game window: {e}"),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Runtime(e) => Some(e),
            AppError::Window(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Runtime(e)
    }
}

impl From<iced::Error> for AppError {
    fn from(e: iced::Error) -> Self {
        AppError::Window(e)
    }
}

#[derive(Clone, Debug)]
pub enum Message {
    Snake(SnakeMessage),
}

// https://docs.rs/iced/latest/iced/#scaling-applications
#[derive(Debug)]
pub struct State {
    screen: SnakeGameScreen,
}

impl State {
    /// Creates the application state. Ticks are spawned onto `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            screen: SnakeGameScreen::new(SnakeViewModel::new(runtime), TICK_SUBSCRIPTION_KEY),
        }
    }

    pub fn update(state: &mut State, message: Message) {
        let mut next = Some(message);
        while let Some(message) = next {
            next = state.screen.update(message);
            if let Some(follow_up) = &next {
                debug!("Screen produced follow-up message: {follow_up:?}");
            }
        }
    }

    #[must_use]
    pub fn view(state: &State) -> Element<'_, Message> {
        state.screen.view()
    }

    #[must_use]
    pub fn subscription(state: &State) -> Subscription<Message> {
        state.screen.subscription()
    }
}
