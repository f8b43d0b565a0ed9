use log::{debug, info, warn};
use tokio::runtime::Handle;

use crate::{
    app::Message,
    models::snake::{
        snake_game::{Cell, SnakeGame, TickOutcome, GRID_SIZE},
        ticker::{TickScheduler, TokioTicker},
    },
    view_model::ViewModel,
    views::snake::snake_game_screen::SnakeMessage,
};

use super::snake_input::{input_for_key, SnakeInput};

/// What to paint in one cell of the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SnakeBlock {
    Empty,
    Apple,
    Body,
    Head,
}

#[derive(Debug)]
pub struct SnakeViewModel<S: TickScheduler = TokioTicker> {
    game: SnakeGame<S>,
    backing_grid: Vec<Vec<SnakeBlock>>,
}

impl SnakeViewModel<TokioTicker> {
    /// Creates a view model whose ticks run on `runtime`.
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self::with_scheduler(TokioTicker::new(runtime))
    }
}

impl<S: TickScheduler> SnakeViewModel<S> {
    #[must_use]
    pub fn with_scheduler(scheduler: S) -> Self {
        let mut view_model = Self {
            game: SnakeGame::new(scheduler),
            backing_grid: Vec::new(),
        };
        view_model.refresh_grid();
        view_model
    }

    fn refresh_grid(&mut self) {
        let size = usize::try_from(GRID_SIZE).unwrap_or_default();
        let mut grid = vec![vec![SnakeBlock::Empty; size]; size];
        let mut paint = |cell: Cell, block| {
            let (Ok(x), Ok(y)) = (usize::try_from(cell.x - 1), usize::try_from(cell.y - 1)) else {
                return;
            };
            if let Some(entry) = grid.get_mut(y).and_then(|row| row.get_mut(x)) {
                *entry = block;
            }
        };
        if self.game.is_running() {
            paint(self.game.food(), SnakeBlock::Apple);
        }
        for segment in self.game.snake().iter().skip(1) {
            paint(*segment, SnakeBlock::Body);
        }
        paint(self.game.head(), SnakeBlock::Head);
        self.backing_grid = grid;
    }

    fn handle_input(&mut self, input: SnakeInput) {
        match input {
            SnakeInput::Start => {
                if self.game.is_running() {
                    return;
                }
                if !self.game.scheduler().is_connected() {
                    warn!("Start pressed before the tick channel was ready");
                    return;
                }
                self.game.start();
            }
            SnakeInput::Turn(direction) => {
                self.game.set_direction(direction);
            }
        }
    }

    #[must_use]
    pub fn get_ref_backing_grid(&self) -> &Vec<Vec<SnakeBlock>> {
        &self.backing_grid
    }

    #[cfg(test)]
    pub(crate) fn get_game(&self) -> &SnakeGame<S> {
        &self.game
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.game.score()
    }

    #[must_use]
    pub fn high_score(&self) -> usize {
        self.game.high_score()
    }

    #[must_use]
    pub fn is_high_score_visible(&self) -> bool {
        self.game.is_high_score_visible()
    }

    /// The logo and instructions show whenever the game is not running.
    #[must_use]
    pub fn is_start_overlay_visible(&self) -> bool {
        !self.game.is_running()
    }
}

/// Formats a score the way the scoreboard shows it.
#[must_use]
pub fn format_score(score: usize) -> String {
    format!("{score:03}")
}

impl<S: TickScheduler> ViewModel for SnakeViewModel<S> {
    fn update(&mut self, message: Message) -> Option<Message> {
        let Message::Snake(snake_message) = message;
        match snake_message {
            SnakeMessage::TickerReady(sender) => {
                self.game.scheduler_mut().connect(sender);
            }
            SnakeMessage::Tick(tick) => {
                if !self.game.is_current_tick(tick) {
                    debug!("Dropping stale tick from generation {}", tick.generation);
                    return None;
                }
                if let TickOutcome::Collided(collision) = self.game.tick() {
                    info!(
                        "Round over ({collision:?}). High score {}",
                        self.game.high_score()
                    );
                }
                self.refresh_grid();
            }
            SnakeMessage::Key(key) => {
                if let Some(input) = input_for_key(&key) {
                    self.handle_input(input);
                    self.refresh_grid();
                }
            }
        }
        None
    }
}
