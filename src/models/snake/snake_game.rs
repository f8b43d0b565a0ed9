use std::{collections::VecDeque, time::Duration};

use log::{debug, info};
use rand::Rng;

use super::{
    speed_ramp::{next_speed, INITIAL_SPEED_MILLIS},
    ticker::{Tick, TickHandle, TickScheduler},
};

/// Number of cells along each side of the board.
pub const GRID_SIZE: i32 = 20;
/// Where the snake's single segment sits after every reset.
pub const START_CELL: Cell = Cell::new(10, 10);

/// A square on the board. Both coordinates are 1-indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    #[must_use]
    pub fn moved(self, direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::new(self.x + dx, self.y + dy)
    }

    #[must_use]
    pub fn in_bounds(self, size: i32) -> bool {
        (1..=size).contains(&self.x) && (1..=size).contains(&self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    /// (dx, dy) of one step. y grows downwards.
    #[must_use]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
        }
    }

    #[must_use]
    pub fn get_opposite(self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }

    #[must_use]
    pub fn is_opposite(self, other: Direction) -> bool {
        self.get_opposite() == other
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    NotStarted,
    Running,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollisionType {
    Wall,
    SelfCollision,
}

/// What a single call to [`SnakeGame::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The game was not running.
    Idle,
    Moved,
    Ate,
    /// The snake crashed and the game was reset.
    Collided(CollisionType),
}

/// Model of the single player snake game.
///
/// Ticks are driven by the owned [`TickScheduler`]. The game keeps the handle of
/// the live schedule and replaces it whenever the speed changes, so the tick
/// clock restarts from the moment an apple is eaten.
#[derive(Debug)]
pub struct SnakeGame<S: TickScheduler> {
    snake: VecDeque<Cell>,
    food: Cell,
    direction: Direction,
    pending_direction: Direction,
    speed_millis: u64,
    state: GameState,
    high_score: usize,
    high_score_visible: bool,
    generation: u64,
    ticker: Option<TickHandle>,
    scheduler: S,
}

impl<S: TickScheduler> SnakeGame<S> {
    #[must_use]
    pub fn new(scheduler: S) -> Self {
        Self {
            snake: VecDeque::from([START_CELL]),
            food: Self::generate_food(),
            direction: Direction::Right,
            pending_direction: Direction::Right,
            speed_millis: INITIAL_SPEED_MILLIS,
            state: GameState::NotStarted,
            high_score: 0,
            high_score_visible: false,
            generation: 0,
            ticker: None,
            scheduler,
        }
    }

    /// Starts ticking. Does nothing if the game is already running.
    pub fn start(&mut self) -> bool {
        if self.state == GameState::Running {
            debug!("Start requested while already running");
            return false;
        }
        info!("Game started");
        self.state = GameState::Running;
        self.schedule_ticks();
        true
    }

    /// Advances the snake one cell.
    pub fn tick(&mut self) -> TickOutcome {
        if self.state != GameState::Running {
            debug!("Tick received while not running. Ignoring");
            return TickOutcome::Idle;
        }
        self.direction = self.pending_direction;
        let new_head = self.head().moved(self.direction);
        self.snake.push_front(new_head);

        let ate = new_head == self.food;
        if ate {
            self.food = Self::generate_food();
            self.speed_millis = next_speed(self.speed_millis);
            debug!(
                "Apple eaten. Length {} speed {}ms next apple at {:?}",
                self.snake.len(),
                self.speed_millis,
                self.food
            );
            self.schedule_ticks();
        } else {
            self.snake.pop_back();
        }

        if let Some(collision) = self.check_collision() {
            info!("Collision ({collision:?}) at {new_head:?} with score {}", self.score());
            self.reset();
            return TickOutcome::Collided(collision);
        }
        if ate {
            TickOutcome::Ate
        } else {
            TickOutcome::Moved
        }
    }

    /// Ends the round and puts everything back to its starting state.
    /// The high score survives.
    pub fn reset(&mut self) {
        let score = self.score();
        if score > self.high_score {
            info!("New high score {score}");
            self.high_score = score;
        }
        self.high_score_visible = true;
        self.stop_ticks();
        self.state = GameState::NotStarted;
        self.snake = VecDeque::from([START_CELL]);
        self.food = Self::generate_food();
        self.direction = Direction::Right;
        self.pending_direction = Direction::Right;
        self.speed_millis = INITIAL_SPEED_MILLIS;
    }

    /// Queues a turn for the next tick.
    /// Returns false, changing nothing, if it would reverse the snake.
    pub fn set_direction(&mut self, requested: Direction) -> bool {
        if requested.is_opposite(self.direction) {
            debug!("Ignoring reversal from {:?} to {requested:?}", self.direction);
            return false;
        }
        self.pending_direction = requested;
        true
    }

    /// Whether `tick` came from the schedule currently in effect.
    #[must_use]
    pub fn is_current_tick(&self, tick: Tick) -> bool {
        self.ticker
            .as_ref()
            .is_some_and(|handle| handle.generation() == tick.generation)
    }

    #[must_use]
    pub fn score(&self) -> usize {
        self.snake.len() - 1
    }

    #[must_use]
    pub fn high_score(&self) -> usize {
        self.high_score
    }

    #[must_use]
    pub fn is_high_score_visible(&self) -> bool {
        self.high_score_visible
    }

    #[must_use]
    pub fn snake(&self) -> &VecDeque<Cell> {
        &self.snake
    }

    /// Returns the head of the snake.
    ///
    /// The snake is never empty: it is built with one segment and a tick pushes
    /// the new head before it pops the tail. The fallback only exists so a
    /// release build cannot panic here.
    #[must_use]
    pub fn head(&self) -> Cell {
        debug_assert!(!self.snake.is_empty(), "snake lost its last segment");
        self.snake.front().copied().unwrap_or(START_CELL)
    }

    #[must_use]
    pub fn food(&self) -> Cell {
        self.food
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn speed_millis(&self) -> u64 {
        self.speed_millis
    }

    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == GameState::Running
    }

    #[must_use]
    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut S {
        &mut self.scheduler
    }

    fn check_collision(&self) -> Option<CollisionType> {
        let head = self.head();
        if !head.in_bounds(GRID_SIZE) {
            return Some(CollisionType::Wall);
        }
        if self.snake.iter().skip(1).any(|segment| *segment == head) {
            return Some(CollisionType::SelfCollision);
        }
        None
    }

    // Food may land on the snake. That is how the game has always played.
    fn generate_food() -> Cell {
        let mut rng = rand::thread_rng();
        Cell::new(rng.gen_range(1..=GRID_SIZE), rng.gen_range(1..=GRID_SIZE))
    }

    fn schedule_ticks(&mut self) {
        self.stop_ticks();
        self.generation += 1;
        self.ticker = Some(
            self.scheduler
                .schedule(self.generation, Duration::from_millis(self.speed_millis)),
        );
    }

    fn stop_ticks(&mut self) {
        if let Some(handle) = self.ticker.take() {
            debug!("Cancelling tick generation {}", handle.generation());
            handle.cancel();
        }
    }
}

#[cfg(test)]
impl<S: TickScheduler> SnakeGame<S> {
    pub(crate) fn place(&mut self, snake: &[Cell], food: Cell, direction: Direction) {
        self.snake = snake.iter().copied().collect();
        self.food = food;
        self.direction = direction;
        self.pending_direction = direction;
    }

    pub(crate) fn set_speed_millis(&mut self, speed_millis: u64) {
        self.speed_millis = speed_millis;
    }
}

#[cfg(test)]
mod tests {
    use super::super::ticker::testing::RecordingScheduler;
    use super::*;

    fn running_game() -> SnakeGame<RecordingScheduler> {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut game = SnakeGame::new(RecordingScheduler::connected());
        assert!(game.start());
        game
    }

    #[test]
    fn test_new_game() {
        let game = SnakeGame::new(RecordingScheduler::default());
        assert_eq!(game.state(), GameState::NotStarted);
        assert_eq!(game.snake().len(), 1);
        assert_eq!(game.head(), START_CELL);
        assert_eq!(game.direction(), Direction::Right);
        assert_eq!(game.speed_millis(), INITIAL_SPEED_MILLIS);
        assert_eq!(game.score(), 0);
        assert!(!game.is_high_score_visible());
        assert!(game.food().in_bounds(GRID_SIZE));
        assert!(game.scheduler().scheduled.is_empty());
    }

    #[test]
    fn test_food_covers_whole_grid() {
        let (mut min_seen, mut max_seen) = (false, false);
        for _ in 0..20_000 {
            let food = SnakeGame::<RecordingScheduler>::generate_food();
            assert!(food.in_bounds(GRID_SIZE), "{food:?}");
            min_seen |= food.x == 1 || food.y == 1;
            max_seen |= food.x == GRID_SIZE || food.y == GRID_SIZE;
        }
        assert!(min_seen, "row/column 1 never drawn");
        assert!(max_seen, "row/column {GRID_SIZE} never drawn");
    }

    #[test]
    fn test_food_on_body_is_kept() {
        let mut game = running_game();
        game.place(
            &[Cell::new(10, 10), Cell::new(9, 10), Cell::new(8, 10)],
            Cell::new(8, 10),
            Direction::Right,
        );
        // Moving away from the apple never eats it. It stays where it spawned.
        assert_eq!(game.tick(), TickOutcome::Moved);
        assert_eq!(game.food(), Cell::new(8, 10));
        assert_eq!(game.score(), 2);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "snake lost its last segment")]
    fn test_empty_snake_is_caught() {
        let mut game = running_game();
        game.place(&[], Cell::new(5, 5), Direction::Right);
        let _ = game.head();
    }

    #[test]
    fn test_start_is_idempotent() {
        let mut game = running_game();
        assert!(!game.start());
        assert_eq!(game.scheduler().scheduled, vec![(1, Duration::from_millis(200))]);
        assert!(game.is_current_tick(Tick { generation: 1 }));
    }

    #[test]
    fn test_tick_before_start_is_ignored() {
        let mut game = SnakeGame::new(RecordingScheduler::default());
        assert_eq!(game.tick(), TickOutcome::Idle);
        assert_eq!(game.head(), START_CELL);
        assert!(!game.is_current_tick(Tick { generation: 0 }));
    }

    #[test]
    fn test_move_drops_tail() {
        let mut game = running_game();
        game.place(
            &[Cell::new(5, 5), Cell::new(4, 5), Cell::new(3, 5)],
            Cell::new(15, 15),
            Direction::Right,
        );

        assert_eq!(game.tick(), TickOutcome::Moved);
        let body: Vec<Cell> = game.snake().iter().copied().collect();
        assert_eq!(body, vec![Cell::new(6, 5), Cell::new(5, 5), Cell::new(4, 5)]);
        assert_eq!(game.score(), 2);
        assert_eq!(game.speed_millis(), INITIAL_SPEED_MILLIS);
    }

    #[test]
    fn test_eating_grows_and_speeds_up() {
        let mut game = running_game();
        game.place(&[Cell::new(10, 10)], Cell::new(11, 10), Direction::Right);

        assert_eq!(game.tick(), TickOutcome::Ate);
        let body: Vec<Cell> = game.snake().iter().copied().collect();
        assert_eq!(body, vec![Cell::new(11, 10), Cell::new(10, 10)]);
        assert_eq!(game.score(), 1);
        assert_eq!(game.speed_millis(), 195);
        assert!(game.food().in_bounds(GRID_SIZE));
    }

    #[test]
    fn test_eating_cancels_and_reschedules() {
        let mut game = running_game();
        game.place(&[Cell::new(10, 10)], Cell::new(11, 10), Direction::Right);
        game.tick();

        assert_eq!(
            game.scheduler().scheduled,
            vec![(1, Duration::from_millis(200)), (2, Duration::from_millis(195))]
        );
        assert_eq!(game.scheduler().cancelled(), vec![1]);
        assert!(!game.is_current_tick(Tick { generation: 1 }));
        assert!(game.is_current_tick(Tick { generation: 2 }));
    }

    #[test]
    fn test_speed_stays_at_floor() {
        let mut game = running_game();
        game.set_speed_millis(25);
        game.place(&[Cell::new(10, 10)], Cell::new(11, 10), Direction::Right);
        assert_eq!(game.tick(), TickOutcome::Ate);
        assert_eq!(game.speed_millis(), 25);
    }

    #[test]
    fn test_wall_collision_resets() {
        let mut game = running_game();
        game.place(
            &[Cell::new(1, 10), Cell::new(2, 10)],
            Cell::new(15, 15),
            Direction::Left,
        );

        assert_eq!(game.tick(), TickOutcome::Collided(CollisionType::Wall));
        assert_eq!(game.state(), GameState::NotStarted);
        let body: Vec<Cell> = game.snake().iter().copied().collect();
        assert_eq!(body, vec![START_CELL]);
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 1);
        assert!(game.is_high_score_visible());
        assert_eq!(game.scheduler().cancelled(), vec![1]);
        assert!(!game.is_current_tick(Tick { generation: 1 }));
    }

    #[test]
    fn test_every_wall_collides() {
        let edges = [
            (Cell::new(10, 1), Direction::Up),
            (Cell::new(10, GRID_SIZE), Direction::Down),
            (Cell::new(1, 10), Direction::Left),
            (Cell::new(GRID_SIZE, 10), Direction::Right),
        ];
        for (cell, direction) in edges {
            let mut game = running_game();
            game.place(&[cell], Cell::new(5, 5), direction);
            assert_eq!(
                game.tick(),
                TickOutcome::Collided(CollisionType::Wall),
                "{direction:?} from {cell:?}"
            );
        }
    }

    #[test]
    fn test_self_collision_resets() {
        let mut game = running_game();
        // Head at (5,5) moving up into (5,4), which is still occupied after the tail moves.
        game.place(
            &[
                Cell::new(5, 5),
                Cell::new(6, 5),
                Cell::new(6, 4),
                Cell::new(5, 4),
                Cell::new(4, 4),
            ],
            Cell::new(15, 15),
            Direction::Left,
        );
        assert!(game.set_direction(Direction::Up));

        assert_eq!(game.tick(), TickOutcome::Collided(CollisionType::SelfCollision));
        assert_eq!(game.snake().len(), 1);
        assert_eq!(game.direction(), Direction::Right);
        assert_eq!(game.high_score(), 4);
    }

    #[test]
    fn test_following_tail_is_safe() {
        let mut game = running_game();
        // A 2x2 loop: the head moves into the cell the tail leaves this tick.
        game.place(
            &[Cell::new(5, 5), Cell::new(6, 5), Cell::new(6, 4), Cell::new(5, 4)],
            Cell::new(15, 15),
            Direction::Left,
        );
        assert!(game.set_direction(Direction::Up));
        assert_eq!(game.tick(), TickOutcome::Moved);
        assert_eq!(game.head(), Cell::new(5, 4));
    }

    #[test]
    fn test_reversal_rejected() {
        let mut game = running_game();
        assert!(!game.set_direction(Direction::Left));
        game.tick();
        assert_eq!(game.direction(), Direction::Right);
        assert_eq!(game.head(), Cell::new(11, 10));
    }

    #[test]
    fn test_reversal_guard_uses_direction_before_tick() {
        let mut game = running_game();
        game.place(&[Cell::new(10, 10), Cell::new(9, 10)], Cell::new(15, 15), Direction::Right);

        assert!(game.set_direction(Direction::Up));
        // Still moving right until the next tick, so left is a reversal.
        assert!(!game.set_direction(Direction::Left));
        assert_eq!(game.tick(), TickOutcome::Moved);
        assert_eq!(game.direction(), Direction::Up);
        assert_eq!(game.head(), Cell::new(10, 9));

        assert!(game.set_direction(Direction::Left));
        game.tick();
        assert_eq!(game.head(), Cell::new(9, 9));
    }

    #[test]
    fn test_turn_queued_before_start() {
        let mut game = SnakeGame::new(RecordingScheduler::connected());
        assert!(game.set_direction(Direction::Down));
        assert!(game.start());
        game.tick();
        assert_eq!(game.head(), Cell::new(10, 11));
    }

    #[test]
    fn test_high_score_never_decreases() {
        let mut game = running_game();
        game.place(
            &[Cell::new(1, 10), Cell::new(2, 10), Cell::new(3, 10), Cell::new(4, 10)],
            Cell::new(15, 15),
            Direction::Left,
        );
        game.tick();
        assert_eq!(game.high_score(), 3);

        game.start();
        game.place(&[Cell::new(1, 10), Cell::new(2, 10)], Cell::new(15, 15), Direction::Left);
        game.tick();
        assert_eq!(game.high_score(), 3);

        game.reset();
        assert_eq!(game.high_score(), 3);
        assert!(game.is_high_score_visible());
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut game = running_game();
        game.place(&[Cell::new(3, 3), Cell::new(3, 4)], Cell::new(3, 2), Direction::Up);
        game.tick();
        assert_eq!(game.speed_millis(), 195);

        game.reset();
        assert_eq!(game.state(), GameState::NotStarted);
        assert_eq!(game.head(), START_CELL);
        assert_eq!(game.direction(), Direction::Right);
        assert_eq!(game.speed_millis(), INITIAL_SPEED_MILLIS);
        assert_eq!(game.score(), 0);
        assert_eq!(game.high_score(), 2);
        assert_eq!(game.tick(), TickOutcome::Idle);

        assert!(game.start());
        assert_eq!(game.scheduler().scheduled.last(), Some(&(3, Duration::from_millis(200))));
    }
}
