pub mod snake_game;
pub mod speed_ramp;
pub mod ticker;
