pub mod snake_game_screen;
