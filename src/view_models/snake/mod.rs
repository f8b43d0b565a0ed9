pub mod snake_input;
pub mod snake_view_model;
