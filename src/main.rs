use iced::Task;
use log::debug;
use retro_snake::app::{self, State};

fn main() -> app::Result<()> {
    if std::env::var_os("RUST_LOG").is_none() {
        std::env::set_var("RUST_LOG", "retro_snake=debug");
    }
    env_logger::init();
    debug!("Debug on");

    let runtime = tokio::runtime::Runtime::new()?;
    let handle = runtime.handle().clone();
    iced::application("Snake", State::update, State::view)
        .window_size(iced::Size::new(600.0, 720.0))
        .subscription(State::subscription)
        .run_with(move || (State::new(handle), Task::none()))?;
    Ok(())
}
