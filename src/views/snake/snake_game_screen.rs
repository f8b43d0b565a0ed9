use iced::{
    futures::{channel::mpsc, SinkExt, Stream, StreamExt},
    keyboard::{self, Key},
    stream,
    widget::{column, container, row, text, Column, Row},
    Alignment, Border, Color, Element, Length, Subscription,
};
use log::debug;

use crate::{
    app::Message,
    models::snake::ticker::Tick,
    view::View,
    view_model::ViewModel,
    view_models::snake::snake_view_model::{format_score, SnakeBlock, SnakeViewModel},
};

/// Side length of one board cell in pixels.
pub const CELL_SIZE: u16 = 20;

#[derive(Clone, Debug)]
pub enum SnakeMessage {
    /// The tick stream is up and will forward anything sent here.
    TickerReady(mpsc::Sender<Tick>),
    Tick(Tick),
    Key(Key),
}

#[derive(Debug)]
pub struct SnakeGameScreen {
    view_model: SnakeViewModel,
    sub_key: u64,
}

impl SnakeGameScreen {
    #[must_use]
    pub fn new(view_model: SnakeViewModel, sub_key: u64) -> Self {
        Self {
            view_model,
            sub_key,
        }
    }

    fn make_tick_stream() -> impl Stream<Item = Message> {
        stream::channel(100, |mut output| async move {
            let (sender, mut receiver) = mpsc::channel::<Tick>(100);
            if let Err(e) = output
                .send(Message::Snake(SnakeMessage::TickerReady(sender)))
                .await
            {
                debug!("Problem sending TickerReady message: {e}");
                return;
            }
            while let Some(tick) = receiver.next().await {
                if let Err(e) = output.send(Message::Snake(SnakeMessage::Tick(tick))).await {
                    debug!("Problem forwarding tick: {e}");
                    break;
                }
            }
            debug!("Tick stream closed");
        })
    }

    fn scoreboard(&self) -> Row<'_, Message> {
        let score = text(format!("Score: {}", format_score(self.view_model.score()))).size(24);
        let mut board = row![score].spacing(40);
        if self.view_model.is_high_score_visible() {
            board = board.push(
                text(format!(
                    "High score: {}",
                    format_score(self.view_model.high_score())
                ))
                .size(24),
            );
        }
        board
    }
}

impl View for SnakeGameScreen {
    fn update(&mut self, message: Message) -> Option<Message> {
        self.view_model.update(message)
    }

    fn view(&self) -> Element<'_, Message> {
        let mut grid_view = Column::new();

        let make_container = |color: Color| {
            container(text(" ").color(color)) // Empty text to preserve size
                .width(CELL_SIZE)
                .height(CELL_SIZE)
                .style(move |_: &_| container::Style {
                    border: Border {
                        color: Color::from_rgba(0.0, 0.0, 0.0, 0.1),
                        width: 1.0,
                        ..Border::default()
                    },
                    background: Some(color.into()),
                    ..container::Style::default()
                })
        };

        for grid_row in self.view_model.get_ref_backing_grid() {
            let mut row = Row::new();
            for entry in grid_row {
                let rectangle = match entry {
                    SnakeBlock::Empty => make_container(Color::from_rgb(0.8, 0.85, 0.7)),
                    SnakeBlock::Apple => make_container(Color::from_rgb(0.9, 0.2, 0.2)),
                    SnakeBlock::Body => make_container(Color::from_rgb(0.25, 0.3, 0.25)),
                    SnakeBlock::Head => make_container(Color::from_rgb(0.1, 0.15, 0.1)),
                };
                row = row.push(rectangle);
            }
            grid_view = grid_view.push(row);
        }

        let mut game = column![self.scoreboard(), grid_view]
            .spacing(10)
            .align_x(Alignment::Center);
        if self.view_model.is_start_overlay_visible() {
            game = game.push(
                column![
                    text("SNAKE").size(48),
                    text("Press spacebar to start the game"),
                    text("Steer with the arrow keys or W A S D"),
                ]
                .spacing(6)
                .align_x(Alignment::Center),
            );
        }

        container(game)
            .width(Length::Fill)
            .height(Length::Fill)
            .align_x(iced::alignment::Horizontal::Center)
            .align_y(iced::alignment::Vertical::Center)
            .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        let keyboard = keyboard::on_key_press(|key, _| Some(Message::Snake(SnakeMessage::Key(key))));
        let ticks = Subscription::run_with_id(self.sub_key, Self::make_tick_stream());
        Subscription::batch(vec![keyboard, ticks])
    }
}
