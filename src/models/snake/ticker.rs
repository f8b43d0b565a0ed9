//! Cancellable periodic tick scheduling for the [`super::snake_game::SnakeGame`].
use std::time::Duration;

use iced::futures::{channel::mpsc, SinkExt};
use log::{debug, warn};
use tokio::{
    runtime::Handle,
    time::{self, MissedTickBehavior},
};

/// One firing of a periodic schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tick {
    /// Generation of the schedule that produced this tick.
    pub generation: u64,
}

/// Handle to a running periodic schedule. Dropping it cancels the schedule.
pub struct TickHandle {
    generation: u64,
    interval: Duration,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TickHandle {
    #[must_use]
    pub fn new(generation: u64, interval: Duration, cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            generation,
            interval,
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A handle with nothing behind it.
    #[must_use]
    pub fn detached(generation: u64, interval: Duration) -> Self {
        Self {
            generation,
            interval,
            cancel: None,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Stops the schedule. No further ticks of this generation are produced.
    pub fn cancel(mut self) {
        self.fire_cancel();
    }

    fn fire_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for TickHandle {
    fn drop(&mut self) {
        self.fire_cancel();
    }
}

impl std::fmt::Debug for TickHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickHandle")
            .field("generation", &self.generation)
            .field("interval", &self.interval)
            .field("live", &self.cancel.is_some())
            .finish_non_exhaustive()
    }
}

/// Something that can fire [`Tick`]s periodically into a channel.
pub trait TickScheduler: std::fmt::Debug {
    /// Starts ticking every `interval`. The first tick lands one full interval from now.
    fn schedule(&mut self, generation: u64, interval: Duration) -> TickHandle;

    /// Sets the channel ticks are delivered to.
    fn connect(&mut self, output: mpsc::Sender<Tick>);

    fn is_connected(&self) -> bool;
}

/// [`TickScheduler`] backed by tokio tasks.
#[derive(Debug)]
pub struct TokioTicker {
    runtime: Handle,
    output: Option<mpsc::Sender<Tick>>,
}

impl TokioTicker {
    #[must_use]
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            output: None,
        }
    }

    async fn run(generation: u64, interval: Duration, mut output: mpsc::Sender<Tick>) {
        let mut timer = time::interval_at(time::Instant::now() + interval, interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            timer.tick().await;
            if let Err(e) = output.send(Tick { generation }).await {
                debug!("Tick receiver gone for generation {generation}: {e}");
                break;
            }
        }
    }
}

impl TickScheduler for TokioTicker {
    fn schedule(&mut self, generation: u64, interval: Duration) -> TickHandle {
        let Some(output) = self.output.clone() else {
            warn!("Scheduling generation {generation} before a tick channel was connected");
            return TickHandle::detached(generation, interval);
        };
        debug!("Scheduling generation {generation} every {interval:?}");
        let task = self.runtime.spawn(Self::run(generation, interval, output));
        TickHandle::new(generation, interval, move || task.abort())
    }

    fn connect(&mut self, output: mpsc::Sender<Tick>) {
        debug!("Tick channel connected");
        self.output = Some(output);
    }

    fn is_connected(&self) -> bool {
        self.output.is_some()
    }
}
