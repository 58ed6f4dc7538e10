use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, instrument};

use crate::desk::Desk;
use crate::timer::{Tick, TimerEvent};

pub type SharedDesk = Arc<Mutex<Desk>>;

pub const DEFAULT_TICK_PERIOD: Duration = Duration::from_secs(1);

/// Drives a desk's focus timer from a scheduled tokio task. Holds at most
/// one live task; it is aborted on pause, on drop and before a restart.
#[derive(Debug)]
pub struct FocusTicker {
    desk: SharedDesk,
    period: Duration,
    events: mpsc::UnboundedSender<TimerEvent>,
    handle: Option<JoinHandle<()>>,
}

impl FocusTicker {
    pub fn new(
        desk: SharedDesk,
        period: Duration,
        events: mpsc::UnboundedSender<TimerEvent>,
    ) -> Self {
        Self {
            desk,
            period,
            events,
            handle: None,
        }
    }

    pub fn desk(&self) -> &SharedDesk {
        &self.desk
    }

    /// Must be called from within a tokio runtime.
    #[instrument(skip(self))]
    pub fn start(&mut self) -> bool {
        self.cancel();
        if !self.desk.lock().start_timer() {
            debug!("timer did not start; no tick task scheduled");
            return false;
        }

        let desk = Arc::clone(&self.desk);
        let events = self.events.clone();
        let period = self.period;
        self.handle = Some(tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                let outcome = desk.lock().tick();
                match outcome {
                    Tick::Counted { time_left } => {
                        tracing::trace!(time_left, "tick");
                    }
                    Tick::Expired(event) => {
                        info!(?event, "segment expired");
                        let _ = events.send(event);
                        break;
                    }
                    Tick::Ignored => break,
                }
            }
            debug!("tick task finished");
        }));
        true
    }

    #[instrument(skip(self))]
    pub fn pause(&mut self) {
        self.cancel();
        self.desk.lock().pause_timer();
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("cancelling tick task");
            handle.abort();
        }
    }

    pub fn is_live(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Resolves once the live tick task, if any, has stopped by itself.
    pub async fn finished(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for FocusTicker {
    fn drop(&mut self) {
        self.cancel();
    }
}
