use std::time::Duration;

use log::{debug, info};
use tokio::sync::mpsc;
use tokio::task::AbortHandle;

pub const TICK_INTERVAL: Duration = Duration::from_secs(1);

/// Scheduled wake-ups delivered to the quiz loop. The generation ties a signal
/// to the timer state that scheduled it; anything older is stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerSignal {
    Tick { generation: u64 },
    FeedbackElapsed { generation: u64 },
}

pub type SignalTx = mpsc::UnboundedSender<TimerSignal>;
pub type SignalRx = mpsc::UnboundedReceiver<TimerSignal>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerUpdate {
    Tick { seconds_remaining: u32 },
    TimeUp,
}

/// Per-question countdown. The spawned task only sends [`TimerSignal`]s; the
/// count itself lives here and is changed by the loop that owns the quiz.
pub struct QuestionTimer {
    signal_tx: SignalTx,
    generation: u64,
    seconds_remaining: u32,
    running: bool,
    tick_interval: Duration,
    tick_abort_handle: Option<AbortHandle>,
    feedback_abort_handle: Option<AbortHandle>,
}

impl QuestionTimer {
    pub fn new(signal_tx: SignalTx) -> Self {
        Self::with_tick_interval(signal_tx, TICK_INTERVAL)
    }

    pub fn with_tick_interval(signal_tx: SignalTx, tick_interval: Duration) -> Self {
        Self {
            signal_tx,
            generation: 0,
            seconds_remaining: 0,
            running: false,
            tick_interval,
            tick_abort_handle: None,
            feedback_abort_handle: None,
        }
    }

    pub fn seconds_remaining(&self) -> u32 {
        self.seconds_remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Stop everything and invalidate any signal already in flight.
    fn abort_all(&mut self) {
        if let Some(handle) = self.tick_abort_handle.take() {
            handle.abort();
        }
        if let Some(handle) = self.feedback_abort_handle.take() {
            handle.abort();
        }
        self.running = false;
        self.generation += 1;
    }

    /// Start a fresh countdown of `seconds`.
    pub fn start(&mut self, seconds: u32) {
        self.abort_all();
        self.seconds_remaining = seconds;
        debug!("Starting question timer at {seconds}s");
        self.spawn_ticker();
    }

    /// Freeze the countdown. Also drops a pending feedback delay.
    pub fn pause(&mut self) {
        self.abort_all();
        debug!("Question timer paused at {}s", self.seconds_remaining);
    }

    /// Continue from the frozen value. Does nothing if there is nothing left.
    pub fn resume(&mut self) {
        if self.running || self.seconds_remaining == 0 {
            return;
        }
        self.abort_all();
        debug!("Question timer resumed at {}s", self.seconds_remaining);
        self.spawn_ticker();
    }

    /// Cancel the countdown and any pending feedback delay.
    pub fn cancel(&mut self) {
        self.abort_all();
    }

    fn spawn_ticker(&mut self) {
        if self.seconds_remaining == 0 {
            return;
        }
        self.running = true;
        let generation = self.generation;
        let signal_tx = self.signal_tx.clone();
        let tick_interval = self.tick_interval;

        let task = tokio::spawn(async move {
            loop {
                tokio::time::sleep(tick_interval).await;
                if signal_tx.send(TimerSignal::Tick { generation }).is_err() {
                    break; // Quiz loop is gone
                }
            }
        });
        self.tick_abort_handle = Some(task.abort_handle());
    }

    /// Apply a tick. Returns `None` for stale or unexpected ticks.
    pub fn on_tick(&mut self, generation: u64) -> Option<TimerUpdate> {
        if generation != self.generation || !self.running {
            debug!("Ignoring stale timer tick (generation {generation})");
            return None;
        }
        if self.seconds_remaining == 0 {
            self.abort_all();
            return None;
        }

        self.seconds_remaining -= 1;
        if self.seconds_remaining == 0 {
            info!("Time is up");
            self.abort_all();
            Some(TimerUpdate::TimeUp)
        } else {
            Some(TimerUpdate::Tick {
                seconds_remaining: self.seconds_remaining,
            })
        }
    }

    /// Schedule the pause between scoring an answer and moving on.
    pub fn schedule_feedback(&mut self, delay: Duration) {
        self.abort_all();
        let generation = self.generation;
        let signal_tx = self.signal_tx.clone();

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = signal_tx.send(TimerSignal::FeedbackElapsed { generation });
        });
        self.feedback_abort_handle = Some(task.abort_handle());
    }

    /// True if this is the feedback delay currently scheduled.
    pub fn on_feedback_elapsed(&mut self, generation: u64) -> bool {
        if generation != self.generation || self.feedback_abort_handle.is_none() {
            debug!("Ignoring stale feedback signal (generation {generation})");
            return false;
        }
        self.feedback_abort_handle = None;
        true
    }
}

impl Drop for QuestionTimer {
    fn drop(&mut self) {
        self.abort_all();
    }
}
