//! Adaptive countdown engine
//!
//! A countdown far from its deadline only changes once a minute, so it is
//! refreshed once a minute, on the instant its minute count rolls over.
//! Inside the last ten minutes it switches to one refresh per second. The
//! switch is delayed to the next whole wall-clock second so that every
//! countdown crossing the threshold ends up ticking in the same phase.
//!
//! [`Countdown`] holds the policy and is driven by explicit instants.
//! [`CountdownTimer`] runs it on tokio and publishes the text through a
//! watch channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::debug;

use crate::time::{Clock, MILLIS_PER_MINUTE, MILLIS_PER_SECOND, Remaining};

/// Above this many milliseconds remaining, minute cadence is used
pub const MINUTE_CADENCE_ABOVE_MS: i64 = 10 * MILLIS_PER_MINUTE;

/// How often a countdown is refreshed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cadence {
    Minute,
    Second,
}

impl Cadence {
    pub fn for_remaining(remaining: &Remaining) -> Self {
        if remaining.total_milliseconds > MINUTE_CADENCE_ABOVE_MS {
            Cadence::Minute
        } else {
            Cadence::Second
        }
    }

    pub fn period(&self) -> Duration {
        match self {
            Cadence::Minute => Duration::from_millis(MILLIS_PER_MINUTE as u64),
            Cadence::Second => Duration::from_millis(MILLIS_PER_SECOND as u64),
        }
    }

    fn period_millis(&self) -> i64 {
        match self {
            Cadence::Minute => MILLIS_PER_MINUTE,
            Cadence::Second => MILLIS_PER_SECOND,
        }
    }
}

/// When a timer first fires and how often it repeats after that
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickPlan {
    pub cadence: Cadence,
    pub first_tick_in: Duration,
}

/// Initial schedule for a countdown towards `target`
///
/// The first tick lands where the displayed unit next rolls over, so that
/// countdowns with whole-second targets change together.
pub fn plan(target: DateTime<Utc>, now: DateTime<Utc>) -> TickPlan {
    let remaining = Remaining::between(target, now);
    let cadence = Cadence::for_remaining(&remaining);
    TickPlan {
        cadence,
        first_tick_in: until_rollover(&remaining, cadence),
    }
}

/// Delay from `now` to the next whole wall-clock second, in `(0s, 1s]`
pub fn second_boundary_delay(now: DateTime<Utc>) -> Duration {
    let phase = now.timestamp_millis().rem_euclid(MILLIS_PER_SECOND);
    Duration::from_millis((MILLIS_PER_SECOND - phase) as u64)
}

/// Time until `remaining` crosses its next multiple of the cadence period
fn until_rollover(remaining: &Remaining, cadence: Cadence) -> Duration {
    let period = cadence.period_millis();
    let left = remaining.total_milliseconds.max(0) % period;
    if left == 0 {
        cadence.period()
    } else {
        Duration::from_millis(left as u64)
    }
}

/// What the driver should do after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    /// Keep the current timer
    Continue,
    /// Replace the timer: fire after `delay`, then every `cadence.period()`
    Reschedule { cadence: Cadence, delay: Duration },
    /// The target was reached; cancel the timer
    Finished,
}

/// Result of refreshing a countdown
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tick {
    pub text: String,
    pub next: Next,
}

/// Refresh policy for a single countdown
#[derive(Debug, Clone)]
pub struct Countdown {
    target: DateTime<Utc>,
    cadence: Cadence,
}

impl Countdown {
    /// Start a countdown, returning the text to show right away and the
    /// initial timer schedule
    pub fn start(target: DateTime<Utc>, now: DateTime<Utc>) -> (Self, String, TickPlan) {
        let plan = plan(target, now);
        let text = Remaining::between(target, now).to_string();
        (
            Self {
                target,
                cadence: plan.cadence,
            },
            text,
            plan,
        )
    }

    pub fn target(&self) -> DateTime<Utc> {
        self.target
    }

    pub fn cadence(&self) -> Cadence {
        self.cadence
    }

    /// Refresh at `now`
    pub fn tick(&mut self, now: DateTime<Utc>) -> Tick {
        let remaining = Remaining::between(self.target, now);
        let text = remaining.to_string();

        if remaining.is_elapsed() {
            return Tick {
                text,
                next: Next::Finished,
            };
        }

        let cadence = Cadence::for_remaining(&remaining);
        if cadence == self.cadence {
            return Tick {
                text,
                next: Next::Continue,
            };
        }

        self.cadence = cadence;
        let delay = match cadence {
            Cadence::Second => second_boundary_delay(now),
            Cadence::Minute => until_rollover(&remaining, cadence),
        };

        Tick {
            text,
            next: Next::Reschedule { cadence, delay },
        }
    }
}

/// A countdown running on tokio
///
/// The current text is published through a watch channel. Dropping the
/// timer aborts its task, so nothing is published after disposal.
#[derive(Debug)]
pub struct CountdownTimer {
    receiver: watch::Receiver<String>,
    task: JoinHandle<()>,
}

impl CountdownTimer {
    /// Start a countdown towards `target`
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn(target: DateTime<Utc>, clock: Arc<dyn Clock>) -> Self {
        let (countdown, text, plan) = Countdown::start(target, clock.now());
        let (sender, receiver) = watch::channel(text);

        let task = tokio::spawn(run(countdown, plan, clock, sender));

        Self { receiver, task }
    }

    /// Receiver notified on every refresh
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.receiver.clone()
    }

    /// Most recently published text
    pub fn current(&self) -> String {
        self.receiver.borrow().clone()
    }

    /// Whether the countdown reached its target
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for CountdownTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(
    mut countdown: Countdown,
    plan: TickPlan,
    clock: Arc<dyn Clock>,
    sender: watch::Sender<String>,
) {
    let mut timer = schedule(plan.first_tick_in, plan.cadence);

    loop {
        timer.tick().await;

        let tick = countdown.tick(clock.now());
        if sender.send(tick.text).is_err() {
            return;
        }

        match tick.next {
            Next::Continue => {}
            Next::Reschedule { cadence, delay } => {
                debug!(
                    "Countdown to {} switching to {:?} cadence in {:?}",
                    countdown.target(),
                    cadence,
                    delay
                );
                timer = schedule(delay, cadence);
            }
            Next::Finished => {
                debug!("Countdown to {} finished", countdown.target());
                return;
            }
        }
    }
}

/// A single timer handle; replacing it cancels the previous one
fn schedule(delay: Duration, cadence: Cadence) -> Interval {
    let mut timer = time::interval_at(Instant::now() + delay, cadence.period());
    timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    timer
}
