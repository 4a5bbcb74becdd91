//! Tick-driven timers.
//!
//! Nothing here sleeps. The host loop advances timers with the elapsed
//! tick time and reacts to the fires they report, which keeps deferred
//! work cancellable and the loop free of blocking waits.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    OneShot,
    Repeating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerState {
    Armed,
    Fired,
    Cancelled,
}

#[derive(Debug, Clone)]
pub struct Timer {
    kind: TimerKind,
    period: Duration,
    elapsed: Duration,
    state: TimerState,
}

impl Timer {
    /// Fires once after `delay`.
    pub fn one_shot(delay: Duration) -> Self {
        Self::new(TimerKind::OneShot, delay)
    }

    /// Fires every `period`.
    pub fn repeating(period: Duration) -> Self {
        Self::new(TimerKind::Repeating, period)
    }

    fn new(kind: TimerKind, period: Duration) -> Self {
        Self {
            kind,
            period,
            elapsed: Duration::ZERO,
            state: TimerState::Armed,
        }
    }

    pub fn kind(&self) -> TimerKind {
        self.kind
    }

    /// Advance by `dt` and return how many times the timer fired.
    ///
    /// A cancelled or already-fired one-shot timer never fires again.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        if self.state != TimerState::Armed {
            return 0;
        }
        self.elapsed += dt;

        match self.kind {
            TimerKind::OneShot => {
                if self.elapsed >= self.period {
                    self.state = TimerState::Fired;
                    1
                } else {
                    0
                }
            }
            TimerKind::Repeating if self.period.is_zero() => 1,
            TimerKind::Repeating => {
                let mut fires = 0;
                while self.elapsed >= self.period {
                    self.elapsed -= self.period;
                    fires += 1;
                }
                fires
            }
        }
    }

    pub fn cancel(&mut self) {
        self.state = TimerState::Cancelled;
    }

    pub fn is_armed(&self) -> bool {
        self.state == TimerState::Armed
    }

    pub fn is_cancelled(&self) -> bool {
        self.state == TimerState::Cancelled
    }

    /// Time left until the next fire, zero once fired or cancelled.
    pub fn remaining(&self) -> Duration {
        if self.is_armed() {
            self.period.saturating_sub(self.elapsed)
        } else {
            Duration::ZERO
        }
    }
}

/// Converts variable frame time into a whole number of fixed ticks.
#[derive(Debug, Clone)]
pub struct FixedStep {
    step: Duration,
    accumulator: Duration,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        Self {
            step: step.max(Duration::from_micros(1)),
            accumulator: Duration::ZERO,
        }
    }

    pub fn step(&self) -> Duration {
        self.step
    }

    /// Add elapsed frame time and return the number of fixed ticks now due.
    pub fn advance(&mut self, dt: Duration) -> u32 {
        self.accumulator += dt;
        let mut ticks = 0;
        while self.accumulator >= self.step {
            self.accumulator -= self.step;
            ticks += 1;
        }
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECOND: Duration = Duration::from_secs(1);

    #[test]
    fn test_one_shot_fires_once() {
        let mut timer = Timer::one_shot(Duration::from_secs(2));
        assert_eq!(timer.advance(SECOND), 0);
        assert_eq!(timer.remaining(), SECOND);
        assert_eq!(timer.advance(SECOND), 1);
        assert_eq!(timer.advance(SECOND * 10), 0);
        assert!(!timer.is_armed());
    }

    #[test]
    fn test_cancelled_one_shot_never_fires() {
        let mut timer = Timer::one_shot(Duration::from_secs(2));
        timer.advance(SECOND);
        timer.cancel();
        assert_eq!(timer.advance(SECOND * 5), 0);
        assert!(timer.is_cancelled());
    }

    #[test]
    fn test_repeating_keeps_phase() {
        let mut timer = Timer::repeating(Duration::from_secs(5));
        let fires: u32 = (0..12).map(|_| timer.advance(SECOND)).sum();
        assert_eq!(fires, 2);
        assert_eq!(timer.remaining(), Duration::from_secs(3));
        assert_eq!(timer.advance(Duration::from_secs(13)), 3);
    }

    #[test]
    fn test_fixed_step_accumulates() {
        let mut step = FixedStep::new(Duration::from_millis(20));
        assert_eq!(step.advance(Duration::from_millis(15)), 0);
        assert_eq!(step.advance(Duration::from_millis(15)), 1);
        assert_eq!(step.advance(Duration::from_millis(50)), 2);
    }
}
