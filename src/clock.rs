use std::time::{Duration, Instant};

use crate::context::CancelToken;

/// Tick gate for a fixed-timestep loop.
///
/// With a period, [`Ticker::wait`] sleeps until the next deadline. A loop
/// that falls more than one period behind drops the backlog instead of
/// bursting to catch up. Without a period the loop free-runs, yielding once
/// per tick.
#[derive(Debug)]
pub struct Ticker {
    period: Option<Duration>,
    next: Instant,
}

impl Ticker {
    pub fn new(period: Option<Duration>) -> Self {
        Self {
            period,
            next: Instant::now(),
        }
    }

    /// Block until the next tick is due. Returns `false` once `cancel` has
    /// fired, `true` when the caller should run the tick.
    pub fn wait(&mut self, cancel: &CancelToken) -> bool {
        let Some(period) = self.period else {
            std::thread::yield_now();
            return !cancel.is_cancelled();
        };

        let now = Instant::now();
        if self.next > now {
            if cancel.sleep(self.next - now) {
                return false;
            }
        } else if now - self.next > period {
            self.next = now;
        }

        self.next += period;
        !cancel.is_cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_rate_paces_ticks() {
        let cancel = CancelToken::new();
        let mut ticker = Ticker::new(Some(Duration::from_millis(5)));
        let start = Instant::now();

        for _ in 0..5 {
            assert!(ticker.wait(&cancel));
        }

        // First tick is immediate, the remaining four are paced.
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn test_free_run_does_not_sleep() {
        let cancel = CancelToken::new();
        let mut ticker = Ticker::new(None);
        let start = Instant::now();
        for _ in 0..1000 {
            assert!(ticker.wait(&cancel));
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_cancel_interrupts_wait() {
        let cancel = CancelToken::new();
        let mut ticker = Ticker::new(Some(Duration::from_secs(60)));
        assert!(ticker.wait(&cancel));

        let waker = {
            let cancel = cancel.clone();
            std::thread::spawn(move || {
                std::thread::sleep(Duration::from_millis(10));
                cancel.cancel();
            })
        };

        let start = Instant::now();
        assert!(!ticker.wait(&cancel));
        assert!(start.elapsed() < Duration::from_secs(5));
        waker.join().unwrap();
    }
}
