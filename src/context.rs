//! State shared between the scheduler, the renderer and input handling.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

use cgmath::Vector2;
use parking_lot::{Condvar, Mutex, MutexGuard};

use crate::error::FieldError;
use crate::field::SharedField;

/// The attraction target as one atomic word, so readers never observe an x
/// from one update paired with a y from another.
#[derive(Debug)]
pub struct SharedTarget {
    bits: AtomicU64,
}

impl SharedTarget {
    pub fn new(point: Vector2<f32>) -> Self {
        Self {
            bits: AtomicU64::new(pack(point.x, point.y)),
        }
    }

    pub fn load(&self) -> Vector2<f32> {
        let bits = self.bits.load(Ordering::Acquire);
        Vector2::new(
            f32::from_bits((bits >> 32) as u32),
            f32::from_bits(bits as u32),
        )
    }

    pub fn store(&self, x: f32, y: f32) -> Result<(), FieldError> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(FieldError::NonFiniteTarget { x, y });
        }
        self.bits.store(pack(x, y), Ordering::Release);
        Ok(())
    }
}

fn pack(x: f32, y: f32) -> u64 {
    ((x.to_bits() as u64) << 32) | y.to_bits() as u64
}

/// Cooperative cancellation observed once per tick.
///
/// Sleeping through [`CancelToken::sleep`] wakes as soon as the token fires,
/// so a paced loop never waits out a full period after shutdown.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

#[derive(Debug, Default)]
struct CancelInner {
    cancelled: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        if !self.inner.cancelled.swap(true, Ordering::AcqRel) {
            let _guard = self.inner.lock.lock();
            self.inner.wake.notify_all();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Sleep for `timeout` or until cancelled. Returns whether the token has
    /// fired.
    pub fn sleep(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut guard = self.inner.lock.lock();

        while !self.is_cancelled() {
            if self.inner.wake.wait_until(&mut guard, deadline).timed_out() {
                break;
            }
        }

        self.is_cancelled()
    }
}

/// Everything a run shares: the field, the target, the cancel signal and the
/// pause gate.
#[derive(Debug)]
pub struct SimContext {
    pub field: SharedField,
    pub target: SharedTarget,
    pub cancel: CancelToken,
    paused: AtomicBool,
    // Held by the scheduler for the duration of each tick.
    step_gate: Mutex<()>,
    ticks: AtomicU64,
    dropped_samples: AtomicU64,
}

impl SimContext {
    pub fn new(field: SharedField, target: Vector2<f32>) -> Self {
        Self {
            field,
            target: SharedTarget::new(target),
            cancel: CancelToken::new(),
            paused: AtomicBool::new(false),
            step_gate: Mutex::new(()),
            ticks: AtomicU64::new(0),
            dropped_samples: AtomicU64::new(0),
        }
    }

    /// Stop stepping. Returns once any tick already in flight has finished
    /// publishing.
    pub fn pause(&self) {
        self.paused.store(true, Ordering::SeqCst);
        drop(self.step_gate.lock());
    }

    pub fn resume(&self) {
        self.paused.store(false, Ordering::SeqCst);
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    /// Take the step gate for one tick, or `None` while paused.
    pub(crate) fn enter_tick(&self) -> Option<MutexGuard<'_, ()>> {
        let gate = self.step_gate.lock();
        if self.is_paused() {
            return None;
        }
        Some(gate)
    }

    pub(crate) fn record_tick(&self) -> u64 {
        self.ticks.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub(crate) fn record_dropped(&self, count: u64) {
        self.dropped_samples.fetch_add(count, Ordering::Relaxed);
    }

    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn dropped_samples(&self) -> u64 {
        self.dropped_samples.load(Ordering::Relaxed)
    }
}
