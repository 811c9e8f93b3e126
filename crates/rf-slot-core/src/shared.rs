//! Shared machine handle with overlapping-spin rejection

use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, MutexGuard};

use crate::engine::SlotMachine;
use crate::error::{SlotError, SlotResult};
use crate::spin::SpinOutcome;

/// Cloneable handle to one machine
///
/// A spin holds the machine for its whole duration, reveal delay included.
/// A second spin requested meanwhile fails with `SpinInProgress` instead of
/// waiting.
#[derive(Clone)]
pub struct SharedSlotMachine {
    inner: Arc<Mutex<SlotMachine>>,
}

/// Exclusive access to the machine for one spin
pub struct SpinSession<'a> {
    machine: MutexGuard<'a, SlotMachine>,
}

impl SharedSlotMachine {
    pub fn new(machine: SlotMachine) -> Self {
        Self {
            inner: Arc::new(Mutex::new(machine)),
        }
    }

    /// Claim the machine, failing if a spin already holds it
    pub fn try_begin(&self) -> SlotResult<SpinSession<'_>> {
        match self.inner.try_lock() {
            Some(machine) => Ok(SpinSession { machine }),
            None => {
                log::warn!("Spin rejected: another spin is in progress");
                Err(SlotError::SpinInProgress)
            }
        }
    }

    pub fn spin(&self, bet_per_line: f64, active_lines: &[usize]) -> SlotResult<SpinOutcome> {
        self.try_begin()?.spin(bet_per_line, active_lines)
    }

    /// Run a closure against the machine, waiting for any spin to finish
    pub fn with<R>(&self, f: impl FnOnce(&mut SlotMachine) -> R) -> R {
        f(&mut self.inner.lock())
    }

    pub fn balance(&self) -> f64 {
        self.inner.lock().balance()
    }

    pub fn jackpot_pool(&self) -> f64 {
        self.inner.lock().jackpot_pool()
    }

    pub fn is_spinning(&self) -> bool {
        self.inner.is_locked()
    }
}

impl<'a> SpinSession<'a> {
    /// Spin, then hold the machine for the configured reveal delay
    pub fn spin(mut self, bet_per_line: f64, active_lines: &[usize]) -> SlotResult<SpinOutcome> {
        let outcome = self.machine.spin(bet_per_line, active_lines)?;
        let delay = self.machine.config().machine.reveal_delay_ms;
        if delay > 0 {
            std::thread::sleep(Duration::from_millis(delay));
        }
        Ok(outcome)
    }

    pub fn machine(&self) -> &SlotMachine {
        &self.machine
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SlotConfig;

    fn shared(delay_ms: u64) -> SharedSlotMachine {
        let mut config = SlotConfig::default();
        config.machine.reveal_delay_ms = delay_ms;
        SharedSlotMachine::new(SlotMachine::with_config(config).unwrap().with_seed(9))
    }

    #[test]
    fn test_spin_through_handle() {
        let handle = shared(0);
        let outcome = handle.spin(1.0, &[0, 1]).unwrap();
        assert_eq!(handle.balance(), outcome.balance);
        assert!(!handle.is_spinning());
    }

    #[test]
    fn test_overlapping_spin_rejected() {
        let handle = shared(0);
        let session = handle.try_begin().unwrap();
        assert!(handle.is_spinning());

        let other = handle.clone();
        let result = std::thread::spawn(move || other.spin(1.0, &[0]).map(|_| ()))
            .join()
            .unwrap();
        assert_eq!(result, Err(SlotError::SpinInProgress));

        session.spin(1.0, &[0]).unwrap();
        assert!(handle.spin(1.0, &[0]).is_ok());
        assert_eq!(handle.with(|m| m.stats().total_spins), 2);
    }

    #[test]
    fn test_reveal_delay_holds_machine() {
        let handle = shared(200);
        let spinner = handle.clone();
        let worker = std::thread::spawn(move || spinner.spin(1.0, &[0]).map(|_| ()));

        // Wait until the worker holds the machine
        while !handle.is_spinning() {
            std::thread::yield_now();
        }
        assert_eq!(handle.try_begin().err(), Some(SlotError::SpinInProgress));
        assert_eq!(worker.join().unwrap(), Ok(()));
    }
}
