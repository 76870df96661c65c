use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::constants::SLEEP_SLICE_MS;
use crate::error::{FlowerError, FlowerResult};

/// Shared flag flipped once the user asks the program to stop.
///
/// Every blocking point in the main loop polls it, so Ctrl+C unwinds through
/// ordinary `Result` returns instead of killing the process mid-write.
#[derive(Debug, Clone, Default)]
pub struct StopFlag {
    stopped: Arc<AtomicBool>,
}

impl StopFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a flag that is raised by Ctrl+C. Only one handler can be
    /// installed per process.
    pub fn install_ctrlc_handler() -> FlowerResult<Self> {
        let flag = Self::new();
        let handler_flag = flag.clone();
        ctrlc::set_handler(move || handler_flag.stop()).map_err(|e| {
            FlowerError::Configuration(format!("Could not install Ctrl+C handler: {}", e))
        })?;
        debug!("Installed Ctrl+C handler");

        Ok(flag)
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Relaxed);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Relaxed)
    }

    /// Fail with `Interrupted` if the flag is raised
    pub fn check(&self) -> FlowerResult<()> {
        if self.is_stopped() {
            Err(FlowerError::Interrupted)
        } else {
            Ok(())
        }
    }

    /// Sleep for `duration`, waking early with `Interrupted` if the flag is
    /// raised in the meantime. A duration too long to represent as an
    /// `Instant` sleeps until the flag is raised.
    pub fn sleep(&self, duration: Duration) -> FlowerResult<()> {
        let deadline = Instant::now().checked_add(duration);
        let slice = Duration::from_millis(SLEEP_SLICE_MS);

        loop {
            self.check()?;
            let nap = match deadline {
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Ok(());
                    }
                    slice.min(deadline - now)
                }
                None => slice,
            };
            std::thread::sleep(nap);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sleep_waits_full_duration() {
        let flag = StopFlag::new();
        let start = Instant::now();
        flag.sleep(Duration::from_millis(120)).unwrap();
        assert!(start.elapsed() >= Duration::from_millis(120));
    }

    #[test]
    fn sleep_wakes_on_stop() {
        let flag = StopFlag::new();
        let remote = flag.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            remote.stop();
        });

        let start = Instant::now();
        let result = flag.sleep(Duration::from_secs(10));
        stopper.join().unwrap();

        assert!(matches!(result, Err(FlowerError::Interrupted)));
        assert!(start.elapsed() < Duration::from_secs(2));
    }

    #[test]
    fn unrepresentable_sleep_still_wakes_on_stop() {
        let flag = StopFlag::new();
        let remote = flag.clone();
        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(100));
            remote.stop();
        });

        let result = flag.sleep(Duration::MAX);
        stopper.join().unwrap();

        assert!(matches!(result, Err(FlowerError::Interrupted)));
    }

    #[test]
    fn raised_flag_interrupts_zero_sleep() {
        let flag = StopFlag::new();
        flag.stop();
        assert!(matches!(
            flag.sleep(Duration::ZERO),
            Err(FlowerError::Interrupted)
        ));
    }
}
