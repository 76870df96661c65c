use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::constants::{DEFAULT_BAUD_RATE, RECONNECT_BACKOFF_SECS};
use crate::error::{FlowerError, FlowerResult};
use crate::interface::{BaudRate, ComPort, Connector};
use crate::sequence::{CommandEntry, transmit_forever};
use crate::settle::{SettleOptions, settle};
use crate::signal::StopFlag;

#[derive(Debug, Clone)]
pub struct LoopOptions {
    pub port: ComPort,
    pub baud: BaudRate,
    pub settle: SettleOptions,
    /// Wait between a failed session and the next connection attempt
    pub backoff: Duration,
}

impl LoopOptions {
    pub fn new(port: ComPort) -> Self {
        LoopOptions {
            port,
            baud: DEFAULT_BAUD_RATE,
            settle: SettleOptions::default(),
            backoff: Duration::from_secs(RECONNECT_BACKOFF_SECS),
        }
    }
}

/// Drives connect, settle and transmit forever, reconnecting on failure
pub struct Runner<'a, C: Connector> {
    connector: C,
    options: LoopOptions,
    sequence: &'a [CommandEntry],
    stop: StopFlag,
}

impl<'a, C: Connector> Runner<'a, C> {
    pub fn new(
        connector: C,
        options: LoopOptions,
        sequence: &'a [CommandEntry],
        stop: StopFlag,
    ) -> Self {
        Runner {
            connector,
            options,
            sequence,
            stop,
        }
    }

    /// One connection lifetime. Never succeeds, it only ends with the error
    /// that broke it. The device is dropped before this returns.
    pub fn session<W: Write>(&mut self, out: &mut W) -> FlowerResult<Infallible> {
        self.stop.check()?;
        let mut device = self
            .connector
            .open(&self.options.port, self.options.baud)?;
        info!("Connected to {}", self.options.port);

        settle(&mut device, &self.options.settle, &self.stop, out)?;
        transmit_forever(&mut device, self.sequence, &self.stop, out)
    }

    /// Run sessions until interrupted. Communication errors are reported
    /// and retried after the backoff. Configuration errors (only an empty
    /// sequence can raise one here) would fail identically on every retry,
    /// so they are returned instead of retried.
    /// Returns `Ok` once the stop flag has been raised.
    pub fn run<W: Write>(&mut self, out: &mut W) -> FlowerResult<()> {
        loop {
            let error = match self.session(out) {
                Ok(never) => match never {},
                Err(e) => e,
            };

            match error {
                FlowerError::Interrupted => {
                    debug!("Session interrupted");
                    return Ok(());
                }
                FlowerError::Communication(reason) => {
                    warn!(
                        "Serial error: {}. Retrying in {}s...",
                        reason,
                        self.options.backoff.as_secs_f64()
                    );
                    if let Err(FlowerError::Interrupted) = self.stop.sleep(self.options.backoff) {
                        return Ok(());
                    }
                }
                fatal => return Err(fatal),
            }
        }
    }
}
