use std::io::Write;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use crate::constants::{
    DEFAULT_READY_TIMEOUT_SECS, DEFAULT_READY_TOKEN, DEFAULT_SETTLE_SECS, READ_CHUNK_SIZE,
};
use crate::error::FlowerResult;
use crate::interface::DeviceInterface;
use crate::signal::StopFlag;

#[derive(Debug, Clone, PartialEq)]
pub struct SettleOptions {
    /// Pause after opening, opening the port usually resets the MCU
    pub settle: Duration,
    pub wait_ready: bool,
    pub ready_token: String,
    pub ready_timeout: Duration,
}

impl Default for SettleOptions {
    fn default() -> Self {
        SettleOptions {
            settle: Duration::from_secs_f64(DEFAULT_SETTLE_SECS),
            wait_ready: false,
            ready_token: DEFAULT_READY_TOKEN.to_owned(),
            ready_timeout: Duration::from_secs_f64(DEFAULT_READY_TIMEOUT_SECS),
        }
    }
}

/// Decode as UTF-8, silently dropping invalid sequences
pub fn decode_ignoring_invalid(bytes: &[u8]) -> String {
    bytes.utf8_chunks().map(|chunk| chunk.valid()).collect()
}

/// Give a freshly opened device time to boot.
///
/// Clears stale buffers (best-effort), sleeps `options.settle`, then when
/// `options.wait_ready` is set polls the device until the text received so far
/// contains `options.ready_token` or `options.ready_timeout` runs out. Every
/// received chunk is echoed to `out`. A missing token is not an error.
pub fn settle<D, W>(
    device: &mut D,
    options: &SettleOptions,
    stop: &StopFlag,
    out: &mut W,
) -> FlowerResult<()>
where
    D: DeviceInterface + ?Sized,
    W: Write,
{
    // Some backends cannot reset their buffers
    if let Err(e) = device.clear_buffers() {
        debug!("Ignoring buffer clear failure: {}", e);
    }

    debug!("Settling for {:?}", options.settle);
    stop.sleep(options.settle)?;

    if !options.wait_ready {
        return Ok(());
    }

    info!(
        "Waiting up to {:?} for {:?}",
        options.ready_timeout, options.ready_token
    );
    // No deadline if the timeout does not fit in an Instant
    let deadline = Instant::now().checked_add(options.ready_timeout);
    let mut received: Vec<u8> = Vec::new();

    while deadline.is_none_or(|deadline| Instant::now() < deadline) {
        stop.check()?;
        let chunk = device.receive(READ_CHUNK_SIZE)?;
        if chunk.is_empty() {
            continue;
        }

        received.extend_from_slice(&chunk);
        let _ = write!(out, "{}", decode_ignoring_invalid(&chunk)).and_then(|_| out.flush());

        // Search everything so far, the token may straddle two chunks
        if decode_ignoring_invalid(&received).contains(&options.ready_token) {
            info!("Device reported ready");
            return Ok(());
        }
    }

    info!("Ready token not seen, continuing anyway");
    Ok(())
}
