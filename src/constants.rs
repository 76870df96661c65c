pub(crate) const SERIAL_TIMEOUT_MS: u64 = 1000;
pub(crate) const READ_CHUNK_SIZE: usize = 128;
pub(crate) const SLEEP_SLICE_MS: u64 = 50;

pub const DEFAULT_BAUD_RATE: u32 = 115200;
pub const DEFAULT_SETTLE_SECS: f64 = 3.5;
pub const DEFAULT_READY_TOKEN: &str = "READY";
pub const DEFAULT_READY_TIMEOUT_SECS: f64 = 8.0;
pub const RECONNECT_BACKOFF_SECS: u64 = 3;
/// Longest settle or ready timeout accepted on the command line, one week
pub const MAX_TIMING_SECS: f64 = 7.0 * 24.0 * 3600.0;
