pub mod serialport;

use crate::error::FlowerResult;

pub use self::serialport::{BaudRate, ComPort, SerialConnector, SerialPortDevice};

/// An open, exclusively owned connection to the target device.
/// Dropping it releases the underlying port.
pub trait DeviceInterface {
    /// Write bytes and flush them out of the process
    fn send(&mut self, bytes: &[u8]) -> FlowerResult<()>;

    /// Read at most `max` bytes; an empty buffer means the read timed out
    fn receive(&mut self, max: usize) -> FlowerResult<Vec<u8>>;

    /// Discard anything pending in the send/receive buffers
    fn clear_buffers(&mut self) -> FlowerResult<()>;
}

/// Opens device connections for the main loop
pub trait Connector {
    type Device: DeviceInterface;

    fn open(&mut self, port: &str, baud: BaudRate) -> FlowerResult<Self::Device>;
}
