use tracing::{debug, trace};

use super::{Connector, DeviceInterface};
use crate::constants::SERIAL_TIMEOUT_MS;

use crate::error::{FlowerError, FlowerResult};
use std::io::{Read, Write};

pub type ComPort = String;
pub type BaudRate = u32;

/// Serial port device_interface layer
pub struct SerialPortDevice {
    port: ComPort,
    serial_port: Box<dyn serialport::SerialPort>,
}

impl SerialPortDevice {
    pub fn new(port: ComPort, baud: BaudRate) -> FlowerResult<SerialPortDevice> {
        let serial_port = serialport::new(&port, baud)
            .timeout(std::time::Duration::from_millis(SERIAL_TIMEOUT_MS))
            .open()
            .map_err(|e| FlowerError::Communication(format!("Could not open {}: {}", port, e)))?;

        debug!("Opened {} @ {} baud", port, baud);
        Ok(SerialPortDevice { port, serial_port })
    }
}

impl DeviceInterface for SerialPortDevice {
    fn send(&mut self, bytes: &[u8]) -> FlowerResult<()> {
        self.serial_port
            .write_all(bytes)
            .map_err(|e| FlowerError::Communication(format!("{}", e)))?;
        self.serial_port
            .flush()
            .map_err(|e| FlowerError::Communication(format!("Failed to flush: {}", e)))?;
        trace!("Sent bytes {:?}", bytes);
        Ok(())
    }

    fn receive(&mut self, max: usize) -> FlowerResult<Vec<u8>> {
        let mut buffer = vec![0; max];

        let size = self
            .serial_port
            .read(&mut buffer)
            // Timeout error is fine, just continue
            .or_else(|e| {
                if e.kind() == std::io::ErrorKind::TimedOut {
                    Ok(0)
                } else {
                    Err(e)
                }
            })
            .map_err(|e| FlowerError::Communication(format!("{}", e)))?;

        buffer.truncate(size);
        trace!("Received bytes {:?}", buffer);
        Ok(buffer)
    }

    fn clear_buffers(&mut self) -> FlowerResult<()> {
        self.serial_port
            .clear(serialport::ClearBuffer::All)
            .map_err(|e| {
                FlowerError::Communication(format!(
                    "Failed to clear send/receive buffers, {}",
                    e
                ))
            })
    }
}

/// The boxed port closes itself when dropped, this only records it
impl Drop for SerialPortDevice {
    fn drop(&mut self) {
        debug!("Closed {}", self.port);
    }
}

/// Opens real serial ports
#[derive(Debug, Default, Clone, Copy)]
pub struct SerialConnector;

impl Connector for SerialConnector {
    type Device = SerialPortDevice;

    fn open(&mut self, port: &str, baud: BaudRate) -> FlowerResult<SerialPortDevice> {
        SerialPortDevice::new(port.to_owned(), baud)
    }
}
