use std::convert::Infallible;
use std::io::Write;
use std::time::Duration;

use tracing::debug;

use crate::error::{FlowerError, FlowerResult};
use crate::interface::DeviceInterface;
use crate::signal::StopFlag;

pub const LINE_TERMINATOR: &str = "\r\n";

/// A command line and how long to hold it before sending the next one
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CommandEntry {
    pub command: &'static str,
    pub delay: Duration,
}

/// Open the flower over three seconds, hold, close it again, hold
pub const FLOWER_SEQUENCE: &[CommandEntry] = &[
    CommandEntry {
        command: "0/OPENLEDRAMP:120,3000",
        delay: Duration::from_secs(10),
    },
    CommandEntry {
        command: "0/CLOSELEDRAMP:0,3000",
        delay: Duration::from_secs(10),
    },
];

/// Encode `command` as one CRLF-terminated line
pub fn encode_command(command: &str) -> Vec<u8> {
    let mut line = String::with_capacity(command.len() + LINE_TERMINATOR.len());
    line.push_str(command);
    line.push_str(LINE_TERMINATOR);
    line.into_bytes()
}

/// Send a single command line, fire-and-forget
pub fn send_command<D: DeviceInterface + ?Sized>(device: &mut D, command: &str) -> FlowerResult<()> {
    device.send(&encode_command(command))
}

/// Replay `sequence` on `device` until a send fails or `stop` is raised.
/// Each command is echoed to `out` as `> command` before it goes out.
pub fn transmit_forever<D, W>(
    device: &mut D,
    sequence: &[CommandEntry],
    stop: &StopFlag,
    out: &mut W,
) -> FlowerResult<Infallible>
where
    D: DeviceInterface + ?Sized,
    W: Write,
{
    if sequence.is_empty() {
        return Err(FlowerError::Configuration(
            "Command sequence is empty".to_owned(),
        ));
    }

    loop {
        for entry in sequence {
            stop.check()?;
            // Echo is cosmetic, a closed stdout must not stop the device loop
            let _ = writeln!(out, "> {}", entry.command).and_then(|_| out.flush());
            send_command(device, entry.command)?;
            debug!("Holding {:?}", entry.delay);
            stop.sleep(entry.delay)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_crlf() {
        assert_eq!(encode_command("0/OPENLEDRAMP:120,3000"), b"0/OPENLEDRAMP:120,3000\r\n");
        assert_eq!(encode_command(""), b"\r\n");
        assert_eq!(encode_command("héllo\n"), "héllo\n\r\n".as_bytes());
    }

    #[test]
    fn flower_sequence_is_open_then_close() {
        let commands: Vec<&str> = FLOWER_SEQUENCE.iter().map(|e| e.command).collect();
        assert_eq!(commands, ["0/OPENLEDRAMP:120,3000", "0/CLOSELEDRAMP:0,3000"]);
        assert!(FLOWER_SEQUENCE
            .iter()
            .all(|e| e.delay == Duration::from_secs(10)));
    }
}
