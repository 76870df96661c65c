use serialport::{SerialPortInfo, SerialPortType};
use tracing::{debug, info};

use crate::error::{FlowerError, FlowerResult};

/// Substrings (lowercase) of port descriptions that identify common
/// USB-serial bridge chips
pub const PREFERRED_KEYWORDS: [&str; 6] =
    ["arduino", "wchusb", "ch340", "usb serial", "cp210", "ftdi"];

/// A port the OS exposes, with a human readable description
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortCandidate {
    pub name: String,
    pub description: String,
}

impl PortCandidate {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        PortCandidate {
            name: name.into(),
            description: description.into(),
        }
    }

    /// True if the description names one of the known USB-serial chips
    pub fn is_preferred(&self) -> bool {
        let description = self.description.to_lowercase();
        PREFERRED_KEYWORDS
            .iter()
            .any(|keyword| description.contains(keyword))
    }
}

impl From<&SerialPortInfo> for PortCandidate {
    fn from(info: &SerialPortInfo) -> Self {
        let description = match &info.port_type {
            SerialPortType::UsbPort(usb) => {
                let parts: Vec<&str> = [usb.product.as_deref(), usb.manufacturer.as_deref()]
                    .into_iter()
                    .flatten()
                    .filter(|s| !s.is_empty())
                    .collect();

                if parts.is_empty() {
                    format!("USB VID:PID={:04x}:{:04x}", usb.vid, usb.pid)
                } else {
                    parts.join(" ")
                }
            }
            SerialPortType::PciPort => "PCI".to_owned(),
            SerialPortType::BluetoothPort => "Bluetooth".to_owned(),
            SerialPortType::Unknown => "n/a".to_owned(),
        };

        PortCandidate::new(info.port_name.clone(), description)
    }
}

/// Ask the OS for every serial port it currently exposes
pub fn available_candidates() -> FlowerResult<Vec<PortCandidate>> {
    let ports = serialport::available_ports().map_err(|e| {
        FlowerError::Configuration(format!("Could not get available ports. Err {}", e))
    })?;

    let candidates: Vec<PortCandidate> = ports.iter().map(PortCandidate::from).collect();
    for candidate in &candidates {
        debug!("Found {} ({})", candidate.name, candidate.description);
    }

    Ok(candidates)
}

/// Pick the first port with a preferred description, else the first port
/// in enumeration order. `None` only when the list is empty.
pub fn select_port(candidates: &[PortCandidate]) -> Option<&PortCandidate> {
    candidates
        .iter()
        .find(|candidate| candidate.is_preferred())
        .or_else(|| candidates.first())
}

/// Use `explicit` if given, otherwise pick from what `enumerate` lists.
/// `enumerate` is only called when no port was given.
pub fn resolve_port<F>(explicit: Option<String>, enumerate: F) -> FlowerResult<String>
where
    F: FnOnce() -> FlowerResult<Vec<PortCandidate>>,
{
    if let Some(port) = explicit {
        return Ok(port);
    }

    let candidates = enumerate()?;
    let selected = select_port(&candidates).ok_or(FlowerError::NoPortFound)?;
    info!("Auto-detected {} ({})", selected.name, selected.description);
    Ok(selected.name.clone())
}

/// Resolve the port to use from the ports the OS exposes
pub fn resolve(explicit: Option<String>) -> FlowerResult<String> {
    resolve_port(explicit, available_candidates)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serialport::UsbPortInfo;

    fn usb(name: &str, product: Option<&str>, manufacturer: Option<&str>) -> SerialPortInfo {
        SerialPortInfo {
            port_name: name.to_owned(),
            port_type: SerialPortType::UsbPort(UsbPortInfo {
                vid: 0x1a86,
                pid: 0x7523,
                serial_number: None,
                manufacturer: manufacturer.map(str::to_owned),
                product: product.map(str::to_owned),
            }),
        }
    }

    #[test]
    fn prefers_ch340_over_bluetooth() {
        let candidates = vec![
            PortCandidate::new("/dev/ttyUSB0", "USB-SERIAL CH340"),
            PortCandidate::new("/dev/rfcomm0", "Bluetooth"),
        ];
        assert_eq!(select_port(&candidates).unwrap().name, "/dev/ttyUSB0");
    }

    #[test]
    fn preferred_port_wins_regardless_of_position() {
        let candidates = vec![
            PortCandidate::new("/dev/ttyS0", "n/a"),
            PortCandidate::new("/dev/rfcomm0", "Bluetooth"),
            PortCandidate::new("/dev/ttyACM0", "Arduino Uno"),
            PortCandidate::new("/dev/ttyUSB1", "FTDI FT232R"),
        ];
        assert_eq!(select_port(&candidates).unwrap().name, "/dev/ttyACM0");
    }

    #[test]
    fn keywords_match_case_insensitively() {
        for description in ["CP2102 USB to UART", "wchusbserial", "Generic USB Serial"] {
            assert!(PortCandidate::new("x", description).is_preferred(), "{description}");
        }
        assert!(!PortCandidate::new("x", "PCI").is_preferred());
    }

    #[test]
    fn falls_back_to_first_port() {
        let candidates = vec![
            PortCandidate::new("COM1", "Communications Port"),
            PortCandidate::new("COM2", "Bluetooth"),
        ];
        assert_eq!(select_port(&candidates).unwrap().name, "COM1");
    }

    #[test]
    fn empty_list_resolves_to_nothing() {
        assert!(select_port(&[]).is_none());
        assert!(matches!(
            resolve_port(None, || Ok(Vec::new())),
            Err(FlowerError::NoPortFound)
        ));
    }

    #[test]
    fn explicit_port_is_used_as_given() {
        let port = resolve_port(Some("/dev/ttyS3".to_owned()), || {
            panic!("ports must not be enumerated when one is given")
        })
        .unwrap();
        assert_eq!(port, "/dev/ttyS3");
        assert_eq!(resolve(Some("COM7".to_owned())).unwrap(), "COM7");
    }

    #[test]
    fn resolves_preferred_port_from_enumeration() {
        let port = resolve_port(None, || {
            Ok(vec![
                PortCandidate::new("/dev/rfcomm0", "Bluetooth"),
                PortCandidate::new("/dev/ttyUSB0", "USB-SERIAL CH340"),
            ])
        })
        .unwrap();
        assert_eq!(port, "/dev/ttyUSB0");
    }

    #[test]
    fn enumeration_failure_is_reported() {
        let result = resolve_port(None, || {
            Err(FlowerError::Configuration("no permission".to_owned()))
        });
        assert!(matches!(result, Err(FlowerError::Configuration(_))));
    }

    #[test]
    fn describes_usb_ports_from_product_and_manufacturer() {
        let info = usb("/dev/ttyUSB0", Some("USB Serial"), Some("QinHeng Electronics"));
        let candidate = PortCandidate::from(&info);
        assert_eq!(candidate.name, "/dev/ttyUSB0");
        assert_eq!(candidate.description, "USB Serial QinHeng Electronics");
        assert!(candidate.is_preferred());
    }

    #[test]
    fn describes_bare_usb_ports_by_ids() {
        let candidate = PortCandidate::from(&usb("/dev/ttyACM0", None, None));
        assert_eq!(candidate.description, "USB VID:PID=1a86:7523");
    }

    #[test]
    fn describes_non_usb_ports() {
        let info = SerialPortInfo {
            port_name: "/dev/rfcomm0".to_owned(),
            port_type: SerialPortType::BluetoothPort,
        };
        assert_eq!(PortCandidate::from(&info).description, "Bluetooth");
    }
}
