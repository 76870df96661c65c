//! Keeps an LED flower opening and closing by looping ramp commands to its
//! microcontroller over a serial port.
//!
//! The port is picked with [`ports::resolve`], then a [`Runner`] opens it,
//! lets the board [`settle`](settle::settle) after the reset the open causes
//! and replays [`FLOWER_SEQUENCE`] until Ctrl+C, reconnecting whenever the
//! link drops.

pub use error::{FlowerError, FlowerResult};
pub use interface::{Connector, DeviceInterface, SerialConnector};
pub use runner::{LoopOptions, Runner};
pub use sequence::{CommandEntry, FLOWER_SEQUENCE};
pub use settle::SettleOptions;
pub use signal::StopFlag;

pub mod constants;
pub mod error;
pub mod interface;
pub mod ports;
pub mod runner;
pub mod sequence;
pub mod settle;
pub mod signal;
