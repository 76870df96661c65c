use std::time::Duration;

use clap::Parser;
use flowerloop::{
    FLOWER_SEQUENCE, LoopOptions, Runner, SerialConnector, SettleOptions, StopFlag,
    constants::{
        DEFAULT_BAUD_RATE, DEFAULT_READY_TIMEOUT_SECS, DEFAULT_READY_TOKEN, DEFAULT_SETTLE_SECS,
        MAX_TIMING_SECS,
    },
    error::{FlowerError, FlowerResult},
    ports::{self, PortCandidate},
};
use tracing::error;

/// Loop flower commands with specific delays.
#[derive(Parser, Debug, Clone)]
#[command(version, long_about = None)]
pub(crate) struct LoopCmd {
    /// Serial port (e.g., COM5, /dev/ttyUSB0, /dev/tty.usbmodem*)
    #[clap(short, long)]
    pub(crate) port: Option<String>,

    /// Baud rate
    #[clap(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    pub(crate) baud: u32,

    /// Seconds to wait after opening the port
    #[clap(long, default_value_t = DEFAULT_SETTLE_SECS, value_parser = parse_seconds)]
    pub(crate) settle: f64,

    /// Also wait for a ready token after settle
    #[clap(long, default_value_t = false)]
    pub(crate) wait_ready: bool,

    /// Token to wait for when --wait-ready is set
    #[clap(long, default_value = DEFAULT_READY_TOKEN)]
    pub(crate) ready_token: String,

    /// Max seconds to wait for the ready token
    #[clap(long, default_value_t = DEFAULT_READY_TIMEOUT_SECS, value_parser = parse_seconds)]
    pub(crate) ready_timeout: f64,

    /// More log output (-v debug, -vv trace)
    #[clap(short, long, action = clap::ArgAction::Count)]
    pub(crate) verbose: u8,
}

fn parse_seconds(value: &str) -> Result<f64, String> {
    let secs: f64 = value
        .parse()
        .map_err(|_| format!("`{}` is not a number of seconds", value))?;

    if secs > MAX_TIMING_SECS {
        return Err(format!(
            "`{}` is longer than the {} second limit",
            value, MAX_TIMING_SECS
        ));
    }

    Duration::try_from_secs_f64(secs)
        .map(|_| secs)
        .map_err(|_| format!("`{}` must be a finite, non-negative number of seconds", value))
}

/// Whole program outcome as a process exit status
pub(crate) fn exit_status(result: FlowerResult<()>) -> u8 {
    match result {
        Ok(()) | Err(FlowerError::Interrupted) => 0,
        Err(e) => {
            error!("{}", e);
            1
        }
    }
}

impl LoopCmd {
    pub(crate) fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::INFO,
            1 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    fn settle_options(&self) -> SettleOptions {
        SettleOptions {
            settle: Duration::try_from_secs_f64(self.settle).unwrap_or(Duration::MAX),
            wait_ready: self.wait_ready,
            ready_token: self.ready_token.clone(),
            ready_timeout: Duration::try_from_secs_f64(self.ready_timeout).unwrap_or(Duration::MAX),
        }
    }
}

pub(crate) fn handle_loop(opts: LoopCmd) -> FlowerResult<()> {
    handle_loop_with(opts, ports::available_candidates)
}

fn handle_loop_with<F>(opts: LoopCmd, enumerate: F) -> FlowerResult<()>
where
    F: FnOnce() -> FlowerResult<Vec<PortCandidate>>,
{
    let port = ports::resolve_port(opts.port.clone(), enumerate)?;
    let stop = StopFlag::install_ctrlc_handler()?;

    println!(
        "Using port: {} @ {} baud. Press Ctrl+C to stop.",
        port, opts.baud
    );

    let mut options = LoopOptions::new(port);
    options.baud = opts.baud;
    options.settle = opts.settle_options();

    let mut runner = Runner::new(SerialConnector, options, FLOWER_SEQUENCE, stop);
    runner.run(&mut std::io::stdout())?;

    println!("\nStopping.");
    Ok(())
}
