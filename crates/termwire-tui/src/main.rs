//! termwire entry point.
//!
//! # Usage
//!
//! ```bash
//! # Follow the server logs of 10.0.0.5
//! termwire 10.0.0.5 --kind log
//!
//! # Process list through a non-default bridge, with file logging
//! termwire 10.0.0.5 --kind process --endpoint ws://bridge:9000 --log-file termwire.log
//! ```
//!
//! Keys: `Ctrl-R` reconnects, `Ctrl-D` disconnects, `Esc` or `Ctrl-C` quits.

use std::{path::PathBuf, time::Duration};

use clap::Parser;
use termwire_app::{EditorConfig, Runtime};
use termwire_core::{ConnectionConfig, DEFAULT_ENDPOINT};
use termwire_proto::{SessionKind, SessionTarget};
use termwire_tui::{TerminalDriver, logging, validate_address};

/// termwire remote session shell
#[derive(Parser, Debug)]
#[command(name = "termwire")]
#[command(about = "Line-oriented remote sessions over a WebSocket bridge")]
#[command(version)]
struct Args {
    /// IPv4 address of the remote host
    address: String,

    /// Session kind (log, process, generic)
    #[arg(short, long, default_value = "generic")]
    kind: SessionKind,

    /// Base URL of the bridge service
    #[arg(short, long, default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Give up on a socket that has not opened after this many seconds
    #[arg(long)]
    connect_timeout_secs: Option<u64>,

    /// Reconnect this many seconds after an unexpected close
    #[arg(long)]
    auto_reconnect_secs: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Write logs to this file (logging is off otherwise)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn connection_config(&self) -> ConnectionConfig {
        let mut config = ConnectionConfig::default().endpoint(self.endpoint.clone());
        if let Some(secs) = self.connect_timeout_secs {
            config = config.connect_timeout(Duration::from_secs(secs));
        }
        if let Some(secs) = self.auto_reconnect_secs {
            config = config.auto_reconnect(Duration::from_secs(secs));
        }
        config
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let address = validate_address(&args.address)?.to_string();

    let _guard = match &args.log_file {
        Some(path) => Some(logging::init_file(path, &args.log_level)?),
        None => None,
    };

    tracing::info!(%address, kind = %args.kind, endpoint = %args.endpoint, "termwire starting");

    let target = SessionTarget::new(address, args.kind);
    let driver = TerminalDriver::new()?;
    let runtime = Runtime::new(driver, target, args.connection_config(), EditorConfig::default());

    Ok(runtime.run().await?)
}
