//! M17 digital-voice gateway daemon.
//!
//! # Usage
//!
//! ```bash
//! m17gw --config /etc/m17gateway.toml
//! ```

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use m17gw_core::GatewayConfig;
use m17gw_server::{signals, GatewayServer, LoopExit, ServerError};

/// M17 digital-voice gateway
#[derive(Parser, Debug)]
#[command(name = "m17gw")]
#[command(about = "M17 digital-voice gateway daemon")]
#[command(version, disable_version_flag = true)]
struct Args {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "/etc/m17gateway.toml")]
    config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print version and exit
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    #[allow(dead_code)]
    version: (),
}

fn main() {
    // `try_parse` rather than `parse` so a bad argument exits with code 1
    // (a usage error) rather than clap's default 2, matching the upstream
    // `main()`'s `return 1` on an unrecognized flag.
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            let _ = err.print();
            let code = match err.kind() {
                clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
                _ => 1,
            };
            std::process::exit(code);
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    if let Err(err) = run(&args.config) {
        tracing::error!(error = %err, "gateway exited");
        std::process::exit(1);
    }
}

/// Load the configuration, build the gateway, and run the event loop. On
/// `SIGHUP` the gateway is torn down and rebuilt from a freshly re-read
/// configuration file, matching the upstream `do { ... } while (m_signal ==
/// 1)` restart loop in `M17Gateway.cpp`'s `main()`.
fn run(config_path: &str) -> Result<(), ServerError> {
    let mut signals = signals::SignalWatcher::install()?;

    loop {
        tracing::info!(config = config_path, "loading configuration");
        let config = GatewayConfig::load(config_path)?;

        tracing::info!(callsign = %config.general.callsign, "starting gateway");
        let (mut server, initial_actions) = GatewayServer::build(config)?;

        match server.run(&mut signals, initial_actions) {
            LoopExit::Terminated { signum } => {
                tracing::info!(signum, "received termination signal, shutting down");
                return Ok(());
            }
            LoopExit::Restart => {
                tracing::info!("received SIGHUP, reloading configuration");
            }
        }
    }
}
