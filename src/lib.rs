//! Convert, dump and replay recorded AIS/NMEA logs.
//!
//! Log files hold one `{"timestamp":..,"nmea":..}` object per line and may be
//! gzip, bzip2 or xz compressed. Decoding and batching logic lives in
//! `nmea-logger-core`; this crate adds file access, the exporters and the
//! websocket viewer.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use nmea_logger_core::playback::DEFAULT_SPEED;

pub mod convert;
pub mod error;
pub mod format;
pub mod io;
pub mod playback;
pub mod web;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Parser, Clone, Debug)]
#[command(name = "nmea-logger", version, about = "NMEA logger")]
pub struct Cli {
    #[clap(flatten)]
    pub verbose: clap_verbosity_flag::Verbosity<clap_verbosity_flag::InfoLevel>,

    /// Stop at the first sentence that cannot be decoded instead of skipping it
    #[arg(long, global = true, default_value_t = false)]
    pub strict: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Convert a log to CSV (.csv) or line-delimited JSON (.jsonl, .json)
    ///
    /// The output may carry a .gz, .bz2 or .xz suffix to compress it.
    /// Use `-` as output to write line-delimited JSON to stdout.
    Convert {
        input_file: PathBuf,
        output_file: PathBuf,
    },

    /// Print every decoded record as line-delimited JSON
    Dump { input_file: PathBuf },

    /// Replay a log to websocket viewers at GET /ws
    View(ViewArgs),
}

#[derive(Args, Clone, Debug)]
pub struct ViewArgs {
    pub input_file: PathBuf,

    /// Address to listen on
    #[arg(long, env = "LISTEN_ADDR", default_value = "127.0.0.1:8080")]
    pub listen_addr: SocketAddr,

    /// Recorded seconds replayed per real second
    #[arg(long, env = "PLAYBACK_SPEED", default_value_t = DEFAULT_SPEED, value_parser = parse_speed)]
    pub playback_speed: f64,

    /// Real time between batches, e.g. `1s` or `500ms`
    #[arg(long, env = "PLAYBACK_UPDATE_PERIOD", default_value = "1s", value_parser = parse_period)]
    pub playback_update_period: Duration,
}

fn parse_speed(s: &str) -> Result<f64, String> {
    let speed: f64 = s.trim().parse().map_err(|_| format!("not a number: {}", s))?;
    if !speed.is_finite() || speed <= 0.0 {
        return Err(format!("must be greater than zero: {}", s));
    }
    Ok(speed)
}

/// Parse a human readable period such as `1s`, `500ms` or `1m 30s`
pub fn parse_period(s: &str) -> Result<Duration, String> {
    let period = humantime::parse_duration(s.trim()).map_err(|e| format!("{}: {:?}", e, s))?;
    if period.is_zero() {
        return Err(format!("must be greater than zero: {:?}", s));
    }
    Ok(period)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("1s"), Ok(Duration::from_secs(1)));
        assert_eq!(parse_period("500ms"), Ok(Duration::from_millis(500)));
        assert_eq!(parse_period("2m"), Ok(Duration::from_secs(120)));
        assert_eq!(parse_period("1m 30s"), Ok(Duration::from_secs(90)));
        assert!(parse_period("0s").is_err());
        assert!(parse_period("-1s").is_err());
        assert!(parse_period("2").is_err(), "unit is required");
        assert!(parse_period("fast").is_err());
    }

    #[test]
    fn test_period_flag() {
        let cli = Cli::try_parse_from([
            "nmea-logger",
            "view",
            "--playback-update-period",
            "250ms",
            "log.json",
        ])
        .unwrap();
        let Command::View(args) = cli.command else {
            panic!("Expected view command");
        };
        assert_eq!(args.playback_update_period, Duration::from_millis(250));
        assert!(Cli::try_parse_from([
            "nmea-logger",
            "view",
            "--playback-update-period",
            "0ms",
            "log.json",
        ])
        .is_err());
    }

    #[test]
    fn test_parse_speed() {
        assert_eq!(parse_speed("60"), Ok(60.0));
        assert_eq!(parse_speed("0.5"), Ok(0.5));
        assert!(parse_speed("0").is_err());
        assert!(parse_speed("inf").is_err());
        assert!(parse_speed("NaN").is_err());
    }

    #[test]
    fn test_view_defaults() {
        let cli = Cli::try_parse_from(["nmea-logger", "view", "log.json.gz"]).unwrap();
        let Command::View(args) = cli.command else {
            panic!("Expected view command");
        };
        assert_eq!(args.input_file, PathBuf::from("log.json.gz"));
        assert_eq!(args.listen_addr, "127.0.0.1:8080".parse().unwrap());
        assert_eq!(args.playback_speed, 60.0);
        assert_eq!(args.playback_update_period, Duration::from_secs(1));
        assert!(!cli.strict);
    }

    #[test]
    fn test_strict_after_subcommand() {
        let cli =
            Cli::try_parse_from(["nmea-logger", "convert", "--strict", "in.json", "out.csv"])
                .unwrap();
        assert!(cli.strict);
        assert!(matches!(cli.command, Command::Convert { .. }));
    }
}
