use std::path::Path;
use std::time::Duration;

use clap::Parser;
use log::info;
use miette::{IntoDiagnostic, Result, WrapErr};
use nmea_logger::{convert, web::Web, Cli, Command, ViewArgs, VERSION};
use nmea_logger_core::PlaybackSchedule;
use tokio::net::TcpListener;
use tokio_graceful_shutdown::{SubsystemBuilder, Toplevel};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(cli.verbose.log_level_filter())
        .parse_env("LOG_LEVEL")
        .init();

    info!("nmea-logger {}", VERSION);
    let ignore_parse_errors = !cli.strict;

    match cli.command {
        Command::Convert {
            input_file,
            output_file,
        } => {
            convert::convert(&input_file, &output_file, ignore_parse_errors).into_diagnostic()?;
        }
        Command::Dump { input_file } => {
            convert::dump(&input_file, ignore_parse_errors).into_diagnostic()?;
        }
        Command::View(args) => view(args, ignore_parse_errors).await?,
    }
    Ok(())
}

async fn view(args: ViewArgs, ignore_parse_errors: bool) -> Result<()> {
    check_readable(&args.input_file)?;
    let schedule = PlaybackSchedule::new(args.playback_speed, args.playback_update_period)
        .into_diagnostic()?;
    info!(
        "Replaying {} at {}x, one batch per {:?}",
        args.input_file.display(),
        schedule.speed(),
        args.playback_update_period
    );

    let listener = TcpListener::bind(args.listen_addr).await.into_diagnostic()?;
    let web = Web::new(args.input_file, schedule, ignore_parse_errors);

    Toplevel::new(move |s| async move {
        s.start(SubsystemBuilder::new("Webserver", move |subsys| {
            web.run(listener, subsys)
        }));
    })
    .catch_signals()
    .handle_shutdown_requests(Duration::from_secs(5))
    .await
    .into_diagnostic()
}

fn check_readable(path: &Path) -> Result<()> {
    std::fs::metadata(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("Cannot read {}", path.display()))?;
    Ok(())
}
