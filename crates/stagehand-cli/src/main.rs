//! Stagehand CLI entry point.

use std::process::ExitCode;

use clap::Parser;
use log::{LevelFilter, debug, error, info};

use stagehand_cli::{Args, error_adapter::to_reportables};

fn main() -> ExitCode {
    miette::set_panic_hook();

    let args = Args::parse();

    let log_level = args.level_filter().unwrap_or_else(|| {
        eprintln!("Invalid log level: {}. Using 'warn' instead.", args.log_level);
        LevelFilter::Warn
    });
    env_logger::Builder::from_env(env_logger::Env::default())
        .filter_level(log_level)
        .init();

    info!(log_level:?, input = args.input; "Starting Stagehand");
    debug!(args:?; "Parsed arguments");

    let Err(err) = stagehand_cli::run(&args) else {
        info!(output = args.output; "Completed successfully");
        return ExitCode::SUCCESS;
    };

    let reporter = miette::GraphicalReportHandler::new();
    for reportable in to_reportables(&err) {
        let mut rendered = String::new();
        if reporter.render_report(&mut rendered, &reportable).is_err() {
            rendered = reportable.to_string();
        }
        error!("{rendered}");
    }
    ExitCode::FAILURE
}
