use clap::Parser;
use log::warn;
use snafu::ErrorCompat;

mod anonymize;
mod args;
mod dashboard;
mod divide;

use crate::args::{Args, Command};

fn exit_with<E: std::error::Error + ErrorCompat>(e: E) -> ! {
    warn!("Error occured {:?}", e);
    eprintln!("An error occured {}", e);
    if let Some(bt) = ErrorCompat::backtrace(&e) {
        eprintln!("trace: {}", bt);
    }
    std::process::exit(1);
}

fn main() {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    match args.command {
        Command::Assign {
            config,
            input,
            out,
            reference,
        } => {
            if let Err(e) = divide::run_divide(config, input, out, reference) {
                exit_with(e);
            }
        }
        Command::Anonymize {
            input,
            out,
            name_column,
            reading_column,
            email_column,
        } => {
            let columns = anonymize::MaskColumns {
                name: name_column,
                reading: reading_column,
                email: email_column,
            };
            if let Err(e) = anonymize::run_anonymize(input, out, &columns) {
                exit_with(e);
            }
        }
        Command::Dashboard {
            poll,
            source,
            sheet_id,
            gid,
            port,
            refresh_secs,
        } => {
            if let Err(e) = dashboard::run_dashboard(poll, source, sheet_id, gid, port, refresh_secs)
            {
                exit_with(e);
            }
        }
    }
}
