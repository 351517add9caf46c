use std::io::Write;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use fontpeek::cli::Cli;
use fontpeek::{FontpeekError, commands, logging};
use fontpeek_http::CancelToken;
use tokio::runtime::Runtime;

/// Conventional exit status after SIGINT.
const EXIT_INTERRUPTED: i32 = 130;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let shared = cli.command.shared();
    logging::init(shared.log_level(), shared.verbose);

    log::debug!("fontpeek {}", fontpeek::VERSION);

    // The work itself is blocking; the runtime only hosts the Ctrl-C watcher.
    let runtime = Runtime::new()?;
    let cancel = CancelToken::new();
    let watcher = cancel.clone();
    runtime.spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        log::info!("interrupt received, canceling");
        watcher.cancel();
        // A second Ctrl-C while a request is blocked exits immediately.
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(EXIT_INTERRUPTED);
        }
    });

    let result = {
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        let result = commands::run(&cli, &cancel, &mut out);
        let _ = out.flush();
        result
    };

    runtime.shutdown_timeout(Duration::from_secs(1));

    match result {
        Ok(()) => Ok(()),
        Err(FontpeekError::Canceled) => {
            eprintln!("fontpeek: canceled");
            std::process::exit(EXIT_INTERRUPTED);
        }
        Err(e) => {
            log::debug!("{e:?}");
            Err(e.into())
        }
    }
}
