//! scrubwatch - watch a folder and strip identifying metadata from images.

use clap::Parser;
use scrubwatch::cli::Config;
use scrubwatch::processor::{Processor, ProcessorOptions};
use scrubwatch::terminal::{Palette, print_error, print_info, print_summary};
use scrubwatch::watch::{self, DirectoryWatcher};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let config = Config::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level().into()),
        )
        .init();

    if let Err(e) = config.validate() {
        print_error(&e.to_string());
        return ExitCode::from(1);
    }

    let mut watcher = match DirectoryWatcher::new(&config.directory) {
        Ok(w) => w,
        Err(e) => {
            print_error(&e.to_string());
            return ExitCode::from(1);
        }
    };

    let palette = Palette::stdout();
    print_info(&format!(
        "Watching folder: {}",
        palette.paint(config.directory.display().to_string()).cyan()
    ));
    println!("Press Ctrl+C to stop...");
    println!("{}", palette.rule());

    let mut processor = Processor::new(ProcessorOptions {
        quiet: config.quiet,
    });
    watch::run(&mut watcher, &mut processor, config.settle(), shutdown_signal()).await;

    println!();
    println!("Stopping watcher...");
    drop(watcher);
    print_summary(&processor.finish(), false);
    println!("Watcher stopped.");

    ExitCode::SUCCESS
}

/// Resolve on Ctrl+C. If the handler cannot be installed, never resolve.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "cannot listen for Ctrl+C");
        std::future::pending::<()>().await;
    }
}
