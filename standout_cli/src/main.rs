use clap::Parser;
use owo_colors::OwoColorize;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;
mod commands;
mod output;

use cli::Cli;

fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "standout_cli=info,standout_core=info",
        1 => "standout_cli=debug,standout_core=debug",
        _ => "standout_cli=trace,standout_core=trace",
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logs go to stderr so structured stdout stays parseable.
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter(cli.verbose).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(e) = commands::analyze::run(&cli).await {
        if cli.output.is_machine() && !e.is_reported() {
            match output::format_error(&e, cli.output) {
                Ok(doc) => print!("{}", doc),
                Err(fmt_err) => tracing::warn!(error = %fmt_err, "Could not render error document"),
            }
        }
        if cli.no_color {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}: {}", "Error".red().bold(), e);
        }
        process::exit(1);
    }
}
