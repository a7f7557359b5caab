use clap::Parser;
use filegod::cli::{Args, run_cli};
use filegod::output::OutputFormatter;
use filegod::shell::goodbye;
use tracing_subscriber::EnvFilter;

fn main() {
    let args = Args::parse().validated();
    init_logging(args.verbose);

    if let Err(e) = ctrlc::set_handler(|| {
        println!("\n\n{}", goodbye(&OutputFormatter::default()));
        std::process::exit(0);
    }) {
        tracing::warn!(error = %e, "could not install Ctrl-C handler");
    }

    if let Err(e) = run_cli(args) {
        OutputFormatter::error(&e.to_string());
        std::process::exit(1);
    }
}

/// Logs go to stderr. `RUST_LOG` wins over `-v`.
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("filegod={level}")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
