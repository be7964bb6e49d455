use colored::Colorize;
use tracing_subscriber::EnvFilter;

use trackgen::cli::CommandLineInterface;

fn init_tracing(verbose: u8) {
    // -v wins over RUST_LOG; with neither, only warnings
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let command_line_interface = CommandLineInterface::load();
    init_tracing(command_line_interface.verbosity());
    if let Err(error) = command_line_interface.run() {
        eprintln!("{} {error:#}", "error:".red().bold());
        std::process::exit(1);
    }
}
