use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod page;
mod shell;

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn init_tracing(log_level: &str) {
    // RUST_LOG wins over the command line; `log` records are bridged by the fmt subscriber.
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = shell::Cli::parse();
    init_tracing(&cli.log_level);
    shell::run(&cli)
}
