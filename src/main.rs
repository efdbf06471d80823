use clap::Parser;
use diffdrive_ddsm115::runtime::{self, RuntimeOptions};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let opts = RuntimeOptions::parse();

    // Setup logging (set RUST_LOG=info or debug)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init(); // installs the subscriber globally

    if let Err(e) = runtime::run(opts).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
