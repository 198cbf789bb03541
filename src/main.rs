use clap::Parser;

use hemmer_provider_commonfate::{init_logging, serve_with_options, CommonFateProvider, ServeOptions};

/// Hemmer provider for Common Fate.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Log at debug level and print reattach instructions.
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    init_logging(if args.debug { "debug" } else { "info" });

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Common Fate provider");
    serve_with_options(
        CommonFateProvider::new(),
        ServeOptions::new().with_debug(args.debug),
    )
    .await
}
