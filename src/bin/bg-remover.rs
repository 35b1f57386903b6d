//! Background Remover CLI Tool
//!
//! Sends images to a background removal service and saves the transparent
//! results.

#[cfg(feature = "cli")]
use bg_remover_client::cli;

#[cfg(feature = "cli")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    cli::main().await
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Please rebuild with --features cli");
    std::process::exit(1);
}
