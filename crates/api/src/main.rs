//! voltlog - surge-protection voltage log server

use api::{config::Settings, init_logging, run_server};
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_logging(&settings.logging)?;

    info!("=== voltlog v{} ===", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run_server(settings).await {
        error!("{:#}", e);
        std::process::exit(1);
    }

    Ok(())
}
