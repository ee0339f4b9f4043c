use std::sync::Arc;

use fw_core::{config::Config, ports::SnapshotSource};
use fw_ivao::WhazzupClient;

#[tokio::main]
async fn main() -> Result<(), fw_core::Error> {
    fw_core::logging::init("flightwatch")?;

    let cfg = Arc::new(Config::load()?);

    let source: Arc<dyn SnapshotSource> = Arc::new(WhazzupClient::new(
        cfg.whazzup_url.clone(),
        cfg.fetch_timeout,
    )?);

    fw_telegram::router::run_polling(cfg, source)
        .await
        .map_err(|e| fw_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
