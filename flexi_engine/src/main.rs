//! Entry point for the Flexi Engine binary.
//!
//! Running this binary starts an HTTP server that exposes the flexi
//! account API.  Settings are read from the environment (and a `.env`
//! file if present); see [`flexi_engine::settings`] for the variables.
//! Log verbosity follows `RUST_LOG` and defaults to `info`.

use flexi_engine::settings::Settings;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::from_env()?;
    tracing::info!(
        start_date = %settings.config.start_date,
        test_mode = settings.config.test_mode,
        "starting flexi engine"
    );
    flexi_engine::api::serve(settings).await
}
