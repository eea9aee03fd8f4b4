use snapbin_api::{setup, telemetry};
use snapbin_core::Config;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    let config = Config::from_env()?;

    telemetry::init_tracing();

    let (state, router) = setup::initialize_app(config.clone()).await?;

    setup::server::start_server(&config, router, state.shutdown.clone()).await?;

    Ok(())
}
