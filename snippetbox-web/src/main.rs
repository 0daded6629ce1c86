use anyhow::Context;
use snippetbox_web::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("failed to load configuration")?;
    init_tracing(&config)?;

    let state = AppState::builder()
        .config(config.clone())
        .build()
        .context("failed to build template registry")?;

    Server::new(config).serve(router(state)).await?;

    shutdown_tracing();
    Ok(())
}
