use agency_portal::api::routes;
use agency_portal::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "agency_portal=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.dev_mode {
        tracing::warn!("DEV_MODE is on: requests get a synthetic identity");
    }

    routes::serve(config).await
}
