/*
ASC_ISSUER_ID='issuer_id' ASC_KEY_ID='key_id' ASC_PRIVATE_KEY_PATH='/path/AuthKey_xxx.p8' ASC_APP_ID='app_id' \
    cargo run -p apple-app-store-connect-metadata-cli --bin apple_app_store_connect_metadata_setup

Optional: ASC_METADATA_PATH='/path/metadata.toml' RUST_LOG=debug
*/

use apple_app_store_connect_metadata::{
    apple_app_store_connect_api_client::Client, run, Config,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("App Store Connect Metadata Setup");

    let config = Config::from_env()?;
    let content = config.content()?;

    let client = Client::new(&config.credentials()?)?;
    info!("[1] JWT token generated successfully");

    run(&client, &config, &content).await?;

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_filter(filter),
        )
        .init();
}
