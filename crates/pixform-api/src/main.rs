use pixform_core::Config;

// mimalloc as the global allocator
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize the application (telemetry, upload directory, routes)
    let (_state, router) = pixform_api::setup::initialize_app(config.clone()).await?;

    // Start the server
    pixform_api::setup::server::start_server(&config, router).await?;

    Ok(())
}
