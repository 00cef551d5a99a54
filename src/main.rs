use clap::Parser;
use pet_adoption::{
    CliArgs, LoggingConfig, ServerConfig, init_logging, run_server, shutdown_telemetry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _guard = init_logging(LoggingConfig::from_env())?;

    // Validates store settings before anything binds.
    let config = ServerConfig::from_args(CliArgs::parse())?;

    let result = run_server(config).await;

    // Flush traces before exit
    shutdown_telemetry();

    result
}
