use clap::Parser;
use promptflow_server::logging::init_logging;
use promptflow_server::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let config = ServerConfig::parse();
    init_logging(&config.log_level, config.log_format);

    promptflow_server::serve(config).await
}
