use clap::Parser;

use selfcare_companion::config::{DatabaseConfig, ServerConfig};
use selfcare_companion::daemon;
use selfcare_companion::error::Result;
use selfcare_companion::Config;

#[derive(Parser, Debug)]
#[command(name = "selfcare-companion")]
#[command(about = "Self-care suggestions, chat, and reminders over HTTP")]
struct Cli {
    /// JSON config file; environment variables and flags override it.
    #[arg(long, env = "SELFCARE_CONFIG")]
    config: Option<String>,

    #[arg(long)]
    host: Option<String>,

    #[arg(long)]
    port: Option<u16>,

    #[arg(long)]
    db: Option<String>,
}

impl Cli {
    fn load_config(&self) -> Result<Config> {
        let config = match &self.config {
            Some(path) => Config::from_file(path)?,
            None => Config::convention_defaults(),
        };
        let mut config = config.apply_env()?;

        if self.host.is_some() || self.port.is_some() {
            let server = config.server.get_or_insert_with(ServerConfig::default);
            if let Some(host) = &self.host {
                server.host = Some(host.clone());
            }
            if let Some(port) = self.port {
                server.port = Some(port);
            }
        }
        if let Some(db) = &self.db {
            config
                .database
                .get_or_insert_with(DatabaseConfig::default)
                .sqlite_path = Some(db.clone());
        }
        Ok(config)
    }
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!("Could not listen for Ctrl-C: {}", err);
        futures::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    selfcare_companion::logging::init_tracing("selfcare_companion");
    let cli = Cli::parse();
    let config = cli.load_config()?;

    daemon::run_with_shutdown(config, shutdown_signal()).await
}
