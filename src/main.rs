use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use uid_agent::auth::rotation::{spawn_rotation, DEFAULT_ROTATION_INTERVAL};
use uid_agent::auth::{ClientConfig, GatewayClient, IdentityClient};
use uid_agent::service::database::DatabaseService;
use uid_agent::store::{FileTokenStore, TokenStore, ACCESS_ID};
use uid_agent::utils;

const DEFAULT_ACCESS_ID: &str = "/demo/uid-non-human-auth";

#[derive(Parser)]
#[command(name = "uid-agent", version, about = "Secretless non-human authentication agent")]
struct AppCli {
    /// Path to the identity token storage file
    #[arg(long, default_value = "tokens/application-service-token", global = true)]
    token_file: String,

    /// Authentication method identifier (defaults to the stored ACCESS_ID)
    #[arg(long, global = true)]
    access_id: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a secret value
    Secret { name: String },
    /// Rotate the identity token
    Rotate,
    /// Derive a child token
    ChildToken {
        #[arg(long, default_value_t = 60)]
        ttl_minutes: u64,
    },
    /// Run the database-service demo flow
    Demo,
    /// Run as an agent: rotate the identity token on a schedule
    Run {
        #[arg(long)]
        rotate_interval_minutes: Option<u64>,
    },
}

fn resolve_access_id(store: &FileTokenStore, override_id: Option<String>) -> String {
    if let Some(id) = override_id {
        return id;
    }
    store
        .load()
        .ok()
        .and_then(|record| record.get(ACCESS_ID).map(str::to_string))
        .unwrap_or_else(|| DEFAULT_ACCESS_ID.to_string())
}

#[tokio::main]
async fn main() -> Result<()> {
    utils::logging::init();

    let args = AppCli::parse();

    let store = FileTokenStore::new(&args.token_file);
    let access_id = resolve_access_id(&store, args.access_id);

    let gateway = GatewayClient::from_env()
        .context("initializing gateway client")?
        .context("gateway not configured: set UID_GATEWAY_URL")?;

    let client = Arc::new(IdentityClient::new(
        Arc::new(store),
        Arc::new(gateway),
        ClientConfig::new(access_id),
    ));

    match args.command {
        Commands::Secret { name } => {
            let value = client.get_secret(&name).await?;
            println!("{value}");
        }
        Commands::Rotate => {
            client.rotate_identity_token().await?;
            info!("identity token rotated");
        }
        Commands::ChildToken { ttl_minutes } => {
            let child = client
                .create_child_token(Duration::from_secs(ttl_minutes * 60))
                .await?;
            println!("{}", child.token);
        }
        Commands::Demo => {
            let mut service = DatabaseService::new(client);
            service.connect("/demo/database-config").await?;
            let result = service.query("SELECT * FROM users")?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Commands::Run { rotate_interval_minutes } => {
            let interval = rotate_interval_minutes
                .map(|m| Duration::from_secs(m * 60))
                .unwrap_or(DEFAULT_ROTATION_INTERVAL);
            info!(interval_secs = interval.as_secs(), "agent starting, rotation scheduled");

            let rotation_handle = spawn_rotation(client, interval);

            // Wait for shutdown signal (Ctrl+C) then stop the rotation loop
            tokio::signal::ctrl_c().await?;
            info!("shutdown signal received, stopping agent");

            rotation_handle.abort();
            let _ = rotation_handle.await; // Ignore cancellation errors
        }
    }

    Ok(())
}
