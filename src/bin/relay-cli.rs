use clap::{Parser, Subcommand};
use reqwest::header::AUTHORIZATION;
use serde_json::Value;

use garuda_relay::sdk::{RelayClient, DEFAULT_MOUNT_PATH};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Call the Garuda backend through a running relay", long_about = None)]
struct Cli {
    /// Relay base URL.
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Path the relay is mounted under.
    #[arg(short, long, default_value = DEFAULT_MOUNT_PATH)]
    mount: String,

    /// Bearer token for backend calls.
    #[arg(short, long)]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Relay status (needs the admin API key)
    Status {
        #[arg(short, long)]
        key: String,
    },
    /// List verified lands
    Lands,
    /// Show one verified land
    Land { id: String },
    /// Log in and print the token
    Login { identifier: String, password: String },
    /// List signup roles
    Roles,
}

/// Fetch `/admin/status`; a non-2xx answer is an error.
async fn admin_status(url: &str, key: &str) -> Result<Value, Box<dyn std::error::Error>> {
    let res = reqwest::Client::builder()
        .no_proxy()
        .build()?
        .get(format!("{}/admin/status", url.trim_end_matches('/')))
        .header(AUTHORIZATION, format!("Bearer {key}"))
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        let body = res.text().await.unwrap_or_default();
        return Err(format!("admin API returned status {status}: {body}").into());
    }
    Ok(res.json::<Value>().await?)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut client = RelayClient::with_mount_path(&cli.url, &cli.mount)?;
    if let Some(token) = cli.token {
        client = client.with_token(token);
    }

    let value = match cli.command {
        Commands::Status { key } => admin_status(&cli.url, &key).await?,
        Commands::Lands => client.verified_lands().await?,
        Commands::Land { id } => client.verified_land(&id).await?,
        Commands::Login { identifier, password } => {
            serde_json::to_value(client.login(&identifier, &password).await?)?
        }
        Commands::Roles => client.roles().await?,
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
