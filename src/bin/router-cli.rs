use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "router-cli")]
#[command(about = "Management CLI for the listing router", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "LISTINGS_ADMIN_KEY")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check router status
    Status,
    /// Show the current routing configuration
    Routing,
    /// Change routing at runtime
    SetRouting {
        /// Enable or disable the remote path
        #[arg(long)]
        enabled: Option<bool>,
        /// Canary rollout percentage (0-100)
        #[arg(long, value_parser = clap::value_parser!(u32).range(0..=100))]
        canary: Option<u32>,
        /// Let privileged callers bypass the canary
        #[arg(long)]
        admin_override: Option<bool>,
    },
    /// Explain the routing decision for a caller
    Decide {
        caller: String,
        #[arg(long)]
        privileged: bool,
    },
    /// Show circuit breaker state
    Circuit,
    /// Force the circuit open
    CircuitOpen,
    /// Force the circuit closed
    CircuitClose,
    /// Show routing counters
    Metrics,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );
    let client = reqwest::Client::builder().default_headers(headers).build()?;
    let base = cli.url.trim_end_matches('/');

    let request = match cli.command {
        Commands::Status => client.get(format!("{}/admin/status", base)),
        Commands::Routing => client.get(format!("{}/admin/routing", base)),
        Commands::SetRouting {
            enabled,
            canary,
            admin_override,
        } => client.put(format!("{}/admin/routing", base)).json(&json!({
            "remote_enabled": enabled,
            "canary_percentage": canary,
            "admin_override": admin_override,
        })),
        Commands::Decide { caller, privileged } => client
            .get(format!("{}/admin/decision", base))
            .query(&[("caller", caller), ("privileged", privileged.to_string())]),
        Commands::Circuit => client.get(format!("{}/admin/circuit", base)),
        Commands::CircuitOpen => client.post(format!("{}/admin/circuit/open", base)),
        Commands::CircuitClose => client.post(format!("{}/admin/circuit/close", base)),
        Commands::Metrics => client.get(format!("{}/admin/metrics", base)),
    };

    print_response(request.send().await?).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
