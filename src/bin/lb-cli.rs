use clap::{Parser, Subcommand};
use serde_json::Value;

use lb_proxy::admin::{StatusReport, STATUS_PATH};

#[derive(Parser)]
#[command(name = "lb-cli")]
#[command(about = "Inspect a running lb-proxy", long_about = None)]
struct Cli {
    #[arg(short, long, env = "LB_URL", default_value = "http://localhost:5010")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the raw status report
    Status,
    /// One line per backend; exits non-zero when none is healthy
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let url = format!("{}{}", cli.url.trim_end_matches('/'), STATUS_PATH);

    let res = client.get(&url).send().await?;
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: {} returned status {}", url, status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    match cli.command {
        Commands::Status => {
            let json: Value = res.json().await?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Health => {
            let report: StatusReport = res.json().await?;
            for backend in &report.backends {
                let last_check = backend
                    .last_check
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "never".to_string());
                println!(
                    "{:<40} {:<9} {}",
                    backend.url,
                    if backend.healthy { "healthy" } else { "UNHEALTHY" },
                    last_check
                );
            }
            println!("{}/{} healthy", report.healthy_count(), report.backends.len());

            if report.healthy_count() == 0 {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}
