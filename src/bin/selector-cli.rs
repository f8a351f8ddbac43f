use std::process::ExitCode;

use clap::{Parser, Subcommand};

use instance_selector::admin::handlers::{CommandRequest, CommandResponse, StatsResponse, PING_MESSAGE};
use instance_selector::ranking::{Candidate, MISSING};

#[derive(Parser)]
#[command(name = "selector-cli")]
#[command(about = "Control client for the instance selector", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the ranked instances and their latencies
    Stats,
    /// Refresh the instance list now
    Update,
}

impl Commands {
    fn name(&self) -> &'static str {
        match self {
            Commands::Stats => "stats",
            Commands::Update => "update",
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let base = cli.url.trim_end_matches('/');
    let client = reqwest::Client::new();

    if !is_running(&client, base).await {
        eprintln!("instance-selector is not running at {}", base);
        return Ok(ExitCode::FAILURE);
    }

    let response: CommandResponse = client
        .post(format!("{}/cmd", base))
        .json(&CommandRequest {
            name: cli.command.name().to_string(),
            body: String::new(),
        })
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    if !response.error.is_empty() {
        eprintln!("{}", response.error);
        return Ok(ExitCode::FAILURE);
    }

    match cli.command {
        Commands::Stats => {
            let stats: StatsResponse = serde_json::from_str(&response.body)?;
            for candidate in &stats.candidates {
                print_candidate(candidate);
            }
        }
        Commands::Update => println!("{}", response.body),
    }

    Ok(ExitCode::SUCCESS)
}

/// `/ping` answers `<name>;<pid>`.
async fn is_running(client: &reqwest::Client, base: &str) -> bool {
    let Ok(response) = client.get(format!("{}/ping", base)).send().await else {
        return false;
    };
    if !response.status().is_success() {
        return false;
    }
    response
        .text()
        .await
        .is_ok_and(|body| body.split(';').next() == Some(PING_MESSAGE))
}

fn latency(seconds: f64) -> String {
    if seconds > f64::EPSILON && seconds != MISSING {
        format!("{:.2}s", seconds)
    } else {
        "N/A".to_string()
    }
}

fn print_candidate(candidate: &Candidate) {
    let in_use = if candidate.is_current { " (In Use)" } else { "" };
    println!("[{:.2}] {}{}", candidate.score, candidate.url(), in_use);

    let t = &candidate.instance.timings;
    println!("Latency:");
    println!("  - Initial:\t{}", latency(t.initial));
    println!("  - Search:\t{}", latency(t.search));
    println!("  - Google:\t{}", latency(t.google));
    println!("  - Wikipedia:\t{}", latency(t.wikipedia));
}
