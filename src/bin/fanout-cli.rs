use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, CONTENT_TYPE};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "fanout-cli")]
#[command(about = "Send batches to a running split-fanout handler", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// POST a JSON batch read from a file ("-" for stdin)
    Send {
        file: PathBuf,
    },
    /// Check that the handler is up
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Send { file } => {
            let body = read_batch(&file)?;
            let res = client
                .post(format!("{}/", cli.url))
                .header(CONTENT_TYPE, HeaderValue::from_static("application/json"))
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", cli.url)).send().await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn read_batch(file: &Path) -> std::io::Result<String> {
    if file.as_os_str() == "-" {
        let mut body = String::new();
        std::io::stdin().read_to_string(&mut body)?;
        Ok(body)
    } else {
        std::fs::read_to_string(file)
    }
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    eprintln!("Status: {} (request {})", status, request_id);

    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }

    if !status.is_success() {
        std::process::exit(1);
    }
    Ok(())
}
