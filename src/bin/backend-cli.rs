use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use signing_backend::http::middleware::signature::unix_timestamp;
use signing_backend::signing;

#[derive(Parser)]
#[command(name = "backend-cli")]
#[command(about = "Management CLI for the signing backend", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8081")]
    url: String,

    #[arg(short, long, env = "ADMIN_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check backend status
    Status,
    /// Reload the environment cache from the database
    Reload,
    /// List environment entries, or show one by name or key code (secret masked)
    Environment {
        /// e.g. VERSION or 10000002
        key: Option<String>,
    },
    /// Show the trusted proxy set
    Proxies,
    /// Rebuild the trusted proxy set
    RefreshProxies,
    /// Compute a response signature locally
    Sign(SignArgs),
    /// Check a response signature locally
    Verify {
        #[command(flatten)]
        args: SignArgs,

        /// Value of the X-Signature header
        #[arg(long)]
        signature: String,
    },
}

#[derive(Args)]
struct SignArgs {
    #[arg(long)]
    secret: String,

    #[arg(long)]
    project_id: String,

    #[arg(long = "app-version")]
    app_version: String,

    /// UNIX seconds; defaults to now
    #[arg(long)]
    timestamp: Option<u64>,

    /// Response body text
    #[arg(long, conflicts_with = "body_file")]
    body: Option<String>,

    /// Read the response body from a file
    #[arg(long)]
    body_file: Option<PathBuf>,
}

impl SignArgs {
    fn body(&self) -> Result<String, std::io::Error> {
        match (&self.body, &self.body_file) {
            (Some(body), _) => Ok(body.clone()),
            (None, Some(path)) => Ok(signing::decode_utf8_ignoring_invalid(&std::fs::read(path)?)),
            (None, None) => Ok(String::new()),
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let path = match cli.command {
        Commands::Sign(args) => {
            let timestamp = args.timestamp.unwrap_or_else(unix_timestamp);
            let body = args.body()?;
            let signature = signing::sign(&args.secret, &args.project_id, &args.app_version, timestamp, &body);
            println!("X-Signature: {signature}");
            println!("X-Timestamp: {timestamp}");
            println!("X-Project-ID: {}", signing::encode_base64(&args.project_id));
            println!("X-Version: {}", signing::encode_base64(&args.app_version));
            return Ok(());
        }
        Commands::Verify { args, signature } => {
            let Some(timestamp) = args.timestamp else {
                return Err("--timestamp is required to verify".into());
            };
            let body = args.body()?;
            if signing::verify(&args.secret, &args.project_id, &args.app_version, timestamp, &body, &signature) {
                println!("Signature valid");
                return Ok(());
            }
            eprintln!("Signature mismatch");
            std::process::exit(1);
        }
        Commands::Status => ("GET", "/admin/status".to_string()),
        Commands::Reload => ("POST", "/admin/reload".to_string()),
        Commands::Environment { key: None } => ("GET", "/admin/environment".to_string()),
        Commands::Environment { key: Some(key) } => ("GET", format!("/admin/environment/{key}")),
        Commands::Proxies => ("GET", "/admin/trusted-proxies".to_string()),
        Commands::RefreshProxies => ("POST", "/admin/trusted-proxies/refresh".to_string()),
    };

    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let (method, route) = path;
    let url = format!("{}{}", cli.url.trim_end_matches('/'), route);
    let request = match method {
        "POST" => client.post(url),
        _ => client.get(url),
    };
    let res = request.headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
