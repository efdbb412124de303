use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};

#[derive(Parser)]
#[command(name = "glutton-cli")]
#[command(about = "Client for a running glutton", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:4354")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a token for a gated route
    Token {
        /// Route uri, e.g. `save`
        uri: String,
    },
    /// Post a payload to a route
    Send {
        /// Route uri, e.g. `save`
        uri: String,

        /// Payload text
        #[arg(short = 'D', long, conflicts_with = "file")]
        data: Option<String>,

        /// Read the payload from a file
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Fetch a token first and send it along
        #[arg(short = 't', long)]
        with_token: bool,
    },
}

fn route_url(base: &str, uri: &str) -> String {
    format!("{}/v1/glutton/{}", base.trim_end_matches('/'), uri.trim_matches('/'))
}

async fn fetch_token(client: &reqwest::Client, base: &str, uri: &str) -> Result<String, Box<dyn std::error::Error>> {
    let res = client.get(format!("{}/token", route_url(base, uri))).send().await?;
    let status = res.status();
    let body = res.text().await?;
    if !status.is_success() {
        return Err(format!("token request returned status {status}: {body}").into());
    }
    Ok(body)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::builder().redirect(reqwest::redirect::Policy::none()).build()?;

    match cli.command {
        Commands::Token { uri } => {
            println!("{}", fetch_token(&client, &cli.url, &uri).await?);
        }
        Commands::Send { uri, data, file, with_token } => {
            let payload = match (data, file) {
                (Some(data), _) => data,
                (None, Some(path)) => tokio::fs::read_to_string(path).await?,
                (None, None) => String::new(),
            };

            let mut headers = HeaderMap::new();
            if with_token {
                let token = fetch_token(&client, &cli.url, &uri).await?;
                headers.insert("token", HeaderValue::from_str(&token)?);
            }

            let res = client
                .post(route_url(&cli.url, &uri))
                .headers(headers)
                .body(payload)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let location = res
        .headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(String::from);
    let text = res.text().await?;

    if status.is_success() || status.is_redirection() {
        println!("{status}");
        if let Some(location) = location {
            println!("Location: {location}");
        }
        return Ok(());
    }

    eprintln!("Error: glutton returned status {status}");
    if !text.is_empty() {
        eprintln!("Response: {text}");
    }
    Ok(())
}
