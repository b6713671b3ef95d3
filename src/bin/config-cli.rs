use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "config-cli")]
#[command(about = "Management CLI for the chat bot configuration service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:7777")]
    url: String,

    /// Admin API key (HTTP_AUTH_KEY of the server). Needed by `get` and `set`.
    #[arg(short, long, env = "HTTP_AUTH_KEY")]
    key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check that the service is up
    Ping,
    /// Print the current value of a config section
    Get {
        /// config, adapter, render, pm2, redis, groups, privates or env
        section: String,
    },
    /// Merge a JSON object into a config section and save it
    Set {
        section: String,
        /// JSON object, e.g. '{"admin":["123"]}'
        data: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Ping => {
            let res = client.get(format!("{}/api/v1/ping", cli.url)).send().await?;
            println!("{}", res.text().await?);
        }
        Commands::Get { section } => {
            let res = client.post(format!("{}/api/v1/config/get", cli.url))
                .headers(auth_headers(cli.key.as_deref())?)
                .json(&json!({ "type": section }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Set { section, data } => {
            let data: Value = serde_json::from_str(&data)?;
            let res = client.post(format!("{}/api/v1/config/set", cli.url))
                .headers(auth_headers(cli.key.as_deref())?)
                .json(&json!({ "type": section, "data": data }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

fn auth_headers(key: Option<&str>) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let key = key.ok_or("admin key required: pass --key or set HTTP_AUTH_KEY")?;
    let mut headers = HeaderMap::new();
    headers.insert(AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {}", key))?);
    Ok(headers)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: admin API returned status {}", status);
        eprintln!("Response: {}", text);
        std::process::exit(1);
    }

    let json: Value = serde_json::from_str(&text)?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
