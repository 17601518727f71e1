use bridge_sdk::{BridgeClient, CallRequest, CallResponse, PublishRequest};
use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "bridge-cli")]
#[command(about = "Publish and call through a running pubsub-bridge", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://127.0.0.1:8181")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish an event to a topic
    Pub {
        topic: String,
        /// Positional arguments as a JSON array
        #[arg(default_value = "[]")]
        args: String,
        /// Keyword arguments as a JSON object
        #[arg(long)]
        kwargs: Option<String>,
        /// Publish options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },
    /// Call a procedure and print its result
    Call {
        procedure: String,
        /// Positional arguments as a JSON array
        args: Option<String>,
        /// Keyword arguments as a JSON object
        #[arg(long)]
        kwargs: Option<String>,
        /// Call options as a JSON object
        #[arg(long)]
        options: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = BridgeClient::new(&cli.url);

    match cli.command {
        Commands::Pub {
            topic,
            args,
            kwargs,
            options,
        } => {
            let req = PublishRequest {
                topic,
                args: serde_json::from_str(&args)?,
                args_kw: parse_object(kwargs)?,
                options: parse_object(options)?,
            };
            client.publish(&req).await?;
            println!("published to {}", req.topic);
        }
        Commands::Call {
            procedure,
            args,
            kwargs,
            options,
        } => {
            let req = CallRequest {
                procedure,
                args: args.map(|a| serde_json::from_str(&a)).transpose()?,
                args_kw: parse_object(kwargs)?,
                options: parse_object(options)?,
            };
            match client.call(&req).await? {
                CallResponse::Success { args, args_kw, .. } => {
                    println!("{}", serde_json::to_string_pretty(&args)?);
                    if let Some(kw) = args_kw {
                        println!("{}", serde_json::to_string_pretty(&kw)?);
                    }
                }
                CallResponse::Error {
                    error_uri,
                    error_args,
                    ..
                } => {
                    eprintln!("Error: {}", error_uri);
                    if let Some(args) = error_args {
                        eprintln!("{}", serde_json::to_string_pretty(&args)?);
                    }
                    std::process::exit(1);
                }
            }
        }
    }

    Ok(())
}

fn parse_object(raw: Option<String>) -> Result<Option<Map<String, Value>>, serde_json::Error> {
    raw.map(|r| serde_json::from_str(&r)).transpose()
}
