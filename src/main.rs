use clap::Parser;
use colored::*;
use std::process;
use tokio::io::BufReader;
use tracing_subscriber::EnvFilter;

use mongodb_mcp_client::cli::Args;
use mongodb_mcp_client::config::{init_config_file, user_config_dir, Config};
use mongodb_mcp_client::demos::Example;
use mongodb_mcp_client::{shell, Error, MongoMcpClient, Result};

#[tokio::main]
async fn main() {
    init_tracing();
    let args = Args::parse();

    let code = match run(args).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            1
        }
    };
    process::exit(code);
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("MDB_AI_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(args: Args) -> Result<i32> {
    if args.config_init {
        let dir = user_config_dir()
            .ok_or_else(|| Error::Config("Could not determine home directory".to_string()))?;
        let path = init_config_file(&dir)?;
        println!("{} {}", "Config file written to".green(), path.display());
        return Ok(0);
    }

    let config = Config::from_env_and_args(&args)?;

    if let Some(example) = args.example {
        run_example(&config, example).await?;
        return Ok(0);
    }

    match args.query_text() {
        Some(query) => Ok(run_single_query(&config, &query).await),
        None => run_interactive(&config).await,
    }
}

fn build_client(config: &Config, verbose: bool) -> Result<MongoMcpClient> {
    let options = config.client_options()?.with_verbose(verbose);
    MongoMcpClient::from_settings(options, &config.api_settings())
}

async fn run_example(config: &Config, example: Example) -> Result<()> {
    let mut client = build_client(config, config.verbose && example.verbose())?;
    client.connect().await?;
    let outcome = example.run(&mut client).await;
    client.close().await?;
    outcome
}

async fn run_single_query(config: &Config, query: &str) -> i32 {
    let outcome = async {
        let mut client = build_client(config, config.verbose)?;
        client.connect().await?;
        let result = client.query(query, None).await;
        client.close().await?;
        result
    }
    .await;

    match outcome {
        Ok(result) => {
            if !config.verbose {
                println!("{}", result.response);
            }
            0
        }
        Err(e) => {
            eprintln!("{} {}", "Error:".red(), e);
            1
        }
    }
}

async fn run_interactive(config: &Config) -> Result<i32> {
    shell::print_welcome();

    let mut client = build_client(config, true)?;
    if let Err(e) = client.connect().await {
        eprintln!("{} {}", "Connection Error:".red(), e);
        return Ok(1);
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let outcome = shell::run(&mut client, stdin).await;
    client.close().await?;
    outcome.map(|_| 0)
}
