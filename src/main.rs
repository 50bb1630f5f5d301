use anyhow::Result;
use clap::{Parser, Subcommand};
use log::info;

use fireberry_mcp::config::{BASE_URL_ENV_VAR, DEFAULT_BASE_URL, TOKEN_ENV_VAR};
use fireberry_mcp::{Config, FireberryMcpServer};

#[derive(Parser)]
#[command(name = "fireberry-mcp", version, about = "MCP server for the Fireberry CRM API")]
struct Cli {
    /// Fireberry API token
    #[arg(long, env = TOKEN_ENV_VAR, hide_env_values = true)]
    token: Option<String>,

    /// CRM API base URL
    #[arg(long, env = BASE_URL_ENV_VAR, default_value = DEFAULT_BASE_URL)]
    base_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve MCP over stdin/stdout (default)
    Stdio,
    /// Expose the tools as a local HTTP API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "15424", env = "FIREBERRY_MCP_PORT")]
        port: u16,

        /// Bind address
        #[arg(short, long, default_value = "127.0.0.1")]
        bind: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // env_logger writes to stderr, which keeps stdout free for the protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::new(cli.token, &cli.base_url)?;
    info!("Using Fireberry API at {}", config.base_url);
    let server = FireberryMcpServer::from_config(&config)?;

    match cli.command.unwrap_or(Commands::Stdio) {
        Commands::Stdio => fireberry_mcp::mcp::stdio::serve_stdio(server).await?,
        Commands::Serve { port, bind } => fireberry_mcp::http::serve(&bind, port, server).await?,
    }

    Ok(())
}
