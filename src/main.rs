//! mcp-host binary entry point.

use std::sync::Arc;

use clap::Parser;
use mcp_host::cli::{Cli, Commands, ServeArgs, ToolsArgs};
use mcp_host::config::HostSettings;
use mcp_host::host::Host;
use mcp_host::mcp::McpConnector;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.log_json);

    let result = match cli.command {
        Commands::Serve(args) => handle_serve(cli.config.as_deref(), args).await,
        Commands::Tools(args) => handle_tools(cli.config.as_deref(), args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn handle_serve(
    config: Option<&std::path::Path>,
    args: ServeArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = HostSettings::load(config)?;
    args.apply(&mut settings);
    settings.validate()?;

    let host = Arc::new(Host::from_settings(&settings, &McpConnector::default()).await?);
    let listener = TcpListener::bind(&settings.bind).await?;

    let shutdown = CancellationToken::new();
    let trigger = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received, shutting down"),
            Err(error) => warn!(%error, "cannot listen for interrupt; shutting down"),
        }
        trigger.cancel();
    });

    mcp_host::server::serve(host, listener, shutdown).await?;
    Ok(())
}

async fn handle_tools(
    config: Option<&std::path::Path>,
    args: ToolsArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = HostSettings::load(config)?;
    args.apply(&mut settings);
    settings.validate()?;

    let host = Host::from_settings(&settings, &McpConnector::default()).await?;
    let listed = host.catalog().collect().await;
    host.shutdown().await;

    for tool in listed? {
        match &tool.tool.description {
            Some(description) => println!("{}\t{}", tool.id(), description),
            None => println!("{}", tool.id()),
        }
    }
    Ok(())
}
