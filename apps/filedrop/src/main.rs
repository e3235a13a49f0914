//! filedrop command-line entry point.

mod config;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use filedrop_client::FileClient;
use filedrop_server::FileServer;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[derive(Parser, Debug)]
#[command(name = "filedrop")]
#[command(about = "Upload and download single files over TCP", version)]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Accept uploads and serve downloads until interrupted
    Serve {
        #[arg(short, long)]
        port: Option<u16>,

        /// Directory uploads are stored in
        #[arg(long)]
        storage_dir: Option<String>,
    },
    /// Upload a local file
    Upload {
        path: PathBuf,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,
    },
    /// Download a stored file as `down_<NAME>`
    Download {
        name: String,

        #[arg(long)]
        host: Option<String>,

        #[arg(short, long)]
        port: Option<u16>,

        /// Directory the file is written to
        #[arg(short, long)]
        out: Option<String>,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(run(cli.command, config))
}

async fn run(command: Commands, mut config: Config) -> anyhow::Result<()> {
    match command {
        Commands::Serve { port, storage_dir } => {
            config.port = port.unwrap_or(config.port);
            config.storage_dir = storage_dir.unwrap_or(config.storage_dir);
            serve(config).await
        }
        Commands::Upload { path, host, port } => {
            apply_client_overrides(&mut config, host, port);
            let client = FileClient::new(config.client_config());
            let bytes = client.upload(&path).await?;
            println!("uploaded {} ({bytes} bytes)", path.display());
            Ok(())
        }
        Commands::Download {
            name,
            host,
            port,
            out,
        } => {
            apply_client_overrides(&mut config, host, port);
            config.download_dir = out.unwrap_or(config.download_dir);
            let client = FileClient::new(config.client_config());
            let download = client.download(&name).await?;
            println!(
                "downloaded {name} to {} ({} bytes)",
                download.path.display(),
                download.bytes
            );
            Ok(())
        }
    }
}

fn apply_client_overrides(config: &mut Config, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        config.server_host = host;
    }
    if let Some(port) = port {
        config.port = port;
    }
}

async fn serve(config: Config) -> anyhow::Result<()> {
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        storage_dir = %config.storage_dir,
        "starting filedrop server"
    );

    let server = FileServer::new(config.server_config());
    let listener = server.bind().await?;

    tokio::select! {
        result = server.run(listener) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("interrupt received");
            server.shutdown();
        }
    }

    tracing::info!("server shut down cleanly");
    Ok(())
}
