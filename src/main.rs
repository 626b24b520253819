mod cli;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use colored::Colorize;

use icon_store::{CacheBackendKind, IconStoreConfig, LocalIconStore};

#[derive(Parser, Debug)]
#[command(name = "icon-store")]
#[command(version, about = "Manage a directory of uploaded SVG icon sets")]
struct Cli {
    /// Upload root (defaults to $ICON_STORE_ROOT or the user data directory)
    #[arg(long, global = true)]
    root: Option<PathBuf>,

    /// Public URL that serves the upload root
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Where cached listings are kept
    #[arg(long, value_enum, global = true, default_value = "memory")]
    cache: CacheArg,

    #[command(subcommand)]
    command: cli::IconCommand,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum CacheArg {
    Memory,
    File,
}

impl From<CacheArg> for CacheBackendKind {
    fn from(arg: CacheArg) -> Self {
        match arg {
            CacheArg::Memory => CacheBackendKind::Memory,
            CacheArg::File => CacheBackendKind::File,
        }
    }
}

#[tokio::main]
async fn main() {
    // stdout carries JSON, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Cli::parse();

    let mut config = IconStoreConfig::default();
    if let Some(root) = args.root {
        config.upload_root = root;
    }
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    config.cache_backend = args.cache.into();

    let store = match LocalIconStore::open(config).await {
        Ok(store) => store,
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    };

    match cli::run(&store, args.command).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("{} {}", "✗".red(), e);
            std::process::exit(1);
        }
    }
}
