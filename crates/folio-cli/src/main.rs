mod commands;

#[cfg(feature = "watch")]
mod watcher;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Folio CLI - file-based page routing", long_about = None)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short = 'C', long, global = true)]
    root: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile the pages directory into the route store
    Build,

    /// List every route in the store
    Routes {
        /// Print the raw store document
        #[arg(long)]
        json: bool,
    },

    /// Match a request path against the store
    Match {
        /// Request path, e.g. /users/42
        path: String,

        /// HTTP method
        #[arg(short = 'X', long, default_value = "GET")]
        method: String,
    },

    /// Build the URL of a handler
    Url {
        /// Handler id, e.g. users/[[d:id]]
        handler: String,

        /// Parameters as key=value
        params: Vec<String>,

        /// Pick the route registered for this method
        #[arg(short = 'X', long)]
        method: Option<String>,
    },

    /// Rebuild routes whenever pages change
    Watch,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "folio=debug,folio_router=debug,folio_cli=debug"
    } else {
        "folio=info,folio_router=warn,folio_cli=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let root = match cli.root {
        Some(root) => root,
        None => std::env::current_dir()?,
    };

    match cli.command {
        Commands::Build => commands::build::execute(&root)?,
        Commands::Routes { json } => commands::routes::execute(&root, json)?,
        Commands::Match { path, method } => commands::match_route::execute(&root, &path, &method)?,
        Commands::Url {
            handler,
            params,
            method,
        } => commands::url::execute(&root, &handler, &params, method.as_deref())?,
        Commands::Watch => commands::watch::execute(&root)?,
    }

    Ok(())
}
