//! minirag CLI entry point

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use minirag::{
    commands::{
        cmd_chat, cmd_create, cmd_init, cmd_list, cmd_query, print_collections,
        print_create_summary, print_query_output,
    },
    config::Config,
    error::Result,
    progress::{set_bars_enabled, LogWriterFactory},
    session::Session,
    store::CollectionStore,
};
use std::path::PathBuf;
use tracing::error;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[derive(Parser)]
#[command(name = "minirag")]
#[command(version, about = "Chat with your documents through a local RAG pipeline", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, env = "MINIRAG_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Model backend (ollama, openai, fastembed); overrides the config file
    #[arg(short, long, global = true, env = "MINIRAG_BACKEND")]
    backend: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the model, optionally grounded in a collection (default)
    Chat {
        /// Chat model to use
        #[arg(short, long)]
        model: Option<String>,

        /// Number of chunks retrieved as context
        #[arg(short)]
        k: Option<usize>,
    },

    /// Ingest documents into a named collection (replaces an existing one)
    Create {
        /// Collection name
        name: String,

        /// Files or directories to ingest
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// List stored collections
    List,

    /// Retrieve the context a collection gives for a query
    Query {
        /// Collection to search
        collection: String,

        /// The search query
        query: String,

        /// Number of chunks to return
        #[arg(short)]
        k: Option<usize>,
    },

    /// Write a default configuration file
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(LogWriterFactory))
        .with(filter)
        .init();

    if cli.json {
        set_bars_enabled(false);
    }

    let command = cli.command.unwrap_or(Commands::Chat {
        model: None,
        k: None,
    });

    // Commands that don't need a config or provider
    match &command {
        Commands::Init { force } => {
            let path = cli.config.clone().unwrap_or_else(Config::default_config_path);
            let written = cmd_init(&path, *force)?;
            println!("✓ Wrote config to {}", written.display());
            return Ok(());
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(*shell, &mut cmd, "minirag", &mut std::io::stdout());
            return Ok(());
        }
        _ => {}
    }

    let mut config = Config::load_or_default(cli.config.as_deref())?;
    if let Some(backend) = cli.backend {
        config.provider.backend = backend;
        config.validate()?;
    }

    match command {
        Commands::Chat { model, k } => {
            let k = k.unwrap_or(config.query.default_k);
            let mut session = Session::from_config(config)?;
            if let Some(model) = model {
                session = session.with_chat_model(model);
            }
            cmd_chat(&mut session, k).await?;
        }
        Commands::Create { name, paths } => {
            let session = Session::from_config(config)?;
            let summary = cmd_create(&session, &name, &paths).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
            } else {
                print_create_summary(&summary);
            }
        }
        Commands::List => {
            let collections = cmd_list(&CollectionStore::from_config(&config))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&collections)?);
            } else {
                print_collections(&collections);
            }
        }
        Commands::Query {
            collection,
            query,
            k,
        } => {
            let k = k.unwrap_or(config.query.default_k);
            let session = Session::from_config(config)?;
            let output = cmd_query(&session, &collection, &query, k).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                print_query_output(&output);
            }
        }
        Commands::Init { .. } | Commands::Completions { .. } => {}
    }

    Ok(())
}
