mod api;
mod chat_cmd;

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;

use bliss_config::Config;
use bliss_memory::ConversationLog;
use bliss_persona::PersonaStore;
use bliss_responder::{providers::OllamaChat, Responder};

#[derive(Parser)]
#[command(name = "bliss")]
#[command(about = "Bliss — personality-driven chat assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat interactively from the terminal
    Chat {
        /// Persona to load
        #[arg(short, long, default_value = "default")]
        persona: String,
        /// Session the conversation is stored under
        #[arg(short, long, default_value = "default")]
        session: String,
        /// Number of recent turns replayed as context
        #[arg(long, default_value_t = 5)]
        context_limit: usize,
        /// Capture input by voice as well as typing
        #[arg(long)]
        voice: bool,
        /// Speak replies aloud
        #[arg(long)]
        speak: bool,
    },
    /// Serve the HTTP API for UIs
    Serve {
        /// Port to bind the HTTP server to
        #[arg(short, long)]
        port: Option<u16>,
    },
    /// List available personas
    Personas,
    /// Check that Ollama is reachable and the model is present
    Status,
    /// Create the data layout and a persona template
    Init,
    /// Delete all stored turns for a session
    Clear {
        #[arg(short, long, default_value = "default")]
        session: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Chat {
            persona,
            session,
            context_limit,
            voice,
            speak,
        } => {
            let responder = build_responder(&config)?;
            chat_cmd::run(
                responder,
                &config,
                chat_cmd::ChatOptions {
                    persona,
                    session,
                    context_limit,
                    voice,
                    speak,
                },
            )
            .await?;
        }
        Commands::Serve { port } => {
            let config = Config {
                port: port.unwrap_or(config.port),
                ..config
            };
            run_server(config).await?;
        }
        Commands::Personas => {
            let store = PersonaStore::new(config.personas_dir.as_str());
            let names = store.list_available();
            if names.is_empty() {
                println!("No personas found in {}", config.personas_dir);
            } else {
                for name in names {
                    println!("{name}");
                }
            }
        }
        Commands::Status => {
            let responder = build_responder(&config)?;
            match responder.check_model().await {
                Ok(true) => {
                    println!(
                        "✓ Connected to Ollama; model '{}' is available",
                        config.model
                    );
                }
                Ok(false) => {
                    println!("✗ Model '{}' not found.", config.model);
                    println!("Try: ollama pull {}", config.model);
                    std::process::exit(1);
                }
                Err(err) => {
                    println!("✗ Failed to connect to Ollama at {}: {err}", config.ollama_url);
                    println!("Make sure Ollama is running with: ollama serve");
                    std::process::exit(1);
                }
            }
        }
        Commands::Init => {
            ConversationLog::open(&config.db_path)?;
            println!("Database ready at {}", config.db_path);
            bliss_persona::write_template(&config.personas_dir)?;
            println!("Persona template ready in {}", config.personas_dir);
        }
        Commands::Clear { session } => {
            let responder = build_responder(&config)?;
            let removed = responder.clear_session(&session).await?;
            println!("Removed {removed} turns from session '{session}'");
        }
    }

    Ok(())
}

fn build_responder(config: &Config) -> Result<Arc<Responder>> {
    let personas = PersonaStore::new(config.personas_dir.as_str());
    let log = Arc::new(ConversationLog::open(&config.db_path)?);
    let model = Arc::new(OllamaChat::new().with_base_url(config.ollama_url.as_str()));
    Ok(Arc::new(Responder::new(
        personas,
        log,
        model,
        config.model.as_str(),
    )))
}

async fn run_server(config: Config) -> Result<()> {
    let responder = build_responder(&config)?;
    let state = Arc::new(api::AppState { responder });
    let app = api::build_router(state);

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        db = %config.db_path,
        model = %config.model,
        "Starting Bliss API server"
    );
    axum::serve(listener, app).await?;
    Ok(())
}
