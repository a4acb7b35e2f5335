//! Command-line interface parsing and handling
//!
//! This module parses command-line arguments and dispatches to the
//! interactive loop or one of the maintenance subcommands.

pub mod say;

use std::error::Error;
use std::io::{self, Write};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::api::{ChatBackend, GenerativeClient, DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::core::app::App;
use crate::core::config::Theme;
use crate::repl::run_chat;
use crate::storage::{self, DiskStore, StringStore};

#[derive(Parser)]
#[command(name = "scrivano")]
#[command(about = "A terminal chat client with an attached code workspace")]
#[command(
    long_about = "Scrivano is a terminal chat client for Gemini-style generative APIs. \
Fenced code blocks in model replies are extracted into a named-file workspace \
with per-file undo/redo, and HTML files can be assembled into a self-contained \
preview with their CSS/JS siblings inlined.\n\n\
Authentication:\n\
  Use 'scrivano auth' to store an API key, or set GEMINI_API_KEY.\n\n\
Chat commands:\n\
  /help             Show commands\n\
  /files            List extracted files\n\
  /edit <file>      Edit a file in $EDITOR\n\
  /preview [path]   Assemble the HTML preview"
)]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Model to use for generation
    #[arg(short, long, global = true, value_name = "MODEL")]
    pub model: Option<String>,

    /// Override the API base URL
    #[arg(long, global = true, value_name = "URL")]
    pub base_url: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the interactive chat (default)
    Chat,
    /// Send a single prompt and print the reply
    Say {
        /// The prompt to send
        prompt: Vec<String>,
    },
    /// Store an API key
    Auth,
    /// Remove the stored API key
    Deauth,
    /// Set a settings value (theme, persona, context)
    Set {
        /// Settings key to set
        key: String,
        /// Value to set (can be multiple words)
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        value: Vec<String>,
    },
}

pub fn main() -> Result<(), Box<dyn Error>> {
    tokio::runtime::Runtime::new()?.block_on(async_main())
}

async fn async_main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let model = args.model.unwrap_or_else(|| DEFAULT_MODEL.to_string());
    let base_url = args
        .base_url
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let store = DiskStore::open_default()?;

    match args.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let app = App::new(Box::new(store), model, base_url);
            run_chat(app).await
        }
        Commands::Say { prompt } => say::run_say(prompt, &store, &model, &base_url).await,
        Commands::Auth => run_auth(&store, &model, &base_url).await,
        Commands::Deauth => {
            storage::clear_api_key(&store)?;
            println!("✅ Stored API key removed.");
            Ok(())
        }
        Commands::Set { key, value } => handle_set(&store, &key, value),
    }
}

async fn run_auth(
    store: &dyn StringStore,
    model: &str,
    base_url: &str,
) -> Result<(), Box<dyn Error>> {
    print!("Enter API key: ");
    io::stdout().flush()?;
    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let api_key = input.trim();
    if api_key.is_empty() {
        eprintln!("❌ No key entered.");
        std::process::exit(1);
    }

    storage::save_api_key(store, api_key)?;

    let client = GenerativeClient::new(api_key, model, base_url);
    match client.generate_once("test").await {
        Ok(_) => println!("✅ API key stored and validated."),
        Err(err) => println!("⚠️  API key stored, but validation failed: {err}"),
    }
    Ok(())
}

fn handle_set(
    store: &dyn StringStore,
    key: &str,
    value: Vec<String>,
) -> Result<(), Box<dyn Error>> {
    let value = value.join(" ");
    let mut settings = storage::load_settings(store);

    match key {
        "theme" => match value.as_str() {
            "light" => settings.theme = Theme::Light,
            "dark" => settings.theme = Theme::Dark,
            _ => {
                eprintln!("⚠️  theme must be 'light' or 'dark'");
                return Ok(());
            }
        },
        "persona" => settings.persona = value,
        "context" => settings.context = value,
        _ => {
            eprintln!("⚠️  Unknown settings key: {key}");
            eprintln!("Available keys: theme, persona, context");
            return Ok(());
        }
    }

    storage::save_settings(store, &settings)?;
    println!("✅ Set {key}");
    Ok(())
}
