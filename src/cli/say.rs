//! One-shot "say" command: a single stateless prompt, no session state.

use std::error::Error;

use crate::api::{ChatBackend, GenerativeClient};
use crate::auth::resolve_credential;
use crate::storage::StringStore;

pub async fn run_say(
    prompt: Vec<String>,
    store: &dyn StringStore,
    model: &str,
    base_url: &str,
) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.is_empty() {
        eprintln!("Usage: scrivano say <prompt>");
        std::process::exit(1);
    }

    let Some(credential) = resolve_credential(store) else {
        eprintln!("❌ No API key found. Run 'scrivano auth' or set GEMINI_API_KEY.");
        std::process::exit(1);
    };

    let client = GenerativeClient::new(credential.key(), model, base_url);
    match client.generate_once(&prompt).await {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(err) => {
            eprintln!("❌ Error: {err}");
            std::process::exit(1);
        }
    }
}
