//! NuAnswers Tutoring Service
//!
//! Entry point: telemetry, configuration, and the HTTP server.

use mimalloc::MiMalloc;

/// Global allocator for improved performance.
#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

use std::sync::Arc;

use dotenvy::dotenv;

use nuanswers::config::{AppConfig, load_llm_settings};
use nuanswers::{server, telemetry};

#[tokio::main]
async fn main() {
    telemetry::init();

    // Load .env (if present)
    let _ = dotenv();

    let config = match AppConfig::load() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("Configuration error: {e}");
            std::process::exit(1);
        }
    };

    let settings = match load_llm_settings() {
        Ok(s) => s,
        Err(msg) => {
            eprintln!("Configuration error: {msg}");
            std::process::exit(1);
        }
    };

    if let Err(e) = server::start_server(config, settings).await {
        eprintln!("Server error: {e:?}");
        std::process::exit(1);
    }
}
