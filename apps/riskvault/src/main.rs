//! # Riskvault
//!
//! The main binary for the Riskvault versioned document store.
//!
//! This application provides:
//! - HTTP REST API server (axum-based)
//! - CLI interface for collection and document operations
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │               apps/riskvault (THE BINARY)            │
//! │                                                      │
//! │  ┌─────────────┐   ┌─────────────┐   ┌────────────┐  │
//! │  │   CLI       │   │   HTTP API  │   │  Extract   │  │
//! │  │  (clap)     │   │   (axum)    │   │ (pdf/text) │  │
//! │  └──────┬──────┘   └──────┬──────┘   └─────┬──────┘  │
//! │         └─────────────────┼────────────────┘         │
//! │                           ▼                          │
//! │                  ┌────────────────┐                  │
//! │                  │ riskvault-core │                  │
//! │                  │  (THE LOGIC)   │                  │
//! │                  └────────────────┘                  │
//! └──────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! # Start the HTTP server
//! riskvault server --host 0.0.0.0 --port 8080
//!
//! # CLI operations
//! riskvault upload -n contracts -f lease.pdf
//! riskvault attach -n contracts -f lease.pdf --risk @scores.json
//! riskvault history -n contracts -f lease.pdf
//! ```

use clap::Parser;
use riskvault::cli;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "riskvault=info,riskvault_core=info,tower_http=debug";
const VERBOSE_FILTER: &str = "riskvault=debug,riskvault_core=debug,tower_http=debug";

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

#[tokio::main]
async fn main() {
    let cli = cli::Cli::parse();

    // RISKVAULT_LOG_FORMAT=json enables machine-parseable output
    let log_format = std::env::var("RISKVAULT_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if cli.verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }

    if !cli.quiet && !cli.json_mode {
        print_banner();
    }

    if let Err(e) = cli::execute(cli).await {
        tracing::error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Print the Riskvault startup banner.
fn print_banner() {
    println!(
        r#"
  ____  _     _                     _ _
 |  _ \(_)___| | ____   ____ _ _   _| | |_
 | |_) | / __| |/ /\ \ / / _` | | | | | __|
 |  _ <| \__ \   <  \ V / (_| | |_| | | |_
 |_| \_\_|___/_|\_\  \_/ \__,_|\__,_|_|\__|

  Versioned Document Store v{}
"#,
        env!("CARGO_PKG_VERSION")
    );
}
