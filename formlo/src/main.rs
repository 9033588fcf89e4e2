//! Formlo - Convert documents into Google Forms from the terminal.
//!
//! Architecture:
//! - The CLI is a thin client of the Formlo backend over HTTP
//! - Conversion happens server-side; the client tracks each job by
//!   polling until it reaches a terminal status
//! - Sessions are cookie-based; the cookie is kept under ~/.formlo so
//!   invocations share one sign-in

mod api;
mod app;
mod cli;
mod forms;
mod models;
mod session;
mod tracker;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{execute, Cli};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "formlo=warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    execute(cli).await
}
