//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Formlo - Convert documents into Google Forms from the terminal
#[derive(Parser, Debug)]
#[command(name = "formlo")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Base URL of the conversion backend (also: FORMLO_SERVER)
    #[arg(long)]
    pub server: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in via the browser and store the issued session cookie
    Login {
        /// Session cookie to store directly, skipping the browser
        #[arg(long)]
        cookie: Option<String>,
    },

    /// End the current session
    Logout,

    /// Show the signed-in account
    Whoami,

    /// Upload a document and track its conversion to completion
    Upload {
        /// Path to a .pdf, .docx or .txt document (10 MB max)
        file: PathBuf,
    },

    /// List generated forms
    List,

    /// Delete a generated form (also removes it from Google Forms)
    Delete {
        /// External form ID to delete
        form_id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Show the status of a conversion job
    Job {
        /// Job ID printed at upload time
        job_id: String,
    },
}
