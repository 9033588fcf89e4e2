//! CLI command execution.
//!
//! Each invocation builds the application state, establishes the
//! session, runs one command against the backend, and renders the
//! resulting view. Diagnostics go to tracing (stderr); everything the
//! user asked for goes to stdout.

use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Result};

use crate::api::{ApiClient, ApiError, DEFAULT_BASE_URL};
use crate::app::{App, Tab, View};
use crate::models::{FormRecord, User};
use crate::session;
use crate::tracker::{JobHandle, JobOutcome, PollConfig};

use super::args::{Cli, Commands};

/// Resolve the backend base URL: flag, then environment, then default.
fn resolve_server(cli: &Cli) -> String {
    cli.server
        .clone()
        .or_else(|| std::env::var("FORMLO_SERVER").ok())
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
}

// === Command Execution ===

pub async fn execute(cli: Cli) -> Result<()> {
    let server = resolve_server(&cli);
    let cookie = session::load_cookie();
    let api = Arc::new(ApiClient::new(&server, cookie.as_deref()));
    let mut app = App::new(Arc::clone(&api), PollConfig::default());

    match cli.command {
        Commands::Login { cookie } => login(&api, cookie).await,
        Commands::Logout => logout(&mut app).await,
        Commands::Whoami => whoami(&mut app).await,
        Commands::Upload { file } => upload(&mut app, &file).await,
        Commands::List => list(&mut app).await,
        Commands::Delete { form_id, yes } => delete(&mut app, &form_id, yes).await,
        Commands::Job { job_id } => job_status(&api, &job_id).await,
    }
}

async fn login(api: &ApiClient, cookie: Option<String>) -> Result<()> {
    if let Some(cookie) = cookie {
        session::save_cookie(&cookie)?;
        let api = ApiClient::new(api.base_url(), Some(&cookie));
        match session::check(&api).await {
            Some(user) => println!("Signed in as {} <{}>", user.name, user.email),
            None => {
                println!("Cookie stored, but the backend did not accept it.");
                println!("Check the value and try `formlo whoami` again.");
            }
        }
        return Ok(());
    }

    session::open_login(api)?;
    println!("Complete sign-in in your browser.");
    println!("Then store the issued session cookie with:");
    println!("  formlo login --cookie \"session=<value>\"");
    Ok(())
}

async fn logout(app: &mut App) -> Result<()> {
    match app.logout().await {
        Ok(()) => {
            if let Err(err) = session::clear_cookie() {
                tracing::warn!(error = %err, "could not remove the stored session cookie");
            }
            println!("Signed out.");
        }
        Err(err) => {
            // Surfaced as a diagnostic; local state is unchanged and
            // the user can simply retry.
            tracing::warn!(error = %err, "logout request failed");
            println!("Sign-out failed: {err}. Your session is unchanged.");
        }
    }
    Ok(())
}

async fn whoami(app: &mut App) -> Result<()> {
    app.startup().await;
    match app.session() {
        Some(user) => print_user(user),
        None => render_landing(),
    }
    Ok(())
}

async fn upload(app: &mut App, file: &Path) -> Result<()> {
    app.startup().await;
    if app.session().is_none() {
        render_landing();
        return Ok(());
    }

    println!("Uploading {}...", file.display());
    let handle = match app.upload(file).await {
        Ok(handle) => handle,
        Err(err) => bail!("Upload failed: {err}"),
    };
    println!("Job {} created; converting {}...", handle.job_id, handle.filename);

    let job_id = handle.job_id.clone();
    let outcome = follow(handle).await;
    match outcome {
        Some(JobOutcome::Completed) => {
            app.on_job_outcome(&JobOutcome::Completed).await;
            println!("Conversion complete.");
            println!();
            render(app);
        }
        Some(JobOutcome::Failed { message }) => {
            app.on_job_outcome(&JobOutcome::Failed {
                message: message.clone(),
            })
            .await;
            println!("Conversion failed: {message}");
        }
        Some(JobOutcome::TimedOut) => {
            println!("Gave up waiting for job {job_id}.");
            println!("It may still finish; check later with `formlo job {job_id}`.");
        }
        None => {
            println!("Lost contact while tracking job {job_id}.");
            println!("Check its status later with `formlo job {job_id}`.");
        }
    }
    Ok(())
}

/// Print progress as snapshots arrive, until the tracker reports an
/// outcome or stops observing.
async fn follow(mut handle: JobHandle) -> Option<JobOutcome> {
    let mut last = {
        let job = handle.updates.borrow().clone();
        (job.status, job.progress)
    };

    loop {
        tokio::select! {
            outcome = &mut handle.outcome => {
                return outcome.ok();
            }
            changed = handle.updates.changed() => {
                if changed.is_err() {
                    // The poll loop ended; collect the outcome if one
                    // was sent before the sender went away.
                    return (&mut handle.outcome).await.ok();
                }
                let job = handle.updates.borrow_and_update().clone();
                if (job.status, job.progress) != last {
                    println!("  {:>3}%  {}", job.progress, job.status);
                    last = (job.status, job.progress);
                }
            }
        }
    }
}

async fn list(app: &mut App) -> Result<()> {
    app.startup().await;
    if app.session().is_some() {
        app.switch_tab(Tab::Dashboard);
    }
    render(app);
    Ok(())
}

async fn delete(app: &mut App, form_id: &str, yes: bool) -> Result<()> {
    app.startup().await;
    if app.session().is_none() {
        render_landing();
        return Ok(());
    }

    let label = app
        .form(form_id)
        .map_or_else(|| form_id.to_string(), |form| form.form_title.clone());

    if !yes {
        let prompt =
            format!("Delete \"{label}\"? This also removes the form from Google Forms.");
        if !confirm(&prompt)? {
            println!("Aborted; nothing was deleted.");
            return Ok(());
        }
    }

    match app.delete_form(form_id).await {
        Ok(()) => {
            println!("Deleted {form_id}.");
            Ok(())
        }
        Err(err) => bail!("Delete failed: {err}. The form list is unchanged."),
    }
}

async fn job_status(api: &ApiClient, job_id: &str) -> Result<()> {
    match api.job(job_id).await {
        Ok(job) => {
            println!("Job {}", job.id);
            if let Some(ref filename) = job.filename {
                println!("  Source:   {filename}");
            }
            println!("  Status:   {}", job.status);
            if !job.is_terminal() {
                println!("  Progress: {}%", job.progress);
            }
            if let Some(ref message) = job.error_message {
                println!("  Error:    {message}");
            }
            if let Some(ref form_id) = job.form_id {
                println!("  Form:     {form_id}");
            }
            Ok(())
        }
        Err(ApiError::Unauthorized) => {
            render_landing();
            Ok(())
        }
        Err(err) => bail!("Could not fetch job {job_id}: {err}"),
    }
}

// === Rendering ===

fn render(app: &App) {
    match app.view() {
        View::Landing => render_landing(),
        View::Upload => render_upload(),
        View::Dashboard => render_dashboard(app.forms()),
    }
}

fn render_landing() {
    println!("Not signed in. Run `formlo login` to connect your account.");
}

fn render_upload() {
    println!("Convert a document with `formlo upload <file>`.");
    println!("Accepted types: .pdf, .docx, .txt (10 MB max).");
}

fn render_dashboard(forms: &[FormRecord]) {
    if forms.is_empty() {
        println!("No forms yet. Convert a document with `formlo upload <file>`.");
        return;
    }

    println!(
        "{:<22} {:<32} {:>9}  {:<17} {}",
        "FORM ID", "TITLE", "QUESTIONS", "CREATED", "SOURCE"
    );
    println!("{}", "-".repeat(100));

    for form in forms {
        println!(
            "{:<22} {:<32} {:>9}  {:<17} {}",
            truncate(&form.form_id, 20),
            truncate(&form.form_title, 30),
            form.questions_count,
            form.created_at.format("%Y-%m-%d %H:%M"),
            form.original_filename,
        );
    }

    println!();
    for form in forms {
        println!("{}: {}", truncate(&form.form_id, 20), form.form_url);
    }
}

fn print_user(user: &User) {
    println!("{} <{}>", user.name, user.email);
    println!("  Account: {}", user.id);
    if let Some(ref picture) = user.picture {
        println!("  Avatar:  {picture}");
    }
    if let Some(created) = user.created_at {
        println!("  Since:   {}", created.format("%Y-%m-%d"));
    }
}

/// Shorten a string for table display without splitting a character.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut shortened: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    shortened.push('\u{2026}');
    shortened
}

/// Ask a yes/no question on the terminal; defaults to no.
fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(matches!(line.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_strings() {
        assert_eq!(truncate("quiz", 20), "quiz");
    }

    #[test]
    fn truncate_shortens_long_strings() {
        let shortened = truncate("a-very-long-google-form-identifier", 10);
        assert_eq!(shortened.chars().count(), 10);
        assert!(shortened.ends_with('\u{2026}'));
    }

    #[test]
    fn truncate_respects_multibyte_boundaries() {
        let shortened = truncate("数学テストのフォームです長い", 5);
        assert_eq!(shortened.chars().count(), 5);
    }
}
