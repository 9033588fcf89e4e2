//! Application state and view selection.
//!
//! All mutable client state (the session, the tracked job, the form
//! collection, and the active tab) lives in [`App`] and is mutated
//! only through its methods. View selection is a pure function of that
//! state.

use std::path::Path;
use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::forms::{FormsCollection, FormsSource};
use crate::models::{FormRecord, User};
use crate::session::{self, IdentitySource};
use crate::tracker::{JobHandle, JobOutcome, JobSource, JobTracker, PollConfig, SubmitError};

/// The two tabs a signed-in user can be on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    /// Document upload and conversion tracking. The default.
    Upload,
    /// The collection of generated forms.
    Dashboard,
}

/// Render target selected from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    /// Anonymous callers see the sign-in prompt.
    Landing,
    /// Signed in, upload tab.
    Upload,
    /// Signed in, dashboard tab.
    Dashboard,
}

/// Pure view selection: anonymous callers always land on the sign-in
/// view; signed-in callers see their active tab.
pub const fn select_view(authenticated: bool, tab: Tab) -> View {
    if !authenticated {
        return View::Landing;
    }
    match tab {
        Tab::Upload => View::Upload,
        Tab::Dashboard => View::Dashboard,
    }
}

/// Client application state for one run.
pub struct App {
    identity: Arc<dyn IdentitySource>,
    tracker: JobTracker,
    forms: FormsCollection,
    session: Option<User>,
    tab: Tab,
}

impl App {
    /// Build the state container around one backend client.
    pub fn new(api: Arc<ApiClient>, poll: PollConfig) -> Self {
        let jobs: Arc<dyn JobSource> = api.clone();
        let forms: Arc<dyn FormsSource> = api.clone();
        Self {
            identity: api,
            tracker: JobTracker::new(jobs, poll),
            forms: FormsCollection::new(forms),
            session: None,
            tab: Tab::Upload,
        }
    }

    /// Establish identity and, when signed in, perform the initial
    /// collection load. A failed session check is routine and resolves
    /// to the anonymous state without blocking startup.
    pub async fn startup(&mut self) {
        self.session = session::check(self.identity.as_ref()).await;
        if self.session.is_some() {
            let _ = self.forms.refresh().await;
        }
    }

    /// The signed-in user, if any.
    pub fn session(&self) -> Option<&User> {
        self.session.as_ref()
    }

    /// Submit a document for conversion. See [`JobTracker::submit`].
    pub async fn upload(&mut self, path: &Path) -> Result<JobHandle, SubmitError> {
        self.tracker.submit(path).await
    }

    /// Apply a terminal job signal. A completed conversion refreshes
    /// the collection exactly once and lands the caller on the
    /// dashboard; any other outcome changes nothing.
    pub async fn on_job_outcome(&mut self, outcome: &JobOutcome) {
        if matches!(outcome, JobOutcome::Completed) {
            let _ = self.forms.refresh().await;
            self.tab = Tab::Dashboard;
        }
    }

    /// End the session. On success every piece of dependent state is
    /// cleared so a different account can sign in next; on failure
    /// state is left exactly as it was and the error is returned for a
    /// non-blocking diagnostic.
    pub async fn logout(&mut self) -> Result<(), ApiError> {
        self.identity.logout().await?;
        self.session = None;
        self.tracker.cancel();
        self.forms.clear();
        self.tab = Tab::Upload;
        Ok(())
    }

    /// Delete a form after the caller has confirmed interactively.
    pub async fn delete_form(&mut self, form_id: &str) -> Result<(), ApiError> {
        self.forms.delete(form_id).await
    }

    /// The form list as of the last successful refresh.
    pub fn forms(&self) -> &[FormRecord] {
        self.forms.forms()
    }

    /// Look up a form in the local list by its external id.
    pub fn form(&self, form_id: &str) -> Option<&FormRecord> {
        self.forms.get(form_id)
    }

    /// Switch the active tab.
    pub fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    /// The render target for the current state.
    pub fn view(&self) -> View {
        select_view(self.session.is_some(), self.tab)
    }
}
