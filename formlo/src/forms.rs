//! The locally materialized collection of generated forms.
//!
//! The backend is the sole source of truth: every mutation is a full
//! refresh, and between refreshes the list is exactly what the last
//! successful refresh returned. There is no optimistic state anywhere
//! in this module.

use std::sync::Arc;

use async_trait::async_trait;

use crate::api::{ApiClient, ApiError};
use crate::models::FormRecord;

/// Backend operations the collection needs.
#[async_trait]
pub trait FormsSource: Send + Sync {
    /// Fetch the full current collection.
    async fn list(&self) -> Result<Vec<FormRecord>, ApiError>;
    /// Delete one form by its external id.
    async fn delete(&self, form_id: &str) -> Result<(), ApiError>;
}

#[async_trait]
impl FormsSource for ApiClient {
    async fn list(&self) -> Result<Vec<FormRecord>, ApiError> {
        self.forms().await
    }

    async fn delete(&self, form_id: &str) -> Result<(), ApiError> {
        self.delete_form(form_id).await
    }
}

/// The user's form collection, keyed by `form_id`.
///
/// Mutation goes through `&mut self`, so refreshes cannot interleave.
pub struct FormsCollection {
    source: Arc<dyn FormsSource>,
    forms: Vec<FormRecord>,
}

impl FormsCollection {
    /// Create an empty collection backed by `source`.
    pub fn new(source: Arc<dyn FormsSource>) -> Self {
        Self {
            source,
            forms: Vec::new(),
        }
    }

    /// Replace the local list wholesale with the backend's.
    ///
    /// On failure the previous list is kept: stale-but-available beats
    /// empty-but-broken. The failure is logged and returned for
    /// callers that want to surface it.
    pub async fn refresh(&mut self) -> Result<(), ApiError> {
        match self.source.list().await {
            Ok(forms) => {
                self.forms = forms;
                Ok(())
            }
            Err(err) => {
                tracing::warn!(error = %err, "form list refresh failed; keeping previous list");
                Err(err)
            }
        }
    }

    /// Delete a form on the backend, then reconcile with a refresh.
    ///
    /// Callers must obtain interactive confirmation first; the deletion
    /// also removes the artifact from the external form service. The
    /// local list is never touched before the backend confirms: a
    /// failed delete must not desync the displayed list from reality.
    pub async fn delete(&mut self, form_id: &str) -> Result<(), ApiError> {
        self.source.delete(form_id).await?;
        // The deletion succeeded even if this reconciliation fails.
        let _ = self.refresh().await;
        Ok(())
    }

    /// The list as of the last successful refresh.
    pub fn forms(&self) -> &[FormRecord] {
        &self.forms
    }

    /// Look up a form by its external id.
    pub fn get(&self, form_id: &str) -> Option<&FormRecord> {
        self.forms.iter().find(|form| form.form_id == form_id)
    }

    /// Drop all local state, e.g. when the session ends.
    pub fn clear(&mut self) {
        self.forms.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use chrono::Utc;

    use super::*;

    fn record(form_id: &str) -> FormRecord {
        FormRecord {
            id: format!("rec-{form_id}"),
            form_id: form_id.to_string(),
            form_title: format!("Form {form_id}"),
            form_url: format!("https://forms.example/{form_id}/edit"),
            original_filename: "quiz.pdf".to_string(),
            questions_count: 5,
            created_at: Utc::now(),
        }
    }

    struct StubSource {
        lists: Mutex<Vec<Result<Vec<FormRecord>, ApiError>>>,
        list_calls: AtomicUsize,
        delete_result: Mutex<Option<ApiError>>,
        deleted: Mutex<Vec<String>>,
    }

    impl StubSource {
        fn new(lists: Vec<Result<Vec<FormRecord>, ApiError>>) -> Self {
            Self {
                lists: Mutex::new(lists),
                list_calls: AtomicUsize::new(0),
                delete_result: Mutex::new(None),
                deleted: Mutex::new(Vec::new()),
            }
        }

        fn failing_delete(self, err: ApiError) -> Self {
            *self.delete_result.lock().unwrap() = Some(err);
            self
        }
    }

    #[async_trait]
    impl FormsSource for StubSource {
        async fn list(&self) -> Result<Vec<FormRecord>, ApiError> {
            self.list_calls.fetch_add(1, Ordering::SeqCst);
            let mut lists = self.lists.lock().unwrap();
            if lists.is_empty() {
                Ok(Vec::new())
            } else {
                lists.remove(0)
            }
        }

        async fn delete(&self, form_id: &str) -> Result<(), ApiError> {
            self.deleted.lock().unwrap().push(form_id.to_string());
            match self.delete_result.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn not_found() -> ApiError {
        ApiError::Api {
            status: 404,
            detail: "Form not found".to_string(),
        }
    }

    #[tokio::test]
    async fn refresh_replaces_the_list_wholesale() {
        let source = Arc::new(StubSource::new(vec![
            Ok(vec![record("f1"), record("f2")]),
            Ok(vec![record("f2")]),
        ]));
        let mut collection = FormsCollection::new(Arc::clone(&source) as Arc<dyn FormsSource>);

        collection.refresh().await.unwrap();
        assert_eq!(collection.forms().len(), 2);
        assert!(collection.get("f1").is_some());

        collection.refresh().await.unwrap();
        assert_eq!(collection.forms().len(), 1);
        assert!(collection.get("f1").is_none());
    }

    #[tokio::test]
    async fn refresh_is_idempotent_against_unchanged_backend() {
        let source = Arc::new(StubSource::new(vec![
            Ok(vec![record("f1")]),
            Ok(vec![record("f1")]),
        ]));
        let mut collection = FormsCollection::new(Arc::clone(&source) as Arc<dyn FormsSource>);

        collection.refresh().await.unwrap();
        let first: Vec<String> = collection.forms().iter().map(|f| f.form_id.clone()).collect();
        collection.refresh().await.unwrap();
        let second: Vec<String> = collection.forms().iter().map(|f| f.form_id.clone()).collect();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_previous_list() {
        let source = Arc::new(StubSource::new(vec![
            Ok(vec![record("f1")]),
            Err(not_found()),
        ]));
        let mut collection = FormsCollection::new(Arc::clone(&source) as Arc<dyn FormsSource>);

        collection.refresh().await.unwrap();
        assert!(collection.refresh().await.is_err());
        assert_eq!(collection.forms().len(), 1);
    }

    #[tokio::test]
    async fn successful_delete_reconciles_with_a_refresh() {
        let source = Arc::new(StubSource::new(vec![
            Ok(vec![record("f1"), record("f2")]),
            Ok(vec![record("f2")]),
        ]));
        let mut collection = FormsCollection::new(Arc::clone(&source) as Arc<dyn FormsSource>);

        collection.refresh().await.unwrap();
        collection.delete("f1").await.unwrap();

        assert_eq!(source.deleted.lock().unwrap().as_slice(), ["f1"]);
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 2);
        assert!(collection.get("f1").is_none());
    }

    #[tokio::test]
    async fn failed_delete_leaves_the_list_untouched() {
        let source = Arc::new(
            StubSource::new(vec![Ok(vec![record("f1")])]).failing_delete(not_found()),
        );
        let mut collection = FormsCollection::new(Arc::clone(&source) as Arc<dyn FormsSource>);

        collection.refresh().await.unwrap();
        assert!(collection.delete("missing").await.is_err());

        assert_eq!(collection.forms().len(), 1);
        // No reconciliation happens after a failed delete.
        assert_eq!(source.list_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn clear_drops_local_state() {
        let source = Arc::new(StubSource::new(vec![Ok(vec![record("f1")])]));
        let mut collection = FormsCollection::new(Arc::clone(&source) as Arc<dyn FormsSource>);

        collection.refresh().await.unwrap();
        collection.clear();
        assert!(collection.forms().is_empty());
    }
}
