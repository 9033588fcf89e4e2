//! Generated form model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A generated form tracked in the user's collection.
///
/// `form_id` identifies the external artifact and is the key the
/// collection is addressed by; it is distinct from the id of the
/// conversion job that produced the form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormRecord {
    /// Backend record identifier.
    pub id: String,
    /// External form identifier.
    pub form_id: String,
    /// Title the converter gave the form.
    pub form_title: String,
    /// Deep link to the external form editor.
    pub form_url: String,
    /// Name of the uploaded document this form came from.
    pub original_filename: String,
    /// Number of questions extracted into the form.
    pub questions_count: u32,
    /// When the form was created.
    pub created_at: DateTime<Utc>,
}
