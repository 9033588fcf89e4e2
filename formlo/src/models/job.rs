//! Conversion job model and status lifecycle.

use serde::{Deserialize, Serialize};

/// Status of a conversion job as reported by the backend.
///
/// `Completed` and `Failed` are terminal: a job reaches one of them
/// exactly once and never transitions again. The backend reports named
/// intermediate stages while it works; a status string this client does
/// not know deserializes to `Processing` so a new backend stage reads
/// as still-running rather than an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Extracted text is being analyzed for questions.
    Analyzing,
    /// The external form is being assembled.
    CreatingForm,
    /// Conversion finished and the form exists.
    Completed,
    /// Conversion failed; the job carries an error message.
    Failed,
    /// Document text is being extracted.
    #[serde(other)]
    Processing,
}

impl JobStatus {
    /// Human-readable label for terminal output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Processing => "processing",
            Self::Analyzing => "analyzing",
            Self::CreatingForm => "creating form",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether no further transitions can follow this status.
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A conversion job as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversionJob {
    /// Backend-assigned job identifier, unique per submission.
    pub id: String,
    /// Current lifecycle status.
    pub status: JobStatus,
    /// Percentage in [0, 100]; meaningless once the job is terminal.
    #[serde(default)]
    pub progress: u8,
    /// Failure reason, present only when `status` is `Failed`.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Identifier of the created form, present once completed.
    #[serde(default)]
    pub form_id: Option<String>,
    /// Source document name as the backend recorded it.
    #[serde(default)]
    pub filename: Option<String>,
}

impl ConversionJob {
    /// Whether this snapshot is in a terminal state.
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_statuses_parse() {
        let job: ConversionJob =
            serde_json::from_str(r#"{"id":"j1","status":"completed","progress":100}"#).unwrap();
        assert_eq!(job.status, JobStatus::Completed);
        assert!(job.is_terminal());
    }

    #[test]
    fn intermediate_statuses_are_not_terminal() {
        for raw in ["processing", "analyzing", "creating_form"] {
            let json = format!(r#"{{"id":"j1","status":"{raw}","progress":30}}"#);
            let job: ConversionJob = serde_json::from_str(&json).unwrap();
            assert!(!job.is_terminal(), "{raw} must not be terminal");
        }
    }

    #[test]
    fn unknown_status_falls_back_to_processing() {
        let job: ConversionJob =
            serde_json::from_str(r#"{"id":"j1","status":"queued_for_ocr","progress":0}"#).unwrap();
        assert_eq!(job.status, JobStatus::Processing);
        assert!(!job.is_terminal());
    }

    #[test]
    fn failed_job_carries_message() {
        let job: ConversionJob = serde_json::from_str(
            r#"{"id":"j2","status":"failed","error_message":"unsupported layout"}"#,
        )
        .unwrap();
        assert_eq!(job.status, JobStatus::Failed);
        assert_eq!(job.error_message.as_deref(), Some("unsupported layout"));
    }
}
