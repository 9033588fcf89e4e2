//! Data models for the conversion API.

mod form;
mod job;
mod user;

pub use form::FormRecord;
pub use job::{ConversionJob, JobStatus};
pub use user::User;
