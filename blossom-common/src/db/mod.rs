//! Database schema, models and queries

pub mod api_keys;
pub mod dummy;
pub mod init;
pub mod posts;
pub mod submissions;
pub mod transcriptions;
pub mod users;

pub use init::{init_database, init_memory_database};
pub use posts::{Post, PostFields};
pub use submissions::{NewSubmission, Submission, SubmissionFilter, SubmissionRef};
pub use transcriptions::{NewTranscription, Transcription};
pub use users::{NewUser, User, UserRef};
