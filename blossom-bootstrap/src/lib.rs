//! Historical import of volunteer records into Blossom
//!
//! Reconciles an exported history of external posts and comments with the
//! internal submission, transcription and user tables. Every step looks up
//! existing rows by external id first, so an import can be re-run safely.

pub mod accounts;
pub mod error;
pub mod export;
pub mod import;
pub mod reconcile;

pub use error::{BootstrapError, Result};
pub use export::Export;
pub use import::{run_import, ImportReport};
