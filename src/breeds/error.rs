//! Error taxonomy for repository operations.

use color_eyre::Report;
use thiserror::Error;

/// Failure of a repository operation.
///
/// Callers are expected to branch on the variant: a `Fetch` error means no
/// cached fallback was available, `NotFound` means the breed has not been
/// seen locally yet (browse the list first), `Storage` means the local
/// database itself failed.
#[derive(Error, Debug)]
pub enum SyncError {
  /// Network or remote API failure. Retryable.
  #[error("Failed to fetch breeds: {0:#}")]
  Fetch(Report),

  /// The requested breed is not in the local cache.
  #[error("Breed '{id}' not found in cache")]
  NotFound { id: String },

  /// Local store read or write failure.
  #[error("Local storage error: {0:#}")]
  Storage(Report),
}

impl SyncError {
  pub fn is_retryable(&self) -> bool {
    matches!(self, SyncError::Fetch(_))
  }

  pub fn is_not_found(&self) -> bool {
    matches!(self, SyncError::NotFound { .. })
  }
}

pub type Result<T> = std::result::Result<T, SyncError>;
