//! Error types for `ripoti-core`.

use thiserror::Error;

/// Rejections that follow from the board's rules rather than from a failing
/// backend.
#[derive(Debug, Error)]
pub enum Error {
  #[error("unknown reaction type: {0:?}")]
  UnknownReaction(String),

  #[error("no username can be derived from {0:?}")]
  EmptyUsername(String),

  #[error("report not found: {0}")]
  ReportNotFound(i64),

  /// The author tried to react to their own report.
  #[error("user may not react to own report {0}")]
  OwnReport(i64),

  #[error("user has already reacted to report {0}")]
  AlreadyReacted(i64),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Lets callers generic over a store backend find the domain rejection inside
/// the backend's own error type.
pub trait DomainError {
  /// `None` for infrastructure failures (I/O, corrupt rows, …).
  fn as_domain(&self) -> Option<&Error>;
}
