use async_trait::async_trait;
use thiserror::Error;

use freightdesk_core::domain::call::{CallId, CallLog, CallLogFilter, CallStats, NewCallLog};

pub mod call_log;
pub mod memory;

pub use call_log::SqlCallLogRepository;
pub use memory::InMemoryCallLogRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
}

/// Append-only store of completed carrier calls.
#[async_trait]
pub trait CallLogRepository: Send + Sync {
    /// Stores the call stamped with the current time and returns its generated id.
    async fn insert(&self, entry: NewCallLog) -> Result<CallId, RepositoryError>;

    /// Matching calls, newest first, at most `filter.limit` of them.
    async fn list(&self, filter: &CallLogFilter) -> Result<Vec<CallLog>, RepositoryError>;

    async fn stats(&self) -> Result<CallStats, RepositoryError>;

    /// Removes every stored call and returns how many were deleted.
    async fn delete_all(&self) -> Result<u64, RepositoryError>;
}
