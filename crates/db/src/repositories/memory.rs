use chrono::Utc;
use tokio::sync::RwLock;

use freightdesk_core::domain::call::{CallId, CallLog, CallLogFilter, CallStats, NewCallLog};

use super::{CallLogRepository, RepositoryError};

/// Vec-backed store for tests and database-less runs. Insertion order stands in for time order.
#[derive(Default)]
pub struct InMemoryCallLogRepository {
    logs: RwLock<Vec<CallLog>>,
}

#[async_trait::async_trait]
impl CallLogRepository for InMemoryCallLogRepository {
    async fn insert(&self, entry: NewCallLog) -> Result<CallId, RepositoryError> {
        let log = CallLog::from_new(CallId::generate(), Utc::now(), entry);
        let call_id = log.call_id.clone();
        self.logs.write().await.push(log);
        Ok(call_id)
    }

    async fn list(&self, filter: &CallLogFilter) -> Result<Vec<CallLog>, RepositoryError> {
        let logs = self.logs.read().await;
        Ok(logs
            .iter()
            .rev()
            .filter(|log| filter.matches(log))
            .take(filter.limit as usize)
            .cloned()
            .collect())
    }

    async fn stats(&self) -> Result<CallStats, RepositoryError> {
        let logs = self.logs.read().await;
        Ok(CallStats::from_logs(logs.iter()))
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let mut logs = self.logs.write().await;
        let removed = logs.len() as u64;
        logs.clear();
        Ok(removed)
    }
}
