use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, Sqlite};

use freightdesk_core::domain::call::{
    format_timestamp, CallAverages, CallId, CallLog, CallLogFilter, CallStats, MarginAnalysis,
    NewCallLog,
};
use freightdesk_core::domain::load::LoadId;

use super::{CallLogRepository, RepositoryError};
use crate::DbPool;

const CALL_LOG_COLUMNS: &str = "call_id, carrier_mc, carrier_name, timestamp, load_id, \
     loadboard_rate, agreed_rate, negotiation_rounds, outcome, sentiment, notes, \
     call_duration_seconds";

/// Only calls with both a board rate and an agreed rate feed averages and margins.
const PRICED_CALLS: &str = "loadboard_rate IS NOT NULL AND agreed_rate IS NOT NULL";

pub struct SqlCallLogRepository {
    pool: DbPool,
}

impl SqlCallLogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn counts_by(&self, column: &str) -> Result<BTreeMap<String, i64>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {column} AS label, COUNT(*) AS count FROM call_logs GROUP BY {column}"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                let label: String = decode(row, "label")?;
                let count: i64 = decode(row, "count")?;
                Ok((label, count))
            })
            .collect()
    }
}

fn decode<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, Sqlite> + sqlx::Type<Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn decode_count(row: &SqliteRow, column: &str) -> Result<u32, RepositoryError> {
    let value: i64 = decode(row, column)?;
    u32::try_from(value)
        .map_err(|_| RepositoryError::Decode(format!("{column} out of range: {value}")))
}

fn row_to_call_log(row: &SqliteRow) -> Result<CallLog, RepositoryError> {
    let timestamp_str: String = decode(row, "timestamp")?;
    let timestamp = DateTime::parse_from_rfc3339(&timestamp_str)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("timestamp `{timestamp_str}`: {e}")))?;
    let outcome: String = decode(row, "outcome")?;
    let sentiment: String = decode(row, "sentiment")?;
    let load_id: Option<String> = decode(row, "load_id")?;

    Ok(CallLog {
        call_id: CallId(decode(row, "call_id")?),
        carrier_mc: decode(row, "carrier_mc")?,
        carrier_name: decode(row, "carrier_name")?,
        timestamp,
        load_id: load_id.map(LoadId),
        loadboard_rate: decode(row, "loadboard_rate")?,
        agreed_rate: decode(row, "agreed_rate")?,
        negotiation_rounds: decode_count(row, "negotiation_rounds")?,
        outcome: outcome.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?,
        sentiment: sentiment.parse().map_err(|e| RepositoryError::Decode(format!("{e}")))?,
        notes: decode(row, "notes")?,
        call_duration_seconds: decode_count(row, "call_duration_seconds")?,
    })
}

#[async_trait::async_trait]
impl CallLogRepository for SqlCallLogRepository {
    async fn insert(&self, entry: NewCallLog) -> Result<CallId, RepositoryError> {
        let log = CallLog::from_new(CallId::generate(), Utc::now(), entry);

        sqlx::query(&format!(
            "INSERT INTO call_logs ({CALL_LOG_COLUMNS})
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"
        ))
        .bind(&log.call_id.0)
        .bind(&log.carrier_mc)
        .bind(&log.carrier_name)
        .bind(format_timestamp(&log.timestamp))
        .bind(log.load_id.as_ref().map(|id| id.0.as_str()))
        .bind(log.loadboard_rate)
        .bind(log.agreed_rate)
        .bind(i64::from(log.negotiation_rounds))
        .bind(log.outcome.as_str())
        .bind(log.sentiment.as_str())
        .bind(&log.notes)
        .bind(i64::from(log.call_duration_seconds))
        .execute(&self.pool)
        .await?;

        Ok(log.call_id)
    }

    async fn list(&self, filter: &CallLogFilter) -> Result<Vec<CallLog>, RepositoryError> {
        let mut query_builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {CALL_LOG_COLUMNS} FROM call_logs WHERE 1=1"));

        if let Some(start_date) = &filter.start_date {
            query_builder.push(" AND timestamp >= ");
            query_builder.push_bind(start_date.clone());
        }
        if let Some(end_date) = &filter.end_date {
            query_builder.push(" AND timestamp <= ");
            query_builder.push_bind(end_date.clone());
        }
        if let Some(outcome) = filter.outcome {
            query_builder.push(" AND outcome = ");
            query_builder.push_bind(outcome.as_str());
        }

        query_builder.push(" ORDER BY timestamp DESC, rowid DESC LIMIT ");
        query_builder.push_bind(i64::from(filter.limit));

        let rows = query_builder.build().fetch_all(&self.pool).await?;
        rows.iter().map(row_to_call_log).collect::<Result<Vec<_>, _>>()
    }

    async fn stats(&self) -> Result<CallStats, RepositoryError> {
        let total_calls: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM call_logs").fetch_one(&self.pool).await?;
        let outcome_counts = self.counts_by("outcome").await?;
        let sentiment_counts = self.counts_by("sentiment").await?;

        let row = sqlx::query(&format!(
            "SELECT
                AVG(loadboard_rate) AS avg_loadboard_rate,
                AVG(agreed_rate) AS avg_agreed_rate,
                AVG(negotiation_rounds) AS avg_negotiation_rounds,
                AVG(call_duration_seconds) AS avg_call_duration,
                AVG(loadboard_rate - agreed_rate) AS avg_discount,
                MIN(agreed_rate) AS min_agreed_rate,
                MAX(agreed_rate) AS max_agreed_rate
             FROM call_logs
             WHERE {PRICED_CALLS}"
        ))
        .fetch_one(&self.pool)
        .await?;

        Ok(CallStats {
            total_calls,
            outcome_counts,
            sentiment_counts,
            averages: CallAverages {
                avg_loadboard_rate: decode(&row, "avg_loadboard_rate")?,
                avg_agreed_rate: decode(&row, "avg_agreed_rate")?,
                avg_negotiation_rounds: decode(&row, "avg_negotiation_rounds")?,
                avg_call_duration: decode(&row, "avg_call_duration")?,
            },
            margin_analysis: MarginAnalysis {
                avg_discount: decode(&row, "avg_discount")?,
                min_agreed_rate: decode(&row, "min_agreed_rate")?,
                max_agreed_rate: decode(&row, "max_agreed_rate")?,
            },
        })
    }

    async fn delete_all(&self) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM call_logs").execute(&self.pool).await?;
        Ok(result.rows_affected())
    }
}
