//! ClickHouse sink implementation
//!
//! Each batch becomes a single INSERT, and the newest row doubles as the
//! checkpoint, so there is no separate position table to keep in sync.

use async_trait::async_trait;
use clickhouse::{Client, insert::Insert};
use evlog_protocol::{Checkpoint, EventRecord};
use tokio::sync::OnceCell;

use crate::{EventSink, SinkError, SinkMetrics};

use super::config::ClickHouseConfig;
use super::error::ClickHouseSinkError;
use super::row::{EventLogRow, PositionRow};

/// ClickHouse sink for event log records
pub struct ClickHouseSink {
    /// Configuration
    config: ClickHouseConfig,

    /// ClickHouse client bound to the database
    client: Client,

    /// Set once the database and table exist
    schema: OnceCell<()>,

    metrics: SinkMetrics,

    /// Sink name for identification
    name: String,
}

impl ClickHouseSink {
    /// Create a new ClickHouse sink
    pub fn new(config: ClickHouseConfig) -> Self {
        Self::with_name(config, "clickhouse")
    }

    /// Create a new ClickHouse sink with a custom name
    pub fn with_name(config: ClickHouseConfig, name: impl Into<String>) -> Self {
        let client = config.build_client();
        Self {
            client,
            config,
            schema: OnceCell::new(),
            metrics: SinkMetrics::new(),
            name: name.into(),
        }
    }

    async fn ensure_schema(&self) -> Result<(), ClickHouseSinkError> {
        if !self.config.create_schema {
            return Ok(());
        }
        self.schema
            .get_or_try_init(|| async {
                self.config
                    .server_client()
                    .query(&create_database_sql(&self.config.database))
                    .execute()
                    .await
                    .map_err(|source| ClickHouseSinkError::Schema {
                        object: format!("database {}", self.config.database),
                        source,
                    })?;
                self.client
                    .query(&create_table_sql(&self.config.table))
                    .execute()
                    .await
                    .map_err(|source| ClickHouseSinkError::Schema {
                        object: format!("table {}", self.config.table),
                        source,
                    })?;
                tracing::info!(
                    url = %self.config.url,
                    database = %self.config.database,
                    table = %self.config.table,
                    "clickhouse schema ready"
                );
                Ok::<(), ClickHouseSinkError>(())
            })
            .await
            .map(|_| ())
    }

    async fn insert(&self, rows: &[EventLogRow]) -> Result<(), ClickHouseSinkError> {
        let mut insert: Insert<EventLogRow> = self.client.insert(&self.config.table).await?;

        for row in rows {
            insert.write(row).await?;
        }

        insert.end().await?;
        Ok(())
    }
}

#[async_trait]
impl EventSink for ClickHouseSink {
    fn name(&self) -> &str {
        &self.name
    }

    async fn read_position(&self) -> Result<Option<Checkpoint>, SinkError> {
        self.ensure_schema().await?;
        let row = self
            .client
            .query(&position_sql(&self.config.table))
            .fetch_optional::<PositionRow>()
            .await
            .map_err(ClickHouseSinkError::from)?;
        Ok(row.map(Checkpoint::from))
    }

    async fn write(&self, batch: &[EventRecord]) -> Result<(), SinkError> {
        if batch.is_empty() {
            return Ok(());
        }
        self.metrics.batch_received();

        let result = async {
            self.ensure_schema().await?;
            let rows = batch
                .iter()
                .map(EventLogRow::from_record)
                .collect::<Result<Vec<_>, _>>()?;
            self.insert(&rows).await
        }
        .await;

        match result {
            Ok(()) => {
                self.metrics.batch_written(batch.len() as u64, 0);
                tracing::debug!(table = %self.config.table, count = batch.len(), "inserted batch");
                Ok(())
            }
            Err(e) => {
                self.metrics.write_error();
                Err(e.into())
            }
        }
    }

    fn metrics(&self) -> &SinkMetrics {
        &self.metrics
    }
}

pub(crate) fn create_database_sql(database: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS `{database}`")
}

pub(crate) fn create_table_sql(table: &str) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS `{table}` (
    FileName LowCardinality(String),
    EndPosition UInt64,
    LgfEndPosition UInt64,
    Id UInt64,
    DateTime DateTime,
    TransactionStatus LowCardinality(String),
    TransactionDate DateTime,
    TransactionNumber Int64,
    UserUuid LowCardinality(String),
    User LowCardinality(String),
    Computer LowCardinality(String),
    Application LowCardinality(String),
    Connection Int64,
    Event LowCardinality(String),
    Severity LowCardinality(String),
    Comment String CODEC(ZSTD(3)),
    MetadataUuid LowCardinality(String),
    Metadata LowCardinality(String),
    Data String CODEC(ZSTD(3)),
    DataPresentation String CODEC(ZSTD(3)),
    Server LowCardinality(String),
    MainPort Int32,
    AddPort Int32,
    Session Int64
) ENGINE = MergeTree()
PARTITION BY toYYYYMM(DateTime)
ORDER BY (DateTime, EndPosition)"
    )
}

pub(crate) fn position_sql(table: &str) -> String {
    format!(
        "SELECT FileName, EndPosition, LgfEndPosition, Id FROM `{table}` ORDER BY Id DESC LIMIT 1"
    )
}
