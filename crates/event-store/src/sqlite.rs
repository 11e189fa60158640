use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;

use crate::{
    EventId, EventKind, EventRange, EventStoreError, LedgerEvent, Result, StoredEvent,
    event::{Adjustment, Trade},
    store::{EventStore, EventStream, validate_for_append},
};

const SELECT_ALL: &str = r#"
    SELECT id, ts, kind, product, unit_price, qty, comment, value
    FROM events
    ORDER BY id ASC
"#;

const SELECT_RANGE: &str = r#"
    SELECT id, ts, kind, product, unit_price, qty, comment, value
    FROM events
    WHERE id BETWEEN ? AND ?
    ORDER BY id ASC
"#;

/// SQLite-backed event store implementation.
#[derive(Clone)]
pub struct SqliteEventStore {
    pool: SqlitePool,
}

impl SqliteEventStore {
    /// Creates a new SQLite event store.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Opens a pool for `url`, creating the database file if it does not exist.
    pub async fn connect(url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Ok(Self::new(pool))
    }

    /// Opens a private in-memory database.
    ///
    /// Every SQLite connection to `:memory:` sees its own database, so the pool
    /// is pinned to a single connection that is never recycled.
    pub async fn in_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect("sqlite::memory:")
            .await?;
        Ok(Self::new(pool))
    }

    /// Gets a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Runs the database migrations.
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("../../migrations").run(&self.pool).await?;
        Ok(())
    }

    // Missing numeric columns read as zero so old or hand-edited rows still project.
    fn row_to_event(row: SqliteRow) -> Result<StoredEvent> {
        let id: i64 = row.try_get("id")?;
        let timestamp: DateTime<Utc> = row.try_get("ts")?;
        let kind: String = row.try_get("kind")?;

        let event = match EventKind::parse(&kind) {
            Some(kind @ (EventKind::Buy | EventKind::Sell)) => {
                let quantity: i64 = row.try_get::<Option<i64>, _>("qty")?.unwrap_or(0);
                let trade = Trade {
                    product: row
                        .try_get::<Option<String>, _>("product")?
                        .unwrap_or_default(),
                    unit_price: row
                        .try_get::<Option<f64>, _>("unit_price")?
                        .unwrap_or(0.0),
                    quantity: u32::try_from(quantity).unwrap_or(0),
                };
                if kind == EventKind::Buy {
                    LedgerEvent::Buy(trade)
                } else {
                    LedgerEvent::Sell(trade)
                }
            }
            Some(EventKind::Balance) => LedgerEvent::Balance(Adjustment {
                comment: row
                    .try_get::<Option<String>, _>("comment")?
                    .unwrap_or_default(),
                value: row.try_get::<Option<f64>, _>("value")?.unwrap_or(0.0),
            }),
            None => return Err(EventStoreError::UnknownKind { id, kind }),
        };

        Ok(StoredEvent::new(EventId::new(id), timestamp, event))
    }
}

#[async_trait]
impl EventStore for SqliteEventStore {
    #[tracing::instrument(skip(self, event), fields(kind = %event.kind()))]
    async fn append(&self, event: LedgerEvent) -> Result<EventId> {
        validate_for_append(&event)?;

        let query = sqlx::query(
            r#"
            INSERT INTO events (ts, kind, product, unit_price, qty, comment, value)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(Utc::now())
        .bind(event.kind().as_str());

        // Columns of the other kinds stay NULL
        let query = match &event {
            LedgerEvent::Buy(trade) | LedgerEvent::Sell(trade) => query
                .bind(trade.product.as_str())
                .bind(trade.unit_price)
                .bind(i64::from(trade.quantity))
                .bind(None::<String>)
                .bind(None::<f64>),
            LedgerEvent::Balance(adjustment) => query
                .bind(None::<String>)
                .bind(None::<f64>)
                .bind(None::<i64>)
                .bind(adjustment.comment.as_str())
                .bind(adjustment.value),
        };

        let result = query.execute(&self.pool).await?;
        let id = EventId::new(result.last_insert_rowid());

        tracing::debug!(%id, "event appended");
        Ok(id)
    }

    async fn get_range(&self, range: Option<EventRange>) -> Result<Vec<StoredEvent>> {
        let rows = match range {
            Some(range) => {
                sqlx::query(SELECT_RANGE)
                    .bind(range.from_id().as_i64())
                    .bind(range.to_id().as_i64())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?,
        };

        rows.into_iter().map(Self::row_to_event).collect()
    }

    async fn stream_all_events(&self) -> Result<EventStream> {
        use futures_util::stream;

        // Rows are read up front so the stream does not borrow the pool
        let rows = sqlx::query(SELECT_ALL).fetch_all(&self.pool).await?;
        let events: Vec<_> = rows.into_iter().map(Self::row_to_event).collect();

        Ok(Box::pin(stream::iter(events)))
    }

    async fn event_count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(count as u64)
    }

    async fn last_event_id(&self) -> Result<Option<EventId>> {
        let id: Option<i64> = sqlx::query_scalar("SELECT MAX(id) FROM events")
            .fetch_one(&self.pool)
            .await?;
        Ok(id.map(EventId::new))
    }
}
