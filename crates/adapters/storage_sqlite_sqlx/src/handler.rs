//! Database handler — the minimal execution abstraction over the store.
//!
//! Repositories express each operation as a unit of work (a closure
//! receiving a live connection and returning a boxed future) and hand it to
//! the handler, which owns connection acquisition, transaction demarcation,
//! and the live-query machinery. The handler performs no retries and no
//! error translation beyond wrapping sqlx failures in [`StorageError`].

use futures::future::BoxFuture;
use sqlx::{SqliteConnection, SqlitePool};
use tokio::sync::{broadcast, mpsc};
use tokio_stream::wrappers::ReceiverStream;

use shiori_app::change_bus::InProcessChangeBus;
use shiori_domain::change::Change;

use crate::error::StorageError;

/// A unit of work executed against a borrowed connection.
pub type UnitOfWork<'c, T> = BoxFuture<'c, sqlx::Result<T>>;

/// A re-runnable read executed against the pool by live queries.
pub type LiveQuery<'a, T> = BoxFuture<'a, sqlx::Result<T>>;

/// Buffered emissions per subscription before backpressure applies.
const SUBSCRIPTION_BUFFER: usize = 16;

/// Executes units of work against the `SQLite` pool and drives live queries.
///
/// Cloning is cheap; clones share the pool and the change bus.
#[derive(Clone)]
pub struct DatabaseHandler {
    pool: SqlitePool,
    bus: InProcessChangeBus,
}

impl DatabaseHandler {
    /// Create a handler over the given pool and change bus.
    #[must_use]
    pub fn new(pool: SqlitePool, bus: InProcessChangeBus) -> Self {
        Self { pool, bus }
    }

    /// Borrow the underlying pool.
    #[must_use]
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Subscribe to raw change notifications.
    #[must_use]
    pub fn changes(&self) -> broadcast::Receiver<Change> {
        self.bus.subscribe()
    }

    /// Publish a change notification, waking affected live queries.
    ///
    /// Writers call this *after* their unit of work has committed.
    pub fn notify(&self, change: Change) {
        self.bus.publish(change);
    }

    /// Run a read expected to produce exactly one row.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on connection or query failure (including
    /// `sqlx::Error::RowNotFound` when no row matched).
    pub async fn fetch_one<T, F>(&self, block: F) -> Result<T, StorageError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, T> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        Ok(block(&mut conn).await?)
    }

    /// Run a read producing zero or one row. "No row" is `Ok(None)`,
    /// never an error.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on connection or query failure.
    pub async fn fetch_optional<T, F>(&self, block: F) -> Result<Option<T>, StorageError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, Option<T>> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        Ok(block(&mut conn).await?)
    }

    /// Run a read producing any number of rows.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on connection or query failure.
    pub async fn fetch_all<T, F>(&self, block: F) -> Result<Vec<T>, StorageError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, Vec<T>> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        Ok(block(&mut conn).await?)
    }

    /// Run a write on a single connection, without transaction demarcation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on connection or query failure.
    pub async fn execute<T, F>(&self, block: F) -> Result<T, StorageError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, T> + Send,
    {
        let mut conn = self.pool.acquire().await?;
        Ok(block(&mut conn).await?)
    }

    /// Run a multi-statement write atomically: the unit of work executes
    /// inside `BEGIN`/`COMMIT`, and any error rolls the whole batch back.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError`] on connection, query, or commit failure.
    pub async fn execute_in_transaction<T, F>(&self, block: F) -> Result<T, StorageError>
    where
        T: Send,
        F: for<'c> FnOnce(&'c mut SqliteConnection) -> UnitOfWork<'c, T> + Send,
    {
        let mut tx = self.pool.begin().await?;
        let value = block(&mut tx).await?;
        tx.commit().await?;
        Ok(value)
    }

    /// Live query over zero-or-one row.
    ///
    /// The stream emits the current result immediately, then re-runs
    /// `query` and re-emits whenever a published [`Change`] satisfies
    /// `relevant`. Store failures are emitted as `Err` items. Dropping the
    /// stream cancels the underlying task.
    pub fn subscribe_optional<T, P, F>(
        &self,
        relevant: P,
        query: F,
    ) -> ReceiverStream<Result<Option<T>, StorageError>>
    where
        T: Send + 'static,
        P: Fn(&Change) -> bool + Send + 'static,
        F: for<'a> Fn(&'a SqlitePool) -> LiveQuery<'a, Option<T>> + Send + 'static,
    {
        self.subscribe_with(relevant, query)
    }

    /// Live query over a row list; semantics match [`subscribe_optional`].
    ///
    /// [`subscribe_optional`]: Self::subscribe_optional
    pub fn subscribe_list<T, P, F>(
        &self,
        relevant: P,
        query: F,
    ) -> ReceiverStream<Result<Vec<T>, StorageError>>
    where
        T: Send + 'static,
        P: Fn(&Change) -> bool + Send + 'static,
        F: for<'a> Fn(&'a SqlitePool) -> LiveQuery<'a, Vec<T>> + Send + 'static,
    {
        self.subscribe_with(relevant, query)
    }

    fn subscribe_with<R, P, F>(&self, relevant: P, query: F) -> ReceiverStream<Result<R, StorageError>>
    where
        R: Send + 'static,
        P: Fn(&Change) -> bool + Send + 'static,
        F: for<'a> Fn(&'a SqlitePool) -> LiveQuery<'a, R> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel(SUBSCRIPTION_BUFFER);
        let pool = self.pool.clone();
        // Register before the initial read so a write landing in between
        // still triggers a re-emission.
        let mut changes = self.bus.subscribe();

        tokio::spawn(async move {
            let current = query(&pool).await.map_err(StorageError::from);
            if tx.send(current).await.is_err() {
                return;
            }

            loop {
                tokio::select! {
                    received = changes.recv() => match received {
                        Ok(change) if relevant(&change) => {
                            let current = query(&pool).await.map_err(StorageError::from);
                            if tx.send(current).await.is_err() {
                                return;
                            }
                        }
                        Ok(_) => {}
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            // Missed notifications may have been relevant;
                            // re-run the query unconditionally.
                            tracing::warn!(skipped, "live query lagged behind change bus");
                            let current = query(&pool).await.map_err(StorageError::from);
                            if tx.send(current).await.is_err() {
                                return;
                            }
                        }
                        Err(broadcast::error::RecvError::Closed) => return,
                    },
                    () = tx.closed() => return,
                }
            }
        });

        ReceiverStream::new(rx)
    }
}
