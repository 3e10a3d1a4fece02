//! Connection manager - owns the single shared PostgreSQL client
//!
//! The client is opened lazily on first use and pinged before every reuse.
//! A failed ping drops the stale client and opens a new one, once; if that
//! also fails the caller gets a connection error to report.

use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::{MappedMutexGuard, Mutex, MutexGuard};
use tokio_postgres::{Client, NoTls};

use crate::config::ConnectionConfig;
use crate::types::DbError;

/// Exclusive access to the shared client; dropping it releases the connection
pub type ConnectionLease<'a> = MappedMutexGuard<'a, Client>;

pub struct ConnectionManager {
    config: ConnectionConfig,
    client: Mutex<Option<Client>>,
    acquisitions: AtomicU64,
}

impl ConnectionManager {
    /// Create a manager; no connection is opened until the first `acquire`
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: Mutex::new(None),
            acquisitions: AtomicU64::new(0),
        }
    }

    /// Acquire the live client, connecting or reconnecting as needed
    ///
    /// Concurrent callers wait for the lease held by the current statement.
    pub async fn acquire(&self) -> Result<ConnectionLease<'_>, DbError> {
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        let mut slot = self.client.lock().await;

        let alive = match slot.as_ref() {
            Some(client) => is_alive(client).await,
            None => false,
        };

        if !alive {
            if slot.take().is_some() {
                tracing::warn!("Database connection failed liveness check, reconnecting");
            }
            *slot = Some(self.connect().await?);
        }

        MutexGuard::try_map(slot, Option::as_mut).map_err(|_| {
            DbError::Connection("connection slot empty after connect".to_string())
        })
    }

    /// Number of times `acquire` has been called
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> &ConnectionConfig {
        &self.config
    }

    async fn connect(&self) -> Result<Client, DbError> {
        let target = self.config.display_target();
        tracing::debug!(db = %target, "Opening database connection");

        let (client, connection) = self
            .config
            .to_pg_config()
            .connect(NoTls)
            .await
            .map_err(|e| {
                tracing::error!(db = %target, "Failed to connect to database: {}", e);
                DbError::connection(&e)
            })?;

        // The connection future drives the socket; it ends when the client drops.
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("Database connection error: {}", e);
            }
        });

        tracing::info!(db = %target, "Connected to database");
        Ok(client)
    }
}

async fn is_alive(client: &Client) -> bool {
    if client.is_closed() {
        return false;
    }
    match client.batch_execute("SELECT 1").await {
        Ok(()) => true,
        Err(e) => {
            tracing::debug!("Liveness check failed: {}", e);
            false
        }
    }
}
