// SPDX-License-Identifier: AGPL-3.0-or-later

//! Persistent storage for the mirrored object graph.
//!
//! The main interface is [`Mirror`] which owns a SQLite database exclusively for its own
//! lifetime and exposes the registration, planning and ingestion operations on top of it.
//! Concurrent external writers on the same database violate the store invariants.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Error, Result};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{Sqlite, SqlitePool, SqlitePoolOptions};

use crate::errors::MirrorError;
use crate::schema::{fingerprint, Schema, SchemaIndex};

pub mod models;
pub mod stores;

/// Re-export of the connection pool type.
pub type Pool = SqlitePool;

/// Creates the database file behind `url` unless it already exists.
pub async fn create_database(url: &str) -> Result<()> {
    if !Sqlite::database_exists(url).await? {
        Sqlite::create_database(url).await?;
    }

    Ok(())
}

/// Builds the connection pool a [`Mirror`] is opened over.
///
/// The mirror serializes all writes itself, a single connection is the intended
/// configuration.
pub async fn connection_pool(url: &str, max_connections: u32) -> Result<Pool, Error> {
    let pool: Pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await?;

    Ok(pool)
}

/// Local mirror of a remote GraphQL object graph.
///
/// Opening a mirror installs the relational layout derived from the schema, or verifies that
/// the attached store was created from the identical schema. All further operations are
/// defined in the `stores` submodules.
#[derive(Clone, Debug)]
pub struct Mirror {
    pub(crate) pool: Pool,
    pub(crate) index: SchemaIndex,
    writing: Arc<AtomicBool>,
}

impl Mirror {
    /// Opens a mirror over the given pool and schema.
    ///
    /// Validates and decomposes the schema, then runs the installer: a fresh store receives
    /// all structural and per-type tables, a store created from the identical schema is left
    /// untouched and any other store is refused with `IncompatibleStore`.
    pub async fn open(pool: Pool, schema: &Schema) -> Result<Self, MirrorError> {
        let index = SchemaIndex::new(schema)?;
        let fingerprint = fingerprint(schema)?;

        let mirror = Self {
            pool,
            index,
            writing: Arc::new(AtomicBool::new(false)),
        };
        mirror.install(&fingerprint).await?;

        Ok(mirror)
    }

    /// Returns the decomposed schema this mirror was opened with.
    pub fn schema(&self) -> &SchemaIndex {
        &self.index
    }

    /// Marks the start of a transaction, failing fast when one is already active.
    ///
    /// The store is owned by a single logical writer. Transactions never nest: inner helpers
    /// (`*_with`) take the open connection instead of beginning their own transaction. The
    /// returned guard clears the flag again when it is dropped, on the commit and the
    /// rollback path alike.
    pub(crate) fn begin_guard(&self) -> Result<TransactionGuard, MirrorError> {
        if self
            .writing
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(MirrorError::AlreadyInTransaction);
        }

        Ok(TransactionGuard {
            writing: self.writing.clone(),
        })
    }
}

/// Guard marking an active transaction on a [`Mirror`].
#[derive(Debug)]
pub(crate) struct TransactionGuard {
    writing: Arc<AtomicBool>,
}

impl Drop for TransactionGuard {
    fn drop(&mut self) {
        self.writing.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::MirrorError;
    use crate::test_utils::{repo_schema, test_mirror};

    #[tokio::test]
    async fn nested_transactions_fail_fast() {
        let mirror = test_mirror(&repo_schema()).await;

        let _guard = mirror.begin_guard().unwrap();

        // Any transactional operation attempted while a transaction is active is rejected
        // before touching the store.
        let result = mirror.register_object("Repo", "r1").await;
        assert!(matches!(result, Err(MirrorError::AlreadyInTransaction)));

        drop(_guard);
        mirror.register_object("Repo", "r1").await.unwrap();
    }
}
