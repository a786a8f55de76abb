// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! SQL confession store (SQLite or MySQL through the sqlx `Any` driver).
//!
//! Schema:
//! ```sql
//! CREATE TABLE confessions (
//!   seq BIGINT AUTO_INCREMENT PRIMARY KEY,  -- insertion order, breaks created_at ties
//!   id VARCHAR(36) NOT NULL UNIQUE,
//!   content TEXT NOT NULL,
//!   likes BIGINT NOT NULL DEFAULT 0,
//!   username VARCHAR(64) NOT NULL DEFAULT 'anonymous',
//!   created_at BIGINT NOT NULL,           -- epoch millis
//!   INDEX idx_created (created_at, seq)
//! )
//! ```
//!
//! ## sqlx Any Driver Quirks
//!
//! MySQL TEXT columns come back as bytes through the `Any` driver, so text
//! columns are read as `String` first and `Vec<u8>` second.

use std::sync::Once;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::any::{AnyPoolOptions, AnyRow};
use sqlx::{AnyPool, Row};
use tracing::debug;

use super::traits::{ConfessionStore, DeleteResult, StorageError};
use crate::confession::{now_millis, validate_content, Confession, ConfessionId};
use crate::resilience::retry::{retry, RetryConfig};

// SQLx `Any` driver requires runtime installation
static INSTALL_DRIVERS: Once = Once::new();

fn install_drivers() {
    INSTALL_DRIVERS.call_once(|| {
        sqlx::any::install_default_drivers();
    });
}

/// Ids per DELETE statement.
const DELETE_CHUNK: usize = 500;

const COLUMNS: &str = "id, content, likes, username, created_at";

pub struct SqlStore {
    pool: AnyPool,
    is_sqlite: bool,
}

impl SqlStore {
    /// Connect, retrying briefly, and create the schema if missing.
    pub async fn new(connection_string: &str) -> Result<Self, StorageError> {
        install_drivers();

        let is_sqlite = connection_string.starts_with("sqlite:");
        let in_memory = is_sqlite && connection_string.contains(":memory:");

        let pool = retry("sql_connect", &RetryConfig::connect(), || async {
            let options = if in_memory {
                // Every connection to :memory: is a separate database
                AnyPoolOptions::new()
                    .max_connections(1)
                    .idle_timeout(None)
                    .max_lifetime(None)
            } else {
                AnyPoolOptions::new()
                    .max_connections(10)
                    .idle_timeout(Duration::from_secs(300))
            };
            options
                .acquire_timeout(Duration::from_secs(10))
                .connect(connection_string)
                .await
                .map_err(|e| StorageError::Unavailable(e.to_string()))
        })
        .await?;

        let store = Self { pool, is_sqlite };

        if is_sqlite && !in_memory {
            store.enable_wal_mode().await?;
        }

        store.init_schema().await?;
        Ok(store)
    }

    async fn enable_wal_mode(&self) -> Result<(), StorageError> {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to enable WAL mode: {}", e)))?;

        sqlx::query("PRAGMA synchronous = NORMAL")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to set synchronous mode: {}", e)))?;

        Ok(())
    }

    async fn init_schema(&self) -> Result<(), StorageError> {
        let statements: &[&str] = if self.is_sqlite {
            &[
                r#"
                CREATE TABLE IF NOT EXISTS confessions (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    id TEXT NOT NULL UNIQUE,
                    content TEXT NOT NULL,
                    likes INTEGER NOT NULL DEFAULT 0,
                    username TEXT NOT NULL DEFAULT 'anonymous',
                    created_at INTEGER NOT NULL
                )
                "#,
                "CREATE INDEX IF NOT EXISTS idx_confessions_created ON confessions (created_at, seq)",
            ]
        } else {
            &[r#"
                CREATE TABLE IF NOT EXISTS confessions (
                    seq BIGINT AUTO_INCREMENT PRIMARY KEY,
                    id VARCHAR(36) NOT NULL UNIQUE,
                    content TEXT NOT NULL,
                    likes BIGINT NOT NULL DEFAULT 0,
                    username VARCHAR(64) NOT NULL DEFAULT 'anonymous',
                    created_at BIGINT NOT NULL,
                    INDEX idx_created (created_at, seq)
                ) CHARACTER SET utf8mb4
                "#]
        };

        for sql in statements {
            retry("sql_init_schema", &RetryConfig::connect(), || async {
                sqlx::query(sql)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| StorageError::Backend(e.to_string()))
            })
            .await?;
        }

        Ok(())
    }

    /// Insert one row. Retries are safe: if an earlier attempt committed but
    /// its reply was lost, the duplicate id is recognised and accepted.
    async fn insert(&self, confession: &Confession) -> Result<(), StorageError> {
        retry("sql_create", &RetryConfig::query(), || async {
            let result = sqlx::query(
                "INSERT INTO confessions (id, content, likes, username, created_at) VALUES (?, ?, ?, ?, ?)",
            )
            .bind(confession.id.as_str())
            .bind(confession.content.as_str())
            .bind(confession.likes as i64)
            .bind(confession.username.as_str())
            .bind(confession.created_at)
            .execute(&self.pool)
            .await;

            match result {
                Ok(_) => Ok(()),
                Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                    match self.stored_content(&confession.id).await {
                        Ok(Some(stored)) if stored == confession.content => {
                            debug!(id = %confession.id, "Insert already committed by an earlier attempt");
                            Ok(())
                        }
                        Ok(_) => Err(StorageError::Backend(db.to_string())),
                        Err(e) => Err(e),
                    }
                }
                Err(e) => Err(map_sqlx(e)),
            }
        })
        .await
    }

    async fn stored_content(&self, id: &ConfessionId) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT content FROM confessions WHERE id = ?")
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx)?;
        Ok(row.and_then(|row| text_column(&row, "content")))
    }

    fn length_fn(&self) -> &'static str {
        if self.is_sqlite {
            "LENGTH"
        } else {
            "CHAR_LENGTH"
        }
    }

    async fn fetch_ordered(
        &self,
        operation: &str,
        order: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Confession>, StorageError> {
        let sql = match limit {
            Some(_) => format!(
                "SELECT {} FROM confessions ORDER BY created_at {order}, seq {order} LIMIT ?",
                COLUMNS
            ),
            None => format!(
                "SELECT {} FROM confessions ORDER BY created_at {order}, seq {order}",
                COLUMNS
            ),
        };

        let rows = retry(operation, &RetryConfig::query(), || async {
            let mut query = sqlx::query(&sql);
            if let Some(limit) = limit {
                query = query.bind(i64::try_from(limit).unwrap_or(i64::MAX));
            }
            query.fetch_all(&self.pool).await.map_err(map_sqlx)
        })
        .await?;

        rows.iter().map(row_to_confession).collect()
    }
}

fn map_sqlx(e: sqlx::Error) -> StorageError {
    match e {
        sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
            StorageError::Unavailable(e.to_string())
        }
        other => StorageError::Backend(other.to_string()),
    }
}

/// Read a text column as String (SQLite) or bytes (MySQL via Any).
fn text_column(row: &AnyRow, name: &str) -> Option<String> {
    row.try_get::<String, _>(name).ok().or_else(|| {
        row.try_get::<Vec<u8>, _>(name)
            .ok()
            .and_then(|bytes| String::from_utf8(bytes).ok())
    })
}

fn row_to_confession(row: &AnyRow) -> Result<Confession, StorageError> {
    let id = text_column(row, "id")
        .ok_or_else(|| StorageError::Backend("confession row without id".to_string()))?;
    let content = text_column(row, "content").unwrap_or_default();
    let username = text_column(row, "username")
        .unwrap_or_else(|| crate::confession::ANONYMOUS.to_string());
    let created_at: i64 = row.try_get("created_at").unwrap_or(0);
    let likes: i64 = row.try_get("likes").unwrap_or(0);

    Ok(Confession {
        id: ConfessionId::from(id),
        content,
        created_at,
        likes: likes.max(0) as u64,
        username,
    })
}

#[async_trait]
impl ConfessionStore for SqlStore {
    async fn create(&self, content: &str) -> Result<Confession, StorageError> {
        validate_content(content)?;

        let confession = Confession::new(ConfessionId::generate(), content.to_string(), now_millis());
        self.insert(&confession).await?;
        Ok(confession)
    }

    async fn count(&self) -> Result<u64, StorageError> {
        let count: i64 = retry("sql_count", &RetryConfig::query(), || async {
            sqlx::query_scalar("SELECT COUNT(*) FROM confessions")
                .fetch_one(&self.pool)
                .await
                .map_err(map_sqlx)
        })
        .await?;
        Ok(count.max(0) as u64)
    }

    async fn list_oldest(&self, limit: usize) -> Result<Vec<Confession>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.fetch_ordered("sql_list_oldest", "ASC", Some(limit)).await
    }

    async fn list_newest(&self, limit: usize) -> Result<Vec<Confession>, StorageError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        self.fetch_ordered("sql_list_newest", "DESC", Some(limit)).await
    }

    async fn list_all(&self) -> Result<Vec<Confession>, StorageError> {
        self.fetch_ordered("sql_list_all", "ASC", None).await
    }

    async fn content_lengths(&self) -> Result<Vec<usize>, StorageError> {
        let sql = format!("SELECT {}(content) AS len FROM confessions", self.length_fn());
        let lengths: Vec<i64> = retry("sql_content_lengths", &RetryConfig::query(), || async {
            sqlx::query_scalar(&sql)
                .fetch_all(&self.pool)
                .await
                .map_err(map_sqlx)
        })
        .await?;
        Ok(lengths.into_iter().map(|len| len.max(0) as usize).collect())
    }

    async fn delete_by_ids(&self, ids: &[ConfessionId]) -> Result<DeleteResult, StorageError> {
        let mut deleted = 0u64;

        for chunk in ids.chunks(DELETE_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!("DELETE FROM confessions WHERE id IN ({})", placeholders);

            let result = retry("sql_delete_by_ids", &RetryConfig::query(), || async {
                let mut query = sqlx::query(&sql);
                for id in chunk {
                    query = query.bind(id.as_str());
                }
                query.execute(&self.pool).await.map_err(map_sqlx)
            })
            .await?;

            deleted += result.rows_affected();
        }

        Ok(DeleteResult { deleted })
    }

    async fn delete_all(&self) -> Result<DeleteResult, StorageError> {
        let result = retry("sql_delete_all", &RetryConfig::query(), || async {
            sqlx::query("DELETE FROM confessions")
                .execute(&self.pool)
                .await
                .map_err(map_sqlx)
        })
        .await?;
        Ok(DeleteResult { deleted: result.rows_affected() })
    }
}
