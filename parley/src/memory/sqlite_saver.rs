//! SQLite-backed checkpointer (SqliteSaver). Persistent across process restarts.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use rusqlite::{params, OptionalExtension};

use crate::graph::Interrupt;
use crate::memory::checkpoint::{
    Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource,
};
use crate::memory::checkpointer::{window, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;
use crate::memory::serializer::Serializer;

fn storage(e: impl std::fmt::Display) -> CheckpointError {
    CheckpointError::Storage(e.to_string())
}

/// SQLite-backed checkpointer. Key: (thread_id, checkpoint_ns, checkpoint_id).
///
/// The latest checkpoint of a thread is the most recently inserted row. With
/// `with_max_checkpoints`, older rows of the same thread are deleted on each `put`.
/// Blocking database work runs on `spawn_blocking`.
///
/// **Interaction**: Used as `Arc<dyn Checkpointer<S>>` in `StateGraph::compile_with_checkpointer`.
pub struct SqliteSaver<S> {
    db_path: PathBuf,
    serializer: Arc<dyn Serializer<S>>,
    max_checkpoints: Option<usize>,
}

type RowData = (String, String, Vec<u8>, String, i64, Option<String>, Option<String>);

impl<S> SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Opens (or creates) the database file and ensures the table exists.
    pub fn new(
        path: impl AsRef<Path>,
        serializer: Arc<dyn Serializer<S>>,
    ) -> Result<Self, CheckpointError> {
        let db_path = path.as_ref().to_path_buf();
        let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS checkpoints (
                thread_id TEXT NOT NULL,
                checkpoint_ns TEXT NOT NULL,
                checkpoint_id TEXT NOT NULL,
                ts TEXT NOT NULL,
                payload BLOB NOT NULL,
                metadata_source TEXT NOT NULL,
                metadata_step INTEGER NOT NULL,
                metadata_created_at TEXT,
                pending_interrupt TEXT,
                PRIMARY KEY (thread_id, checkpoint_ns, checkpoint_id)
            )
            "#,
            [],
        )
        .map_err(storage)?;
        tracing::debug!(path = %db_path.display(), "sqlite checkpointer ready");
        Ok(Self {
            db_path,
            serializer,
            max_checkpoints: None,
        })
    }

    /// Keeps only the newest `n` checkpoints per thread (at least one).
    pub fn with_max_checkpoints(mut self, n: usize) -> Self {
        self.max_checkpoints = Some(n.max(1));
        self
    }

    fn thread_id_required(config: &RunnableConfig) -> Result<String, CheckpointError> {
        config
            .thread_id
            .as_deref()
            .ok_or(CheckpointError::ThreadIdRequired)
            .map(String::from)
    }
}

#[async_trait]
impl<S> Checkpointer<S> for SqliteSaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let checkpoint_ns = config.checkpoint_ns.clone();
        let payload = self.serializer.serialize(&checkpoint.channel_values)?;
        let pending_interrupt = checkpoint
            .pending_interrupt
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let source = checkpoint.metadata.source.as_str();
        let step = checkpoint.metadata.step;
        let created_at = checkpoint.metadata.created_at.clone();
        let id = checkpoint.id.clone();
        let ts = checkpoint.ts.clone();
        let keep = self.max_checkpoints.map(|n| n as i64);

        let db_path = self.db_path.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
            let tx = conn.transaction().map_err(storage)?;
            tx.execute(
                r#"
                INSERT OR REPLACE INTO checkpoints
                (thread_id, checkpoint_ns, checkpoint_id, ts, payload,
                 metadata_source, metadata_step, metadata_created_at, pending_interrupt)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
                params![
                    thread_id,
                    checkpoint_ns,
                    id,
                    ts,
                    payload,
                    source,
                    step,
                    created_at,
                    pending_interrupt,
                ],
            )
            .map_err(storage)?;
            if let Some(keep) = keep {
                let pruned = tx
                    .execute(
                        r#"
                        DELETE FROM checkpoints
                        WHERE thread_id = ?1 AND checkpoint_ns = ?2 AND rowid NOT IN (
                            SELECT rowid FROM checkpoints
                            WHERE thread_id = ?1 AND checkpoint_ns = ?2
                            ORDER BY rowid DESC LIMIT ?3
                        )
                        "#,
                        params![thread_id, checkpoint_ns, keep],
                    )
                    .map_err(storage)?;
                if pruned > 0 {
                    tracing::trace!(thread_id = %thread_id, pruned, "pruned old checkpoints");
                }
            }
            tx.commit().map_err(storage)?;
            Ok::<String, CheckpointError>(id)
        })
        .await
        .map_err(storage)?
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let checkpoint_ns = config.checkpoint_ns.clone();
        let want_id = config.checkpoint_id.clone();
        let db_path = self.db_path.clone();

        let row: Option<RowData> = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
            let columns = "checkpoint_id, ts, payload, metadata_source, metadata_step,
                           metadata_created_at, pending_interrupt";
            let map_row = |row: &rusqlite::Row<'_>| -> rusqlite::Result<RowData> {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                ))
            };
            let row = match want_id {
                Some(cid) => conn
                    .query_row(
                        &format!(
                            "SELECT {columns} FROM checkpoints
                             WHERE thread_id = ?1 AND checkpoint_ns = ?2 AND checkpoint_id = ?3"
                        ),
                        params![thread_id, checkpoint_ns, cid],
                        map_row,
                    )
                    .optional(),
                None => conn
                    .query_row(
                        &format!(
                            "SELECT {columns} FROM checkpoints
                             WHERE thread_id = ?1 AND checkpoint_ns = ?2
                             ORDER BY rowid DESC LIMIT 1"
                        ),
                        params![thread_id, checkpoint_ns],
                        map_row,
                    )
                    .optional(),
            };
            row.map_err(storage)
        })
        .await
        .map_err(storage)??;

        let Some((checkpoint_id, ts, payload, source, step, created_at, interrupt_json)) = row
        else {
            return Ok(None);
        };

        let channel_values = self.serializer.deserialize(&payload)?;
        let pending_interrupt: Option<Interrupt> = interrupt_json
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .map_err(|e| CheckpointError::Serialization(e.to_string()))?;
        let metadata = CheckpointMetadata {
            source: CheckpointSource::parse(&source),
            step,
            created_at,
        };
        let checkpoint = Checkpoint {
            id: checkpoint_id,
            ts,
            channel_values,
            metadata: metadata.clone(),
            pending_interrupt,
        };
        Ok(Some((checkpoint, metadata)))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let thread_id = Self::thread_id_required(config)?;
        let checkpoint_ns = config.checkpoint_ns.clone();
        let db_path = self.db_path.clone();

        let items = tokio::task::spawn_blocking(move || {
            let conn = rusqlite::Connection::open(&db_path).map_err(storage)?;
            let mut stmt = conn
                .prepare(
                    "SELECT checkpoint_id, metadata_source, metadata_step, metadata_created_at
                     FROM checkpoints WHERE thread_id = ?1 AND checkpoint_ns = ?2
                     ORDER BY rowid ASC",
                )
                .map_err(storage)?;
            let rows = stmt
                .query_map(params![thread_id, checkpoint_ns], |row| {
                    Ok(CheckpointListItem {
                        checkpoint_id: row.get(0)?,
                        metadata: CheckpointMetadata {
                            source: CheckpointSource::parse(&row.get::<_, String>(1)?),
                            step: row.get(2)?,
                            created_at: row.get(3)?,
                        },
                    })
                })
                .map_err(storage)?;
            rows.collect::<Result<Vec<_>, _>>().map_err(storage)
        })
        .await
        .map_err(storage)??;

        Ok(window(items, limit, before, after))
    }
}
