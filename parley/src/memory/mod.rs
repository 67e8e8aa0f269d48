//! Session memory: checkpoints keyed by thread id.
//!
//! The graph saves a `Checkpoint<S>` after each run (and before suspending on an
//! interrupt); the chat runner reads the latest one to continue a thread.
//!
//! - `MemorySaver`: in-process, lost on exit.
//! - `SqliteSaver`: one SQLite file, survives restarts. State is encoded by a `Serializer`.

mod checkpoint;
mod checkpointer;
mod config;
mod memory_saver;
mod serializer;
mod sqlite_saver;

pub use checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata, CheckpointSource};
pub use checkpointer::{CheckpointError, Checkpointer};
pub use config::RunnableConfig;
pub use memory_saver::MemorySaver;
pub use serializer::{JsonSerializer, Serializer};
pub use sqlite_saver::SqliteSaver;
