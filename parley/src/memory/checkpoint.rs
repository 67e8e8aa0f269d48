//! Checkpoint and metadata types.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::graph::Interrupt;

/// Where a checkpoint was written from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CheckpointSource {
    /// Written before any node ran.
    #[default]
    Input,
    /// Written by the run loop after a step or on interrupt.
    Loop,
}

impl CheckpointSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointSource::Input => "input",
            CheckpointSource::Loop => "loop",
        }
    }

    /// Parses the stored form; unknown values map to `Loop`.
    pub fn parse(s: &str) -> Self {
        match s {
            "input" => CheckpointSource::Input,
            _ => CheckpointSource::Loop,
        }
    }
}

/// Metadata for a single checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointMetadata {
    pub source: CheckpointSource,
    /// Number of nodes completed in the run that wrote this checkpoint.
    pub step: i64,
    /// RFC 3339 creation time.
    pub created_at: Option<String>,
}

/// Snapshot of graph state for one thread at one point in time.
///
/// `pending_interrupt` is set when the run stopped because a node interrupted; the
/// state is then the one that node received, so re-running it resumes the turn.
#[derive(Debug, Clone)]
pub struct Checkpoint<S> {
    pub id: String,
    pub ts: String,
    pub channel_values: S,
    pub metadata: CheckpointMetadata,
    pub pending_interrupt: Option<Interrupt>,
}

/// Entry returned by `Checkpointer::list`.
#[derive(Debug, Clone)]
pub struct CheckpointListItem {
    pub checkpoint_id: String,
    pub metadata: CheckpointMetadata,
}

impl<S> Checkpoint<S> {
    /// New checkpoint with a fresh UUID v4 id and the current time.
    pub fn from_state(state: S, source: CheckpointSource, step: i64) -> Self {
        let ts = Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            ts: ts.clone(),
            channel_values: state,
            metadata: CheckpointMetadata {
                source,
                step,
                created_at: Some(ts),
            },
            pending_interrupt: None,
        }
    }

    /// Attaches the interrupt the run stopped on.
    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.pending_interrupt = Some(interrupt);
        self
    }
}
