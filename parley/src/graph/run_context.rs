//! Run context passed into nodes: runnable config plus optional stream sender.

use std::collections::HashSet;
use std::fmt::Debug;

use tokio::sync::mpsc;

use crate::memory::RunnableConfig;
use crate::stream::{StreamEvent, StreamMode};

/// Config for the current run and where to send stream events.
#[derive(Clone)]
pub struct RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub config: RunnableConfig,
    pub stream_tx: Option<mpsc::Sender<StreamEvent<S>>>,
    pub stream_mode: HashSet<StreamMode>,
}

impl<S> RunContext<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new(config: RunnableConfig) -> Self {
        Self {
            config,
            stream_tx: None,
            stream_mode: HashSet::new(),
        }
    }

    /// Attaches a stream sender and the modes to emit.
    pub fn with_stream(
        mut self,
        tx: mpsc::Sender<StreamEvent<S>>,
        modes: impl Into<HashSet<StreamMode>>,
    ) -> Self {
        self.stream_tx = Some(tx);
        self.stream_mode = modes.into();
        self
    }

    pub fn thread_id(&self) -> Option<&str> {
        self.config.thread_id.as_deref()
    }

    /// Sends `event` when `mode` is enabled. A closed receiver is ignored.
    pub(crate) async fn emit(&self, mode: StreamMode, event: impl FnOnce() -> StreamEvent<S>) {
        if !self.stream_mode.contains(&mode) {
            return;
        }
        if let Some(tx) = &self.stream_tx {
            let _ = tx.send(event()).await;
        }
    }
}
