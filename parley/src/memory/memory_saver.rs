//! In-memory checkpointer (MemorySaver). Not persistent; for dev and tests.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::memory::checkpoint::{Checkpoint, CheckpointListItem, CheckpointMetadata};
use crate::memory::checkpointer::{window, CheckpointError, Checkpointer};
use crate::memory::config::RunnableConfig;

/// In-memory checkpointer. Key: `"{thread_id}:{checkpoint_ns}"`; each key holds its
/// checkpoints newest last, at most `max_checkpoints` of them when a cap is set.
///
/// **Interaction**: Used as `Arc<dyn Checkpointer<S>>` in `StateGraph::compile_with_checkpointer`.
pub struct MemorySaver<S> {
    by_thread: Arc<RwLock<HashMap<String, Vec<Checkpoint<S>>>>>,
    max_checkpoints: Option<usize>,
}

impl<S> MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            by_thread: Arc::new(RwLock::new(HashMap::new())),
            max_checkpoints: None,
        }
    }

    /// Keeps only the newest `n` checkpoints per thread (at least one).
    pub fn with_max_checkpoints(mut self, n: usize) -> Self {
        self.max_checkpoints = Some(n.max(1));
        self
    }

    fn thread_key(config: &RunnableConfig) -> Result<String, CheckpointError> {
        let thread_id = config
            .thread_id
            .as_deref()
            .ok_or(CheckpointError::ThreadIdRequired)?;
        Ok(format!("{}:{}", thread_id, config.checkpoint_ns))
    }
}

impl<S> Default for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<S> Checkpointer<S> for MemorySaver<S>
where
    S: Clone + Send + Sync + 'static,
{
    async fn put(
        &self,
        config: &RunnableConfig,
        checkpoint: &Checkpoint<S>,
    ) -> Result<String, CheckpointError> {
        let key = Self::thread_key(config)?;
        let mut guard = self.by_thread.write().await;
        let list = guard.entry(key).or_default();
        list.push(checkpoint.clone());
        if let Some(max) = self.max_checkpoints {
            let excess = list.len().saturating_sub(max);
            list.drain(..excess);
        }
        Ok(checkpoint.id.clone())
    }

    async fn get_tuple(
        &self,
        config: &RunnableConfig,
    ) -> Result<Option<(Checkpoint<S>, CheckpointMetadata)>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.by_thread.read().await;
        let Some(list) = guard.get(&key) else {
            return Ok(None);
        };
        let found = match &config.checkpoint_id {
            Some(cid) => list.iter().find(|cp| &cp.id == cid),
            None => list.last(),
        };
        Ok(found.map(|cp| (cp.clone(), cp.metadata.clone())))
    }

    async fn list(
        &self,
        config: &RunnableConfig,
        limit: Option<usize>,
        before: Option<&str>,
        after: Option<&str>,
    ) -> Result<Vec<CheckpointListItem>, CheckpointError> {
        let key = Self::thread_key(config)?;
        let guard = self.by_thread.read().await;
        let items = guard
            .get(&key)
            .map(|list| {
                list.iter()
                    .map(|cp| CheckpointListItem {
                        checkpoint_id: cp.id.clone(),
                        metadata: cp.metadata.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(window(items, limit, before, after))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::CheckpointSource;

    #[tokio::test]
    async fn put_requires_thread_id() {
        let saver = MemorySaver::<i32>::new();
        let cp = Checkpoint::from_state(1, CheckpointSource::Loop, 0);
        let err = saver.put(&RunnableConfig::default(), &cp).await.unwrap_err();
        assert!(matches!(err, CheckpointError::ThreadIdRequired));
    }

    #[tokio::test]
    async fn get_tuple_returns_latest_or_requested_checkpoint() {
        let saver = MemorySaver::<i32>::new();
        let config = RunnableConfig::for_thread("t1");
        let first = Checkpoint::from_state(1, CheckpointSource::Loop, 1);
        let second = Checkpoint::from_state(2, CheckpointSource::Loop, 2);
        saver.put(&config, &first).await.unwrap();
        saver.put(&config, &second).await.unwrap();

        let (latest, _) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(latest.channel_values, 2);

        let pinned = RunnableConfig {
            checkpoint_id: Some(first.id.clone()),
            ..config.clone()
        };
        let (cp, meta) = saver.get_tuple(&pinned).await.unwrap().unwrap();
        assert_eq!(cp.channel_values, 1);
        assert_eq!(meta.step, 1);
    }

    #[tokio::test]
    async fn threads_are_isolated() {
        let saver = MemorySaver::<i32>::new();
        saver
            .put(
                &RunnableConfig::for_thread("a"),
                &Checkpoint::from_state(1, CheckpointSource::Loop, 0),
            )
            .await
            .unwrap();
        assert!(saver
            .get_tuple(&RunnableConfig::for_thread("b"))
            .await
            .unwrap()
            .is_none());
        assert!(saver
            .list(&RunnableConfig::for_thread("b"), None, None, None)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn list_returns_ids_oldest_first_with_limit() {
        let saver = MemorySaver::<i32>::new();
        let config = RunnableConfig::for_thread("t1");
        let mut ids = Vec::new();
        for i in 0..3 {
            let cp = Checkpoint::from_state(i, CheckpointSource::Loop, i as i64);
            ids.push(saver.put(&config, &cp).await.unwrap());
        }
        let all = saver.list(&config, None, None, None).await.unwrap();
        let got: Vec<String> = all.into_iter().map(|i| i.checkpoint_id).collect();
        assert_eq!(got, ids);

        let last = saver.list(&config, Some(1), None, None).await.unwrap();
        assert_eq!(last[0].checkpoint_id, ids[2]);
    }

    #[tokio::test]
    async fn max_checkpoints_prunes_oldest_per_thread() {
        let saver = MemorySaver::<i32>::new().with_max_checkpoints(2);
        let config = RunnableConfig::for_thread("t1");
        let mut ids = Vec::new();
        for i in 0..4 {
            let cp = Checkpoint::from_state(i, CheckpointSource::Loop, i as i64);
            ids.push(saver.put(&config, &cp).await.unwrap());
        }
        let other = RunnableConfig::for_thread("t2");
        saver
            .put(&other, &Checkpoint::from_state(9, CheckpointSource::Loop, 0))
            .await
            .unwrap();

        let kept: Vec<String> = saver
            .list(&config, None, None, None)
            .await
            .unwrap()
            .into_iter()
            .map(|i| i.checkpoint_id)
            .collect();
        assert_eq!(kept, ids[2..]);
        let (latest, _) = saver.get_tuple(&config).await.unwrap().unwrap();
        assert_eq!(latest.channel_values, 3);
        assert_eq!(saver.list(&other, None, None, None).await.unwrap().len(), 1);
    }
}
