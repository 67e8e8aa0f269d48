//! Invoke config: thread_id, checkpoint_id, checkpoint_ns, resume node.

/// Config for a single invoke. Identifies the thread and optional checkpoint.
///
/// When using a checkpointer, invoke must provide at least `thread_id`.
///
/// **Interaction**: Passed to `CompiledStateGraph::invoke(state, config)` and
/// `Checkpointer::put` / `get_tuple` / `list`.
#[derive(Debug, Clone, Default)]
pub struct RunnableConfig {
    /// Conversation/thread id. Required when using a checkpointer.
    pub thread_id: Option<String>,
    /// If set, `get_tuple` loads this checkpoint instead of the latest.
    pub checkpoint_id: Option<String>,
    /// Optional namespace for checkpoints. Default is empty.
    pub checkpoint_ns: String,
    /// When set, the graph starts from this node instead of the START target
    /// (e.g. `"tools"` when resuming a suspended tool call).
    pub resume_from_node_id: Option<String>,
}

impl RunnableConfig {
    /// Config for `thread_id` with every other field defaulted.
    pub fn for_thread(thread_id: impl Into<String>) -> Self {
        Self {
            thread_id: Some(thread_id.into()),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runnable_config_default_all_optionals_none_or_empty() {
        let c = RunnableConfig::default();
        assert!(c.thread_id.is_none());
        assert!(c.checkpoint_id.is_none());
        assert!(c.checkpoint_ns.is_empty());
        assert!(c.resume_from_node_id.is_none());
    }

    #[test]
    fn for_thread_sets_only_thread_id() {
        let c = RunnableConfig::for_thread("t1");
        assert_eq!(c.thread_id.as_deref(), Some("t1"));
        assert!(c.checkpoint_id.is_none());
        assert!(c.resume_from_node_id.is_none());
    }
}
