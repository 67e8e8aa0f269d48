//! State graph: nodes + explicit edges (from → to) and optional conditional edges.
//!
//! Add nodes with `add_node`, define the flow with `add_edge(from, to)` using `START` and
//! `END` for entry/exit, and `add_conditional_edges` to route on state. Then `compile` or
//! `compile_with_checkpointer` to get a `CompiledStateGraph`.
//!
//! A node must have either one outgoing `add_edge` or `add_conditional_edges`, not both.
//! Without conditional edges the edges must form one linear chain.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;
use std::sync::Arc;

use crate::graph::compile_error::CompilationError;
use crate::graph::compiled::CompiledStateGraph;
use crate::graph::conditional::{ConditionalRouter, ConditionalRouterFn, NextEntry};
use crate::graph::node::Node;
use crate::memory::Checkpointer;

/// Sentinel for graph entry: use as `from_id` in `add_edge(START, first_node_id)`.
pub const START: &str = "__start__";

/// Sentinel for graph exit: use as `to_id` in `add_edge(last_node_id, END)`.
pub const END: &str = "__end__";

/// State graph: nodes plus explicit edges and optional conditional edges.
///
/// **Interaction**: Accepts `Arc<dyn Node<S>>`; produces `CompiledStateGraph<S>`.
pub struct StateGraph<S> {
    nodes: HashMap<String, Arc<dyn Node<S>>>,
    edges: Vec<(String, String)>,
    conditional_edges: HashMap<String, ConditionalRouter<S>>,
}

impl<S> Default for StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<S> StateGraph<S>
where
    S: Clone + Send + Sync + Debug + 'static,
{
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            edges: Vec::new(),
            conditional_edges: HashMap::new(),
        }
    }

    /// Adds a node; replaces an existing node with the same id.
    pub fn add_node(&mut self, id: impl Into<String>, node: Arc<dyn Node<S>>) -> &mut Self {
        self.nodes.insert(id.into(), node);
        self
    }

    /// Adds an edge from `from_id` to `to_id`. Use `START` / `END` for entry and exit.
    pub fn add_edge(&mut self, from_id: impl Into<String>, to_id: impl Into<String>) -> &mut Self {
        self.edges.push((from_id.into(), to_id.into()));
        self
    }

    /// Adds conditional edges from `source`: after it runs, `path(state)` picks the next
    /// node, optionally through `path_map`.
    ///
    /// ```rust,ignore
    /// graph.add_conditional_edges(
    ///     "chatbot",
    ///     Arc::new(|s: &ChatState| tools_condition(s).as_str().to_string()),
    ///     Some([("tools".into(), "tools".into()), (END.into(), END.into())].into_iter().collect()),
    /// );
    /// ```
    pub fn add_conditional_edges(
        &mut self,
        source: impl Into<String>,
        path: ConditionalRouterFn<S>,
        path_map: Option<HashMap<String, String>>,
    ) -> &mut Self {
        self.conditional_edges
            .insert(source.into(), ConditionalRouter::new(path, path_map));
        self
    }

    /// Builds the executable graph without persistence.
    pub fn compile(self) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(None)
    }

    /// Builds the executable graph with a checkpointer. Runs whose config carries a
    /// `thread_id` save their final state, and the pre-step state on interrupt.
    pub fn compile_with_checkpointer(
        self,
        checkpointer: Arc<dyn Checkpointer<S>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        self.compile_internal(Some(checkpointer))
    }

    fn compile_internal(
        self,
        checkpointer: Option<Arc<dyn Checkpointer<S>>>,
    ) -> Result<CompiledStateGraph<S>, CompilationError> {
        for (from, to) in &self.edges {
            if from != START && !self.nodes.contains_key(from) {
                return Err(CompilationError::NodeNotFound(from.clone()));
            }
            if to != END && !self.nodes.contains_key(to) {
                return Err(CompilationError::NodeNotFound(to.clone()));
            }
        }
        for (source, router) in &self.conditional_edges {
            if !self.nodes.contains_key(source) {
                return Err(CompilationError::NodeNotFound(source.clone()));
            }
            if let Some(path_map) = &router.path_map {
                for target in path_map.values() {
                    if target != END && !self.nodes.contains_key(target) {
                        return Err(CompilationError::InvalidConditionalPathMap(target.clone()));
                    }
                }
            }
        }

        let start_edges: Vec<&String> = self
            .edges
            .iter()
            .filter(|(f, _)| f == START)
            .map(|(_, t)| t)
            .collect();
        let first = match start_edges.as_slice() {
            [] => return Err(CompilationError::MissingStart),
            [only] => (*only).clone(),
            _ => {
                return Err(CompilationError::InvalidChain(
                    "multiple edges from START (branch)".into(),
                ))
            }
        };

        let has_end = self.edges.iter().any(|(_, t)| t == END)
            || self.conditional_edges.values().any(|r| {
                r.path_map
                    .as_ref()
                    .map_or(true, |m| m.values().any(|v| v == END))
            });
        if !has_end {
            return Err(CompilationError::MissingEnd);
        }

        let non_start: Vec<&(String, String)> =
            self.edges.iter().filter(|(f, _)| f != START).collect();
        let edge_froms: HashSet<&String> = non_start.iter().map(|(f, _)| f).collect();
        if edge_froms.len() != non_start.len() {
            return Err(CompilationError::InvalidChain(
                "duplicate from (branch)".into(),
            ));
        }
        for source in self.conditional_edges.keys() {
            if edge_froms.contains(source) {
                return Err(CompilationError::NodeHasBothEdgeAndConditional(
                    source.clone(),
                ));
            }
        }

        if self.conditional_edges.is_empty() {
            let linear_next: HashMap<&String, &String> =
                non_start.iter().map(|(f, t)| (f, t)).collect();
            let mut visited = HashSet::from([first.clone()]);
            let mut current = &first;
            while let Some(next) = linear_next.get(current) {
                if next.as_str() == END {
                    break;
                }
                if !visited.insert((*next).clone()) {
                    return Err(CompilationError::InvalidChain("cycle detected".into()));
                }
                current = next;
            }
        }

        let mut next_map: HashMap<String, NextEntry<S>> = non_start
            .iter()
            .map(|(f, t)| (f.clone(), NextEntry::Unconditional(t.clone())))
            .collect();
        for (source, router) in self.conditional_edges {
            next_map.insert(source, NextEntry::Conditional(router));
        }

        Ok(CompiledStateGraph {
            nodes: self.nodes,
            first_node_id: first,
            next_map,
            checkpointer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;

    use crate::error::AgentError;
    use crate::graph::Next;

    #[derive(Clone, Debug)]
    struct DummyState;

    struct DummyNode(&'static str);

    #[async_trait]
    impl Node<DummyState> for DummyNode {
        fn id(&self) -> &str {
            self.0
        }
        async fn run(&self, state: DummyState) -> Result<(DummyState, Next), AgentError> {
            Ok((state, Next::Continue))
        }
    }

    fn graph_with(ids: &[&'static str]) -> StateGraph<DummyState> {
        let mut g = StateGraph::new();
        for id in ids {
            g.add_node(*id, Arc::new(DummyNode(id)));
        }
        g
    }

    #[test]
    fn compile_fails_on_unknown_edge_target() {
        let mut g = graph_with(&["a"]);
        g.add_edge(START, "a").add_edge("a", "missing");
        assert!(matches!(g.compile(), Err(CompilationError::NodeNotFound(id)) if id == "missing"));
    }

    #[test]
    fn compile_fails_without_start_edge() {
        let mut g = graph_with(&["a"]);
        g.add_edge("a", END);
        assert!(matches!(g.compile(), Err(CompilationError::MissingStart)));
    }

    #[test]
    fn compile_fails_without_path_to_end() {
        let mut g = graph_with(&["a"]);
        g.add_edge(START, "a");
        assert!(matches!(g.compile(), Err(CompilationError::MissingEnd)));
    }

    #[test]
    fn compile_fails_on_linear_cycle() {
        let mut g = graph_with(&["a", "b", "c"]);
        g.add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", "a")
            .add_edge("c", END);
        assert!(matches!(g.compile(), Err(CompilationError::InvalidChain(_))));
    }

    #[test]
    fn compile_fails_when_node_has_both_edge_and_conditional() {
        let mut g = graph_with(&["a", "b"]);
        g.add_edge(START, "a")
            .add_edge("a", "b")
            .add_edge("b", END)
            .add_conditional_edges("a", Arc::new(|_: &DummyState| "b".to_string()), None);
        match g.compile() {
            Err(CompilationError::NodeHasBothEdgeAndConditional(id)) => assert_eq!(id, "a"),
            Err(e) => panic!("unexpected error: {e:?}"),
            Ok(_) => panic!("expected compile error"),
        }
    }

    #[test]
    fn compile_fails_when_conditional_path_map_has_invalid_target() {
        let mut g = graph_with(&["a"]);
        g.add_edge(START, "a").add_conditional_edges(
            "a",
            Arc::new(|_: &DummyState| "x".to_string()),
            Some([("x".to_string(), "nonexistent".to_string())].into_iter().collect()),
        );
        assert!(matches!(
            g.compile(),
            Err(CompilationError::InvalidConditionalPathMap(id)) if id == "nonexistent"
        ));
    }

    #[test]
    fn compile_accepts_conditional_loop() {
        let mut g = graph_with(&["chatbot", "tools"]);
        g.add_edge(START, "chatbot")
            .add_conditional_edges(
                "chatbot",
                Arc::new(|_: &DummyState| END.to_string()),
                Some(
                    [
                        ("tools".to_string(), "tools".to_string()),
                        (END.to_string(), END.to_string()),
                    ]
                    .into_iter()
                    .collect(),
                ),
            )
            .add_edge("tools", "chatbot");
        assert!(g.compile().is_ok());
    }
}
