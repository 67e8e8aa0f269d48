//! Integration tests: threads persisted with `SqliteSaver` survive a new runner.


use std::sync::Arc;

use parley::{
    ChatOptions, ChatRunner, ChatState, Checkpointer, HumanAssistanceTool, JsonSerializer,
    LlmResponse, MockLlm, SqliteSaver, ToolCall, ToolRegistry, TurnOutcome,
};

fn open(path: &std::path::Path, llm: MockLlm, thread: &str) -> ChatRunner {
    let saver: Arc<dyn Checkpointer<ChatState>> =
        Arc::new(SqliteSaver::<ChatState>::new(path, Arc::new(JsonSerializer)).unwrap());
    ChatRunner::new(
        Arc::new(llm),
        ToolRegistry::new().with(Box::new(HumanAssistanceTool::new())),
        saver,
        thread,
        ChatOptions {
            system_prompt: Some("You are helpful.".into()),
            ..Default::default()
        },
    )
    .unwrap()
}

#[tokio::test]
async fn conversation_is_reloaded_by_thread_id() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("threads.db");

    let first = open(&db, MockLlm::with_no_tool_calls("noted"), "t-a");
    first.run_turn("remember 42").await.unwrap();
    drop(first);

    let llm = Arc::new(MockLlm::with_no_tool_calls("42"));
    let saver: Arc<dyn Checkpointer<ChatState>> =
        Arc::new(SqliteSaver::<ChatState>::new(&db, Arc::new(JsonSerializer)).unwrap());
    let second = ChatRunner::new(
        llm.clone(),
        ToolRegistry::new(),
        saver,
        "t-a",
        ChatOptions::default(),
    )
    .unwrap();
    second.run_turn("what number?").await.unwrap();
    let seen = &llm.calls()[0];
    assert_eq!(seen.len(), 4, "system, user, assistant, user");
    assert_eq!(seen[1].content(), "remember 42");

    let other = open(&db, MockLlm::with_no_tool_calls("hi"), "t-b");
    assert!(other.history().await.unwrap().is_empty());
}

#[tokio::test]
async fn suspension_survives_restart_and_resumes() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("threads.db");

    let ask = LlmResponse::with_tool_calls(
        "",
        vec![ToolCall::new("call-9", "human_assistance", r#"{"query":"Proceed?"}"#)],
    );
    let first = open(&db, MockLlm::scripted(vec![ask]), "t-s");
    let TurnOutcome::Suspended(suspension) = first.run_turn("start").await.unwrap() else {
        panic!("expected suspension");
    };
    drop(first);

    let second = open(&db, MockLlm::with_no_tool_calls("Proceeding."), "t-s");
    let pending = second.pending().await.unwrap().expect("still pending after restart");
    assert_eq!(pending, suspension);

    let outcome = second
        .resume(&pending.token, serde_json::json!({"data": "yes"}))
        .await
        .unwrap();
    assert!(matches!(outcome, TurnOutcome::Responded { ref reply, .. } if reply == "Proceeding."));
    assert!(second.pending().await.unwrap().is_none());
}
