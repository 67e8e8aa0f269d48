//! Interactive chat loop: `User: ` prompt, stream the turn, answer `Human: ` prompts
//! when a turn waits on the operator, repeat until EOF, a quit command or the shutdown
//! signal (Ctrl-C in the binary).

use std::future::Future;
use std::io::Write;
use std::pin::Pin;

use parley::{ChatRunner, ChatState, Message, RunError, StreamEvent, Suspension, TurnOutcome};
use thiserror::Error;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, Lines};

#[derive(Debug, Error)]
pub enum ReplError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Run(#[from] RunError),
}

/// How the session continues after a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Input ended or the user quit.
    Done,
    /// The shutdown signal fired while waiting for input.
    Interrupted,
}

enum Read {
    Line(String),
    Eof,
    Interrupted,
}

/// Operator input: lines from `R`, cut short by the `shutdown` future. Shutdown is only
/// observed while waiting for a line; a turn in flight runs to completion first.
struct Input<'s, R, S> {
    lines: Lines<R>,
    shutdown: Pin<&'s mut S>,
    fired: bool,
}

impl<'s, R, S> Input<'s, R, S>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
{
    fn new(input: R, shutdown: Pin<&'s mut S>) -> Self {
        Self {
            lines: input.lines(),
            shutdown,
            fired: false,
        }
    }

    async fn next_line(&mut self) -> std::io::Result<Read> {
        if self.fired {
            return Ok(Read::Interrupted);
        }
        tokio::select! {
            biased;
            _ = &mut self.shutdown => {
                self.fired = true;
                tracing::info!("shutdown requested");
                Ok(Read::Interrupted)
            }
            line = self.lines.next_line() => Ok(match line? {
                Some(line) => Read::Line(line),
                None => Read::Eof,
            }),
        }
    }
}

pub fn is_quit_command(s: &str) -> bool {
    let lower = s.trim().to_lowercase();
    matches!(lower.as_str(), "exit" | "quit" | "q")
}

/// Writes the messages a turn appends, as each graph step completes.
struct EventPrinter<'w, W: Write> {
    out: &'w mut W,
    seen: usize,
    error: Option<std::io::Error>,
}

impl<'w, W: Write> EventPrinter<'w, W> {
    fn new(out: &'w mut W, seen: usize) -> Self {
        Self {
            out,
            seen,
            error: None,
        }
    }

    fn on_event(&mut self, event: StreamEvent<ChatState>) {
        let StreamEvent::Updates { state, .. } = event else {
            return;
        };
        for message in state.messages.iter().skip(self.seen) {
            if let Err(e) = print_message(self.out, message) {
                self.error.get_or_insert(e);
            }
        }
        self.seen = state.messages.len();
    }

    fn finish(self) -> std::io::Result<()> {
        match self.error {
            Some(e) => Err(e),
            None => self.out.flush(),
        }
    }
}

fn print_message<W: Write>(out: &mut W, message: &Message) -> std::io::Result<()> {
    match message {
        Message::Assistant { content, tool_call } => {
            if !content.is_empty() {
                writeln!(out, "Assistant: {content}")?;
            } else if let Some(tc) = tool_call {
                tracing::debug!(tool = %tc.name, "model requested a tool");
            }
            Ok(())
        }
        Message::Tool { content, .. } => writeln!(out, "Assistant: {content}"),
        Message::System { .. } | Message::User { .. } => Ok(()),
    }
}

/// Runs one user turn with live output. Fatal errors are returned; others are printed.
async fn user_turn<R, S, W>(
    runner: &ChatRunner,
    text: &str,
    input: &mut Input<'_, R, S>,
    out: &mut W,
) -> Result<Flow, ReplError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    W: Write,
{
    let seen = runner.history().await?.len() + 1;
    let mut printer = EventPrinter::new(out, seen);
    let outcome = runner.stream_turn(text, |ev| printer.on_event(ev)).await;
    printer.finish()?;
    settle(runner, outcome, input, out).await
}

async fn settle<R, S, W>(
    runner: &ChatRunner,
    outcome: Result<TurnOutcome, RunError>,
    input: &mut Input<'_, R, S>,
    out: &mut W,
) -> Result<Flow, ReplError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    W: Write,
{
    match outcome {
        Ok(TurnOutcome::Responded { .. }) => Ok(Flow::Continue),
        Ok(TurnOutcome::Suspended(suspension)) => answer_human(runner, suspension, input, out).await,
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "turn failed");
            writeln!(out, "Error: {e}")?;
            Ok(Flow::Continue)
        }
    }
}

/// Prompts the operator for each suspension until the turn completes. Input ending or
/// the shutdown signal leaves the turn suspended.
async fn answer_human<R, S, W>(
    runner: &ChatRunner,
    mut suspension: Suspension,
    input: &mut Input<'_, R, S>,
    out: &mut W,
) -> Result<Flow, ReplError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    W: Write,
{
    loop {
        writeln!(out, "Assistant asks for human assistance: {}", suspension.query)?;
        write!(out, "Human: ")?;
        out.flush()?;
        let reply = match input.next_line().await? {
            Read::Line(reply) => reply,
            Read::Eof => return Ok(Flow::Done),
            Read::Interrupted => return Ok(Flow::Interrupted),
        };

        let seen = runner.history().await?.len();
        let mut printer = EventPrinter::new(out, seen);
        let outcome = runner
            .stream_resume(
                &suspension.token,
                serde_json::json!({ "data": reply.trim() }),
                |ev| printer.on_event(ev),
            )
            .await;
        printer.finish()?;
        match outcome {
            Ok(TurnOutcome::Suspended(next)) => suspension = next,
            other => return settle_resumed(other, out),
        }
    }
}

fn settle_resumed<W: Write>(
    outcome: Result<TurnOutcome, RunError>,
    out: &mut W,
) -> Result<Flow, ReplError> {
    match outcome {
        Ok(_) => Ok(Flow::Continue),
        Err(e) if e.is_fatal() => Err(e.into()),
        Err(e) => {
            tracing::warn!(error = %e, "resume failed");
            writeln!(out, "Error: {e}")?;
            Ok(Flow::Continue)
        }
    }
}

/// Answers a suspension left on the thread by an earlier session, if any.
async fn answer_pending<R, S, W>(
    runner: &ChatRunner,
    input: &mut Input<'_, R, S>,
    out: &mut W,
) -> Result<Flow, ReplError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    W: Write,
{
    match runner.pending().await? {
        Some(suspension) => {
            tracing::info!(token = %suspension.token, "thread has a pending human request");
            answer_human(runner, suspension, input, out).await
        }
        None => Ok(Flow::Continue),
    }
}

/// Interactive loop. A suspension left on the thread (persistent checkpointer) is
/// answered first. Ends with `Goodbye!` on EOF, a quit command or `shutdown`. Returns
/// `Err` only for IO failures and fatal turn errors.
pub async fn run_repl<R, S, W>(
    runner: &ChatRunner,
    input: R,
    shutdown: S,
    out: &mut W,
) -> Result<(), ReplError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    W: Write,
{
    let shutdown = std::pin::pin!(shutdown);
    let mut input = Input::new(input, shutdown);

    let mut flow = answer_pending(runner, &mut input, out).await?;
    while flow == Flow::Continue {
        write!(out, "User: ")?;
        out.flush()?;
        let line = match input.next_line().await? {
            Read::Line(line) => line,
            Read::Eof => break,
            Read::Interrupted => {
                flow = Flow::Interrupted;
                break;
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }
        if is_quit_command(text) {
            break;
        }
        flow = user_turn(runner, text, &mut input, out).await?;
    }

    if flow == Flow::Interrupted {
        writeln!(out)?;
    }
    writeln!(out, "Goodbye!")?;
    Ok(())
}

/// One-shot mode (`-m`): answers a pending suspension first, then runs `message` as a
/// single turn, still reading human-assistance replies from `input`. Nothing more is
/// sent once input ends or `shutdown` fires.
pub async fn run_once<R, S, W>(
    runner: &ChatRunner,
    message: &str,
    input: R,
    shutdown: S,
    out: &mut W,
) -> Result<(), ReplError>
where
    R: AsyncBufRead + Unpin,
    S: Future<Output = ()>,
    W: Write,
{
    let shutdown = std::pin::pin!(shutdown);
    let mut input = Input::new(input, shutdown);

    let mut flow = answer_pending(runner, &mut input, out).await?;
    if flow == Flow::Continue {
        flow = user_turn(runner, message, &mut input, out).await?;
    }
    if flow == Flow::Interrupted {
        writeln!(out)?;
    }
    Ok(())
}
