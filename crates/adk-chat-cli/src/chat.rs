//! Interactive terminal chat front end
//!
//! Streams each answer to stdout as deltas arrive and keeps a per-session
//! transcript. Upstream HTTP failures render distinguishably from other
//! errors, in place of the answer.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Result};
use tracing::debug;

use adk_chat_core::engine::{EngineError, ReasoningEngineClient, StreamMode};
use adk_chat_core::session::{ChatHistory, Role};

pub async fn run(client: &ReasoningEngineClient, engine: &str, user_id: &str) -> Result<()> {
    let engine = engine.trim();
    if engine.is_empty() {
        bail!("no engine resource name; pass --engine or set REASONING_ENGINE");
    }

    println!("Chatting with {engine}");
    println!("Commands: /clear resets the session, /quit or Ctrl-D exits.");

    let mut history = ChatHistory::new();
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("you> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();

        match message {
            "" => continue,
            "/quit" => break,
            "/clear" => {
                history.clear();
                println!("Session cleared.");
                continue;
            }
            _ => {}
        }

        history.push(Role::User, message);

        print!("assistant> ");
        io::stdout().flush()?;
        let answer = match stream_answer(client, engine, message, user_id).await {
            Ok(answer) => answer,
            Err(e) => {
                let rendered = if e.is_upstream() {
                    format!("HTTP error: {e}")
                } else {
                    format!("Error: {e}")
                };
                println!("{rendered}");
                rendered
            }
        };
        history.push(Role::Assistant, answer);
        debug!("Session holds {} messages", history.len());
    }

    Ok(())
}

/// Run one turn, printing deltas as they arrive; returns the final answer.
async fn stream_answer(
    client: &ReasoningEngineClient,
    engine: &str,
    message: &str,
    user_id: &str,
) -> Result<String, EngineError> {
    let mut stream = client
        .stream_query(engine, message, user_id, StreamMode::Deltas)
        .await?;

    let mut stdout = io::stdout();
    while let Some(update) = stream.next_update().await? {
        let _ = stdout.write_all(update.as_bytes());
        let _ = stdout.flush();
    }
    let _ = stdout.write_all(b"\n");

    Ok(stream.finish())
}
