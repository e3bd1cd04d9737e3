//! Interactive task menu over an already established session.

use crate::Task;
use sparrow_engine::backend::Backend;
use sparrow_engine::config::SparrowConfig;
use sparrow_engine::session::SessionGuard;
use std::io::{self, BufRead, Write};
use tracing::warn;

const BANNER: &[&str] = &[
    "Session established. Pick a task:",
    "  1) notes    create, verify and delete a note",
    "  2) explore  harvest the feed, like posts, comment once",
    "  3) docs     author a document in the first knowledge base",
    "  4) follow   follow the first author in the feed",
    "  5) summary  regenerate the summary CSV",
    "Type 'exit' or 'quit' to close.",
];

pub async fn run<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    guard: &mut SessionGuard,
) -> anyhow::Result<()> {
    let stdin = io::stdin();
    run_with_input(backend, config, guard, stdin.lock()).await
}

async fn run_with_input<B: Backend + ?Sized>(
    backend: &mut B,
    config: &SparrowConfig,
    guard: &mut SessionGuard,
    mut input: impl BufRead,
) -> anyhow::Result<()> {
    for line in BANNER {
        println!("{}", line);
    }

    let mut stdout = io::stdout();
    let mut line = String::new();

    loop {
        print!("> ");
        stdout.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            // EOF
            break;
        }
        let choice = line.trim();
        let task = match choice {
            "" => continue,
            "exit" | "quit" => break,
            "1" | "notes" => Task::Notes,
            "2" | "explore" => Task::Explore,
            "3" | "docs" => Task::Docs,
            "4" | "follow" => Task::Follow,
            "5" | "summary" => Task::Summary,
            other => {
                println!("Unknown choice: {}", other);
                continue;
            }
        };

        // One failed task should not kill the session.
        if let Err(e) = crate::run_task(backend, config, guard, task).await {
            println!("Task failed: {}", e);
        } else {
            println!("Task finished.");
        }
    }

    // Leaving the menu folds this run's harvest into the cross-run
    // summary, same as the one-shot summary task.
    if let Err(e) = crate::regenerate_summary(config) {
        warn!(error = %e, "could not regenerate the summary on exit");
    }
    Ok(())
}
