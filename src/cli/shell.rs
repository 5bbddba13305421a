//! Interactive shell
//!
//! Each line is parsed with the same clap definitions as the command line,
//! so `course move 3 1` in the shell means what it means as a subcommand.
//! Moves stay local until `save`.

use anyhow::{bail, Result};
use clap::Parser;
use std::io::Write;

use super::{render, Command, Workspace};

#[derive(Parser, Debug)]
#[command(name = "coursedesk", no_binary_name = true, disable_version_flag = true)]
struct Line {
    #[command(subcommand)]
    command: Command,
}

pub async fn run(workspace: &mut Workspace) -> Result<()> {
    println!("coursedesk shell. `help` lists commands, `exit` leaves.");

    loop {
        print!("coursedesk> ");
        std::io::stdout().flush()?;

        let Some(line) = workspace.prompt().line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if matches!(line, "exit" | "quit") {
            if workspace.has_pending()
                && !workspace
                    .prompt()
                    .confirm("Unsaved order changes will be lost. Leave anyway?")
                    .await?
            {
                continue;
            }
            break;
        }

        let words = match split_words(line) {
            Ok(words) => words,
            Err(e) => {
                render::failure(&e);
                continue;
            }
        };

        match Line::try_parse_from(words) {
            Ok(Line { command }) => {
                let result = workspace.execute(command).await;
                workspace.report(result);
            }
            Err(e) => {
                // Help and usage errors print themselves
                let _ = e.print();
            }
        }
    }

    render::notices(&workspace.state().notifier);
    Ok(())
}

/// Split a line on whitespace, keeping double-quoted runs together
fn split_words(line: &str) -> Result<Vec<String>> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut quoted = false;
    let mut chars = line.chars();

    while let Some(c) = chars.next() {
        match c {
            '"' => {
                quoted = !quoted;
                in_word = true;
            }
            '\\' if quoted => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            c if c.is_whitespace() && !quoted => {
                if in_word {
                    words.push(std::mem::take(&mut current));
                    in_word = false;
                }
            }
            c => {
                current.push(c);
                in_word = true;
            }
        }
    }

    if quoted {
        bail!("Unclosed quote");
    }
    if in_word {
        words.push(current);
    }
    Ok(words)
}
