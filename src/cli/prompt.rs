//! Line input over stdin

use anyhow::{bail, Result};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

pub struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Next raw line, `None` once stdin is closed
    pub async fn line(&mut self) -> Result<Option<String>> {
        Ok(self.lines.next_line().await?)
    }

    /// Ask for one value; surrounding whitespace is dropped
    pub async fn ask(&mut self, label: &str) -> Result<String> {
        print!("{}: ", label);
        std::io::stdout().flush()?;

        match self.line().await? {
            Some(line) => Ok(line.trim().to_string()),
            None => bail!("Input closed while waiting for {}", label),
        }
    }

    pub async fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{} [y/N]", question)).await?;
        Ok(matches!(answer.to_lowercase().as_str(), "y" | "yes"))
    }
}
