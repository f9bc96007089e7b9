// Operator terminal on stdin/stdout.

use async_trait::async_trait;
use colored::Colorize;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader, Stdin};
use tokio::sync::Mutex;
use torcycle_core::traits::{Console, Progress};

/// ANSI "erase display" followed by "cursor home"
const CLEAR_SCREEN: &str = "\x1B[2J\x1B[1;1H";

/// Console on the process's own terminal
pub struct TerminalConsole {
    stdin: Mutex<BufReader<Stdin>>,
}

impl TerminalConsole {
    pub fn new() -> Self {
        Self {
            stdin: Mutex::new(BufReader::new(tokio::io::stdin())),
        }
    }
}

impl Default for TerminalConsole {
    fn default() -> Self {
        Self::new()
    }
}

/// Render one address line, highlighting the address
fn address_line(prefix: &str, address: &str, progress: Option<Progress>) -> String {
    match progress {
        Some(Progress { current, total }) => {
            format!("[{}/{}] {}{}", current, total, prefix, address.green())
        }
        None => format!("{}{}", prefix, address.green()),
    }
}

#[async_trait]
impl Console for TerminalConsole {
    fn clear(&self) -> io::Result<()> {
        let mut out = io::stdout().lock();
        out.write_all(CLEAR_SCREEN.as_bytes())?;
        out.flush()
    }

    fn say(&self, line: &str) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", line)
    }

    fn report_address(
        &self,
        prefix: &str,
        address: &str,
        progress: Option<Progress>,
    ) -> io::Result<()> {
        writeln!(io::stdout().lock(), "{}", address_line(prefix, address, progress))
    }

    async fn ask(&self, prompt: &str) -> io::Result<Option<String>> {
        {
            let mut out = io::stdout().lock();
            out.write_all(prompt.as_bytes())?;
            out.flush()?;
        }

        let mut line = String::new();
        let read = self.stdin.lock().await.read_line(&mut line).await?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line))
    }
}
