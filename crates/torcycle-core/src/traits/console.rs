// # Console Trait
//
// The operator terminal: status lines out, prompt answers in.

use async_trait::async_trait;

/// Rotation progress shown next to an address in bounded mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub current: u64,
    pub total: u64,
}

/// Trait for the operator's terminal
#[async_trait]
pub trait Console: Send + Sync {
    /// Clear the display
    fn clear(&self) -> std::io::Result<()>;

    /// Print one status line
    fn say(&self, line: &str) -> std::io::Result<()>;

    /// Print a probed address, with `[i/n]` progress in bounded mode
    fn report_address(
        &self,
        prefix: &str,
        address: &str,
        progress: Option<Progress>,
    ) -> std::io::Result<()>;

    /// Show `prompt` and read one line
    ///
    /// Returns `Ok(None)` at end of input.
    async fn ask(&self, prompt: &str) -> std::io::Result<Option<String>>;
}
