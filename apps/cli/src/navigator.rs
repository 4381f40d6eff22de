//! Navigator that reports route changes on the terminal.

use crate::output::OutputFormat;
use eventify_auth::Navigator;
use tracing::info;

/// There is no page to switch to in a terminal, so a route change is
/// printed instead. JSON output carries the destination in the command's
/// own result.
pub struct TerminalNavigator {
    format: OutputFormat,
}

impl TerminalNavigator {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn report(&self, path: &str) {
        info!(path = %path, "Navigating");
        if matches!(self.format, OutputFormat::Text) {
            println!("-> {}", path);
        }
    }
}

impl Navigator for TerminalNavigator {
    fn push(&self, path: &str) {
        self.report(path);
    }

    fn replace(&self, path: &str) {
        self.report(path);
    }
}
