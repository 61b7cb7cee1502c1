use std::io::{self, Write};

/// Moves the user to the results view.
pub trait Navigator: Send {
    fn open_report(&mut self, url: &str);
}

/// Points the terminal user at the report.
pub struct TerminalNavigator<W: Write + Send> {
    out: W,
}

impl TerminalNavigator<io::Stdout> {
    pub fn stdout() -> Self {
        Self { out: io::stdout() }
    }
}

impl<W: Write + Send> Navigator for TerminalNavigator<W> {
    fn open_report(&mut self, url: &str) {
        let _ = writeln!(self.out, "View report: {url}");
    }
}
