use crate::engine::RunSummary;
use chrono::Local;
use crossterm::{
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    tty::IsTty,
};
use std::io::{self, Write};

#[derive(Clone, Copy)]
enum Stream {
    Out,
    Err,
}

/// Human-readable run log: one timestamped, emoji-tagged line per decision.
/// Colors are only emitted when the stream is a terminal so captured
/// scheduler output stays plain text.
pub struct RunReporter {
    color_out: bool,
    color_err: bool,
}

impl Default for RunReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl RunReporter {
    pub fn new() -> Self {
        Self {
            color_out: io::stdout().is_tty(),
            color_err: io::stderr().is_tty(),
        }
    }

    pub fn info(&self, tag: &str, message: &str) {
        self.line(Stream::Out, Color::White, tag, message);
    }

    pub fn muted(&self, tag: &str, message: &str) {
        self.line(Stream::Out, Color::DarkGrey, tag, message);
    }

    pub fn success(&self, tag: &str, message: &str) {
        self.line(Stream::Out, Color::Green, tag, message);
    }

    pub fn warn(&self, tag: &str, message: &str) {
        self.line(Stream::Err, Color::Yellow, tag, message);
    }

    pub fn error(&self, tag: &str, message: &str) {
        self.line(Stream::Err, Color::Red, tag, message);
    }

    pub fn summary(&self, summary: &RunSummary) {
        self.success("✅", "DONE:");
        self.info("🆕", &format!("New listings added: {}", summary.added));
        if summary.refreshed > 0 {
            self.info("🔄", &format!("Refreshed: {}", summary.refreshed));
        }
        self.info(
            "⏩",
            &format!(
                "Skipped: {} ({} already known, {} previously sold)",
                summary.skipped(),
                summary.skipped_known,
                summary.skipped_sold
            ),
        );
        self.info("⛔", &format!("Sold/removed: {}", summary.sold));
        self.info("⚠️", &format!("Missing data: {}", summary.rejected));
        self.info("❌", &format!("Errors: {}", summary.errors));
        self.info("📊", &format!("Total attempted: {}", summary.attempted));
    }

    fn line(&self, stream: Stream, color: Color, tag: &str, message: &str) {
        let text = format!(
            "[{}] {} {}\n",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            tag,
            message
        );

        // Write errors on the run log are ignored.
        let _ = match stream {
            Stream::Out => write_line(&mut io::stdout(), self.color_out, color, &text),
            Stream::Err => write_line(&mut io::stderr(), self.color_err, color, &text),
        };
    }
}

fn write_line<W: Write>(writer: &mut W, colored: bool, color: Color, text: &str) -> io::Result<()> {
    if colored {
        execute!(writer, SetForegroundColor(color), Print(text), ResetColor)
    } else {
        writer.write_all(text.as_bytes())?;
        writer.flush()
    }
}
