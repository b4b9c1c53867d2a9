//! Console rendering of display events.

use std::io::{IsTerminal, Write};

use scorewatch_core::poller::DisplaySink;
use scorewatch_types::DisplayEvent;

/// ANSI clear-screen sequence written before every frame.
const CLEAR_SCREEN: &str = "\x1b[2J";

/// Writes one frame per cycle to a terminal-like writer.
pub struct ConsoleRenderer<W: Write> {
    out: W,
    clear: bool,
}

impl ConsoleRenderer<std::io::Stdout> {
    /// Render to standard output. The screen is cleared between frames
    /// only when stdout is a terminal.
    pub fn stdout() -> Self {
        let out = std::io::stdout();
        let clear = out.is_terminal();
        Self::new(out, clear)
    }
}

impl<W: Write> ConsoleRenderer<W> {
    /// Render to `out`; `clear` controls the clear-screen prefix.
    pub const fn new(out: W, clear: bool) -> Self {
        Self { out, clear }
    }

    fn write_frame(&mut self, event: &DisplayEvent) -> std::io::Result<()> {
        if self.clear {
            write!(self.out, "{CLEAR_SCREEN}")?;
        }
        match event {
            DisplayEvent::Enriched { summary } => writeln!(self.out, "\r{summary}")?,
            DisplayEvent::Raw { score } => writeln!(self.out, "\rScore {score}")?,
            DisplayEvent::EnrichmentFailed { score, error } => {
                writeln!(self.out, "Error: {error}")?;
                writeln!(self.out, "\rScore {score}")?;
            }
        }
        self.out.flush()
    }
}

impl<W: Write> DisplaySink for ConsoleRenderer<W> {
    fn on_display(&mut self, event: &DisplayEvent) {
        // A closed terminal must not stop the session.
        if let Err(e) = self.write_frame(event) {
            tracing::warn!(kind = event.kind(), error = %e, "failed to render frame");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(clear: bool, event: &DisplayEvent) -> String {
        let mut buf = Vec::new();
        ConsoleRenderer::new(&mut buf, clear).on_display(event);
        String::from_utf8(buf).unwrap_or_default()
    }

    #[test]
    fn raw_frame_shows_score() {
        let out = render(
            true,
            &DisplayEvent::Raw {
                score: "IND 245/3".to_owned(),
            },
        );
        assert_eq!(out, "\x1b[2J\rScore IND 245/3\n");
    }

    #[test]
    fn enriched_frame_shows_summary_only() {
        let out = render(
            false,
            &DisplayEvent::Enriched {
                summary: "Kohli is cooking.".to_owned(),
            },
        );
        assert_eq!(out, "\rKohli is cooking.\n");
    }

    #[test]
    fn failed_frame_shows_error_then_score() {
        let out = render(
            false,
            &DisplayEvent::EnrichmentFailed {
                score: "IND 245/3".to_owned(),
                error: "summarizer timed out after 30000ms".to_owned(),
            },
        );
        assert_eq!(
            out,
            "Error: summarizer timed out after 30000ms\n\rScore IND 245/3\n"
        );
    }

    #[test]
    fn empty_score_still_renders_a_frame() {
        let out = render(false, &DisplayEvent::Raw { score: String::new() });
        assert_eq!(out, "\rScore \n");
    }
}
