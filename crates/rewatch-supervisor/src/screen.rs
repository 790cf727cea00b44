//! Terminal output around each run: clearing and prefix/suffix markers.

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use rewatch_core::ClearMode;

/// Clears `out` according to `mode`.
pub fn clear<W: Write>(out: &mut W, mode: ClearMode) -> io::Result<()> {
    match mode {
        ClearMode::Off => Ok(()),
        ClearMode::Soft => execute!(out, Clear(ClearType::All), MoveTo(0, 0)),
        ClearMode::Hard => execute!(out, Clear(ClearType::All), Clear(ClearType::Purge), MoveTo(0, 0)),
    }
}

/// Writes a run marker. Empty markers write nothing.
pub fn marker<W: Write>(out: &mut W, text: &str) -> io::Result<()> {
    if text.is_empty() {
        return Ok(());
    }
    out.write_all(text.as_bytes())?;
    out.flush()
}
