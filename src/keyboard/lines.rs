//! Line-oriented key source
//!
//! Reads one combo per line (`ctrl+k`, `escape`, `?`) and emits it on a
//! [`KeyEventBus`]. Used by the console when no terminal backend is
//! compiled in, and handy for scripted sessions.

use super::binding::{KeyCombo, KeyEvent};
use super::dispatcher::KeyEventBus;
use crate::error::Result;
use std::io::BufRead;

/// Parse one input line into a key-down event.
///
/// Blank lines and `#` comments yield `None`.
pub fn parse_key_line(line: &str) -> Result<Option<KeyEvent>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let combo: KeyCombo = line.parse()?;
    Ok(Some(KeyEvent::from_combo(&combo)))
}

/// Summary of a line source run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineSourceStats {
    pub emitted: usize,
    pub handled: usize,
    pub rejected: usize,
}

/// Emit every line of `reader` until EOF or a line equal to `quit`.
///
/// Unparseable lines are logged and skipped.
pub fn run_line_source<R: BufRead>(reader: R, bus: &KeyEventBus, quit: &str) -> Result<LineSourceStats> {
    let mut stats = LineSourceStats::default();

    for line in reader.lines() {
        let line = line?;
        if line.trim() == quit {
            break;
        }

        match parse_key_line(&line) {
            Ok(Some(event)) => {
                stats.emitted += 1;
                if bus.emit(&event) {
                    stats.handled += 1;
                } else {
                    tracing::info!("No shortcut bound to '{}'", line.trim());
                }
            }
            Ok(None) => {}
            Err(e) => {
                stats.rejected += 1;
                tracing::warn!("{}", e);
            }
        }
    }

    Ok(stats)
}
